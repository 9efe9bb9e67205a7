use serde::{Deserialize, Serialize};

use crate::error::ExploreError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepoLocator {
    pub owner: String,
    pub repo: String,
    pub canonical_url: String,
}

impl RepoLocator {
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.repo)
    }
}

/// Parse whatever the user typed into the URL field: a full GitHub URL,
/// a bare `github.com/...` form, or `owner/repo` shorthand. Deep links
/// (`/tree/...`, `/blob/...`) resolve to the repository they belong to.
pub fn parse_repo_input(input: &str) -> Result<RepoLocator, ExploreError> {
    let input = input.trim().trim_end_matches('/');

    if input.is_empty() {
        return Err(ExploreError::invalid("Enter a repository URL"));
    }

    if let Some(path) = input
        .strip_prefix("https://github.com/")
        .or_else(|| input.strip_prefix("http://github.com/"))
        .or_else(|| input.strip_prefix("github.com/"))
    {
        return locator_from_path(path);
    }

    // owner/repo shorthand
    if !input.contains("://") && input.matches('/').count() == 1 {
        return locator_from_path(input);
    }

    Err(ExploreError::invalid(
        "Enter a GitHub repository URL like https://github.com/owner/repo",
    ))
}

fn locator_from_path(path: &str) -> Result<RepoLocator, ExploreError> {
    let parts: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

    if parts.len() < 2 {
        return Err(ExploreError::invalid(
            "Repository address must include both owner and name",
        ));
    }

    let owner = parts[0];
    let repo = parts[1].trim_end_matches(".git");

    if !validate_github_name(owner) || !validate_github_name(repo) {
        return Err(ExploreError::invalid("That does not look like a GitHub repository"));
    }

    // anything after owner/repo (tree/blob/commit links) still identifies the repo
    Ok(RepoLocator {
        owner: owner.to_string(),
        repo: repo.to_string(),
        canonical_url: format!("https://github.com/{owner}/{repo}"),
    })
}

pub fn validate_github_name(name: &str) -> bool {
    !name.is_empty()
        && name.len() <= 39
        && name
            .chars()
            .all(|c| c.is_alphanumeric() || c == '-' || c == '_' || c == '.')
        && !name.starts_with(['-', '.'])
        && !name.ends_with(['-', '.'])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_urls() {
        let loc = parse_repo_input("https://github.com/octocat/Hello-World").unwrap();
        assert_eq!(loc.owner, "octocat");
        assert_eq!(loc.repo, "Hello-World");
        assert_eq!(loc.canonical_url, "https://github.com/octocat/Hello-World");

        let loc = parse_repo_input("http://github.com/rust-lang/rust/tree/master/src").unwrap();
        assert_eq!(loc.full_name(), "rust-lang/rust");
    }

    #[test]
    fn test_shorthand() {
        let loc = parse_repo_input("octocat/Hello-World").unwrap();
        assert_eq!(loc.canonical_url, "https://github.com/octocat/Hello-World");
    }

    #[test]
    fn test_trailing_noise() {
        let loc = parse_repo_input("github.com/octocat/Hello-World/").unwrap();
        assert_eq!(loc.repo, "Hello-World");
        let loc = parse_repo_input("https://github.com/octocat/Hello-World.git").unwrap();
        assert_eq!(loc.repo, "Hello-World");
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(parse_repo_input("not-a-url").is_err());
        assert!(parse_repo_input("").is_err());
        assert!(parse_repo_input("https://evil.com/owner/repo").is_err());
        assert!(parse_repo_input("owner/-bad").is_err());
    }

    #[test]
    fn test_name_validation() {
        assert!(validate_github_name("octocat"));
        assert!(validate_github_name("Hello-World"));
        assert!(!validate_github_name(""));
        assert!(!validate_github_name("-leading"));
        assert!(!validate_github_name("trailing."));
        assert!(!validate_github_name("has space"));
    }
}
