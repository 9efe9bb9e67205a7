//! AI collaborator: four request/response operations against the gitscope
//! proxy. The proxy owns the prompts and the upstream key; this side owns the
//! typed requests and the parsing of structured answers, including the
//! raw-text fallback when the model ignores the requested JSON shape.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::ExploreError;

pub const DEFAULT_PROXY_BASE: &str = "http://127.0.0.1:42071";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(90);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExplainRequest {
    pub repo: String,
    pub path: String,
    pub language: Option<String>,
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LearningPathRequest {
    pub repo: String,
    pub description: Option<String>,
    pub language: Option<String>,
    pub file_summary: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    pub repo: String,
    pub message: String,
    pub context: String,
    pub history: Vec<ChatTurn>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChallengeRequest {
    pub repo: String,
    pub module_title: String,
    pub module_description: String,
    pub files: Vec<String>,
    pub objectives: Vec<String>,
}

/// Wire envelope for every proxy response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiText {
    pub text: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LearningModule {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub files: Vec<String>,
    #[serde(default)]
    pub objectives: Vec<String>,
    #[serde(default)]
    pub estimated_time: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LearningPath {
    #[serde(default)]
    pub overview: String,
    #[serde(default)]
    pub prerequisites: Vec<String>,
    #[serde(default)]
    pub modules: Vec<LearningModule>,
    #[serde(default)]
    pub projects: Vec<String>,
}

/// Structured path, or the raw model output when parsing fails.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LearningPathResult {
    Structured(LearningPath),
    Raw(String),
}

/// Learning path plus the per-repo completion checklist, persisted together.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredLearningPath {
    pub result: LearningPathResult,
    #[serde(default)]
    pub completed_modules: Vec<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Challenge {
    #[serde(default)]
    pub id: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    pub question: String,
    pub options: Vec<String>,
    pub correct_answer: String,
    #[serde(default)]
    pub explanation: String,
    #[serde(default = "default_points")]
    pub points: u32,
}

fn default_points() -> u32 {
    10
}

pub struct AiClient {
    http: reqwest::Client,
    base: String,
}

impl AiClient {
    pub fn new(base: impl Into<String>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self {
            http,
            base: base.into(),
        }
    }

    pub async fn explain(&self, request: &ExplainRequest) -> Result<String, ExploreError> {
        self.post_text("/v1/explain", request).await
    }

    pub async fn learning_path(
        &self,
        request: &LearningPathRequest,
    ) -> Result<LearningPathResult, ExploreError> {
        let text = self.post_text("/v1/learning-path", request).await?;
        Ok(parse_learning_path(&text))
    }

    pub async fn chat(&self, request: &ChatRequest) -> Result<String, ExploreError> {
        self.post_text("/v1/chat", request).await
    }

    pub async fn generate_challenges(
        &self,
        request: &ChallengeRequest,
    ) -> Result<Vec<Challenge>, ExploreError> {
        let text = self.post_text("/v1/challenges", request).await?;
        parse_challenges(&text)
    }

    async fn post_text<B: Serialize>(
        &self,
        route: &str,
        body: &B,
    ) -> Result<String, ExploreError> {
        let response = self
            .http
            .post(format!("{}{route}", self.base))
            .json(body)
            .send()
            .await
            .map_err(|e| ExploreError::service(format!("AI service unreachable: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            let detail = if detail.is_empty() {
                status.to_string()
            } else {
                detail
            };
            return Err(ExploreError::service(format!("AI request failed: {detail}")));
        }

        let envelope: AiText = response
            .json()
            .await
            .map_err(|e| ExploreError::service(format!("malformed AI response: {e}")))?;
        Ok(envelope.text)
    }
}

/// Models wrap JSON in markdown fences more often than not.
fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(inner) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let inner = inner.strip_prefix("json").unwrap_or(inner);
    let inner = inner.strip_suffix("```").unwrap_or(inner);
    inner.trim()
}

pub fn parse_learning_path(text: &str) -> LearningPathResult {
    let candidate = strip_code_fences(text);
    match serde_json::from_str::<LearningPath>(candidate) {
        Ok(path) if !path.modules.is_empty() => LearningPathResult::Structured(path),
        _ => LearningPathResult::Raw(text.to_string()),
    }
}

pub fn parse_challenges(text: &str) -> Result<Vec<Challenge>, ExploreError> {
    let candidate = strip_code_fences(text);
    serde_json::from_str::<Vec<Challenge>>(candidate)
        .map_err(|e| ExploreError::service(format!("unparseable challenge set: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_structured_learning_path() {
        let text = r#"```json
        {"overview":"Start small","prerequisites":["Rust basics"],
         "modules":[{"title":"Entry points","files":["src/main.rs"],"objectives":["find main"]}],
         "projects":["Add a flag"]}
        ```"#;

        match parse_learning_path(text) {
            LearningPathResult::Structured(path) => {
                assert_eq!(path.overview, "Start small");
                assert_eq!(path.modules.len(), 1);
                assert_eq!(path.modules[0].files, vec!["src/main.rs".to_string()]);
            }
            LearningPathResult::Raw(_) => panic!("expected structured parse"),
        }
    }

    #[test]
    fn test_prose_falls_back_to_raw() {
        let text = "Here is a plan:\n1. Read the README\n2. Skim src/";
        match parse_learning_path(text) {
            LearningPathResult::Raw(raw) => assert_eq!(raw, text),
            LearningPathResult::Structured(_) => panic!("expected raw fallback"),
        }
    }

    #[test]
    fn test_parse_challenges() {
        let text = r#"[{"id":"q1","type":"multiple-choice",
            "question":"Which file is the entry point?",
            "options":["src/main.rs","src/lib.rs"],
            "correctAnswer":"src/main.rs","points":25}]"#;
        // keys are snake_case on the wire; camelCase must fail loudly
        assert!(parse_challenges(text).is_err());

        let text = r#"[{"id":"q1","type":"multiple-choice",
            "question":"Which file is the entry point?",
            "options":["src/main.rs","src/lib.rs"],
            "correct_answer":"src/main.rs","points":25}]"#;
        let parsed = parse_challenges(text).unwrap();
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].points, 25);
        assert_eq!(parsed[0].correct_answer, "src/main.rs");
    }

    #[test]
    fn test_stored_path_round_trips() {
        let stored = StoredLearningPath {
            result: LearningPathResult::Structured(LearningPath {
                overview: "o".into(),
                prerequisites: vec![],
                modules: vec![LearningModule {
                    title: "m".into(),
                    ..Default::default()
                }],
                projects: vec![],
            }),
            completed_modules: vec![0],
        };
        let json = serde_json::to_string(&stored).unwrap();
        let back: StoredLearningPath = serde_json::from_str(&json).unwrap();
        assert_eq!(back, stored);
    }
}
