use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    File,
    Folder,
}

/// One node of the repository structure. `path` is the stable identifier used
/// everywhere a node must be looked up or cached. Folders always carry a
/// `children` vector (possibly empty); files never do.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileNode {
    pub name: String,
    pub path: String,
    pub kind: NodeKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<FileNode>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extension: Option<String>,
}

impl FileNode {
    pub fn folder(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            kind: NodeKind::Folder,
            children: Some(Vec::new()),
            size: None,
            extension: None,
        }
    }

    pub fn file(name: impl Into<String>, path: impl Into<String>, size: Option<u64>) -> Self {
        let name = name.into();
        let extension = name.rsplit_once('.').map(|(_, ext)| ext.to_lowercase());
        Self {
            name,
            path: path.into(),
            kind: NodeKind::File,
            children: None,
            size,
            extension,
        }
    }

    pub fn is_file(&self) -> bool {
        self.kind == NodeKind::File
    }

    pub fn is_folder(&self) -> bool {
        self.kind == NodeKind::Folder
    }

    /// Depth-first lookup by path.
    pub fn find(&self, path: &str) -> Option<&FileNode> {
        if self.path == path {
            return Some(self);
        }
        self.children
            .as_deref()
            .into_iter()
            .flatten()
            .find_map(|c| c.find(path))
    }

    pub fn file_count(&self) -> usize {
        match self.kind {
            NodeKind::File => 1,
            NodeKind::Folder => self
                .children
                .as_deref()
                .into_iter()
                .flatten()
                .map(FileNode::file_count)
                .sum(),
        }
    }
}

/// Flat entry as returned by the repository API tree listing.
#[derive(Debug, Clone)]
pub struct TreeEntry {
    pub path: String,
    pub kind: NodeKind,
    pub size: Option<u64>,
}

/// Build the nested tree from a flat path listing. Intermediate folders are
/// created on demand, so the listing does not need to mention every directory.
/// Children are ordered folders-first, then alphabetically.
pub fn build_tree(root_name: &str, entries: &[TreeEntry]) -> FileNode {
    let mut root = FileNode::folder(root_name, "");

    for entry in entries {
        insert(&mut root, entry);
    }

    sort_children(&mut root);
    root
}

fn insert(root: &mut FileNode, entry: &TreeEntry) {
    let segments: Vec<&str> = entry.path.split('/').filter(|s| !s.is_empty()).collect();
    if segments.is_empty() {
        return;
    }

    let mut current = root;
    for (i, segment) in segments.iter().enumerate() {
        let is_last = i == segments.len() - 1;
        let child_path = segments[..=i].join("/");

        let children = current.children.get_or_insert_with(Vec::new);
        let pos = children.iter().position(|c| c.name == *segment);

        let idx = match pos {
            Some(idx) => idx,
            None => {
                let node = if is_last && entry.kind == NodeKind::File {
                    FileNode::file(*segment, &child_path, entry.size)
                } else {
                    FileNode::folder(*segment, &child_path)
                };
                children.push(node);
                children.len() - 1
            }
        };

        current = &mut children[idx];
    }
}

fn sort_children(node: &mut FileNode) {
    if let Some(children) = node.children.as_mut() {
        children.sort_by(|a, b| {
            (a.kind == NodeKind::File)
                .cmp(&(b.kind == NodeKind::File))
                .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
        });
        for child in children.iter_mut() {
            sort_children(child);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entries() -> Vec<TreeEntry> {
        vec![
            TreeEntry {
                path: "src/main.rs".into(),
                kind: NodeKind::File,
                size: Some(420),
            },
            TreeEntry {
                path: "src/lib.rs".into(),
                kind: NodeKind::File,
                size: Some(100),
            },
            TreeEntry {
                path: "README.md".into(),
                kind: NodeKind::File,
                size: Some(12),
            },
        ]
    }

    #[test]
    fn test_nesting_and_intermediate_folders() {
        let tree = build_tree("demo", &entries());
        assert_eq!(tree.file_count(), 3);

        let src = tree.find("src").unwrap();
        assert!(src.is_folder());
        assert_eq!(src.children.as_ref().unwrap().len(), 2);

        let main = tree.find("src/main.rs").unwrap();
        assert!(main.is_file());
        assert_eq!(main.size, Some(420));
        assert_eq!(main.extension.as_deref(), Some("rs"));
    }

    #[test]
    fn test_folders_have_children_files_do_not() {
        let tree = build_tree("demo", &entries());

        fn check(node: &FileNode) {
            match node.kind {
                NodeKind::Folder => {
                    assert!(node.children.is_some());
                    for c in node.children.as_deref().unwrap() {
                        check(c);
                    }
                }
                NodeKind::File => assert!(node.children.is_none()),
            }
        }
        check(&tree);
    }

    #[test]
    fn test_folders_sort_before_files() {
        let tree = build_tree("demo", &entries());
        let names: Vec<&str> = tree
            .children
            .as_deref()
            .unwrap()
            .iter()
            .map(|c| c.name.as_str())
            .collect();
        assert_eq!(names, vec!["src", "README.md"]);
    }

    #[test]
    fn test_empty_listing_is_bare_root() {
        let tree = build_tree("empty", &[]);
        assert!(tree.is_folder());
        assert_eq!(tree.children.as_deref().unwrap().len(), 0);
    }
}
