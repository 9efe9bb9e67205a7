//! View-local state: everything the renderer needs that is deliberately NOT
//! in the application state store. This survives state-driven redraws and is
//! reset when a new repository (a new path namespace) is loaded.

use std::collections::HashSet;

use gitscope_core::ai::StoredLearningPath;
use gitscope_core::tree::FileNode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tab {
    #[default]
    Tree,
    Graph,
}

impl Tab {
    pub fn as_str(self) -> &'static str {
        match self {
            Tab::Tree => "tree",
            Tab::Graph => "graph",
        }
    }

    pub fn from_str(raw: &str) -> Self {
        match raw {
            "graph" => Tab::Graph,
            _ => Tab::Tree,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Focus {
    #[default]
    Explorer,
    Detail,
    Learning,
}

impl Focus {
    pub fn next(self) -> Self {
        match self {
            Focus::Explorer => Focus::Detail,
            Focus::Detail => Focus::Learning,
            Focus::Learning => Focus::Explorer,
        }
    }
}

/// AI and content state local to the file-detail panel. Failures here stay
/// here; they never touch the global error field.
#[derive(Debug, Default)]
pub struct FilePanel {
    pub path: Option<String>,
    pub content: Option<String>,
    pub content_error: Option<String>,
    pub content_loading: bool,
    pub explanation: Option<String>,
    pub explain_error: Option<String>,
    pub explain_loading: bool,
    pub scroll: u16,
}

impl FilePanel {
    pub fn focus(&mut self, path: &str) {
        if self.path.as_deref() == Some(path) {
            return;
        }
        *self = Self {
            path: Some(path.to_string()),
            content_loading: true,
            ..Self::default()
        };
    }
}

#[derive(Debug, Default)]
pub struct LearningPanel {
    pub stored: Option<StoredLearningPath>,
    pub loading: bool,
    pub error: Option<String>,
    pub cursor: usize,
}

/// One flattened, visible row of the tree pane.
pub struct TreeRow<'a> {
    pub node: &'a FileNode,
    pub depth: usize,
}

pub struct ViewState {
    pub tab: Tab,
    pub focus: Focus,
    pub expanded: HashSet<String>,
    pub tree_cursor: usize,
    pub history_cursor: usize,
    pub graph_focus: usize,
    pub graph_pan: (f64, f64),
    pub graph_zoom: f64,
    pub file_panel: FilePanel,
    pub learning: LearningPanel,
    pub chat_input: String,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            tab: Tab::default(),
            focus: Focus::default(),
            expanded: HashSet::new(),
            tree_cursor: 0,
            history_cursor: 0,
            graph_focus: 0,
            graph_pan: (0.0, 0.0),
            graph_zoom: 1.0,
            file_panel: FilePanel::default(),
            learning: LearningPanel::default(),
            chat_input: String::new(),
        }
    }
}

impl ViewState {
    /// New repository ⇒ new path namespace: folder expansion, cursors and
    /// panel contents all restart. The persisted active tab is kept.
    pub fn reset_for_repo(&mut self) {
        let tab = self.tab;
        *self = Self {
            tab,
            ..Self::default()
        };
    }

    pub fn toggle_folder(&mut self, path: &str) {
        if !self.expanded.remove(path) {
            self.expanded.insert(path.to_string());
        }
    }
}

/// Flatten the tree into the rows currently visible given the expansion set.
/// The root folder itself is not shown; its children are the top level.
pub fn visible_rows<'a>(tree: &'a FileNode, expanded: &HashSet<String>) -> Vec<TreeRow<'a>> {
    let mut rows = Vec::new();
    for child in tree.children.as_deref().into_iter().flatten() {
        push_rows(child, 0, expanded, &mut rows);
    }
    rows
}

fn push_rows<'a>(
    node: &'a FileNode,
    depth: usize,
    expanded: &HashSet<String>,
    rows: &mut Vec<TreeRow<'a>>,
) {
    rows.push(TreeRow { node, depth });
    if node.is_folder() && expanded.contains(node.path.as_str()) {
        for child in node.children.as_deref().into_iter().flatten() {
            push_rows(child, depth + 1, expanded, rows);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gitscope_core::tree::{build_tree, NodeKind, TreeEntry};

    fn tree() -> FileNode {
        build_tree(
            "demo",
            &[
                TreeEntry {
                    path: "src/main.rs".into(),
                    kind: NodeKind::File,
                    size: Some(1),
                },
                TreeEntry {
                    path: "README.md".into(),
                    kind: NodeKind::File,
                    size: Some(1),
                },
            ],
        )
    }

    #[test]
    fn test_collapsed_by_default() {
        let view = ViewState::default();
        let tree = tree();
        let rows = visible_rows(&tree, &view.expanded);
        let names: Vec<&str> = rows.iter().map(|r| r.node.name.as_str()).collect();
        assert_eq!(names, vec!["src", "README.md"]);
    }

    #[test]
    fn test_expansion_reveals_children() {
        let mut view = ViewState::default();
        view.toggle_folder("src");
        let tree = tree();
        let rows = visible_rows(&tree, &view.expanded);
        let names: Vec<&str> = rows.iter().map(|r| r.node.name.as_str()).collect();
        assert_eq!(names, vec!["src", "main.rs", "README.md"]);
        assert_eq!(rows[1].depth, 1);

        view.toggle_folder("src");
        assert_eq!(visible_rows(&tree, &view.expanded).len(), 2);
    }

    #[test]
    fn test_reset_keeps_tab_but_clears_expansion() {
        let mut view = ViewState::default();
        view.tab = Tab::Graph;
        view.toggle_folder("src");
        view.tree_cursor = 5;

        view.reset_for_repo();
        assert_eq!(view.tab, Tab::Graph);
        assert!(view.expanded.is_empty());
        assert_eq!(view.tree_cursor, 0);
    }

    #[test]
    fn test_file_panel_focus_resets_only_on_new_path() {
        let mut panel = FilePanel::default();
        panel.focus("src/main.rs");
        panel.explanation = Some("explained".into());

        panel.focus("src/main.rs");
        assert_eq!(panel.explanation.as_deref(), Some("explained"));

        panel.focus("README.md");
        assert!(panel.explanation.is_none());
        assert!(panel.content_loading);
    }

    #[test]
    fn test_tab_persistence_round_trip() {
        assert_eq!(Tab::from_str(Tab::Graph.as_str()), Tab::Graph);
        assert_eq!(Tab::from_str("nonsense"), Tab::Tree);
    }
}
