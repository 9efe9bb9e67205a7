//! Visualization lifecycle controller.
//!
//! Owns the single live [`GraphSimulation`] and the teardown-before-replace
//! guarantee: any render path that would discard the graph pane must call
//! [`VizController::cleanup`] first, and re-renders that do not touch the
//! graph leave the running simulation alone. Selection made from the graph
//! bypasses the state-store subscriber list: the store is updated silently
//! and registered observers are told directly.

use crate::graph::GraphSimulation;
use crate::state::StateStore;
use crate::tree::FileNode;

pub type SelectionObserver = Box<dyn Fn(&str) + Send>;

#[derive(Default)]
pub struct VizController {
    sim: Option<GraphSimulation>,
    observers: Vec<SelectionObserver>,
}

impl VizController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace any existing simulation with a fresh one built from `tree`.
    pub fn initialize(&mut self, tree: &FileNode) {
        self.cleanup();
        self.sim = Some(GraphSimulation::from_tree(tree));
    }

    /// Stop and discard the running simulation. Safe to call repeatedly or
    /// when nothing is running.
    pub fn cleanup(&mut self) {
        if let Some(mut sim) = self.sim.take() {
            sim.stop();
        }
    }

    pub fn is_active(&self) -> bool {
        self.sim.is_some()
    }

    pub fn simulation(&self) -> Option<&GraphSimulation> {
        self.sim.as_ref()
    }

    pub fn simulation_mut(&mut self) -> Option<&mut GraphSimulation> {
        self.sim.as_mut()
    }

    /// Advance the physics by one frame, if a simulation is live.
    pub fn tick(&mut self) {
        if let Some(sim) = self.sim.as_mut() {
            sim.tick();
        }
    }

    /// Register a detail-panel observer for graph-driven selection changes.
    pub fn on_selection(&mut self, observer: impl Fn(&str) + Send + 'static) {
        self.observers.push(Box::new(observer));
    }

    /// Selection contract for graph nodes: file nodes update `selected_file`
    /// through the silent state path (the simulation must not be destroyed by
    /// an incidental redraw) and notify observers out of band. Folder nodes
    /// are inert.
    pub fn select_node(&mut self, path: &str, store: &mut StateStore) {
        let node = store
            .state()
            .file_tree
            .as_ref()
            .and_then(|tree| tree.find(path).cloned());

        let Some(node) = node else {
            return;
        };
        if !node.is_file() {
            return;
        }

        store.select_file_silent(Some(node));
        for observer in &self.observers {
            observer(path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::{build_tree, NodeKind, TreeEntry};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn sample_tree() -> FileNode {
        build_tree(
            "demo",
            &[
                TreeEntry {
                    path: "src/main.rs".into(),
                    kind: NodeKind::File,
                    size: Some(1),
                },
                TreeEntry {
                    path: "docs/guide.md".into(),
                    kind: NodeKind::File,
                    size: Some(1),
                },
            ],
        )
    }

    #[test]
    fn test_cleanup_is_idempotent() {
        let mut viz = VizController::new();
        viz.cleanup();
        viz.cleanup();

        viz.initialize(&sample_tree());
        assert!(viz.is_active());
        viz.cleanup();
        viz.cleanup();
        assert!(!viz.is_active());
    }

    #[test]
    fn test_at_most_one_simulation() {
        let mut viz = VizController::new();
        viz.initialize(&sample_tree());
        viz.initialize(&sample_tree());
        assert!(viz.is_active());
        assert!(viz.simulation().is_some());
    }

    #[test]
    fn test_file_selection_is_silent_and_observed() {
        let mut store = StateStore::new();
        let notified = Arc::new(AtomicUsize::new(0));
        let n = notified.clone();
        store.subscribe(move |_| {
            n.fetch_add(1, Ordering::SeqCst);
        });

        let tree = sample_tree();
        store.set_state(
            crate::state::StatePatch {
                file_tree: Some(Some(tree.clone())),
                ..Default::default()
            },
            true,
        );

        let mut viz = VizController::new();
        viz.initialize(&tree);

        let observed = Arc::new(AtomicUsize::new(0));
        let o = observed.clone();
        viz.on_selection(move |path| {
            assert_eq!(path, "src/main.rs");
            o.fetch_add(1, Ordering::SeqCst);
        });

        viz.select_node("src/main.rs", &mut store);

        assert_eq!(notified.load(Ordering::SeqCst), 0);
        assert_eq!(observed.load(Ordering::SeqCst), 1);
        assert_eq!(
            store
                .state()
                .selected_file
                .as_ref()
                .map(|f| f.path.as_str()),
            Some("src/main.rs")
        );
    }

    #[test]
    fn test_folder_selection_is_inert() {
        let mut store = StateStore::new();
        let tree = sample_tree();
        store.set_state(
            crate::state::StatePatch {
                file_tree: Some(Some(tree.clone())),
                ..Default::default()
            },
            true,
        );

        let mut viz = VizController::new();
        viz.initialize(&tree);

        let observed = Arc::new(AtomicUsize::new(0));
        let o = observed.clone();
        viz.on_selection(move |_| {
            o.fetch_add(1, Ordering::SeqCst);
        });

        viz.select_node("src", &mut store);

        assert_eq!(observed.load(Ordering::SeqCst), 0);
        assert!(store.state().selected_file.is_none());
    }
}
