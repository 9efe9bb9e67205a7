//! Single-object application state with explicit mutation entry points.
//!
//! The whole UI is drawn from one `AppState` snapshot. Every mutation goes
//! through [`StateStore::set_state`] (usually via an action helper), which
//! merges a partial patch and then runs the subscriber list synchronously.
//! A `silent` merge updates the state without running subscribers; it exists
//! so that updates which must not trigger a full redraw (keystroke mirroring,
//! selection made from inside the graph view) still keep the single source of
//! truth consistent.

use serde::{Deserialize, Serialize};

use crate::tree::FileNode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum View {
    #[default]
    Landing,
    Repo,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepoInfo {
    pub owner: String,
    pub repo: String,
    pub full_name: String,
    pub description: Option<String>,
    pub stars: u64,
    pub forks: u64,
    pub language: Option<String>,
    pub default_branch: String,
    pub html_url: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppState {
    pub view: View,
    pub repo_url: String,
    pub loading: bool,
    pub error: Option<String>,
    pub current_repo: Option<RepoInfo>,
    pub file_tree: Option<FileNode>,
    pub selected_file: Option<FileNode>,
}

/// Partial update, merged shallowly with last-write-wins per field. Optional
/// state fields use a second `Option` level so a patch can distinguish
/// "leave untouched" from "set to None".
#[derive(Debug, Default)]
pub struct StatePatch {
    pub view: Option<View>,
    pub repo_url: Option<String>,
    pub loading: Option<bool>,
    pub error: Option<Option<String>>,
    pub current_repo: Option<Option<RepoInfo>>,
    pub file_tree: Option<Option<FileNode>>,
    pub selected_file: Option<Option<FileNode>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriptionId(u64);

type Listener = Box<dyn FnMut(&AppState) + Send>;

#[derive(Default)]
pub struct StateStore {
    state: AppState,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_id: u64,
}

impl StateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the current state. Mutating the returned value never
    /// affects the store.
    pub fn state(&self) -> AppState {
        self.state.clone()
    }

    /// Merge `patch` into the state. Unless `silent`, every subscriber runs
    /// synchronously, in registration order, and sees the merged state.
    pub fn set_state(&mut self, patch: StatePatch, silent: bool) {
        if let Some(view) = patch.view {
            self.state.view = view;
        }
        if let Some(url) = patch.repo_url {
            self.state.repo_url = url;
        }
        if let Some(loading) = patch.loading {
            self.state.loading = loading;
        }
        if let Some(error) = patch.error {
            self.state.error = error;
        }
        if let Some(repo) = patch.current_repo {
            self.state.current_repo = repo;
        }
        if let Some(tree) = patch.file_tree {
            self.state.file_tree = tree;
        }
        if let Some(selected) = patch.selected_file {
            self.state.selected_file = selected;
        }

        if !silent {
            self.notify();
        }
    }

    pub fn subscribe(&mut self, listener: impl FnMut(&AppState) + Send + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) {
        self.listeners.retain(|(lid, _)| *lid != id);
    }

    /// Restore all fields to their defaults. Always notifies.
    pub fn reset_state(&mut self) {
        self.state = AppState::default();
        self.notify();
    }

    fn notify(&mut self) {
        for (_, listener) in self.listeners.iter_mut() {
            listener(&self.state);
        }
    }

    // Action helpers. Each encodes the silent/notify choice and field
    // combination for one logical transition, so call sites cannot get the
    // notification count wrong.

    /// Keystroke mirroring: silent, so typing never redraws the input away.
    pub fn set_repo_url(&mut self, url: impl Into<String>) {
        self.set_state(
            StatePatch {
                repo_url: Some(url.into()),
                ..Default::default()
            },
            true,
        );
    }

    pub fn set_loading(&mut self, loading: bool) {
        self.set_state(
            StatePatch {
                loading: Some(loading),
                error: Some(None),
                ..Default::default()
            },
            false,
        );
    }

    pub fn set_error(&mut self, message: impl Into<String>) {
        self.set_state(
            StatePatch {
                error: Some(Some(message.into())),
                loading: Some(false),
                ..Default::default()
            },
            false,
        );
    }

    /// Successful fetch: repo info, tree, view switch, loading and error
    /// cleared, one notification for the lot. `selected_file` is left alone.
    pub fn set_repo_data(&mut self, info: RepoInfo, tree: FileNode) {
        self.set_state(
            StatePatch {
                current_repo: Some(Some(info)),
                file_tree: Some(Some(tree)),
                view: Some(View::Repo),
                loading: Some(false),
                error: Some(None),
                ..Default::default()
            },
            false,
        );
    }

    pub fn select_file(&mut self, node: Option<FileNode>) {
        self.set_state(
            StatePatch {
                selected_file: Some(node),
                ..Default::default()
            },
            false,
        );
    }

    /// Selection made from inside the graph view: the simulation must survive,
    /// so no subscriber runs. Interested panels are told through the
    /// visualization controller's observer list instead.
    pub fn select_file_silent(&mut self, node: Option<FileNode>) {
        self.set_state(
            StatePatch {
                selected_file: Some(node),
                ..Default::default()
            },
            true,
        );
    }

    pub fn go_to_landing(&mut self) {
        self.reset_state();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn counter() -> (Arc<AtomicUsize>, impl FnMut(&AppState) + Send + 'static) {
        let count = Arc::new(AtomicUsize::new(0));
        let c = count.clone();
        (count, move |_: &AppState| {
            c.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[test]
    fn test_silent_updates_merge_without_notifying() {
        let mut store = StateStore::new();
        let (count, listener) = counter();
        store.subscribe(listener);

        store.set_repo_url("octo");
        store.set_repo_url("octocat/Hello");
        store.set_state(
            StatePatch {
                loading: Some(true),
                ..Default::default()
            },
            true,
        );

        assert_eq!(count.load(Ordering::SeqCst), 0);
        let state = store.state();
        assert_eq!(state.repo_url, "octocat/Hello");
        assert!(state.loading);
    }

    #[test]
    fn test_every_subscriber_runs_once_per_update_and_sees_new_state() {
        let mut store = StateStore::new();
        let (count_a, listener_a) = counter();
        store.subscribe(listener_a);

        let seen = Arc::new(AtomicUsize::new(0));
        let seen_clone = seen.clone();
        store.subscribe(move |s: &AppState| {
            // subscriber observes the merged state, not the old one
            if s.loading {
                seen_clone.fetch_add(1, Ordering::SeqCst);
            }
        });

        store.set_loading(true);
        assert_eq!(count_a.load(Ordering::SeqCst), 1);
        assert_eq!(seen.load(Ordering::SeqCst), 1);

        store.set_loading(false);
        assert_eq!(count_a.load(Ordering::SeqCst), 2);
        assert_eq!(seen.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_unsubscribe_stops_delivery() {
        let mut store = StateStore::new();
        let (count, listener) = counter();
        let id = store.subscribe(listener);

        store.set_loading(true);
        store.unsubscribe(id);
        store.set_loading(false);

        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_reset_always_notifies() {
        let mut store = StateStore::new();
        let (count, listener) = counter();
        store.subscribe(listener);

        store.reset_state();
        store.reset_state();

        assert_eq!(count.load(Ordering::SeqCst), 2);
        assert_eq!(store.state(), AppState::default());
    }

    #[test]
    fn test_invalid_explore_input_scenario() {
        // state starts at landing with empty input; a failed validation sets
        // error and leaves view/loading untouched
        let mut store = StateStore::new();
        assert_eq!(store.state().view, View::Landing);

        let err = crate::parser::parse_repo_input("not-a-url").unwrap_err();
        store.set_error(err.to_string());

        let state = store.state();
        assert_eq!(state.view, View::Landing);
        assert!(!state.loading);
        assert!(!state.error.as_deref().unwrap_or_default().is_empty());
    }

    #[test]
    fn test_successful_fetch_scenario() {
        let mut store = StateStore::new();
        store.set_loading(true);

        let info = RepoInfo {
            owner: "octocat".into(),
            repo: "Hello-World".into(),
            full_name: "octocat/Hello-World".into(),
            description: None,
            stars: 3,
            forks: 1,
            language: None,
            default_branch: "master".into(),
            html_url: "https://github.com/octocat/Hello-World".into(),
        };
        let tree = crate::tree::build_tree("Hello-World", &[]);
        store.set_repo_data(info, tree);

        let state = store.state();
        assert_eq!(state.view, View::Repo);
        assert_eq!(
            state.current_repo.as_ref().map(|r| r.full_name.as_str()),
            Some("octocat/Hello-World")
        );
        assert!(state.error.is_none());
        assert!(!state.loading);
        assert!(state.selected_file.is_none());
    }

    #[test]
    fn test_silent_selection_keeps_state_consistent() {
        let mut store = StateStore::new();
        let (count, listener) = counter();
        store.subscribe(listener);

        let node = crate::tree::FileNode::file("main.rs", "src/main.rs", Some(10));
        store.select_file_silent(Some(node.clone()));

        assert_eq!(count.load(Ordering::SeqCst), 0);
        assert_eq!(store.state().selected_file, Some(node));
    }
}
