//! Application shell: owns the state store, the view-local state, the
//! independent controllers, and the async fetch tasks. All mutation funnels
//! through here; the render pass only reads.

use std::sync::Arc;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, warn};

use gitscope_core::ai::{
    AiClient, ChallengeRequest, ChatRequest, ExplainRequest, LearningPathRequest,
    LearningPathResult, StoredLearningPath,
};
use gitscope_core::cache::{CacheKey, DiskStore, ExplorerCache, FILE_CONTENT_TTL, REPO_TTL};
use gitscope_core::challenge::{self, ChallengeFlow, SessionPhase};
use gitscope_core::chat::ChatSession;
use gitscope_core::error::ExploreError;
use gitscope_core::github::{RateLimitStatus, RepoClient, RepoSnapshot, TrendingRepo};
use gitscope_core::parser::parse_repo_input;
use gitscope_core::progress::{self, Progress};
use gitscope_core::state::{StateStore, View};
use gitscope_core::viz::VizController;

use crate::event::{AppEvent, Event};
use crate::view::{self, Focus, Tab, ViewState};

const EXPLAIN_CONTENT_LIMIT: usize = 8000;
const FILE_SUMMARY_LIMIT: usize = 100;

pub struct App {
    pub store: StateStore,
    pub view: ViewState,
    pub viz: VizController,
    pub chat: ChatSession,
    pub challenges: ChallengeFlow,
    pub progress: Progress,
    pub trending: Vec<TrendingRepo>,
    pub cache: Arc<ExplorerCache<DiskStore>>,
    repo_client: Arc<RepoClient>,
    ai_client: Arc<AiClient>,
    tx: UnboundedSender<Event>,
    pub dirty: bool,
    pub should_quit: bool,
    generation: u64,
}

impl App {
    pub fn new(tx: UnboundedSender<Event>, ai_base: String) -> Self {
        Self::with_store(tx, ai_base, DiskStore::open())
    }

    pub fn with_store(tx: UnboundedSender<Event>, ai_base: String, store: DiskStore) -> Self {
        let cache = Arc::new(ExplorerCache::new(store));

        let mut store = StateStore::new();
        let render_tx = tx.clone();
        store.subscribe(move |_| {
            // the subscriber's only job is to wake the render engine
            let _ = render_tx.send(Event::App(AppEvent::RenderRequested));
        });

        let mut viz = VizController::new();
        let selection_tx = tx.clone();
        viz.on_selection(move |path| {
            let _ = selection_tx.send(Event::App(AppEvent::SelectionChanged(path.to_string())));
        });

        let mut view = ViewState::default();
        if let Some(tab) = cache.get::<String>(CacheKey::ActiveTab, None) {
            view.tab = Tab::from_str(&tab);
        }

        let progress = progress::load(&cache);

        Self {
            store,
            view,
            viz,
            chat: ChatSession::new(),
            challenges: ChallengeFlow::default(),
            progress,
            trending: Vec::new(),
            cache,
            repo_client: Arc::new(RepoClient::from_env()),
            ai_client: Arc::new(AiClient::new(ai_base)),
            tx,
            dirty: true,
            should_quit: false,
            generation: 0,
        }
    }

    pub fn rate_limit(&self) -> RateLimitStatus {
        self.repo_client.rate_limit()
    }

    pub fn handle(&mut self, event: Event) {
        match event {
            Event::Key(key) => self.on_key(key),
            Event::Resize => self.dirty = true,
            Event::Tick => self.on_tick(),
            Event::App(app_event) => self.on_app_event(app_event),
        }
    }

    fn on_tick(&mut self) {
        let animating = self
            .viz
            .simulation()
            .map(|s| s.is_running())
            .unwrap_or(false);
        self.viz.tick();
        if animating && self.view.tab == Tab::Graph {
            self.dirty = true;
        }
    }

    // ---- keyboard dispatch -------------------------------------------------

    fn on_key(&mut self, key: KeyEvent) {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.should_quit = true;
            return;
        }

        // overlays take the keyboard before the main view
        if !self.challenges.is_idle() {
            self.on_challenge_key(key);
            return;
        }
        if self.chat.open {
            self.on_chat_key(key);
            return;
        }

        match self.store.state().view {
            View::Landing => self.on_landing_key(key),
            View::Repo => self.on_repo_key(key),
        }
    }

    fn on_landing_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => self.should_quit = true,
            KeyCode::Enter => {
                let state = self.store.state();
                let input = if state.repo_url.trim().is_empty() {
                    self.cache
                        .history()
                        .get(self.view.history_cursor)
                        .map(|e| e.full_name.clone())
                        .unwrap_or_default()
                } else {
                    state.repo_url
                };
                self.explore(&input);
            }
            KeyCode::Up => {
                self.view.history_cursor = self.view.history_cursor.saturating_sub(1);
                self.dirty = true;
            }
            KeyCode::Down => {
                let max = self.cache.history().len().saturating_sub(1);
                self.view.history_cursor = (self.view.history_cursor + 1).min(max);
                self.dirty = true;
            }
            KeyCode::Backspace => {
                let mut url = self.store.state().repo_url;
                url.pop();
                // silent: the input echo is a local repaint, not a
                // subscriber-driven re-render
                self.store.set_repo_url(url);
                self.dirty = true;
            }
            KeyCode::Char(c) => {
                let mut url = self.store.state().repo_url;
                url.push(c);
                self.store.set_repo_url(url);
                self.dirty = true;
            }
            _ => {}
        }
    }

    fn on_repo_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Esc => self.go_to_landing(),
            KeyCode::Char('1') => self.switch_tab(Tab::Tree),
            KeyCode::Char('2') => self.switch_tab(Tab::Graph),
            KeyCode::Tab => {
                self.view.focus = self.view.focus.next();
                self.dirty = true;
            }
            KeyCode::Char('c') => {
                self.chat.toggle();
                self.dirty = true;
            }
            KeyCode::Char('e') => self.request_explanation(),
            KeyCode::Char('g') => self.request_learning_path(),
            _ => match self.view.focus {
                Focus::Explorer => match self.view.tab {
                    Tab::Tree => self.on_tree_key(key),
                    Tab::Graph => self.on_graph_key(key),
                },
                Focus::Detail => self.on_detail_key(key),
                Focus::Learning => self.on_learning_key(key),
            },
        }
    }

    fn on_tree_key(&mut self, key: KeyEvent) {
        let state = self.store.state();
        let Some(tree) = state.file_tree.as_ref() else {
            return;
        };
        let rows = view::visible_rows(tree, &self.view.expanded);
        if rows.is_empty() {
            return;
        }

        match key.code {
            KeyCode::Up => {
                self.view.tree_cursor = self.view.tree_cursor.saturating_sub(1);
                self.dirty = true;
            }
            KeyCode::Down => {
                self.view.tree_cursor = (self.view.tree_cursor + 1).min(rows.len() - 1);
                self.dirty = true;
            }
            KeyCode::Enter => {
                let Some(row) = rows.get(self.view.tree_cursor) else {
                    return;
                };
                if row.node.is_folder() {
                    let path = row.node.path.clone();
                    self.view.toggle_folder(&path);
                    self.dirty = true;
                } else {
                    let node = row.node.clone();
                    let path = node.path.clone();
                    // tree selection is an ordinary notifying action
                    self.store.select_file(Some(node));
                    self.view.file_panel.focus(&path);
                    self.request_file_content(&path);
                }
            }
            _ => {}
        }
    }

    fn on_graph_key(&mut self, key: KeyEvent) {
        let node_count = self.viz.simulation().map(|s| s.nodes.len()).unwrap_or(0);
        match key.code {
            KeyCode::Right | KeyCode::Char('n') if node_count > 0 => {
                self.view.graph_focus = (self.view.graph_focus + 1) % node_count;
                self.dirty = true;
            }
            KeyCode::Left | KeyCode::Char('p') if node_count > 0 => {
                self.view.graph_focus = (self.view.graph_focus + node_count - 1) % node_count;
                self.dirty = true;
            }
            KeyCode::Enter => {
                let path = self
                    .viz
                    .simulation()
                    .and_then(|s| s.nodes.get(self.view.graph_focus))
                    .map(|n| n.path.clone());
                if let Some(path) = path {
                    // silent state path + observer notification; the running
                    // simulation survives
                    self.viz.select_node(&path, &mut self.store);
                }
            }
            KeyCode::Char('h') => self.pan(-6.0, 0.0),
            KeyCode::Char('l') => self.pan(6.0, 0.0),
            KeyCode::Char('k') => self.pan(0.0, 6.0),
            KeyCode::Char('j') => self.pan(0.0, -6.0),
            KeyCode::Char('+') | KeyCode::Char('=') => self.zoom(1.2),
            KeyCode::Char('-') => self.zoom(1.0 / 1.2),
            _ => {}
        }
    }

    fn pan(&mut self, dx: f64, dy: f64) {
        self.view.graph_pan.0 += dx / self.view.graph_zoom;
        self.view.graph_pan.1 += dy / self.view.graph_zoom;
        self.dirty = true;
    }

    fn zoom(&mut self, factor: f64) {
        self.view.graph_zoom = (self.view.graph_zoom * factor).clamp(0.2, 5.0);
        self.dirty = true;
    }

    fn on_detail_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Up => {
                self.view.file_panel.scroll = self.view.file_panel.scroll.saturating_sub(1);
                self.dirty = true;
            }
            KeyCode::Down => {
                self.view.file_panel.scroll = self.view.file_panel.scroll.saturating_add(1);
                self.dirty = true;
            }
            _ => {}
        }
    }

    fn on_learning_key(&mut self, key: KeyEvent) {
        let module_count = match &self.view.learning.stored {
            Some(StoredLearningPath {
                result: LearningPathResult::Structured(path),
                ..
            }) => path.modules.len(),
            _ => 0,
        };

        match key.code {
            KeyCode::Up => {
                self.view.learning.cursor = self.view.learning.cursor.saturating_sub(1);
                self.dirty = true;
            }
            KeyCode::Down if module_count > 0 => {
                self.view.learning.cursor = (self.view.learning.cursor + 1).min(module_count - 1);
                self.dirty = true;
            }
            KeyCode::Enter if module_count > 0 => {
                self.complete_module(self.view.learning.cursor);
            }
            _ => {}
        }
    }

    fn on_chat_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => {
                self.chat.open = false;
                self.dirty = true;
            }
            KeyCode::Enter => self.send_chat(),
            KeyCode::Backspace => {
                self.view.chat_input.pop();
                self.dirty = true;
            }
            KeyCode::Char(c) => {
                self.view.chat_input.push(c);
                self.dirty = true;
            }
            _ => {}
        }
    }

    fn on_challenge_key(&mut self, key: KeyEvent) {
        self.dirty = true;

        if self.challenges.is_loading() {
            if key.code == KeyCode::Esc {
                self.challenges.abort();
            }
            return;
        }

        let phase = self.challenges.session().map(|s| s.phase());
        match (phase, key.code) {
            (Some(SessionPhase::Question), KeyCode::Char(c @ '1'..='9')) => {
                let option = (c as usize) - ('1' as usize);
                if let Some(session) = self.challenges.session_mut() {
                    if session.answer(option, &self.cache).is_some() {
                        self.progress = progress::load(&self.cache);
                    }
                }
            }
            (Some(SessionPhase::Question), KeyCode::Char('s')) => {
                if let Some(session) = self.challenges.session_mut() {
                    session.skip();
                }
            }
            (Some(SessionPhase::Question), KeyCode::Esc) => self.challenges.abort(),
            (Some(SessionPhase::Feedback), KeyCode::Enter | KeyCode::Char(' ')) => {
                if let Some(session) = self.challenges.session_mut() {
                    session.advance();
                }
            }
            (Some(SessionPhase::Feedback), KeyCode::Esc) => self.challenges.abort(),
            (Some(SessionPhase::Results), KeyCode::Enter | KeyCode::Esc) => {
                let flow = std::mem::take(&mut self.challenges);
                if let ChallengeFlow::Active { session, .. } = flow {
                    self.progress = session.dismiss(&self.cache);
                }
            }
            _ => {}
        }
    }

    // ---- actions -----------------------------------------------------------

    /// Fill the landing page's suggestion list, from cache when possible.
    pub fn request_trending(&mut self) {
        use gitscope_core::cache::TRENDING_TTL;

        if let Some(trending) = self
            .cache
            .get::<Vec<TrendingRepo>>(CacheKey::Trending, Some(TRENDING_TTL))
        {
            self.trending = trending;
            self.dirty = true;
            return;
        }

        let client = self.repo_client.clone();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let result = client.fetch_trending(5).await;
            let _ = tx.send(Event::App(AppEvent::TrendingLoaded { result }));
        });
    }

    pub fn explore(&mut self, input: &str) {
        let locator = match parse_repo_input(input) {
            Ok(locator) => locator,
            Err(err) => {
                self.store.set_error(err.to_string());
                return;
            }
        };

        self.generation += 1;
        let generation = self.generation;
        self.store.set_loading(true);

        let key = CacheKey::Repo {
            owner: &locator.owner,
            repo: &locator.repo,
        };
        if let Some(snapshot) = self.cache.get::<RepoSnapshot>(key, Some(REPO_TTL)) {
            debug!(repo = %locator.full_name(), "repository cache hit");
            self.apply_snapshot(snapshot, false);
            return;
        }

        let client = self.repo_client.clone();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let result = client
                .fetch_repository(&locator.owner, &locator.repo)
                .await;
            let _ = tx.send(Event::App(AppEvent::RepoLoaded { generation, result }));
        });
    }

    fn apply_snapshot(&mut self, snapshot: RepoSnapshot, from_network: bool) {
        let info = snapshot.info.clone();

        if from_network {
            self.cache.put(
                CacheKey::Repo {
                    owner: &info.owner,
                    repo: &info.repo,
                },
                &snapshot,
            );
        }
        self.cache.push_history(&info.full_name, &info.html_url);

        // fresh repo ⇒ fresh view-local state and fresh controllers
        self.view.reset_for_repo();
        self.chat.clear();
        self.challenges.abort();
        self.view.learning.stored = self.cache.get(
            CacheKey::LearningPath {
                full_name: &info.full_name,
            },
            None,
        );

        self.viz.cleanup();
        if self.view.tab == Tab::Graph {
            self.viz.initialize(&snapshot.tree);
        }

        // one notification for info + tree + view switch + cleared flags
        self.store.set_repo_data(snapshot.info, snapshot.tree);
    }

    fn switch_tab(&mut self, tab: Tab) {
        if self.view.tab == tab {
            return;
        }
        self.view.tab = tab;
        self.cache
            .put(CacheKey::ActiveTab, &tab.as_str().to_string());

        // teardown-before-replace: the graph pane is about to disappear or
        // reappear, so the simulation lifecycle follows the container
        match tab {
            Tab::Graph => {
                if let Some(tree) = self.store.state().file_tree.as_ref() {
                    self.viz.initialize(tree);
                }
            }
            Tab::Tree => self.viz.cleanup(),
        }
        self.view.graph_focus = 0;
        self.dirty = true;
    }

    fn go_to_landing(&mut self) {
        self.viz.cleanup();
        self.chat.clear();
        self.challenges.abort();
        self.view.learning = Default::default();
        self.view.file_panel = Default::default();
        self.store.go_to_landing();
    }

    fn current_repo_name(&self) -> Option<String> {
        self.store.state().current_repo.map(|r| r.full_name)
    }

    fn request_file_content(&mut self, path: &str) {
        let Some(repo) = self.store.state().current_repo else {
            return;
        };

        let key = CacheKey::FileContent {
            owner: &repo.owner,
            repo: &repo.repo,
            path,
        };
        if let Some(content) = self.cache.get::<String>(key, Some(FILE_CONTENT_TTL)) {
            self.view.file_panel.content = Some(content);
            self.view.file_panel.content_loading = false;
            self.dirty = true;
            return;
        }

        let client = self.repo_client.clone();
        let tx = self.tx.clone();
        let full_name = repo.full_name.clone();
        let (owner, name, path) = (repo.owner.clone(), repo.repo.clone(), path.to_string());
        tokio::spawn(async move {
            let result = client.fetch_file_content(&owner, &name, &path).await;
            let _ = tx.send(Event::App(AppEvent::FileLoaded {
                repo: full_name,
                path,
                result,
            }));
        });
    }

    fn request_explanation(&mut self) {
        let state = self.store.state();
        let (Some(repo), Some(selected)) = (state.current_repo, state.selected_file) else {
            return;
        };
        if self.view.file_panel.explain_loading {
            return;
        }
        let Some(content) = self.view.file_panel.content.clone() else {
            self.view.file_panel.explain_error =
                Some("File content not loaded yet".to_string());
            self.dirty = true;
            return;
        };

        self.view.file_panel.explain_loading = true;
        self.view.file_panel.explain_error = None;
        self.dirty = true;

        let request = ExplainRequest {
            repo: repo.full_name.clone(),
            path: selected.path.clone(),
            language: selected.extension.clone(),
            content: truncate(&content, EXPLAIN_CONTENT_LIMIT),
        };
        let client = self.ai_client.clone();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let result = client.explain(&request).await;
            let _ = tx.send(Event::App(AppEvent::ExplainReady {
                repo: request.repo.clone(),
                path: request.path.clone(),
                result,
            }));
        });
    }

    fn request_learning_path(&mut self) {
        let state = self.store.state();
        let Some(repo) = state.current_repo else {
            return;
        };
        if self.view.learning.stored.is_some() || self.view.learning.loading {
            return;
        }

        self.view.learning.loading = true;
        self.view.learning.error = None;
        self.dirty = true;

        let file_summary = state
            .file_tree
            .as_ref()
            .map(|tree| summarize_tree(tree))
            .unwrap_or_default();

        let request = LearningPathRequest {
            repo: repo.full_name.clone(),
            description: repo.description.clone(),
            language: repo.language.clone(),
            file_summary,
        };
        let client = self.ai_client.clone();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let result = client.learning_path(&request).await;
            let _ = tx.send(Event::App(AppEvent::LearningPathReady {
                repo: request.repo.clone(),
                result,
            }));
        });
    }

    fn complete_module(&mut self, module_index: usize) {
        let Some(repo) = self.current_repo_name() else {
            return;
        };
        let Some(stored) = self.view.learning.stored.as_mut() else {
            return;
        };
        let LearningPathResult::Structured(path) = &stored.result else {
            return;
        };
        let Some(module) = path.modules.get(module_index).cloned() else {
            return;
        };

        if !stored.completed_modules.contains(&module_index) {
            stored.completed_modules.push(module_index);
            self.cache.put(
                CacheKey::LearningPath { full_name: &repo },
                &*stored,
            );
        }

        if !self.challenges.begin(module_index) {
            return;
        }
        self.dirty = true;

        // 24h challenge cache first; a hit goes straight to Question(0)
        if let Some(cached) = challenge::cached_challenges(&self.cache, &repo, module_index) {
            self.challenges.activate(cached);
            return;
        }

        let request = ChallengeRequest {
            repo: repo.clone(),
            module_title: module.title.clone(),
            module_description: module.description.clone(),
            files: module.files.clone(),
            objectives: module.objectives.clone(),
        };
        let client = self.ai_client.clone();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let result = client.generate_challenges(&request).await;
            let _ = tx.send(Event::App(AppEvent::ChallengesReady {
                repo: request.repo.clone(),
                module_index,
                result,
            }));
        });
    }

    fn send_chat(&mut self) {
        let message = self.view.chat_input.trim().to_string();
        if message.is_empty() || self.chat.loading {
            return;
        }
        let Some(repo) = self.store.state().current_repo else {
            return;
        };
        self.view.chat_input.clear();

        self.chat.push_user(message.clone());
        self.chat.loading = true;
        self.dirty = true;

        let context = format!(
            "Repository: {} — {}. Currently viewing: {}",
            repo.full_name,
            repo.description.as_deref().unwrap_or("no description"),
            self.view
                .file_panel
                .path
                .as_deref()
                .unwrap_or("no file selected"),
        );
        let request = ChatRequest {
            repo: repo.full_name.clone(),
            message,
            context,
            history: self.chat.context(),
        };
        let client = self.ai_client.clone();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let result = client.chat(&request).await;
            let _ = tx.send(Event::App(AppEvent::ChatReply {
                repo: request.repo.clone(),
                result,
            }));
        });
    }

    // ---- async results -----------------------------------------------------

    fn on_app_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::RenderRequested => self.dirty = true,

            AppEvent::SelectionChanged(path) => {
                // graph click: the detail panel catches up out of band while
                // the simulation keeps running untouched
                self.view.file_panel.focus(&path);
                self.request_file_content(&path);
                self.dirty = true;
            }

            AppEvent::TrendingLoaded { result } => {
                // suggestions are decoration; failures just leave the list empty
                if let Ok(trending) = result {
                    self.cache.put(CacheKey::Trending, &trending);
                    self.trending = trending;
                    self.dirty = true;
                }
            }

            AppEvent::RepoLoaded { generation, result } => {
                if generation != self.generation {
                    debug!(generation, "dropping stale repository response");
                    return;
                }
                match result {
                    Ok(snapshot) => self.apply_snapshot(snapshot, true),
                    Err(err) => self.store.set_error(explore_error_message(&err)),
                }
            }

            AppEvent::FileLoaded { repo, path, result } => {
                if !self.is_current_file(&repo, &path) {
                    return;
                }
                self.view.file_panel.content_loading = false;
                match result {
                    Ok(content) => {
                        if let Some(info) = self.store.state().current_repo {
                            self.cache.put(
                                CacheKey::FileContent {
                                    owner: &info.owner,
                                    repo: &info.repo,
                                    path: &path,
                                },
                                &content,
                            );
                        }
                        self.view.file_panel.content = Some(content);
                    }
                    Err(err) => {
                        self.view.file_panel.content_error = Some(err.to_string());
                    }
                }
                self.dirty = true;
            }

            AppEvent::ExplainReady { repo, path, result } => {
                if !self.is_current_file(&repo, &path) {
                    return;
                }
                let panel = &mut self.view.file_panel;
                panel.explain_loading = false;
                match result {
                    Ok(text) => panel.explanation = Some(text),
                    Err(err) => panel.explain_error = Some(err.to_string()),
                }
                self.dirty = true;
            }

            AppEvent::LearningPathReady { repo, result } => {
                if self.current_repo_name().as_deref() != Some(repo.as_str()) {
                    return;
                }
                self.view.learning.loading = false;
                match result {
                    Ok(result) => {
                        let stored = StoredLearningPath {
                            result,
                            completed_modules: Vec::new(),
                        };
                        self.cache
                            .put(CacheKey::LearningPath { full_name: &repo }, &stored);
                        self.view.learning.stored = Some(stored);
                        self.view.learning.cursor = 0;
                    }
                    Err(err) => self.view.learning.error = Some(err.to_string()),
                }
                self.dirty = true;
            }

            AppEvent::ChallengesReady {
                repo,
                module_index,
                result,
            } => {
                if self.current_repo_name().as_deref() != Some(repo.as_str()) {
                    self.challenges.abort();
                    return;
                }
                match result {
                    Ok(challenges) if !challenges.is_empty() => {
                        challenge::store_challenges(
                            &self.cache,
                            &repo,
                            module_index,
                            &challenges,
                        );
                        self.challenges.activate(challenges);
                    }
                    Ok(_) | Err(_) => {
                        // no partial sessions: abort silently back to Idle
                        warn!("challenge generation failed or returned nothing");
                        self.challenges.abort();
                    }
                }
                self.dirty = true;
            }

            AppEvent::ChatReply { repo, result } => {
                if self.current_repo_name().as_deref() != Some(repo.as_str()) {
                    return;
                }
                self.chat.loading = false;
                match result {
                    Ok(text) => self.chat.push_assistant(text),
                    Err(err) => self.chat.push_error(err.to_string()),
                }
                self.dirty = true;
            }
        }
    }

    fn is_current_file(&self, repo: &str, path: &str) -> bool {
        self.current_repo_name().as_deref() == Some(repo)
            && self.view.file_panel.path.as_deref() == Some(path)
    }
}

fn explore_error_message(err: &ExploreError) -> String {
    match err {
        ExploreError::NotFound => {
            "Repository not found. Check the owner and name, or the repo may be private."
                .to_string()
        }
        other => other.to_string(),
    }
}

fn truncate(text: &str, limit: usize) -> String {
    if text.len() <= limit {
        return text.to_string();
    }
    let mut end = limit;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    text[..end].to_string()
}

fn summarize_tree(tree: &gitscope_core::tree::FileNode) -> String {
    let mut paths = Vec::new();
    collect_paths(tree, &mut paths);
    paths.truncate(FILE_SUMMARY_LIMIT);
    paths.join("\n")
}

fn collect_paths(node: &gitscope_core::tree::FileNode, out: &mut Vec<String>) {
    if out.len() >= FILE_SUMMARY_LIMIT {
        return;
    }
    if node.is_file() {
        out.push(node.path.clone());
    }
    for child in node.children.as_deref().into_iter().flatten() {
        collect_paths(child, out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gitscope_core::github::RepoSnapshot;
    use gitscope_core::state::RepoInfo;
    use gitscope_core::tree::{build_tree, NodeKind, TreeEntry};
    use tokio::sync::mpsc;

    fn test_app() -> (App, mpsc::UnboundedReceiver<Event>, tempfile::TempDir) {
        let (tx, rx) = mpsc::unbounded_channel();
        let dir = tempfile::tempdir().unwrap();
        let store = DiskStore::at(dir.path().to_path_buf());
        (
            App::with_store(tx, "http://127.0.0.1:1".to_string(), store),
            rx,
            dir,
        )
    }

    fn snapshot(full_name: &str) -> RepoSnapshot {
        let (owner, repo) = full_name.split_once('/').unwrap();
        RepoSnapshot {
            info: RepoInfo {
                owner: owner.into(),
                repo: repo.into(),
                full_name: full_name.into(),
                description: None,
                stars: 0,
                forks: 0,
                language: None,
                default_branch: "main".into(),
                html_url: format!("https://github.com/{full_name}"),
            },
            tree: build_tree(
                repo,
                &[TreeEntry {
                    path: "src/main.rs".into(),
                    kind: NodeKind::File,
                    size: Some(1),
                }],
            ),
        }
    }

    #[tokio::test]
    async fn test_invalid_explore_input_sets_error_only() {
        let (mut app, _rx, _dir) = test_app();
        app.explore("not-a-url");

        let state = app.store.state();
        assert_eq!(state.view, View::Landing);
        assert!(!state.loading);
        assert!(state.error.is_some());
    }

    #[tokio::test]
    async fn test_stale_repo_response_is_dropped() {
        let (mut app, _rx, _dir) = test_app();

        app.explore("octocat/first");
        let stale_generation = 1;
        app.explore("octocat/second");

        app.handle(Event::App(AppEvent::RepoLoaded {
            generation: stale_generation,
            result: Ok(snapshot("octocat/first")),
        }));
        // the stale response must not have won
        assert_eq!(app.store.state().view, View::Landing);

        app.handle(Event::App(AppEvent::RepoLoaded {
            generation: 2,
            result: Ok(snapshot("octocat/second")),
        }));
        assert_eq!(
            app.store.state().current_repo.map(|r| r.full_name),
            Some("octocat/second".to_string())
        );
    }

    #[tokio::test]
    async fn test_successful_load_switches_view_and_seeds_history() {
        let (mut app, mut rx, _dir) = test_app();
        app.explore("octocat/Hello-World");
        app.handle(Event::App(AppEvent::RepoLoaded {
            generation: 1,
            result: Ok(snapshot("octocat/Hello-World")),
        }));

        let state = app.store.state();
        assert_eq!(state.view, View::Repo);
        assert!(state.error.is_none());
        assert!(!state.loading);
        assert!(state.selected_file.is_none());

        // the store subscriber asked the render engine to wake up
        let mut saw_render_request = false;
        while let Ok(event) = rx.try_recv() {
            if matches!(event, Event::App(AppEvent::RenderRequested)) {
                saw_render_request = true;
            }
        }
        assert!(saw_render_request);
    }

    #[tokio::test]
    async fn test_graph_selection_bypasses_subscribers() {
        let (mut app, mut rx, _dir) = test_app();
        app.handle(Event::App(AppEvent::RepoLoaded {
            generation: 0,
            result: Ok(snapshot("octocat/Hello-World")),
        }));
        while rx.try_recv().is_ok() {}

        app.switch_tab(Tab::Graph);
        app.viz.select_node("src/main.rs", &mut app.store);

        assert_eq!(
            app.store
                .state()
                .selected_file
                .map(|f| f.path),
            Some("src/main.rs".to_string())
        );

        let mut render_requests = 0;
        let mut selection_signals = 0;
        while let Ok(event) = rx.try_recv() {
            match event {
                Event::App(AppEvent::RenderRequested) => render_requests += 1,
                Event::App(AppEvent::SelectionChanged(_)) => selection_signals += 1,
                _ => {}
            }
        }
        assert_eq!(render_requests, 0);
        assert_eq!(selection_signals, 1);
    }

    #[tokio::test]
    async fn test_stale_chat_reply_is_ignored() {
        let (mut app, _rx, _dir) = test_app();
        app.handle(Event::App(AppEvent::RepoLoaded {
            generation: 0,
            result: Ok(snapshot("octocat/Hello-World")),
        }));

        app.handle(Event::App(AppEvent::ChatReply {
            repo: "someone/else".to_string(),
            result: Ok("hello from the past".to_string()),
        }));
        assert!(app.chat.messages().is_empty());
    }
}
