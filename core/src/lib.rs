pub mod ai;
pub mod cache;
pub mod challenge;
pub mod chat;
pub mod error;
pub mod github;
pub mod graph;
pub mod parser;
pub mod progress;
pub mod state;
pub mod tree;
pub mod viz;

pub use ai::{AiClient, Challenge, LearningPath, LearningPathResult, StoredLearningPath};
pub use cache::{BlobStore, CacheKey, DiskStore, ExplorerCache, MemoryStore};
pub use challenge::{ChallengeFlow, ChallengeSession, SessionPhase};
pub use chat::{ChatMessage, ChatSession, Role};
pub use error::ExploreError;
pub use github::{RepoClient, RepoSnapshot};
pub use graph::GraphSimulation;
pub use parser::{parse_repo_input, RepoLocator};
pub use progress::Progress;
pub use state::{AppState, RepoInfo, StatePatch, StateStore, View};
pub use tree::{build_tree, FileNode, NodeKind, TreeEntry};
pub use viz::VizController;
