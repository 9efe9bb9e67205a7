//! Typed key-value caching over a durable blob store.
//!
//! Every entry is a JSON envelope carrying its write time; reads past the
//! per-key TTL, unreadable blobs and unparseable JSON all degrade to a cache
//! miss. Nothing in here ever surfaces an error to the user.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

pub const REPO_TTL: Duration = Duration::from_secs(3600);
pub const FILE_CONTENT_TTL: Duration = Duration::from_secs(24 * 3600);
pub const CHALLENGE_SET_TTL: Duration = Duration::from_secs(24 * 3600);
pub const TRENDING_TTL: Duration = Duration::from_secs(24 * 3600);

const HISTORY_LIMIT: usize = 20;

/// Composite cache keys. Free-form components (paths) are hashed so they
/// cannot collide with or escape the key namespace.
#[derive(Debug, Clone, PartialEq)]
pub enum CacheKey<'a> {
    Repo { owner: &'a str, repo: &'a str },
    FileContent { owner: &'a str, repo: &'a str, path: &'a str },
    LearningPath { full_name: &'a str },
    ChallengeSet { full_name: &'a str, module_index: usize },
    Progress,
    History,
    Trending,
    ActiveTab,
}

impl CacheKey<'_> {
    pub fn storage_key(&self) -> String {
        match self {
            CacheKey::Repo { owner, repo } => format!("repo-{owner}-{repo}"),
            CacheKey::FileContent { owner, repo, path } => {
                format!("content-{owner}-{repo}-{}", digest(path))
            }
            CacheKey::LearningPath { full_name } => {
                format!("learning-{}", full_name.replace('/', "-"))
            }
            CacheKey::ChallengeSet {
                full_name,
                module_index,
            } => format!(
                "challenges-{}-{module_index}",
                full_name.replace('/', "-")
            ),
            CacheKey::Progress => "progress".to_string(),
            CacheKey::History => "history".to_string(),
            CacheKey::Trending => "trending".to_string(),
            CacheKey::ActiveTab => "active-tab".to_string(),
        }
    }
}

fn digest(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    let out = format!("{:x}", hasher.finalize());
    out[..16].to_string()
}

/// The durable blob store boundary. No transactions, no multi-key atomicity;
/// writes are fire-and-forget from the caller's point of view.
pub trait BlobStore: Send {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
}

/// One file per key under the user cache directory.
pub struct DiskStore {
    dir: PathBuf,
}

impl DiskStore {
    pub fn open() -> Self {
        let dir = Self::cache_dir();
        let _ = fs::create_dir_all(&dir);
        Self { dir }
    }

    pub fn at(dir: PathBuf) -> Self {
        let _ = fs::create_dir_all(&dir);
        Self { dir }
    }

    fn cache_dir() -> PathBuf {
        if let Ok(xdg_cache) = std::env::var("XDG_CACHE_HOME") {
            PathBuf::from(xdg_cache).join("gitscope")
        } else if let Ok(home) = std::env::var("HOME") {
            PathBuf::from(home).join(".cache").join("gitscope")
        } else {
            PathBuf::from("/tmp/gitscope-cache")
        }
    }

    pub fn dir(&self) -> &PathBuf {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl BlobStore for DiskStore {
    fn get(&self, key: &str) -> Option<String> {
        fs::read_to_string(self.path_for(key)).ok()
    }

    fn set(&self, key: &str, value: &str) {
        // quota or permission failures degrade to "nothing cached"
        let _ = fs::write(self.path_for(key), value);
    }
}

#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl BlobStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.lock().ok()?.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(key.to_string(), value.to_string());
        }
    }
}

#[derive(Serialize, Deserialize)]
struct Envelope<T> {
    stored_at: u64,
    value: T,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub full_name: String,
    pub url: String,
    pub explored_at: u64,
}

pub struct ExplorerCache<S: BlobStore> {
    store: S,
}

impl<S: BlobStore> ExplorerCache<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Read a typed entry. `ttl: None` means the entry never expires.
    pub fn get<T: DeserializeOwned>(&self, key: CacheKey, ttl: Option<Duration>) -> Option<T> {
        let raw = self.store.get(&key.storage_key())?;
        let envelope: Envelope<T> = serde_json::from_str(&raw).ok()?;

        if let Some(ttl) = ttl {
            let age = now_secs().saturating_sub(envelope.stored_at);
            if age > ttl.as_secs() {
                return None;
            }
        }

        Some(envelope.value)
    }

    pub fn put<T: Serialize>(&self, key: CacheKey, value: &T) {
        let envelope = Envelope {
            stored_at: now_secs(),
            value,
        };
        if let Ok(raw) = serde_json::to_string(&envelope) {
            self.store.set(&key.storage_key(), &raw);
        }
    }

    pub fn history(&self) -> Vec<HistoryEntry> {
        self.get(CacheKey::History, None).unwrap_or_default()
    }

    /// Most-recent-first, deduplicated by repository, capped.
    pub fn push_history(&self, full_name: &str, url: &str) {
        let mut entries = self.history();
        entries.retain(|e| e.full_name != full_name);
        entries.insert(
            0,
            HistoryEntry {
                full_name: full_name.to_string(),
                url: url.to_string(),
                explored_at: now_secs(),
            },
        );
        entries.truncate(HISTORY_LIMIT);
        self.put(CacheKey::History, &entries);
    }
}

pub fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        let cache = ExplorerCache::new(MemoryStore::new());
        let key = CacheKey::Repo {
            owner: "acme",
            repo: "widgets",
        };

        cache.put(key.clone(), &vec!["a".to_string(), "b".to_string()]);
        let back: Option<Vec<String>> = cache.get(key, Some(REPO_TTL));
        assert_eq!(back, Some(vec!["a".to_string(), "b".to_string()]));
    }

    #[test]
    fn test_learning_path_round_trip() {
        use crate::ai::{LearningModule, LearningPath, LearningPathResult, StoredLearningPath};

        let cache = ExplorerCache::new(MemoryStore::new());
        let stored = StoredLearningPath {
            result: LearningPathResult::Structured(LearningPath {
                overview: "start with the entry points".into(),
                prerequisites: vec!["Rust basics".into()],
                modules: vec![LearningModule {
                    title: "Entry points".into(),
                    description: "where execution starts".into(),
                    files: vec!["src/main.rs".into()],
                    objectives: vec!["find main".into()],
                    estimated_time: Some("30m".into()),
                }],
                projects: vec!["add a flag".into()],
            }),
            completed_modules: vec![0],
        };

        cache.put(
            CacheKey::LearningPath {
                full_name: "acme/widgets",
            },
            &stored,
        );
        let back: Option<StoredLearningPath> = cache.get(
            CacheKey::LearningPath {
                full_name: "acme/widgets",
            },
            None,
        );
        assert_eq!(back, Some(stored));
    }

    #[test]
    fn test_expired_entry_is_a_miss() {
        let cache = ExplorerCache::new(MemoryStore::new());
        let key = CacheKey::ChallengeSet {
            full_name: "acme/widgets",
            module_index: 0,
        };
        cache.put(key.clone(), &42u32);

        let fresh: Option<u32> = cache.get(key.clone(), Some(CHALLENGE_SET_TTL));
        assert_eq!(fresh, Some(42));

        let expired: Option<u32> = cache.get(key, Some(Duration::ZERO));
        assert_eq!(expired, None);
    }

    #[test]
    fn test_corrupt_json_is_a_miss() {
        let store = MemoryStore::new();
        store.set(
            &CacheKey::Progress.storage_key(),
            "{not json at all",
        );
        let cache = ExplorerCache::new(store);
        let missing: Option<u32> = cache.get(CacheKey::Progress, None);
        assert_eq!(missing, None);
    }

    #[test]
    fn test_disk_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ExplorerCache::new(DiskStore::at(dir.path().to_path_buf()));
        cache.put(CacheKey::ActiveTab, &"graph".to_string());
        let tab: Option<String> = cache.get(CacheKey::ActiveTab, None);
        assert_eq!(tab.as_deref(), Some("graph"));
    }

    #[test]
    fn test_history_dedupes_and_orders() {
        let cache = ExplorerCache::new(MemoryStore::new());
        cache.push_history("a/one", "https://github.com/a/one");
        cache.push_history("b/two", "https://github.com/b/two");
        cache.push_history("a/one", "https://github.com/a/one");

        let names: Vec<String> = cache.history().into_iter().map(|e| e.full_name).collect();
        assert_eq!(names, vec!["a/one".to_string(), "b/two".to_string()]);
    }

    #[test]
    fn test_composite_keys_do_not_collide() {
        let a = CacheKey::ChallengeSet {
            full_name: "acme/widgets",
            module_index: 1,
        };
        let b = CacheKey::ChallengeSet {
            full_name: "acme/widgets-1",
            module_index: 0,
        };
        assert_ne!(a.storage_key(), b.storage_key());

        let c = CacheKey::FileContent {
            owner: "acme",
            repo: "widgets",
            path: "a/b.rs",
        };
        let d = CacheKey::FileContent {
            owner: "acme",
            repo: "widgets",
            path: "a-b.rs",
        };
        assert_ne!(c.storage_key(), d.storage_key());
    }
}
