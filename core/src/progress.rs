//! Durable gamification progress.
//!
//! Created lazily with all-zero defaults, mutated only through
//! [`record_answer`] and [`record_set_completed`], and written back to the
//! blob store synchronously after each mutation.

use serde::{Deserialize, Serialize};

use crate::cache::{now_secs, BlobStore, CacheKey, ExplorerCache};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Progress {
    #[serde(default)]
    pub total_xp: u64,
    #[serde(default)]
    pub current_streak: u32,
    #[serde(default)]
    pub longest_streak: u32,
    #[serde(default)]
    pub challenges_completed: u32,
    #[serde(default)]
    pub correct_answers: u32,
    #[serde(default)]
    pub total_answers: u32,
    #[serde(default)]
    pub last_activity: u64,
}

pub fn load<S: BlobStore>(cache: &ExplorerCache<S>) -> Progress {
    cache.get(CacheKey::Progress, None).unwrap_or_default()
}

/// Apply one non-skipped answer: XP only on a correct answer, streak
/// increments on correct and resets on incorrect. Skips never reach this
/// function.
pub fn record_answer<S: BlobStore>(
    cache: &ExplorerCache<S>,
    correct: bool,
    points: u32,
) -> Progress {
    let mut progress = load(cache);

    progress.total_answers += 1;
    if correct {
        progress.correct_answers += 1;
        progress.total_xp += u64::from(points);
        progress.current_streak += 1;
        progress.longest_streak = progress.longest_streak.max(progress.current_streak);
    } else {
        progress.current_streak = 0;
    }
    progress.last_activity = now_secs();

    cache.put(CacheKey::Progress, &progress);
    progress
}

/// One finished challenge set, counted exactly once when its results are
/// dismissed, however many questions were answered correctly.
pub fn record_set_completed<S: BlobStore>(cache: &ExplorerCache<S>) -> Progress {
    let mut progress = load(cache);
    progress.challenges_completed += 1;
    progress.last_activity = now_secs();
    cache.put(CacheKey::Progress, &progress);
    progress
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryStore;

    #[test]
    fn test_lazy_default() {
        let cache = ExplorerCache::new(MemoryStore::new());
        assert_eq!(load(&cache), Progress::default());
    }

    #[test]
    fn test_correct_answer_awards_and_extends_streak() {
        let cache = ExplorerCache::new(MemoryStore::new());

        let p = record_answer(&cache, true, 25);
        assert_eq!(p.total_xp, 25);
        assert_eq!(p.current_streak, 1);
        assert_eq!(p.longest_streak, 1);

        let p = record_answer(&cache, true, 10);
        assert_eq!(p.total_xp, 35);
        assert_eq!(p.current_streak, 2);

        // persisted synchronously, not just returned
        assert_eq!(load(&cache).total_xp, 35);
    }

    #[test]
    fn test_incorrect_answer_resets_streak_only() {
        let cache = ExplorerCache::new(MemoryStore::new());
        record_answer(&cache, true, 25);
        record_answer(&cache, true, 25);

        let p = record_answer(&cache, false, 25);
        assert_eq!(p.total_xp, 50);
        assert_eq!(p.current_streak, 0);
        assert_eq!(p.longest_streak, 2);
        assert_eq!(p.total_answers, 3);
        assert_eq!(p.correct_answers, 2);
    }

    #[test]
    fn test_set_completion_counter() {
        let cache = ExplorerCache::new(MemoryStore::new());
        let p = record_set_completed(&cache);
        assert_eq!(p.challenges_completed, 1);
        let p = record_set_completed(&cache);
        assert_eq!(p.challenges_completed, 2);
    }
}
