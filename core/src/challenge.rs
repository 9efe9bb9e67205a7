//! Challenge-session state machine.
//!
//! Idle → Loading → Question(i) → Feedback(i) → … → Results → Idle. The
//! whole machine lives outside the application state store: every transition
//! happens inside a transient overlay that must neither trigger nor be
//! destroyed by a full redraw.

use crate::ai::Challenge;
use crate::cache::{BlobStore, CacheKey, ExplorerCache, CHALLENGE_SET_TTL};
use crate::progress::{self, Progress};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Question,
    Feedback,
    Results,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnswerOutcome {
    pub correct: bool,
    pub skipped: bool,
    pub points_awarded: u32,
}

/// One live run through a challenge set.
pub struct ChallengeSession {
    challenges: Vec<Challenge>,
    index: usize,
    phase: SessionPhase,
    outcomes: Vec<AnswerOutcome>,
}

impl ChallengeSession {
    /// A session only exists for a non-empty set.
    pub fn new(challenges: Vec<Challenge>) -> Option<Self> {
        if challenges.is_empty() {
            return None;
        }
        Some(Self {
            challenges,
            index: 0,
            phase: SessionPhase::Question,
            outcomes: Vec::new(),
        })
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn len(&self) -> usize {
        self.challenges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.challenges.is_empty()
    }

    pub fn current(&self) -> Option<&Challenge> {
        if self.phase == SessionPhase::Results {
            return None;
        }
        self.challenges.get(self.index)
    }

    pub fn last_outcome(&self) -> Option<&AnswerOutcome> {
        self.outcomes.last()
    }

    /// Answer the current question by option index. Correctness is exact
    /// string equality with the declared answer; durable progress is updated
    /// synchronously before the phase flips to Feedback.
    pub fn answer<S: BlobStore>(
        &mut self,
        option_index: usize,
        cache: &ExplorerCache<S>,
    ) -> Option<AnswerOutcome> {
        if self.phase != SessionPhase::Question {
            return None;
        }
        let challenge = self.challenges.get(self.index)?;
        let selected = challenge.options.get(option_index)?;

        let correct = *selected == challenge.correct_answer;
        let points_awarded = if correct { challenge.points } else { 0 };
        progress::record_answer(cache, correct, challenge.points);

        let outcome = AnswerOutcome {
            correct,
            skipped: false,
            points_awarded,
        };
        self.outcomes.push(outcome);
        self.phase = SessionPhase::Feedback;
        Some(outcome)
    }

    /// Skip: no points, streak untouched, but the session still advances.
    pub fn skip(&mut self) -> Option<AnswerOutcome> {
        if self.phase != SessionPhase::Question {
            return None;
        }
        let outcome = AnswerOutcome {
            correct: false,
            skipped: true,
            points_awarded: 0,
        };
        self.outcomes.push(outcome);
        self.phase = SessionPhase::Feedback;
        Some(outcome)
    }

    /// Feedback → next Question, or Results past the last question.
    pub fn advance(&mut self) {
        if self.phase != SessionPhase::Feedback {
            return;
        }
        if self.index + 1 < self.challenges.len() {
            self.index += 1;
            self.phase = SessionPhase::Question;
        } else {
            self.phase = SessionPhase::Results;
        }
    }

    pub fn correct_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.correct).count()
    }

    pub fn earned_points(&self) -> u32 {
        self.outcomes.iter().map(|o| o.points_awarded).sum()
    }

    /// Dismiss the results screen: count the completed set once and consume
    /// the session.
    pub fn dismiss<S: BlobStore>(self, cache: &ExplorerCache<S>) -> Progress {
        progress::record_set_completed(cache)
    }
}

/// Where the overlay currently is, including the pre-session phases the
/// session object itself cannot represent.
#[derive(Default)]
pub enum ChallengeFlow {
    #[default]
    Idle,
    Loading {
        module_index: usize,
    },
    Active {
        module_index: usize,
        session: ChallengeSession,
    },
}

impl ChallengeFlow {
    pub fn is_idle(&self) -> bool {
        matches!(self, ChallengeFlow::Idle)
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, ChallengeFlow::Loading { .. })
    }

    pub fn session_mut(&mut self) -> Option<&mut ChallengeSession> {
        match self {
            ChallengeFlow::Active { session, .. } => Some(session),
            _ => None,
        }
    }

    pub fn session(&self) -> Option<&ChallengeSession> {
        match self {
            ChallengeFlow::Active { session, .. } => Some(session),
            _ => None,
        }
    }

    /// Idle → Loading. Refused while a session or generation is in flight.
    pub fn begin(&mut self, module_index: usize) -> bool {
        if !self.is_idle() {
            return false;
        }
        *self = ChallengeFlow::Loading { module_index };
        true
    }

    /// Loading → Question(0) for a non-empty set; an empty or failed
    /// generation aborts straight back to Idle with no partial session.
    pub fn activate(&mut self, challenges: Vec<Challenge>) -> bool {
        let ChallengeFlow::Loading { module_index } = *self else {
            return false;
        };
        match ChallengeSession::new(challenges) {
            Some(session) => {
                *self = ChallengeFlow::Active {
                    module_index,
                    session,
                };
                true
            }
            None => {
                *self = ChallengeFlow::Idle;
                false
            }
        }
    }

    pub fn abort(&mut self) {
        *self = ChallengeFlow::Idle;
    }
}

/// Durable challenge-set cache keyed by repository and module, valid for 24h.
pub fn cached_challenges<S: BlobStore>(
    cache: &ExplorerCache<S>,
    full_name: &str,
    module_index: usize,
) -> Option<Vec<Challenge>> {
    cache.get(
        CacheKey::ChallengeSet {
            full_name,
            module_index,
        },
        Some(CHALLENGE_SET_TTL),
    )
}

pub fn store_challenges<S: BlobStore>(
    cache: &ExplorerCache<S>,
    full_name: &str,
    module_index: usize,
    challenges: &[Challenge],
) {
    cache.put(
        CacheKey::ChallengeSet {
            full_name,
            module_index,
        },
        &challenges,
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryStore;
    use crate::progress;

    fn question(points: u32) -> Challenge {
        Challenge {
            id: "q1".into(),
            kind: "multiple-choice".into(),
            question: "Pick the right answer".into(),
            options: vec!["A".into(), "B".into(), "C".into()],
            correct_answer: "B".into(),
            explanation: "B was right".into(),
            points,
        }
    }

    #[test]
    fn test_correct_answer_scores() {
        let cache = ExplorerCache::new(MemoryStore::new());
        let mut session = ChallengeSession::new(vec![question(25)]).unwrap();

        let outcome = session.answer(1, &cache).unwrap(); // "B"
        assert!(outcome.correct);
        assert_eq!(outcome.points_awarded, 25);
        assert_eq!(session.phase(), SessionPhase::Feedback);

        let p = progress::load(&cache);
        assert_eq!(p.total_xp, 25);
        assert_eq!(p.current_streak, 1);
    }

    #[test]
    fn test_wrong_answer_resets_streak_and_awards_nothing() {
        let cache = ExplorerCache::new(MemoryStore::new());
        progress::record_answer(&cache, true, 10); // streak 1 going in

        let mut session = ChallengeSession::new(vec![question(25)]).unwrap();
        let outcome = session.answer(0, &cache).unwrap(); // "A"
        assert!(!outcome.correct);
        assert_eq!(outcome.points_awarded, 0);

        let p = progress::load(&cache);
        assert_eq!(p.total_xp, 10);
        assert_eq!(p.current_streak, 0);
    }

    #[test]
    fn test_skip_touches_neither_xp_nor_streak() {
        let cache = ExplorerCache::new(MemoryStore::new());
        progress::record_answer(&cache, true, 10);

        let mut session = ChallengeSession::new(vec![question(25)]).unwrap();
        let outcome = session.skip().unwrap();
        assert!(outcome.skipped);
        assert_eq!(session.phase(), SessionPhase::Feedback);

        let p = progress::load(&cache);
        assert_eq!(p.total_xp, 10);
        assert_eq!(p.current_streak, 1);
        assert_eq!(p.total_answers, 1); // skips are not answers
    }

    #[test]
    fn test_advance_walks_to_results() {
        let cache = ExplorerCache::new(MemoryStore::new());
        let mut session = ChallengeSession::new(vec![question(5), question(5)]).unwrap();

        session.answer(1, &cache);
        session.advance();
        assert_eq!(session.phase(), SessionPhase::Question);
        assert_eq!(session.index(), 1);

        session.skip();
        session.advance();
        assert_eq!(session.phase(), SessionPhase::Results);
        assert!(session.current().is_none());
        assert_eq!(session.correct_count(), 1);
        assert_eq!(session.earned_points(), 5);
    }

    #[test]
    fn test_dismiss_counts_the_set_once_regardless_of_score() {
        let cache = ExplorerCache::new(MemoryStore::new());
        let mut session = ChallengeSession::new(vec![question(5)]).unwrap();
        session.skip(); // zero correct answers
        session.advance();

        let p = session.dismiss(&cache);
        assert_eq!(p.challenges_completed, 1);
        assert_eq!(progress::load(&cache).challenges_completed, 1);
    }

    #[test]
    fn test_empty_generation_aborts_to_idle() {
        let mut flow = ChallengeFlow::default();
        assert!(flow.begin(2));
        assert!(flow.is_loading());

        assert!(!flow.activate(Vec::new()));
        assert!(flow.is_idle());
    }

    #[test]
    fn test_cache_hit_skips_loading() {
        let cache = ExplorerCache::new(MemoryStore::new());
        store_challenges(&cache, "acme/widgets", 0, &[question(25)]);

        let hit = cached_challenges(&cache, "acme/widgets", 0).unwrap();
        assert_eq!(hit.len(), 1);

        let mut flow = ChallengeFlow::default();
        flow.begin(0);
        assert!(flow.activate(hit));
        assert_eq!(
            flow.session().unwrap().phase(),
            SessionPhase::Question
        );
        assert_eq!(flow.session().unwrap().index(), 0);
    }

    #[test]
    fn test_begin_refused_mid_session() {
        let mut flow = ChallengeFlow::default();
        flow.begin(0);
        flow.activate(vec![question(5)]);
        assert!(!flow.begin(1));
    }
}
