//! Session store
//!
//! Holds the single source of truth for a live poll: whether a presenter
//! session is running, the current question, the red/green tally and the
//! set of voter ids that already voted on the current question.
//!
//! Invalid or disallowed votes are absorbed silently. No operation here
//! returns an error; [`VoteOutcome`] only reports what happened so the
//! transports can decide whether to broadcast.
//!
//! State machine (derived, see [`SessionPhase`]):
//!
//! ```text
//! AwaitingQuestion --question--> VotingOpen --close--> VotingClosed
//!        ^                          |                       |
//!        +----------reset-----------+-----------------------+
//!
//! (any) --end--> NoSession --question--> VotingOpen
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, info};

use crate::Error;

/// One of the two answers an audience member can give
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteColor {
    Red,
    Green,
}

impl VoteColor {
    pub fn as_str(&self) -> &'static str {
        match self {
            VoteColor::Red => "red",
            VoteColor::Green => "green",
        }
    }
}

impl fmt::Display for VoteColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VoteColor {
    type Err = Error;

    /// Exact, case-sensitive match on `"red"` / `"green"`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "red" => Ok(VoteColor::Red),
            "green" => Ok(VoteColor::Green),
            other => Err(Error::InvalidInput(format!("unknown color: {other}"))),
        }
    }
}

/// Vote counts for the current question only
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tally {
    pub red: u32,
    pub green: u32,
}

impl Tally {
    pub fn total(&self) -> u32 {
        self.red + self.green
    }

    fn record(&mut self, color: VoteColor) {
        match color {
            VoteColor::Red => self.red += 1,
            VoteColor::Green => self.green += 1,
        }
    }
}

/// Derived view of where the session is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SessionPhase {
    /// Presenter ended the session (`active == false`)
    NoSession,
    /// Session live, no question posed
    AwaitingQuestion,
    /// Question posed and votes accepted
    VotingOpen,
    /// Question posed, voting closed, final tally visible
    VotingClosed,
}

/// Read-only snapshot returned by the `status` action
///
/// Field names follow the wire format (`sessionActive`, `votingOpen`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub session_active: bool,
    pub question: Option<String>,
    pub voting_open: bool,
    pub votes: Tally,
    pub total: u32,
}

/// Result of [`SessionStore::cast_vote`]
///
/// Only `Accepted` changes state. The other variants are no-ops.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteOutcome {
    /// Vote counted; carries the updated tally
    Accepted(Tally),
    VotingClosed,
    AlreadyVoted,
    InvalidColor,
    MissingVoter,
}

impl VoteOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, VoteOutcome::Accepted(_))
    }
}

/// The single session record
///
/// Created at process start with `active = true` and no question.
#[derive(Debug)]
pub struct SessionStore {
    active: bool,
    question: Option<String>,
    tally: Tally,
    voting_open: bool,
    voted_ids: HashSet<String>,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore {
    pub fn new() -> Self {
        Self {
            active: true,
            question: None,
            tally: Tally::default(),
            voting_open: false,
            voted_ids: HashSet::new(),
        }
    }

    /// Snapshot of the current state, no side effects
    pub fn status(&self) -> SessionSnapshot {
        SessionSnapshot {
            session_active: self.active,
            question: self.question.clone(),
            voting_open: self.voting_open,
            votes: self.tally,
            total: self.tally.total(),
        }
    }

    pub fn phase(&self) -> SessionPhase {
        if !self.active {
            SessionPhase::NoSession
        } else if self.voting_open {
            SessionPhase::VotingOpen
        } else if self.question.is_some() {
            SessionPhase::VotingClosed
        } else {
            SessionPhase::AwaitingQuestion
        }
    }

    /// Log the change from `before` to the current phase, if any
    pub fn note_transition(&self, before: SessionPhase) -> SessionPhase {
        let after = self.phase();
        if after != before {
            info!("Session phase {:?} -> {:?}", before, after);
        }
        after
    }

    /// Pose a new question and open voting
    ///
    /// Always starts a fresh round: tally zeroed, voter set emptied,
    /// session (re)activated.
    pub fn pose_question(&mut self, text: impl Into<String>) {
        let text = text.into();
        info!("New question posed: {:?}", text);
        self.clear_round();
        self.question = Some(text);
        self.voting_open = true;
        self.active = true;
    }

    /// Count a vote if voting is open and the voter has not voted yet
    ///
    /// `color` must be exactly `"red"` or `"green"`; an empty `voter_id`
    /// counts as missing.
    pub fn cast_vote(&mut self, color: &str, voter_id: &str) -> VoteOutcome {
        if !self.voting_open {
            debug!("Ignoring vote from {voter_id:?}: voting closed");
            return VoteOutcome::VotingClosed;
        }
        if voter_id.is_empty() {
            debug!("Ignoring vote without voter id");
            return VoteOutcome::MissingVoter;
        }
        let color = match color.parse::<VoteColor>() {
            Ok(color) => color,
            Err(_) => {
                debug!("Ignoring vote from {voter_id:?}: invalid color {color:?}");
                return VoteOutcome::InvalidColor;
            }
        };
        if !self.voted_ids.insert(voter_id.to_string()) {
            debug!("Ignoring duplicate vote from {voter_id:?}");
            return VoteOutcome::AlreadyVoted;
        }

        self.tally.record(color);
        debug!(
            "Vote {} from {voter_id:?} accepted ({}-{})",
            color, self.tally.red, self.tally.green
        );
        VoteOutcome::Accepted(self.tally)
    }

    /// Stop accepting votes; the tally stays visible until reset
    pub fn close_voting(&mut self) -> Tally {
        self.voting_open = false;
        info!(
            "Voting closed: red={} green={} total={}",
            self.tally.red,
            self.tally.green,
            self.tally.total()
        );
        self.tally
    }

    /// Drop the current question and its votes; `active` is untouched
    pub fn reset_voting(&mut self) {
        self.clear_round();
        self.question = None;
        self.voting_open = false;
        info!("Voting reset");
    }

    /// Reset and mark the session inactive
    pub fn end_session(&mut self) {
        self.reset_voting();
        self.active = false;
        info!("Session ended");
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn is_voting_open(&self) -> bool {
        self.voting_open
    }

    pub fn question(&self) -> Option<&str> {
        self.question.as_deref()
    }

    pub fn tally(&self) -> Tally {
        self.tally
    }

    /// Number of distinct voters on the current question
    pub fn voter_count(&self) -> usize {
        self.voted_ids.len()
    }

    // Tally and voter set always reset together
    fn clear_round(&mut self) {
        self.tally = Tally::default();
        self.voted_ids.clear();
    }
}

/// Cloneable handle to the one [`SessionStore`] owned by a server
///
/// Every operation takes the lock for its whole duration, so each request
/// or event mutates the store as one uninterrupted unit.
#[derive(Clone, Default)]
pub struct SharedSession {
    inner: Arc<Mutex<SessionStore>>,
}

impl SharedSession {
    pub fn new(store: SessionStore) -> Self {
        Self {
            inner: Arc::new(Mutex::new(store)),
        }
    }

    /// Lock the store for a compound operation (mutate, then broadcast)
    pub async fn lock(&self) -> MutexGuard<'_, SessionStore> {
        self.inner.lock().await
    }

    pub async fn status(&self) -> SessionSnapshot {
        self.inner.lock().await.status()
    }

    pub async fn pose_question(&self, text: impl Into<String>) {
        let text = text.into();
        self.apply(move |store| store.pose_question(text)).await;
    }

    pub async fn cast_vote(&self, color: &str, voter_id: &str) -> VoteOutcome {
        self.apply(|store| store.cast_vote(color, voter_id)).await
    }

    pub async fn close_voting(&self) -> Tally {
        self.apply(SessionStore::close_voting).await
    }

    pub async fn reset_voting(&self) {
        self.apply(SessionStore::reset_voting).await;
    }

    pub async fn end_session(&self) {
        self.apply(SessionStore::end_session).await;
    }

    // One locked mutation, with its phase change logged
    async fn apply<T>(&self, op: impl FnOnce(&mut SessionStore) -> T) -> T {
        let mut store = self.inner.lock().await;
        let before = store.phase();
        let output = op(&mut *store);
        store.note_transition(before);
        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_store(question: &str) -> SessionStore {
        let mut store = SessionStore::new();
        store.pose_question(question);
        store
    }

    #[test]
    fn test_new_store_awaits_question() {
        let store = SessionStore::new();
        let status = store.status();

        assert!(status.session_active);
        assert_eq!(status.question, None);
        assert!(!status.voting_open);
        assert_eq!(status.votes, Tally::default());
        assert_eq!(status.total, 0);
        assert_eq!(store.phase(), SessionPhase::AwaitingQuestion);
    }

    #[test]
    fn test_distinct_voters_all_counted() {
        let mut store = open_store("Pizza?");
        for i in 0..25 {
            let color = if i % 3 == 0 { "red" } else { "green" };
            assert!(store.cast_vote(color, &format!("voter-{i}")).is_accepted());
        }

        let tally = store.tally();
        assert_eq!(tally.red, 9);
        assert_eq!(tally.green, 16);
        assert_eq!(tally.total() as usize, store.voter_count());
    }

    #[test]
    fn test_duplicate_vote_is_noop() {
        let mut store = open_store("Coffee?");
        assert!(store.cast_vote("red", "A").is_accepted());

        let outcome = store.cast_vote("green", "A");
        assert_eq!(outcome, VoteOutcome::AlreadyVoted);
        assert_eq!(store.tally(), Tally { red: 1, green: 0 });
        assert_eq!(store.voter_count(), 1);
    }

    #[test]
    fn test_vote_while_closed_is_noop() {
        let mut store = SessionStore::new();
        assert_eq!(store.cast_vote("red", "A"), VoteOutcome::VotingClosed);
        assert_eq!(store.tally().total(), 0);

        store.pose_question("Tea?");
        store.close_voting();
        assert_eq!(store.cast_vote("green", "B"), VoteOutcome::VotingClosed);
        assert_eq!(store.tally().total(), 0);
        assert_eq!(store.voter_count(), 0);
    }

    #[test]
    fn test_invalid_color_does_not_consume_voter() {
        let mut store = open_store("Cats?");
        assert_eq!(store.cast_vote("blue", "A"), VoteOutcome::InvalidColor);
        assert_eq!(store.cast_vote("Red", "A"), VoteOutcome::InvalidColor);
        assert_eq!(store.voter_count(), 0);

        // Same voter can still cast a valid vote afterwards
        assert!(store.cast_vote("red", "A").is_accepted());
        assert_eq!(store.tally(), Tally { red: 1, green: 0 });
    }

    #[test]
    fn test_missing_voter_id_is_noop() {
        let mut store = open_store("Dogs?");
        assert_eq!(store.cast_vote("green", ""), VoteOutcome::MissingVoter);
        assert_eq!(store.tally().total(), 0);
    }

    #[test]
    fn test_pose_question_starts_fresh_round() {
        let mut store = open_store("First?");
        store.cast_vote("red", "A");
        store.cast_vote("green", "B");
        store.close_voting();
        store.end_session();

        store.pose_question("Second?");
        assert_eq!(store.tally(), Tally::default());
        assert_eq!(store.voter_count(), 0);
        assert!(store.is_voting_open());
        assert!(store.is_active());
        assert_eq!(store.question(), Some("Second?"));
        assert_eq!(store.phase(), SessionPhase::VotingOpen);

        // Voter "A" may vote again on the new question
        assert!(store.cast_vote("green", "A").is_accepted());
    }

    #[test]
    fn test_close_preserves_tally() {
        let mut store = open_store("Rain?");
        store.cast_vote("red", "A");
        store.cast_vote("red", "B");

        let tally = store.close_voting();
        assert_eq!(tally, Tally { red: 2, green: 0 });
        assert_eq!(store.tally(), tally);
        assert_eq!(store.voter_count(), 2);
        assert!(!store.is_voting_open());
        assert_eq!(store.phase(), SessionPhase::VotingClosed);
    }

    #[test]
    fn test_reset_keeps_session_active() {
        let mut store = open_store("Snow?");
        store.cast_vote("green", "A");
        store.reset_voting();

        let status = store.status();
        assert!(status.session_active);
        assert_eq!(status.question, None);
        assert!(!status.voting_open);
        assert_eq!(status.total, 0);
        assert_eq!(store.voter_count(), 0);
        assert_eq!(store.phase(), SessionPhase::AwaitingQuestion);
    }

    #[test]
    fn test_end_session_deactivates() {
        let mut store = open_store("Wind?");
        store.cast_vote("green", "A");
        store.end_session();

        let status = store.status();
        assert!(!status.session_active);
        assert_eq!(status.question, None);
        assert!(!status.voting_open);
        assert_eq!(status.votes, Tally::default());
        assert_eq!(store.voter_count(), 0);
        assert_eq!(store.phase(), SessionPhase::NoSession);
    }

    #[test]
    fn test_like_it_scenario() {
        let mut store = SessionStore::new();
        store.pose_question("Like it?");
        store.cast_vote("red", "A");
        store.cast_vote("green", "A");
        assert_eq!(store.tally(), Tally { red: 1, green: 0 });
        store.cast_vote("green", "B");

        let tally = store.close_voting();
        assert_eq!(tally, Tally { red: 1, green: 1 });
        assert_eq!(tally.total(), 2);
    }

    #[test]
    fn test_snapshot_wire_format() {
        let mut store = open_store("Ready?");
        store.cast_vote("green", "A");

        let json = serde_json::to_value(store.status()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "sessionActive": true,
                "question": "Ready?",
                "votingOpen": true,
                "votes": { "red": 0, "green": 1 },
                "total": 1
            })
        );
    }

    #[test]
    fn test_color_parsing() {
        assert_eq!("red".parse::<VoteColor>().unwrap(), VoteColor::Red);
        assert_eq!("green".parse::<VoteColor>().unwrap(), VoteColor::Green);
        assert!("".parse::<VoteColor>().is_err());
        assert!("GREEN".parse::<VoteColor>().is_err());
        assert_eq!(VoteColor::Green.to_string(), "green");
    }

    #[test]
    fn test_note_transition_reports_new_phase() {
        let mut store = SessionStore::new();
        let before = store.phase();
        assert_eq!(store.note_transition(before), SessionPhase::AwaitingQuestion);

        store.pose_question("Move?");
        assert_eq!(store.note_transition(before), SessionPhase::VotingOpen);

        let before = store.phase();
        store.cast_vote("red", "A");
        assert_eq!(store.note_transition(before), SessionPhase::VotingOpen);
    }

    #[tokio::test]
    async fn test_shared_session_walks_phases() {
        let session = SharedSession::default();
        session.pose_question("Walk?").await;
        assert_eq!(session.lock().await.phase(), SessionPhase::VotingOpen);

        assert_eq!(session.close_voting().await, Tally::default());
        assert_eq!(session.lock().await.phase(), SessionPhase::VotingClosed);

        session.reset_voting().await;
        assert_eq!(session.lock().await.phase(), SessionPhase::AwaitingQuestion);

        session.end_session().await;
        assert_eq!(session.lock().await.phase(), SessionPhase::NoSession);
    }

    #[tokio::test]
    async fn test_concurrent_distinct_voters_counted_once() {
        let session = SharedSession::default();
        session.pose_question("Parallel?").await;

        let mut handles = Vec::new();
        for i in 0..64 {
            let session = session.clone();
            handles.push(tokio::spawn(async move {
                let color = if i % 2 == 0 { "red" } else { "green" };
                session.cast_vote(color, &format!("id-{i}")).await
            }));
        }
        for handle in handles {
            assert!(handle.await.unwrap().is_accepted());
        }

        let store = session.lock().await;
        assert_eq!(store.tally(), Tally { red: 32, green: 32 });
        assert_eq!(store.voter_count(), 64);
    }
}
