//! Ephemeral per-session state.
//!
//! A session entry exists only while a quiz is live. Everything durable
//! lives in the store; losing this registry on restart loses at most the
//! currently open answer window.

use std::time::Duration;

use dashmap::DashMap;
use tokio::{task::AbortHandle, time::Instant};
use uuid::Uuid;

/// Live-session snapshot for one quiz.
#[derive(Debug, Clone)]
pub struct SessionState {
    /// Question currently accepting answers, if any.
    pub active_question: Option<Uuid>,
    /// When the active question was pushed.
    pub question_started_at: Instant,
    /// Length of the current answer window.
    pub window: Duration,
    /// Whether presentation screens currently show the leaderboard.
    pub leaderboard_visible: bool,
}

impl SessionState {
    /// State of a freshly started session with no question open.
    pub fn waiting() -> Self {
        Self {
            active_question: None,
            question_started_at: Instant::now(),
            window: Duration::ZERO,
            leaderboard_visible: false,
        }
    }

    /// State with `question` open for `window` starting now.
    pub fn for_question(question: Uuid, window: Duration, leaderboard_visible: bool) -> Self {
        Self {
            active_question: Some(question),
            question_started_at: Instant::now(),
            window,
            leaderboard_visible,
        }
    }

    /// Time elapsed since the active question was pushed.
    pub fn elapsed(&self) -> Duration {
        self.question_started_at.elapsed()
    }
}

struct SessionEntry {
    state: SessionState,
    window_task: Option<AbortHandle>,
}

impl Drop for SessionEntry {
    fn drop(&mut self) {
        if let Some(task) = self.window_task.take() {
            task.abort();
        }
    }
}

/// Registry of live sessions keyed by quiz id.
#[derive(Default)]
pub struct SessionRegistry {
    entries: DashMap<Uuid, SessionEntry>,
}

impl SessionRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Install or replace the session state of a quiz. Any window timer
    /// belonging to the previous state is aborted.
    pub fn set(&self, quiz_id: Uuid, state: SessionState) {
        if let Some(mut entry) = self.entries.get_mut(&quiz_id) {
            if let Some(task) = entry.window_task.take() {
                task.abort();
            }
            entry.state = state;
            return;
        }
        self.entries.insert(
            quiz_id,
            SessionEntry {
                state,
                window_task: None,
            },
        );
    }

    /// Snapshot of the session state, if the quiz is live.
    pub fn get(&self, quiz_id: Uuid) -> Option<SessionState> {
        self.entries.get(&quiz_id).map(|entry| entry.state.clone())
    }

    /// Whether the quiz currently has a live session.
    pub fn contains(&self, quiz_id: Uuid) -> bool {
        self.entries.contains_key(&quiz_id)
    }

    /// Remove a session and abort its pending window timer.
    pub fn clear(&self, quiz_id: Uuid) {
        // SessionEntry::drop aborts the timer.
        self.entries.remove(&quiz_id);
    }

    /// Attach the abort handle of the window-close timer to a session.
    pub fn set_window_task(&self, quiz_id: Uuid, task: AbortHandle) {
        if let Some(mut entry) = self.entries.get_mut(&quiz_id) {
            if let Some(previous) = entry.window_task.replace(task) {
                previous.abort();
            }
        } else {
            // Session ended between spawn and registration.
            task.abort();
        }
    }

    /// Mutate the session state in place. Returns false when the quiz has
    /// no live session.
    pub fn update<F>(&self, quiz_id: Uuid, mutate: F) -> bool
    where
        F: FnOnce(&mut SessionState),
    {
        match self.entries.get_mut(&quiz_id) {
            Some(mut entry) => {
                mutate(&mut entry.state);
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn set_replaces_state_and_aborts_previous_timer() {
        let registry = SessionRegistry::new();
        let quiz = Uuid::new_v4();
        let question = Uuid::new_v4();

        registry.set(quiz, SessionState::waiting());
        let timer = tokio::spawn(async {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        });
        registry.set_window_task(quiz, timer.abort_handle());

        registry.set(
            quiz,
            SessionState::for_question(question, Duration::from_secs(30), false),
        );
        assert!(timer.await.unwrap_err().is_cancelled());
        assert_eq!(registry.get(quiz).unwrap().active_question, Some(question));
    }

    #[tokio::test]
    async fn clear_aborts_pending_timer() {
        let registry = SessionRegistry::new();
        let quiz = Uuid::new_v4();

        registry.set(quiz, SessionState::waiting());
        let timer = tokio::spawn(async {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        });
        registry.set_window_task(quiz, timer.abort_handle());

        registry.clear(quiz);
        assert!(timer.await.unwrap_err().is_cancelled());
        assert!(!registry.contains(quiz));
    }

    #[tokio::test]
    async fn register_timer_for_ended_session_aborts_immediately() {
        let registry = SessionRegistry::new();
        let timer = tokio::spawn(async {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        });
        registry.set_window_task(Uuid::new_v4(), timer.abort_handle());
        assert!(timer.await.unwrap_err().is_cancelled());
    }

    #[test]
    fn update_reports_missing_session() {
        let registry = SessionRegistry::new();
        let quiz = Uuid::new_v4();
        assert!(!registry.update(quiz, |state| state.leaderboard_visible = true));

        registry.set(quiz, SessionState::waiting());
        assert!(registry.update(quiz, |state| state.leaderboard_visible = true));
        assert!(registry.get(quiz).unwrap().leaderboard_visible);
    }
}
