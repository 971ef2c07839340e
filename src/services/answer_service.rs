//! Answer intake and time-sensitive scoring.

use std::time::Duration;

use tracing::debug;
use uuid::Uuid;

use super::broadcast;
use crate::{
    config::ScoringPolicy,
    dao::models::AnswerRecordEntity,
    dto::ws::ServerEvent,
    error::ServiceError,
    state::AppState,
};

/// Points awarded for an answer submitted `elapsed` into a window of
/// `window`. Incorrect answers always score zero; correct answers get the
/// base award plus a time bonus scaling linearly with the remaining window.
pub fn compute_score(
    policy: &ScoringPolicy,
    correct: bool,
    elapsed: Duration,
    window: Duration,
) -> u32 {
    if !correct {
        return 0;
    }
    if window.is_zero() {
        return policy.base_award;
    }
    let remaining = window.saturating_sub(elapsed);
    let fraction = remaining.as_secs_f64() / window.as_secs_f64();
    let bonus = (fraction * f64::from(policy.max_time_bonus)).round() as u32;
    policy.base_award + bonus.min(policy.max_time_bonus)
}

/// Validate, score and persist one submitted answer, then push the private
/// result to the submitting connection.
///
/// Late, out-of-session and duplicate submissions are discarded without
/// feedback; only storage failures surface to the submitter.
pub async fn submit_answer(
    state: &AppState,
    connection_id: Uuid,
    quiz_id: Uuid,
    participant_id: Uuid,
    question_id: Uuid,
    selected_option: u32,
) -> Result<(), ServiceError> {
    let store = state.require_quiz_store().await?;

    let Some(session) = state.sessions().get(quiz_id) else {
        debug!(%quiz_id, "discarding answer for quiz with no live session");
        return Ok(());
    };
    if session.active_question != Some(question_id) {
        debug!(%quiz_id, %question_id, "discarding answer for inactive question");
        return Ok(());
    }

    let elapsed = session.elapsed();
    if elapsed > session.window {
        debug!(%quiz_id, %question_id, ?elapsed, "discarding answer past the window");
        return Ok(());
    }

    let Some(question) = store.find_question(question_id).await? else {
        debug!(%question_id, "discarding answer for unknown question");
        return Ok(());
    };
    if selected_option as usize >= question.options.len() {
        debug!(%question_id, selected_option, "discarding out-of-range option");
        return Ok(());
    }

    let correct = selected_option == question.correct_index;
    let delta = compute_score(&state.config().scoring, correct, elapsed, session.window);

    let record = AnswerRecordEntity {
        question_id,
        selected_option,
        correct,
        answer_time_ms: elapsed.as_millis() as u64,
    };

    // The store applies answer and score in one atomic step and refuses a
    // second answer for the same question.
    let Some(updated) = store.record_answer(participant_id, record, delta).await? else {
        debug!(%participant_id, %question_id, "discarding duplicate or orphan answer");
        return Ok(());
    };

    debug!(%quiz_id, %participant_id, %question_id, correct, delta, "answer accepted");

    broadcast::send_to_connection(
        state,
        connection_id,
        &ServerEvent::AnswerResult {
            correct,
            score_delta: delta,
            total_score: updated.score,
        },
    );

    // Visibility is re-read after the awaits above; a toggle may have
    // landed while the write was in flight.
    let visible = state
        .sessions()
        .get(quiz_id)
        .map(|session| session.leaderboard_visible)
        .unwrap_or(false);
    if visible {
        broadcast::broadcast_leaderboard(state, quiz_id).await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> ScoringPolicy {
        ScoringPolicy::default()
    }

    #[test]
    fn incorrect_answers_score_zero() {
        let score = compute_score(
            &policy(),
            false,
            Duration::from_secs(1),
            Duration::from_secs(30),
        );
        assert_eq!(score, 0);
    }

    #[test]
    fn instant_answer_takes_full_bonus() {
        let policy = policy();
        let score = compute_score(&policy, true, Duration::ZERO, Duration::from_secs(30));
        assert_eq!(score, policy.base_award + policy.max_time_bonus);
    }

    #[test]
    fn last_moment_answer_takes_base_only() {
        let policy = policy();
        let score = compute_score(
            &policy,
            true,
            Duration::from_secs(30),
            Duration::from_secs(30),
        );
        assert_eq!(score, policy.base_award);
    }

    #[test]
    fn faster_answers_never_score_less() {
        let policy = policy();
        let window = Duration::from_secs(30);
        let mut previous = u32::MAX;
        for tenths in 0..=300 {
            let elapsed = Duration::from_millis(tenths * 100);
            let score = compute_score(&policy, true, elapsed, window);
            assert!(score <= previous, "score increased as the answer got slower");
            previous = score;
        }
    }

    #[test]
    fn zero_window_still_awards_base() {
        let policy = policy();
        let score = compute_score(&policy, true, Duration::ZERO, Duration::ZERO);
        assert_eq!(score, policy.base_award);
    }
}
