//! End-to-end session flows against the in-process store.

use std::{sync::Arc, time::Duration};

use axum::extract::ws::Message;
use tokio::sync::mpsc::{self, UnboundedReceiver};
use uuid::Uuid;

use live_quiz_back::{
    config::{AppConfig, SharedSecret},
    dao::{
        memory::MemoryQuizStore,
        models::{ParticipantEntity, QuestionEntity, QuizEntity},
    },
    dto::ws::{ClientMessage, ServerEvent},
    services::{lifecycle_service, quiz_service, websocket_service::handle_client_message},
    state::{AppState, SharedState},
};

const KEY: &str = "sekret";

async fn test_state() -> SharedState {
    let state = AppState::new(AppConfig::default(), Arc::new(SharedSecret::new(KEY)));
    state
        .install_quiz_store(Arc::new(MemoryQuizStore::new()))
        .await;
    state
}

async fn seed_quiz(state: &SharedState, questions: usize) -> (QuizEntity, Vec<QuestionEntity>) {
    let quiz = quiz_service::create_quiz(state, "Capitals".into(), String::new())
        .await
        .unwrap();
    let mut seeded = Vec::new();
    for n in 0..questions {
        let question = quiz_service::add_question(
            state,
            quiz.id,
            format!("Question {n}"),
            vec!["right".into(), "wrong".into()],
            0,
            Some(30),
        )
        .await
        .unwrap();
        seeded.push(question);
    }
    (quiz, seeded)
}

fn open_connection(state: &SharedState) -> (Uuid, UnboundedReceiver<Message>) {
    let connection_id = Uuid::new_v4();
    let (tx, rx) = mpsc::unbounded_channel();
    state.rooms().register(connection_id, tx);
    (connection_id, rx)
}

/// Join a named participant and attach a connection to the participant room.
async fn join_participant(
    state: &SharedState,
    quiz: &QuizEntity,
    name: &str,
) -> (ParticipantEntity, Uuid, UnboundedReceiver<Message>) {
    let (_, participant) = quiz_service::join_quiz(state, quiz.join_code.clone(), name.into())
        .await
        .unwrap();
    let (connection_id, mut rx) = open_connection(state);
    handle_client_message(
        state,
        connection_id,
        ClientMessage::JoinQuiz {
            quiz_id: quiz.id,
            participant_id: participant.id,
        },
    )
    .await;
    assert!(matches!(
        drain(&mut rx).first(),
        Some(ServerEvent::Joined { ok: true })
    ));
    (participant, connection_id, rx)
}

fn drain(rx: &mut UnboundedReceiver<Message>) -> Vec<ServerEvent> {
    let mut events = Vec::new();
    while let Ok(frame) = rx.try_recv() {
        if let Message::Text(raw) = frame {
            events.push(serde_json::from_str(&raw).unwrap());
        }
    }
    events
}

fn submit(quiz: &QuizEntity, participant: &ParticipantEntity, question: Uuid, option: u32) -> ClientMessage {
    ClientMessage::SubmitAnswer {
        quiz_id: quiz.id,
        participant_id: participant.id,
        question_id: question,
        selected_option: option,
    }
}

#[tokio::test]
async fn starting_a_session_pushes_no_question() {
    let state = test_state().await;
    let (quiz, _) = seed_quiz(&state, 2).await;
    let (_, _, mut rx) = join_participant(&state, &quiz, "ann").await;

    lifecycle_service::start_quiz(&state, quiz.id, KEY).await.unwrap();

    let events = drain(&mut rx);
    assert!(events.iter().any(|e| matches!(e, ServerEvent::QuizStart { .. })));
    assert!(!events.iter().any(|e| matches!(e, ServerEvent::NewQuestion { .. })));

    let session = state.sessions().get(quiz.id).unwrap();
    assert_eq!(session.active_question, None);
}

#[tokio::test]
async fn advancing_past_the_last_question_ends_the_session() {
    let state = test_state().await;
    let (quiz, questions) = seed_quiz(&state, 2).await;
    let (_, _, mut rx) = join_participant(&state, &quiz, "ann").await;

    lifecycle_service::start_quiz(&state, quiz.id, KEY).await.unwrap();
    lifecycle_service::advance_question(&state, quiz.id, KEY, None).await.unwrap();
    lifecycle_service::advance_question(&state, quiz.id, KEY, None).await.unwrap();
    lifecycle_service::advance_question(&state, quiz.id, KEY, None).await.unwrap();

    let events = drain(&mut rx);
    let pushed: Vec<Uuid> = events
        .iter()
        .filter_map(|e| match e {
            ServerEvent::NewQuestion { id, .. } => Some(*id),
            _ => None,
        })
        .collect();
    assert_eq!(pushed, vec![questions[0].id, questions[1].id]);
    assert!(events.iter().any(|e| matches!(e, ServerEvent::QuizEnd { .. })));

    assert!(!state.sessions().contains(quiz.id));
    let store = state.quiz_store().await.unwrap();
    let stored = store.find_quiz(quiz.id).await.unwrap().unwrap();
    assert!(!stored.is_live);
}

#[tokio::test(start_paused = true)]
async fn answers_after_the_window_are_rejected() {
    let state = test_state().await;
    let (quiz, questions) = seed_quiz(&state, 1).await;
    let (participant, connection, mut rx) = join_participant(&state, &quiz, "ann").await;

    lifecycle_service::start_quiz(&state, quiz.id, KEY).await.unwrap();
    lifecycle_service::advance_question(&state, quiz.id, KEY, None).await.unwrap();
    drain(&mut rx);

    tokio::time::advance(Duration::from_secs(31)).await;
    handle_client_message(
        &state,
        connection,
        submit(&quiz, &participant, questions[0].id, 0),
    )
    .await;

    // Discarded without feedback: no result, no score, no answer record.
    let events = drain(&mut rx);
    assert!(!events.iter().any(|e| matches!(e, ServerEvent::AnswerResult { .. })));

    let store = state.quiz_store().await.unwrap();
    let stored = store.find_participant(participant.id).await.unwrap().unwrap();
    assert_eq!(stored.score, 0);
    assert!(stored.answers.is_empty());
}

#[tokio::test(start_paused = true)]
async fn answers_for_an_inactive_question_are_rejected() {
    let state = test_state().await;
    let (quiz, _) = seed_quiz(&state, 1).await;
    let (participant, connection, mut rx) = join_participant(&state, &quiz, "ann").await;

    lifecycle_service::start_quiz(&state, quiz.id, KEY).await.unwrap();
    lifecycle_service::advance_question(&state, quiz.id, KEY, None).await.unwrap();
    drain(&mut rx);

    handle_client_message(
        &state,
        connection,
        submit(&quiz, &participant, Uuid::new_v4(), 0),
    )
    .await;

    assert!(drain(&mut rx).is_empty());
    let store = state.quiz_store().await.unwrap();
    let stored = store.find_participant(participant.id).await.unwrap().unwrap();
    assert_eq!(stored.score, 0);
}

#[tokio::test(start_paused = true)]
async fn faster_correct_answers_score_higher() {
    let state = test_state().await;
    let (quiz, questions) = seed_quiz(&state, 1).await;
    let (ann, ann_conn, mut ann_rx) = join_participant(&state, &quiz, "ann").await;
    let (bob, bob_conn, mut bob_rx) = join_participant(&state, &quiz, "bob").await;

    lifecycle_service::start_quiz(&state, quiz.id, KEY).await.unwrap();
    lifecycle_service::advance_question(&state, quiz.id, KEY, None).await.unwrap();
    drain(&mut ann_rx);
    drain(&mut bob_rx);

    handle_client_message(&state, ann_conn, submit(&quiz, &ann, questions[0].id, 0)).await;
    tokio::time::advance(Duration::from_secs(10)).await;
    handle_client_message(&state, bob_conn, submit(&quiz, &bob, questions[0].id, 0)).await;

    let ann_score = drain(&mut ann_rx)
        .iter()
        .find_map(|e| match e {
            ServerEvent::AnswerResult { total_score, correct: true, .. } => Some(*total_score),
            _ => None,
        })
        .unwrap();
    let bob_score = drain(&mut bob_rx)
        .iter()
        .find_map(|e| match e {
            ServerEvent::AnswerResult { total_score, correct: true, .. } => Some(*total_score),
            _ => None,
        })
        .unwrap();
    assert!(ann_score > bob_score);

    let top = quiz_service::leaderboard(&state, quiz.id).await.unwrap();
    assert_eq!(top[0].name, "ann");
    assert_eq!(top[1].name, "bob");
}

#[tokio::test(start_paused = true)]
async fn incorrect_answers_score_zero() {
    let state = test_state().await;
    let (quiz, questions) = seed_quiz(&state, 1).await;
    let (ann, ann_conn, mut ann_rx) = join_participant(&state, &quiz, "ann").await;

    lifecycle_service::start_quiz(&state, quiz.id, KEY).await.unwrap();
    lifecycle_service::advance_question(&state, quiz.id, KEY, None).await.unwrap();
    drain(&mut ann_rx);

    handle_client_message(&state, ann_conn, submit(&quiz, &ann, questions[0].id, 1)).await;

    let events = drain(&mut ann_rx);
    assert!(events.iter().any(|e| matches!(
        e,
        ServerEvent::AnswerResult {
            correct: false,
            score_delta: 0,
            total_score: 0,
        }
    )));
}

#[tokio::test(start_paused = true)]
async fn duplicate_answers_are_not_rescored() {
    let state = test_state().await;
    let (quiz, questions) = seed_quiz(&state, 1).await;
    let (ann, ann_conn, mut ann_rx) = join_participant(&state, &quiz, "ann").await;

    lifecycle_service::start_quiz(&state, quiz.id, KEY).await.unwrap();
    lifecycle_service::advance_question(&state, quiz.id, KEY, None).await.unwrap();
    drain(&mut ann_rx);

    handle_client_message(&state, ann_conn, submit(&quiz, &ann, questions[0].id, 0)).await;
    let first = drain(&mut ann_rx);
    let total = first
        .iter()
        .find_map(|e| match e {
            ServerEvent::AnswerResult { total_score, .. } => Some(*total_score),
            _ => None,
        })
        .unwrap();

    handle_client_message(&state, ann_conn, submit(&quiz, &ann, questions[0].id, 1)).await;
    let second = drain(&mut ann_rx);
    assert!(!second.iter().any(|e| matches!(e, ServerEvent::AnswerResult { .. })));

    let store = state.quiz_store().await.unwrap();
    let stored = store.find_participant(ann.id).await.unwrap().unwrap();
    assert_eq!(stored.score, total);
    assert_eq!(stored.answers.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn window_close_fires_only_for_the_question_that_stayed_active() {
    let state = test_state().await;
    let (quiz, questions) = seed_quiz(&state, 2).await;
    let (_, _, mut rx) = join_participant(&state, &quiz, "ann").await;

    lifecycle_service::start_quiz(&state, quiz.id, KEY).await.unwrap();
    lifecycle_service::advance_question(&state, quiz.id, KEY, None).await.unwrap();
    // Let the first timer register its sleep, then supersede its question
    // before the window elapses.
    tokio::task::yield_now().await;
    lifecycle_service::advance_question(&state, quiz.id, KEY, None).await.unwrap();
    tokio::task::yield_now().await;
    drain(&mut rx);

    tokio::time::advance(Duration::from_secs(31)).await;
    tokio::task::yield_now().await;

    let closes: Vec<Uuid> = drain(&mut rx)
        .iter()
        .filter_map(|e| match e {
            ServerEvent::AnswerWindowClose { question_id } => Some(*question_id),
            _ => None,
        })
        .collect();
    assert_eq!(closes, vec![questions[1].id]);

    let session = state.sessions().get(quiz.id).unwrap();
    assert_eq!(session.active_question, None);
}

#[tokio::test(start_paused = true)]
async fn ending_the_session_silences_pending_window_timers() {
    let state = test_state().await;
    let (quiz, _) = seed_quiz(&state, 1).await;
    let (_, _, mut rx) = join_participant(&state, &quiz, "ann").await;

    lifecycle_service::start_quiz(&state, quiz.id, KEY).await.unwrap();
    lifecycle_service::advance_question(&state, quiz.id, KEY, None).await.unwrap();
    // The timer must be parked on its sleep before the session ends, or
    // the abort has nothing to cancel.
    tokio::task::yield_now().await;
    lifecycle_service::end_session(&state, quiz.id).await.unwrap();
    drain(&mut rx);

    tokio::time::advance(Duration::from_secs(31)).await;
    tokio::task::yield_now().await;

    let events = drain(&mut rx);
    assert!(!events.iter().any(|e| matches!(e, ServerEvent::AnswerWindowClose { .. })));
}

#[tokio::test]
async fn an_out_of_range_explicit_index_ends_the_session() {
    let state = test_state().await;
    let (quiz, _) = seed_quiz(&state, 1).await;
    let (_, _, mut rx) = join_participant(&state, &quiz, "ann").await;

    lifecycle_service::start_quiz(&state, quiz.id, KEY).await.unwrap();
    drain(&mut rx);

    lifecycle_service::advance_question(&state, quiz.id, KEY, Some(5))
        .await
        .unwrap();

    let events = drain(&mut rx);
    assert!(events.iter().any(|e| matches!(e, ServerEvent::QuizEnd { .. })));
    assert!(!state.sessions().contains(quiz.id));

    let store = state.quiz_store().await.unwrap();
    let stored = store.find_quiz(quiz.id).await.unwrap().unwrap();
    assert!(!stored.is_live);
}

#[tokio::test]
async fn commands_with_a_bad_key_are_dropped_silently() {
    let state = test_state().await;
    let (quiz, _) = seed_quiz(&state, 1).await;
    let (_, _, mut rx) = join_participant(&state, &quiz, "ann").await;

    lifecycle_service::start_quiz(&state, quiz.id, KEY).await.unwrap();
    drain(&mut rx);

    lifecycle_service::advance_question(&state, quiz.id, "wrong", None)
        .await
        .unwrap();

    assert!(drain(&mut rx).is_empty());
    let session = state.sessions().get(quiz.id).unwrap();
    assert_eq!(session.active_question, None);
    let store = state.quiz_store().await.unwrap();
    let stored = store.find_quiz(quiz.id).await.unwrap().unwrap();
    assert_eq!(stored.current_question_index, 0);
}

#[tokio::test]
async fn presentation_join_receives_a_session_snapshot() {
    let state = test_state().await;
    let (quiz, _) = seed_quiz(&state, 1).await;

    // Not live: the screen learns the session is over.
    let (idle_conn, mut idle_rx) = open_connection(&state);
    handle_client_message(
        &state,
        idle_conn,
        ClientMessage::JoinPresentation { quiz_id: quiz.id },
    )
    .await;
    let events = drain(&mut idle_rx);
    assert!(events.iter().any(|e| matches!(e, ServerEvent::QuizEnd { .. })));

    lifecycle_service::start_quiz(&state, quiz.id, KEY).await.unwrap();
    lifecycle_service::advance_question(&state, quiz.id, KEY, None).await.unwrap();

    // Live: the screen learns the session is running, but never the
    // question payload.
    let (live_conn, mut live_rx) = open_connection(&state);
    handle_client_message(
        &state,
        live_conn,
        ClientMessage::JoinPresentation { quiz_id: quiz.id },
    )
    .await;
    let events = drain(&mut live_rx);
    assert!(events.iter().any(|e| matches!(e, ServerEvent::QuizStart { .. })));
    assert!(!events.iter().any(|e| matches!(e, ServerEvent::NewQuestion { .. })));
}

#[tokio::test]
async fn leaderboard_toggle_requires_a_live_session() {
    let state = test_state().await;
    let (quiz, _) = seed_quiz(&state, 1).await;

    let off_session = lifecycle_service::toggle_leaderboard(&state, quiz.id, KEY, true).await;
    assert!(off_session.is_err());

    lifecycle_service::start_quiz(&state, quiz.id, KEY).await.unwrap();
    let (screen, mut rx) = open_connection(&state);
    handle_client_message(
        &state,
        screen,
        ClientMessage::JoinPresentation { quiz_id: quiz.id },
    )
    .await;
    drain(&mut rx);

    lifecycle_service::toggle_leaderboard(&state, quiz.id, KEY, true)
        .await
        .unwrap();
    let events = drain(&mut rx);
    assert!(events.iter().any(|e| matches!(
        e,
        ServerEvent::LeaderboardVisibility { on: true }
    )));
    assert!(events.iter().any(|e| matches!(e, ServerEvent::UpdateLeaderboard { .. })));
}

#[tokio::test]
async fn resetting_participants_wipes_scores() {
    let state = test_state().await;
    let (quiz, _) = seed_quiz(&state, 1).await;
    let (_, _, mut rx) = join_participant(&state, &quiz, "ann").await;
    join_participant(&state, &quiz, "bob").await;

    lifecycle_service::start_quiz(&state, quiz.id, KEY).await.unwrap();
    drain(&mut rx);

    lifecycle_service::reset_participants(&state, quiz.id, KEY)
        .await
        .unwrap();

    let events = drain(&mut rx);
    assert!(events.iter().any(|e| matches!(
        e,
        ServerEvent::ParticipantsReset { count: 2 }
    )));

    let store = state.quiz_store().await.unwrap();
    assert_eq!(store.count_participants(quiz.id).await.unwrap(), 0);
    let top = quiz_service::leaderboard(&state, quiz.id).await.unwrap();
    assert!(top.is_empty());
}
