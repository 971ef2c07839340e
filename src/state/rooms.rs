//! Connection registry and audience rooms.
//!
//! Each websocket connection owns an unbounded sender draining into its
//! writer task. A connection may join one room per quiz; events are pushed
//! to whole audiences without touching the socket from the fanout path.

use axum::extract::ws::Message;
use dashmap::DashMap;
use tokio::sync::mpsc::UnboundedSender;
use tracing::trace;
use uuid::Uuid;

/// The three audiences of a live session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Audience {
    /// Players answering questions.
    Participant,
    /// Operators driving the session.
    Controller,
    /// Shared screens mirroring the session.
    Presentation,
}

impl Audience {
    /// All audiences, in fanout order.
    pub const ALL: [Audience; 3] = [
        Audience::Participant,
        Audience::Controller,
        Audience::Presentation,
    ];
}

#[derive(Clone)]
struct ConnectionHandle {
    tx: UnboundedSender<Message>,
    room: Option<(Uuid, Audience)>,
}

/// Registry mapping connections to their outbound channel and room.
#[derive(Default)]
pub struct RoomRegistry {
    connections: DashMap<Uuid, ConnectionHandle>,
}

impl RoomRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Track a freshly accepted connection.
    pub fn register(&self, connection_id: Uuid, tx: UnboundedSender<Message>) {
        self.connections
            .insert(connection_id, ConnectionHandle { tx, room: None });
    }

    /// Drop a closed connection. Returns the room it occupied, if any.
    pub fn unregister(&self, connection_id: Uuid) -> Option<(Uuid, Audience)> {
        self.connections
            .remove(&connection_id)
            .and_then(|(_, handle)| handle.room)
    }

    /// Move a connection into the room of `quiz_id` for `audience`.
    /// Returns false for unknown connections.
    pub fn join(&self, connection_id: Uuid, quiz_id: Uuid, audience: Audience) -> bool {
        match self.connections.get_mut(&connection_id) {
            Some(mut handle) => {
                handle.room = Some((quiz_id, audience));
                true
            }
            None => false,
        }
    }

    /// Connections currently in the room of `quiz_id` for `audience`.
    pub fn members(&self, quiz_id: Uuid, audience: Audience) -> Vec<Uuid> {
        self.connections
            .iter()
            .filter(|entry| entry.value().room == Some((quiz_id, audience)))
            .map(|entry| *entry.key())
            .collect()
    }

    /// Push a frame to one connection. A full or closed channel means the
    /// writer task is gone; the disconnect path cleans the entry up.
    pub fn send_to(&self, connection_id: Uuid, frame: Message) {
        if let Some(handle) = self.connections.get(&connection_id) {
            if handle.tx.send(frame).is_err() {
                trace!(%connection_id, "dropping frame for closed connection");
            }
        }
    }

    /// Push a frame to every member of a room.
    pub fn send_to_room(&self, quiz_id: Uuid, audience: Audience, frame: Message) {
        for entry in self.connections.iter() {
            if entry.value().room == Some((quiz_id, audience))
                && entry.value().tx.send(frame.clone()).is_err()
            {
                trace!(connection_id = %entry.key(), "dropping frame for closed connection");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    fn text(raw: &str) -> Message {
        Message::Text(raw.into())
    }

    #[tokio::test]
    async fn frames_reach_only_the_addressed_room() {
        let rooms = RoomRegistry::new();
        let quiz = Uuid::new_v4();

        let (player_tx, mut player_rx) = mpsc::unbounded_channel();
        let (screen_tx, mut screen_rx) = mpsc::unbounded_channel();
        let player = Uuid::new_v4();
        let screen = Uuid::new_v4();

        rooms.register(player, player_tx);
        rooms.register(screen, screen_tx);
        assert!(rooms.join(player, quiz, Audience::Participant));
        assert!(rooms.join(screen, quiz, Audience::Presentation));

        rooms.send_to_room(quiz, Audience::Participant, text("question"));

        assert!(matches!(player_rx.recv().await, Some(Message::Text(_))));
        assert!(screen_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn unregister_reports_previous_room() {
        let rooms = RoomRegistry::new();
        let quiz = Uuid::new_v4();
        let (tx, _rx) = mpsc::unbounded_channel();
        let connection = Uuid::new_v4();

        rooms.register(connection, tx);
        rooms.join(connection, quiz, Audience::Controller);

        assert_eq!(
            rooms.unregister(connection),
            Some((quiz, Audience::Controller))
        );
        assert!(rooms.members(quiz, Audience::Controller).is_empty());
    }

    #[test]
    fn join_rejects_unknown_connection() {
        let rooms = RoomRegistry::new();
        assert!(!rooms.join(Uuid::new_v4(), Uuid::new_v4(), Audience::Participant));
    }
}
