//! Client-level events fanned out to subscribers.

use treasurebot_protocol::{GameCommand, ServerEvent};

/// Everything observable on the connection: lifecycle transitions, command
/// failures and decoded server responses.
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    Connected,
    ConnectionFailed,
    ConnectionLost,
    MessageError { cmd: GameCommand, code: i32 },
    Server(ServerEvent),
}

/// Subscription key: one kind per lifecycle event, one per command tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GameEventKind {
    Connected,
    ConnectionFailed,
    ConnectionLost,
    MessageError,
    Command(GameCommand),
}

impl GameEvent {
    pub fn kind(&self) -> GameEventKind {
        match self {
            Self::Connected => GameEventKind::Connected,
            Self::ConnectionFailed => GameEventKind::ConnectionFailed,
            Self::ConnectionLost => GameEventKind::ConnectionLost,
            Self::MessageError { .. } => GameEventKind::MessageError,
            Self::Server(event) => GameEventKind::Command(event.command()),
        }
    }
}
