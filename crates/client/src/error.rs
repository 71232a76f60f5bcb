//! Client-side error taxonomy.

use thiserror::Error;
use treasurebot_domain::DomainError;
use treasurebot_protocol::GameCommand;

/// Everything that can go wrong between the bot and the server.
///
/// Network/server variants reject the one pending operation they belong to;
/// domain variants indicate a protocol/logic mismatch and abort the
/// enclosing orchestration step instead of being retried.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ClientError {
    /// The transport handshake failed.
    #[error("connection failed")]
    ConnectionFailed,

    /// The connection dropped underneath us.
    #[error("connection lost")]
    ConnectionLost,

    /// The server rejected the credentials.
    #[error("login failed with code {0}")]
    LoginFailed(i32),

    /// A command completed with a non-zero server result code.
    #[error("{cmd} failed with code {code}")]
    MessageError { cmd: GameCommand, code: i32 },

    /// The client-side liveness guard elapsed before settlement.
    #[error("request timed out")]
    Timeout,

    /// The operation was cancelled, usually by shutdown.
    #[error("request cancelled")]
    Cancelled,

    /// No live connection to send on.
    #[error("not connected")]
    NotConnected,

    /// A caller precondition was violated.
    #[error("wrong usage: {0}")]
    WrongUsage(&'static str),

    /// An outbound payload failed to serialize.
    #[error("could not encode request: {0}")]
    Encode(String),

    #[error(transparent)]
    Domain(#[from] DomainError),
}
