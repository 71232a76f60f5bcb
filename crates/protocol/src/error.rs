//! Protocol-level decode errors.

use thiserror::Error;

use crate::commands::GameCommand;

#[derive(Debug, Error)]
pub enum ProtocolError {
    /// The frame itself was not valid JSON or lacked the envelope fields.
    #[error("malformed frame: {0}")]
    Frame(#[source] serde_json::Error),

    /// A known command arrived with a payload we could not decode.
    #[error("malformed {cmd} payload: {source}")]
    Payload {
        cmd: GameCommand,
        #[source]
        source: serde_json::Error,
    },
}
