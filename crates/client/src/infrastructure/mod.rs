//! Infrastructure: correlation machinery, event fan-out and the transport.

pub mod messaging;
pub mod websocket;
