//! WebSocket transport for the game connection.

pub mod client;

pub use client::{FrameSender, GameSocket, SocketEvent};
