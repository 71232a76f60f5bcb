//! Frame envelopes for both directions of the game connection.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::commands::GameCommand;
use crate::error::ProtocolError;
use crate::sign;

/// Client version advertised during login.
pub const VERSION_CODE: u32 = 53;

/// How the operator authenticates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginParams {
    /// Wallet-based login; the address doubles as the player name.
    Wallet { address: String },
    /// Username/password login.
    User { username: String, password: String },
}

impl LoginParams {
    /// The identity string carried in every signed frame.
    pub fn wallet_id(&self) -> &str {
        match self {
            Self::Wallet { address } => address,
            Self::User { username, .. } => username,
        }
    }

    fn login_type(&self) -> u32 {
        match self {
            Self::Wallet { .. } => 0,
            Self::User { .. } => 1,
        }
    }

    fn password(&self) -> &str {
        match self {
            Self::Wallet { .. } => "",
            Self::User { password, .. } => password,
        }
    }
}

/// An outbound command frame.
///
/// `id` is the per-session monotonic message id; `hash` is the integrity
/// digest over identity, id, tag, timestamp and the shared salt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientFrame {
    pub cmd: GameCommand,
    pub id: u32,
    pub hash: String,
    pub timestamp: i64,
    pub data: Value,
}

impl ClientFrame {
    /// Build a signed command frame stamped with the current time.
    pub fn command(wallet: &str, salt: &str, cmd: GameCommand, id: u32, data: Value) -> Self {
        Self::command_at(wallet, salt, cmd, id, data, sign::now_since_ad())
    }

    /// Build a signed command frame at an explicit timestamp.
    pub fn command_at(
        wallet: &str,
        salt: &str,
        cmd: GameCommand,
        id: u32,
        data: Value,
        timestamp: i64,
    ) -> Self {
        let hash = sign::sign_command(wallet, id, cmd.tag(), timestamp, salt);
        Self {
            cmd,
            id,
            hash,
            timestamp,
            data,
        }
    }

    /// Build the login frame stamped with the current time.
    pub fn login(params: &LoginParams, salt: &str) -> Self {
        Self::login_at(params, salt, sign::now_since_ad())
    }

    /// Build the login frame at an explicit timestamp.
    pub fn login_at(params: &LoginParams, salt: &str, timestamp: i64) -> Self {
        let wallet = params.wallet_id();
        Self {
            cmd: GameCommand::UserLogin,
            id: 0,
            hash: sign::sign_login(wallet, timestamp, salt),
            timestamp,
            data: json!({
                "pln": wallet,
                "password": params.password(),
                "version_code": VERSION_CODE,
                "lt": params.login_type(),
            }),
        }
    }
}

/// An inbound frame.
///
/// `cmd` stays a raw string here: tags this client does not know must reach
/// the dispatcher so it can emit a diagnostic instead of dropping them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerFrame {
    pub cmd: String,
    #[serde(default)]
    pub ec: i32,
    #[serde(default)]
    pub data: Value,
}

impl ServerFrame {
    pub fn parse(text: &str) -> Result<Self, ProtocolError> {
        serde_json::from_str(text).map_err(ProtocolError::Frame)
    }

    pub fn command(&self) -> Option<GameCommand> {
        GameCommand::from_tag(&self.cmd)
    }
}
