//! Environment configuration. Thin on purpose: parse, validate, hand over.

use std::time::Duration;

use anyhow::{bail, Context};
use treasurebot_protocol::LoginParams;

const DEFAULT_WS_URL: &str = "ws://localhost:3000/ws";
const DEFAULT_TIMEOUT_MS: u64 = 120_000;
const DEFAULT_MIN_ENERGY_PERCENT: f64 = 90.0;

#[derive(Debug, Clone)]
pub struct Settings {
    pub ws_url: String,
    pub login: LoginParams,
    pub salt: String,
    pub request_timeout: Duration,
    pub min_hero_energy_percent: f64,
    pub adventure: bool,
    pub status_port: Option<u16>,
}

impl Settings {
    /// Load settings from the process environment (and `.env`, if present).
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let login = parse_login(
            &std::env::var("LOGIN").context("environment variable 'LOGIN' is missing")?,
        )?;

        let request_timeout = Duration::from_millis(match std::env::var("REQUEST_TIMEOUT_MS") {
            Ok(raw) => raw.parse().context("REQUEST_TIMEOUT_MS is not a number")?,
            Err(_) => DEFAULT_TIMEOUT_MS,
        });

        let min_hero_energy_percent = match std::env::var("MIN_HERO_ENERGY_PERCENT") {
            Ok(raw) => raw
                .parse()
                .context("MIN_HERO_ENERGY_PERCENT is not a number")?,
            Err(_) => DEFAULT_MIN_ENERGY_PERCENT,
        };

        let status_port = match std::env::var("STATUS_PORT") {
            Ok(raw) => Some(raw.parse().context("STATUS_PORT is not a port number")?),
            Err(_) => None,
        };

        Ok(Self {
            ws_url: std::env::var("GAME_WS_URL").unwrap_or_else(|_| DEFAULT_WS_URL.to_string()),
            login,
            salt: std::env::var("GAME_SALT").unwrap_or_default(),
            request_timeout,
            min_hero_energy_percent,
            adventure: std::env::var("ADVENTURE")
                .map(|raw| matches!(raw.trim(), "1" | "true" | "yes"))
                .unwrap_or(false),
            status_port,
        })
    }
}

/// `LOGIN` is either `wallet:<address>` or `user:<name>:<password>`.
fn parse_login(raw: &str) -> anyhow::Result<LoginParams> {
    match raw.split(':').collect::<Vec<_>>().as_slice() {
        ["wallet", address] if !address.is_empty() => Ok(LoginParams::Wallet {
            address: (*address).to_string(),
        }),
        ["user", username, password] if !username.is_empty() => Ok(LoginParams::User {
            username: (*username).to_string(),
            password: (*password).to_string(),
        }),
        _ => bail!("LOGIN must be 'wallet:<address>' or 'user:<name>:<password>'"),
    }
}
