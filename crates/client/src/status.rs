//! HTTP status/control surface.
//!
//! Reads bot state through accessors only and triggers the stop lifecycle;
//! it takes no part in the core algorithms.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};

use treasurebot_domain::RewardKind;

use crate::bot::TreasureBot;

pub fn router(bot: TreasureBot) -> Router {
    Router::new()
        .route("/stats", get(stats))
        .route("/rewards", get(rewards))
        .route("/claim/{kind}", post(claim))
        .route("/stop", post(stop))
        .with_state(bot)
}

pub async fn serve(bot: TreasureBot, port: u16) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port)).await?;
    tracing::info!(port, "status surface listening");
    axum::serve(listener, router(bot)).await?;
    Ok(())
}

async fn stats(State(bot): State<TreasureBot>) -> String {
    bot.stats().await
}

async fn rewards(State(bot): State<TreasureBot>) -> Result<Json<Value>, StatusCode> {
    let (rewards, detail) = bot
        .rewards()
        .await
        .map_err(|_| StatusCode::SERVICE_UNAVAILABLE)?;
    Ok(Json(json!({
        "rewards": rewards,
        "mined": detail.mined,
        "invested": detail.invested,
        "claimable": detail.rewards,
    })))
}

async fn claim(
    State(bot): State<TreasureBot>,
    Path(kind): Path<String>,
) -> Result<Json<Value>, StatusCode> {
    let kind = match kind.as_str() {
        "bcoin" => RewardKind::BCoin,
        "sen" => RewardKind::Sen,
        _ => return Err(StatusCode::NOT_FOUND),
    };
    bot.claim(kind)
        .await
        .map_err(|_| StatusCode::SERVICE_UNAVAILABLE)?;
    Ok(Json(json!({ "claimed": kind })))
}

async fn stop(State(bot): State<TreasureBot>) -> &'static str {
    tokio::spawn(async move { bot.stop().await });
    "stopping"
}
