//! Treasurebot - composition root binary.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use treasurebot_client::{BotSettings, GameClient, GameClientConfig, Settings, TreasureBot};
use treasurebot_domain::PlannerPolicy;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "treasurebot=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let settings = Settings::from_env()?;
    tracing::info!(url = %settings.ws_url, "starting treasurebot");

    let client = GameClient::new(GameClientConfig {
        url: settings.ws_url.clone(),
        login: settings.login.clone(),
        salt: settings.salt.clone(),
        timeout: settings.request_timeout,
    });

    let bot = TreasureBot::new(
        client,
        BotSettings {
            min_hero_energy_percent: settings.min_hero_energy_percent,
            adventure: settings.adventure,
        },
        PlannerPolicy::default(),
    );

    if let Some(port) = settings.status_port {
        let status_bot = bot.clone();
        tokio::spawn(async move {
            if let Err(error) = treasurebot_client::status::serve(status_bot, port).await {
                tracing::error!(%error, "status surface failed");
            }
        });
    }

    let signal_bot = bot.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            signal_bot.stop().await;
        }
    });

    bot.run().await?;
    Ok(())
}
