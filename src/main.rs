use score_relay::{
    build_router, reset::spawn_weekly_reset_task, AppConfig, AppState, SqliteScoreRepository,
    TelegramBotApi, WeeklyReset,
};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "score_relay=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Arc::new(AppConfig::from_env()?);
    info!("Starting score relay server");

    let score_repository = Arc::new(SqliteScoreRepository::connect(&config.database_url).await?);
    let bot = Arc::new(TelegramBotApi::new(
        &config.bot_api_url,
        &config.bot_token,
        config.bot_timeout,
    )?);

    spawn_weekly_reset_task(WeeklyReset::new(
        score_repository.clone(),
        bot.clone(),
        config.reset.clone(),
        config.admin_chat_id.clone(),
        config.bot_timeout,
    ));

    let app_state = AppState::new(score_repository, bot, Arc::clone(&config));
    let app = build_router(app_state);

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.port)).await?;
    info!(port = config.port, "Server listening");
    axum::serve(listener, app).await?;

    Ok(())
}
