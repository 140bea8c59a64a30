use menu_ratings::{
    app::{build_app, serve},
    config::AppConfig,
    ratings::scheduler::DailyReset,
    state::AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "menu_ratings=debug,axum=info,tower_http=info".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    let config = AppConfig::from_env()?;
    tracing::info!(
        utc_offset = %config.utc_offset,
        enforce_windows = config.enforce_windows,
        "configuration loaded"
    );
    let (host, port) = (config.host.clone(), config.port);

    let app_state = AppState::init(config).await?;

    let reset = DailyReset::new(
        app_state.ratings.clone(),
        app_state.clock.clone(),
        app_state.config.reset_retry,
    );
    tokio::spawn(reset.run());

    serve(build_app(app_state), &host, port).await
}
