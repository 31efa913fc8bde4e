mod analysis;
mod app;
mod config;
mod error;
mod history;
mod pages;
mod state;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "nutritionist=debug,axum=info,tower_http=info".to_string());
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

    let app_state = state::AppState::init().await?;
    if app_state.config.gemini.api_key.is_empty() {
        tracing::warn!("GOOGLE_API_KEY is not set; analyses will report an error");
    }
    tracing::info!(
        database_url = %app_state.config.database_url,
        model = %app_state.config.gemini.model,
        "history store ready"
    );

    app::serve(app::build_app(app_state)).await
}
