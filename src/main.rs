use anyhow::anyhow;
use dotenvy::dotenv;
use log::info;
use searchserver::api::configure_api_routes;
use searchserver::config::AppConfig;
use searchserver::ingest::UploadOutcome;
use searchserver::shared::state::AppState;
use std::path::Path;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .write_style(env_logger::WriteStyle::Always)
        .init();

    let config = AppConfig::from_env();
    let state = Arc::new(AppState::from_config(config.clone())?);

    let args: Vec<String> = std::env::args().collect();
    if args.len() > 1 {
        match args[1].as_str() {
            "ingest" => {
                let path = args
                    .get(2)
                    .ok_or_else(|| anyhow!("usage: searchserver ingest <file>"))?;
                let outcome = state.ingestion.ingest(Path::new(path)).await;
                info!("{}", outcome.message());
                return match outcome {
                    UploadOutcome::Success { .. } => Ok(()),
                    other => Err(anyhow!(other.message())),
                };
            }
            other => {
                eprintln!("Unknown command: {}", other);
                eprintln!("Usage: searchserver [ingest <file>]");
                return Err(anyhow!("unknown command: {}", other));
            }
        }
    }

    let mut app = configure_api_routes();
    if Path::new(&config.static_dir).exists() {
        app = app.fallback_service(
            ServeDir::new(&config.static_dir).append_index_html_on_directories(true),
        );
    }
    let app = app.layer(CorsLayer::permissive()).with_state(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Listening on http://{}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}
