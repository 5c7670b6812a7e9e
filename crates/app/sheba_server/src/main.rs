//! Sheba API server binary.

use std::sync::Arc;

use clap::Parser;
use sqlx::postgres::PgPoolOptions;
use tracing::info;

use sheba_core::sms::{HttpSmsGateway, LogSmsSender, SmsGatewayOptions, SmsSender};

/// CLI arguments for the API server.
#[derive(Parser, Debug)]
#[command(name = "sheba_server", about = "Sheba API server")]
struct Args {
    /// Port to listen on.
    #[arg(long, env = "PORT", default_value_t = 3000)]
    port: u16,

    /// PostgreSQL connection URL.
    #[arg(
        long,
        env = "DATABASE_URL",
        default_value = "postgres://localhost:5432/sheba"
    )]
    database_url: String,

    /// Maximum number of database connections in the pool.
    #[arg(long, default_value_t = 5)]
    max_connections: u32,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,sheba_api=debug,sheba_core=debug".parse().unwrap()),
        )
        .init();

    let args = Args::parse();

    info!(database_url = %args.database_url, port = args.port, "starting sheba_server");

    let pool = PgPoolOptions::new()
        .max_connections(args.max_connections)
        .acquire_timeout(std::time::Duration::from_secs(30))
        .connect(&args.database_url)
        .await?;

    // Run database migrations.
    info!("running database migrations");
    sheba_api::migrate(&pool).await?;

    let mut config = sheba_api::config::ApiConfig::from_env();
    config.bind_addr = format!("0.0.0.0:{}", args.port);
    config.database_url = args.database_url;

    // Without a configured provider, codes are logged instead of delivered.
    let sms: Arc<dyn SmsSender> = match SmsGatewayOptions::from_env() {
        Some(options) => {
            info!(api_url = %options.api_url, "using HTTP SMS gateway");
            Arc::new(HttpSmsGateway::new(options))
        }
        None => {
            info!("no SMS provider configured, logging messages instead");
            Arc::new(LogSmsSender)
        }
    };

    let state = sheba_api::AppState {
        pool,
        config: config.clone(),
        sms,
    };

    let app = sheba_api::router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    let local_addr = listener.local_addr()?;
    info!(addr = %local_addr, "REST API listening");

    axum::serve(listener, app).await?;

    Ok(())
}
