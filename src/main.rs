use std::{net::SocketAddr, sync::Arc};

use anyhow::{anyhow, Context};
use clap::{Args, Parser, Subcommand};
use http::HeaderValue;
use tokio::signal;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info, warn};

use ayak_api as api;

#[derive(Parser)]
#[command(name = "ayak-api", about = "Ayak catalog and quote API", version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP server (default)
    Serve,
    /// Apply pending database migrations and exit
    Migrate,
    /// Seed reference categories and sample products and exit
    Seed,
    /// Print a development bearer token signed with the configured secret
    Token(TokenArgs),
}

#[derive(Args)]
struct TokenArgs {
    #[arg(long, help = "User id placed in the token subject")]
    user: String,
    #[arg(long, help = "Display name claim")]
    name: Option<String>,
    #[arg(long, help = "Email claim")]
    email: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cfg = match api::config::load_config() {
        Ok(cfg) => cfg,
        Err(e) => {
            api::config::init_tracing(api::config::DEFAULT_LOG_LEVEL, false);
            error!(error = %e, "configuration rejected");
            return Err(e).context("failed to load configuration");
        }
    };
    api::config::init_tracing(&cfg.log_level, cfg.log_json);
    if !api::config::config_dir_present() {
        info!(
            "Config directory '{}' not found; relying on built-in defaults and environment variables",
            api::config::CONFIG_DIR
        );
    }
    info!(environment = %cfg.environment, "configuration loaded");

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => serve(cfg).await,
        Commands::Migrate => migrate(&cfg).await,
        Commands::Seed => {
            let storage = api::storage::select_backend(&cfg).await?;
            if storage.kind() == api::storage::BackendKind::Memory {
                warn!("seeding in-memory storage; nothing will persist after exit");
            }
            let report = api::seed::seed_catalog(storage.as_ref()).await?;
            println!(
                "seeded {} categories and {} products ({} skipped)",
                report.categories_created, report.products_created, report.products_skipped
            );
            Ok(())
        }
        Commands::Token(args) => {
            let tokens =
                api::auth::TokenService::new(api::auth::AuthConfig::from_app_config(&cfg));
            let token = tokens.issue(&args.user, args.name.as_deref(), args.email.as_deref())?;
            println!("{}", token);
            Ok(())
        }
    }
}

async fn migrate(cfg: &api::config::AppConfig) -> anyhow::Result<()> {
    let url = cfg
        .database_url
        .as_deref()
        .ok_or_else(|| anyhow!("set DATABASE_URL or POSTGRES_URL to run migrations"))?;
    let pool = api::db::establish_connection_from_app_config(cfg, url).await?;
    api::db::run_migrations(&pool).await?;
    info!("migrations applied");
    Ok(())
}

async fn serve(cfg: api::config::AppConfig) -> anyhow::Result<()> {
    api::handlers::status::init_start_time();

    let storage = api::storage::select_backend(&cfg).await.map_err(|e| {
        error!("Failed to initialise storage: {}", e);
        e
    })?;
    info!(backend = %storage.kind(), "storage backend selected");

    if cfg.seed_on_startup {
        let seed_storage = Arc::clone(&storage);
        tokio::spawn(async move {
            if let Err(e) = api::seed::seed_catalog(seed_storage.as_ref()).await {
                error!("Catalog seeding failed: {}", e);
            }
        });
    }

    let cors_layer = cors_layer(&cfg)?;
    let addr: SocketAddr = cfg
        .bind_address()
        .parse()
        .with_context(|| format!("invalid bind address {}", cfg.bind_address()))?;

    let state = api::AppState::new(storage, cfg);
    if !state.tokens.is_enabled() {
        warn!("jwt_secret not configured; authenticated endpoints will reject every request");
    }
    let app = api::build_router(state).layer(cors_layer);

    info!("ayak-api listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

fn cors_layer(cfg: &api::config::AppConfig) -> anyhow::Result<CorsLayer> {
    let configured_origins: Option<Vec<HeaderValue>> = cfg
        .cors_allowed_origins
        .as_ref()
        .map(|raw| {
            raw.split(',')
                .filter_map(|origin| {
                    let trimmed = origin.trim();
                    if trimmed.is_empty() {
                        None
                    } else {
                        HeaderValue::from_str(trimmed).ok()
                    }
                })
                .collect::<Vec<_>>()
        })
        .filter(|origins| !origins.is_empty());

    if let Some(origins) = configured_origins {
        Ok(CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any))
    } else if cfg.should_allow_permissive_cors() {
        info!(
            "Using permissive CORS because explicit origins were not configured ({})",
            if cfg.is_development() {
                "development environment"
            } else {
                "explicit override enabled"
            }
        );
        Ok(CorsLayer::permissive())
    } else {
        error!("Missing CORS configuration detected; set APP__CORS_ALLOWED_ORIGINS or APP__CORS_ALLOW_ANY_ORIGIN=true");
        Err(anyhow!(
            "Missing CORS configuration: set APP__CORS_ALLOWED_ORIGINS or APP__CORS_ALLOW_ANY_ORIGIN=true"
        ))
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("shutdown signal received");
}
