//! Foodgram backend: recipes with tags and ingredient lines, favorites,
//! shopping carts, author subscriptions and a merged shopping list.

pub mod config;
pub mod dtos;
pub mod error;
pub mod http;
pub mod models;
pub mod services;
pub mod state;
pub mod utils;

use std::error::Error;

use log::info;
use tokio::net::TcpListener;
use tokio::signal::ctrl_c;
#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

use crate::config::Config;
use crate::services::database_service::prepare_database;
use crate::state::AppState;

pub async fn start_server(config: Config) -> Result<(), Box<dyn Error>> {
    info!("Initializing state...");
    let db = prepare_database(&config.database_url).await?;
    tokio::fs::create_dir_all(&config.media_root).await?;

    let address = config.bind_address();
    let state = AppState::new(db, config);
    let app = http::build_router(state);

    info!("Binding to {address}");
    let listener = TcpListener::bind(&address).await?;
    info!("Server running on {address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = ctrl_c().await {
            log::error!("Failed to listen for Ctrl+C: {e}");
            std::future::pending::<()>().await;
        }
        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                log::error!("Failed to install signal handler: {e}");
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
}
