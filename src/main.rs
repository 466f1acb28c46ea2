// chainindex_node_rust/src/main.rs

use std::path::Path;
use std::sync::Arc;

use chainindex_node_rust::api_service::{self, ApiAppState};
use chainindex_node_rust::blockchain::chain_state::ChainState;
use chainindex_node_rust::blockchain::difficulty::CarryPreviousBits;
use chainindex_node_rust::config::NodeConfig;
use chainindex_node_rust::error::ChainIndexError;
use chainindex_node_rust::snapshot::{apply_snapshot, load_snapshot};

#[tokio::main]
async fn main() -> Result<(), ChainIndexError> {
    // Initialize logger
    env_logger::init();

    log::info!("Chain index node starting up...");

    // Optional first argument: config file path
    let config_path = std::env::args().nth(1);
    let node_config = NodeConfig::load(config_path.as_deref())?;
    let params = node_config.chain_params()?;
    log::info!("Network: {}", params.network_id_string);

    let chain_state_arc = Arc::new(ChainState::new(params.clone(), Box::new(CarryPreviousBits)));

    if let Some(path) = &node_config.snapshot_path {
        let snapshot = match load_snapshot(Path::new(path)) {
            Ok(s) => s,
            Err(e) => {
                log::error!("Failed to read header snapshot {}: {}", path, e);
                return Err(e);
            }
        };
        let applied = apply_snapshot(&chain_state_arc, &snapshot)?;
        match chain_state_arc.get_tip() {
            Some((height, hash)) => log::info!(
                "Indexed {} headers, active tip height={} hash={}",
                applied,
                height,
                hex::encode(hash)
            ),
            None => log::info!("Indexed {} headers, no active tip", applied),
        }
    } else {
        log::warn!("No snapshot_path configured; serving an empty index");
    }

    let app_state = ApiAppState {
        chain_state: Arc::clone(&chain_state_arc),
        prune_mode: node_config.prune_mode,
    };

    // --- Start API Service Task ---
    let api_router = api_service::create_router(app_state);
    let api_listener = match tokio::net::TcpListener::bind(&node_config.api_listen_addr).await {
        Ok(listener) => listener,
        Err(e) => {
            log::error!("Failed to bind API listener to {}: {}", node_config.api_listen_addr, e);
            return Err(e.into());
        }
    };
    log::info!("API server listening on {}", node_config.api_listen_addr);
    let api_task = tokio::spawn(async move {
        match axum::serve(api_listener, api_router.into_make_service()).await {
            Ok(_) => log::info!("API service stopped normally."),
            Err(e) => log::error!("API service encountered an error: {}", e),
        }
    });

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            log::info!("Ctrl-C received, chain index node shutting down...");
        }
        res_api = api_task => {
            match res_api {
                Ok(_) => log::info!("API service completed gracefully."),
                Err(e) => log::error!("API service task panicked or was cancelled: {}", e),
            }
        }
    }

    log::info!("Chain index node shut down complete.");
    Ok(())
}
