// chainindex_node_rust/src/api_service.rs

use axum::{
    extract::{Path, Query, State},
    http::{header::CONTENT_TYPE, Method, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::blockchain::chain_state::ChainState;
use crate::blockchain::queries::{parse_hash, BlockchainInfo, HeaderSummary};
use crate::blockchain::tip_tracker::ChainTip;
use crate::error::ChainIndexError;

// Shared application state available to all handlers
#[derive(Clone)]
pub struct ApiAppState {
    pub chain_state: Arc<ChainState>,
    pub prune_mode: bool,
}

// --- API Error Handling ---
#[derive(Debug)]
pub enum ApiError {
    NotFound(String),
    BadRequest(String),
    InternalServerError(String),
}

impl From<ChainIndexError> for ApiError {
    fn from(e: ChainIndexError) -> Self {
        match e {
            ChainIndexError::NotFound { .. } => ApiError::NotFound(e.to_string()),
            ChainIndexError::OutOfRange { .. } | ChainIndexError::InvalidBlockRef(_) => {
                ApiError::BadRequest(e.to_string())
            }
            other => ApiError::InternalServerError(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::InternalServerError(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };
        (status, Json(serde_json::json!({ "error": error_message }))).into_response()
    }
}

#[derive(Deserialize)]
struct HeaderQuery {
    verbose: Option<bool>,
}

#[derive(Serialize)]
struct ForkPointResponse {
    hash: String,
    forkpoint: Option<String>,
}

#[derive(Serialize)]
struct PingResponse {
    message: String,
    status: String,
}

// --- Handlers ---
// None of these await while holding the view, so the read lock is released
// before the response is written.

async fn ping_handler() -> Json<PingResponse> {
    log::info!("API /ping endpoint called");
    Json(PingResponse {
        message: "Chain index API is running".to_string(),
        status: "ok".to_string(),
    })
}

async fn chain_tips_handler(State(app_state): State<ApiAppState>) -> Json<Vec<ChainTip>> {
    log::info!("API /chaintips called");
    Json(app_state.chain_state.view().chain_tips())
}

async fn block_count_handler(State(app_state): State<ApiAppState>) -> Json<i64> {
    Json(app_state.chain_state.view().block_count())
}

async fn best_block_hash_handler(State(app_state): State<ApiAppState>) -> Result<Json<String>, ApiError> {
    app_state
        .chain_state
        .view()
        .best_block_hash()
        .map(|h| Json(hex::encode(h)))
        .ok_or_else(|| ApiError::NotFound("No active chain".to_string()))
}

async fn difficulty_handler(State(app_state): State<ApiAppState>) -> Json<f64> {
    Json(app_state.chain_state.view().difficulty())
}

async fn block_hash_handler(
    Path(height): Path<i64>,
    State(app_state): State<ApiAppState>,
) -> Result<Json<String>, ApiError> {
    log::info!("API /blockhash/{} called", height);
    let hash = app_state.chain_state.view().block_hash(height)?;
    Ok(Json(hex::encode(hash)))
}

// verbose=false returns the serialized header as a hex string.
async fn block_header_handler(
    Path(block_hash_hex): Path<String>,
    Query(query): Query<HeaderQuery>,
    State(app_state): State<ApiAppState>,
) -> Result<Response, ApiError> {
    log::info!("API /blockheader/{} called", block_hash_hex);
    let hash = parse_hash(&block_hash_hex)?;
    let view = app_state.chain_state.view();
    if query.verbose.unwrap_or(true) {
        Ok(Json(view.header_summary(&hash)?).into_response())
    } else {
        Ok(Json(view.serialized_header(&hash)?).into_response())
    }
}

async fn fork_point_handler(
    Path(block_hash_hex): Path<String>,
    State(app_state): State<ApiAppState>,
) -> Result<Json<ForkPointResponse>, ApiError> {
    log::info!("API /forkpoint/{} called", block_hash_hex);
    let hash = parse_hash(&block_hash_hex)?;
    let fork = app_state.chain_state.view().fork_point(&hash)?;
    Ok(Json(ForkPointResponse {
        hash: block_hash_hex,
        forkpoint: fork.map(hex::encode),
    }))
}

async fn network_difficulty_handler(
    Path(block_hash_hex): Path<String>,
    State(app_state): State<ApiAppState>,
) -> Result<Json<f64>, ApiError> {
    let hash = parse_hash(&block_hash_hex)?;
    Ok(Json(app_state.chain_state.view().network_difficulty_after(&hash)?))
}

async fn block_handler(
    Path(reference): Path<String>,
    State(app_state): State<ApiAppState>,
) -> Result<Json<HeaderSummary>, ApiError> {
    log::info!("API /block/{} called", reference);
    let view = app_state.chain_state.view();
    let id = view.resolve_block_ref(&reference)?;
    Ok(Json(view.summarize(view.store().get(id))))
}

async fn locator_handler(State(app_state): State<ApiAppState>) -> Json<Vec<String>> {
    let view = app_state.chain_state.view();
    Json(view.chain().locator(view.store()).iter().map(hex::encode).collect())
}

async fn blockchain_info_handler(State(app_state): State<ApiAppState>) -> Json<BlockchainInfo> {
    log::info!("API /blockchaininfo called");
    Json(app_state.chain_state.view().blockchain_info(app_state.prune_mode))
}

// Function to create the Axum router with all API routes
pub fn create_router(app_state: ApiAppState) -> Router {
    // Read-only surface; GET from any origin.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE]);

    Router::new()
        .route("/api/v1/ping", get(ping_handler))
        .route("/api/v1/chaintips", get(chain_tips_handler))
        .route("/api/v1/blockcount", get(block_count_handler))
        .route("/api/v1/bestblockhash", get(best_block_hash_handler))
        .route("/api/v1/difficulty", get(difficulty_handler))
        .route("/api/v1/blockhash/:height", get(block_hash_handler))
        .route("/api/v1/blockheader/:block_hash", get(block_header_handler))
        .route("/api/v1/block/:reference", get(block_handler))
        .route("/api/v1/blockchaininfo", get(blockchain_info_handler))
        .route("/api/v1/locator", get(locator_handler))
        .route("/api/v1/forkpoint/:block_hash", get(fork_point_handler))
        .route("/api/v1/networkdifficulty/:block_hash", get(network_difficulty_handler))
        .layer(cors)
        .with_state(app_state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::block_index::{BlockStatus, ChainWork};
    use crate::blockchain::difficulty::CarryPreviousBits;
    use crate::blockchain::index_store::NewBlockIndex;
    use crate::blockchain::test_util::header;
    use crate::chainparams::REGTEST_PARAMS;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    fn app() -> (Router, Vec<[u8; 32]>) {
        let (state, hashes) = chain();
        (router_for(state), hashes)
    }

    fn router_for(state: Arc<ChainState>) -> Router {
        create_router(ApiAppState {
            chain_state: state,
            prune_mode: false,
        })
    }

    // Active chain of three blocks at heights 0..=2.
    fn chain() -> (Arc<ChainState>, Vec<[u8; 32]>) {
        let state = Arc::new(ChainState::new(REGTEST_PARAMS, Box::new(CarryPreviousBits)));
        let mut hashes = Vec::new();
        let mut prev = [0u8; 32];
        for h in 0..3u32 {
            let mut new = NewBlockIndex::from_header(header(prev, h + 1));
            new.status = BlockStatus::new(BlockStatus::VALID_SCRIPTS | BlockStatus::HAVE_DATA);
            new.chain_tx = u64::from(h) + 1;
            new.chain_work = ChainWork::from_u128(u128::from(h) + 1);
            prev = new.hash;
            hashes.push(prev);
            state.add_block_index(new).unwrap();
        }
        state.set_best_tip(&prev).unwrap();
        (state, hashes)
    }

    async fn get_json(router: Router, uri: &str) -> (StatusCode, serde_json::Value) {
        let response = router
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn chain_tips_endpoint() {
        let (router, hashes) = app();
        let (status, json) = get_json(router, "/api/v1/chaintips").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json.as_array().unwrap().len(), 1);
        assert_eq!(json[0]["hash"], hex::encode(hashes[2]));
        assert_eq!(json[0]["status"], "active");
        assert_eq!(json[0]["branchlen"], 0);
    }

    #[tokio::test]
    async fn block_hash_endpoint_maps_errors() {
        let (router, hashes) = app();
        let (status, json) = get_json(router.clone(), "/api/v1/blockhash/1").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json, hex::encode(hashes[1]));

        let (status, json) = get_json(router, "/api/v1/blockhash/5").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(json["error"].as_str().unwrap().contains("out of range"));
    }

    #[tokio::test]
    async fn block_endpoints() {
        let (router, hashes) = app();
        let (status, json) = get_json(router.clone(), "/api/v1/block/0").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["hash"], hex::encode(hashes[0]));
        assert_eq!(json["confirmations"], 3);
        assert_eq!(json["nextblockhash"], hex::encode(hashes[1]));

        let uri = format!("/api/v1/blockheader/{}", hex::encode(hashes[2]));
        let (status, json) = get_json(router.clone(), &uri).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["height"], 2);

        let uri = format!("/api/v1/blockheader/{}", "ee".repeat(32));
        let (status, _) = get_json(router, &uri).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn summary_endpoints() {
        let (router, hashes) = app();
        let (_, count) = get_json(router.clone(), "/api/v1/blockcount").await;
        assert_eq!(count, 2);
        let (_, best) = get_json(router.clone(), "/api/v1/bestblockhash").await;
        assert_eq!(best, hex::encode(hashes[2]));
        let (_, info) = get_json(router, "/api/v1/blockchaininfo").await;
        assert_eq!(info["chain"], "regtest");
        assert_eq!(info["blocks"], 2);
        assert_eq!(info["softforks"].as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn locator_endpoint_ends_at_genesis() {
        let (router, hashes) = app();
        let (status, json) = get_json(router, "/api/v1/locator").await;
        assert_eq!(status, StatusCode::OK);
        let expected: Vec<String> = hashes.iter().rev().map(hex::encode).collect();
        assert_eq!(json, serde_json::json!(expected));
    }

    #[tokio::test]
    async fn non_verbose_header_is_serialized_hex() {
        let (state, hashes) = chain();
        let expected = hex::encode(state.view().store().lookup(&hashes[1]).unwrap().header.encode());
        let router = router_for(state);

        let uri = format!("/api/v1/blockheader/{}?verbose=false", hex::encode(hashes[1]));
        let (status, json) = get_json(router.clone(), &uri).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json, expected);

        let uri = format!("/api/v1/blockheader/{}?verbose=true", hex::encode(hashes[1]));
        let (_, json) = get_json(router, &uri).await;
        assert_eq!(json["height"], 1);
    }

    #[tokio::test]
    async fn fork_point_and_network_difficulty_endpoints() {
        let (state, hashes) = chain();
        let mut side = NewBlockIndex::from_header(header(hashes[1], 99));
        side.chain_work = ChainWork::from_u128(3);
        let side_hash = side.hash;
        state.add_block_index(side).unwrap();
        let expected_difficulty = state.view().network_difficulty_after(&hashes[0]).unwrap();
        let router = router_for(state);

        let uri = format!("/api/v1/forkpoint/{}", hex::encode(side_hash));
        let (status, json) = get_json(router.clone(), &uri).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["hash"], hex::encode(side_hash));
        assert_eq!(json["forkpoint"], hex::encode(hashes[1]));

        let uri = format!("/api/v1/forkpoint/{}", hex::encode(hashes[2]));
        let (_, json) = get_json(router.clone(), &uri).await;
        assert_eq!(json["forkpoint"], hex::encode(hashes[2]));

        let uri = format!("/api/v1/networkdifficulty/{}", hex::encode(hashes[0]));
        let (status, json) = get_json(router.clone(), &uri).await;
        assert_eq!(status, StatusCode::OK);
        assert!((json.as_f64().unwrap() - expected_difficulty).abs() < 1e-9);

        let (status, _) = get_json(router, "/api/v1/forkpoint/nothex").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
