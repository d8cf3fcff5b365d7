//! REST API server for basewatch
//!
//! Exposes the ledger query service as JSON endpoints. Every request goes to
//! the node again; nothing is cached.

use axum::{
    extract::{Path, Query, Request, State},
    http::{self, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::config::{ApiConfig, Config};
use crate::error::{FailureKind, RpcFailure};
use crate::ledger::{
    clamp_limit, filter_transactions, LedgerService, Transaction, TransactionDetails,
    WalletSnapshot,
};
use crate::rpc::{EndpointPool, RpcClient};
use crate::units::{calculate_fee, format_gas_price_gwei, wei_to_eth};

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub ledger: LedgerService,
    pub limits: ApiConfig,
    api_stats: Arc<RwLock<ApiStats>>,
}

/// API statistics and monitoring
#[derive(Debug, Default)]
struct ApiStats {
    total_requests: u64,
    successful_requests: u64,
    client_errors: u64,
    failed_requests: u64,
    start_time: Option<Instant>,
}

impl ApiStats {
    fn new() -> Self {
        ApiStats {
            start_time: Some(Instant::now()),
            ..Default::default()
        }
    }

    fn record_request(&mut self, status: StatusCode) {
        self.total_requests += 1;
        if status.is_success() {
            self.successful_requests += 1;
        } else if status.is_client_error() {
            self.client_errors += 1;
        } else {
            self.failed_requests += 1;
        }
    }
}

impl AppState {
    pub fn new(ledger: LedgerService, limits: ApiConfig) -> Self {
        Self {
            ledger,
            limits,
            api_stats: Arc::new(RwLock::new(ApiStats::new())),
        }
    }

    /// Builds the endpoint pool, RPC client and ledger service from config.
    pub fn from_config(config: &Config) -> Result<Self, RpcFailure> {
        let pool = Arc::new(EndpointPool::new(&config.rpc.endpoints)?);
        let client = RpcClient::new(pool, config.rpc.options())?;
        Ok(Self::new(LedgerService::new(client), config.api.clone()))
    }

    pub async fn get_stats(&self) -> ApiStatsResponse {
        let stats = self.api_stats.read().await;
        let uptime = stats.start_time.map(|t| t.elapsed().as_secs()).unwrap_or(0);

        ApiStatsResponse {
            total_requests: stats.total_requests,
            successful_requests: stats.successful_requests,
            client_errors: stats.client_errors,
            failed_requests: stats.failed_requests,
            uptime_seconds: uptime,
            endpoints: self.ledger.client().pool().len(),
        }
    }
}

// ============================================================================
// API Error Handling
// ============================================================================

#[derive(Debug)]
pub enum ApiError {
    InvalidInput(String),
    NotFound(String),
    Ledger(RpcFailure),
    InternalError(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Ledger(failure) => (StatusCode::INTERNAL_SERVER_ERROR, failure.user_message()),
            ApiError::InternalError(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

impl From<RpcFailure> for ApiError {
    fn from(failure: RpcFailure) -> Self {
        // Only the service's own verdicts become 4xx; node-reported kinds are 500s.
        match (failure.kind, failure.local) {
            (FailureKind::InvalidInput, true) => ApiError::InvalidInput(failure.message),
            (FailureKind::NotFound, true) => ApiError::NotFound(failure.message),
            _ => ApiError::Ledger(failure),
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Deserialize)]
pub struct LatestQuery {
    limit: Option<String>,
    address: Option<String>,
}

#[derive(Deserialize)]
pub struct LimitQuery {
    limit: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TxRow {
    pub hash: String,
    pub from: String,
    pub to: Option<String>,
    pub value_wei: String,
    pub value_eth: String,
}

impl From<&Transaction> for TxRow {
    fn from(tx: &Transaction) -> Self {
        TxRow {
            hash: tx.hash.clone(),
            from: tx.from.clone(),
            to: tx.to.clone(),
            value_wei: tx.value_wei.to_string(),
            value_eth: wei_to_eth(tx.value_wei),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LatestResponse {
    pub block_number: String,
    pub block_number_decimal: u64,
    pub txs: Vec<TxRow>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionResponse {
    pub hash: String,
    pub from: String,
    pub to: Option<String>,
    pub value_wei: String,
    pub value_eth: String,
    pub gas_price: String,
    pub gas_price_gwei: String,
    pub gas_limit: String,
    pub gas_used: String,
    pub nonce: u64,
    pub data: String,
    pub status: &'static str,
    pub transaction_fee: String,
    pub block_number: Option<u64>,
    pub confirmations: u64,
}

impl TryFrom<&TransactionDetails> for TransactionResponse {
    type Error = ApiError;

    fn try_from(details: &TransactionDetails) -> Result<Self, Self::Error> {
        let tx = &details.transaction;
        let gas_used = details.gas_used();
        let fee = calculate_fee(tx.gas_price, gas_used)
            .map_err(|e| ApiError::InternalError(format!("Failed to compute fee: {}", e)))?;

        Ok(TransactionResponse {
            hash: tx.hash.clone(),
            from: tx.from.clone(),
            to: tx.to.clone(),
            value_wei: tx.value_wei.to_string(),
            value_eth: wei_to_eth(tx.value_wei),
            gas_price: tx.gas_price.to_string(),
            gas_price_gwei: format_gas_price_gwei(tx.gas_price),
            gas_limit: tx.gas_limit.to_string(),
            gas_used: gas_used.to_string(),
            nonce: tx.nonce,
            data: format!("0x{}", hex::encode(&tx.data)),
            status: details.status().as_str(),
            transaction_fee: fee,
            block_number: tx.block_number,
            confirmations: details.confirmations,
        })
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletTxRow {
    #[serde(flatten)]
    pub row: TxRow,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub timestamp: u64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletResponse {
    pub address: String,
    pub balance_wei: String,
    pub balance_eth: String,
    pub is_contract: bool,
    pub recent_transactions: Vec<WalletTxRow>,
    pub transaction_count: usize,
}

impl From<&WalletSnapshot> for WalletResponse {
    fn from(snapshot: &WalletSnapshot) -> Self {
        let recent_transactions: Vec<WalletTxRow> = snapshot
            .recent_transactions
            .iter()
            .map(|w| WalletTxRow {
                row: TxRow::from(&w.transaction),
                kind: w.direction.as_str(),
                timestamp: w.timestamp,
            })
            .collect();

        WalletResponse {
            address: snapshot.address.clone(),
            balance_wei: snapshot.balance_wei.to_string(),
            balance_eth: wei_to_eth(snapshot.balance_wei),
            is_contract: snapshot.is_contract,
            transaction_count: recent_transactions.len(),
            recent_transactions,
        }
    }
}

#[derive(Serialize)]
pub struct ApiStatsResponse {
    pub total_requests: u64,
    pub successful_requests: u64,
    pub client_errors: u64,
    pub failed_requests: u64,
    pub uptime_seconds: u64,
    pub endpoints: usize,
}

// ============================================================================
// Middleware
// ============================================================================

/// Request statistics middleware
async fn stats_middleware(State(state): State<Arc<AppState>>, req: Request, next: Next) -> Response {
    let response = next.run(req).await;

    let mut stats = state.api_stats.write().await;
    stats.record_request(response.status());

    response
}

/// Logs method, path, status and duration of every request.
async fn logging_middleware(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    let response = next.run(req).await;

    tracing::info!(
        method = %method,
        path = %path,
        status = %response.status().as_u16(),
        duration_ms = %start.elapsed().as_millis(),
        "api.request"
    );

    response
}

// ============================================================================
// API Server
// ============================================================================

/// Build the API router with all endpoints
pub fn build_api_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::mirror_request())
        .allow_methods(vec![http::Method::GET, http::Method::OPTIONS])
        .allow_headers(vec![http::header::CONTENT_TYPE]);

    Router::new()
        .route("/latest", get(get_latest))
        .route("/transaction/:hash", get(get_transaction))
        .route("/wallet/:address", get(get_wallet))
        .route("/health", get(health_check))
        .route("/stats", get(get_api_stats))
        .layer(middleware::from_fn(logging_middleware))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            stats_middleware,
        ))
        .with_state(state)
        .layer(cors)
}

/// Run the API server on `0.0.0.0:<port>`
pub async fn run_api_server(
    state: Arc<AppState>,
    port: u16,
) -> Result<(), Box<dyn std::error::Error>> {
    let app = build_api_router(state);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!(%addr, "api server listening");

    axum::serve(listener, app).await?;

    Ok(())
}

// ============================================================================
// Route Handlers
// ============================================================================

async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "endpoints": state.ledger.client().pool().len(),
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

async fn get_latest(
    State(state): State<Arc<AppState>>,
    Query(params): Query<LatestQuery>,
) -> Result<Json<LatestResponse>, ApiError> {
    let limit = clamp_limit(
        params.limit.as_deref(),
        state.limits.default_limit,
        state.limits.max_limit,
    );
    let address = params.address.as_deref().filter(|a| !a.trim().is_empty());

    let block = state.ledger.latest_block_with_transactions().await?;
    let txs = filter_transactions(&block.transactions, address, limit)
        .iter()
        .map(TxRow::from)
        .collect();

    Ok(Json(LatestResponse {
        block_number: format!("0x{:x}", block.number),
        block_number_decimal: block.number,
        txs,
    }))
}

async fn get_transaction(
    State(state): State<Arc<AppState>>,
    Path(hash): Path<String>,
) -> Result<Json<TransactionResponse>, ApiError> {
    if !hash.starts_with("0x") {
        return Err(ApiError::InvalidInput("Invalid transaction hash".to_string()));
    }

    let details = state.ledger.transaction_by_hash(&hash).await?;
    Ok(Json(TransactionResponse::try_from(&details)?))
}

async fn get_wallet(
    State(state): State<Arc<AppState>>,
    Path(address): Path<String>,
    Query(params): Query<LimitQuery>,
) -> Result<Json<WalletResponse>, ApiError> {
    if !address.starts_with("0x") {
        return Err(ApiError::InvalidInput("Invalid wallet address".to_string()));
    }
    let limit = clamp_limit(
        params.limit.as_deref(),
        state.limits.default_limit,
        state.limits.max_limit,
    );

    let snapshot = state.ledger.wallet_snapshot(&address, limit).await?;
    Ok(Json(WalletResponse::from(&snapshot)))
}

async fn get_api_stats(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.get_stats().await)
}
