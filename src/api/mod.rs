// src/api/mod.rs
//! REST surface (axum).

use std::sync::Arc;

use axum::extract::{FromRequest, State};
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderValue, Method};
use axum::routing::{get, post};
use axum::{Json, Router};
use ethers::utils::to_checksum;
use serde_json::{json, Value};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::{warn, Level};

use crate::account::{AccountResolver, AddressSource};
use crate::chain::ChainClient;
use crate::error::ApiError;
use crate::gas::GasEstimator;
use crate::paymaster::{unix_now, Paymaster};
use crate::userop::LocalSubmitter;

mod account;
mod paymaster;
mod userop;

/// Shared, read-only state handed to every handler.
pub struct AppState {
    pub accounts: AccountResolver,
    pub paymaster: Arc<Paymaster>,
    pub gas: GasEstimator,
    pub submitter: LocalSubmitter,
}

impl AppState {
    pub fn new(chain: Arc<dyn ChainClient>, paymaster: Arc<Paymaster>, source: AddressSource) -> Self {
        Self {
            accounts: AccountResolver::new(chain.clone(), source),
            paymaster,
            gas: GasEstimator::new(chain.clone()),
            submitter: LocalSubmitter::new(chain),
        }
    }
}

/// JSON body extractor whose rejections use the service's error envelope.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

pub fn router(state: Arc<AppState>, cors: CorsLayer) -> Router {
    let account = Router::new()
        .route("/address/:owner/:salt", get(account::counterfactual_address))
        .route("/create", post(account::create))
        .route("/:address", get(account::info));

    let paymaster = Router::new()
        .route("/sign", post(paymaster::sign))
        .route("/sponsor", post(paymaster::sponsor));

    let userop = Router::new()
        .route("/estimate", post(userop::estimate))
        .route("/send", post(userop::send))
        .route("/:hash", get(userop::receipt));

    Router::new()
        .route("/health", get(health))
        .nest("/api/account", account)
        .nest("/api/paymaster", paymaster)
        .nest("/api/userop", userop)
        .fallback(not_found)
        .with_state(state)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
}

/// `*` allows any origin, anything else is treated as a comma separated
/// origin list. Credentials are only allowed for an explicit list.
pub fn cors_layer(cors_origin: &str) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods([Method::GET, Method::POST]);

    if cors_origin.trim() == "*" {
        return layer.allow_origin(Any).allow_headers(Any);
    }

    let origins: Vec<HeaderValue> = cors_origin
        .split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin: {:?}", origin);
                None
            }
        })
        .collect();
    if origins.is_empty() {
        warn!("No valid CORS origin in {:?}, cross-origin requests will be refused", cors_origin);
    }

    layer
        .allow_origin(AllowOrigin::list(origins))
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .allow_credentials(true)
}

async fn health(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "timestamp": unix_now().unwrap_or_default(),
        "chainId": state.paymaster.chain_id(),
        "signer": to_checksum(&state.paymaster.signer_address(), None),
        "demoMode": state.accounts.source().is_demo(),
    }))
}

async fn not_found() -> ApiError {
    ApiError::NotFound
}
