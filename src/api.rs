// Account Service - REST API with Axum
//
// /accounts maps HTTP verbs onto AccountStore calls. Bodies are JSON or XML,
// picked from Content-Type on the way in and from Accept on the way out.

use axum::{
    async_trait,
    body::Bytes,
    extract::{FromRequest, FromRequestParts, Path, Request, State},
    http::{
        header::{ACCEPT, CONTENT_TYPE, LOCATION},
        request::Parts,
        StatusCode,
    },
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use std::convert::Infallible;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use crate::account::Account;
use crate::codec::{self, Format};
use crate::error::{CodecError, StoreError};
use crate::store::AccountStore;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn AccountStore>,
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("account {0} not found")]
    NotFound(i64),
    #[error("{0}")]
    Malformed(String),
    #[error("unsupported media type: {0}")]
    UnsupportedMediaType(String),
    #[error("{0}")]
    Internal(String),
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => ApiError::NotFound(id),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<CodecError> for ApiError {
    fn from(err: CodecError) -> Self {
        match err {
            CodecError::Json(_) | CodecError::XmlDecode(_) => ApiError::Malformed(err.to_string()),
            CodecError::UnsupportedMediaType(media) => ApiError::UnsupportedMediaType(media),
            CodecError::XmlEncode(_) => ApiError::Internal(err.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::NotFound(id) => {
                warn!(id, "account not found");
                StatusCode::NOT_FOUND.into_response()
            }
            ApiError::Malformed(msg) => (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({ "error": msg })),
            )
                .into_response(),
            ApiError::UnsupportedMediaType(media) => (
                StatusCode::UNSUPPORTED_MEDIA_TYPE,
                Json(serde_json::json!({ "error": format!("unsupported media type: {media}") })),
            )
                .into_response(),
            ApiError::Internal(msg) => {
                error!(error = %msg, "request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(serde_json::json!({ "error": "internal server error" })),
                )
                    .into_response()
            }
        }
    }
}

// ============================================================================
// Extractors
// ============================================================================

/// Response format negotiated from the `Accept` header
pub struct Negotiated(pub Format);

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for Negotiated {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let accept = parts.headers.get(ACCEPT).and_then(|v| v.to_str().ok());
        Ok(Negotiated(Format::from_accept(accept)))
    }
}

/// Account decoded from a JSON or XML request body
pub struct AccountBody(pub Account);

#[async_trait]
impl<S: Send + Sync> FromRequest<S> for AccountBody {
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let format = match req.headers().get(CONTENT_TYPE) {
            None => Format::from_content_type(None)?,
            Some(value) => {
                let value = value
                    .to_str()
                    .map_err(|_| ApiError::UnsupportedMediaType("<non-ascii>".into()))?;
                Format::from_content_type(Some(value))?
            }
        };

        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|e| ApiError::Malformed(e.body_text()))?;

        Ok(AccountBody(codec::decode_account(format, &bytes)?))
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Run a store call off the async workers
async fn with_store<T, F>(state: &AppState, call: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce(&dyn AccountStore) -> Result<T, StoreError> + Send + 'static,
{
    let store = Arc::clone(&state.store);
    let result = tokio::task::spawn_blocking(move || call(store.as_ref()))
        .await
        .map_err(|e| ApiError::Internal(format!("store task failed: {e}")))?;

    Ok(result?)
}

fn encoded(format: Format, body: Result<String, CodecError>) -> Result<Response, ApiError> {
    let body = body.map_err(|e| ApiError::Internal(e.to_string()))?;
    Ok(([(CONTENT_TYPE, format.content_type())], body).into_response())
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /health - Health check
async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

/// GET /accounts - All accounts, possibly none
async fn list_accounts(
    State(state): State<AppState>,
    Negotiated(format): Negotiated,
) -> Result<Response, ApiError> {
    let accounts = with_store(&state, |store| store.list()).await?;
    encoded(format, codec::encode_accounts(format, &accounts))
}

/// GET /accounts/:id - One account or 404
async fn get_account(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Negotiated(format): Negotiated,
) -> Result<Response, ApiError> {
    let account = with_store(&state, move |store| store.get(id)).await?;
    encoded(format, codec::encode_account(format, &account))
}

/// POST /accounts - Create; any client-supplied id is ignored
async fn create_account(
    State(state): State<AppState>,
    Negotiated(format): Negotiated,
    AccountBody(input): AccountBody,
) -> Result<Response, ApiError> {
    let fields = input.fields();
    let account = with_store(&state, move |store| store.create(fields)).await?;
    let id = account
        .id
        .ok_or_else(|| ApiError::Internal("store returned an account without id".into()))?;
    info!(id, balance = account.balance, account_type = %account.account_type, "account created");

    let body = encoded(format, codec::encode_account(format, &account))?;
    Ok((StatusCode::CREATED, [(LOCATION, format!("/accounts/{id}"))], body).into_response())
}

/// PUT /accounts/:id - Overwrite balance, creation date and type
async fn update_account(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Negotiated(format): Negotiated,
    AccountBody(input): AccountBody,
) -> Result<Response, ApiError> {
    let fields = input.fields();
    let account = with_store(&state, move |store| store.update(id, fields)).await?;
    info!(id, balance = account.balance, account_type = %account.account_type, "account updated");

    encoded(format, codec::encode_account(format, &account))
}

/// DELETE /accounts/:id - 200 with empty body, or 404
async fn delete_account(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    with_store(&state, move |store| store.delete(id)).await?;
    info!(id, "account deleted");

    Ok(StatusCode::OK)
}

// ============================================================================
// Router
// ============================================================================

pub fn router(store: Arc<dyn AccountStore>) -> Router {
    let state = AppState { store };

    Router::new()
        .route("/health", get(health_check))
        .route("/accounts", get(list_accounts).post(create_account))
        .route(
            "/accounts/:id",
            get(get_account).put(update_account).delete(delete_account),
        )
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
