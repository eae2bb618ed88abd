pub mod users;
pub mod villa;
pub mod villa_number;

use axum::{extract::State, http::header, response::IntoResponse};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::database::Page;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::models::{pagination::PAGINATION_HEADER, Pagination};
use crate::state::AppState;

/// `pageSize` / `pageNumber` query parameters shared by the list endpoints
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageQuery {
    pub page_size: Option<i64>,
    pub page_number: Option<i64>,
}

impl PageQuery {
    pub fn page(&self) -> Page {
        Page::new(self.page_size.unwrap_or(0), self.page_number.unwrap_or(1))
    }
}

/// Add the `X-Pagination` header describing `page`
pub(crate) fn with_pagination<T: serde::Serialize>(response: ApiResponse<T>, page: Page) -> ApiResponse<T> {
    let pagination = Pagination {
        page_number: page.number(),
        page_size: page.size(),
    };
    match serde_json::to_string(&pagination) {
        Ok(value) => response.header(header::HeaderName::from_static(PAGINATION_HEADER), value),
        Err(e) => {
            tracing::error!("Failed to serialize pagination header: {}", e);
            response
        }
    }
}

/// Route ids must be non-zero
pub(crate) fn require_id(id: i32) -> Result<i32, ApiError> {
    if id == 0 {
        return Err(ApiError::bad_request("Id must not be zero"));
    }
    Ok(id)
}

/// GET / - service description
pub async fn root() -> ApiResult<Value> {
    Ok(ApiResponse::success(json!({
        "name": "Villa API",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Villa and villa number management with JWT authentication",
        "endpoints": {
            "health": "/health (public)",
            "auth": "/api/v1/UsersAuth/login, /api/v1/UsersAuth/register (public), /api/v1/UsersAuth/whoami (bearer)",
            "villas": "/api/v1/VillaAPI[/:id] (GET public, mutations admin)",
            "villa_numbers": "/api/v1/VillaNumberAPI[/:id], /api/v2/VillaNumberAPI[/:id] (GET public, mutations admin)",
        }
    })))
}

/// GET /health - pings Postgres, or checks the in-memory store answers
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    let checked = match &state.database {
        Some(db) => db.health_check().await,
        None => state.villas.count(None).await.map(|_| ()),
    };

    match checked {
        Ok(_) => ApiResponse::success(json!({
            "status": "ok",
            "timestamp": now,
            "database": "ok"
        }))
        .into_response(),
        Err(e) => {
            tracing::error!("Health check failed: {}", e);
            ApiError::service_unavailable("database unavailable").into_response()
        }
    }
}
