use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        OriginalUri, Path, Query, State,
    },
    http::header,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use crate::database::{Page, Repository};
use crate::error::ApiError;
use crate::filter::escape_like;
use crate::handlers::{require_id, with_pagination};
use crate::middleware::{ApiResponse, ApiResult};
use crate::models::{Villa, VillaCreateDto, VillaDto, VillaUpdateDto};
use crate::state::AppState;

pub const VILLA_EXISTS: &str = "Villa already Exists!";

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VillaListQuery {
    pub filter_occupancy: Option<i32>,
    pub search: Option<String>,
    pub page_size: Option<i64>,
    pub page_number: Option<i64>,
}

/// Filter for the list endpoint: exact occupancy when positive, and a
/// case-insensitive substring match on name or amenity
pub fn villa_filter(occupancy: Option<i32>, search: Option<&str>) -> Option<Value> {
    let mut conditions = vec![];

    if let Some(occupancy) = occupancy.filter(|o| *o > 0) {
        conditions.push(json!({ "occupancy": occupancy }));
    }

    if let Some(search) = search.map(str::trim).filter(|s| !s.is_empty()) {
        let pattern = format!("%{}%", escape_like(search));
        conditions.push(json!({
            "$or": [
                { "name": { "$ilike": pattern } },
                { "amenity": { "$ilike": pattern } },
            ]
        }));
    }

    match conditions.len() {
        0 => None,
        1 => conditions.pop(),
        _ => Some(json!({ "$and": conditions })),
    }
}

async fn name_taken(villas: &dyn Repository<Villa>, name: &str, except_id: Option<i32>) -> Result<bool, ApiError> {
    let mut filter = json!({ "name": { "$ieq": name.trim() } });
    if let Some(id) = except_id {
        filter["id"] = json!({ "$ne": id });
    }
    Ok(villas.get(Some(filter)).await?.is_some())
}

async fn load(villas: &dyn Repository<Villa>, id: i32) -> Result<Villa, ApiError> {
    villas
        .get_by_key(id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Villa {} not found", id)))
}

/// GET /api/v1/VillaAPI
pub async fn get_villas(
    State(state): State<AppState>,
    query: Result<Query<VillaListQuery>, QueryRejection>,
) -> ApiResult<Vec<VillaDto>> {
    let Query(query) = query?;
    let page = Page::new(query.page_size.unwrap_or(0), query.page_number.unwrap_or(1));
    let filter = villa_filter(query.filter_occupancy, query.search.as_deref());

    let villas = state.villas.get_all(filter, page).await?;
    let dtos: Vec<VillaDto> = villas.into_iter().map(VillaDto::from).collect();

    let response = ApiResponse::success(dtos).header(
        header::CACHE_CONTROL,
        format!("public,max-age={}", state.cache_max_age_secs),
    );
    Ok(with_pagination(response, page))
}

/// GET /api/v1/VillaAPI/:id
pub async fn get_villa(
    State(state): State<AppState>,
    id: Result<Path<i32>, PathRejection>,
) -> ApiResult<VillaDto> {
    let Path(id) = id?;
    let id = require_id(id)?;
    let villa = load(state.villas.as_ref(), id).await?;
    Ok(ApiResponse::success(VillaDto::from(villa)))
}

/// POST /api/v1/VillaAPI
pub async fn create_villa(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    payload: Result<Json<VillaCreateDto>, JsonRejection>,
) -> ApiResult<VillaDto> {
    let Json(dto) = payload?;
    dto.validate()?;

    if name_taken(state.villas.as_ref(), &dto.name, None).await? {
        return Err(ApiError::validation_error(VILLA_EXISTS, None));
    }

    let villa = state.villas.create(Villa::from(dto)).await?;
    info!("Created villa {} ({})", villa.id, villa.name);

    let location = format!("{}/{}", uri.path().trim_end_matches('/'), villa.id);
    Ok(ApiResponse::created(VillaDto::from(villa)).header(header::LOCATION, location))
}

/// PUT /api/v1/VillaAPI/:id
pub async fn update_villa(
    State(state): State<AppState>,
    id: Result<Path<i32>, PathRejection>,
    payload: Result<Json<VillaUpdateDto>, JsonRejection>,
) -> ApiResult<()> {
    let Path(id) = id?;
    let Json(dto) = payload?;

    if id != dto.id {
        return Err(ApiError::bad_request("Route id does not match villa id"));
    }
    save_update(&state, id, dto).await
}

/// PATCH /api/v1/VillaAPI/:id with an RFC 6902 document
pub async fn patch_villa(
    State(state): State<AppState>,
    id: Result<Path<i32>, PathRejection>,
    payload: Result<Json<json_patch::Patch>, JsonRejection>,
) -> ApiResult<()> {
    let Path(id) = id?;
    let id = require_id(id)?;
    let Json(patch) = payload?;

    let existing = load(state.villas.as_ref(), id).await?;
    let mut document = serde_json::to_value(VillaUpdateDto::from(existing))
        .map_err(|e| ApiError::internal_server_error(format!("Failed to prepare patch: {}", e)))?;

    json_patch::patch(&mut document, &patch.0).map_err(|e| ApiError::bad_request(format!("Invalid patch: {}", e)))?;

    let dto: VillaUpdateDto =
        serde_json::from_value(document).map_err(|e| ApiError::bad_request(format!("Invalid patch result: {}", e)))?;
    if dto.id != id {
        return Err(ApiError::bad_request("Patch must not change the villa id"));
    }
    save_update(&state, id, dto).await
}

async fn save_update(state: &AppState, id: i32, dto: VillaUpdateDto) -> ApiResult<()> {
    dto.validate()?;

    let existing = load(state.villas.as_ref(), id).await?;
    if name_taken(state.villas.as_ref(), &dto.name, Some(id)).await? {
        return Err(ApiError::validation_error(VILLA_EXISTS, None));
    }

    state.villas.update(dto.merge_into(existing)).await?;
    info!("Updated villa {}", id);
    Ok(ApiResponse::no_content())
}

/// DELETE /api/v1/VillaAPI/:id, also removing the villa's numbers
pub async fn delete_villa(
    State(state): State<AppState>,
    id: Result<Path<i32>, PathRejection>,
) -> ApiResult<()> {
    let Path(id) = id?;
    let id = require_id(id)?;
    let villa = load(state.villas.as_ref(), id).await?;

    // Postgres cascades the villa's numbers inside the villa delete; the sweep
    // afterwards clears them on stores without foreign keys
    state.villas.remove(&villa).await?;
    let numbers = state.villa_numbers.remove_all(json!({ "villa_id": id })).await?;

    info!("Deleted villa {} and {} remaining villa numbers", id, numbers);
    Ok(ApiResponse::no_content())
}
