use std::collections::HashMap;

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        OriginalUri, Path, Query, State,
    },
    http::header,
    Json,
};
use serde_json::json;
use tracing::info;

use crate::database::Repository;
use crate::error::ApiError;
use crate::handlers::{require_id, with_pagination, PageQuery};
use crate::middleware::{ApiResponse, ApiResult};
use crate::models::{Villa, VillaDto, VillaNumber, VillaNumberCreateDto, VillaNumberDto, VillaNumberUpdateDto};
use crate::state::AppState;

pub const VILLA_NUMBER_EXISTS: &str = "Villa Number already Exists!";
pub const VILLA_ID_INVALID: &str = "Villa Id is Invalid!";

/// Load the parent villas of `numbers` in one query and embed them
async fn include_villas(
    villas: &dyn Repository<Villa>,
    numbers: Vec<VillaNumber>,
) -> Result<Vec<VillaNumberDto>, ApiError> {
    let mut ids: Vec<i32> = numbers.iter().map(|n| n.villa_id).collect();
    ids.sort_unstable();
    ids.dedup();

    let parents: HashMap<i32, VillaDto> = if ids.is_empty() {
        HashMap::new()
    } else {
        villas
            .get_all(Some(json!({ "id": { "$in": ids } })), crate::database::Page::all())
            .await?
            .into_iter()
            .map(|v| (v.id, VillaDto::from(v)))
            .collect()
    };

    Ok(numbers
        .into_iter()
        .map(|n| {
            let villa = parents.get(&n.villa_id).cloned();
            VillaNumberDto::with_villa(n, villa)
        })
        .collect())
}

async fn load(numbers: &dyn Repository<VillaNumber>, villa_no: i32) -> Result<VillaNumber, ApiError> {
    numbers
        .get_by_key(villa_no)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Villa number {} not found", villa_no)))
}

async fn require_villa(villas: &dyn Repository<Villa>, villa_id: i32) -> Result<(), ApiError> {
    match villas.get_by_key(villa_id).await? {
        Some(_) => Ok(()),
        None => Err(ApiError::validation_error(VILLA_ID_INVALID, None)),
    }
}

/// GET /api/v{1,2}/VillaNumberAPI
pub async fn get_villa_numbers(
    State(state): State<AppState>,
    query: Result<Query<PageQuery>, QueryRejection>,
) -> ApiResult<Vec<VillaNumberDto>> {
    let Query(query) = query?;
    let page = query.page();

    let numbers = state.villa_numbers.get_all(None, page).await?;
    let dtos = include_villas(state.villas.as_ref(), numbers).await?;
    Ok(with_pagination(ApiResponse::success(dtos), page))
}

/// GET /api/v{1,2}/VillaNumberAPI/:id
pub async fn get_villa_number(
    State(state): State<AppState>,
    id: Result<Path<i32>, PathRejection>,
) -> ApiResult<VillaNumberDto> {
    let Path(id) = id?;
    let id = require_id(id)?;
    let number = load(state.villa_numbers.as_ref(), id).await?;

    let dto = include_villas(state.villas.as_ref(), vec![number])
        .await?
        .pop()
        .ok_or_else(|| ApiError::not_found(format!("Villa number {} not found", id)))?;
    Ok(ApiResponse::success(dto))
}

/// POST /api/v{1,2}/VillaNumberAPI
pub async fn create_villa_number(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    payload: Result<Json<VillaNumberCreateDto>, JsonRejection>,
) -> ApiResult<VillaNumberDto> {
    let Json(dto) = payload?;
    dto.validate()?;

    if state.villa_numbers.get_by_key(dto.villa_no).await?.is_some() {
        return Err(ApiError::validation_error(VILLA_NUMBER_EXISTS, None));
    }
    require_villa(state.villas.as_ref(), dto.villa_id).await?;

    let number = state.villa_numbers.create(VillaNumber::from(dto)).await?;
    info!("Created villa number {} for villa {}", number.villa_no, number.villa_id);

    let location = format!("{}/{}", uri.path().trim_end_matches('/'), number.villa_no);
    Ok(ApiResponse::created(VillaNumberDto::from(number)).header(header::LOCATION, location))
}

/// PUT /api/v{1,2}/VillaNumberAPI/:id
pub async fn update_villa_number(
    State(state): State<AppState>,
    id: Result<Path<i32>, PathRejection>,
    payload: Result<Json<VillaNumberUpdateDto>, JsonRejection>,
) -> ApiResult<()> {
    let Path(id) = id?;
    let Json(dto) = payload?;

    if id != dto.villa_no {
        return Err(ApiError::bad_request("Route id does not match villa number"));
    }
    dto.validate()?;
    require_villa(state.villas.as_ref(), dto.villa_id).await?;

    let existing = load(state.villa_numbers.as_ref(), id).await?;
    state.villa_numbers.update(dto.merge_into(existing)).await?;
    info!("Updated villa number {}", id);
    Ok(ApiResponse::no_content())
}

/// DELETE /api/v{1,2}/VillaNumberAPI/:id
pub async fn delete_villa_number(
    State(state): State<AppState>,
    id: Result<Path<i32>, PathRejection>,
) -> ApiResult<()> {
    let Path(id) = id?;
    let id = require_id(id)?;
    let number = load(state.villa_numbers.as_ref(), id).await?;

    state.villa_numbers.remove(&number).await?;
    info!("Deleted villa number {}", id);
    Ok(ApiResponse::no_content())
}
