use crate::error::ApiResult;
use crate::state::AppState;
use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

pub async fn states(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let states = state.storage.get_states().await?;
    Ok(Json(json!({ "states": states })))
}

#[derive(Debug, Deserialize)]
pub struct DistrictQuery {
    pub state_id: u32,
}

pub async fn districts(
    State(state): State<AppState>,
    Query(query): Query<DistrictQuery>,
) -> ApiResult<Json<Value>> {
    let districts = state.storage.get_districts(query.state_id).await?;
    Ok(Json(json!({ "districts": districts })))
}

#[derive(Debug, Deserialize)]
pub struct MandalQuery {
    pub district_id: u32,
}

pub async fn mandals(
    State(state): State<AppState>,
    Query(query): Query<MandalQuery>,
) -> ApiResult<Json<Value>> {
    let mandals = state.storage.get_mandals(query.district_id).await?;
    Ok(Json(json!({ "mandals": mandals })))
}

#[derive(Debug, Deserialize)]
pub struct GramPanchayatQuery {
    pub mandal_id: u32,
}

pub async fn gram_panchayats(
    State(state): State<AppState>,
    Query(query): Query<GramPanchayatQuery>,
) -> ApiResult<Json<Value>> {
    let gram_panchayats = state.storage.get_gram_panchayats(query.mandal_id).await?;
    Ok(Json(json!({ "gram_panchayats": gram_panchayats })))
}
