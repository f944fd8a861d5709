use crate::dtos::{CreateStationRequest, StationResponse, UpdateStationRequest};
use crate::middleware::UserId;
use crate::startup::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use service_core::error::AppError;
use validator::Validate;

#[tracing::instrument(skip(state, req), fields(user_id = %user.0))]
pub async fn create_station(
    State(state): State<AppState>,
    user: UserId,
    Json(req): Json<CreateStationRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()?;
    let station = state.service.create_station(req.into()).await?;
    Ok((StatusCode::CREATED, Json(StationResponse::from(station))))
}

pub async fn list_stations(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let stations: Vec<StationResponse> = state
        .service
        .list_stations()
        .await?
        .into_iter()
        .map(Into::into)
        .collect();
    Ok(Json(stations))
}

#[tracing::instrument(skip(state, req), fields(user_id = %user.0))]
pub async fn update_station(
    State(state): State<AppState>,
    user: UserId,
    Path(name): Path<String>,
    Json(req): Json<UpdateStationRequest>,
) -> Result<impl IntoResponse, AppError> {
    let station = state.service.update_station(&name, req.into()).await?;
    Ok(Json(StationResponse::from(station)))
}
