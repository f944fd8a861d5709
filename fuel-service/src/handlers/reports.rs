use crate::dtos::ReportParams;
use crate::startup::AppState;
use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Json,
};
use service_core::error::AppError;

pub async fn route_report(
    State(state): State<AppState>,
    Query(params): Query<ReportParams>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.service.route_report(&(&params).into()).await?))
}

pub async fn truck_report(
    State(state): State<AppState>,
    Query(params): Query<ReportParams>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.service.truck_report(&(&params).into()).await?))
}

pub async fn station_report(
    State(state): State<AppState>,
    Query(params): Query<ReportParams>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.service.station_report(&(&params).into()).await?))
}

pub async fn extra_fuel_report(
    State(state): State<AppState>,
    Query(params): Query<ReportParams>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(
        state.service.extra_fuel_report(&(&params).into()).await?,
    ))
}
