use crate::dtos::{
    CreateFuelRecordRequest, ExtraFuelResponse, FuelRecordResponse, RecordListParams,
    UpdateColumnsRequest,
};
use crate::middleware::UserId;
use crate::startup::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use service_core::error::AppError;
use validator::Validate;

#[tracing::instrument(skip(state, req), fields(user_id = %user.0))]
pub async fn create_fuel_record(
    State(state): State<AppState>,
    user: UserId,
    Json(req): Json<CreateFuelRecordRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()?;
    let record = state.service.create_record(req.into(), &user.0).await?;
    Ok((StatusCode::CREATED, Json(FuelRecordResponse::from(record))))
}

pub async fn list_fuel_records(
    State(state): State<AppState>,
    Query(params): Query<RecordListParams>,
) -> Result<impl IntoResponse, AppError> {
    let records: Vec<FuelRecordResponse> = state
        .service
        .list_records(&(&params).into())
        .await?
        .into_iter()
        .map(Into::into)
        .collect();
    Ok(Json(records))
}

pub async fn get_fuel_record(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let record = state.service.get_record(&id).await?;
    Ok(Json(FuelRecordResponse::from(record)))
}

#[tracing::instrument(skip(state, req), fields(user_id = %user.0))]
pub async fn update_record_columns(
    State(state): State<AppState>,
    user: UserId,
    Path(id): Path<String>,
    Json(req): Json<UpdateColumnsRequest>,
) -> Result<impl IntoResponse, AppError> {
    if req.columns.is_empty() && req.extra.is_none() {
        return Err(AppError::BadRequest(anyhow::anyhow!(
            "Nothing to update: provide columns or extra"
        )));
    }
    let record = state.service.update_columns(&id, req.into()).await?;
    Ok(Json(FuelRecordResponse::from(record)))
}

#[tracing::instrument(skip(state), fields(user_id = %user.0))]
pub async fn delete_fuel_record(
    State(state): State<AppState>,
    user: UserId,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    state.service.delete_record(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn get_record_extra_fuel(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let flags = state.service.record_extra_fuel(&id).await?;
    Ok(Json(ExtraFuelResponse::new(id, flags)))
}
