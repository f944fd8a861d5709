use crate::dtos::{
    CreateDriverAccountRequest, DisputeDriverAccountRequest, DriverAccountListParams,
    DriverAccountOutcomeResponse, DriverAccountResponse, SettleDriverAccountRequest,
    UpdateDriverAccountRequest,
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

#[tracing::instrument(skip(state, req), fields(user_id = %user.0, truck_no = %req.truck_no))]
pub async fn create_driver_account(
    State(state): State<AppState>,
    user: UserId,
    Json(req): Json<CreateDriverAccountRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()?;
    let plan = state
        .service
        .create_driver_account(req.into(), &user.0)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(DriverAccountOutcomeResponse::from(plan)),
    ))
}

pub async fn list_driver_accounts(
    State(state): State<AppState>,
    Query(params): Query<DriverAccountListParams>,
) -> Result<impl IntoResponse, AppError> {
    params.validate()?;
    let entries: Vec<DriverAccountResponse> = state
        .service
        .list_driver_accounts(&(&params).into())
        .await?
        .into_iter()
        .map(Into::into)
        .collect();
    Ok(Json(entries))
}

pub async fn get_driver_account(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let entry = state.service.get_driver_account(&id).await?;
    Ok(Json(DriverAccountResponse::from(entry)))
}

/// Monthly sheet rows; DO and destination read `NIL`.
pub async fn export_driver_accounts(
    State(state): State<AppState>,
    Query(params): Query<DriverAccountListParams>,
) -> Result<impl IntoResponse, AppError> {
    params.validate()?;
    let rows = state
        .service
        .export_driver_accounts(&(&params).into())
        .await?;
    Ok(Json(rows))
}

#[tracing::instrument(skip(state, req), fields(user_id = %user.0))]
pub async fn update_driver_account(
    State(state): State<AppState>,
    user: UserId,
    Path(id): Path<String>,
    Json(req): Json<UpdateDriverAccountRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()?;
    let entry = state.service.update_driver_account(&id, req.into()).await?;
    Ok(Json(DriverAccountResponse::from(entry)))
}

#[tracing::instrument(skip(state, req), fields(user_id = %user.0))]
pub async fn settle_driver_account(
    State(state): State<AppState>,
    user: UserId,
    Path(id): Path<String>,
    Json(req): Json<SettleDriverAccountRequest>,
) -> Result<impl IntoResponse, AppError> {
    let plan = state
        .service
        .settle_driver_account(&id, &user.0, req.cancellation_point)
        .await?;
    Ok(Json(DriverAccountOutcomeResponse::from(plan)))
}

#[tracing::instrument(skip(state, req), fields(user_id = %user.0))]
pub async fn dispute_driver_account(
    State(state): State<AppState>,
    user: UserId,
    Path(id): Path<String>,
    Json(req): Json<DisputeDriverAccountRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()?;
    let entry = state
        .service
        .dispute_driver_account(&id, &user.0, req.reason)
        .await?;
    Ok(Json(DriverAccountResponse::from(entry)))
}

#[tracing::instrument(skip(state), fields(user_id = %user.0))]
pub async fn delete_driver_account(
    State(state): State<AppState>,
    user: UserId,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    state.service.delete_driver_account(&id, &user.0).await?;
    Ok(StatusCode::NO_CONTENT)
}
