use crate::dtos::{CreateLpoRequest, CreateLpoResponse, LpoListParams, LpoResponse, UpdateLpoStatusRequest};
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

#[tracing::instrument(
    skip(state, req),
    fields(user_id = %user.0, truck_no = %req.truck_no, payment_mode = %req.payment_mode)
)]
pub async fn create_lpo(
    State(state): State<AppState>,
    user: UserId,
    Json(req): Json<CreateLpoRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()?;
    let plan = state.service.create_lpo(req.into_new_lpo(user.0)).await?;
    Ok((StatusCode::CREATED, Json(CreateLpoResponse::from(plan))))
}

pub async fn list_lpos(
    State(state): State<AppState>,
    Query(params): Query<LpoListParams>,
) -> Result<impl IntoResponse, AppError> {
    let lpos: Vec<LpoResponse> = state
        .service
        .list_lpos(&(&params).into())
        .await?
        .into_iter()
        .map(Into::into)
        .collect();
    Ok(Json(lpos))
}

pub async fn get_lpo(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let lpo = state.service.get_lpo(&id).await?;
    Ok(Json(LpoResponse::from(lpo)))
}

/// Rows for the LPO sheet; cancelled rows are kept and marked struck through.
pub async fn export_lpos(
    State(state): State<AppState>,
    Query(params): Query<LpoListParams>,
) -> Result<impl IntoResponse, AppError> {
    let rows = state.service.export_lpos(&(&params).into()).await?;
    Ok(Json(rows))
}

#[tracing::instrument(skip(state, req), fields(user_id = %user.0))]
pub async fn update_lpo_status(
    State(state): State<AppState>,
    user: UserId,
    Path(id): Path<String>,
    Json(req): Json<UpdateLpoStatusRequest>,
) -> Result<impl IntoResponse, AppError> {
    let lpo = state
        .service
        .update_lpo_status(&id, req.status, &user.0)
        .await?;
    Ok(Json(LpoResponse::from(lpo)))
}

#[tracing::instrument(skip(state), fields(user_id = %user.0))]
pub async fn cancel_lpo(
    State(state): State<AppState>,
    user: UserId,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let lpo = state.service.cancel_lpo(&id, &user.0).await?;
    Ok(Json(LpoResponse::from(lpo)))
}

#[tracing::instrument(skip(state), fields(user_id = %user.0))]
pub async fn delete_lpo(
    State(state): State<AppState>,
    user: UserId,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    state.service.delete_lpo(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}
