use crate::dtos::{
    CreateDeliveryOrderRequest, CreateDeliveryOrderResponse, DeliveryOrderListParams,
    DeliveryOrderResponse,
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

#[tracing::instrument(skip(state, req), fields(user_id = %user.0, do_no = %req.do_no))]
pub async fn create_delivery_order(
    State(state): State<AppState>,
    user: UserId,
    Json(req): Json<CreateDeliveryOrderRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()?;
    let outcome = state
        .service
        .create_delivery_order(req.into(), &user.0)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(CreateDeliveryOrderResponse::from(outcome)),
    ))
}

pub async fn list_delivery_orders(
    State(state): State<AppState>,
    Query(params): Query<DeliveryOrderListParams>,
) -> Result<impl IntoResponse, AppError> {
    let orders: Vec<DeliveryOrderResponse> = state
        .service
        .list_delivery_orders(&(&params).into())
        .await?
        .into_iter()
        .map(Into::into)
        .collect();
    Ok(Json(orders))
}

pub async fn get_delivery_order(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let order = state.service.get_delivery_order(&id).await?;
    Ok(Json(DeliveryOrderResponse::from(order)))
}
