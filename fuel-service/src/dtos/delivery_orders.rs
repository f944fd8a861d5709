use super::{truck_param, FuelRecordResponse};
use crate::models::{DeliveryOrder, DoType, ImportExport, LedgerColumn};
use crate::services::{DeliveryOrderFilter, DeliveryOrderOutcome, NewDeliveryOrder};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
pub struct YardAllocation {
    pub column: LedgerColumn,
    pub litres: Decimal,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateDeliveryOrderRequest {
    #[validate(length(min = 1, message = "DO number is required"))]
    pub do_no: String,
    #[serde(default = "default_do_type")]
    pub do_type: DoType,
    pub import_export: ImportExport,
    pub date: NaiveDate,
    #[validate(length(min = 1, message = "Truck number is required"))]
    pub truck_no: String,
    pub trailer_no: Option<String>,
    pub driver_name: Option<String>,
    #[validate(length(min = 1, message = "Client name is required"))]
    pub client_name: String,
    #[validate(length(min = 1, message = "Loading point is required"))]
    pub loading_point: String,
    #[validate(length(min = 1, message = "Destination is required"))]
    pub destination: String,
    pub cargo: Option<String>,
    pub tonnage: Option<Decimal>,
    pub rate_per_ton: Option<Decimal>,
    pub initial_yard: Option<YardAllocation>,
}

fn default_do_type() -> DoType {
    DoType::Do
}

impl From<CreateDeliveryOrderRequest> for NewDeliveryOrder {
    fn from(req: CreateDeliveryOrderRequest) -> Self {
        Self {
            do_no: req.do_no,
            do_type: req.do_type,
            import_export: req.import_export,
            date: req.date,
            truck_no: req.truck_no,
            trailer_no: req.trailer_no,
            driver_name: req.driver_name,
            client_name: req.client_name,
            loading_point: req.loading_point,
            destination: req.destination,
            cargo: req.cargo,
            tonnage: req.tonnage,
            rate_per_ton: req.rate_per_ton,
            initial_yard: req.initial_yard.map(|y| (y.column, y.litres)),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct DeliveryOrderListParams {
    pub truck_no: Option<String>,
    pub import_export: Option<ImportExport>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl From<&DeliveryOrderListParams> for DeliveryOrderFilter {
    fn from(params: &DeliveryOrderListParams) -> Self {
        Self {
            truck_key: truck_param(&params.truck_no),
            import_export: params.import_export,
            from: params.from,
            to: params.to,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DeliveryOrderResponse {
    pub id: String,
    pub do_no: String,
    pub do_type: DoType,
    pub import_export: ImportExport,
    pub date: NaiveDate,
    pub truck_no: String,
    pub trailer_no: Option<String>,
    pub driver_name: Option<String>,
    pub client_name: String,
    pub loading_point: String,
    pub destination: String,
    pub cargo: Option<String>,
    pub tonnage: Option<Decimal>,
    pub rate_per_ton: Option<Decimal>,
    pub freight_amount: Option<Decimal>,
    pub fuel_record_id: Option<String>,
    pub created_by: String,
    pub created_at: String,
}

impl From<DeliveryOrder> for DeliveryOrderResponse {
    fn from(order: DeliveryOrder) -> Self {
        Self {
            freight_amount: order.freight_amount(),
            id: order.id,
            do_no: order.do_no,
            do_type: order.do_type,
            import_export: order.import_export,
            date: order.date,
            truck_no: order.truck_no,
            trailer_no: order.trailer_no,
            driver_name: order.driver_name,
            client_name: order.client_name,
            loading_point: order.loading_point,
            destination: order.destination,
            cargo: order.cargo,
            tonnage: order.tonnage,
            rate_per_ton: order.rate_per_ton,
            fuel_record_id: order.fuel_record_id,
            created_by: order.created_by,
            created_at: order.created_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CreateDeliveryOrderResponse {
    pub delivery_order: DeliveryOrderResponse,
    pub fuel_record: FuelRecordResponse,
}

impl From<DeliveryOrderOutcome> for CreateDeliveryOrderResponse {
    fn from(outcome: DeliveryOrderOutcome) -> Self {
        Self {
            delivery_order: outcome.delivery_order.into(),
            fuel_record: outcome.record.into(),
        }
    }
}
