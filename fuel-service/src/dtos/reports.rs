use super::truck_param;
use crate::services::{LpoFilter, RecordFilter};
use chrono::NaiveDate;
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
pub struct ReportParams {
    pub truck_no: Option<String>,
    pub station: Option<String>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl From<&ReportParams> for RecordFilter {
    fn from(params: &ReportParams) -> Self {
        Self {
            truck_key: truck_param(&params.truck_no),
            from: params.from,
            to: params.to,
            include_deleted: false,
        }
    }
}

impl From<&ReportParams> for LpoFilter {
    fn from(params: &ReportParams) -> Self {
        Self {
            truck_key: truck_param(&params.truck_no),
            station: params.station.clone().filter(|s| !s.trim().is_empty()),
            from: params.from,
            to: params.to,
            ..Default::default()
        }
    }
}
