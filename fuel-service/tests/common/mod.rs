#![allow(dead_code)]

use fuel_service::config::FuelConfig;
use fuel_service::services::metrics::init_metrics;
use fuel_service::services::InMemoryFuelStore;
use fuel_service::startup::Application;
use reqwest::{Client, Response};
use rust_decimal::Decimal;
use serde_json::{json, Value};
use std::str::FromStr;
use std::sync::Arc;

pub const TEST_USER_ID: &str = "clerk_123";
pub const TRUCK: &str = "T530 DRF";

pub struct TestApp {
    pub address: String,
    pub port: u16,
    pub client: Client,
}

impl TestApp {
    pub async fn spawn() -> Self {
        init_metrics();

        let app = Application::build_with_store(
            FuelConfig::for_tests(),
            Arc::new(InMemoryFuelStore::new()),
        )
        .await
        .expect("Failed to build test application");

        let port = app.port();
        let address = format!("http://127.0.0.1:{}", port);

        tokio::spawn(async move {
            app.run_until_stopped().await.ok();
        });

        // Wait for the server to accept connections
        let client = Client::new();
        let health_url = format!("{}/health", address);
        for _ in 0..50 {
            if client.get(&health_url).send().await.is_ok() {
                break;
            }
            tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;
        }

        TestApp {
            address,
            port,
            client,
        }
    }

    pub async fn get(&self, path: &str) -> Response {
        self.client
            .get(format!("{}{}", self.address, path))
            .header("X-User-ID", TEST_USER_ID)
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn post(&self, path: &str, body: &Value) -> Response {
        self.post_as(path, body, TEST_USER_ID).await
    }

    pub async fn post_as(&self, path: &str, body: &Value, user: &str) -> Response {
        self.client
            .post(format!("{}{}", self.address, path))
            .header("X-User-ID", user)
            .json(body)
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn patch(&self, path: &str, body: &Value) -> Response {
        self.client
            .patch(format!("{}{}", self.address, path))
            .header("X-User-ID", TEST_USER_ID)
            .json(body)
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn delete(&self, path: &str) -> Response {
        self.client
            .delete(format!("{}{}", self.address, path))
            .header("X-User-ID", TEST_USER_ID)
            .send()
            .await
            .expect("Failed to execute request")
    }

    /// Station serving Mbeya in both directions.
    pub async fn seed_station(&self, name: &str) {
        let response = self
            .post(
                "/stations",
                &json!({
                    "name": name,
                    "going_checkpoint": "MBEYA_GOING",
                    "returning_checkpoint": "MBEYA_RETURN",
                    "default_rate": 3100
                }),
            )
            .await;
        assert_eq!(response.status().as_u16(), 201, "station seed failed");
    }

    /// Going DO opening a journey with a Dar yard allocation. Returns the
    /// fuel record id.
    pub async fn seed_journey(&self, truck_no: &str, do_no: &str, yard_litres: i64) -> String {
        let response = self
            .post(
                "/delivery-orders",
                &json!({
                    "do_no": do_no,
                    "import_export": "IMPORT",
                    "date": "2025-06-02",
                    "truck_no": truck_no,
                    "client_name": "Copperbelt Mining",
                    "loading_point": "Dar es Salaam",
                    "destination": "Lubumbashi",
                    "initial_yard": { "column": "dar_yard", "litres": yard_litres }
                }),
            )
            .await;
        assert_eq!(response.status().as_u16(), 201, "journey seed failed");
        let body: Value = response.json().await.expect("Failed to parse JSON");
        body["fuel_record"]["id"]
            .as_str()
            .expect("missing fuel record id")
            .to_string()
    }

    pub async fn record(&self, id: &str) -> Value {
        let response = self.get(&format!("/fuel-records/{}", id)).await;
        assert_eq!(response.status().as_u16(), 200);
        response.json().await.expect("Failed to parse JSON")
    }
}

pub fn station_lpo(lpo_no: &str, station: &str, truck_no: &str, do_no: &str, litres: i64) -> Value {
    json!({
        "lpo_no": lpo_no,
        "station": station,
        "date": "2025-06-03",
        "truck_no": truck_no,
        "do_no": do_no,
        "destination": "Lubumbashi",
        "litres": litres,
        "rate": 3100,
        "payment_mode": "STATION"
    })
}

pub fn fixed_point(direction: &str, checkpoint: &str) -> Value {
    json!({
        "direction": direction,
        "selection": { "kind": "fixed", "checkpoint": checkpoint }
    })
}

/// Decimal fields come back as strings.
pub fn dec(value: &Value) -> Decimal {
    match value {
        Value::String(s) => Decimal::from_str(s).expect("invalid decimal string"),
        Value::Number(n) => Decimal::from_str(&n.to_string()).expect("invalid decimal number"),
        other => panic!("not a decimal: {}", other),
    }
}
