mod common;

use common::{dec, fixed_point, station_lpo, TestApp, TRUCK};
use rust_decimal::Decimal;
use serde_json::{json, Value};

fn cash_lpo(lpo_no: &str, truck_no: &str, do_no: &str, litres: i64, point: Value) -> Value {
    json!({
        "lpo_no": lpo_no,
        "station": "Roadside Cash",
        "date": "2025-06-04",
        "truck_no": truck_no,
        "do_no": do_no,
        "destination": "Lubumbashi",
        "litres": litres,
        "rate": 3200,
        "payment_mode": "CASH",
        "cancellation_point": point
    })
}

#[tokio::test]
async fn station_lpo_books_the_station_checkpoint_column() {
    let app = TestApp::spawn().await;
    app.seed_station("Station X").await;
    let record_id = app.seed_journey(TRUCK, "DO-100", 2000).await;

    let response = app
        .post("/lpos", &station_lpo("LPO-1", "Station X", TRUCK, "DO-100", 300))
        .await;
    assert_eq!(response.status().as_u16(), 201);
    let body: Value = response.json().await.unwrap();

    assert_eq!(body["lpo"]["column"], "mbeya_going");
    assert_eq!(body["lpo"]["direction"], "going");
    assert_eq!(dec(&body["lpo"]["amount"]), Decimal::from(930_000));
    assert_eq!(body["cancelled"].as_array().unwrap().len(), 0);

    let record = app.record(&record_id).await;
    assert_eq!(dec(&record["columns"]["mbeya_going"]), Decimal::from(-300));
    assert_eq!(dec(&record["balance"]), Decimal::from(1700));
    assert_eq!(dec(&record["total_lts"]), Decimal::from(2000));
}

#[tokio::test]
async fn cash_entry_cancels_open_station_lpo_for_same_truck() {
    let app = TestApp::spawn().await;
    app.seed_station("Station X").await;
    let record_id = app.seed_journey(TRUCK, "DO-100", 2000).await;

    let station = app
        .post("/lpos", &station_lpo("LPO-1", "Station X", TRUCK, "DO-100", 300))
        .await;
    assert_eq!(station.status().as_u16(), 201);
    let station: Value = station.json().await.unwrap();
    let station_id = station["lpo"]["id"].as_str().unwrap().to_string();

    // Same truck typed differently, DO in lower case.
    let response = app
        .post(
            "/lpos",
            &cash_lpo("LPO-2", "t530drf", "do-100", 250, fixed_point("going", "MBEYA_GOING")),
        )
        .await;
    assert_eq!(response.status().as_u16(), 201);
    let body: Value = response.json().await.unwrap();
    let cash_id = body["lpo"]["id"].as_str().unwrap().to_string();

    let cancelled = body["cancelled"].as_array().unwrap();
    assert_eq!(cancelled.len(), 1);
    assert_eq!(cancelled[0]["id"], station_id.as_str());
    assert_eq!(cancelled[0]["status"], "cancelled");
    assert_eq!(cancelled[0]["superseded_by"], cash_id.as_str());

    let records = body["fuel_records"].as_array().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(dec(&records[0]["columns"]["mbeya_going"]), Decimal::from(-250));
    assert_eq!(dec(&records[0]["balance"]), Decimal::from(1750));

    let stale: Value = app
        .get(&format!("/lpos/{}", station_id))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(stale["status"], "cancelled");
    assert_eq!(stale["cancelled_by"], common::TEST_USER_ID);

    let record = app.record(&record_id).await;
    assert_eq!(dec(&record["balance"]), Decimal::from(1750));
}

#[tokio::test]
async fn cash_entry_releases_the_driver_account_behind_a_cancelled_lpo() {
    let app = TestApp::spawn().await;
    app.seed_station("Station X").await;
    let record_id = app.seed_journey(TRUCK, "DO-100", 2000).await;

    let driver_account = app
        .post(
            "/lpos",
            &json!({
                "lpo_no": "DA-1",
                "station": "Station X",
                "date": "2025-06-03",
                "truck_no": TRUCK,
                "litres": 90,
                "rate": 3100,
                "payment_mode": "DRIVER_ACCOUNT",
                "driver_name": "Juma Hassan",
                "cancellation_point": fixed_point("going", "MBEYA_GOING")
            }),
        )
        .await;
    assert_eq!(driver_account.status().as_u16(), 201);
    let driver_account: Value = driver_account.json().await.unwrap();
    let lpo_id = driver_account["lpo"]["id"].as_str().unwrap().to_string();
    let account_id = driver_account["driver_account"]["id"]
        .as_str()
        .unwrap()
        .to_string();
    assert_eq!(
        dec(&app.record(&record_id).await["columns"]["mbeya_going"]),
        Decimal::from(-90)
    );

    let response = app
        .post(
            "/lpos",
            &cash_lpo("LPO-2", TRUCK, "DO-100", 200, fixed_point("going", "MBEYA_GOING")),
        )
        .await;
    assert_eq!(response.status().as_u16(), 201);
    let body: Value = response.json().await.unwrap();

    let cancelled = body["cancelled"].as_array().unwrap();
    assert_eq!(cancelled.len(), 1);
    assert_eq!(cancelled[0]["id"], lpo_id.as_str());
    let released = body["released_driver_accounts"].as_array().unwrap();
    assert_eq!(released.len(), 1);
    assert_eq!(released[0]["id"], account_id.as_str());

    let record = app.record(&record_id).await;
    assert_eq!(dec(&record["columns"]["mbeya_going"]), Decimal::from(-200));
    assert_eq!(dec(&record["balance"]), Decimal::from(1800));

    let account = app.get(&format!("/driver-accounts/{}", account_id)).await;
    assert_eq!(account.status().as_u16(), 404);
    let listed: Value = app.get("/driver-accounts").await.json().await.unwrap();
    assert!(listed.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn cash_entry_keeps_a_settled_driver_account_and_its_lpo() {
    let app = TestApp::spawn().await;
    app.seed_station("Station X").await;
    let record_id = app.seed_journey(TRUCK, "DO-100", 2000).await;

    let created: Value = app
        .post(
            "/lpos",
            &json!({
                "lpo_no": "DA-2",
                "station": "Station X",
                "date": "2025-06-03",
                "truck_no": TRUCK,
                "litres": 90,
                "rate": 3100,
                "payment_mode": "DRIVER_ACCOUNT",
                "driver_name": "Juma Hassan",
                "cancellation_point": fixed_point("going", "MBEYA_GOING")
            }),
        )
        .await
        .json()
        .await
        .unwrap();
    let account_id = created["driver_account"]["id"].as_str().unwrap().to_string();
    let settled = app
        .post(&format!("/driver-accounts/{}/settle", account_id), &json!({}))
        .await;
    assert_eq!(settled.status().as_u16(), 200);

    let response = app
        .post(
            "/lpos",
            &cash_lpo("LPO-3", TRUCK, "DO-100", 200, fixed_point("going", "MBEYA_GOING")),
        )
        .await;
    assert_eq!(response.status().as_u16(), 409);

    let record = app.record(&record_id).await;
    assert_eq!(dec(&record["columns"]["mbeya_going"]), Decimal::from(-90));
    let lpo: Value = app
        .get(&format!("/lpos/{}", created["lpo"]["id"].as_str().unwrap()))
        .await
        .json()
        .await
        .unwrap();
    assert_ne!(lpo["status"], "cancelled");
}

#[tokio::test]
async fn cash_entry_leaves_other_trucks_and_checkpoints_alone() {
    let app = TestApp::spawn().await;
    app.seed_station("Station X").await;
    app.seed_journey(TRUCK, "DO-100", 2000).await;
    app.seed_journey("T777 XYZ", "DO-200", 2000).await;

    let other_truck = app
        .post("/lpos", &station_lpo("LPO-1", "Station X", "T777 XYZ", "DO-200", 300))
        .await;
    assert_eq!(other_truck.status().as_u16(), 201);

    let response = app
        .post(
            "/lpos",
            &cash_lpo("LPO-2", TRUCK, "DO-100", 100, fixed_point("going", "TUNDUMA_GOING")),
        )
        .await;
    assert_eq!(response.status().as_u16(), 201);
    let body: Value = response.json().await.unwrap();
    assert!(body["cancelled"].as_array().unwrap().is_empty());
    assert_eq!(body["lpo"]["column"], "tdm_going");

    let open: Value = app
        .get("/lpos?truck_no=t777%20xyz&status=pending")
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(open.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn cash_without_checkpoint_is_rejected_without_side_effects() {
    let app = TestApp::spawn().await;
    app.seed_station("Station X").await;
    let record_id = app.seed_journey(TRUCK, "DO-100", 2000).await;
    let station = app
        .post("/lpos", &station_lpo("LPO-1", "Station X", TRUCK, "DO-100", 300))
        .await;
    assert_eq!(station.status().as_u16(), 201);

    let response = app
        .post(
            "/lpos",
            &cash_lpo("LPO-2", TRUCK, "DO-100", 250, Value::Null),
        )
        .await;
    assert_eq!(response.status().as_u16(), 422);
    let body: Value = response.json().await.unwrap();
    assert!(body["details"]
        .as_str()
        .unwrap()
        .contains("cancellation_point"));

    let lpos: Value = app.get("/lpos?truck_no=T530DRF").await.json().await.unwrap();
    let lpos = lpos.as_array().unwrap();
    assert_eq!(lpos.len(), 1);
    assert_eq!(lpos[0]["status"], "pending");

    let record = app.record(&record_id).await;
    assert_eq!(dec(&record["balance"]), Decimal::from(1700));
}

#[tokio::test]
async fn custom_station_enabled_only_for_going_rejects_returning_claim() {
    let app = TestApp::spawn().await;
    app.seed_journey(TRUCK, "DO-100", 2000).await;

    let point = json!({
        "direction": "returning",
        "selection": {
            "kind": "custom",
            "station_name": "Custom1",
            "going_enabled": true,
            "going_column": "mbeya_going",
            "returning_enabled": false
        }
    });
    let response = app
        .post("/lpos", &cash_lpo("LPO-9", TRUCK, "DO-100", 100, point))
        .await;

    assert_eq!(response.status().as_u16(), 422);
}

#[tokio::test]
async fn cash_on_returning_leg_books_against_the_return_do() {
    let app = TestApp::spawn().await;
    let record_id = app.seed_journey(TRUCK, "DO-100", 2000).await;

    let export = app
        .post(
            "/delivery-orders",
            &json!({
                "do_no": "EX-1",
                "import_export": "EXPORT",
                "date": "2025-06-10",
                "truck_no": "t530 drf",
                "client_name": "Copperbelt Mining",
                "loading_point": "Lubumbashi",
                "destination": "Dar es Salaam"
            }),
        )
        .await;
    assert_eq!(export.status().as_u16(), 201);
    let export: Value = export.json().await.unwrap();
    assert_eq!(export["fuel_record"]["id"], record_id.as_str());
    assert_eq!(export["fuel_record"]["return_do"], "EX-1");

    // Going DO on a returning checkpoint is refused.
    let wrong_leg = app
        .post(
            "/lpos",
            &cash_lpo("LPO-3", TRUCK, "DO-100", 100, fixed_point("returning", "TUNDUMA_RETURN")),
        )
        .await;
    assert_eq!(wrong_leg.status().as_u16(), 422);

    let response = app
        .post(
            "/lpos",
            &cash_lpo("LPO-4", TRUCK, "EX-1", 120, fixed_point("returning", "TUNDUMA_RETURN")),
        )
        .await;
    assert_eq!(response.status().as_u16(), 201);

    let record = app.record(&record_id).await;
    assert_eq!(dec(&record["columns"]["tdm_return"]), Decimal::from(-120));
    assert_eq!(dec(&record["balance"]), Decimal::from(1880));
}

#[tokio::test]
async fn manual_cancel_reverts_litres_and_rejects_a_second_cancel() {
    let app = TestApp::spawn().await;
    app.seed_station("Station X").await;
    let record_id = app.seed_journey(TRUCK, "DO-100", 2000).await;
    let created: Value = app
        .post("/lpos", &station_lpo("LPO-1", "Station X", TRUCK, "DO-100", 300))
        .await
        .json()
        .await
        .unwrap();
    let lpo_id = created["lpo"]["id"].as_str().unwrap().to_string();

    let cancelled = app
        .post_as(&format!("/lpos/{}/cancel", lpo_id), &json!({}), "supervisor")
        .await;
    assert_eq!(cancelled.status().as_u16(), 200);
    let cancelled: Value = cancelled.json().await.unwrap();
    assert_eq!(cancelled["status"], "cancelled");
    assert_eq!(cancelled["cancelled_by"], "supervisor");

    let record = app.record(&record_id).await;
    assert_eq!(dec(&record["columns"]["mbeya_going"]), Decimal::ZERO);
    assert_eq!(dec(&record["balance"]), Decimal::from(2000));

    let again = app
        .post(&format!("/lpos/{}/cancel", lpo_id), &json!({}))
        .await;
    assert_eq!(again.status().as_u16(), 409);
}

#[tokio::test]
async fn status_moves_forward_only() {
    let app = TestApp::spawn().await;
    app.seed_station("Station X").await;
    app.seed_journey(TRUCK, "DO-100", 2000).await;
    let created: Value = app
        .post("/lpos", &station_lpo("LPO-1", "Station X", TRUCK, "DO-100", 300))
        .await
        .json()
        .await
        .unwrap();
    let lpo_id = created["lpo"]["id"].as_str().unwrap().to_string();

    let sent = app
        .post(&format!("/lpos/{}/status", lpo_id), &json!({ "status": "sent" }))
        .await;
    assert_eq!(sent.status().as_u16(), 200);
    let sent: Value = sent.json().await.unwrap();
    assert_eq!(sent["status"], "sent");
    assert_eq!(sent["approved_by"], common::TEST_USER_ID);

    let completed = app
        .post(
            &format!("/lpos/{}/status", lpo_id),
            &json!({ "status": "completed" }),
        )
        .await;
    assert_eq!(completed.status().as_u16(), 200);

    let backwards = app
        .post(&format!("/lpos/{}/status", lpo_id), &json!({ "status": "sent" }))
        .await;
    assert_eq!(backwards.status().as_u16(), 409);
}

#[tokio::test]
async fn deleted_lpo_is_hidden_and_its_litres_reverted() {
    let app = TestApp::spawn().await;
    app.seed_station("Station X").await;
    let record_id = app.seed_journey(TRUCK, "DO-100", 2000).await;
    let created: Value = app
        .post("/lpos", &station_lpo("LPO-1", "Station X", TRUCK, "DO-100", 300))
        .await
        .json()
        .await
        .unwrap();
    let lpo_id = created["lpo"]["id"].as_str().unwrap().to_string();

    let deleted = app.delete(&format!("/lpos/{}", lpo_id)).await;
    assert_eq!(deleted.status().as_u16(), 204);

    assert_eq!(app.get(&format!("/lpos/{}", lpo_id)).await.status().as_u16(), 404);
    let visible: Value = app.get("/lpos").await.json().await.unwrap();
    assert!(visible.as_array().unwrap().is_empty());
    let all: Value = app
        .get("/lpos?include_deleted=true")
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(all.as_array().unwrap().len(), 1);

    let record = app.record(&record_id).await;
    assert_eq!(dec(&record["balance"]), Decimal::from(2000));
}

#[tokio::test]
async fn export_strikes_through_cancelled_rows() {
    let app = TestApp::spawn().await;
    app.seed_station("Station X").await;
    app.seed_journey(TRUCK, "DO-100", 2000).await;
    app.post("/lpos", &station_lpo("LPO-1", "Station X", TRUCK, "DO-100", 300))
        .await;
    app.post(
        "/lpos",
        &cash_lpo("LPO-2", TRUCK, "DO-100", 250, fixed_point("going", "MBEYA_GOING")),
    )
    .await;

    let rows: Value = app.get("/lpos/export").await.json().await.unwrap();
    let rows = rows.as_array().unwrap();
    assert_eq!(rows.len(), 2);
    let stale = rows.iter().find(|r| r["lpo_no"] == "LPO-1").unwrap();
    let cash = rows.iter().find(|r| r["lpo_no"] == "LPO-2").unwrap();
    assert_eq!(stale["struck_through"], true);
    assert_eq!(cash["struck_through"], false);
    assert_eq!(cash["checkpoint"], "MBEYA_GOING");
}

#[tokio::test]
async fn station_lpo_needs_a_known_station() {
    let app = TestApp::spawn().await;
    app.seed_journey(TRUCK, "DO-100", 2000).await;

    let response = app
        .post("/lpos", &station_lpo("LPO-1", "Nowhere", TRUCK, "DO-100", 300))
        .await;

    assert_eq!(response.status().as_u16(), 404);
}
