mod common;

use common::{dec, fixed_point, TestApp, TRUCK};
use rust_decimal::Decimal;
use serde_json::{json, Value};

fn driver_account_lpo(lpo_no: &str, litres: i64, point: Option<Value>) -> Value {
    json!({
        "lpo_no": lpo_no,
        "station": "Lake Oil Tunduma",
        "date": "2025-06-05",
        "truck_no": TRUCK,
        "litres": litres,
        "rate": 3300,
        "payment_mode": "DRIVER_ACCOUNT",
        "driver_name": "Juma Hassan",
        "cancellation_point": point
    })
}

fn direct_entry(lpo_no: &str, litres: i64, point: Option<Value>) -> Value {
    json!({
        "date": "2025-06-05",
        "truck_no": TRUCK,
        "driver_name": "Juma Hassan",
        "lpo_no": lpo_no,
        "station": "Lake Oil Tunduma",
        "litres": litres,
        "rate": 3300,
        "cancellation_point": point
    })
}

#[tokio::test]
async fn driver_account_lpo_stays_off_the_ledger_without_a_point() {
    let app = TestApp::spawn().await;
    let record_id = app.seed_journey(TRUCK, "DO-100", 2000).await;

    let response = app.post("/lpos", &driver_account_lpo("DA-1", 80, None)).await;
    assert_eq!(response.status().as_u16(), 201);
    let body: Value = response.json().await.unwrap();

    assert!(body["lpo"]["column"].is_null());
    assert_eq!(body["lpo"]["do_no"], "NIL");
    assert!(body["fuel_records"].as_array().unwrap().is_empty());
    let account = &body["driver_account"];
    assert_eq!(account["status"], "pending");
    assert_eq!(account["lpo_id"], body["lpo"]["id"]);
    assert_eq!(body["lpo"]["driver_account_id"], account["id"]);
    assert_eq!(dec(&account["amount"]), Decimal::from(264_000));

    let record = app.record(&record_id).await;
    assert_eq!(dec(&record["balance"]), Decimal::from(2000));

    let rows: Value = app.get("/lpos/export").await.json().await.unwrap();
    assert_eq!(rows[0]["do_no"], "NIL");
    assert_eq!(rows[0]["destination"], "NIL");
}

#[tokio::test]
async fn driver_account_lpo_with_point_books_once_and_never_cancels() {
    let app = TestApp::spawn().await;
    app.seed_station("Station X").await;
    let record_id = app.seed_journey(TRUCK, "DO-100", 2000).await;
    app.post(
        "/lpos",
        &common::station_lpo("LPO-1", "Station X", TRUCK, "DO-100", 300),
    )
    .await;

    let response = app
        .post(
            "/lpos",
            &driver_account_lpo("DA-2", 90, Some(fixed_point("going", "MBEYA_GOING"))),
        )
        .await;
    assert_eq!(response.status().as_u16(), 201);
    let body: Value = response.json().await.unwrap();
    assert!(body["cancelled"].as_array().unwrap().is_empty());
    assert!(body["lpo"]["column"].is_null());
    assert_eq!(body["driver_account"]["ledger_column"], "mbeya_going");

    let record = app.record(&record_id).await;
    assert_eq!(dec(&record["columns"]["mbeya_going"]), Decimal::from(-390));
    assert_eq!(dec(&record["balance"]), Decimal::from(1610));
}

#[tokio::test]
async fn settling_with_a_point_books_the_record() {
    let app = TestApp::spawn().await;
    let record_id = app.seed_journey(TRUCK, "DO-100", 2000).await;
    let created: Value = app
        .post("/driver-accounts", &direct_entry("DA-3", 100, None))
        .await
        .json()
        .await
        .unwrap();
    let entry_id = created["driver_account"]["id"].as_str().unwrap().to_string();
    assert!(created["fuel_record"].is_null());

    let settled = app
        .post(
            &format!("/driver-accounts/{}/settle", entry_id),
            &json!({ "cancellation_point": fixed_point("going", "TUNDUMA_GOING") }),
        )
        .await;
    assert_eq!(settled.status().as_u16(), 200);
    let settled: Value = settled.json().await.unwrap();
    assert_eq!(settled["driver_account"]["status"], "settled");
    assert_eq!(settled["driver_account"]["settled_by"], common::TEST_USER_ID);
    assert_eq!(settled["driver_account"]["ledger_column"], "tdm_going");
    assert_eq!(
        dec(&settled["fuel_record"]["columns"]["tdm_going"]),
        Decimal::from(-100)
    );

    let record = app.record(&record_id).await;
    assert_eq!(dec(&record["balance"]), Decimal::from(1900));

    let again = app
        .post(&format!("/driver-accounts/{}/settle", entry_id), &json!({}))
        .await;
    assert_eq!(again.status().as_u16(), 409);
}

#[tokio::test]
async fn dispute_closes_a_pending_entry() {
    let app = TestApp::spawn().await;
    let created: Value = app
        .post("/driver-accounts", &direct_entry("DA-4", 60, None))
        .await
        .json()
        .await
        .unwrap();
    let entry_id = created["driver_account"]["id"].as_str().unwrap().to_string();

    let disputed = app
        .post(
            &format!("/driver-accounts/{}/dispute", entry_id),
            &json!({ "reason": "Receipt does not match pump reading" }),
        )
        .await;
    assert_eq!(disputed.status().as_u16(), 200);
    let disputed: Value = disputed.json().await.unwrap();
    assert_eq!(disputed["status"], "disputed");
    assert_eq!(
        disputed["dispute_reason"],
        "Receipt does not match pump reading"
    );

    let edit = app
        .patch(
            &format!("/driver-accounts/{}", entry_id),
            &json!({ "litres": 70 }),
        )
        .await;
    assert_eq!(edit.status().as_u16(), 409);
}

#[tokio::test]
async fn editing_a_booked_entry_moves_its_litres() {
    let app = TestApp::spawn().await;
    let record_id = app.seed_journey(TRUCK, "DO-100", 2000).await;
    let created = app
        .post(
            "/driver-accounts",
            &direct_entry("DA-5", 100, Some(fixed_point("going", "TUNDUMA_GOING"))),
        )
        .await;
    assert_eq!(created.status().as_u16(), 201);
    let created: Value = created.json().await.unwrap();
    let entry_id = created["driver_account"]["id"].as_str().unwrap().to_string();
    assert_eq!(
        dec(&created["fuel_record"]["columns"]["tdm_going"]),
        Decimal::from(-100)
    );

    let edited = app
        .patch(
            &format!("/driver-accounts/{}", entry_id),
            &json!({ "litres": 150 }),
        )
        .await;
    assert_eq!(edited.status().as_u16(), 200);
    let edited: Value = edited.json().await.unwrap();
    assert_eq!(dec(&edited["amount"]), Decimal::from(495_000));

    let record = app.record(&record_id).await;
    assert_eq!(dec(&record["columns"]["tdm_going"]), Decimal::from(-150));
    assert_eq!(dec(&record["balance"]), Decimal::from(1850));
}

#[tokio::test]
async fn deleting_an_entry_reverts_its_booking_and_cancels_its_lpo() {
    let app = TestApp::spawn().await;
    let record_id = app.seed_journey(TRUCK, "DO-100", 2000).await;
    let created: Value = app
        .post(
            "/lpos",
            &driver_account_lpo("DA-6", 75, Some(fixed_point("going", "TUNDUMA_GOING"))),
        )
        .await
        .json()
        .await
        .unwrap();
    let lpo_id = created["lpo"]["id"].as_str().unwrap().to_string();
    let entry_id = created["driver_account"]["id"]
        .as_str()
        .unwrap()
        .to_string();

    let deleted = app.delete(&format!("/driver-accounts/{}", entry_id)).await;
    assert_eq!(deleted.status().as_u16(), 204);

    let record = app.record(&record_id).await;
    assert_eq!(dec(&record["columns"]["tdm_going"]), Decimal::ZERO);
    assert_eq!(dec(&record["balance"]), Decimal::from(2000));

    let lpo: Value = app
        .get(&format!("/lpos/{}", lpo_id))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(lpo["status"], "cancelled");
    assert_eq!(
        app.get(&format!("/driver-accounts/{}", entry_id))
            .await
            .status()
            .as_u16(),
        404
    );
}

#[tokio::test]
async fn monthly_listing_and_export() {
    let app = TestApp::spawn().await;
    app.post("/driver-accounts", &direct_entry("DA-7", 40, None))
        .await;
    let mut later = direct_entry("DA-8", 50, None);
    later["date"] = json!("2025-07-01");
    app.post("/driver-accounts", &later).await;

    let june: Value = app
        .get("/driver-accounts?month=6&year=2025")
        .await
        .json()
        .await
        .unwrap();
    let june = june.as_array().unwrap();
    assert_eq!(june.len(), 1);
    assert_eq!(june[0]["lpo_no"], "DA-7");

    let rows: Value = app
        .get("/driver-accounts/export?month=7&year=2025")
        .await
        .json()
        .await
        .unwrap();
    let rows = rows.as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["do_no"], "NIL");
    assert_eq!(rows[0]["destination"], "NIL");

    let bad_month = app.get("/driver-accounts?month=13").await;
    assert_eq!(bad_month.status().as_u16(), 422);
}

#[tokio::test]
async fn booking_without_a_journey_is_not_found() {
    let app = TestApp::spawn().await;

    let response = app
        .post(
            "/driver-accounts",
            &direct_entry("DA-9", 100, Some(fixed_point("going", "TUNDUMA_GOING"))),
        )
        .await;

    assert_eq!(response.status().as_u16(), 404);
    let listed: Value = app.get("/driver-accounts").await.json().await.unwrap();
    assert!(listed.as_array().unwrap().is_empty());
}
