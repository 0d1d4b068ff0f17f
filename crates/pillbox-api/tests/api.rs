//! Router tests against an in-memory SQLite store.

use std::sync::Arc;

use axum::{
  Router,
  body::Body,
  http::{Method, Request, StatusCode},
};
use pillbox_core::{
  schedule::{DaySlot, NewScheduleItem, WeekBucket},
  store::DoseStore,
  supplement::NewSupplement,
  tracker::Tracker,
};
use pillbox_store_sqlite::SqliteStore;
use serde_json::{Value, json};
use tower::ServiceExt as _;

async fn app() -> Router {
  let store = SqliteStore::open_in_memory().await.unwrap();

  let creatine = store
    .add_supplement(NewSupplement { name: "Creatine".into(), default_unit: Some("g".into()) })
    .await
    .unwrap();
  let zinc = store
    .add_supplement(NewSupplement { name: "Zinc".into(), default_unit: Some("mg".into()) })
    .await
    .unwrap();

  for (slot, timing, id, dosage) in [
    (DaySlot::Morning, "with_meal", creatine.supplement_id, 5.0),
    (DaySlot::Evening, "with_meal", zinc.supplement_id, 15.0),
  ] {
    store
      .add_schedule_item(NewScheduleItem {
        week: WeekBucket::One,
        day_slot: slot,
        timing: timing.into(),
        supplement_id: id,
        dosage,
        notes: None,
      })
      .await
      .unwrap();
  }

  pillbox_api::api_router(Tracker::new(Arc::new(store)))
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
  let mut req = Request::builder().method(method).uri(uri);
  let body = match body {
    Some(v) => {
      req = req.header("content-type", "application/json");
      Body::from(v.to_string())
    }
    None => Body::empty(),
  };
  let res = app.clone().oneshot(req.body(body).unwrap()).await.unwrap();
  let status = res.status();
  let bytes = axum::body::to_bytes(res.into_body(), 1024 * 1024).await.unwrap();
  let value = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
  (status, value)
}

#[tokio::test]
async fn day_view_materializes_and_reports_progress() {
  let app = app().await;

  let (status, day) = send(&app, Method::GET, "/days/2025-04-28", None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(day["week"], 1);
  assert_eq!(day["total"], 2);
  assert_eq!(day["completed"], 0);
  assert_eq!(day["entries"][0]["day_slot"], "morning");
  assert_eq!(day["entries"][0]["supplement"]["name"], "Creatine");
  assert_eq!(day["entries"][1]["unit_scheduled"], "mg");
}

#[tokio::test]
async fn toggle_then_overview() {
  let app = app().await;
  let (_, day) = send(&app, Method::GET, "/days/2025-04-28", None).await;
  let id = day["entries"][0]["entry_id"].as_str().unwrap().to_owned();

  let (status, entry) = send(
    &app,
    Method::PUT,
    &format!("/history/{id}/taken"),
    Some(json!({ "taken": true })),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(entry["taken"], true);
  assert!(entry["taken_at"].is_string());

  let (_, overview) = send(&app, Method::GET, "/overview", None).await;
  assert_eq!(overview, json!({ "2025-04-28": { "completion_percentage": 50 } }));

  let (_, filtered) = send(&app, Method::GET, "/overview?from=2025-05-01", None).await;
  assert_eq!(filtered, json!({}));

  let (status, entry) = send(
    &app,
    Method::PUT,
    &format!("/history/{id}/taken"),
    Some(json!({ "taken": false })),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert!(entry["taken_at"].is_null());
}

#[tokio::test]
async fn reset_returns_untaken_day() {
  let app = app().await;
  let (_, day) = send(&app, Method::GET, "/days/2025-04-28", None).await;
  let id = day["entries"][1]["entry_id"].as_str().unwrap().to_owned();
  send(&app, Method::PUT, &format!("/history/{id}/taken"), Some(json!({ "taken": true }))).await;

  let (status, reset) = send(&app, Method::POST, "/days/2025-04-28/reset", None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(reset["total"], 2);
  assert_eq!(reset["completed"], 0);
}

#[tokio::test]
async fn unscheduled_week_is_an_empty_day() {
  let app = app().await;
  let (status, day) = send(&app, Method::GET, "/days/2025-05-20", None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(day["week"], 3);
  assert_eq!(day["total"], 0);
  assert_eq!(day["completion_percentage"], 0);

  let (_, overview) = send(&app, Method::GET, "/overview", None).await;
  assert_eq!(overview, json!({}));
}

#[tokio::test]
async fn schedule_endpoint_does_not_materialize() {
  let app = app().await;
  let (status, sched) = send(&app, Method::GET, "/days/2025-04-30/schedule", None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(sched["week"], 1);
  assert_eq!(sched["doses"].as_array().unwrap().len(), 2);

  let (_, overview) = send(&app, Method::GET, "/overview", None).await;
  assert_eq!(overview, json!({}));
}

#[tokio::test]
async fn bad_inputs_are_rejected() {
  let app = app().await;

  let (status, body) = send(&app, Method::GET, "/days/not-a-date", None).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert!(body["error"].is_string());

  let (status, _) = send(
    &app,
    Method::PUT,
    "/history/1f0e6f0e-8a5b-4c1e-9a3b-2c7d4e5f6a7b/taken",
    Some(json!({ "taken": true })),
  )
  .await;
  assert_eq!(status, StatusCode::NOT_FOUND);

  let (status, _) = send(&app, Method::GET, "/overview?from=2025-05-02&to=2025-05-01", None).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn supplements_are_listed() {
  let app = app().await;
  let (status, list) = send(&app, Method::GET, "/supplements", None).await;
  assert_eq!(status, StatusCode::OK);
  let names: Vec<&str> = list
    .as_array()
    .unwrap()
    .iter()
    .map(|s| s["name"].as_str().unwrap())
    .collect();
  assert_eq!(names, ["Creatine", "Zinc"]);
}
