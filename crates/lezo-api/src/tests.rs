//! Router tests driven through `tower::ServiceExt::oneshot`.

use std::sync::Arc;

use axum::{
  Router,
  body::Body,
  http::{HeaderMap, Request, StatusCode, header},
};
use lezo_core::{
  Region,
  citizen::NewCitizen,
  memory::InMemoryRegistry,
  store::{CitizenQuery, CitizenRepository},
};
use serde_json::{Value, json};
use tower::ServiceExt as _;
use uuid::Uuid;

use crate::{api_router, role::ROLE_HEADER};

struct Reply {
  status:  StatusCode,
  headers: HeaderMap,
  body:    Value,
}

async fn send(
  app: &Router,
  method: &str,
  uri: &str,
  headers: Vec<(&str, &str)>,
  body: Option<String>,
) -> Reply {
  let mut builder = Request::builder().method(method).uri(uri);
  for (k, v) in headers {
    builder = builder.header(k, v);
  }
  if body.is_some() {
    builder = builder.header(header::CONTENT_TYPE, "application/json");
  }
  let req = builder.body(body.map(Body::from).unwrap_or_else(Body::empty)).unwrap();

  let resp = app.clone().oneshot(req).await.unwrap();
  let status = resp.status();
  let headers = resp.headers().clone();
  let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
  let body = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
  Reply { status, headers, body }
}

fn as_role(role: &str) -> Vec<(&str, &str)> { vec![(ROLE_HEADER, role)] }

fn setup() -> (Arc<InMemoryRegistry>, Router) {
  let store = Arc::new(InMemoryRegistry::new());
  let app = api_router(store.clone());
  (store, app)
}

async fn seed(store: &InMemoryRegistry, last: &str, first: &str) -> Uuid {
  store
    .add_citizen(NewCitizen::new(last, first, "0042A", Region::Poblacion))
    .await
    .unwrap()
    .citizen_id
}

fn id_of(reply: &Reply) -> String { reply.body["citizen_id"].as_str().unwrap().to_owned() }

fn twelve_sheets(rows: Value) -> String {
  let mut sheets = serde_json::Map::new();
  for region in Region::all() {
    sheets.insert(region.to_string(), json!([]));
  }
  sheets.insert("Poblacion".into(), rows);
  Value::Object(sheets).to_string()
}

// ─── Roles ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn viewer_is_the_default_and_may_list() {
  let (store, app) = setup();
  seed(&store, "Doe", "John").await;

  let r = send(&app, "GET", "/citizens", vec![], None).await;
  assert_eq!(r.status, StatusCode::OK);
  assert_eq!(r.body.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn unparseable_role_is_bad_request() {
  let (_, app) = setup();
  let r = send(&app, "GET", "/citizens", as_role("mayor"), None).await;
  assert_eq!(r.status, StatusCode::BAD_REQUEST);
  assert!(r.body["error"].as_str().unwrap().contains("mayor"));
}

#[tokio::test]
async fn viewer_may_not_create() {
  let (_, app) = setup();
  let body = json!({"last_name": "Doe", "first_name": "John", "precinct": "1", "region": "Mina"});
  let r = send(&app, "POST", "/citizens", vec![], Some(body.to_string())).await;
  assert_eq!(r.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn citizen_may_view_only_themselves() {
  let (store, app) = setup();
  let me = seed(&store, "Doe", "John").await;
  let other = seed(&store, "Doe", "Jane").await;
  let role = format!("citizen:{me}");

  let r = send(&app, "GET", &format!("/citizens/{me}"), as_role(&role), None).await;
  assert_eq!(r.status, StatusCode::OK);
  let r = send(&app, "GET", &format!("/citizens/{me}/kin"), as_role(&role), None).await;
  assert_eq!(r.status, StatusCode::OK);

  let r = send(&app, "GET", &format!("/citizens/{other}"), as_role(&role), None).await;
  assert_eq!(r.status, StatusCode::FORBIDDEN);
  let r = send(&app, "GET", "/citizens", as_role(&role), None).await;
  assert_eq!(r.status, StatusCode::FORBIDDEN);
}

// ─── Citizens ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn create_then_duplicate_conflicts() {
  let (_, app) = setup();
  let body = json!({
    "last_name": "Dela Cruz", "first_name": "Juan", "precinct": "0101",
    "region": "Sta. Cruz", "birthday": "1970-07-04", "sex": "M"
  })
  .to_string();

  let r = send(&app, "POST", "/citizens", as_role("staff"), Some(body.clone())).await;
  assert_eq!(r.status, StatusCode::CREATED);
  assert!(r.headers.contains_key(header::ETAG));
  assert_eq!(r.body["region"], "Sta. Cruz");
  assert_eq!(r.body["status"], "active");

  let r = send(&app, "POST", "/citizens", as_role("staff"), Some(body)).await;
  assert_eq!(r.status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn manual_entry_is_trimmed_like_an_import() {
  let (store, app) = setup();
  seed(&store, "Doe", "John").await;

  let body = json!({
    "last_name": " Doe", "first_name": "John  ", "precinct": " 0042A ",
    "region": "Poblacion", "middle_name": "   "
  });
  let r = send(&app, "POST", "/citizens", as_role("staff"), Some(body.to_string())).await;
  assert_eq!(r.status, StatusCode::CONFLICT);

  let body = json!({
    "last_name": " Roe ", "first_name": "Rita", "precinct": " 7 ",
    "region": "Poblacion", "middle_name": "   "
  });
  let r = send(&app, "POST", "/citizens", as_role("staff"), Some(body.to_string())).await;
  assert_eq!(r.status, StatusCode::CREATED);
  assert_eq!(r.body["last_name"], "Roe");
  assert_eq!(r.body["precinct"], "7");
  assert!(r.body["middle_name"].is_null());
}

#[tokio::test]
async fn blank_precinct_is_rejected() {
  let (store, app) = setup();
  let body = json!({"last_name": "Doe", "first_name": "John", "precinct": "  ", "region": "Mina"});
  let r = send(&app, "POST", "/citizens", as_role("staff"), Some(body.to_string())).await;
  assert_eq!(r.status, StatusCode::BAD_REQUEST);
  assert!(r.body["error"].as_str().unwrap().contains("precinct"));
  assert!(store.list_citizens(&CitizenQuery::default()).await.unwrap().is_empty());
}

#[tokio::test]
async fn list_filters_by_region_and_status() {
  let (store, app) = setup();
  seed(&store, "Doe", "John").await;
  store.add_citizen(NewCitizen::new("Roe", "Rita", "1", Region::Mina)).await.unwrap();

  let r = send(&app, "GET", "/citizens?region=Mina", vec![], None).await;
  assert_eq!(r.body.as_array().unwrap().len(), 1);
  assert_eq!(r.body[0]["first_name"], "Rita");

  let r = send(&app, "GET", "/citizens?status=deceased", vec![], None).await;
  assert!(r.body.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn get_unknown_citizen_is_not_found() {
  let (_, app) = setup();
  let r = send(&app, "GET", &format!("/citizens/{}", Uuid::new_v4()), vec![], None).await;
  assert_eq!(r.status, StatusCode::NOT_FOUND);
  assert!(r.body["error"].is_string());
}

#[tokio::test]
async fn status_change_honours_if_match() {
  let (store, app) = setup();
  let id = seed(&store, "Doe", "John").await;
  let uri = format!("/citizens/{id}/status");
  let body = json!({"status": "dead"}).to_string();

  let r = send(&app, "GET", &format!("/citizens/{id}"), vec![], None).await;
  let etag = r.headers[header::ETAG].to_str().unwrap().to_owned();

  let stale = vec![(ROLE_HEADER, "staff"), ("if-match", "\"not-the-tag\"")];
  let r = send(&app, "POST", &uri, stale, Some(body.clone())).await;
  assert_eq!(r.status, StatusCode::PRECONDITION_FAILED);

  let fresh = vec![(ROLE_HEADER, "staff"), ("if-match", etag.as_str())];
  let r = send(&app, "POST", &uri, fresh, Some(body.clone())).await;
  assert_eq!(r.status, StatusCode::OK);
  assert_eq!(r.body["status"], "deceased");
  assert_ne!(r.headers[header::ETAG].to_str().unwrap(), etag);

  // The old tag no longer matches.
  let again = vec![(ROLE_HEADER, "staff"), ("if-match", etag.as_str())];
  let r = send(&app, "POST", &uri, again, Some(body)).await;
  assert_eq!(r.status, StatusCode::PRECONDITION_FAILED);
}

#[tokio::test]
async fn status_change_of_unknown_citizen_is_not_found() {
  let (_, app) = setup();
  let uri = format!("/citizens/{}/status", Uuid::new_v4());
  let body = json!({"status": "moved"}).to_string();
  let r = send(&app, "POST", &uri, as_role("admin"), Some(body)).await;
  assert_eq!(r.status, StatusCode::NOT_FOUND);
}

// ─── Relationships & kin ─────────────────────────────────────────────────────

#[tokio::test]
async fn relationship_errors_map_to_status_codes() {
  let (store, app) = setup();
  let a = seed(&store, "Doe", "John").await;
  let b = seed(&store, "Doe", "Jane").await;
  let post = |source: Uuid, target: Uuid| {
    json!({"source_id": source, "target_id": target, "kind": "father"}).to_string()
  };

  let r = send(&app, "POST", "/relationships", as_role("staff"), Some(post(a, b))).await;
  assert_eq!(r.status, StatusCode::CREATED);
  assert_eq!(r.body["kind"], "father");

  let r = send(&app, "POST", "/relationships", as_role("staff"), Some(post(a, b))).await;
  assert_eq!(r.status, StatusCode::CONFLICT);

  let r = send(&app, "POST", "/relationships", as_role("staff"), Some(post(a, a))).await;
  assert_eq!(r.status, StatusCode::BAD_REQUEST);

  let r = send(&app, "POST", "/relationships", as_role("staff"), Some(post(a, Uuid::new_v4()))).await;
  assert_eq!(r.status, StatusCode::NOT_FOUND);

  let r = send(&app, "POST", "/relationships", as_role("viewer"), Some(post(b, a))).await;
  assert_eq!(r.status, StatusCode::FORBIDDEN);

  let r = send(&app, "GET", &format!("/citizens/{b}/relationships"), vec![], None).await;
  assert_eq!(r.body.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn kin_endpoint_infers_uncle_and_nephew() {
  let (store, app) = setup();
  let a = seed(&store, "Doe", "Adam").await;
  let b = seed(&store, "Doe", "Ben").await;
  let c = seed(&store, "Doe", "Carl").await;
  let d = seed(&store, "Doe", "Dina").await;

  for (source, kind, target) in [(a, "father", b), (c, "brother", a), (d, "sister", a)] {
    let body = json!({"source_id": source, "target_id": target, "kind": kind}).to_string();
    let r = send(&app, "POST", "/relationships", as_role("staff"), Some(body)).await;
    assert_eq!(r.status, StatusCode::CREATED);
  }

  let r = send(&app, "GET", &format!("/citizens/{b}/kin"), vec![], None).await;
  assert_eq!(r.status, StatusCode::OK);
  let kin = r.body.as_array().unwrap();
  assert_eq!(kin.len(), 2);
  assert!(kin.iter().any(|k| k["label"] == "uncle" && k["citizen"]["first_name"] == "Carl"));
  assert!(kin.iter().any(|k| k["label"] == "aunt" && k["citizen"]["first_name"] == "Dina"));

  let r = send(&app, "GET", &format!("/citizens/{b}/kin?brothers_only=true"), vec![], None).await;
  let kin = r.body.as_array().unwrap();
  assert_eq!(kin.len(), 1);
  assert_eq!(kin[0]["citizen"]["first_name"], "Carl");

  let r = send(&app, "GET", &format!("/citizens/{c}/kin"), vec![], None).await;
  let kin = r.body.as_array().unwrap();
  assert_eq!(kin.len(), 1);
  assert_eq!(kin[0]["label"], "nephew");
  assert_eq!(kin[0]["citizen"]["first_name"], "Ben");
}

// ─── Imports ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn import_requires_admin() {
  let (_, app) = setup();
  let r = send(&app, "POST", "/imports", as_role("staff"), Some(twelve_sheets(json!([])))).await;
  assert_eq!(r.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn import_reports_counts_and_row_errors() {
  let (store, app) = setup();
  let rows = json!([
    {"LAST NAME": "Doe", "FIRST NAME": "John", "PRECINCT": "1", "BIRTHDAY": "1980-01-01"},
    {"LAST NAME": "Doe", "FIRST NAME": "John", "PRECINCT": "1", "BIRTHDAY": "1980-01-01"},
    {"FIRST NAME": "Nameless", "PRECINCT": "1"}
  ]);

  let r = send(&app, "POST", "/imports?mode=create", as_role("admin"), Some(twelve_sheets(rows))).await;
  assert_eq!(r.status, StatusCode::OK);
  assert_eq!(r.body["mode"], "create");
  assert_eq!(r.body["regions"]["Poblacion"]["created"], 1);
  assert_eq!(r.body["regions"]["Poblacion"]["skipped"], 1);
  assert_eq!(r.body["errors"][0]["row_index"], 2);
  assert_eq!(r.body["errors"][0]["reason"]["kind"], "missing_field");

  let all = store.list_citizens(&CitizenQuery::default()).await.unwrap();
  assert_eq!(all.len(), 1);
}

#[tokio::test]
async fn structurally_invalid_batch_is_unprocessable() {
  let (store, app) = setup();
  let body = json!({"Poblacion": [{"LAST NAME": "Doe", "FIRST NAME": "John", "PRECINCT": "1"}]});

  let r = send(&app, "POST", "/imports", as_role("admin"), Some(body.to_string())).await;
  assert_eq!(r.status, StatusCode::UNPROCESSABLE_ENTITY);
  assert!(store.list_citizens(&CitizenQuery::default()).await.unwrap().is_empty());

  let r = send(&app, "POST", "/imports", as_role("admin"), Some("[not json".into())).await;
  assert_eq!(r.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn update_mode_via_api() {
  let (store, app) = setup();
  let mut input = NewCitizen::new("Diaz", "Dan", "1", Region::Poblacion);
  input.tin = Some("111".into());
  let dan = store.add_citizen(input).await.unwrap();

  let rows = json!([{"TIN": "111", "STATUS": "Moved"}]);
  let r = send(&app, "POST", "/imports?mode=update", as_role("admin"), Some(twelve_sheets(rows))).await;
  assert_eq!(r.status, StatusCode::OK);
  assert_eq!(r.body["regions"]["Poblacion"]["updated"], 1);

  let r = send(&app, "GET", &format!("/citizens/{}", dan.citizen_id), vec![], None).await;
  assert_eq!(r.body["status"], "moved");
}

// ─── SQLite backend ──────────────────────────────────────────────────────────

#[tokio::test]
async fn router_works_over_sqlite() {
  let store = lezo_store_sqlite::SqliteStore::open_in_memory().await.unwrap();
  let app = api_router(Arc::new(store));

  let body = json!({"last_name": "Lim", "first_name": "Leo", "precinct": "7", "region": "Ibao"});
  let r = send(&app, "POST", "/citizens", as_role("admin"), Some(body.to_string())).await;
  assert_eq!(r.status, StatusCode::CREATED);
  let id = id_of(&r);

  let r = send(&app, "GET", &format!("/citizens/{id}"), vec![], None).await;
  assert_eq!(r.status, StatusCode::OK);
  assert_eq!(r.body["first_name"], "Leo");

  let r = send(&app, "POST", "/citizens", as_role("admin"), Some(body.to_string())).await;
  assert_eq!(r.status, StatusCode::CONFLICT);
}
