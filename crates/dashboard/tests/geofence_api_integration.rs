//! Integration tests for the REST geofence and association stores.
//!
//! Each test runs an in-process fake of the persistence API on an ephemeral
//! port and drives it through `RestGeofenceStore` and `RestAssociationStore`.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use domain::models::{
    AssignmentState, GeoPoint, GeofenceId, GeofenceUpdate, IdentityContext, Shape,
    VehicleGeofence, VehicleId, ZoneStatus,
};
use domain::services::serializer::{CircleWire, GeofenceRecordWire, GeofenceWire, PolygonWire};
use domain::services::{AssignmentService, AuthoringSession, GeofenceStore, SaveOutcome};
use domain::GeofenceError;
use fleet_dashboard::config::ApiConfig;
use fleet_dashboard::error::ApiClientError;
use fleet_dashboard::services::{
    ListAssociationsResponse, ListGeofencesResponse, PersistenceClient, RestAssociationStore,
    RestGeofenceStore,
};
use serde_json::json;
use uuid::Uuid;

const TOKEN: &str = "test-token";

#[derive(Default)]
struct FakeApi {
    next_id: i64,
    records: Vec<GeofenceRecordWire>,
    /// Raw JSON bodies received on creation endpoints.
    bodies: Vec<serde_json::Value>,
    associations: Vec<VehicleGeofence>,
}

type SharedApi = Arc<Mutex<FakeApi>>;

fn error_response(status: StatusCode, code: &str, message: &str) -> Response {
    (status, Json(json!({ "error": code, "message": message }))).into_response()
}

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(|v| v == format!("Bearer {}", TOKEN))
        .unwrap_or(false)
}

fn insert(
    api: &SharedApi,
    manager_id: i64,
    shape: GeofenceWire,
    body: serde_json::Value,
) -> Response {
    let mut api = api.lock().unwrap();
    api.next_id += 1;
    let record = GeofenceRecordWire {
        geofence_id: api.next_id,
        manager_id,
        shape,
    };
    api.records.push(record.clone());
    api.bodies.push(body);
    (StatusCode::CREATED, Json(record)).into_response()
}

async fn create_circle(
    State(api): State<SharedApi>,
    Path(manager_id): Path<i64>,
    headers: HeaderMap,
    Json(body): Json<serde_json::Value>,
) -> Response {
    if !authorized(&headers) {
        return error_response(StatusCode::UNAUTHORIZED, "unauthorized", "Missing token");
    }
    let Ok(wire) = serde_json::from_value::<CircleWire>(body.clone()) else {
        return error_response(StatusCode::BAD_REQUEST, "validation_error", "Bad circle");
    };
    insert(&api, manager_id, GeofenceWire::Circle(wire), body)
}

async fn create_polygon(
    State(api): State<SharedApi>,
    Path(manager_id): Path<i64>,
    headers: HeaderMap,
    Json(body): Json<serde_json::Value>,
) -> Response {
    if !authorized(&headers) {
        return error_response(StatusCode::UNAUTHORIZED, "unauthorized", "Missing token");
    }
    let Ok(wire) = serde_json::from_value::<PolygonWire>(body.clone()) else {
        return error_response(StatusCode::BAD_REQUEST, "validation_error", "Bad polygon");
    };
    insert(&api, manager_id, GeofenceWire::Polygon(wire), body)
}

async fn list_for_manager(
    State(api): State<SharedApi>,
    Path(manager_id): Path<i64>,
) -> Json<ListGeofencesResponse> {
    let api = api.lock().unwrap();
    let geofences: Vec<GeofenceRecordWire> = api
        .records
        .iter()
        .filter(|r| r.manager_id == manager_id)
        .cloned()
        .collect();
    let total = geofences.len();
    Json(ListGeofencesResponse { geofences, total })
}

async fn update_geofence(
    State(api): State<SharedApi>,
    Path(geofence_id): Path<i64>,
    Json(update): Json<GeofenceUpdate>,
) -> Response {
    let mut api = api.lock().unwrap();
    let Some(record) = api.records.iter_mut().find(|r| r.geofence_id == geofence_id) else {
        return error_response(StatusCode::NOT_FOUND, "not_found", "Geofence not found");
    };

    let (name, status) = match &mut record.shape {
        GeofenceWire::Circle(c) => (&mut c.geofence_name, &mut c.geofence_status),
        GeofenceWire::Polygon(p) => (&mut p.geofence_name, &mut p.geofence_status),
    };
    if let Some(new_name) = update.geofence_name {
        *name = new_name;
    }
    if let Some(new_status) = update.geofence_status {
        *status = new_status;
    }

    (StatusCode::OK, Json(record.clone())).into_response()
}

async fn delete_geofence(State(api): State<SharedApi>, Path(geofence_id): Path<i64>) -> Response {
    let mut api = api.lock().unwrap();
    let before = api.records.len();
    api.records.retain(|r| r.geofence_id != geofence_id);
    if api.records.len() == before {
        return error_response(StatusCode::NOT_FOUND, "not_found", "Geofence not found");
    }
    StatusCode::NO_CONTENT.into_response()
}

async fn get_geofence(State(api): State<SharedApi>, Path(geofence_id): Path<i64>) -> Response {
    let api = api.lock().unwrap();
    match api.records.iter().find(|r| r.geofence_id == geofence_id) {
        Some(record) => (StatusCode::OK, Json(record.clone())).into_response(),
        None => error_response(StatusCode::NOT_FOUND, "not_found", "Geofence not found"),
    }
}

async fn create_association(
    State(api): State<SharedApi>,
    Path(vehicle_id): Path<VehicleId>,
    Json(association): Json<VehicleGeofence>,
) -> Response {
    let mut api = api.lock().unwrap();
    if association.vehicle_id != vehicle_id {
        return error_response(StatusCode::BAD_REQUEST, "validation_error", "Vehicle mismatch");
    }
    let duplicate = api
        .associations
        .iter()
        .any(|a| a.is_active() && a.links(association.vehicle_id, association.geofence_id));
    if duplicate {
        return error_response(StatusCode::CONFLICT, "conflict", "Vehicle already assigned");
    }
    api.associations.push(association.clone());
    (StatusCode::CREATED, Json(association)).into_response()
}

fn association_list(associations: Vec<VehicleGeofence>) -> Json<ListAssociationsResponse> {
    let total = associations.len();
    Json(ListAssociationsResponse {
        associations,
        total,
    })
}

async fn list_vehicle_associations(
    State(api): State<SharedApi>,
    Path(vehicle_id): Path<VehicleId>,
) -> Json<ListAssociationsResponse> {
    let api = api.lock().unwrap();
    association_list(
        api.associations
            .iter()
            .filter(|a| a.vehicle_id == vehicle_id)
            .cloned()
            .collect(),
    )
}

async fn list_geofence_associations(
    State(api): State<SharedApi>,
    Path(geofence_id): Path<GeofenceId>,
) -> Json<ListAssociationsResponse> {
    let api = api.lock().unwrap();
    association_list(
        api.associations
            .iter()
            .filter(|a| a.geofence_id == geofence_id)
            .cloned()
            .collect(),
    )
}

async fn get_association(State(api): State<SharedApi>, Path(association_id): Path<Uuid>) -> Response {
    let api = api.lock().unwrap();
    match api
        .associations
        .iter()
        .find(|a| a.association_id == association_id)
    {
        Some(association) => (StatusCode::OK, Json(association.clone())).into_response(),
        None => error_response(StatusCode::NOT_FOUND, "not_found", "Association not found"),
    }
}

async fn update_association(
    State(api): State<SharedApi>,
    Path(association_id): Path<Uuid>,
    Json(association): Json<VehicleGeofence>,
) -> Response {
    let mut api = api.lock().unwrap();
    let Some(stored) = api
        .associations
        .iter_mut()
        .find(|a| a.association_id == association_id)
    else {
        return error_response(StatusCode::NOT_FOUND, "not_found", "Association not found");
    };
    *stored = association;
    (StatusCode::OK, Json(stored.clone())).into_response()
}

async fn spawn_fake_api() -> (String, SharedApi) {
    let api: SharedApi = Arc::new(Mutex::new(FakeApi::default()));

    let app = Router::new()
        .route(
            "/api/v1/managers/:manager_id/geofences/circle",
            post(create_circle),
        )
        .route(
            "/api/v1/managers/:manager_id/geofences/polygon",
            post(create_polygon),
        )
        .route("/api/v1/managers/:manager_id/geofences", get(list_for_manager))
        .route(
            "/api/v1/geofences/:geofence_id",
            get(get_geofence)
                .put(update_geofence)
                .delete(delete_geofence),
        )
        .route(
            "/api/v1/geofences/:geofence_id/vehicles",
            get(list_geofence_associations),
        )
        .route(
            "/api/v1/vehicles/:vehicle_id/geofences",
            get(list_vehicle_associations).post(create_association),
        )
        .route(
            "/api/v1/vehicle-geofences/:association_id",
            get(get_association).put(update_association),
        )
        .with_state(api.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{}", addr), api)
}

fn store(base_url: &str, token: Option<&str>) -> RestGeofenceStore {
    RestGeofenceStore::new(&ApiConfig {
        base_url: base_url.to_string(),
        timeout_ms: 5_000,
        access_token: token.map(str::to_string),
    })
    .unwrap()
}

fn client(base_url: &str) -> PersistenceClient {
    PersistenceClient::new(&ApiConfig {
        base_url: base_url.to_string(),
        timeout_ms: 5_000,
        access_token: Some(TOKEN.to_string()),
    })
    .unwrap()
}

fn p(lat: f64, lng: f64) -> GeoPoint {
    GeoPoint::new(lat, lng)
}

#[tokio::test]
async fn test_polygon_save_posts_closed_line_string() {
    let (base_url, api) = spawn_fake_api().await;
    let store = Arc::new(store(&base_url, Some(TOKEN)));
    let identity = IdentityContext::manager(12);
    let session = AuthoringSession::new(store.clone(), identity);

    session.start_polygon().await;
    session.set_name("Depot").await.unwrap();
    session.set_status(ZoneStatus::RestrictedZone).await.unwrap();
    for point in [p(0.0, 0.0), p(0.0, 2.0), p(2.0, 2.0), p(2.0, 0.0), p(1.0, 1.0)] {
        session.record_click(point).await.unwrap();
    }

    let SaveOutcome::Saved(geofence) = session.save().await.unwrap() else {
        panic!("expected saved outcome");
    };
    assert_eq!(geofence.geofence_id, 1);
    assert_eq!(geofence.manager_id, 12);
    let Shape::Polygon(polygon) = &geofence.shape else {
        panic!("expected polygon");
    };
    assert_eq!(polygon.vertices().len(), 4);

    let api = api.lock().unwrap();
    assert_eq!(
        api.bodies[0],
        json!({
            "geofenceName": "Depot",
            "geofenceStatus": "RestrictedZone",
            "vertices": {
                "type": "LineString",
                "coordinates": [[0, 0], [2, 0], [2, 2], [0, 2], [0, 0]]
            }
        })
    );
}

#[tokio::test]
async fn test_circle_save_and_list() {
    let (base_url, api) = spawn_fake_api().await;
    let store = Arc::new(store(&base_url, Some(TOKEN)));
    let identity = IdentityContext::manager(4);
    let session = AuthoringSession::new(store.clone(), identity);

    session.start_circle().await;
    session.record_click(p(10.0, 20.0)).await.unwrap();
    session.record_click(p(15.0, 25.0)).await.unwrap();
    session.set_radius(500.0).await.unwrap();
    session.set_name("Terminal").await.unwrap();
    assert!(matches!(session.save().await.unwrap(), SaveOutcome::Saved(_)));

    assert_eq!(
        api.lock().unwrap().bodies[0]["center"],
        json!({ "type": "Point", "coordinates": [25, 15] })
    );

    let listed = store.list(&identity).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert!(listed[0].contains(&p(15.0, 25.0)));
    assert!(store.list(&IdentityContext::manager(5)).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_update_and_delete() {
    let (base_url, _api) = spawn_fake_api().await;
    let store = Arc::new(store(&base_url, Some(TOKEN)));
    let identity = IdentityContext::manager(4);
    let session = AuthoringSession::new(store.clone(), identity);

    session.start_circle().await;
    session.record_click(p(1.0, 1.0)).await.unwrap();
    session.set_radius(100.0).await.unwrap();
    session.set_name("Gate").await.unwrap();
    let SaveOutcome::Saved(created) = session.save().await.unwrap() else {
        panic!("expected saved outcome");
    };

    let updated = store
        .update(
            &identity,
            created.geofence_id,
            &GeofenceUpdate {
                geofence_name: Some("North gate".to_string()),
                geofence_status: Some(ZoneStatus::Parking),
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.name, "North gate");
    assert_eq!(updated.status, ZoneStatus::Parking);
    assert_eq!(updated.shape, created.shape);

    store.delete(&identity, created.geofence_id).await.unwrap();

    let err = store.delete(&identity, created.geofence_id).await.unwrap_err();
    let GeofenceError::Transport(inner) = err else {
        panic!("expected transport error");
    };
    let api_err = inner.downcast_ref::<ApiClientError>().unwrap();
    assert_eq!(api_err.status(), Some(404));
}

#[tokio::test]
async fn test_rejected_save_keeps_drawing() {
    let (base_url, api) = spawn_fake_api().await;
    // no token: the fake API answers 401
    let store = Arc::new(store(&base_url, None));
    let session = AuthoringSession::new(store, IdentityContext::manager(4));

    session.start_polygon().await;
    session.set_name("Yard").await.unwrap();
    for point in [p(0.0, 0.0), p(0.0, 1.0), p(1.0, 0.0)] {
        session.record_click(point).await.unwrap();
    }

    let err = session.save().await.unwrap_err();
    assert_eq!(err.to_string(), "Persistence API returned 401: Missing token");
    assert_eq!(
        session.mode().await,
        domain::services::AuthoringMode::DrawingPolygon
    );
    assert!(api.lock().unwrap().records.is_empty());
}

#[tokio::test]
async fn test_unreachable_api_is_transport_error() {
    let (base_url, _api) = spawn_fake_api().await;
    // wrong path prefix yields a 404 from the router itself
    let store = store(&format!("{}/missing", base_url), Some(TOKEN));
    let err = store.list(&IdentityContext::manager(1)).await.unwrap_err();
    assert!(matches!(err, GeofenceError::Transport(_)));
}

async fn saved_gate(store: Arc<RestGeofenceStore>, identity: IdentityContext) -> GeofenceId {
    let session = AuthoringSession::new(store, identity);
    session.start_circle().await;
    session.record_click(p(1.0, 1.0)).await.unwrap();
    session.set_radius(100.0).await.unwrap();
    session.set_name("Gate").await.unwrap();
    match session.save().await.unwrap() {
        SaveOutcome::Saved(geofence) => geofence.geofence_id,
        SaveOutcome::Discarded => panic!("expected saved outcome"),
    }
}

#[tokio::test]
async fn test_find_geofence_maps_404_to_none() {
    let (base_url, _api) = spawn_fake_api().await;
    let identity = IdentityContext::manager(4);
    let store = Arc::new(RestGeofenceStore::with_client(client(&base_url)));
    let geofence_id = saved_gate(store.clone(), identity).await;

    let found = store.find(&identity, geofence_id).await.unwrap().unwrap();
    assert_eq!(found.name, "Gate");
    assert!(store.find(&identity, 999).await.unwrap().is_none());
}

#[tokio::test]
async fn test_assignment_lifecycle_over_http() {
    let (base_url, api) = spawn_fake_api().await;
    let identity = IdentityContext::manager(4);
    let api_client = client(&base_url);
    let geofences = Arc::new(RestGeofenceStore::with_client(api_client.clone()));
    let geofence_id = saved_gate(geofences.clone(), identity).await;

    let service = AssignmentService::new(
        geofences,
        Arc::new(RestAssociationStore::with_client(api_client)),
        identity,
    );

    let first = service
        .assign(7, geofence_id, Some("night shift".to_string()))
        .await
        .unwrap();
    assert_eq!(api.lock().unwrap().associations, vec![first.clone()]);

    // duplicate is caught from the stored history before any POST
    assert!(service
        .assign(7, geofence_id, None)
        .await
        .unwrap_err()
        .is_conflict());
    assert_eq!(api.lock().unwrap().associations.len(), 1);

    service.deactivate(first.association_id).await.unwrap();
    assert_eq!(
        api.lock().unwrap().associations[0].assignment_state,
        AssignmentState::Inactive
    );
    assert!(service
        .deactivate(first.association_id)
        .await
        .unwrap_err()
        .is_not_found());

    let second = service.assign(7, geofence_id, None).await.unwrap();
    let history = service.list_for_geofence(geofence_id).await.unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].association_id, second.association_id);
    assert_eq!(service.active_for_vehicle(7).await.unwrap(), vec![geofence_id]);
}

#[tokio::test]
async fn test_assign_to_missing_geofence_sends_nothing() {
    let (base_url, api) = spawn_fake_api().await;
    let api_client = client(&base_url);
    let service = AssignmentService::new(
        Arc::new(RestGeofenceStore::with_client(api_client.clone())),
        Arc::new(RestAssociationStore::with_client(api_client)),
        IdentityContext::manager(4),
    );

    assert!(service.assign(7, 999, None).await.unwrap_err().is_not_found());
    assert!(api.lock().unwrap().associations.is_empty());
}
