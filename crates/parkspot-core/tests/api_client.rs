use std::sync::Arc;

use parkspot_core::auth::MemoryStore;
use parkspot_core::models::{BookingStatus, SpotKind};
use parkspot_core::{ApiClient, ApiError, AuthClient, AuthError, RefreshPolicy, Session, TokenPair};
use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn logged_in_client(server: &MockServer) -> ApiClient {
    let session = Arc::new(Session::new(Arc::new(MemoryStore::new())));
    session
        .save_tokens(&TokenPair::new("acc-1", "ref-1"), false)
        .unwrap();
    let auth = AuthClient::with_client(
        reqwest::Client::new(),
        &server.uri(),
        session,
        RefreshPolicy::default(),
    );
    ApiClient::new(Arc::new(auth))
}

#[tokio::test]
async fn list_spots_filters_by_kind() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/spots"))
        .and(query_param("type", "EV_CHARGING"))
        .and(header("authorization", "Bearer acc-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": [
                {"id": 1, "name": "A4", "type": "EV_CHARGING", "pricePerHour": 3.5, "available": true},
                {"id": 2, "name": "A5", "type": "EV_CHARGING", "available": false}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;
    let api = logged_in_client(&server).await;

    let spots = api.list_spots(Some(SpotKind::EvCharging)).await.unwrap();

    assert_eq!(spots.len(), 2);
    assert!(spots[0].available);
    assert_eq!(spots[1].price_per_hour, None);
}

#[tokio::test]
async fn my_bookings_parses_times() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/bookings/me"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": [{
                "id": 9,
                "spotId": 1,
                "startTime": "2026-10-19T08:00:00Z",
                "endTime": "2026-10-19T09:00:00Z",
                "status": "PENDING"
            }]
        })))
        .mount(&server)
        .await;
    let api = logged_in_client(&server).await;

    let bookings = api.my_bookings().await.unwrap();

    assert_eq!(bookings[0].status, BookingStatus::Pending);
    assert_eq!(bookings[0].duration_minutes(), 60);
}

#[tokio::test]
async fn non_success_status_maps_to_api_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/bookings/me"))
        .respond_with(ResponseTemplate::new(404).set_body_string("no bookings for user"))
        .mount(&server)
        .await;
    let api = logged_in_client(&server).await;

    let err = api.my_bookings().await.unwrap_err();

    match err {
        AuthError::Api(ApiError::NotFound(body)) => assert_eq!(body, "no bookings for user"),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn unsuccessful_envelope_is_invalid_response() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/spots"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"success": false, "message": "Maintenance"})),
        )
        .mount(&server)
        .await;
    let api = logged_in_client(&server).await;

    let err = api.list_spots(None).await.unwrap_err();

    assert!(matches!(err, AuthError::Api(ApiError::InvalidResponse(ref m)) if m == "Maintenance"));
}

#[tokio::test]
async fn delete_accepts_empty_success() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/api/v1/bookings/9"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    let api = logged_in_client(&server).await;

    api.delete("/api/v1/bookings/9").await.unwrap();
}

#[tokio::test]
async fn post_json_sends_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/bookings"))
        .and(wiremock::matchers::body_json(json!({"spotId": 1})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "success": true,
            "data": {
                "id": 10,
                "spotId": 1,
                "startTime": "2026-10-19T08:00:00Z",
                "endTime": "2026-10-19T08:30:00Z",
                "status": "CONFIRMED"
            }
        })))
        .expect(1)
        .mount(&server)
        .await;
    let api = logged_in_client(&server).await;

    let booking: parkspot_core::models::Booking = api
        .post_json("/api/v1/bookings", &json!({"spotId": 1}))
        .await
        .unwrap();

    assert_eq!(booking.id, 10);
}
