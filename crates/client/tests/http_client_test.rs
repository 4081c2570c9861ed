use std::sync::{Arc, Mutex};

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use tokio::net::TcpListener;

use salonbook_client::config::{ClientConfig, RequestEncoding};
use salonbook_client::HttpBookingClient;
use salonbook_core::date::DateKey;
use salonbook_core::errors::{ProviderError, SubmissionError};
use salonbook_core::models::booking::{BookingMode, ServiceId, StaffId, SubmissionPayload};
use salonbook_core::models::time_slot::TimeOfDay;
use salonbook_core::providers::{
    AvailabilityProvider, NextAvailable, NextAvailableProvider, NonWorkingDaysProvider,
    SubmissionSink,
};

/// What the stub server saw of one request.
#[derive(Debug, Clone)]
struct Recorded {
    content_type: Option<String>,
    requested_with: Option<String>,
    csrf: Option<String>,
    body: String,
}

#[derive(Clone)]
struct Stub {
    status: StatusCode,
    reply: Value,
    requests: Arc<Mutex<Vec<Recorded>>>,
}

async fn record(State(stub): State<Stub>, headers: HeaderMap, body: String) -> (StatusCode, Json<Value>) {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };
    stub.requests.lock().unwrap().push(Recorded {
        content_type: header("content-type"),
        requested_with: header("x-requested-with"),
        csrf: header("x-csrftoken"),
        body,
    });
    (stub.status, Json(stub.reply))
}

/// Serves `reply` on `path` and returns the base URL and the request log.
async fn serve(path: &str, status: StatusCode, reply: Value) -> (String, Arc<Mutex<Vec<Recorded>>>) {
    let requests = Arc::new(Mutex::new(Vec::new()));
    let stub = Stub {
        status,
        reply,
        requests: requests.clone(),
    };
    let app = Router::new().route(path, post(record)).with_state(stub);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, app).await });

    (format!("http://{addr}"), requests)
}

fn client(base_url: &str, encoding: RequestEncoding) -> HttpBookingClient {
    let mut config = ClientConfig::new(base_url);
    config.encoding = encoding;
    config.csrf_token = Some("token-123".to_string());
    HttpBookingClient::new(config).unwrap()
}

fn date(s: &str) -> DateKey {
    DateKey::parse(s).unwrap()
}

fn time(h: u32, m: u32) -> TimeOfDay {
    TimeOfDay::new(h, m).unwrap()
}

fn payload(mode: BookingMode) -> SubmissionPayload {
    SubmissionPayload {
        mode,
        date: date("2025-05-06"),
        staff: StaffId::new("7"),
        service: ServiceId::new("3"),
        start_time: time(14, 0),
        end_time: time(14, 45),
        timezone: "Europe/Zurich".to_string(),
        reason_for_rescheduling: Some("Sick".to_string()),
    }
}

#[tokio::test]
async fn test_fetch_slots_posts_json_query() {
    let (base, requests) = serve(
        "/reservations/available_slots/",
        StatusCode::OK,
        json!({"success": true, "slots": ["09:00", "13:30"]}),
    )
    .await;
    let client = client(&base, RequestEncoding::Json);

    let slots = client
        .fetch_slots(date("2025-05-06"), &StaffId::new("7"), &ServiceId::new("3"), 45)
        .await
        .unwrap();

    let labels: Vec<&str> = slots.iter().map(|s| s.label.as_str()).collect();
    assert_eq!(labels, vec!["09:00", "13:30"]);
    assert_eq!(slots[1].start(), time(13, 30));
    assert_eq!(slots[1].end(), time(14, 15));

    let seen = requests.lock().unwrap().clone();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].content_type.as_deref(), Some("application/json"));
    assert_eq!(seen[0].requested_with.as_deref(), Some("XMLHttpRequest"));
    assert_eq!(seen[0].csrf.as_deref(), Some("token-123"));
    let body: Value = serde_json::from_str(&seen[0].body).unwrap();
    assert_eq!(
        body,
        json!({"date": "2025-05-06", "staff_id": "7", "service_id": "3", "duration": 45})
    );
}

#[tokio::test]
async fn test_fetch_slots_posts_form_query_and_reads_legacy_labels() {
    let (base, requests) = serve(
        "/reservations/available_slots/",
        StatusCode::OK,
        json!({"available_slots": ["9:00 AM", "1:30 PM"], "error": false}),
    )
    .await;
    let client = client(&base, RequestEncoding::Form);

    let slots = client
        .fetch_slots(date("2025-05-06"), &StaffId::new("7"), &ServiceId::new("3"), 30)
        .await
        .unwrap();

    assert_eq!(slots.len(), 2);
    assert_eq!(slots[0].label, "9:00 AM");
    assert_eq!(slots[0].start(), time(9, 0));
    assert_eq!(slots[1].start(), time(13, 30));
    assert_eq!(slots[1].end(), time(14, 0));

    let seen = requests.lock().unwrap().clone();
    assert_eq!(
        seen[0].content_type.as_deref(),
        Some("application/x-www-form-urlencoded")
    );
    assert!(seen[0].body.contains("selected_date=2025-05-06"));
    assert!(seen[0].body.contains("staff_member=7"));
    assert!(seen[0].body.contains("service_id=3"));
}

#[tokio::test]
async fn test_fetch_slots_empty_day() {
    let (base, _) = serve(
        "/reservations/available_slots/",
        StatusCode::OK,
        json!({"available_slots": [], "error": false, "message": "No availability"}),
    )
    .await;

    let slots = client(&base, RequestEncoding::Json)
        .fetch_slots(date("2025-05-06"), &StaffId::new("7"), &ServiceId::new("3"), 30)
        .await
        .unwrap();

    assert!(slots.is_empty());
}

#[tokio::test]
async fn test_fetch_slots_rejection_carries_server_message() {
    let (base, _) = serve(
        "/reservations/available_slots/",
        StatusCode::OK,
        json!({"success": false, "message": "Staff member is not available"}),
    )
    .await;

    let err = client(&base, RequestEncoding::Json)
        .fetch_slots(date("2025-05-06"), &StaffId::new("7"), &ServiceId::new("3"), 30)
        .await
        .unwrap_err();

    assert!(matches!(err, ProviderError::Rejected(ref m) if m == "Staff member is not available"));
}

#[tokio::test]
async fn test_fetch_slots_skips_unusable_labels() {
    let (base, _) = serve(
        "/reservations/available_slots/",
        StatusCode::OK,
        json!({"slots": ["09:00", "25:99", "23:00", "23:30"]}),
    )
    .await;

    let slots = client(&base, RequestEncoding::Json)
        .fetch_slots(date("2025-05-06"), &StaffId::new("7"), &ServiceId::new("3"), 60)
        .await
        .unwrap();

    let labels: Vec<&str> = slots.iter().map(|s| s.label.as_str()).collect();
    assert_eq!(labels, vec!["09:00", "23:00"]);
    assert_eq!(slots[1].end(), TimeOfDay::MIDNIGHT);
}

#[tokio::test]
async fn test_fetch_day_keeps_server_message() {
    let (base, _) = serve(
        "/reservations/available_slots/",
        StatusCode::OK,
        json!({"available_slots": [], "error": false, "message": "No availability"}),
    )
    .await;

    let day = client(&base, RequestEncoding::Form)
        .fetch_day(date("2025-05-06"), &StaffId::new("7"), &ServiceId::new("3"), 30)
        .await
        .unwrap();

    assert!(day.slots.is_empty());
    assert_eq!(day.message.as_deref(), Some("No availability"));
}

#[tokio::test]
async fn test_malformed_body_is_reported() {
    let (base, _) = serve(
        "/reservations/available_slots/",
        StatusCode::OK,
        json!({"slots": "09:00"}),
    )
    .await;

    let err = client(&base, RequestEncoding::Json)
        .fetch_slots(date("2025-05-06"), &StaffId::new("7"), &ServiceId::new("3"), 30)
        .await
        .unwrap_err();

    assert!(matches!(err, ProviderError::Malformed(_)));
}

#[tokio::test]
async fn test_server_error_is_transport_failure() {
    let (base, _) = serve(
        "/reservations/available_slots/",
        StatusCode::INTERNAL_SERVER_ERROR,
        json!({"detail": "boom"}),
    )
    .await;

    let err = client(&base, RequestEncoding::Json)
        .fetch_slots(date("2025-05-06"), &StaffId::new("7"), &ServiceId::new("3"), 30)
        .await
        .unwrap_err();

    assert!(matches!(err, ProviderError::Transport(_)));
}

#[tokio::test]
async fn test_non_working_days_without_staff_skips_request() {
    let (base, requests) = serve(
        "/reservations/request_staff_info/",
        StatusCode::OK,
        json!({"success": true, "non_working_days": ["2025-05-07"]}),
    )
    .await;

    let days = client(&base, RequestEncoding::Json).fetch(None).await.unwrap();

    assert!(days.is_empty());
    assert!(requests.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_non_working_days_are_parsed() {
    let (base, requests) = serve(
        "/reservations/request_staff_info/",
        StatusCode::OK,
        json!({"success": true, "non_working_days": ["2025-05-10", "2025-05-07"]}),
    )
    .await;

    let days = client(&base, RequestEncoding::Form)
        .fetch(Some(&StaffId::new("7")))
        .await
        .unwrap();

    let keys: Vec<String> = days.iter().map(DateKey::to_string).collect();
    assert_eq!(keys, vec!["2025-05-07", "2025-05-10"]);
    assert_eq!(requests.lock().unwrap()[0].body, "staff_member=7");
}

#[tokio::test]
async fn test_next_available_found_from_iso_datetime() {
    let (base, _) = serve(
        "/reservations/request_next_available_slot/3/",
        StatusCode::OK,
        json!({"next_available_date": "2025-05-09T00:00:00", "error": false}),
    )
    .await;

    let next = client(&base, RequestEncoding::Json)
        .next_available(&StaffId::new("7"), &ServiceId::new("3"))
        .await
        .unwrap();

    assert_eq!(next, NextAvailable::Found(date("2025-05-09")));
}

#[tokio::test]
async fn test_next_available_empty_date_is_unavailable() {
    let (base, _) = serve(
        "/reservations/request_next_available_slot/3/",
        StatusCode::OK,
        json!({"next_available_date": "", "error": true, "message": "No upcoming availability"}),
    )
    .await;

    let next = client(&base, RequestEncoding::Json)
        .next_available(&StaffId::new("7"), &ServiceId::new("3"))
        .await
        .unwrap();

    assert_eq!(
        next,
        NextAvailable::Unavailable("No upcoming availability".to_string())
    );
}

#[tokio::test]
async fn test_submit_request_posts_form_fields() {
    let (base, requests) = serve(
        "/reservations/appointment-request-submit/",
        StatusCode::OK,
        json!({"success": true, "message": "Saved", "redirect_url": "/reservations/client-info/1/"}),
    )
    .await;

    client(&base, RequestEncoding::Json)
        .submit(&payload(BookingMode::Request))
        .await
        .unwrap();

    let seen = requests.lock().unwrap().clone();
    assert_eq!(
        seen[0].content_type.as_deref(),
        Some("application/x-www-form-urlencoded")
    );
    let body = &seen[0].body;
    assert!(body.contains("service_id=3"));
    assert!(body.contains("staff_member=7"));
    assert!(body.contains("date_selected=2025-05-06"));
    assert!(body.contains("time_selected=14%3A00"));
    assert!(body.contains("timezone=Europe%2FZurich"));
    assert!(!body.contains("appointment_request_id"));
    assert!(!body.contains("reason_for_rescheduling"));
}

#[tokio::test]
async fn test_submit_reschedule_uses_reschedule_endpoint() {
    let (base, requests) = serve(
        "/reservations/appointment-reschedule-submit/",
        StatusCode::OK,
        json!({"success": true, "redirect_url": "/reservations/reschedule-sent/"}),
    )
    .await;
    let mode = BookingMode::Reschedule {
        appointment_request_id: "41".to_string(),
        original_date: None,
    };

    client(&base, RequestEncoding::Json)
        .submit(&payload(mode))
        .await
        .unwrap();

    let body = requests.lock().unwrap()[0].body.clone();
    assert!(body.contains("appointment_request_id=41"));
    assert!(body.contains("reason_for_rescheduling=Sick"));
}

#[tokio::test]
async fn test_submit_rejection_carries_message() {
    let (base, _) = serve(
        "/reservations/appointment-request-submit/",
        StatusCode::OK,
        json!({"success": false, "message": "Slot already taken"}),
    )
    .await;

    let err = client(&base, RequestEncoding::Json)
        .submit(&payload(BookingMode::Request))
        .await
        .unwrap_err();

    assert!(matches!(err, SubmissionError::Rejected(ref m) if m == "Slot already taken"));
}
