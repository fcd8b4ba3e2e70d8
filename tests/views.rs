use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use ticket_gate::api::HttpBackend;
use ticket_gate::display::{RecordingDisplay, StatusClass};
use ticket_gate::models::{EventId, NewEvent, NewTicket};
use ticket_gate::views::{management, validation};

const ORIGIN: &str = "https://gate.example.com";

#[tokio::test]
async fn test_list_events_renders_absolute_links() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/events"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 3, "name": "Derby", "event_date": "2024-05-01", "location": null,
             "validation_link": "/?event_id=3"}
        ])))
        .mount(&server)
        .await;

    let backend = HttpBackend::new(server.uri());
    let display = RecordingDisplay::new();
    let events = management::list_events(&backend, &display, ORIGIN).await.unwrap();
    assert_eq!(events.len(), 1);

    let entry = display.last().unwrap();
    assert!(entry.text.contains("Derby"));
    assert!(entry.text.contains("Location: N/A"));
    assert!(entry.text.contains("https://gate.example.com/?event_id=3"));
}

#[tokio::test]
async fn test_empty_event_list() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/events"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let backend = HttpBackend::new(server.uri());
    let display = RecordingDisplay::new();
    management::list_events(&backend, &display, ORIGIN).await.unwrap();
    assert_eq!(display.last().unwrap().text, "No events created.");
}

#[tokio::test]
async fn test_create_event_failure_shows_backend_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/events"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({"error": "Missing name"})))
        .mount(&server)
        .await;

    let backend = HttpBackend::new(server.uri());
    let display = RecordingDisplay::new();
    let result = management::create_event(
        &backend,
        &display,
        ORIGIN,
        &NewEvent {
            name: String::new(),
            event_date: "2024-05-01".into(),
            location: "Main".into(),
        },
    )
    .await;

    assert!(result.is_err());
    let status = display.last().unwrap();
    assert_eq!(status.class, StatusClass::Error);
    assert_eq!(status.text, "Error creating event: Missing name");
}

#[tokio::test]
async fn test_create_ticket_saves_document() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/ticket/create"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"%PDF-1.4".to_vec()))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let backend = HttpBackend::new(server.uri());
    let display = RecordingDisplay::new();
    let saved = management::create_ticket(
        &backend,
        &display,
        dir.path(),
        &NewTicket {
            event_id: EventId::new("42"),
            seat: "A1".into(),
            user_id: Some("bob".into()),
        },
    )
    .await
    .unwrap();

    assert_eq!(saved, dir.path().join("ticket_42_bob.pdf"));
    assert_eq!(std::fs::read(&saved).unwrap(), b"%PDF-1.4");
    assert_eq!(display.last().unwrap().class, StatusClass::Success);
}

#[tokio::test]
async fn test_event_header_for_missing_event() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/events/77"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"error": "Event not found"})))
        .mount(&server)
        .await;

    let backend = HttpBackend::new(server.uri());
    let display = RecordingDisplay::new();
    let details = validation::show_event_header(&backend, &display, &EventId::new("77")).await;

    assert!(details.is_none());
    assert_eq!(display.last().unwrap().text, "Error: event 77 not found.");
}

#[tokio::test]
async fn test_event_header_shows_name_and_date() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/events/5"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"name": "Derby", "event_date": "2024-05-01"})),
        )
        .mount(&server)
        .await;

    let backend = HttpBackend::new(server.uri());
    let display = RecordingDisplay::new();
    validation::show_event_header(&backend, &display, &EventId::new("5"))
        .await
        .unwrap();
    assert_eq!(
        display.last().unwrap().text,
        "Validating tickets for Derby (2024-05-01)"
    );
}
