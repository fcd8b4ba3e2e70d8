#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::time::Instant;

use ticket_gate::api::{ApiError, TicketApi};
use ticket_gate::config::CaptureConfig;
use ticket_gate::models::{
    CreateEventResponse, CreatedEvent, Event, EventDetails, EventId, NewEvent, NewTicket,
    ScanRequest, TicketInfo, ValidationResponse,
};
use ticket_gate::scanner::{Decoder, DecoderError, DecoderEvent, DecoderFactory};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Call {
    Start,
    Stop,
}

#[derive(Default)]
struct ProbeState {
    calls: Vec<(Call, Instant)>,
    sender: Option<mpsc::Sender<DecoderEvent>>,
    fail_start: Option<DecoderError>,
    capturing: bool,
}

/// Scripted decoder: records start/stop calls and lets the test inject
/// decoded payloads while capture is running.
#[derive(Clone, Default)]
pub struct DecoderProbe {
    state: Arc<Mutex<ProbeState>>,
}

struct ProbeDecoder {
    state: Arc<Mutex<ProbeState>>,
}

#[async_trait]
impl Decoder for ProbeDecoder {
    async fn start(
        &mut self,
        _config: &CaptureConfig,
        events: mpsc::Sender<DecoderEvent>,
    ) -> Result<(), DecoderError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push((Call::Start, Instant::now()));
        if let Some(e) = state.fail_start.clone() {
            return Err(e);
        }
        state.sender = Some(events);
        state.capturing = true;
        Ok(())
    }

    async fn stop(&mut self) -> Result<(), DecoderError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push((Call::Stop, Instant::now()));
        state.sender = None;
        state.capturing = false;
        Ok(())
    }
}

impl DecoderProbe {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(error: DecoderError) -> Self {
        let probe = Self::default();
        probe.state.lock().unwrap().fail_start = Some(error);
        probe
    }

    pub fn factory(&self) -> DecoderFactory {
        let state = Arc::clone(&self.state);
        Box::new(move || {
            Ok(Box::new(ProbeDecoder {
                state: Arc::clone(&state),
            }) as Box<dyn Decoder>)
        })
    }

    /// Delivers a decoded payload as the camera would.
    pub async fn emit(&self, text: &str) {
        let sender = self
            .state
            .lock()
            .unwrap()
            .sender
            .clone()
            .expect("decoder is not capturing");
        sender
            .send(DecoderEvent::Decoded(text.to_string()))
            .await
            .unwrap();
    }

    /// Delivers the same payload `times` times before the loop can react,
    /// as a camera decoding several frames of one code would.
    pub async fn emit_burst(&self, text: &str, times: usize) {
        let sender = self.state.lock().unwrap().sender.clone().unwrap();
        for _ in 0..times {
            sender
                .send(DecoderEvent::Decoded(text.to_string()))
                .await
                .unwrap();
        }
    }

    pub async fn fault(&self, error: DecoderError) {
        let sender = self.state.lock().unwrap().sender.clone().unwrap();
        sender.send(DecoderEvent::Fault(error)).await.unwrap();
    }

    pub fn calls(&self) -> Vec<(Call, Instant)> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn starts(&self) -> Vec<Instant> {
        self.calls()
            .into_iter()
            .filter(|(call, _)| *call == Call::Start)
            .map(|(_, at)| at)
            .collect()
    }

    pub fn is_capturing(&self) -> bool {
        self.state.lock().unwrap().capturing
    }
}

/// In-memory backend answering every validation with the same result.
pub struct FakeApi {
    validation: Mutex<Result<ValidationResponse, ApiError>>,
    validated: Mutex<Vec<ScanRequest>>,
    marked: Mutex<Vec<ScanRequest>>,
    latency: Option<Duration>,
}

impl FakeApi {
    pub fn answering(validation: Result<ValidationResponse, ApiError>) -> Self {
        Self {
            validation: Mutex::new(validation),
            validated: Mutex::new(Vec::new()),
            marked: Mutex::new(Vec::new()),
            latency: None,
        }
    }

    /// Holds every validation back for `latency` before answering.
    pub fn slow(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub fn with_ticket(ticket: TicketInfo) -> Self {
        Self::answering(Ok(ValidationResponse {
            ticket_info: ticket,
        }))
    }

    pub fn validated(&self) -> Vec<ScanRequest> {
        self.validated.lock().unwrap().clone()
    }

    pub fn marked(&self) -> Vec<ScanRequest> {
        self.marked.lock().unwrap().clone()
    }
}

#[async_trait]
impl TicketApi for FakeApi {
    async fn get_event(&self, _id: &EventId) -> Result<EventDetails, ApiError> {
        Ok(EventDetails {
            name: "Derby".into(),
            event_date: "2024-05-01".into(),
        })
    }

    async fn list_events(&self) -> Result<Vec<Event>, ApiError> {
        Ok(Vec::new())
    }

    async fn create_event(&self, event: &NewEvent) -> Result<CreateEventResponse, ApiError> {
        Ok(CreateEventResponse {
            event: CreatedEvent {
                name: event.name.clone(),
                validation_link: "/?event_id=1".into(),
            },
        })
    }

    async fn create_ticket(&self, _ticket: &NewTicket) -> Result<Vec<u8>, ApiError> {
        Ok(b"%PDF-1.4".to_vec())
    }

    async fn validate_ticket(&self, scan: &ScanRequest) -> Result<ValidationResponse, ApiError> {
        self.validated.lock().unwrap().push(scan.clone());
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        self.validation.lock().unwrap().clone()
    }

    async fn mark_scanned(&self, scan: &ScanRequest) -> Result<(), ApiError> {
        self.marked.lock().unwrap().push(scan.clone());
        Ok(())
    }
}

pub fn ticket(scanned: bool) -> TicketInfo {
    TicketInfo {
        id: 1,
        user_id: Some("bob".into()),
        seat: "A1".into(),
        scanned,
        scanned_at: scanned.then(|| "2024-01-01T10:00:00Z".to_string()),
    }
}

/// Lets spawned tasks run without moving the (paused) clock.
pub async fn settle() {
    for _ in 0..100 {
        tokio::task::yield_now().await;
    }
}
