//! Backend REST API consumed by the gate.

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{
    CreateEventResponse, Event, EventDetails, EventId, NewEvent, NewTicket, ScanRequest,
    ValidationResponse,
};

pub mod http;

pub use http::HttpBackend;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// Network unreachable, connection reset, timeout.
    #[error("Request failed: {0}")]
    Transport(String),

    /// The backend answered with a body we could not decode.
    #[error("Response parsing failed: {0}")]
    Parse(String),

    /// The backend answered with a non-success status.
    #[error("Rejected (status {status}): {reason}")]
    Rejected { status: u16, reason: String },
}

impl ApiError {
    pub fn is_rejection(&self) -> bool {
        matches!(self, ApiError::Rejected { .. })
    }
}

#[async_trait]
pub trait TicketApi: Send + Sync {
    /// `GET /events/{id}`
    async fn get_event(&self, id: &EventId) -> Result<EventDetails, ApiError>;

    /// `GET /events`
    async fn list_events(&self) -> Result<Vec<Event>, ApiError>;

    /// `POST /events`
    async fn create_event(&self, event: &NewEvent) -> Result<CreateEventResponse, ApiError>;

    /// `POST /ticket/create`, returns the rendered ticket document.
    async fn create_ticket(&self, ticket: &NewTicket) -> Result<Vec<u8>, ApiError>;

    /// `POST /ticket/validate`
    async fn validate_ticket(&self, scan: &ScanRequest) -> Result<ValidationResponse, ApiError>;

    /// `POST /ticket/update_scaned`. The response body is ignored.
    async fn mark_scanned(&self, scan: &ScanRequest) -> Result<(), ApiError>;
}
