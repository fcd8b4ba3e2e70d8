use crate::api::ApiError;
use crate::display::{Status, StatusClass};
use crate::models::{EventId, TicketInfo, ValidationResponse};

/// Outcome of one validation round-trip. Exactly one is shown per scan.
#[derive(Debug, Clone, PartialEq)]
pub enum Verdict {
    Valid(TicketInfo),
    AlreadyScanned(TicketInfo),
    Invalid { reason: String },
    ConnectionError { detail: String },
}

impl Verdict {
    pub fn classify(result: Result<ValidationResponse, ApiError>) -> Self {
        match result {
            Ok(response) if response.ticket_info.scanned => {
                Verdict::AlreadyScanned(response.ticket_info)
            }
            Ok(response) => Verdict::Valid(response.ticket_info),
            Err(ApiError::Rejected { reason, .. }) => Verdict::Invalid { reason },
            Err(e @ (ApiError::Transport(_) | ApiError::Parse(_))) => Verdict::ConnectionError {
                detail: e.to_string(),
            },
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Verdict::Valid(_) => "Valid",
            Verdict::AlreadyScanned(_) => "AlreadyScanned",
            Verdict::Invalid { .. } => "Invalid",
            Verdict::ConnectionError { .. } => "ConnectionError",
        }
    }

    /// Only a first-time valid ticket is marked scanned.
    pub fn needs_mark_scanned(&self) -> bool {
        matches!(self, Verdict::Valid(_))
    }

    pub fn status(&self, event_id: &EventId) -> Status {
        match self {
            Verdict::Valid(ticket) => Status::new(
                StatusClass::Valid,
                format!(
                    "Valid ticket for event {}: ID: {}, Holder: {}, Seat: {}",
                    event_id,
                    ticket.id,
                    ticket.holder(),
                    ticket.seat
                ),
            ),
            Verdict::AlreadyScanned(ticket) => {
                let when = ticket
                    .scanned_at_utc()
                    .map(|ts| ts.format("%Y-%m-%d %H:%M:%S UTC").to_string())
                    .or_else(|| ticket.scanned_at.clone())
                    .unwrap_or_else(|| "N/A".to_string());
                Status::new(
                    StatusClass::Invalid,
                    format!(
                        "Ticket already scanned: {}. Belongs to {}, Seat: {}",
                        when,
                        ticket.holder(),
                        ticket.seat
                    ),
                )
            }
            Verdict::Invalid { reason } => Status::new(
                StatusClass::Invalid,
                format!("Invalid ticket for this event: {}", reason),
            ),
            Verdict::ConnectionError { detail } => Status::new(
                StatusClass::Error,
                format!("Connection error with the API: {}", detail),
            ),
        }
    }
}
