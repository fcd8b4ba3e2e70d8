use std::path::{Path, PathBuf};

use tracing::{error, info};

use super::absolute_link;
use crate::api::{ApiError, TicketApi};
use crate::display::{Status, StatusSink};
use crate::models::{CreateEventResponse, Event, NewEvent, NewTicket};
use crate::utils::error::AppError;

pub async fn list_events(
    api: &dyn TicketApi,
    display: &dyn StatusSink,
    origin: &str,
) -> Result<Vec<Event>, ApiError> {
    display.show(&Status::info("Loading events..."));

    let events = match api.list_events().await {
        Ok(events) => events,
        Err(e) => {
            error!(error = ?e, "Error loading events");
            display.show(&Status::error("Error loading events."));
            return Err(e);
        }
    };

    if events.is_empty() {
        display.show(&Status::info("No events created."));
        return Ok(events);
    }

    for event in &events {
        display.show(&Status::info(format!(
            "{}\n  Date: {}\n  Location: {}\n  ID: {}\n  Validation link: {}",
            event.name,
            event.event_date,
            event.location.as_deref().unwrap_or("N/A"),
            event.id,
            absolute_link(origin, &event.validation_link),
        )));
    }
    Ok(events)
}

pub async fn create_event(
    api: &dyn TicketApi,
    display: &dyn StatusSink,
    origin: &str,
    event: &NewEvent,
) -> Result<CreateEventResponse, ApiError> {
    display.show(&Status::info("Creating event..."));

    match api.create_event(event).await {
        Ok(created) => {
            info!(name = %created.event.name, "Event created");
            display.show(&Status::success(format!(
                "Event \"{}\" created.\n  Validation link: {}",
                created.event.name,
                absolute_link(origin, &created.event.validation_link),
            )));
            Ok(created)
        }
        Err(e) => {
            display.show(&Status::error(failure_text("Error creating event", &e)));
            if !e.is_rejection() {
                error!(error = ?e, "Error creating event");
            }
            Err(e)
        }
    }
}

/// Issues a ticket and saves the document the backend renders for it under
/// `output_dir`.
pub async fn create_ticket(
    api: &dyn TicketApi,
    display: &dyn StatusSink,
    output_dir: &Path,
    ticket: &NewTicket,
) -> Result<PathBuf, AppError> {
    display.show(&Status::info("Generating ticket..."));

    let document = match api.create_ticket(ticket).await {
        Ok(document) => document,
        Err(e) => {
            display.show(&Status::error(failure_text("Error generating ticket", &e)));
            if !e.is_rejection() {
                error!(error = ?e, "Error creating ticket");
            }
            return Err(e.into());
        }
    };

    let path = output_dir.join(ticket.file_name());
    if let Err(e) = tokio::fs::write(&path, &document).await {
        display.show(&Status::error(format!(
            "Ticket generated but could not be saved to {}: {}",
            path.display(),
            e
        )));
        return Err(e.into());
    }

    info!(path = %path.display(), bytes = document.len(), "Ticket saved");
    display.show(&Status::success(format!(
        "Ticket generated and saved to {}.",
        path.display()
    )));
    Ok(path)
}

fn failure_text(context: &str, error: &ApiError) -> String {
    match error {
        ApiError::Rejected { reason, .. } => format!("{}: {}", context, reason),
        other => format!("Connection error: {}", other),
    }
}
