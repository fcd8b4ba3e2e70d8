use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::error;

use crate::api::{ApiError, TicketApi};
use crate::display::{Status, StatusSink};
use crate::models::{EventDetails, EventId};
use crate::scanner::{DecoderFactory, ScanHandle, ScanLoop, ScanSettings};
use crate::utils::error::AppError;

/// Shows which event tickets are validated against. A missing event is
/// reported but does not prevent scanning.
pub async fn show_event_header(
    api: &dyn TicketApi,
    display: &dyn StatusSink,
    event_id: &EventId,
) -> Option<EventDetails> {
    match api.get_event(event_id).await {
        Ok(details) => {
            display.show(&Status::info(format!(
                "Validating tickets for {} ({})",
                details.name, details.event_date
            )));
            Some(details)
        }
        Err(ApiError::Rejected { .. }) => {
            display.show(&Status::error(format!("Error: event {} not found.", event_id)));
            None
        }
        Err(e) => {
            error!(error = ?e, "Error fetching event details");
            display.show(&Status::error(format!(
                "Error loading details for event {}.",
                event_id
            )));
            None
        }
    }
}

/// Enters the validation view: shows the event header, then spawns the
/// scan loop and starts it.
pub async fn open<A>(
    api: Arc<A>,
    display: Arc<dyn StatusSink>,
    event_id: EventId,
    factory: DecoderFactory,
    settings: ScanSettings,
) -> Result<(ScanHandle, JoinHandle<()>), AppError>
where
    A: TicketApi + 'static,
{
    show_event_header(api.as_ref(), display.as_ref(), &event_id).await;

    let (handle, task) = ScanLoop::spawn(event_id, api, display, factory, settings);
    handle.start().await?;
    Ok((handle, task))
}
