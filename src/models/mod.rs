pub mod event;
pub mod ticket;

pub use event::{CreateEventResponse, CreatedEvent, Event, EventDetails, EventId, NewEvent};
pub use ticket::{NewTicket, ScanRequest, TicketInfo, ValidationResponse};
