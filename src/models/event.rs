use std::fmt;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Opaque event identifier. The backend hands these out as integers, links
/// carry them as strings; both forms are accepted.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EventId(String);

impl EventId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EventId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl Serialize for EventId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for EventId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct EventIdVisitor;

        impl<'de> Visitor<'de> for EventIdVisitor {
            type Value = EventId;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("an event id as a string or integer")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<EventId, E> {
                Ok(EventId::new(v))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<EventId, E> {
                Ok(EventId::new(v.to_string()))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<EventId, E> {
                Ok(EventId::new(v.to_string()))
            }
        }

        deserializer.deserialize_any(EventIdVisitor)
    }
}

/// Entry of `GET /events`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    pub name: String,
    pub event_date: String,
    #[serde(default)]
    pub location: Option<String>,
    pub validation_link: String,
}

/// Body of `GET /events/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventDetails {
    pub name: String,
    pub event_date: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewEvent {
    pub name: String,
    pub event_date: String,
    pub location: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatedEvent {
    pub name: String,
    pub validation_link: String,
}

/// Body of a successful `POST /events`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateEventResponse {
    pub event: CreatedEvent,
}
