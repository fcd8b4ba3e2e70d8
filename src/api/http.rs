use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;

use super::{ApiError, TicketApi};
use crate::config::Config;
use crate::models::{
    CreateEventResponse, Event, EventDetails, EventId, NewEvent, NewTicket, ScanRequest,
    ValidationResponse,
};
use crate::utils::response::ApiErrorBody;

/// `TicketApi` over HTTP/JSON.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: String,
}

impl HttpBackend {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn from_config(config: &Config) -> Result<Self, ApiError> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.api_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.api_base_url.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Sends the request and turns non-success statuses into `Rejected`.
    async fn send(&self, request: RequestBuilder) -> Result<Response, ApiError> {
        let response = request
            .send()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.bytes().await.unwrap_or_default();
        let reason = ApiErrorBody::parse(&body)
            .reason()
            .map(str::to_string)
            .or_else(|| status.canonical_reason().map(str::to_string))
            .unwrap_or_else(|| status.to_string());

        Err(ApiError::Rejected {
            status: status.as_u16(),
            reason,
        })
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        let response = self.send(request).await?;
        let body = response
            .bytes()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        serde_json::from_slice(&body).map_err(|e| ApiError::Parse(e.to_string()))
    }
}

#[async_trait]
impl TicketApi for HttpBackend {
    async fn get_event(&self, id: &EventId) -> Result<EventDetails, ApiError> {
        let request = self.client.get(self.url(&format!("/events/{}", id)));
        self.send_json(request).await
    }

    async fn list_events(&self) -> Result<Vec<Event>, ApiError> {
        let request = self.client.get(self.url("/events"));
        self.send_json(request).await
    }

    async fn create_event(&self, event: &NewEvent) -> Result<CreateEventResponse, ApiError> {
        let request = self.client.post(self.url("/events")).json(event);
        self.send_json(request).await
    }

    async fn create_ticket(&self, ticket: &NewTicket) -> Result<Vec<u8>, ApiError> {
        let request = self.client.post(self.url("/ticket/create")).json(ticket);
        let response = self.send(request).await?;
        let body = response
            .bytes()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        Ok(body.to_vec())
    }

    async fn validate_ticket(&self, scan: &ScanRequest) -> Result<ValidationResponse, ApiError> {
        let request = self.client.post(self.url("/ticket/validate")).json(scan);
        self.send_json(request).await
    }

    async fn mark_scanned(&self, scan: &ScanRequest) -> Result<(), ApiError> {
        let request = self.client.post(self.url("/ticket/update_scaned")).json(scan);
        self.send(request).await.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_is_normalized() {
        let backend = HttpBackend::new("http://localhost:5000/api/");
        assert_eq!(backend.base_url(), "http://localhost:5000/api");
        assert_eq!(backend.url("/events"), "http://localhost:5000/api/events");
    }
}
