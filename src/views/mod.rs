//! Operator-facing views and the link routing that picks between them.

use url::Url;

use crate::models::EventId;
use crate::utils::error::AppError;

pub mod management;
pub mod validation;

const LINK_BASE: &str = "http://localhost/";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum View {
    Validation(EventId),
    Management,
}

/// Picks the view for a link: an `event_id` query parameter selects ticket
/// validation for that event, anything else the event management view.
/// Relative links such as `/?event_id=7` are accepted.
pub fn route(link: &str) -> Result<View, AppError> {
    let link = link.trim();
    let url = match Url::parse(link) {
        Ok(url) => url,
        Err(url::ParseError::RelativeUrlWithoutBase) => Url::parse(LINK_BASE)
            .and_then(|base| base.join(link))
            .map_err(|e| AppError::InvalidLink(format!("{}: {}", link, e)))?,
        Err(e) => return Err(AppError::InvalidLink(format!("{}: {}", link, e))),
    };

    let event_id = url
        .query_pairs()
        .find(|(key, _)| key == "event_id")
        .map(|(_, value)| value.trim().to_string())
        .filter(|value| !value.is_empty());

    Ok(match event_id {
        Some(id) => View::Validation(EventId::new(id)),
        None => View::Management,
    })
}

/// Absolute form of a link the backend returned relative to the site root.
pub fn absolute_link(origin: &str, link: &str) -> String {
    if link.starts_with("http://") || link.starts_with("https://") {
        return link.to_string();
    }
    format!("{}/{}", origin.trim_end_matches('/'), link.trim_start_matches('/'))
}
