//! Request, response and event payloads exposed by the HTTP and
//! websocket surfaces.

pub mod admin;
pub mod health;
pub mod quiz;
pub mod validation;
pub mod ws;

use std::time::SystemTime;

use time::{OffsetDateTime, format_description::well_known::Rfc3339};

/// Render a timestamp as RFC 3339 for JSON payloads.
pub(crate) fn format_system_time(at: SystemTime) -> String {
    OffsetDateTime::from(at)
        .format(&Rfc3339)
        .unwrap_or_default()
}
