//! Best-effort action logging.
//!
//! Significant mutations (login, follow, reel upload/update/delete, likes,
//! shares) record who did what to which target, with the device and a coarse
//! request origin. The write is fire-and-forget: a failure is logged locally
//! and swallowed, and must never turn a successful mutation into a failed
//! response.

use actix_web::HttpRequest;
use chrono::Utc;

use crate::models::{ActionLog, ActionLocation};
use crate::store::Store;

/// What happened, described by the caller.
pub struct ActionEvent<'a> {
    pub user: &'a str,
    pub action: &'a str,
    pub target_type: &'a str,
    pub target_id: &'a str,
}

/// Record an action against the audit collection. Never fails the caller.
pub fn record(store: &Store, req: &HttpRequest, event: ActionEvent<'_>) {
    let mut entry = ActionLog {
        id: String::new(),
        user: event.user.to_string(),
        action: event.action.to_string(),
        target_type: event.target_type.to_string(),
        target_id: event.target_id.to_string(),
        device: header_value(req, "user-agent"),
        location: location_of(req),
        created_at: Utc::now(),
    };

    if let Err(e) = store.create_action_log(&mut entry) {
        log::warn!("Action log write failed (non-blocking): {}", e);
    }
}

fn location_of(req: &HttpRequest) -> ActionLocation {
    let ip = {
        let forwarded = header_value(req, "x-forwarded-for");
        if forwarded.is_empty() {
            req.peer_addr()
                .map(|addr| addr.ip().to_string())
                .unwrap_or_default()
        } else {
            forwarded
        }
    };

    ActionLocation {
        ip,
        country: header_value(req, "cf-ipcountry"),
        city: String::new(),
        pincode: String::new(),
    }
}

fn header_value(req: &HttpRequest, name: &str) -> String {
    req.headers()
        .get(name)
        .and_then(|h| h.to_str().ok())
        .unwrap_or_default()
        .to_string()
}
