//! Punch updates: single punch entry and bulk spreadsheet upload, both
//! posted to the backend's action endpoint as `ADD_NO_TYPE`.

use actix_web::web::{post, scope};
use actix_web::Scope;

use serde_json::{json, Value};

mod bulk;
mod single;

const API_PATH: &str = "/api/punches";

pub fn configure_routes() -> Scope {
    scope(API_PATH)
        .route("/single", post().to(single::process))
        .route("/upload", post().to(bulk::process))
}

pub(crate) fn action_url(host: &str) -> String {
    format!(
        "{}/resource-server/api/punches/action/",
        host.trim_end_matches('/')
    )
}

/// Build one punch action payload. Seconds are always forced to `:00`.
pub(crate) fn punch_payload(
    external_number: &str,
    date: &str,
    time: &str,
) -> Result<Value, String> {
    if external_number.trim().is_empty() {
        return Err("externalNumber is mandatory".to_string());
    }
    let date = crate::engine::cell::normalize_date(date)
        .ok_or_else(|| format!("invalid date '{date}', expected YYYY-MM-DD"))?;
    let time = crate::engine::cell::normalize_time_hm(time)
        .ok_or_else(|| format!("invalid time '{time}', expected HH:MM"))?;

    Ok(json!({
        "action": "ADD_NO_TYPE",
        "punch": {
            "employee": { "externalNumber": external_number.trim() },
            "punchTime": format!("{date} {time}:00")
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_forces_seconds_to_zero() {
        let p = punch_payload("E-77", "2026-03-02", "12:22").unwrap();
        assert_eq!(p["punch"]["punchTime"], "2026-03-02 12:22:00");
        assert_eq!(p["action"], "ADD_NO_TYPE");
        assert_eq!(p["punch"]["employee"]["externalNumber"], "E-77");
    }

    #[test]
    fn bad_time_is_rejected() {
        assert!(punch_payload("E-77", "2026-03-02", "25:00").is_err());
        assert!(punch_payload("", "2026-03-02", "12:00").is_err());
    }
}
