//! Timecard updation: for each upload row, read the employee's timecard
//! through the web-client proxy, locate the attendance paycode for the
//! given date, and post the paycode change with the record's version.

use actix_web::web::{post, scope};
use actix_web::Scope;

mod upload;

const API_PATH: &str = "/api/timecards";

pub fn configure_routes() -> Scope {
    scope(API_PATH).route("/upload", post().to(upload::process))
}
