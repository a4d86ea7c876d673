use actix_web::{web, HttpResponse, Responder};

use common::model::schema::ModuleSummary;

use crate::catalog;
use crate::state::PortalState;

use super::unauthorized;

/// `GET /api/modules` — the menu: every schema-driven module plus the two
/// custom flows.
pub(crate) async fn process(state: web::Data<PortalState>) -> impl Responder {
    if state.sessions.current().await.is_none() {
        return unauthorized();
    }

    let mut modules: Vec<ModuleSummary> = catalog::catalog().iter().map(|s| s.summary()).collect();
    modules.push(ModuleSummary {
        key: "punches".to_string(),
        title: "Punch Update".to_string(),
        columns: ["externalNumber", "date", "time"].map(String::from).to_vec(),
        download_only: false,
        custom: true,
    });
    modules.push(ModuleSummary {
        key: "timecard_updation".to_string(),
        title: "Timecard Updation".to_string(),
        columns: ["externalNumber", "attendanceDate", "paycode_id"]
            .map(String::from)
            .to_vec(),
        download_only: false,
        custom: true,
    });

    HttpResponse::Ok().json(modules)
}
