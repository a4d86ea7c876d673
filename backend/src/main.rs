use actix_web::{web, App, HttpServer};
use env_logger::Env;
use log::info;

use backend::config::PortalConfig;
use backend::services;
use backend::state::PortalState;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(Env::default().default_filter_or("info"));

    let config = match PortalConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            log::error!("configuration error: {e}");
            std::process::exit(1);
        }
    };
    let bind = (config.bind_addr.clone(), config.bind_port);

    let state = PortalState::new(config).map_err(std::io::Error::other)?;
    let state = web::Data::new(state);

    info!("portal listening on http://{}:{}", bind.0, bind.1);

    HttpServer::new(move || {
        App::new()
            .app_data(web::JsonConfig::default().limit(10 * 1024 * 1024)) // 10 MB
            .app_data(state.clone())
            .service(services::auth::configure_routes())
            .service(services::modules::configure_routes())
            .service(services::punches::configure_routes())
            .service(services::timecards::configure_routes())
    })
    .bind(bind)?
    .run()
    .await
}
