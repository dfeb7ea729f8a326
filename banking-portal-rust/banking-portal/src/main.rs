use std::sync::Arc;
use std::time::Duration;

use actix_cors::Cors;
use actix_web::middleware::{Logger as RequestLogger, NormalizePath, TrailingSlash};
use actix_web::{App, HttpServer};

use banking_portal::api;
use banking_portal::infrastructure::config::Config;
use banking_portal::infrastructure::logger::Logger;
use banking_portal::infrastructure::storage::build_repository;
use banking_portal::middleware::{SecurityConfig, SecurityMiddleware, SessionMiddleware};
use banking_portal::AppState;

fn startup_error(context: &str, err: impl std::fmt::Display) -> std::io::Error {
    log::error!("{context}: {err}");
    std::io::Error::new(std::io::ErrorKind::Other, format!("{context}: {err}"))
}

fn cors(config: &Config) -> Cors {
    if config.debug {
        return Cors::permissive();
    }
    config
        .cors_origins
        .iter()
        .fold(Cors::default(), |cors, origin| cors.allowed_origin(origin))
        .allow_any_method()
        .allow_any_header()
        .supports_credentials()
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let config = match Config::new() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{e}");
            return Err(std::io::Error::new(std::io::ErrorKind::Other, e.to_string()));
        }
    };
    Logger::init(&config.logging);

    log::info!("Starting Banking Portal v{}", config.version);
    log::info!("Configuration: {}", config.summary());
    if config.secret_key_generated {
        log::warn!("SECRET_KEY not set; generated a temporary key. Sessions end on restart.");
    }

    let accounts = build_repository(&config.database)
        .await
        .map_err(|e| startup_error("Failed to open account store", e))?;
    let state = AppState::new(config, accounts)
        .map_err(|e| startup_error("Failed to initialise application", e))?;

    let purge_interval = Duration::from_secs(state.config.session.purge_interval_secs.max(1));
    let sessions = Arc::clone(&state.sessions);
    actix_web::rt::spawn(async move {
        let mut ticker = tokio::time::interval(purge_interval);
        loop {
            ticker.tick().await;
            let purged = sessions.purge_expired().await;
            if purged > 0 {
                log::debug!("Purged {purged} expired session(s)");
            }
        }
    });

    let bind = (state.config.bind_address.clone(), state.config.port);
    log::info!("Listening on {}:{}", bind.0, bind.1);

    HttpServer::new(move || {
        let login_url = state.config.login_url.clone();
        App::new()
            .wrap(SessionMiddleware)
            .wrap(NormalizePath::new(TrailingSlash::Always))
            .wrap(SecurityMiddleware::new(SecurityConfig::new(
                state.config.effective_allowed_hosts(),
            )))
            .wrap(cors(&state.config))
            .wrap(RequestLogger::default())
            .configure(|cfg| state.register(cfg))
            .configure(|cfg| api::configure(cfg, &login_url))
    })
    .bind(bind)?
    .run()
    .await
}
