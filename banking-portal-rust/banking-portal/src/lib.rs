pub mod api;
pub mod app;
pub mod domain;
pub mod infrastructure;
pub mod middleware;

use std::sync::Arc;

use actix_web::web;
use banking_portal_core::{AccountRepository, CredentialStore, PasswordConfig, PasswordPolicy};

use crate::api::Templates;
use crate::app::SessionLifecycleController;
use crate::domain::auth::SessionManager;
use crate::infrastructure::config::Config;

/// Shared application state, one `Arc` per component.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub sessions: Arc<SessionManager>,
    pub controller: Arc<SessionLifecycleController>,
    pub templates: Arc<Templates>,
}

impl AppState {
    pub fn new(config: Config, accounts: Arc<dyn AccountRepository>) -> anyhow::Result<Self> {
        Self::with_password_config(config, accounts, PasswordConfig::default())
    }

    pub fn with_password_config(
        config: Config,
        accounts: Arc<dyn AccountRepository>,
        password_config: PasswordConfig,
    ) -> anyhow::Result<Self> {
        let credentials = CredentialStore::new(password_config, PasswordPolicy::default())?;
        let sessions = Arc::new(SessionManager::new(&config.secret_key, config.session.clone()));
        let controller = SessionLifecycleController::new(accounts, credentials, Arc::clone(&sessions))
            .with_redirects(&config);

        Ok(Self {
            config: Arc::new(config),
            sessions,
            controller: Arc::new(controller),
            templates: Arc::new(Templates::new()?),
        })
    }

    /// Registers the shared state on an app or scope.
    pub fn register(&self, cfg: &mut web::ServiceConfig) {
        cfg.app_data(web::Data::new(Arc::clone(&self.config)))
            .app_data(web::Data::new(Arc::clone(&self.sessions)))
            .app_data(web::Data::new(Arc::clone(&self.controller)))
            .app_data(web::Data::new(Arc::clone(&self.templates)));
    }
}
