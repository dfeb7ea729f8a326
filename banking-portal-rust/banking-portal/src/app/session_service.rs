use std::sync::Arc;

use banking_portal_core::shared::constants::MSG_INVALID_LOGIN;
use banking_portal_core::{
    AccountRepository, AccountSummary, CredentialStore, LoginForm, NewAccount, RegistrationForm,
    Username,
};

use crate::domain::auth::{IssuedSession, SessionManager};
use crate::domain::error::AppError;
use crate::domain::session::SessionContext;
use crate::infrastructure::config::Config;
use crate::infrastructure::logger::Logger;

/// A session was established; the caller is now authenticated.
#[derive(Debug, Clone)]
pub struct Established {
    pub session: IssuedSession,
    pub redirect_to: String,
}

/// The caller's session was destroyed.
#[derive(Debug, Clone)]
pub struct Terminated {
    pub redirect_to: String,
}

/// Drives an account through register, login, home and logout.
///
/// Every operation takes the caller's [`SessionContext`] explicitly and
/// returns either the transition to apply or the error to report.
pub struct SessionLifecycleController {
    accounts: Arc<dyn AccountRepository>,
    credentials: CredentialStore,
    sessions: Arc<SessionManager>,
    login_redirect_url: String,
    logout_redirect_url: String,
}

impl SessionLifecycleController {
    pub fn new(
        accounts: Arc<dyn AccountRepository>,
        credentials: CredentialStore,
        sessions: Arc<SessionManager>,
    ) -> Self {
        Self {
            accounts,
            credentials,
            sessions,
            login_redirect_url: "/".to_string(),
            logout_redirect_url: "/users/login/".to_string(),
        }
    }

    pub fn with_redirects(mut self, config: &Config) -> Self {
        self.login_redirect_url = config.login_redirect_url.clone();
        self.logout_redirect_url = config.logout_redirect_url.clone();
        self
    }

    pub fn sessions(&self) -> &Arc<SessionManager> {
        &self.sessions
    }

    /// Creates the account and logs it in.
    pub async fn register(
        &self,
        context: &SessionContext,
        form: &RegistrationForm,
    ) -> Result<Established, AppError> {
        let username_taken = match form.clean_username() {
            Some(username) => self
                .accounts
                .find_by_username(username.as_str())
                .await?
                .is_some(),
            None => false,
        };

        let valid = form
            .validate(self.credentials.policy(), username_taken)
            .map_err(AppError::Validation)?;
        let password_hash = self.credentials.hash_new_password(&valid.password).await?;

        // A concurrent registration of the same name fails here as a field error.
        let record = self
            .accounts
            .create(NewAccount {
                username: valid.username,
                email: valid.email,
                password_hash,
            })
            .await?;
        Logger::account_registered(record.username.as_str());

        let session = self.establish(context, &record.username).await?;
        Ok(Established {
            session,
            redirect_to: "/".to_string(),
        })
    }

    pub async fn login(
        &self,
        context: &SessionContext,
        form: &LoginForm,
    ) -> Result<Established, AppError> {
        let valid = form.validate().map_err(AppError::Validation)?;

        // The store matches case-insensitively; login wants the exact spelling.
        let account = self
            .accounts
            .find_by_username(&valid.username)
            .await?
            .filter(|account| account.username.as_str() == valid.username);
        let verified = self
            .credentials
            .verify(&valid.password, account.as_ref().map(|a| &a.password_hash))
            .await?;

        let account = match account {
            Some(account) if verified && account.is_active => account,
            _ => {
                Logger::login_failed(&valid.username, &context.client_ip);
                return Err(AppError::authentication(MSG_INVALID_LOGIN));
            }
        };

        let session = self.establish(context, &account.username).await?;
        Logger::login_succeeded(account.username.as_str());
        Ok(Established {
            session,
            redirect_to: self.login_redirect_url.clone(),
        })
    }

    pub async fn logout(&self, context: &SessionContext) -> Result<Terminated, AppError> {
        let session = context
            .session()
            .ok_or_else(|| AppError::authorization("no active session"))?;

        self.sessions.destroy(&session.id).await;
        Logger::logged_out(&session.username);
        Ok(Terminated {
            redirect_to: self.logout_redirect_url.clone(),
        })
    }

    /// Summary of the logged-in account.
    ///
    /// A session whose account was deleted or deactivated since login is
    /// destroyed and reported as unauthenticated.
    pub async fn view_home(&self, context: &SessionContext) -> Result<AccountSummary, AppError> {
        let session = context
            .session()
            .ok_or_else(|| AppError::authorization("no active session"))?;

        match self.accounts.find_by_username(&session.username).await? {
            Some(account) if account.is_active => Ok(account.summary()),
            _ => {
                self.sessions.destroy(&session.id).await;
                tracing::info!(username = %session.username, "Dropped session of a missing or inactive account");
                Err(AppError::authorization("account no longer available"))
            }
        }
    }

    /// Cycles the session: the caller's previous session, if any, is
    /// destroyed before the new one is issued.
    async fn establish(
        &self,
        context: &SessionContext,
        username: &Username,
    ) -> Result<IssuedSession, AppError> {
        if let Some(previous) = context.session() {
            self.sessions.destroy(&previous.id).await;
        }

        let issued = self.sessions.create(username.as_str()).await?;
        self.accounts
            .record_login(username, issued.record.created_at)
            .await?;
        Ok(issued)
    }
}
