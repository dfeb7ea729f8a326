use std::sync::Arc;

use actix_web::dev::Payload;
use actix_web::{web, FromRequest, HttpMessage, HttpRequest};
use futures_util::future::LocalBoxFuture;

use crate::domain::auth::{SessionManager, SessionRecord};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Anonymous,
    Authenticated { session: SessionRecord },
}

/// Per-request view of who is calling.
///
/// Resolved once from the session cookie by
/// [`SessionMiddleware`](crate::middleware::session::SessionMiddleware) and
/// handed to handlers as an extractor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionContext {
    pub state: SessionState,
    pub client_ip: String,
}

impl SessionContext {
    pub fn anonymous(client_ip: impl Into<String>) -> Self {
        Self {
            state: SessionState::Anonymous,
            client_ip: client_ip.into(),
        }
    }

    pub fn authenticated(session: SessionRecord, client_ip: impl Into<String>) -> Self {
        Self {
            state: SessionState::Authenticated { session },
            client_ip: client_ip.into(),
        }
    }

    pub fn session(&self) -> Option<&SessionRecord> {
        match &self.state {
            SessionState::Authenticated { session } => Some(session),
            SessionState::Anonymous => None,
        }
    }

    pub fn username(&self) -> Option<&str> {
        self.session().map(|session| session.username.as_str())
    }

    /// Reads the session cookie and looks the token up in the session store.
    pub async fn resolve(req: &HttpRequest) -> Self {
        let client_ip = req
            .connection_info()
            .realip_remote_addr()
            .unwrap_or("unknown")
            .to_string();

        let Some(manager) = req.app_data::<web::Data<Arc<SessionManager>>>() else {
            return Self::anonymous(client_ip);
        };
        let Some(cookie) = req.cookie(manager.cookie_name()) else {
            return Self::anonymous(client_ip);
        };

        match manager.resolve(cookie.value()).await {
            Some(session) => Self::authenticated(session, client_ip),
            None => Self::anonymous(client_ip),
        }
    }
}

/// The access guard predicate.
pub fn is_authenticated(context: &SessionContext) -> bool {
    matches!(context.state, SessionState::Authenticated { .. })
}

impl FromRequest for SessionContext {
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let cached = req.extensions().get::<SessionContext>().cloned();
        if let Some(context) = cached {
            return Box::pin(async move { Ok(context) });
        }

        let req = req.clone();
        Box::pin(async move {
            let context = SessionContext::resolve(&req).await;
            req.extensions_mut().insert(context.clone());
            Ok(context)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::cookie::Cookie;
    use actix_web::test::TestRequest;
    use chrono::Utc;

    use crate::infrastructure::config::SessionConfig;

    fn record() -> SessionRecord {
        SessionRecord {
            id: "abc".to_string(),
            username: "alice".to_string(),
            created_at: Utc::now(),
            expires_at: Utc::now(),
        }
    }

    fn manager() -> web::Data<Arc<SessionManager>> {
        web::Data::new(Arc::new(SessionManager::new(
            "test-secret-key",
            SessionConfig {
                cookie_name: "sessionid".to_string(),
                cookie_age: 3600,
                cookie_secure: false,
                purge_interval_secs: 300,
            },
        )))
    }

    #[test]
    fn test_is_authenticated() {
        assert!(!is_authenticated(&SessionContext::anonymous("127.0.0.1")));

        let context = SessionContext::authenticated(record(), "127.0.0.1");
        assert!(is_authenticated(&context));
        assert_eq!(context.username(), Some("alice"));
    }

    #[actix_web::test]
    async fn test_resolve_from_cookie() {
        let manager = manager();
        let issued = manager.create("alice").await.unwrap();

        let req = TestRequest::default()
            .app_data(manager.clone())
            .cookie(Cookie::new("sessionid", issued.token.clone()))
            .to_http_request();
        let context = SessionContext::resolve(&req).await;
        assert_eq!(context.session(), Some(&issued.record));
    }

    #[actix_web::test]
    async fn test_missing_or_bad_cookie_is_anonymous() {
        let manager = manager();

        let req = TestRequest::default().app_data(manager.clone()).to_http_request();
        assert!(!is_authenticated(&SessionContext::resolve(&req).await));

        let req = TestRequest::default()
            .app_data(manager)
            .cookie(Cookie::new("sessionid", "garbage"))
            .to_http_request();
        assert!(!is_authenticated(&SessionContext::resolve(&req).await));
    }

    #[actix_web::test]
    async fn test_extractor_prefers_request_extensions() {
        let req = TestRequest::default().to_http_request();
        req.extensions_mut()
            .insert(SessionContext::authenticated(record(), "10.0.0.1"));

        let context = SessionContext::extract(&req).await.unwrap();
        assert_eq!(context.username(), Some("alice"));
        assert_eq!(context.client_ip, "10.0.0.1");
    }
}
