use std::collections::HashMap;

use actix_web::cookie::{time::Duration as CookieDuration, Cookie, SameSite};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rand::distr::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::domain::error::AppError;
use crate::infrastructure::config::SessionConfig;

const TOKEN_TYPE: &str = "session";
const SESSION_ID_LENGTH: usize = 32;
const MAX_SESSION_AGE_SECS: i64 = 60 * 60 * 24 * 365 * 100;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // Username
    pub sid: String, // Server-side session id
    pub exp: i64,
    pub iat: i64,
    pub typ: String,
}

/// Server-side half of a login session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRecord {
    pub id: String,
    pub username: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl SessionRecord {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// A freshly established session and the token handed to the client.
#[derive(Debug, Clone)]
pub struct IssuedSession {
    pub record: SessionRecord,
    pub token: String,
}

/// Issues, resolves and destroys login sessions.
///
/// The client holds an HS256 token naming the session id; the session
/// itself lives here, so destroying it revokes the token immediately.
/// Sessions do not survive a restart.
pub struct SessionManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    config: SessionConfig,
    sessions: RwLock<HashMap<String, SessionRecord>>,
}

impl SessionManager {
    pub fn new(secret_key: &str, config: SessionConfig) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret_key.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret_key.as_bytes()),
            config,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Generate a secure signing key
    pub fn generate_secret_key() -> String {
        let mut rng = rand::rng();
        let bytes: [u8; 64] = rng.random(); // 512-bit secret
        hex::encode(bytes)
    }

    fn generate_session_id() -> String {
        rand::rng()
            .sample_iter(&Alphanumeric)
            .take(SESSION_ID_LENGTH)
            .map(char::from)
            .collect()
    }

    pub fn cookie_name(&self) -> &str {
        &self.config.cookie_name
    }

    pub fn session_age(&self) -> Duration {
        let secs = i64::try_from(self.config.cookie_age).unwrap_or(MAX_SESSION_AGE_SECS);
        Duration::seconds(secs.min(MAX_SESSION_AGE_SECS))
    }

    pub async fn create(&self, username: &str) -> Result<IssuedSession, AppError> {
        let now = Utc::now();
        let record = SessionRecord {
            id: Self::generate_session_id(),
            username: username.to_string(),
            created_at: now,
            expires_at: now + self.session_age(),
        };

        let claims = Claims {
            sub: record.username.clone(),
            sid: record.id.clone(),
            exp: record.expires_at.timestamp(),
            iat: now.timestamp(),
            typ: TOKEN_TYPE.to_string(),
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)?;

        self.sessions
            .write()
            .await
            .insert(record.id.clone(), record.clone());
        tracing::debug!(username, "Session established");

        Ok(IssuedSession { record, token })
    }

    fn decode_claims(&self, token: &str) -> Option<Claims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        let claims = decode::<Claims>(token, &self.decoding_key, &validation)
            .ok()?
            .claims;
        (claims.typ == TOKEN_TYPE).then_some(claims)
    }

    /// The live session a token refers to.
    ///
    /// Bad signatures, expired tokens, unknown session ids and a subject that
    /// does not match the stored session all resolve to `None`. An expired
    /// stored session is dropped on the way.
    pub async fn resolve(&self, token: &str) -> Option<SessionRecord> {
        let claims = self.decode_claims(token)?;
        let now = Utc::now();

        let record = self.sessions.read().await.get(&claims.sid).cloned()?;
        if record.is_expired(now) {
            self.sessions.write().await.remove(&claims.sid);
            return None;
        }
        (record.username == claims.sub).then_some(record)
    }

    /// Returns true when a session was removed.
    pub async fn destroy(&self, session_id: &str) -> bool {
        self.sessions.write().await.remove(session_id).is_some()
    }

    pub async fn purge_expired(&self) -> usize {
        let now = Utc::now();
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, record| !record.is_expired(now));
        before - sessions.len()
    }

    pub async fn active_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub fn session_cookie(&self, token: &str) -> Cookie<'static> {
        Cookie::build(self.config.cookie_name.clone(), token.to_string())
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(self.config.cookie_secure)
            .max_age(CookieDuration::seconds(self.session_age().num_seconds()))
            .finish()
    }

    pub fn removal_cookie(&self) -> Cookie<'static> {
        let mut cookie = Cookie::build(self.config.cookie_name.clone(), "")
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .finish();
        cookie.make_removal();
        cookie
    }
}
