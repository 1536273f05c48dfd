/// Session establishment and re-authentication
use std::sync::Arc;
use std::time::Duration;

use reqwest::Method;
use serde_json::Value;
use tokio::sync::{Mutex, RwLock};
use tracing::{info, warn};

use crate::broker::endpoints::{self, LOGIN_URL, TWOFA_URL};
use crate::broker::token_store::TokenStore;
use crate::broker::totp;
use crate::broker::transport::{Payload, Transport};
use crate::error::{KiteError, Result};
use crate::types::Session;

/// Pause between the password and two-factor posts. Unconditional, the
/// two-factor endpoint rejects back-to-back submissions.
const TWOFA_DELAY: Duration = Duration::from_secs(1);

/// Owns the authentication state machine: cached token adoption, validity
/// probing, and the full password + TOTP login.
///
/// The in-memory session is shared with the transport, which injects the
/// bearer header from it. Concurrent callers are collapsed into a single
/// login by the guard; the last process to write the token file still wins
/// across processes.
pub struct SessionManager<T: Transport> {
    transport: Arc<T>,
    session: Arc<RwLock<Session>>,
    token_store: TokenStore,
    user_id: String,
    password: String,
    totp_secret: String,
    login_guard: Mutex<()>,
}

impl<T: Transport> SessionManager<T> {
    pub fn new(
        transport: Arc<T>,
        session: Arc<RwLock<Session>>,
        token_store: TokenStore,
        user_id: String,
        password: String,
        totp_secret: String,
    ) -> Self {
        SessionManager {
            transport,
            session,
            token_store,
            user_id,
            password,
            totp_secret,
            login_guard: Mutex::new(()),
        }
    }

    /// Make sure a usable session token is in memory.
    ///
    /// An already-adopted token is assumed valid for the process lifetime.
    /// Otherwise the stored token is adopted and probed with a margins
    /// call; a failed probe or an empty store drives a full login.
    pub async fn ensure_session(&self) -> Result<()> {
        if self.session.read().await.is_authenticated() {
            return Ok(());
        }

        let _guard = self.login_guard.lock().await;

        // Another caller may have finished logging in while we waited.
        if self.session.read().await.is_authenticated() {
            return Ok(());
        }

        if let Some(stored) = self.token_store.load().await {
            {
                let mut session = self.session.write().await;
                *session = stored;
            }
            match self.probe().await {
                Ok(()) => {
                    info!("Cached session token accepted");
                    return Ok(());
                }
                Err(e) => {
                    warn!(code = e.error_code(), "Cached session token rejected: {}", e);
                    self.session.write().await.enctoken.clear();
                }
            }
        }

        info!("Generating new session");
        self.login_locked().await
    }

    /// Full password + two-factor login, replacing any stored token.
    pub async fn login(&self) -> Result<()> {
        let _guard = self.login_guard.lock().await;
        self.login_locked().await
    }

    async fn login_locked(&self) -> Result<()> {
        let login_form = vec![
            ("user_id".to_string(), self.user_id.clone()),
            ("password".to_string(), self.password.clone()),
        ];
        let login_data = self
            .transport
            .request(Method::POST, LOGIN_URL, Payload::Form(login_form))
            .await?;

        let request_id = login_data
            .get("request_id")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                KiteError::AuthenticationFailed("No request_id in login response".to_string())
            })?
            .to_string();

        let twofa_value = totp::generate(&self.totp_secret)?;

        tokio::time::sleep(TWOFA_DELAY).await;

        let twofa_form = vec![
            ("user_id".to_string(), self.user_id.clone()),
            ("request_id".to_string(), request_id),
            ("twofa_value".to_string(), twofa_value),
        ];
        let raw = self
            .transport
            .request_raw(Method::POST, TWOFA_URL, Payload::Form(twofa_form))
            .await?;

        if raw.status != 200 {
            return Err(KiteError::AuthenticationFailed(format!(
                "Two-factor step rejected with status {}",
                raw.status
            )));
        }

        let enctoken = extract_enctoken(&raw.set_cookies).ok_or_else(|| {
            KiteError::AuthenticationFailed(
                "No enctoken cookie in two-factor response".to_string(),
            )
        })?;

        let session = Session { enctoken };
        self.token_store.save(&session).await?;
        *self.session.write().await = session;

        info!("Login successful");
        Ok(())
    }

    /// Any successful authenticated call validates a token; margins is the
    /// cheapest endpoint for it.
    async fn probe(&self) -> Result<()> {
        self.transport
            .request(
                Method::GET,
                &endpoints::resolve(endpoints::USER_MARGINS, &[]),
                Payload::None,
            )
            .await
            .map(|_| ())
    }
}

/// Pull the token out of the two-factor Set-Cookie headers: the value of
/// the `enctoken` cookie up to the first `;`.
fn extract_enctoken(cookies: &[String]) -> Option<String> {
    cookies
        .iter()
        .find(|c| c.starts_with("enctoken"))
        .and_then(|c| c.split(';').next())
        .map(|c| c.trim_start_matches("enctoken=").to_string())
        .filter(|token| !token.is_empty())
}
