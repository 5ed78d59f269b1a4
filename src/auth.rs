//! Client for the identity provider (email + password accounts).
//!
//! The provider is an opaque external service; this module covers session
//! lookup, sign-in, sign-up, sign-out and an auth-state subscription. Auth
//! failures are the only errors in the crate that reach the user, so the raw
//! provider messages are translated into Turkish here.

use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::config::RemoteConfig;
use crate::error::{GorevError, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: String,
    pub email: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub user: AuthUser,
}

impl Session {
    /// Greeting name: the registered display name, the mailbox part of the
    /// email address, or the guest fallback.
    pub fn display_name(&self) -> String {
        if let Some(name) = &self.user.name {
            if !name.is_empty() {
                return name.clone();
            }
        }
        if let Some(email) = &self.user.email {
            if let Some(mailbox) = email.split('@').next() {
                if !mailbox.is_empty() {
                    return mailbox.to_string();
                }
            }
        }
        "Misafir".to_string()
    }
}

/// Which persistence medium the session uses, decided once at load time.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionMode {
    Guest,
    Authenticated(Session),
}

impl SessionMode {
    pub fn resolve(session: Option<Session>) -> Self {
        match session {
            Some(session) => SessionMode::Authenticated(session),
            None => SessionMode::Guest,
        }
    }
}

/// Raw user object as the provider returns it; the display name travels in
/// free-form metadata.
#[derive(Debug, Deserialize)]
struct WireUser {
    id: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    user_metadata: serde_json::Value,
}

impl From<WireUser> for AuthUser {
    fn from(wire: WireUser) -> Self {
        let name = wire
            .user_metadata
            .get("name")
            .and_then(|v| v.as_str())
            .map(str::to_string);
        AuthUser {
            id: wire.id,
            email: wire.email,
            name,
        }
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    user: WireUser,
}

pub struct AuthClient {
    http: reqwest::Client,
    base_url: String,
    anon_key: String,
    state: watch::Sender<Option<Session>>,
}

impl AuthClient {
    pub fn new(remote: &RemoteConfig) -> Self {
        let (state, _) = watch::channel(None);
        Self {
            http: reqwest::Client::new(),
            base_url: remote.base_url.trim_end_matches('/').to_string(),
            anon_key: remote.anon_key.clone(),
            state,
        }
    }

    fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.base_url, path)
    }

    /// Subscribe to auth-state changes. The receiver yields the new session
    /// (or `None`) on every sign-in and sign-out; mode selection listens to
    /// this and reloads the task store from the newly relevant medium.
    pub fn subscribe(&self) -> watch::Receiver<Option<Session>> {
        self.state.subscribe()
    }

    pub fn current_session(&self) -> Option<Session> {
        self.state.borrow().clone()
    }

    /// Validate a previously stored access token against the provider and
    /// restore the session it belongs to. An expired or revoked token is not
    /// an error; it just means there is no session.
    pub async fn restore_session(&self, access_token: &str) -> Result<Option<Session>> {
        let response = self
            .http
            .get(self.auth_url("user"))
            .header("apikey", &self.anon_key)
            .bearer_auth(access_token)
            .send()
            .await?;

        if !response.status().is_success() {
            return Ok(None);
        }

        let user: WireUser = response.json().await?;
        let session = Session {
            access_token: access_token.to_string(),
            user: user.into(),
        };
        self.state.send_replace(Some(session.clone()));
        Ok(Some(session))
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Session> {
        let response = self
            .http
            .post(self.auth_url("token"))
            .query(&[("grant_type", "password")])
            .header("apikey", &self.anon_key)
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(auth_error(response).await);
        }

        let token: TokenResponse = response.json().await?;
        let session = Session {
            access_token: token.access_token,
            user: token.user.into(),
        };
        self.state.send_replace(Some(session.clone()));
        Ok(session)
    }

    /// Register a new account. Returns the session when the provider signs
    /// the user straight in, `None` when the account still needs its email
    /// confirmed.
    pub async fn sign_up(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<Option<Session>> {
        let response = self
            .http
            .post(self.auth_url("signup"))
            .header("apikey", &self.anon_key)
            .json(&serde_json::json!({
                "email": email,
                "password": password,
                "data": { "name": name }
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(auth_error(response).await);
        }

        let body: serde_json::Value = response.json().await?;
        if body.get("access_token").is_none() {
            return Ok(None);
        }

        let token: TokenResponse = serde_json::from_value(body)?;
        let session = Session {
            access_token: token.access_token,
            user: token.user.into(),
        };
        self.state.send_replace(Some(session.clone()));
        Ok(Some(session))
    }

    /// End the current session. Provider-side failures are logged and
    /// otherwise ignored; the local session is cleared regardless.
    pub async fn sign_out(&self) {
        if let Some(session) = self.current_session() {
            let result = self
                .http
                .post(self.auth_url("logout"))
                .header("apikey", &self.anon_key)
                .bearer_auth(&session.access_token)
                .send()
                .await;
            if let Err(e) = result {
                tracing::warn!(error = %e, "sign-out request failed");
            }
        }
        self.state.send_replace(None);
    }
}

/// Pull the provider's error message out of a failed response and translate
/// it for display.
async fn auth_error(response: reqwest::Response) -> GorevError {
    let body: serde_json::Value = response.json().await.unwrap_or_default();
    let raw = body
        .get("error_description")
        .or_else(|| body.get("msg"))
        .or_else(|| body.get("message"))
        .and_then(|v| v.as_str())
        .unwrap_or("Bilinmeyen bir hata oluştu.");

    GorevError::Auth {
        message: translate_auth_error(raw),
    }
}

/// Map the provider's known English messages to the Turkish strings shown in
/// the UI. Unknown messages pass through untranslated.
pub fn translate_auth_error(message: &str) -> String {
    if message.contains("Invalid login credentials") {
        return "E-posta veya şifre hatalı.".to_string();
    }
    if message.contains("User already registered") {
        return "Bu e-posta adresi zaten kayıtlı.".to_string();
    }
    if message.contains("Password should be at least") {
        return "Şifre en az 6 karakter olmalı.".to_string();
    }
    if message.contains("Email not confirmed") {
        return "Lütfen e-posta adresinizi doğrulayın.".to_string();
    }
    if message.contains("For security purposes, you can only request this after") {
        let seconds = message
            .split_whitespace()
            .find_map(|word| word.parse::<u32>().ok())
            .unwrap_or(0);
        return format!(
            "Güvenlik nedeniyle, lütfen {} saniye bekleyip tekrar deneyin.",
            seconds
        );
    }
    message.to_string()
}
