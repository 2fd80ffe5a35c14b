use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fs;
use std::path::Path;

use super::error::{error_from_response, ApiError};
use crate::config::FirebaseConfig;
use crate::models::Profile;

const IDENTITY_URL: &str = "https://identitytoolkit.googleapis.com/v1";
const TOKEN_URL: &str = "https://securetoken.googleapis.com/v1/token";
/// Refresh this many seconds before the token actually expires
const EXPIRY_MARGIN_SECS: i64 = 60;

/// Signed-in user, persisted between runs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthSession {
    pub uid: String,
    pub id_token: String,
    pub refresh_token: String,
    pub expires_at: i64, // Unix seconds
    pub email: Option<String>,
    pub display_name: Option<String>,
    pub photo_url: Option<String>,
}

impl AuthSession {
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() + EXPIRY_MARGIN_SECS >= self.expires_at
    }

    pub fn profile(&self) -> Profile {
        Profile {
            uid: self.uid.clone(),
            display_name: self.display_name.clone(),
            email: self.email.clone(),
            photo_url: self.photo_url.clone(),
        }
    }

    pub fn load(path: &Path) -> Result<Option<Self>, ApiError> {
        if !path.exists() {
            return Ok(None);
        }
        let data = fs::read(path)
            .map_err(|e| ApiError::ParseError(format!("Failed to read session: {}", e)))?;
        Ok(Some(serde_json::from_slice(&data)?))
    }

    pub fn save(&self, path: &Path) -> Result<(), ApiError> {
        let data = serde_json::to_vec_pretty(self)?;
        fs::write(path, data)
            .map_err(|e| ApiError::ParseError(format!("Failed to write session: {}", e)))
    }

    pub fn clear(path: &Path) -> Result<(), ApiError> {
        if path.exists() {
            fs::remove_file(path)
                .map_err(|e| ApiError::ParseError(format!("Failed to remove session: {}", e)))?;
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignInResponse {
    local_id: String,
    id_token: String,
    refresh_token: String,
    expires_in: String,
    email: Option<String>,
    display_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RefreshResponse {
    id_token: String,
    refresh_token: String,
    expires_in: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccountInfo {
    email: Option<String>,
    display_name: Option<String>,
    photo_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LookupResponse {
    #[serde(default)]
    users: Vec<AccountInfo>,
}

/// Email/password identity provider client
pub struct AuthClient {
    api_key: String,
    http_client: reqwest::Client,
}

impl AuthClient {
    pub fn new(config: &FirebaseConfig) -> Self {
        Self {
            api_key: config.api_key.clone(),
            http_client: reqwest::Client::new(),
        }
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, ApiError> {
        let response: SignInResponse = self
            .post_identity(
                "accounts:signInWithPassword",
                json!({ "email": email, "password": password, "returnSecureToken": true }),
            )
            .await?;

        let mut session = session_from_sign_in(response)?;
        // Sign-in does not return the photo URL
        if let Some(info) = self.lookup(&session.id_token).await? {
            session.photo_url = info.photo_url;
            session.display_name = info.display_name.or(session.display_name);
        }

        log::info!("Signed in as {}", session.uid);
        Ok(session)
    }

    pub async fn sign_up(
        &self,
        display_name: &str,
        email: &str,
        password: &str,
    ) -> Result<AuthSession, ApiError> {
        let response: SignInResponse = self
            .post_identity(
                "accounts:signUp",
                json!({ "email": email, "password": password, "returnSecureToken": true }),
            )
            .await?;

        let mut session = session_from_sign_in(response)?;
        self.update_profile(&mut session, Some(display_name), None).await?;

        log::info!("Created account {}", session.uid);
        Ok(session)
    }

    /// Exchange the refresh token for a new ID token
    pub async fn refresh(&self, session: &mut AuthSession) -> Result<(), ApiError> {
        let response = self
            .http_client
            .post(format!("{}?key={}", TOKEN_URL, self.api_key))
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", session.refresh_token.as_str()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(match error_from_response("auth", response).await {
                ApiError::ServiceError { .. } | ApiError::AuthenticationError(_) => ApiError::SessionExpired,
                other => other,
            });
        }

        let refreshed: RefreshResponse = response.json().await?;
        session.id_token = refreshed.id_token;
        session.refresh_token = refreshed.refresh_token;
        session.expires_at = expiry_from(&refreshed.expires_in)?;

        log::debug!("Refreshed ID token for {}", session.uid);
        Ok(())
    }

    /// Refresh the session only when its token is about to expire
    pub async fn ensure_fresh(&self, session: &mut AuthSession) -> Result<bool, ApiError> {
        if !session.is_expired() {
            return Ok(false);
        }
        self.refresh(session).await?;
        Ok(true)
    }

    pub async fn update_profile(
        &self,
        session: &mut AuthSession,
        display_name: Option<&str>,
        photo_url: Option<&str>,
    ) -> Result<(), ApiError> {
        let mut body = json!({ "idToken": session.id_token, "returnSecureToken": false });
        if let Some(name) = display_name {
            body["displayName"] = json!(name);
        }
        if let Some(url) = photo_url {
            body["photoUrl"] = json!(url);
        }

        let info: AccountInfo = self.post_identity("accounts:update", body).await?;
        session.display_name = info.display_name.or(session.display_name.take());
        session.photo_url = info.photo_url.or(session.photo_url.take());
        session.email = info.email.or(session.email.take());
        Ok(())
    }

    async fn lookup(&self, id_token: &str) -> Result<Option<AccountInfo>, ApiError> {
        let response: LookupResponse = self
            .post_identity("accounts:lookup", json!({ "idToken": id_token }))
            .await?;
        Ok(response.users.into_iter().next())
    }

    async fn post_identity<T: serde::de::DeserializeOwned>(
        &self,
        endpoint: &str,
        body: serde_json::Value,
    ) -> Result<T, ApiError> {
        let response = self
            .http_client
            .post(format!("{}/{}?key={}", IDENTITY_URL, endpoint, self.api_key))
            .json(&body)
            .send()
            .await?;

        if response.status().is_success() {
            return Ok(response.json().await?);
        }

        // Bad credentials come back as 400 with codes like INVALID_LOGIN_CREDENTIALS
        Err(match error_from_response("auth", response).await {
            ApiError::ServiceError { code, message, .. } if code == "400" => {
                ApiError::AuthenticationError(message)
            }
            other => other,
        })
    }
}

fn session_from_sign_in(response: SignInResponse) -> Result<AuthSession, ApiError> {
    Ok(AuthSession {
        expires_at: expiry_from(&response.expires_in)?,
        uid: response.local_id,
        id_token: response.id_token,
        refresh_token: response.refresh_token,
        email: response.email,
        display_name: response.display_name.filter(|n| !n.is_empty()),
        photo_url: None,
    })
}

fn expiry_from(expires_in: &str) -> Result<i64, ApiError> {
    let secs: i64 = expires_in
        .parse()
        .map_err(|_| ApiError::ParseError(format!("Invalid expiresIn: {}", expires_in)))?;
    Ok(Utc::now().timestamp() + secs)
}
