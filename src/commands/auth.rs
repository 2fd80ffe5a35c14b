use crate::api::{AuthClient, AuthSession};
use crate::config::JournalConfig;
use crate::error::JournalResult;
use crate::models::Profile;

pub async fn login(config: &JournalConfig, email: &str, password: &str) -> JournalResult<Profile> {
    let client = AuthClient::new(config.firebase()?);
    let session = client.sign_in(email.trim(), password).await?;

    config.ensure_data_dir()?;
    session.save(&config.session_path())?;
    Ok(session.profile())
}

pub async fn signup(
    config: &JournalConfig,
    display_name: &str,
    email: &str,
    password: &str,
) -> JournalResult<Profile> {
    let client = AuthClient::new(config.firebase()?);
    let session = client.sign_up(display_name.trim(), email.trim(), password).await?;

    config.ensure_data_dir()?;
    session.save(&config.session_path())?;
    Ok(session.profile())
}

/// Forget the saved session. Returns false when nobody was signed in.
pub fn logout(config: &JournalConfig) -> JournalResult<bool> {
    let path = config.session_path();
    let signed_in = AuthSession::load(&path)?.is_some();
    AuthSession::clear(&path)?;
    if signed_in {
        log::info!("Signed out");
    }
    Ok(signed_in)
}
