use async_trait::async_trait;
use std::fs;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

use super::{StorageMode, TradeStore};
use crate::api::firestore::mapper::{document_to_settings, document_to_trade, settings_to_fields, trade_to_fields};
use crate::api::storage::image_content_type;
use crate::api::{ApiError, AuthClient, AuthSession, FirestoreClient, StorageClient};
use crate::config::JournalConfig;
use crate::error::{JournalError, JournalResult};
use crate::models::{PhotoSource, Profile, ProfileUpdate, Settings, Trade};

const SETTINGS_MASK: [&str; 2] = ["capital", "strategies"];

/// Per-user cloud store. Documents live under `artifacts/{app_id}/users/{uid}`.
pub struct CloudStore {
    app_id: String,
    auth: AuthClient,
    firestore: FirestoreClient,
    storage: Option<StorageClient>,
    session: Mutex<AuthSession>,
    session_path: PathBuf,
}

impl CloudStore {
    /// Resume the persisted session; `NotSignedIn` when there is none
    pub fn from_saved_session(config: &JournalConfig) -> JournalResult<Self> {
        let session_path = config.session_path();
        let session = AuthSession::load(&session_path)?.ok_or(JournalError::NotSignedIn)?;
        Self::new(config, session)
    }

    pub fn new(config: &JournalConfig, session: AuthSession) -> JournalResult<Self> {
        let firebase = config.firebase()?;
        Ok(Self {
            app_id: config.app_id.clone(),
            auth: AuthClient::new(firebase),
            firestore: FirestoreClient::new(&firebase.project_id),
            storage: firebase.storage_bucket.as_deref().map(StorageClient::new),
            session: Mutex::new(session),
            session_path: config.session_path(),
        })
    }

    fn user_root(&self, uid: &str) -> String {
        format!("artifacts/{}/users/{}", self.app_id, uid)
    }

    /// Current uid and a valid ID token, refreshing and persisting the
    /// session when the token is about to expire
    async fn credentials(&self) -> JournalResult<(String, String)> {
        let mut session = self.session.lock().await;
        match self.auth.ensure_fresh(&mut session).await {
            Ok(true) => session.save(&self.session_path)?,
            Ok(false) => {}
            Err(ApiError::SessionExpired) => {
                log::warn!("Session for {} expired", session.uid);
                AuthSession::clear(&self.session_path)?;
                return Err(JournalError::NotSignedIn);
            }
            Err(e) => return Err(e.into()),
        }
        Ok((session.uid.clone(), session.id_token.clone()))
    }

    async fn upload_photo(&self, path: &Path, uid: &str, id_token: &str) -> JournalResult<String> {
        let storage = self.storage.as_ref().ok_or_else(|| {
            JournalError::Config("photo upload needs TRADE_JOURNAL_FIREBASE_STORAGE_BUCKET".to_string())
        })?;
        let bytes = fs::read(path)?;
        let url = storage
            .upload(
                &format!("profile_pictures/{}", uid),
                bytes,
                image_content_type(path),
                id_token,
            )
            .await?;
        Ok(url)
    }
}

/// Document-level not-found becomes a missing trade
fn trade_not_found(id: &str, err: ApiError) -> JournalError {
    match err {
        ApiError::NotFound(_) => JournalError::NotFound(format!("Trade {}", id)),
        other => other.into(),
    }
}

#[async_trait]
impl TradeStore for CloudStore {
    fn mode(&self) -> StorageMode {
        StorageMode::Cloud
    }

    async fn load_trades(&self) -> JournalResult<Vec<Trade>> {
        let (uid, token) = self.credentials().await?;
        let documents = self
            .firestore
            .list_documents(&format!("{}/trades", self.user_root(&uid)), &token)
            .await?;

        let mut trades = Vec::with_capacity(documents.len());
        for doc in &documents {
            match document_to_trade(doc) {
                Ok(trade) => trades.push(trade),
                Err(e) => log::warn!("Skipping unreadable trade document {}: {}", doc.id(), e),
            }
        }
        Ok(trades)
    }

    async fn create_trade(&self, trade: &Trade) -> JournalResult<()> {
        let (uid, token) = self.credentials().await?;
        self.firestore
            .create_document(
                &format!("{}/trades", self.user_root(&uid)),
                &trade.id,
                trade_to_fields(trade),
                &token,
            )
            .await?;
        log::info!("Created trade {}", trade.id);
        Ok(())
    }

    async fn update_trade(&self, trade: &Trade) -> JournalResult<()> {
        let (uid, token) = self.credentials().await?;
        self.firestore
            .patch_document(
                &format!("{}/trades/{}", self.user_root(&uid), trade.id),
                trade_to_fields(trade),
                None,
                &token,
            )
            .await
            .map_err(|e| trade_not_found(&trade.id, e))?;
        log::info!("Updated trade {}", trade.id);
        Ok(())
    }

    async fn delete_trade(&self, id: &str) -> JournalResult<()> {
        let (uid, token) = self.credentials().await?;
        self.firestore
            .delete_document(&format!("{}/trades/{}", self.user_root(&uid), id), &token)
            .await
            .map_err(|e| trade_not_found(id, e))?;
        log::info!("Deleted trade {}", id);
        Ok(())
    }

    async fn load_settings(&self) -> JournalResult<Settings> {
        let (uid, token) = self.credentials().await?;
        let doc = self
            .firestore
            .get_document(&format!("{}/settings/general", self.user_root(&uid)), &token)
            .await?;
        Ok(document_to_settings(doc.as_ref()))
    }

    async fn save_settings(&self, settings: &Settings) -> JournalResult<()> {
        let (uid, token) = self.credentials().await?;
        self.firestore
            .patch_document(
                &format!("{}/settings/general", self.user_root(&uid)),
                settings_to_fields(settings),
                Some(&SETTINGS_MASK[..]),
                &token,
            )
            .await?;
        Ok(())
    }

    async fn profile(&self) -> JournalResult<Profile> {
        Ok(self.session.lock().await.profile())
    }

    async fn update_profile(&self, update: ProfileUpdate) -> JournalResult<Profile> {
        let (uid, token) = self.credentials().await?;
        let photo_url = match update.photo {
            Some(PhotoSource::Url(url)) => Some(url),
            Some(PhotoSource::File(path)) => Some(self.upload_photo(&path, &uid, &token).await?),
            None => None,
        };

        let mut session = self.session.lock().await;
        self.auth
            .update_profile(&mut session, update.display_name.as_deref(), photo_url.as_deref())
            .await?;
        session.save(&self.session_path)?;
        Ok(session.profile())
    }
}
