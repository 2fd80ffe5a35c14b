use crate::error::JournalResult;
use crate::journal::Journal;
use crate::models::{PhotoSource, Profile, ProfileUpdate};

pub async fn set_capital(journal: &mut Journal, capital: f64) -> JournalResult<f64> {
    journal.set_capital(capital).await?;
    log::info!("Baseline capital set to {:.2}", capital);
    Ok(journal.settings().capital)
}

pub async fn add_strategy(journal: &mut Journal, name: &str) -> JournalResult<bool> {
    journal.add_strategy(name).await
}

pub async fn get_profile(journal: &Journal) -> JournalResult<Profile> {
    journal.store().profile().await
}

/// Update display name and/or photo. A photo argument that names an existing
/// file is uploaded (or inlined in demo mode); anything else is used as a URL.
pub async fn update_profile(
    journal: &Journal,
    display_name: Option<String>,
    photo: Option<String>,
) -> JournalResult<Profile> {
    let photo = photo.map(|p| {
        let path = std::path::PathBuf::from(&p);
        if path.is_file() {
            PhotoSource::File(path)
        } else {
            PhotoSource::Url(p)
        }
    });

    journal
        .store()
        .update_profile(ProfileUpdate { display_name, photo })
        .await
}

pub fn render_profile(profile: &Profile) -> String {
    let photo = match profile.photo_url.as_deref() {
        Some(url) if url.starts_with("data:") => "(inline image)",
        Some(url) => url,
        None => "-",
    };
    format!(
        "Name:   {}\nEmail:  {}\nUID:    {}\nPhoto:  {}\n",
        profile.display_name.as_deref().unwrap_or("Trader"),
        profile.email.as_deref().unwrap_or("-"),
        profile.uid,
        photo
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::LocalStore;

    async fn journal() -> Journal {
        Journal::open(Box::new(LocalStore::in_memory().unwrap())).await.unwrap()
    }

    #[tokio::test]
    async fn test_capital_persists() {
        let mut journal = journal().await;
        assert_eq!(set_capital(&mut journal, 75_000.0).await.unwrap(), 75_000.0);
        assert_eq!(journal.store().load_settings().await.unwrap().capital, 75_000.0);
    }

    #[tokio::test]
    async fn test_photo_argument_kinds() {
        let journal = journal().await;

        let profile = update_profile(&journal, None, Some("https://example.com/me.png".to_string()))
            .await
            .unwrap();
        assert_eq!(profile.photo_url.as_deref(), Some("https://example.com/me.png"));

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("me.jpg");
        std::fs::write(&path, [0xFF, 0xD8, 0xFF]).unwrap();
        let profile = update_profile(
            &journal,
            Some("Option Seller".to_string()),
            Some(path.to_string_lossy().into_owned()),
        )
        .await
        .unwrap();

        assert!(profile.photo_url.as_deref().unwrap().starts_with("data:image/jpeg;base64,"));
        let text = render_profile(&profile);
        assert!(text.contains("Name:   Option Seller"));
        assert!(text.contains("Photo:  (inline image)"));
        assert_eq!(get_profile(&journal).await.unwrap(), profile);
    }
}
