use serde::Deserialize;
use std::path::Path;

use super::error::{error_from_response, ApiError};

const BASE_URL: &str = "https://firebasestorage.googleapis.com/v0/b";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UploadResponse {
    name: String,
    download_tokens: Option<String>,
}

/// Blob storage client for profile pictures
pub struct StorageClient {
    bucket: String,
    http_client: reqwest::Client,
}

impl StorageClient {
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            http_client: reqwest::Client::new(),
        }
    }

    /// Upload bytes to `object_path` and return a public download URL
    pub async fn upload(
        &self,
        object_path: &str,
        bytes: Vec<u8>,
        content_type: &str,
        id_token: &str,
    ) -> Result<String, ApiError> {
        let size = bytes.len();
        let response = self
            .http_client
            .post(format!("{}/{}/o", BASE_URL, self.bucket))
            .query(&[("uploadType", "media"), ("name", object_path)])
            .header("Authorization", format!("Firebase {}", id_token))
            .header("Content-Type", content_type)
            .body(bytes)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(error_from_response("storage", response).await);
        }

        let uploaded: UploadResponse = response.json().await?;
        log::info!("Uploaded {} ({} bytes)", uploaded.name, size);
        Ok(self.download_url(&uploaded.name, uploaded.download_tokens.as_deref()))
    }

    pub fn download_url(&self, object_path: &str, token: Option<&str>) -> String {
        let mut url = format!(
            "{}/{}/o/{}?alt=media",
            BASE_URL,
            self.bucket,
            encode_object_path(object_path)
        );
        // Several tokens may be comma-separated; any one grants access
        if let Some(token) = token.and_then(|t| t.split(',').next()) {
            url.push_str("&token=");
            url.push_str(token);
        }
        url
    }
}

/// Image MIME type from a file extension
pub fn image_content_type(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("svg") => "image/svg+xml",
        _ => "application/octet-stream",
    }
}

fn encode_object_path(path: &str) -> String {
    let mut encoded = String::with_capacity(path.len());
    for byte in path.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                encoded.push(byte as char)
            }
            _ => encoded.push_str(&format!("%{:02X}", byte)),
        }
    }
    encoded
}
