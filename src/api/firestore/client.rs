use reqwest::{Method, RequestBuilder, StatusCode};

use super::types::{Document, Fields, ListDocumentsResponse};
use crate::api::error::{error_from_response, ApiError};

const BASE_URL: &str = "https://firestore.googleapis.com/v1";
const PAGE_SIZE: u32 = 300;

/// Document database REST client. Paths are relative to the database root,
/// e.g. `artifacts/{app}/users/{uid}/trades`.
pub struct FirestoreClient {
    documents_url: String,
    http_client: reqwest::Client,
}

impl FirestoreClient {
    pub fn new(project_id: &str) -> Self {
        Self {
            documents_url: format!(
                "{}/projects/{}/databases/(default)/documents",
                BASE_URL, project_id
            ),
            http_client: reqwest::Client::new(),
        }
    }

    fn request(&self, method: Method, path: &str, id_token: &str) -> RequestBuilder {
        self.http_client
            .request(method, format!("{}/{}", self.documents_url, path))
            .bearer_auth(id_token)
    }

    /// Fetch every document in a collection, following page tokens
    pub async fn list_documents(&self, collection: &str, id_token: &str) -> Result<Vec<Document>, ApiError> {
        let mut documents = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut query = vec![("pageSize", PAGE_SIZE.to_string())];
            if let Some(token) = &page_token {
                query.push(("pageToken", token.clone()));
            }

            let response = self
                .request(Method::GET, collection, id_token)
                .query(&query)
                .send()
                .await?;
            if !response.status().is_success() {
                return Err(error_from_response("firestore", response).await);
            }

            let page: ListDocumentsResponse = response.json().await?;
            documents.extend(page.documents);

            match page.next_page_token.filter(|t| !t.is_empty()) {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        log::debug!("Listed {} documents from {}", documents.len(), collection);
        Ok(documents)
    }

    /// Fetch a single document; `None` when it does not exist
    pub async fn get_document(&self, path: &str, id_token: &str) -> Result<Option<Document>, ApiError> {
        let response = self.request(Method::GET, path, id_token).send().await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(error_from_response("firestore", response).await);
        }
        Ok(Some(response.json().await?))
    }

    /// Create a document with a client-chosen id
    pub async fn create_document(
        &self,
        collection: &str,
        document_id: &str,
        fields: Fields,
        id_token: &str,
    ) -> Result<Document, ApiError> {
        let response = self
            .request(Method::POST, collection, id_token)
            .query(&[("documentId", document_id)])
            .json(&Document::with_fields(fields))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(error_from_response("firestore", response).await);
        }
        Ok(response.json().await?)
    }

    /// Write fields to a document.
    ///
    /// With `update_mask`, only the listed fields are written and the document
    /// is created if missing (merge). Without it, the whole document is
    /// replaced and must already exist.
    pub async fn patch_document(
        &self,
        path: &str,
        fields: Fields,
        update_mask: Option<&[&str]>,
        id_token: &str,
    ) -> Result<Document, ApiError> {
        let query: Vec<(&str, &str)> = match update_mask {
            Some(mask) => mask.iter().map(|field| ("updateMask.fieldPaths", *field)).collect(),
            None => vec![("currentDocument.exists", "true")],
        };

        let response = self
            .request(Method::PATCH, path, id_token)
            .query(&query)
            .json(&Document::with_fields(fields))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(precondition_as_not_found(path, error_from_response("firestore", response).await));
        }
        Ok(response.json().await?)
    }

    /// Delete an existing document
    pub async fn delete_document(&self, path: &str, id_token: &str) -> Result<(), ApiError> {
        let response = self
            .request(Method::DELETE, path, id_token)
            .query(&[("currentDocument.exists", "true")])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(precondition_as_not_found(path, error_from_response("firestore", response).await));
        }
        Ok(())
    }
}

/// A failed `currentDocument.exists` precondition means the document is missing
fn precondition_as_not_found(path: &str, err: ApiError) -> ApiError {
    match err {
        ApiError::NotFound(_) => ApiError::NotFound(path.to_string()),
        ApiError::ServiceError { ref code, .. } if code == "400" || code == "409" => {
            ApiError::NotFound(path.to_string())
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_documents_url() {
        let client = FirestoreClient::new("trading-journal");
        assert_eq!(
            client.documents_url,
            "https://firestore.googleapis.com/v1/projects/trading-journal/databases/(default)/documents"
        );
    }

    #[test]
    fn test_precondition_mapping() {
        let err = precondition_as_not_found(
            "a/b",
            ApiError::ServiceError {
                service: "firestore",
                code: "400".to_string(),
                message: "FAILED_PRECONDITION".to_string(),
            },
        );
        assert!(matches!(err, ApiError::NotFound(p) if p == "a/b"));

        let err = precondition_as_not_found("a/b", ApiError::RateLimitError("slow".to_string()));
        assert!(matches!(err, ApiError::RateLimitError(_)));
    }
}
