//! Client for the remote files API.
//!
//! Directory renames are pushed to the remote service rather than written to
//! the local catalog; the next full reconciliation picks up the result. The
//! trait seam exists so the propagator can be driven by a mock in tests.

use crate::error::{CuratorError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Remote view of one catalogued file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteFileDetail {
    pub id: i64,
    pub directory_name: String,
    pub file_name: String,
}

/// One directory change for one file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryChangeRequest {
    pub old_directory_name: String,
    pub new_directory_name: String,
    pub file_name: String,
}

#[async_trait]
pub trait MetadataApi: Send + Sync {
    /// Fetch the remote detail for a file by catalog id.
    async fn file_detail(&self, id: i64) -> Result<RemoteFileDetail>;

    /// Push a directory change for one file.
    async fn update_directory(&self, change: &DirectoryChangeRequest) -> Result<()>;
}

/// HTTP implementation of [`MetadataApi`].
#[derive(Clone)]
pub struct FilesApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl FilesApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            http: reqwest::Client::new(),
            base_url,
        }
    }
}

#[async_trait]
impl MetadataApi for FilesApiClient {
    async fn file_detail(&self, id: i64) -> Result<RemoteFileDetail> {
        let url = format!("{}/files/{id}", self.base_url);
        debug!(%url, "Fetching remote file detail");

        let response = self.http.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(CuratorError::api_rejected(format!(
                "GET {url}: {}",
                response.status()
            )));
        }
        Ok(response.json().await?)
    }

    async fn update_directory(&self, change: &DirectoryChangeRequest) -> Result<()> {
        let url = format!("{}/files/directory", self.base_url);
        debug!(%url, file = %change.file_name, "Pushing directory change");

        let response = self.http.put(&url).json(change).send().await?;
        if !response.status().is_success() {
            return Err(CuratorError::api_rejected(format!(
                "PUT {url}: {}",
                response.status()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_slash_is_trimmed() {
        let client = FilesApiClient::new("http://localhost:5000/");
        assert_eq!(client.base_url, "http://localhost:5000");
    }

    #[test]
    fn directory_change_serializes_camel_case() {
        let change = DirectoryChangeRequest {
            old_directory_name: "/a".to_string(),
            new_directory_name: "/b".to_string(),
            file_name: "x.jpg".to_string(),
        };
        let json = serde_json::to_value(&change).unwrap();
        assert_eq!(json["oldDirectoryName"], "/a");
        assert_eq!(json["newDirectoryName"], "/b");
        assert_eq!(json["fileName"], "x.jpg");
    }
}
