use std::time::Duration;

use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue, USER_AGENT};
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::error::GalleryError;
use crate::store::{FileMap, FileStore};

pub const DEFAULT_API_BASE: &str = "https://www.googleapis.com/drive/v3";

const LIST_FIELDS: &str = "nextPageToken, files(id, name)";
const PAGE_SIZE: &str = "1000";

#[derive(Debug, Deserialize)]
struct FileListPage {
    #[serde(default)]
    files: Vec<DriveFile>,
    #[serde(rename = "nextPageToken")]
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DriveFile {
    id: String,
    name: String,
}

#[derive(Clone)]
pub struct DriveHttpClient {
    client: Client,
    api_base: String,
    token: Option<String>,
}

impl DriveHttpClient {
    pub fn new(api_base: &str, token: Option<String>) -> Result<Self, GalleryError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("chart-gallery/{}", env!("CARGO_PKG_VERSION")))
                .map_err(|err| GalleryError::StoreHttp(err.to_string()))?,
        );
        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|err| GalleryError::StoreHttp(err.to_string()))?;
        Ok(Self {
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
            token: token.filter(|value| !value.trim().is_empty()),
        })
    }

    fn authorized(&self, request: RequestBuilder) -> Result<RequestBuilder, GalleryError> {
        let token = self.token.as_deref().ok_or_else(|| {
            GalleryError::Authentication("no access token configured for Google Drive".to_string())
        })?;
        let value = HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|err| GalleryError::Authentication(err.to_string()))?;
        Ok(request.header(AUTHORIZATION, value))
    }

    fn handle_status(response: Response) -> Result<Response, GalleryError> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status().as_u16();
        let message = response
            .text()
            .unwrap_or_else(|_| "Drive request failed".to_string());
        if status == 401 || status == 403 {
            return Err(GalleryError::Authentication(format!(
                "Drive returned status {status}: {message}"
            )));
        }
        Err(GalleryError::StoreStatus { status, message })
    }

    fn send(&self, request: RequestBuilder) -> Result<Response, GalleryError> {
        let response = self
            .authorized(request)?
            .send()
            .map_err(|err| GalleryError::StoreHttp(err.to_string()))?;
        Self::handle_status(response)
    }
}

impl FileStore for DriveHttpClient {
    fn list(&self, folder: &str) -> Result<FileMap, GalleryError> {
        let url = format!("{}/files", self.api_base);
        let query = format!(
            "'{}' in parents and trashed=false",
            folder.replace('\'', "\\'")
        );
        let mut files = FileMap::new();
        let mut page_token: Option<String> = None;
        let mut pages = 0usize;

        loop {
            let mut request = self.client.get(&url).query(&[
                ("q", query.as_str()),
                ("fields", LIST_FIELDS),
                ("pageSize", PAGE_SIZE),
            ]);
            if let Some(token) = &page_token {
                request = request.query(&[("pageToken", token.as_str())]);
            }
            let page: FileListPage = self
                .send(request)?
                .json()
                .map_err(|err| GalleryError::StoreHttp(err.to_string()))?;
            pages += 1;
            for file in page.files {
                files.insert(file.name, file.id);
            }
            match page.next_page_token {
                Some(next) if !next.is_empty() && page_token.as_deref() != Some(next.as_str()) => {
                    page_token = Some(next)
                }
                Some(next) if !next.is_empty() => {
                    warn!(folder, token = %next, "Drive repeated a page token, stopping");
                    break;
                }
                _ => break,
            }
        }

        info!(folder, files = files.len(), pages, "listed Drive folder");
        Ok(files)
    }

    fn fetch(&self, id: &str) -> Result<Vec<u8>, GalleryError> {
        let url = format!("{}/files/{}", self.api_base, id);
        let request = self.client.get(&url).query(&[("alt", "media")]);
        let bytes = self
            .send(request)?
            .bytes()
            .map_err(|err| GalleryError::StoreHttp(err.to_string()))?;
        debug!(id, bytes = bytes.len(), "downloaded Drive file");
        Ok(bytes.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn missing_token_is_an_authentication_error() {
        let client = DriveHttpClient::new(DEFAULT_API_BASE, Some("  ".to_string())).unwrap();
        assert_matches!(client.list("folder"), Err(GalleryError::Authentication(_)));
        assert_matches!(client.fetch("file"), Err(GalleryError::Authentication(_)));
    }

    #[test]
    fn page_without_token_ends_listing() {
        let page: FileListPage =
            serde_json::from_str(r#"{"files":[{"id":"1","name":"a.png"}]}"#).unwrap();
        assert_eq!(page.files.len(), 1);
        assert!(page.next_page_token.is_none());
    }
}
