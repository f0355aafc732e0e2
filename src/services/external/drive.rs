use anyhow::{anyhow, Context};
use async_trait::async_trait;
use chrono::Utc;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::{header, Client, ClientBuilder};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, OnceCell};
use uuid::Uuid;

use crate::{
    config::Settings,
    error::ApiError,
    services::mirror_service::{CloudMirror, MirrorOutcome},
};

const DRIVE_SCOPE: &str = "https://www.googleapis.com/auth/drive.file";
const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const DEFAULT_UPLOAD_URL: &str =
    "https://www.googleapis.com/upload/drive/v3/files?uploadType=multipart&fields=id";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const UPLOAD_MIME_TYPE: &str = "image/jpeg";

/// Tokens are refreshed this long before Google says they expire
const TOKEN_EXPIRY_MARGIN: Duration = Duration::from_secs(60);

/// Google Drive mirror configuration
#[derive(Debug, Clone)]
pub struct DriveConfig {
    /// Path of the service-account JSON key file
    pub credentials_path: Option<PathBuf>,
    /// Destination folder for uploaded files
    pub folder_id: Option<String>,
    /// Multipart upload endpoint
    pub upload_url: String,
    pub request_timeout: Duration,
}

impl DriveConfig {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            credentials_path: settings.google_service_account_json.as_ref().map(PathBuf::from),
            folder_id: settings.google_drive_folder_id.clone(),
            ..Self::default()
        }
    }
}

impl Default for DriveConfig {
    fn default() -> Self {
        Self {
            credentials_path: None,
            folder_id: None,
            upload_url: DEFAULT_UPLOAD_URL.to_string(),
            request_timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ServiceAccountKey {
    client_email: String,
    private_key: String,
    #[serde(default)]
    token_uri: Option<String>,
}

struct DriveCredentials {
    client_email: String,
    token_uri: String,
    key: EncodingKey,
    folder_id: String,
}

#[derive(Serialize)]
struct JwtClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: u64,
}

fn default_expires_in() -> u64 {
    3600
}

#[derive(Deserialize)]
struct UploadResponse {
    id: String,
}

struct AccessToken {
    value: String,
    refresh_at: Instant,
}

/// Uploads photos to a Google Drive folder with a service account.
///
/// Credentials are loaded once, on first use. If the key file or folder is
/// not configured, or the key cannot be loaded, the mirror stays disabled for
/// the life of the process.
pub struct DriveMirror {
    config: DriveConfig,
    client: Client,
    credentials: OnceCell<Option<DriveCredentials>>,
    token: Mutex<Option<AccessToken>>,
}

impl DriveMirror {
    pub fn new(config: DriveConfig) -> Result<Self, ApiError> {
        let client = ClientBuilder::new()
            .timeout(config.request_timeout)
            .user_agent(concat!("trenchsight-backend/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ApiError::internal(format!("Failed to build Drive client: {}", e)))?;

        Ok(Self {
            config,
            client,
            credentials: OnceCell::new(),
            token: Mutex::new(None),
        })
    }

    pub fn from_settings(settings: &Settings) -> Result<Self, ApiError> {
        Self::new(DriveConfig::from_settings(settings))
    }

    /// Whether initialization has run and produced usable credentials.
    pub fn is_enabled(&self) -> bool {
        matches!(self.credentials.get(), Some(Some(_)))
    }

    async fn credentials(&self) -> Option<&DriveCredentials> {
        self.credentials
            .get_or_init(|| self.load_credentials())
            .await
            .as_ref()
    }

    async fn load_credentials(&self) -> Option<DriveCredentials> {
        let (path, folder_id) = match (&self.config.credentials_path, &self.config.folder_id) {
            (Some(path), Some(folder_id)) => (path, folder_id),
            _ => {
                tracing::info!("Google Drive mirror not configured, uploads stay local");
                return None;
            }
        };

        match read_credentials(path, folder_id).await {
            Ok(credentials) => {
                tracing::info!(
                    client_email = %credentials.client_email,
                    "Google Drive mirror enabled"
                );
                Some(credentials)
            }
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %format!("{:#}", e),
                    "Google Drive credentials unusable, mirror disabled"
                );
                None
            }
        }
    }

    async fn access_token(&self, credentials: &DriveCredentials) -> anyhow::Result<String> {
        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref() {
            if Instant::now() < token.refresh_at {
                return Ok(token.value.clone());
            }
        }

        let now = Utc::now().timestamp();
        let claims = JwtClaims {
            iss: &credentials.client_email,
            scope: DRIVE_SCOPE,
            aud: &credentials.token_uri,
            iat: now,
            exp: now + 3600,
        };
        let assertion = jsonwebtoken::encode(&Header::new(Algorithm::RS256), &claims, &credentials.key)
            .context("failed to sign token request")?;

        let response: TokenResponse = self
            .client
            .post(&credentials.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await
            .context("token request failed")?
            .error_for_status()
            .context("token request rejected")?
            .json()
            .await
            .context("malformed token response")?;

        let lifetime = Duration::from_secs(response.expires_in).saturating_sub(TOKEN_EXPIRY_MARGIN);
        *cached = Some(AccessToken {
            value: response.access_token.clone(),
            refresh_at: Instant::now() + lifetime,
        });

        Ok(response.access_token)
    }

    async fn upload(
        &self,
        credentials: &DriveCredentials,
        display_name: &str,
        local_path: &Path,
    ) -> anyhow::Result<String> {
        let bytes = tokio::fs::read(local_path)
            .await
            .with_context(|| format!("failed to read {}", local_path.display()))?;
        let token = self.access_token(credentials).await?;

        let metadata = json!({
            "name": display_name,
            "parents": [credentials.folder_id],
        });
        let boundary = format!("trenchsight-{}", Uuid::new_v4().simple());
        let body = multipart_related_body(&boundary, &metadata, UPLOAD_MIME_TYPE, &bytes);

        let response = self
            .client
            .post(&self.config.upload_url)
            .bearer_auth(token)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/related; boundary={}", boundary),
            )
            .body(body)
            .send()
            .await
            .context("upload request failed")?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(anyhow!("upload rejected with {}: {}", status, truncate(&detail, 200)));
        }

        let uploaded: UploadResponse = response.json().await.context("malformed upload response")?;
        Ok(uploaded.id)
    }
}

#[async_trait]
impl CloudMirror for DriveMirror {
    async fn upload_file(&self, display_name: &str, local_path: &Path) -> MirrorOutcome {
        let Some(credentials) = self.credentials().await else {
            return MirrorOutcome::Disabled;
        };

        match self.upload(credentials, display_name, local_path).await {
            Ok(file_id) => {
                tracing::info!(file = %display_name, drive_file_id = %file_id, "photo mirrored to Google Drive");
                MirrorOutcome::Uploaded(file_id)
            }
            Err(e) => {
                let reason = format!("{:#}", e);
                tracing::warn!(file = %display_name, error = %reason, "Google Drive upload failed");
                MirrorOutcome::Failed(reason)
            }
        }
    }
}

async fn read_credentials(path: &Path, folder_id: &str) -> anyhow::Result<DriveCredentials> {
    let raw = tokio::fs::read(path).await.context("failed to read key file")?;
    let key: ServiceAccountKey = serde_json::from_slice(&raw).context("malformed key file")?;
    let encoding_key =
        EncodingKey::from_rsa_pem(key.private_key.as_bytes()).context("invalid private key")?;

    Ok(DriveCredentials {
        client_email: key.client_email,
        token_uri: key.token_uri.unwrap_or_else(|| DEFAULT_TOKEN_URI.to_string()),
        key: encoding_key,
        folder_id: folder_id.to_string(),
    })
}

fn multipart_related_body(
    boundary: &str,
    metadata: &serde_json::Value,
    mime_type: &str,
    content: &[u8],
) -> Vec<u8> {
    let metadata = metadata.to_string();
    let mut body = Vec::with_capacity(content.len() + metadata.len() + 4 * boundary.len() + 128);
    body.extend_from_slice(
        format!("--{}\r\nContent-Type: application/json; charset=UTF-8\r\n\r\n", boundary).as_bytes(),
    );
    body.extend_from_slice(metadata.as_bytes());
    body.extend_from_slice(format!("\r\n--{}\r\nContent-Type: {}\r\n\r\n", boundary, mime_type).as_bytes());
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{}--\r\n", boundary).as_bytes());
    body
}

fn truncate(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_multipart_related_layout() {
        let body = multipart_related_body("b1", &json!({"name": "a.jpg"}), "image/jpeg", b"\xff\xd8data");
        let expected_head = b"--b1\r\nContent-Type: application/json; charset=UTF-8\r\n\r\n{\"name\":\"a.jpg\"}\r\n--b1\r\nContent-Type: image/jpeg\r\n\r\n";
        assert!(body.starts_with(expected_head));
        assert!(body.ends_with(b"\xff\xd8data\r\n--b1--\r\n"));
    }

    #[tokio::test]
    async fn test_unconfigured_mirror_is_disabled() {
        let mirror = DriveMirror::new(DriveConfig::default()).unwrap();
        let outcome = mirror.upload_file("a.jpg", Path::new("missing.jpg")).await;
        assert_eq!(outcome, MirrorOutcome::Disabled);
        assert!(!mirror.is_enabled());
    }

    #[tokio::test]
    async fn test_folder_without_credentials_is_disabled() {
        let mirror = DriveMirror::new(DriveConfig {
            folder_id: Some("folder".to_string()),
            ..DriveConfig::default()
        })
        .unwrap();
        assert_eq!(
            mirror.upload_file("a.jpg", Path::new("a.jpg")).await,
            MirrorOutcome::Disabled
        );
    }
}
