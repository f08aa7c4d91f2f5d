use std::fmt;
use std::time::Duration;

use chrono::Utc;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Method, Response, StatusCode};

use crate::error::{Result, StorageError};
use crate::sigv4::{self, Credentials, encode_key};

const DEFAULT_REGION: &str = "auto";

/// Connection settings for an S3-compatible bucket.
#[derive(Clone, Default)]
pub struct ObjectStoreConfig {
    pub endpoint: Option<String>,
    pub bucket: String,
    pub region: String,
    /// Base for returned object URLs; defaults to `{endpoint}/{bucket}`.
    pub public_url: Option<String>,
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
}

impl fmt::Debug for ObjectStoreConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectStoreConfig")
            .field("endpoint", &self.endpoint)
            .field("bucket", &self.bucket)
            .field("region", &self.region)
            .field("public_url", &self.public_url)
            .field("access_key_id", &self.access_key_id.as_ref().map(|_| "<redacted>"))
            .field(
                "secret_access_key",
                &self.secret_access_key.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}

/// Object body plus the content type the bucket reported for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
}

#[derive(Clone)]
pub struct ObjectStore {
    client: reqwest::Client,
    origin: String,
    host: String,
    base_path: String,
    bucket: String,
    region: String,
    public_url: String,
    credentials: Credentials,
}

impl fmt::Debug for ObjectStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectStore")
            .field("origin", &self.origin)
            .field("bucket", &self.bucket)
            .field("region", &self.region)
            .field("public_url", &self.public_url)
            .finish_non_exhaustive()
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_owned()).filter(|v| !v.is_empty())
}

fn default_client() -> reqwest::Client {
    reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(30))
        .timeout(Duration::from_secs(120))
        .user_agent(concat!("fertihub/", env!("CARGO_PKG_VERSION")))
        .build()
        .unwrap_or_else(|e| {
            tracing::warn!("falling back to default HTTP client: {e}");
            reqwest::Client::new()
        })
}

/// Object key for an upload: `{unix_millis}-{file_name}` with any directory
/// part of the client-supplied name dropped.
pub(crate) fn object_key(millis: i64, file_name: &str) -> String {
    let name = file_name.rsplit(['/', '\\']).next().unwrap_or("").trim();
    let name = if name.is_empty() { "upload" } else { name };
    format!("{millis}-{name}")
}

fn checked_key(key: &str) -> Result<&str> {
    let trimmed = key.trim_start_matches('/');
    if trimmed.is_empty() || trimmed.split('/').any(|seg| seg == ".." || seg == ".") {
        return Err(StorageError::InvalidKey(key.to_owned()));
    }
    Ok(trimmed)
}

impl ObjectStore {
    /// Build a client from `config`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::NotConfigured`] when the endpoint, bucket or
    /// credentials are missing, and [`StorageError::InvalidEndpoint`] when the
    /// endpoint is not an absolute URL.
    pub fn new(config: ObjectStoreConfig) -> Result<Self> {
        let endpoint = non_empty(config.endpoint).ok_or(StorageError::NotConfigured("endpoint"))?;
        let access_key_id =
            non_empty(config.access_key_id).ok_or(StorageError::NotConfigured("access key id"))?;
        let secret_access_key = non_empty(config.secret_access_key)
            .ok_or(StorageError::NotConfigured("secret access key"))?;
        let bucket = non_empty(Some(config.bucket)).ok_or(StorageError::NotConfigured("bucket"))?;

        let url = url::Url::parse(&endpoint)
            .map_err(|_| StorageError::InvalidEndpoint(endpoint.clone()))?;
        let host_name = url
            .host_str()
            .ok_or_else(|| StorageError::InvalidEndpoint(endpoint.clone()))?;
        let host = match url.port() {
            Some(port) => format!("{host_name}:{port}"),
            None => host_name.to_owned(),
        };
        let origin = format!("{}://{host}", url.scheme());
        let base_path = url.path().trim_end_matches('/').to_owned();

        let public_url = non_empty(config.public_url).map_or_else(
            || format!("{origin}{base_path}/{}", encode_key(&bucket)),
            |u| u.trim_end_matches('/').to_owned(),
        );
        let region = non_empty(Some(config.region)).unwrap_or_else(|| DEFAULT_REGION.to_owned());

        Ok(Self {
            client: default_client(),
            origin,
            host,
            base_path,
            bucket,
            region,
            public_url,
            credentials: Credentials {
                access_key_id,
                secret_access_key,
            },
        })
    }

    #[must_use]
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    #[must_use]
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    fn object_path(&self, key: &str) -> String {
        format!(
            "{}/{}/{}",
            self.base_path,
            encode_key(&self.bucket),
            encode_key(key)
        )
    }

    async fn send(
        &self,
        method: Method,
        key: &str,
        body: Vec<u8>,
        content_type: Option<&str>,
    ) -> Result<Response> {
        let path = self.object_path(key);
        let with_body = method == Method::PUT || !body.is_empty();
        let signed = sigv4::sign(
            &self.credentials,
            &self.region,
            method.as_str(),
            &self.host,
            &path,
            &body,
            Utc::now(),
        )
        .map_err(|e| StorageError::Signing(e.to_string()))?;

        let mut request = self
            .client
            .request(method, format!("{}{path}", self.origin))
            .header("x-amz-date", signed.amz_date)
            .header("x-amz-content-sha256", signed.content_sha256)
            .header(AUTHORIZATION, signed.authorization);
        if let Some(content_type) = content_type {
            request = request.header(CONTENT_TYPE, content_type);
        }
        if with_body {
            request = request.body(body);
        }
        Ok(request.send().await?)
    }

    /// Store `bytes` under a fresh `{millis}-{file_name}` key and return its URL.
    ///
    /// The returned URL is `{public_url}/{key}` with the key left unencoded, so
    /// it always ends with the uploaded file name. Only the signed request path
    /// is percent-encoded.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the bucket rejects the upload.
    pub async fn upload(&self, bytes: Vec<u8>, file_name: &str, content_type: &str) -> Result<String> {
        let key = object_key(Utc::now().timestamp_millis(), file_name);
        let size = bytes.len();

        let response = self.send(Method::PUT, &key, bytes, Some(content_type)).await?;
        let status = response.status();
        if !status.is_success() {
            tracing::warn!(%key, status = status.as_u16(), "object upload rejected");
            return Err(StorageError::Status {
                operation: "upload",
                status: status.as_u16(),
            });
        }

        tracing::info!(%key, size, "object uploaded");
        Ok(format!("{}/{key}", self.public_url))
    }

    /// Fetch an object; `None` if the bucket has no such key.
    ///
    /// # Errors
    ///
    /// Returns an error for an invalid key, a failed request, or any non-404
    /// error status.
    pub async fn download(&self, key: &str) -> Result<Option<StoredObject>> {
        let key = checked_key(key)?;
        let response = self.send(Method::GET, key, Vec::new(), None).await?;
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(StorageError::Status {
                operation: "download",
                status: status.as_u16(),
            });
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);
        let bytes = response.bytes().await?.to_vec();
        Ok(Some(StoredObject {
            bytes,
            content_type,
        }))
    }

    /// Delete an object. Deleting a missing key succeeds.
    ///
    /// # Errors
    ///
    /// Returns an error for an invalid key, a failed request, or an error status.
    pub async fn delete(&self, key: &str) -> Result<()> {
        let key = checked_key(key)?;
        let response = self.send(Method::DELETE, key, Vec::new(), None).await?;
        let status = response.status();
        if status.is_success() || status == StatusCode::NOT_FOUND {
            tracing::info!(%key, "object deleted");
            Ok(())
        } else {
            Err(StorageError::Status {
                operation: "delete",
                status: status.as_u16(),
            })
        }
    }
}
