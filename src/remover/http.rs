/// HTTP client for the background-removal service
///
/// The image is POSTed as multipart to `<base>/remove` and the
/// processed image comes back as the response body. Upload counts for
/// a fixed slice of the progress range; the rest is driven by the
/// download when the service reports a content length.

use std::time::Duration;

use async_stream::stream;
use futures::StreamExt;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response};
use serde::Deserialize;

use super::{BackgroundRemover, RemovalError, RemovalStream, RemovalUpdate};

/// Share of the progress range spent before the download starts
const UPLOAD_SHARE: f32 = 0.15;

/// Configuration for the removal service client
#[derive(Debug, Clone)]
pub struct RemoverConfig {
    /// Base URL of the removal service
    pub base_url: String,
    /// Per-image request timeout
    pub timeout: Duration,
}

impl Default for RemoverConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:7045".to_string(),
            timeout: Duration::from_secs(120),
        }
    }
}

impl RemoverConfig {
    /// Read configuration from environment variables, falling back to
    /// the defaults for anything unset
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            base_url: std::env::var("CUTOUT_SERVICE_URL").unwrap_or(defaults.base_url),
            timeout: std::env::var("CUTOUT_SERVICE_TIMEOUT")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.timeout),
        }
    }

    /// Full URL of the removal endpoint
    pub fn endpoint(&self) -> String {
        format!("{}/remove", self.base_url.trim_end_matches('/'))
    }
}

/// Error payload some service failures carry
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

/// Removal client backed by an external HTTP service
pub struct HttpRemover {
    http: Client,
    config: RemoverConfig,
}

impl HttpRemover {
    pub fn new(config: RemoverConfig) -> Result<Self, RemovalError> {
        let http = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { http, config })
    }
}

/// Upload one image and fail on any non-success status
async fn send_request(
    http: Client,
    url: String,
    image: Vec<u8>,
    filename: String,
) -> Result<Response, RemovalError> {
    let part = Part::bytes(image)
        .file_name(filename)
        .mime_str("application/octet-stream")?;
    let form = Form::new().part("image", part);

    let response = http.post(&url).multipart(form).send().await?;
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        // Prefer the service's structured error message when it sends one
        let detail = serde_json::from_str::<ErrorBody>(&body)
            .map(|payload| payload.error)
            .unwrap_or(body);
        let detail = if detail.is_empty() {
            status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_string()
        } else {
            detail
        };
        return Err(RemovalError::Service {
            status: status.as_u16(),
            detail,
        });
    }

    Ok(response)
}

impl BackgroundRemover for HttpRemover {
    fn remove_background(&self, image: Vec<u8>, filename: &str) -> RemovalStream {
        let http = self.http.clone();
        let url = self.config.endpoint();
        let filename = filename.to_string();

        let updates = stream! {
            yield RemovalUpdate::Progress(0.0);

            match send_request(http, url, image, filename).await {
                Ok(mut response) => {
                    yield RemovalUpdate::Progress(UPLOAD_SHARE);

                    let total = response.content_length().filter(|len| *len > 0);
                    let mut received: u64 = 0;
                    let mut data = Vec::new();
                    let mut failure = None;

                    loop {
                        match response.chunk().await {
                            Ok(Some(chunk)) => {
                                received += chunk.len() as u64;
                                data.extend_from_slice(&chunk);
                                if let Some(total) = total {
                                    let fraction = received as f32 / total as f32;
                                    yield RemovalUpdate::Progress(
                                        UPLOAD_SHARE + fraction.min(1.0) * (1.0 - UPLOAD_SHARE),
                                    );
                                }
                            }
                            Ok(None) => break,
                            Err(err) => {
                                failure = Some(RemovalError::Network(err));
                                break;
                            }
                        }
                    }

                    match failure {
                        Some(err) => yield RemovalUpdate::Done(Err(err)),
                        None if data.is_empty() => {
                            yield RemovalUpdate::Done(Err(RemovalError::EmptyOutput))
                        }
                        None => {
                            yield RemovalUpdate::Progress(1.0);
                            yield RemovalUpdate::Done(Ok(data));
                        }
                    }
                }
                Err(err) => yield RemovalUpdate::Done(Err(err)),
            }
        };

        updates.boxed()
    }
}
