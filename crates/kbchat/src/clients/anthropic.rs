use std::time::Duration;

use crate::messages::{ApiError, Fragment, FragmentStream, MessageCompletion, MessageRequest};
use crate::utils::uri::ensure_no_trailing_slash;
use crate::{Error, Result};
use async_trait::async_trait;
use derive_builder::Builder;
use eventsource_stream::Eventsource;
use futures::StreamExt;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::{debug, trace};

pub const ANTHROPIC_API_KEY_ENV_VAR: &str = "ANTHROPIC_API_KEY";
pub const ANTHROPIC_BASE_URL_ENV_VAR: &str = "ANTHROPIC_BASE_URL";
pub const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
pub const ANTHROPIC_VERSION: &str = "2023-06-01";
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Builder)]
#[builder(derive(Debug))]
#[builder(setter(into), build_fn(skip))]
pub struct Client {
    #[builder(setter(skip))]
    http_client: reqwest::Client,
    api_key: SecretString,
    base_url: String,
    connect_timeout: Duration,
}

impl ClientBuilder {
    pub fn build(&self) -> Result<Client> {
        let api_key = match &self.api_key {
            Some(api_key) => api_key.clone(),
            None => api_key_from_env()?,
        };
        let http_client = reqwest::Client::builder()
            .connect_timeout(self.connect_timeout.unwrap_or(DEFAULT_CONNECT_TIMEOUT))
            .build()?;
        Ok(Client {
            http_client,
            api_key,
            base_url: ensure_no_trailing_slash(
                self.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL),
            ),
            connect_timeout: self.connect_timeout.unwrap_or(DEFAULT_CONNECT_TIMEOUT),
        })
    }
}

fn api_key_from_env() -> Result<SecretString> {
    let api_key = std::env::var(ANTHROPIC_API_KEY_ENV_VAR)
        .map_err(|e| Error::EnvVarError(ANTHROPIC_API_KEY_ENV_VAR.to_string(), e))?;
    Ok(SecretString::from(api_key))
}

impl Client {
    pub fn new(api_key: impl Into<String>, base_url: &str) -> Result<Self> {
        ClientBuilder::default()
            .api_key(SecretString::from(api_key.into()))
            .base_url(base_url)
            .build()
    }

    /// Reads the API key from `ANTHROPIC_API_KEY` and talks to the public
    /// endpoint.
    pub fn from_env() -> Result<Self> {
        ClientBuilder::default().build()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }

    fn headers(&self) -> Result<reqwest::header::HeaderMap> {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            "x-api-key",
            reqwest::header::HeaderValue::from_str(self.api_key.expose_secret())
                .map_err(|e| Error::InvalidHeaderValue("x-api-key".to_string(), e))?,
        );
        headers.insert(
            "anthropic-version",
            reqwest::header::HeaderValue::from_static(ANTHROPIC_VERSION),
        );
        headers.insert(
            reqwest::header::CONTENT_TYPE,
            reqwest::header::HeaderValue::from_static("application/json"),
        );
        Ok(headers)
    }
}

#[async_trait]
impl MessageCompletion for Client {
    async fn create_stream(&self, request: &MessageRequest) -> Result<FragmentStream> {
        let url = format!("{}/v1/messages", self.base_url);
        debug!(%url, model = %request.model, "opening message stream");

        let response = self
            .http_client
            .post(url)
            .headers(self.headers()?)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await?;
            return Err(match serde_json::from_str::<ErrorEnvelope>(&body) {
                Ok(envelope) => Error::Api(envelope.error),
                Err(_) => Error::UnexpectedStatus(status, body),
            });
        }

        Ok(fragments(response))
    }
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ContentBlockDelta {
    delta: Delta,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum Delta {
    TextDelta { text: String },
    #[serde(other)]
    Other,
}

/// Turns the server-sent events of a message stream into fragments.
fn fragments(response: reqwest::Response) -> FragmentStream {
    Box::pin(async_stream::stream! {
        let mut events = response.bytes_stream().eventsource();
        while let Some(event) = events.next().await {
            let event = match event {
                Ok(event) => event,
                Err(e) => {
                    yield Err(Error::StreamError(e.to_string()));
                    return;
                }
            };
            trace!(event = %event.event, data = %event.data, "anthropic sse");

            match event.event.as_str() {
                "content_block_delta" => {
                    match serde_json::from_str::<ContentBlockDelta>(&event.data) {
                        Ok(ContentBlockDelta { delta: Delta::TextDelta { text } }) => {
                            yield Ok(Fragment::Text(text));
                        }
                        Ok(_) => {}
                        Err(e) => {
                            yield Err(Error::from(e));
                            return;
                        }
                    }
                }
                "error" => {
                    let error = serde_json::from_str::<ErrorEnvelope>(&event.data)
                        .map(|envelope| envelope.error)
                        .unwrap_or_else(|_| ApiError::unknown());
                    yield Ok(Fragment::Error(error));
                    return;
                }
                "message_stop" => return,
                _ => {}
            }
        }
    })
}
