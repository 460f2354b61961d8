use std::env;
use std::fmt;
use std::pin::Pin;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::Stream;
use futures::stream::StreamExt;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client as ReqwestClient, Response, header};
use serde::Deserialize;
use url::Url;

use crate::client_logger::ClientLogger;
use crate::error::{Error, Result};
use crate::observability::{CLIENT_REQUEST_DURATION, CLIENT_REQUEST_ERRORS, CLIENT_REQUESTS};
use crate::sse::process_sse;
use crate::types::{ChatCompletionChunk, ChatCompletionRequest};

/// Environment variable holding the API key.
pub const API_KEY_ENV: &str = "GROQ_API_KEY";

/// Environment variable overriding the API base URL.
pub const BASE_URL_ENV: &str = "GROQ_BASE_URL";

const DEFAULT_API_URL: &str = "https://api.groq.com/openai/v1/";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// A boxed, sendable stream of completion chunks.
pub type ChunkStream = Pin<Box<dyn Stream<Item = Result<ChatCompletionChunk>> + Send>>;

/// Something that can stream a chat completion.
///
/// [`Groq`] is the production implementation; tests substitute scripted streams.
#[async_trait::async_trait]
pub trait Completions: Send + Sync {
    /// Issue `request` and return its reply as a stream of chunks.
    async fn stream_chat(&self, request: ChatCompletionRequest) -> Result<ChunkStream>;
}

/// Client for the Groq chat-completions API.
#[derive(Clone)]
pub struct Groq {
    api_key: String,
    client: ReqwestClient,
    base_url: Url,
    timeout: Duration,
    logger: Option<Arc<dyn ClientLogger>>,
}

impl fmt::Debug for Groq {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Groq")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url.as_str())
            .field("timeout", &self.timeout)
            .field("logger", &self.logger.is_some())
            .finish()
    }
}

impl Groq {
    /// Create a new Groq client.
    ///
    /// The API key can be provided directly or read from the `GROQ_API_KEY`
    /// environment variable.
    pub fn new(api_key: Option<String>) -> Result<Self> {
        Self::with_options(api_key, None, None)
    }

    /// Create a new client with custom settings.
    pub fn with_options(
        api_key: Option<String>,
        base_url: Option<String>,
        timeout: Option<Duration>,
    ) -> Result<Self> {
        let api_key = match api_key {
            Some(key) => key,
            None => env::var(API_KEY_ENV).map_err(|_| {
                Error::configuration(format!(
                    "API key not found. Please set {API_KEY_ENV} in your environment."
                ))
            })?,
        };
        if api_key.trim().is_empty() {
            return Err(Error::configuration(format!(
                "API key is empty. Please set {API_KEY_ENV} in your environment."
            )));
        }

        let base_url = parse_base_url(base_url.as_deref().unwrap_or(DEFAULT_API_URL))?;
        let timeout = timeout.unwrap_or(DEFAULT_TIMEOUT);
        let client = ReqwestClient::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                Error::http_client(
                    format!("Failed to build HTTP client: {e}"),
                    Some(Box::new(e)),
                )
            })?;

        Ok(Self {
            api_key,
            client,
            base_url,
            timeout,
            logger: None,
        })
    }

    /// Attach a logger that observes every request and streamed chunk.
    pub fn with_logger(mut self, logger: Arc<dyn ClientLogger>) -> Self {
        self.logger = Some(logger);
        self
    }

    /// The base URL requests are issued against.
    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    /// The request timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Create and return default headers for API requests.
    fn default_headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        headers.insert(
            header::ACCEPT,
            HeaderValue::from_static("text/event-stream"),
        );
        let bearer = HeaderValue::from_str(&format!("Bearer {}", self.api_key)).map_err(|_| {
            Error::configuration(format!(
                "{API_KEY_ENV} contains characters that cannot be sent in a header"
            ))
        })?;
        headers.insert(header::AUTHORIZATION, bearer);
        Ok(headers)
    }

    /// Process API response errors and convert to our Error type
    async fn process_error_response(response: Response) -> Error {
        let status_code = response.status().as_u16();

        let request_id = response
            .headers()
            .get("x-request-id")
            .and_then(|val| val.to_str().ok())
            .map(String::from);

        let retry_after = response
            .headers()
            .get("retry-after")
            .and_then(|val| val.to_str().ok())
            .and_then(|val| val.trim().parse::<u64>().ok());

        match response.text().await {
            Ok(body) => error_from_status(status_code, &body, request_id, retry_after),
            Err(e) => Error::http_client(
                format!("Failed to read error response: {e}"),
                Some(Box::new(e)),
            ),
        }
    }

    /// Send a request to the API and get a streaming response.
    ///
    /// Returns a stream of chunks that can be processed incrementally.  No network
    /// traffic happens before this is called.
    pub async fn stream(
        &self,
        mut request: ChatCompletionRequest,
    ) -> Result<impl Stream<Item = Result<ChatCompletionChunk>> + Send + use<>> {
        request.stream = true;
        let url = self.base_url.join("chat/completions")?;
        if let Some(logger) = &self.logger {
            logger.log_request(&request);
        }

        CLIENT_REQUESTS.click();
        let started = Instant::now();
        let response = self
            .client
            .post(url)
            .headers(self.default_headers()?)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                CLIENT_REQUEST_ERRORS.click();
                if e.is_timeout() {
                    Error::timeout(
                        format!("Request timed out: {e}"),
                        Some(self.timeout.as_secs_f64()),
                    )
                } else if e.is_connect() {
                    Error::connection(format!("Connection error: {e}"), Some(Box::new(e)))
                } else {
                    Error::http_client(format!("Request failed: {e}"), Some(Box::new(e)))
                }
            })?;
        CLIENT_REQUEST_DURATION.add(started.elapsed().as_secs_f64());

        if !response.status().is_success() {
            CLIENT_REQUEST_ERRORS.click();
            return Err(Self::process_error_response(response).await);
        }

        let logger = self.logger.clone();
        let chunks = process_sse(response.bytes_stream()).inspect(move |chunk| {
            if let (Some(logger), Ok(chunk)) = (&logger, chunk) {
                logger.log_stream_chunk(chunk);
            }
        });
        Ok(chunks)
    }
}

#[async_trait::async_trait]
impl Completions for Groq {
    async fn stream_chat(&self, request: ChatCompletionRequest) -> Result<ChunkStream> {
        Ok(Box::pin(self.stream(request).await?))
    }
}

/// Parse a base URL, making sure relative joins append to its path.
fn parse_base_url(base_url: &str) -> Result<Url> {
    let mut base_url = base_url.trim().to_string();
    if !base_url.ends_with('/') {
        base_url.push('/');
    }
    let url = Url::parse(&base_url)?;
    if url.cannot_be_a_base() {
        return Err(Error::url(format!("{base_url} cannot be a base URL"), None));
    }
    Ok(url)
}

/// Map an unsuccessful status and its body onto an [`Error`].
fn error_from_status(
    status_code: u16,
    body: &str,
    request_id: Option<String>,
    retry_after: Option<u64>,
) -> Error {
    #[derive(Deserialize)]
    struct ErrorResponse {
        error: Option<ErrorDetail>,
    }

    #[derive(Deserialize)]
    struct ErrorDetail {
        #[serde(rename = "type")]
        error_type: Option<String>,
        message: Option<String>,
        param: Option<String>,
    }

    let detail = serde_json::from_str::<ErrorResponse>(body)
        .ok()
        .and_then(|e| e.error);
    let error_type = detail.as_ref().and_then(|e| e.error_type.clone());
    let error_param = detail.as_ref().and_then(|e| e.param.clone());
    let error_message = detail
        .and_then(|e| e.message)
        .unwrap_or_else(|| body.to_string());

    match status_code {
        400 | 422 => Error::bad_request(error_message, error_param),
        401 => Error::authentication(error_message),
        403 => Error::permission(error_message),
        404 => Error::not_found(error_message),
        408 => Error::timeout(error_message, None),
        429 => Error::rate_limit(error_message, retry_after),
        500 => Error::internal_server(error_message, request_id),
        502..=504 => Error::service_unavailable(error_message, retry_after),
        _ => Error::api(status_code, error_type, error_message, request_id),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Message, Model, Temperature};

    #[test]
    fn client_creation() {
        let client = Groq::new(Some("test-key".to_string())).unwrap();
        assert_eq!(client.api_key, "test-key");
        assert_eq!(client.base_url(), DEFAULT_API_URL);
        assert_eq!(client.timeout(), DEFAULT_TIMEOUT);

        let client = Groq::with_options(
            Some("test-key".to_string()),
            Some("http://localhost:8080/openai/v1".to_string()),
            Some(Duration::from_secs(30)),
        )
        .unwrap();
        assert_eq!(client.base_url(), "http://localhost:8080/openai/v1/");
        assert_eq!(client.timeout(), Duration::from_secs(30));
        assert_eq!(
            client.base_url.join("chat/completions").unwrap().as_str(),
            "http://localhost:8080/openai/v1/chat/completions"
        );
    }

    #[test]
    fn empty_key_is_configuration_error() {
        let err = Groq::new(Some("   ".to_string())).unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn invalid_base_url() {
        let err = Groq::with_options(Some("k".to_string()), Some("not a url".to_string()), None)
            .unwrap_err();
        assert!(matches!(err, Error::Url { .. }));
    }

    #[test]
    fn debug_redacts_key() {
        let client = Groq::new(Some("secret-key".to_string())).unwrap();
        let debug = format!("{client:?}");
        assert!(!debug.contains("secret-key"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn headers_carry_bearer_token() {
        let client = Groq::new(Some("gsk_test".to_string())).unwrap();
        let headers = client.default_headers().unwrap();
        assert_eq!(headers[header::AUTHORIZATION], "Bearer gsk_test");
        assert_eq!(headers[header::ACCEPT], "text/event-stream");
    }

    #[test]
    fn status_mapping() {
        let body = r#"{"error":{"message":"Invalid API Key","type":"invalid_request_error","code":"invalid_api_key"}}"#;
        let err = error_from_status(401, body, None, None);
        assert!(err.is_authentication());
        assert_eq!(err.to_string(), "Authentication error: Invalid API Key");

        let err = error_from_status(429, "{}", None, Some(7));
        assert!(err.is_rate_limit());
        assert!(err.to_string().contains("retry after 7 seconds"));

        let err = error_from_status(503, "upstream unavailable", None, None);
        assert!(err.is_server_error());
        assert!(err.to_string().contains("upstream unavailable"));

        let err = error_from_status(
            418,
            r#"{"error":{"message":"teapot","type":"weird"}}"#,
            Some("req_9".to_string()),
            None,
        );
        assert_eq!(err.status_code(), Some(418));
        assert_eq!(err.to_string(), "weird: teapot (Request ID: req_9)");
    }

    #[tokio::test]
    async fn unreachable_server_is_transport_error() {
        let client = Groq::with_options(
            Some("test-key".to_string()),
            Some("http://127.0.0.1:9/".to_string()),
            Some(Duration::from_secs(2)),
        )
        .unwrap();
        let request = ChatCompletionRequest::new(
            Model::default(),
            vec![Message::user("hello")],
            Temperature::default(),
        );
        let err = client.stream_chat(request).await.err().unwrap();
        assert!(err.is_transport());
    }
}
