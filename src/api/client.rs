//! HTTP request wrapper with bearer auth and transparent token refresh.
//!
//! Every Riffle API call goes through [`ApiClient::request`]: it
//! attaches the stored access token, serializes the body (JSON or
//! multipart), and on a 401 runs one refresh-and-retry cycle before
//! surfacing `Unauthorized`. At most one refresh per logical call --
//! the retry never recurses into another refresh.

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::CONTENT_TYPE;
use reqwest::{Method, RequestBuilder, Response};
use serde_json::Value;
use tokio::sync::Mutex;

use super::auth;
use super::tokens::TokenStore;

/// Errors surfaced by the API layer.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// 401 that survived the single refresh cycle. The token store has
    /// been cleared by the time this is returned.
    #[error("Unauthorized")]
    Unauthorized,

    /// Any other non-success HTTP status, with a best-effort message
    /// extracted from the response body.
    #[error("API error ({status}): {message}")]
    Status { status: u16, message: String },

    /// The HTTP request itself failed (network, DNS, TLS, etc.).
    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The response body did not have the expected shape.
    #[error("Unexpected response: {0}")]
    Decode(String),
}

impl ApiError {
    /// HTTP status associated with this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Unauthorized => Some(401),
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// One part of a multipart form: plain text or file bytes.
#[derive(Debug, Clone)]
enum FormPart {
    Text(String),
    File {
        file_name: String,
        mime: String,
        bytes: Vec<u8>,
    },
}

/// Owned multipart form payload.
///
/// `reqwest::multipart::Form` cannot be cloned, but the refresh-retry
/// cycle may need to send the same body twice, so parts are held here
/// and a fresh `Form` is built per attempt.
#[derive(Debug, Clone, Default)]
pub struct FormData {
    parts: Vec<(String, FormPart)>,
}

impl FormData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a text field.
    pub fn text(mut self, name: &str, value: impl Into<String>) -> Self {
        self.parts
            .push((name.to_string(), FormPart::Text(value.into())));
        self
    }

    /// Append a file field with an explicit content type.
    pub fn file(
        mut self,
        name: &str,
        file_name: impl Into<String>,
        mime: &str,
        bytes: Vec<u8>,
    ) -> Self {
        self.parts.push((
            name.to_string(),
            FormPart::File {
                file_name: file_name.into(),
                mime: mime.to_string(),
                bytes,
            },
        ));
        self
    }

    fn to_form(&self) -> Result<reqwest::multipart::Form, ApiError> {
        let mut form = reqwest::multipart::Form::new();
        for (name, part) in &self.parts {
            form = match part {
                FormPart::Text(value) => form.text(name.clone(), value.clone()),
                FormPart::File {
                    file_name,
                    mime,
                    bytes,
                } => {
                    let part = reqwest::multipart::Part::bytes(bytes.clone())
                        .file_name(file_name.clone())
                        .mime_str(mime)?;
                    form.part(name.clone(), part)
                }
            };
        }
        Ok(form)
    }
}

/// Request body for one outbound call.
#[derive(Debug, Clone)]
pub enum RequestBody {
    /// JSON-encoded with an `application/json` content type.
    Json(Value),
    /// Multipart form, sent as-is (no JSON content type).
    Form(FormData),
}

/// Decoded response payload.
///
/// The API normally answers with JSON, but some endpoints (and some
/// error paths) return plain text; both are passed through.
#[derive(Debug, Clone)]
pub enum ApiBody {
    Json(Value),
    Text(String),
}

impl ApiBody {
    /// Collapse into a JSON value; plain text becomes a JSON string.
    pub fn into_value(self) -> Value {
        match self {
            ApiBody::Json(v) => v,
            ApiBody::Text(t) => Value::String(t),
        }
    }
}

/// HTTP client for the Riffle API.
///
/// Holds the base URL, a pooled `reqwest::Client`, and the token store
/// the session was built with. The store is injected so tests can run
/// against an in-memory implementation.
pub struct ApiClient {
    client: reqwest::Client,
    base_url: String,
    tokens: Arc<dyn TokenStore>,
    /// Serializes concurrent refresh attempts: two calls hitting 401 at
    /// the same time must not both burn the refresh token.
    refresh_gate: Mutex<()>,
}

impl ApiClient {
    /// Create a client for the given base URL and token store.
    pub fn new(base_url: &str, tokens: Arc<dyn TokenStore>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(120))
            .connect_timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            tokens,
            refresh_gate: Mutex::new(()),
        }
    }

    /// The API base URL (no trailing slash).
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// The token store backing this session.
    pub fn tokens(&self) -> &dyn TokenStore {
        self.tokens.as_ref()
    }

    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.client
    }

    /// Issue one logical API call and decode the body.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<RequestBody>,
    ) -> Result<ApiBody, ApiError> {
        let response = self.execute(method, path, body).await?;
        decode_body(response).await
    }

    /// Issue one logical API call, returning the raw response.
    ///
    /// Auth, refresh-retry, and status checking still apply; only the
    /// body decoding step is skipped. Used by DELETE endpoints whose
    /// responses carry no useful body.
    pub async fn request_unparsed(
        &self,
        method: Method,
        path: &str,
        body: Option<RequestBody>,
    ) -> Result<Response, ApiError> {
        self.execute(method, path, body).await
    }

    /// Convenience: GET, JSON-decoded.
    pub async fn get(&self, path: &str) -> Result<Value, ApiError> {
        Ok(self.request(Method::GET, path, None).await?.into_value())
    }

    /// Convenience: POST with a JSON body.
    pub async fn post(&self, path: &str, body: Value) -> Result<Value, ApiError> {
        Ok(self
            .request(Method::POST, path, Some(RequestBody::Json(body)))
            .await?
            .into_value())
    }

    /// Convenience: POST with a multipart form body.
    pub async fn post_form(&self, path: &str, form: FormData) -> Result<Value, ApiError> {
        Ok(self
            .request(Method::POST, path, Some(RequestBody::Form(form)))
            .await?
            .into_value())
    }

    /// Convenience: PATCH with a JSON body.
    pub async fn patch(&self, path: &str, body: Value) -> Result<Value, ApiError> {
        Ok(self
            .request(Method::PATCH, path, Some(RequestBody::Json(body)))
            .await?
            .into_value())
    }

    /// Convenience: PUT with a JSON body.
    pub async fn put(&self, path: &str, body: Value) -> Result<Value, ApiError> {
        Ok(self
            .request(Method::PUT, path, Some(RequestBody::Json(body)))
            .await?
            .into_value())
    }

    /// Convenience: DELETE, body undecoded.
    pub async fn delete(&self, path: &str) -> Result<(), ApiError> {
        self.request_unparsed(Method::DELETE, path, None).await?;
        Ok(())
    }

    /// Send with auth, running at most one refresh-and-retry cycle.
    async fn execute(
        &self,
        method: Method,
        path: &str,
        body: Option<RequestBody>,
    ) -> Result<Response, ApiError> {
        let access_used = self.tokens.access();
        let response = self
            .build_request(method.clone(), path, &body)?
            .send()
            .await?;

        if response.status().as_u16() != 401 {
            return check_status(response).await;
        }

        if self.tokens.refresh().is_none() {
            // No way to recover; drop the stale session.
            log::info!("401 with no refresh token, clearing session");
            return Err(self.force_logout());
        }

        if !self.refresh_session(access_used).await {
            log::info!("Token refresh failed, clearing session");
            return Err(self.force_logout());
        }

        // Retry exactly once with fresh headers. A second 401 here is
        // final -- it must not trigger another refresh.
        let retried = self.build_request(method, path, &body)?.send().await?;
        if retried.status().as_u16() == 401 {
            log::info!("Retry after refresh still unauthorized, clearing session");
            return Err(self.force_logout());
        }
        check_status(retried).await
    }

    /// Refresh the session tokens behind the in-flight gate.
    ///
    /// `access_used` is the access token the failed attempt was sent
    /// with; if the stored token changed while we waited on the gate,
    /// another call already refreshed and we can retry immediately.
    async fn refresh_session(&self, access_used: Option<String>) -> bool {
        let _guard = self.refresh_gate.lock().await;
        if self.tokens.access() != access_used {
            return true;
        }
        auth::try_refresh(self).await
    }

    fn force_logout(&self) -> ApiError {
        self.tokens.clear();
        ApiError::Unauthorized
    }

    /// Build one attempt: URL, bearer header, serialized body.
    ///
    /// Reads the access token from the store on every attempt so the
    /// retry after a refresh picks up the new token.
    fn build_request(
        &self,
        method: Method,
        path: &str,
        body: &Option<RequestBody>,
    ) -> Result<RequestBuilder, ApiError> {
        let url = format!("{}{}", self.base_url, path);
        let mut builder = self.client.request(method, &url);

        if let Some(access) = self.tokens.access() {
            builder = builder.bearer_auth(access);
        }

        builder = match body {
            None => builder,
            Some(RequestBody::Json(value)) => builder.json(value),
            Some(RequestBody::Form(form)) => builder.multipart(form.to_form()?),
        };
        Ok(builder)
    }
}

/// Map non-success statuses to [`ApiError::Status`].
async fn check_status(response: Response) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = error_message(response).await;
    Err(ApiError::Status {
        status: status.as_u16(),
        message,
    })
}

/// Best-effort error message from a failed response body.
///
/// JSON bodies contribute their `detail` field (or the whole serialized
/// body), plain bodies contribute raw text, and anything unreadable
/// falls back to the status reason phrase.
async fn error_message(response: Response) -> String {
    let status = response.status();
    let fallback = || status.canonical_reason().unwrap_or("Error").to_string();

    if is_json(&response) {
        match response.json::<Value>().await {
            Ok(body) => body
                .get("detail")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| body.to_string()),
            Err(_) => fallback(),
        }
    } else {
        match response.text().await {
            Ok(text) if !text.is_empty() => text,
            _ => fallback(),
        }
    }
}

/// Decode a successful response: JSON when the content type says so,
/// raw text otherwise.
async fn decode_body(response: Response) -> Result<ApiBody, ApiError> {
    if is_json(&response) {
        Ok(ApiBody::Json(response.json().await?))
    } else {
        Ok(ApiBody::Text(response.text().await?))
    }
}

fn is_json(response: &Response) -> bool {
    response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|ct| ct.contains("application/json"))
        .unwrap_or(false)
}
