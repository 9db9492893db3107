use gloo_net::http::{Request, RequestBuilder, Response};
use serde::Deserialize;
use thiserror::Error;
use web_sys::FormData;

use crate::models::{
    ChatRequest, ChatResponse, Credentials, DocumentInfo, MeResponse, TokenResponse,
    UploadResponse,
};

/// Base URL of the tutoring backend.
const API_BASE: &str = "http://localhost:8000";

/// localStorage key for the access token.
const TOKEN_KEY: &str = "token";

/// Errors from the backend boundary. `Server` carries the optional
/// human-readable `detail` the backend attaches to failed requests.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Server error: {status}")]
    Server { status: u16, detail: Option<String> },

    #[error("Parse error: {0}")]
    Parse(String),
}

impl ApiError {
    /// Server-supplied detail string, when there is one.
    pub fn detail(&self) -> Option<&str> {
        match self {
            ApiError::Server { detail, .. } => detail.as_deref().filter(|d| !d.is_empty()),
            _ => None,
        }
    }
}

/// Shape of a backend error body.
#[derive(Deserialize)]
struct ErrorBody {
    detail: Option<String>,
}

pub fn stored_token() -> Option<String> {
    let storage = web_sys::window()?.local_storage().ok()??;
    storage.get_item(TOKEN_KEY).ok()?
}

pub fn store_token(token: &str) {
    if let Some(storage) = web_sys::window().and_then(|w| w.local_storage().ok().flatten()) {
        let _ = storage.set_item(TOKEN_KEY, token);
    }
}

pub fn clear_token() {
    if let Some(storage) = web_sys::window().and_then(|w| w.local_storage().ok().flatten()) {
        let _ = storage.remove_item(TOKEN_KEY);
    }
}

/// Attach the bearer token, if one is stored.
fn authorized(builder: RequestBuilder) -> RequestBuilder {
    match stored_token() {
        Some(token) => builder.header("Authorization", &format!("Bearer {token}")),
        None => builder,
    }
}

/// Reject non-2xx responses, pulling the backend's `detail` out of the body
/// when it sends one.
async fn check(resp: Response) -> Result<Response, ApiError> {
    if resp.ok() {
        return Ok(resp);
    }
    let detail = resp
        .json::<ErrorBody>()
        .await
        .ok()
        .and_then(|body| body.detail);
    Err(ApiError::Server {
        status: resp.status(),
        detail,
    })
}

async fn parse<T: for<'de> Deserialize<'de>>(resp: Response) -> Result<T, ApiError> {
    resp.json::<T>()
        .await
        .map_err(|e| ApiError::Parse(e.to_string()))
}

async fn post_credentials(endpoint: &str, creds: &Credentials) -> Result<TokenResponse, ApiError> {
    let resp = Request::post(&format!("{API_BASE}{endpoint}"))
        .json(creds)
        .map_err(|e| ApiError::Network(e.to_string()))?
        .send()
        .await
        .map_err(|e| ApiError::Network(e.to_string()))?;
    parse(check(resp).await?).await
}

pub async fn login(creds: &Credentials) -> Result<TokenResponse, ApiError> {
    post_credentials("/auth/login", creds).await
}

pub async fn signup(creds: &Credentials) -> Result<TokenResponse, ApiError> {
    post_credentials("/auth/signup", creds).await
}

/// Resolve the logged-in user's role from the stored token.
pub async fn me() -> Result<MeResponse, ApiError> {
    let resp = authorized(Request::get(&format!("{API_BASE}/auth/me")))
        .send()
        .await
        .map_err(|e| ApiError::Network(e.to_string()))?;
    parse(check(resp).await?).await
}

/// One chat round-trip. At most one of these is in flight at a time; the
/// caller enforces that with its pending flag.
pub async fn send_chat(request: &ChatRequest) -> Result<ChatResponse, ApiError> {
    let resp = authorized(Request::post(&format!("{API_BASE}/chat")))
        .json(request)
        .map_err(|e| ApiError::Network(e.to_string()))?
        .send()
        .await
        .map_err(|e| ApiError::Network(e.to_string()))?;
    parse(check(resp).await?).await
}

pub async fn fetch_documents() -> Result<Vec<DocumentInfo>, ApiError> {
    let resp = authorized(Request::get(&format!("{API_BASE}/admin/documents")))
        .send()
        .await
        .map_err(|e| ApiError::Network(e.to_string()))?;
    parse(check(resp).await?).await
}

pub async fn upload_pdf(form: FormData) -> Result<UploadResponse, ApiError> {
    let resp = authorized(Request::post(&format!("{API_BASE}/admin/upload_pdf")))
        .body(form)
        .map_err(|e| ApiError::Network(e.to_string()))?
        .send()
        .await
        .map_err(|e| ApiError::Network(e.to_string()))?;
    parse(check(resp).await?).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_detail_exposed() {
        let err = ApiError::Server {
            status: 422,
            detail: Some("Question too long".to_string()),
        };
        assert_eq!(err.detail(), Some("Question too long"));
    }

    #[test]
    fn test_absent_or_blank_detail_is_none() {
        let err = ApiError::Server {
            status: 500,
            detail: None,
        };
        assert_eq!(err.detail(), None);
        let err = ApiError::Server {
            status: 500,
            detail: Some(String::new()),
        };
        assert_eq!(err.detail(), None);
        assert_eq!(ApiError::Network("offline".to_string()).detail(), None);
    }
}
