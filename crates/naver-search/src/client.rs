//! Async HTTP client for the Naver Open API, wrapping reqwest.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::datalab::DatalabEndpoint;
use crate::search::SearchKind;
use crate::types::{Credentials, NaverError, NaverResult};

pub const DEFAULT_BASE_URL: &str = "https://openapi.naver.com/v1";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const CLIENT_ID_HEADER: &str = "X-Naver-Client-Id";
const CLIENT_SECRET_HEADER: &str = "X-Naver-Client-Secret";

/// Error body returned by the provider on non-2xx responses.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiErrorBody {
    error_message: Option<String>,
    error_code: Option<String>,
}

/// Shared, cheaply cloneable client. Holds no per-request state.
#[derive(Clone)]
pub struct NaverClient {
    http: reqwest::Client,
    credentials: Credentials,
    base_url: String,
}

impl NaverClient {
    pub fn new(credentials: Credentials) -> NaverResult<Self> {
        Self::with_base_url(credentials, DEFAULT_BASE_URL)
    }

    /// Create a client against a different API root (mock servers, proxies).
    pub fn with_base_url(credentials: Credentials, base_url: impl Into<String>) -> NaverResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .user_agent(concat!("naver-search/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let base_url = base_url.into().trim_end_matches('/').to_string();
        tracing::debug!("Naver client targeting {base_url}");

        Ok(Self {
            http,
            credentials,
            base_url,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `GET /search/{kind}.json` with the arguments as query parameters.
    pub async fn search<P>(&self, kind: SearchKind, params: &P) -> NaverResult<Value>
    where
        P: Serialize + ?Sized,
    {
        let url = format!("{}/search/{}.json", self.base_url, kind.endpoint());
        tracing::debug!("Naver search request: {url}");
        self.send(self.http.get(&url).query(params)).await
    }

    /// `POST /datalab/{endpoint}` with the arguments as a JSON body.
    pub async fn datalab<B>(&self, endpoint: DatalabEndpoint, body: &B) -> NaverResult<Value>
    where
        B: Serialize + ?Sized,
    {
        let url = format!("{}/datalab/{}", self.base_url, endpoint.path());
        tracing::debug!("Naver datalab request: {url}");
        self.send(self.http.post(&url).json(body)).await
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> NaverResult<Value> {
        let response = request
            .header(CLIENT_ID_HEADER, &self.credentials.client_id)
            .header(CLIENT_SECRET_HEADER, &self.credentials.client_secret)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let err = api_error(status.as_u16(), &body);
            tracing::warn!("{err}");
            return Err(err);
        }

        Ok(serde_json::from_str(&body)?)
    }
}

fn api_error(status: u16, body: &str) -> NaverError {
    let parsed = serde_json::from_str::<ApiErrorBody>(body).ok();
    let code = parsed.as_ref().and_then(|b| b.error_code.clone());
    let message = parsed
        .and_then(|b| b.error_message)
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| {
            if body.trim().is_empty() {
                format!("HTTP {status}")
            } else {
                body.trim().to_string()
            }
        });

    NaverError::Api {
        status,
        code,
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_prefers_error_message() {
        let err = api_error(
            401,
            r#"{"errorMessage":"Authentication failed","errorCode":"024"}"#,
        );
        match err {
            NaverError::Api {
                status,
                code,
                message,
            } => {
                assert_eq!(status, 401);
                assert_eq!(code.as_deref(), Some("024"));
                assert_eq!(message, "Authentication failed");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_api_error_falls_back_to_body() {
        let err = api_error(502, "Bad Gateway");
        assert_eq!(err.to_string(), "Naver API error (502): Bad Gateway");

        let err = api_error(500, "");
        assert_eq!(err.to_string(), "Naver API error (500): HTTP 500");
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client =
            NaverClient::with_base_url(Credentials::new("id", "secret"), "http://localhost:1/v1/")
                .unwrap();
        assert_eq!(client.base_url(), "http://localhost:1/v1");
    }
}
