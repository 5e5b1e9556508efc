// HTTP client for the NetBox REST API.
//
// Base path: /api/
// Auth: `Authorization: Token <token>` header

use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::directory::{Directory, Endpoint, Fields, Query};
use crate::error::Error;
use crate::transport::TransportConfig;

/// Page size requested from list endpoints.
const PAGE_SIZE: u32 = 250;

// ── Response shapes ──────────────────────────────────────────────────

#[derive(serde::Deserialize)]
struct Page {
    #[serde(default)]
    next: Option<String>,
    #[serde(default)]
    results: Vec<Value>,
}

/// NetBox reports errors as `{"detail": "..."}` or as per-field lists.
#[derive(serde::Deserialize)]
struct ErrorResponse {
    detail: Option<String>,
}

// ── Client ───────────────────────────────────────────────────────────

/// Async client for a NetBox instance.
///
/// Implements [`Directory`] over the REST collections under `/api/`.
pub struct NetBoxClient {
    http: reqwest::Client,
    base_url: Url,
}

impl NetBoxClient {
    // ── Constructors ─────────────────────────────────────────────────

    /// Build from an API token and transport config.
    ///
    /// Injects `Authorization: Token …` as a sensitive default header.
    pub fn new(
        base_url: &str,
        token: &SecretString,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let mut headers = HeaderMap::new();
        let mut auth = HeaderValue::from_str(&format!("Token {}", token.expose_secret()))
            .map_err(|e| Error::Authentication {
                message: format!("invalid token header value: {e}"),
            })?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let http = transport.build_client_with_headers(headers)?;
        let base_url = Self::normalize_base_url(base_url)?;

        Ok(Self { http, base_url })
    }

    /// Ensure the base URL points at the API root and ends with `/api/`.
    fn normalize_base_url(raw: &str) -> Result<Url, Error> {
        let mut url = Url::parse(raw)?;
        let path = url.path().trim_end_matches('/').to_owned();

        if path.ends_with("/api") {
            url.set_path(&format!("{path}/"));
        } else {
            url.set_path(&format!("{path}/api/"));
        }

        Ok(url)
    }

    /// The normalized API root.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn url(&self, path: &str) -> Result<Url, Error> {
        Ok(self.base_url.join(path)?)
    }

    // ── HTTP verbs ───────────────────────────────────────────────────

    async fn get<T: DeserializeOwned>(
        &self,
        url: Url,
        params: &[(String, String)],
    ) -> Result<T, Error> {
        debug!("GET {url} params={params:?}");

        let resp = self.http.get(url).query(params).send().await?;
        self.handle_response(resp).await
    }

    async fn post<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        url: Url,
        body: &B,
    ) -> Result<T, Error> {
        debug!("POST {url}");

        let resp = self.http.post(url).json(body).send().await?;
        self.handle_response(resp).await
    }

    async fn patch<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        url: Url,
        body: &B,
    ) -> Result<T, Error> {
        debug!("PATCH {url}");

        let resp = self.http.patch(url).json(body).send().await?;
        self.handle_response(resp).await
    }

    // ── Response handling ────────────────────────────────────────────

    async fn handle_response<T: DeserializeOwned>(
        &self,
        resp: reqwest::Response,
    ) -> Result<T, Error> {
        let status = resp.status();
        if status.is_success() {
            let body = resp.text().await?;
            serde_json::from_str(&body).map_err(|e| {
                let preview: String = body.chars().take(200).collect();
                Error::Deserialization {
                    message: format!("{e} (body preview: {preview:?})"),
                    body,
                }
            })
        } else {
            Err(self.parse_error(status, resp).await)
        }
    }

    async fn parse_error(&self, status: reqwest::StatusCode, resp: reqwest::Response) -> Error {
        let raw = resp.text().await.unwrap_or_default();
        let detail = serde_json::from_str::<ErrorResponse>(&raw)
            .ok()
            .and_then(|e| e.detail);

        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN
        {
            return Error::Authentication {
                message: detail.unwrap_or_else(|| status.to_string()),
            };
        }

        Error::Api {
            status: status.as_u16(),
            message: match detail {
                Some(detail) => detail,
                None if raw.is_empty() => status.to_string(),
                None => raw.chars().take(200).collect(),
            },
        }
    }

    // ━━ Public API ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    /// `GET /api/status/` -- used as the connectivity and token probe.
    pub async fn status(&self) -> Result<Value, Error> {
        self.get(self.url("status/")?, &[]).await
    }
}

#[async_trait]
impl Directory for NetBoxClient {
    async fn find_many(&self, endpoint: Endpoint, query: &Query) -> Result<Vec<Value>, Error> {
        let mut params = query.params().to_vec();
        params.push(("limit".into(), PAGE_SIZE.to_string()));

        let mut page: Page = self.get(self.url(&endpoint.path())?, &params).await?;
        let mut all = std::mem::take(&mut page.results);

        // `next` is absolute and already carries the filter and offset.
        while let Some(next) = page.next.take() {
            page = self.get(Url::parse(&next)?, &[]).await?;
            all.append(&mut page.results);
        }

        Ok(all)
    }

    async fn create(&self, endpoint: Endpoint, fields: &Fields) -> Result<Value, Error> {
        self.post(self.url(&endpoint.path())?, fields).await
    }

    async fn update(&self, endpoint: Endpoint, id: u64, fields: &Fields) -> Result<Value, Error> {
        let path = format!("{}{id}/", endpoint.path());
        self.patch(self.url(&path)?, fields).await
    }
}
