//! Typed access to the clinic REST backend.
//!
//! [`ApiClient`] is the only place that builds URLs, attaches the bearer
//! token and decodes responses. Endpoint groups live in the submodules as
//! additional `impl ApiClient` blocks.

pub mod admin;
pub mod auth;
pub mod doctor;
pub mod models;
pub mod patient;

use std::collections::HashSet;
use std::time::Duration;

use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use crate::config::AppConfig;
use crate::error::ClientError;
use crate::session::SessionContext;

/// One page of a collection response
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope<T> {
    pub results: Vec<T>,
    pub next: Option<String>,
}

impl<T: DeserializeOwned> Envelope<T> {
    /// Accepts `{ results: [...], next }` or a bare array.
    ///
    /// Any other shape yields an empty, final page.
    pub fn from_value(value: Value) -> Result<Self, ClientError> {
        match value {
            Value::Array(_) => Ok(Envelope {
                results: serde_json::from_value(value)?,
                next: None,
            }),
            Value::Object(mut map) if matches!(map.get("results"), Some(Value::Array(_))) => {
                let results = map.remove("results").unwrap_or(Value::Array(Vec::new()));
                let next = match map.remove("next") {
                    Some(Value::String(next)) if !next.is_empty() => Some(next),
                    _ => None,
                };
                Ok(Envelope {
                    results: serde_json::from_value(results)?,
                    next,
                })
            }
            other => {
                warn!("Unexpected collection shape, treating as empty: {}", shape_of(&other));
                Ok(Envelope {
                    results: Vec::new(),
                    next: None,
                })
            }
        }
    }
}

fn shape_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
    session: SessionContext,
}

impl ApiClient {
    pub fn new(base_url: &str, session: SessionContext) -> Result<Self, ClientError> {
        Self::with_http(base_url, session, reqwest::Client::new())
    }

    pub fn from_config(config: &AppConfig, session: SessionContext) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.api.timeout_secs))
            .user_agent(config.api.user_agent.clone())
            .build()?;
        Self::with_http(&config.api.base_url, session, http)
    }

    fn with_http(
        base_url: &str,
        session: SessionContext,
        http: reqwest::Client,
    ) -> Result<Self, ClientError> {
        // Keep a trailing slash so relative joins stay under any base path
        let mut normalized = base_url.trim().trim_end_matches('/').to_string();
        normalized.push('/');
        let base_url = Url::parse(&normalized)?;
        Ok(Self {
            http,
            base_url,
            session,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    /// Resolve an API path (`/api/...`) or an absolute URL against the base URL
    pub fn url(&self, path: &str) -> Result<Url, ClientError> {
        if path.starts_with("http://") || path.starts_with("https://") {
            return Ok(Url::parse(path)?);
        }
        Ok(self.base_url.join(path.trim_start_matches('/'))?)
    }

    /// Absolute URL for an image reference returned by the backend
    pub fn image_url(&self, image: &str) -> Option<String> {
        let image = image.trim();
        if image.is_empty() {
            return None;
        }
        if image.starts_with("http://") || image.starts_with("https://") {
            return Some(image.to_string());
        }
        let relative = if image.starts_with('/') {
            image.trim_start_matches('/').to_string()
        } else {
            format!("media/{}", image)
        };
        self.base_url.join(&relative).ok().map(String::from)
    }

    /// The bearer token only goes to the configured backend's origin
    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        debug!(%method, %url, "API request");
        let same_origin = url.origin() == self.base_url.origin();
        if !same_origin {
            warn!(%url, "Request leaves the backend origin, sending it without credentials");
        }
        let builder = self.http.request(method, url);
        match self.session.token() {
            Some(token) if same_origin => builder.bearer_auth(token),
            _ => builder,
        }
    }

    async fn execute(&self, builder: RequestBuilder) -> Result<Response, ClientError> {
        let response = builder.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let err = ClientError::from_response(status.as_u16(), &body);
        warn!(status = status.as_u16(), "API request failed: {}", err);
        Err(err)
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
        let bytes = response.bytes().await?;
        // 204 and other empty bodies decode as JSON null
        let body: &[u8] = if bytes.iter().all(u8::is_ascii_whitespace) {
            b"null"
        } else {
            &bytes
        };
        serde_json::from_slice(body).map_err(|e| ClientError::decode(e.to_string()))
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        let url = self.url(path)?;
        let response = self.execute(self.request(Method::GET, url)).await?;
        Self::decode(response).await
    }

    pub async fn send_json<B, T>(&self, method: Method, path: &str, body: &B) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.url(path)?;
        let response = self.execute(self.request(method, url).json(body)).await?;
        Self::decode(response).await
    }

    /// Send a JSON body and ignore whatever the backend answers with
    pub async fn send_json_unit<B>(&self, method: Method, path: &str, body: &B) -> Result<(), ClientError>
    where
        B: Serialize + ?Sized,
    {
        let url = self.url(path)?;
        self.execute(self.request(method, url).json(body)).await?;
        Ok(())
    }

    pub async fn send_multipart<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        form: reqwest::multipart::Form,
    ) -> Result<T, ClientError> {
        let url = self.url(path)?;
        let response = self.execute(self.request(method, url).multipart(form)).await?;
        Self::decode(response).await
    }

    /// Body-less POST (action endpoints such as cancel)
    pub async fn post_action(&self, path: &str) -> Result<(), ClientError> {
        let url = self.url(path)?;
        self.execute(self.request(Method::POST, url)).await?;
        Ok(())
    }

    pub async fn delete(&self, path: &str) -> Result<(), ClientError> {
        let url = self.url(path)?;
        self.execute(self.request(Method::DELETE, url)).await?;
        Ok(())
    }

    pub async fn fetch_page<T: DeserializeOwned>(&self, path: &str) -> Result<Envelope<T>, ClientError> {
        let value: Value = self.get(path).await?;
        Envelope::from_value(value)
    }

    /// Fetch a whole collection, following `next` links until exhausted.
    ///
    /// Items come back in page order. A `next` link pointing at a page that
    /// was already fetched ends the walk.
    pub async fn fetch_all<T: DeserializeOwned>(&self, path: &str) -> Result<Vec<T>, ClientError> {
        let mut items = Vec::new();
        let mut visited = HashSet::new();
        let mut next = Some(self.url(path)?.to_string());

        while let Some(current) = next.take() {
            if !visited.insert(current.clone()) {
                warn!(url = %current, "Pagination loop detected, stopping");
                break;
            }
            let page: Envelope<T> = self.fetch_page(&current).await?;
            debug!(url = %current, count = page.results.len(), "Fetched page");
            items.extend(page.results);
            next = match page.next {
                Some(link) => Some(self.url(&link)?.to_string()),
                None => None,
            };
        }

        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn client(base: &str) -> ApiClient {
        ApiClient::new(base, SessionContext::in_memory()).unwrap()
    }

    #[test]
    fn envelope_accepts_both_shapes() {
        let paged: Envelope<i32> =
            Envelope::from_value(json!({"results": [1, 2, 3], "next": "http://x/p2"})).unwrap();
        assert_eq!(paged.results, vec![1, 2, 3]);
        assert_eq!(paged.next.as_deref(), Some("http://x/p2"));

        let bare: Envelope<i32> = Envelope::from_value(json!([4, 5])).unwrap();
        assert_eq!(bare, Envelope { results: vec![4, 5], next: None });

        let odd: Envelope<i32> = Envelope::from_value(json!({"detail": "x"})).unwrap();
        assert!(odd.results.is_empty() && odd.next.is_none());
    }

    #[test]
    fn null_next_ends_pagination() {
        let last: Envelope<i32> = Envelope::from_value(json!({"results": [], "next": null})).unwrap();
        assert_eq!(last.next, None);
    }

    #[test]
    fn urls_join_under_base_path() {
        let api = client("http://clinic.test/backend/");
        assert_eq!(
            api.url("/api/accounts/doctors").unwrap().as_str(),
            "http://clinic.test/backend/api/accounts/doctors"
        );
        assert_eq!(
            api.url("http://other.test/api/x?page=2").unwrap().as_str(),
            "http://other.test/api/x?page=2"
        );
    }

    #[test]
    fn image_urls_are_resolved() {
        let api = client("http://127.0.0.1:8000");
        assert_eq!(api.image_url(""), None);
        assert_eq!(
            api.image_url("https://cdn.test/a.png").as_deref(),
            Some("https://cdn.test/a.png")
        );
        assert_eq!(
            api.image_url("/media/doctors/a.png").as_deref(),
            Some("http://127.0.0.1:8000/media/doctors/a.png")
        );
        assert_eq!(
            api.image_url("a.png").as_deref(),
            Some("http://127.0.0.1:8000/media/a.png")
        );
    }
}
