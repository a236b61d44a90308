use anyhow::{anyhow, Result};
use reqwest::{
    header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE},
    Client, Method,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, error};

use shared_config::AppConfig;

/// PostgREST-flavored JSON client for the clinic's document store.
///
/// Cloning is cheap (the inner `reqwest::Client` is pooled), so handlers and
/// services share one instance created at application start.
#[derive(Clone)]
pub struct DocumentStore {
    client: Client,
    base_url: String,
    anon_key: String,
}

impl DocumentStore {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.supabase_url.clone(),
            anon_key: config.supabase_anon_key.clone(),
        }
    }

    fn headers(&self, auth_token: Option<&str>) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();

        headers.insert(
            "apikey",
            HeaderValue::from_str(&self.anon_key)
                .map_err(|_| anyhow!("API key contains invalid header characters"))?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        if let Some(token) = auth_token {
            headers.insert(
                AUTHORIZATION,
                HeaderValue::from_str(&format!("Bearer {}", token))
                    .map_err(|_| anyhow!("Auth token contains invalid header characters"))?,
            );
        }

        Ok(headers)
    }

    pub async fn request<T>(
        &self,
        method: Method,
        path: &str,
        auth_token: Option<&str>,
        body: Option<Value>,
    ) -> Result<T>
    where
        T: DeserializeOwned,
    {
        self.request_with_headers(method, path, auth_token, body, None)
            .await
    }

    pub async fn request_with_headers<T>(
        &self,
        method: Method,
        path: &str,
        auth_token: Option<&str>,
        body: Option<Value>,
        extra_headers: Option<HeaderMap>,
    ) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);
        debug!("Making request to {}", url);

        let mut headers = self.headers(auth_token)?;
        if let Some(extra) = extra_headers {
            headers.extend(extra);
        }

        let mut req = self.client.request(method, &url).headers(headers);

        if let Some(body_data) = body {
            req = req.json(&body_data);
        }

        let response = req.send().await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await?;
            error!("Store API error ({}): {}", status, error_text);

            return Err(match status.as_u16() {
                401 | 403 => anyhow!("Authentication error: {}", error_text),
                404 => anyhow!("Resource not found: {}", error_text),
                409 => anyhow!("Conflict: {}", error_text),
                _ => anyhow!("Store API error ({}): {}", status, error_text),
            });
        }

        let data = response.json::<T>().await?;
        Ok(data)
    }

    /// POST with `Prefer: return=representation`, so the created rows come
    /// back in the response body.
    pub async fn insert_returning<T>(
        &self,
        path: &str,
        auth_token: Option<&str>,
        body: Value,
    ) -> Result<Vec<T>>
    where
        T: DeserializeOwned,
    {
        self.request_with_headers(
            Method::POST,
            path,
            auth_token,
            Some(body),
            Some(Self::return_representation()),
        )
        .await
    }

    /// PATCH with `Prefer: return=representation`.
    pub async fn update_returning<T>(
        &self,
        path: &str,
        auth_token: Option<&str>,
        body: Value,
    ) -> Result<Vec<T>>
    where
        T: DeserializeOwned,
    {
        self.request_with_headers(
            Method::PATCH,
            path,
            auth_token,
            Some(body),
            Some(Self::return_representation()),
        )
        .await
    }

    fn return_representation() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("Prefer", HeaderValue::from_static("return=representation"));
        headers
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}
