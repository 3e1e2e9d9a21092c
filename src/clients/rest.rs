use crate::backend::{BackendError, Filter, FilterValue, Query};
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Thin client for the data service's PostgREST endpoint (`/rest/v1/{table}`).
#[derive(Debug, Clone)]
pub struct RestClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl RestClient {
    pub fn new(base_url: &str, api_key: &str, timeout_seconds: u64) -> Result<Self, BackendError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .user_agent(concat!("voltshop/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self::with_shared_client(client, base_url, api_key))
    }

    #[must_use]
    pub fn with_shared_client(client: Client, base_url: &str, api_key: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        }
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    #[must_use]
    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    #[must_use]
    pub const fn http(&self) -> &Client {
        &self.client
    }

    fn table_url(&self, table: &str, query: &Query, select: bool) -> Result<Url, BackendError> {
        let mut url = Url::parse(&format!("{}/rest/v1/{}", self.base_url, table))
            .map_err(|e| BackendError::InvalidQuery(format!("bad data service URL: {e}")))?;

        {
            let mut pairs = url.query_pairs_mut();
            if select {
                pairs.append_pair("select", "*");
            }
            for (key, value) in query_params(query) {
                pairs.append_pair(&key, &value);
            }
        }

        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        self.client
            .request(method, url)
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }

    pub async fn select<T: DeserializeOwned>(
        &self,
        table: &str,
        query: &Query,
    ) -> Result<Vec<T>, BackendError> {
        let url = self.table_url(table, query, true)?;
        debug!(%url, "Selecting rows");

        let response = self.request(Method::GET, url).send().await?;
        decode_rows(response).await
    }

    pub async fn insert<B, T>(&self, table: &str, body: &B) -> Result<Vec<T>, BackendError>
    where
        B: Serialize + Sync,
        T: DeserializeOwned,
    {
        let url = self.table_url(table, &Query::new(), false)?;
        let response = self
            .request(Method::POST, url)
            .header("Prefer", "return=representation")
            .json(body)
            .send()
            .await?;
        decode_rows(response).await
    }

    pub async fn update<B, T>(
        &self,
        table: &str,
        query: &Query,
        body: &B,
    ) -> Result<Vec<T>, BackendError>
    where
        B: Serialize + Sync,
        T: DeserializeOwned,
    {
        let url = self.table_url(table, query, false)?;
        let response = self
            .request(Method::PATCH, url)
            .header("Prefer", "return=representation")
            .json(body)
            .send()
            .await?;
        decode_rows(response).await
    }

    /// Deletes matching rows and returns them.
    pub async fn delete<T: DeserializeOwned>(
        &self,
        table: &str,
        query: &Query,
    ) -> Result<Vec<T>, BackendError> {
        if query.filters().is_empty() {
            return Err(BackendError::InvalidQuery(format!(
                "refusing unfiltered delete on {table}"
            )));
        }

        let url = self.table_url(table, query, false)?;
        let response = self
            .request(Method::DELETE, url)
            .header("Prefer", "return=representation")
            .send()
            .await?;
        decode_rows(response).await
    }
}

async fn decode_rows<T: DeserializeOwned>(response: Response) -> Result<Vec<T>, BackendError> {
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        return Err(BackendError::Status {
            status: status.as_u16(),
            message: error_message(&body),
        });
    }

    if body.trim().is_empty() {
        return Ok(Vec::new());
    }

    serde_json::from_str(&body).map_err(|e| BackendError::Decode(e.to_string()))
}

/// Pulls the `message` field out of a PostgREST/storage/auth error body.
pub(crate) fn error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            ["message", "msg", "error_description", "error"]
                .iter()
                .find_map(|key| v.get(*key).and_then(|m| m.as_str()).map(String::from))
        })
        .unwrap_or_else(|| body.chars().take(200).collect())
}

/// Encodes a [`Query`] as PostgREST query parameters.
#[must_use]
pub fn query_params(query: &Query) -> Vec<(String, String)> {
    let mut params = Vec::with_capacity(query.filters().len() + 2);

    for filter in query.filters() {
        match filter {
            Filter::Or(any_of) => params.push(("or".to_string(), encode_or(any_of))),
            Filter::Eq(column, value) => {
                params.push(((*column).to_string(), format!("eq.{value}")));
            }
            Filter::In(column, values) => {
                params.push(((*column).to_string(), format!("in.{}", encode_list(values))));
            }
            Filter::ILike(column, pattern) => {
                params.push(((*column).to_string(), format!("ilike.{}", wildcard(pattern))));
            }
        }
    }

    if let Some(order) = query.order() {
        let direction = if order.ascending { "asc" } else { "desc" };
        params.push(("order".to_string(), format!("{}.{direction}", order.column)));
    }

    if let Some(limit) = query.row_limit() {
        params.push(("limit".to_string(), limit.to_string()));
    }

    params
}

fn encode_or(any_of: &[Filter]) -> String {
    let parts: Vec<String> = any_of.iter().map(encode_inline).collect();
    format!("({})", parts.join(","))
}

/// Filter in the `column.op.value` form used inside logical operators.
fn encode_inline(filter: &Filter) -> String {
    match filter {
        Filter::Eq(column, value) => format!("{column}.eq.{}", quote_reserved(&value.to_string())),
        Filter::In(column, values) => format!("{column}.in.{}", encode_list(values)),
        Filter::ILike(column, pattern) => {
            format!("{column}.ilike.{}", quote_reserved(&wildcard(pattern)))
        }
        Filter::Or(any_of) => format!("or{}", encode_or(any_of)),
    }
}

fn encode_list(values: &[FilterValue]) -> String {
    let items: Vec<String> = values
        .iter()
        .map(|v| match v {
            FilterValue::Int(i) => i.to_string(),
            FilterValue::Text(s) => quote(s),
        })
        .collect();
    format!("({})", items.join(","))
}

fn wildcard(pattern: &str) -> String {
    pattern.replace('%', "*")
}

fn quote(value: &str) -> String {
    format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
}

fn quote_reserved(value: &str) -> String {
    if value.contains([',', '(', ')', '"', '\\']) {
        quote(value)
    } else {
        value.to_string()
    }
}
