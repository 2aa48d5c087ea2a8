//! HTTP plumbing shared by the provider adapters

use super::error_utils::ensure_success;
use crate::error::{ParleyError, ParleyResult};
use crate::llm::streaming::ChunkSender;
use reqwest::{Client, RequestBuilder, Response};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Client used by every provider adapter
pub fn http_client() -> ParleyResult<Client> {
    Client::builder()
        .connect_timeout(CONNECT_TIMEOUT)
        .user_agent(concat!("parley/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| ParleyError::http(format!("Failed to build HTTP client: {}", e)))
}

fn transport_error(error: reqwest::Error, provider: &str) -> ParleyError {
    ParleyError::Http {
        message: format!("Failed to reach {}: {}", provider, error.without_url()),
        url: None,
        status_code: None,
        context: None,
    }
}

/// Send a streaming request, giving up early if the consumer cancels.
/// Non-success statuses are reported before any body byte is decoded.
pub(crate) async fn open_stream(
    request: RequestBuilder,
    provider: &str,
    sender: &ChunkSender,
) -> ParleyResult<Response> {
    let response = tokio::select! {
        _ = sender.cancelled() => return Err(ParleyError::Cancelled),
        response = request.send() => response.map_err(|e| transport_error(e, provider))?,
    };
    debug!(provider, status = %response.status(), "stream opened");
    ensure_success(response, provider).await
}

/// Send a request and decode its JSON body
pub(crate) async fn fetch_json(request: RequestBuilder, provider: &str) -> ParleyResult<Value> {
    let response = request
        .send()
        .await
        .map_err(|e| transport_error(e, provider))?;
    let response = ensure_success(response, provider).await?;
    response.json().await.map_err(|e| {
        ParleyError::llm_with_provider(
            format!("Failed to parse {} response: {}", provider, e),
            provider,
        )
    })
}

/// Collect `items[*].<field>` strings, sorted
pub(crate) fn sorted_ids(body: &Value, items: &str, field: &str) -> Vec<String> {
    let mut ids: Vec<String> = body
        .get(items)
        .and_then(Value::as_array)
        .map(|list| {
            list.iter()
                .filter_map(|item| item.get(field).and_then(Value::as_str))
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();
    ids.sort();
    ids
}
