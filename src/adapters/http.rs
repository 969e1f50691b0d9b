use crate::utils::error::{Result, YnaError};
use reqwest::{Client, Response};
use std::time::Duration;

const REQUEST_TIMEOUT_SECONDS: u64 = 30;

pub fn build_client() -> Result<Client> {
    let client = Client::builder()
        .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECONDS))
        .user_agent(concat!("ynamazon/", env!("CARGO_PKG_VERSION")))
        .build()?;
    Ok(client)
}

pub fn join_url(base_url: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// Non-2xx responses become [`YnaError::ApiError`] carrying the response body.
pub async fn ensure_success(service: &str, response: Response) -> Result<Response> {
    let status = response.status();
    tracing::debug!("{} API response status: {}", service, status);

    if status.is_success() {
        return Ok(response);
    }

    let message = response.text().await.unwrap_or_default();
    Err(YnaError::ApiError {
        service: service.to_string(),
        status: status.as_u16(),
        message,
    })
}
