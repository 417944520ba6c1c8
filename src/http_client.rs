use std::time::Duration;

use anyhow::{Context, Result};
use once_cell::sync::OnceCell;
use reqwest::StatusCode;
use reqwest::blocking::{Client, RequestBuilder};
use reqwest::header::{ACCEPT, CACHE_CONTROL, PRAGMA, USER_AGENT};

use crate::error::{FetchError, FetchResult};

const REQUEST_TIMEOUT_SECS: u64 = 10;
const NO_CACHE: &str = "no-cache, no-store, max-age=0";

static CLIENT: OnceCell<Client> = OnceCell::new();

pub fn http_client() -> Result<&'static Client> {
    CLIENT.get_or_try_init(|| {
        Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .context("failed to build http client")
    })
}

/// One GET returning the raw body of a 2xx response.
pub trait Transport: Send + Sync {
    fn get(&self, url: &str, timeout: Duration) -> FetchResult<String>;
}

pub struct HttpTransport {
    client: &'static Client,
}

impl HttpTransport {
    pub fn shared() -> Result<Self> {
        Ok(Self {
            client: http_client()?,
        })
    }
}

impl Transport for HttpTransport {
    fn get(&self, url: &str, timeout: Duration) -> FetchResult<String> {
        let resp = build_request(self.client, url, timeout)
            .send()
            .map_err(map_reqwest_error)?;
        check_status(resp.status())?;
        resp.text().map_err(map_reqwest_error)
    }
}

/// Listing requests must bypass every intermediate cache.
fn build_request(client: &Client, url: &str, timeout: Duration) -> RequestBuilder {
    client
        .get(url)
        .header(USER_AGENT, "Mozilla/5.0")
        .header(ACCEPT, "application/json")
        .header(CACHE_CONTROL, NO_CACHE)
        .header(PRAGMA, "no-cache")
        .timeout(timeout)
}

fn check_status(status: StatusCode) -> FetchResult<()> {
    if status.is_success() {
        Ok(())
    } else {
        Err(FetchError::Status(status.as_u16()))
    }
}

fn map_reqwest_error(err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        FetchError::Timeout
    } else {
        FetchError::Network(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn requests_ask_for_fresh_json() {
        let client = Client::new();
        let request = build_request(
            &client,
            "https://games.roblox.com/v1/games?universeIds=1&_=5",
            Duration::from_millis(1_500),
        )
        .build()
        .unwrap();

        let headers = request.headers();
        assert_eq!(headers[CACHE_CONTROL], NO_CACHE);
        assert_eq!(headers[PRAGMA], "no-cache");
        assert_eq!(headers[ACCEPT], "application/json");
        assert_eq!(request.timeout(), Some(&Duration::from_millis(1_500)));
        assert_eq!(request.url().query(), Some("universeIds=1&_=5"));
    }

    #[test]
    fn non_success_status_is_reported_with_its_code() {
        assert!(check_status(StatusCode::OK).is_ok());
        assert!(check_status(StatusCode::NO_CONTENT).is_ok());
        assert_eq!(
            check_status(StatusCode::SERVICE_UNAVAILABLE),
            Err(FetchError::Status(503))
        );
        assert_eq!(
            check_status(StatusCode::NOT_FOUND),
            Err(FetchError::Status(404))
        );
    }
}
