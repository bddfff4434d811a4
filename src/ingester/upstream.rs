//! Upstream XKCD HTTP client (spec §6): `GET {base}/{id}/info.0.json`,
//! decoded into `num/img/title/safe_title/transcript/alt`. Grounded on
//! the teacher's `scrapers/http_client` reqwest usage and the Go
//! `xkcd/xkcd.go` adapter's field mapping and 404 handling.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::models::XkcdInfo;

#[derive(Debug, Deserialize)]
struct XkcdApiResponse {
    num: i64,
    img: String,
    title: String,
    safe_title: String,
    transcript: String,
    alt: String,
}

impl From<XkcdApiResponse> for XkcdInfo {
    fn from(r: XkcdApiResponse) -> Self {
        Self {
            id: r.num,
            url: r.img,
            description: format!("{} {} {} {}", r.title, r.safe_title, r.transcript, r.alt),
        }
    }
}

/// Capability interface for the upstream comic source, so the ingester's
/// pipeline can be tested against a stub (spec §9).
#[async_trait]
pub trait UpstreamSource: Send + Sync {
    /// Fetch a single comic by id. Id 404 is the caller's responsibility
    /// to special-case (spec §4.3) - this trait only models the HTTP
    /// contract.
    async fn fetch(&self, id: i64) -> AppResult<XkcdInfo>;

    /// The most recent comic id published upstream.
    async fn latest_id(&self) -> AppResult<i64>;
}

pub struct XkcdClient {
    client: reqwest::Client,
    base_url: String,
}

impl XkcdClient {
    pub fn new(base_url: String, timeout: Duration) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Internal(format!("failed to build http client: {e}")))?;
        Ok(Self { client, base_url })
    }

    async fn fetch_url(&self, url: String) -> AppResult<XkcdApiResponse> {
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| AppError::Unavailable(format!("upstream request failed: {e}")))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(AppError::NotFound(format!("no comic at {url}")));
        }
        if !response.status().is_success() {
            return Err(AppError::Unavailable(format!(
                "upstream returned {}",
                response.status()
            )));
        }

        response
            .json::<XkcdApiResponse>()
            .await
            .map_err(|e| AppError::Internal(format!("failed to decode upstream response: {e}")))
    }
}

#[async_trait]
impl UpstreamSource for XkcdClient {
    async fn fetch(&self, id: i64) -> AppResult<XkcdInfo> {
        let url = format!("{}/{}/info.0.json", self.base_url, id);
        self.fetch_url(url).await.map(Into::into)
    }

    async fn latest_id(&self) -> AppResult<i64> {
        let url = format!("{}/info.0.json", self.base_url);
        let response = self.fetch_url(url).await?;
        Ok(response.num)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_api_fields_into_description() {
        let response = XkcdApiResponse {
            num: 1,
            img: "https://imgs.xkcd.com/comics/barrel.jpg".to_string(),
            title: "Barrel".to_string(),
            safe_title: "Barrel".to_string(),
            transcript: "A barrel falls".to_string(),
            alt: "Cyanide".to_string(),
        };
        let info: XkcdInfo = response.into();
        assert_eq!(info.id, 1);
        assert_eq!(info.url, "https://imgs.xkcd.com/comics/barrel.jpg");
        assert_eq!(info.description, "Barrel Barrel A barrel falls Cyanide");
    }

    #[tokio::test]
    async fn fetch_decodes_a_successful_response() {
        let server = httpmock::MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(httpmock::Method::GET).path("/1/info.0.json");
            then.status(200).json_body(serde_json::json!({
                "num": 1,
                "img": "https://imgs.xkcd.com/comics/barrel.jpg",
                "title": "Barrel - Part 1",
                "safe_title": "Barrel - Part 1",
                "transcript": "",
                "alt": "Cyanide?"
            }));
        });

        let client = XkcdClient::new(server.base_url(), Duration::from_secs(5)).unwrap();
        let info = client.fetch(1).await.unwrap();

        mock.assert();
        assert_eq!(info.id, 1);
        assert_eq!(info.url, "https://imgs.xkcd.com/comics/barrel.jpg");
    }

    #[tokio::test]
    async fn fetch_maps_404_to_not_found() {
        let server = httpmock::MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(httpmock::Method::GET).path("/404/info.0.json");
            then.status(404);
        });

        let client = XkcdClient::new(server.base_url(), Duration::from_secs(5)).unwrap();
        let err = client.fetch(404).await.unwrap_err();

        mock.assert();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn latest_id_reads_num_from_the_index_endpoint() {
        let server = httpmock::MockServer::start();
        server.mock(|when, then| {
            when.method(httpmock::Method::GET).path("/info.0.json");
            then.status(200).json_body(serde_json::json!({
                "num": 2955,
                "img": "https://imgs.xkcd.com/comics/latest.png",
                "title": "Latest",
                "safe_title": "Latest",
                "transcript": "",
                "alt": ""
            }));
        });

        let client = XkcdClient::new(server.base_url(), Duration::from_secs(5)).unwrap();
        assert_eq!(client.latest_id().await.unwrap(), 2955);
    }
}
