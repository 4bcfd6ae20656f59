use crate::{client::directory_url, errors::ClientResult};
use reqwest::Client;
use tracing::{info, warn};
use url::Url;

/// Test network faucet: creates and funds an account on request
#[derive(Debug, Clone)]
pub struct Friendbot {
    http: Client,
    url: Url,
}

impl Friendbot {
    pub fn new(url: &str) -> ClientResult<Self> {
        Ok(Self {
            http: Client::builder().build()?,
            url: directory_url(url)?,
        })
    }

    /// `Ok(false)` when the faucet answered but refused
    pub async fn fund(&self, address: &str) -> ClientResult<bool> {
        let response = self
            .http
            .get(self.url.clone())
            .query(&[("addr", address)])
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            info!(account = %address, "Funded by friendbot");
            return Ok(true);
        }

        let body = response.text().await.unwrap_or_default();
        warn!(account = %address, status = status.as_u16(), body = %body, "Friendbot refused");
        Ok(false)
    }
}
