/*!
# Horizon Client

[`LedgerClient`] over the Horizon REST API.
*/

use crate::{
    errors::ClientResult,
    types::{AccountResponse, Problem, TransactionResponse},
};
use poolvote_batch_tx::{async_trait, Envelope, LedgerClient, LedgerError, Receipt};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use tracing::{debug, info};
use url::Url;

#[derive(Debug, Clone)]
pub struct HorizonClient {
    http: Client,
    base_url: Url,
}

impl HorizonClient {
    pub fn new(base_url: &str) -> ClientResult<Self> {
        Self::with_http_client(Client::builder().build()?, base_url)
    }

    /// Share an existing connection pool
    pub fn with_http_client(http: Client, base_url: &str) -> ClientResult<Self> {
        Ok(Self {
            http,
            base_url: directory_url(base_url)?,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url, LedgerError> {
        self.base_url
            .join(path)
            .map_err(|e| LedgerError::Transport(format!("invalid endpoint {}: {}", path, e)))
    }
}

/// Parse `base` so that relative joins land below its path
pub(crate) fn directory_url(base: &str) -> ClientResult<Url> {
    let mut url = Url::parse(base)?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

fn transport(err: reqwest::Error) -> LedgerError {
    LedgerError::Transport(err.to_string())
}

/// 2xx bodies decode into `T`; anything else must be a problem document
async fn read_response<T: DeserializeOwned>(response: Response) -> Result<T, LedgerError> {
    let status = response.status();
    let body = response.text().await.map_err(transport)?;

    if status.is_success() {
        return serde_json::from_str(&body)
            .map_err(|e| LedgerError::Decode(format!("unexpected response body: {}", e)));
    }

    match serde_json::from_str::<Problem>(&body) {
        Ok(problem) => Err(LedgerError::rejected(problem.into_rejection(status.as_u16()))),
        Err(_) => Err(LedgerError::Decode(format!(
            "status {} without a problem document: {}",
            status, body
        ))),
    }
}

#[async_trait]
impl LedgerClient for HorizonClient {
    async fn submit_transaction(&self, envelope: &Envelope) -> Result<Receipt, LedgerError> {
        let url = self.endpoint("transactions")?;
        let response = self
            .http
            .post(url)
            .form(&[("tx", envelope.as_str())])
            .send()
            .await
            .map_err(transport)?;

        let transaction: TransactionResponse = read_response(response).await?;
        info!(
            hash = %transaction.hash,
            ledger = transaction.ledger,
            "Transaction applied"
        );
        Ok(transaction.into())
    }

    async fn sequence_for_account(&self, address: &str) -> Result<i64, LedgerError> {
        let url = self.endpoint(&format!("accounts/{}", address))?;
        let response = self.http.get(url).send().await.map_err(transport)?;

        let account: AccountResponse = read_response(response).await?;
        let sequence = account.sequence.parse::<i64>().map_err(|e| {
            LedgerError::Decode(format!(
                "sequence {:?} for {} is not an integer: {}",
                account.sequence, address, e
            ))
        })?;
        debug!(account = %address, sequence, "Loaded account");
        Ok(sequence)
    }
}
