/*!
# Horizon Wire Types

Only the fields poolvote reads are modelled; everything else in the
responses is ignored.
*/

use poolvote_batch_tx::{LedgerRejection, Receipt, TransactionResultCodes};
use serde::Deserialize;

/// Body of a successful `POST /transactions`
#[derive(Debug, Clone, Deserialize)]
pub struct TransactionResponse {
    pub hash: String,
    pub ledger: u64,
    #[serde(default)]
    pub envelope_xdr: Option<String>,
    #[serde(default)]
    pub result_xdr: Option<String>,
}

impl From<TransactionResponse> for Receipt {
    fn from(response: TransactionResponse) -> Self {
        Receipt {
            hash: response.hash,
            ledger: response.ledger,
            envelope_xdr: response.envelope_xdr,
            result_xdr: response.result_xdr,
        }
    }
}

/// Body of `GET /accounts/{id}`; the sequence arrives as a decimal string
#[derive(Debug, Clone, Deserialize)]
pub struct AccountResponse {
    pub id: Option<String>,
    pub sequence: String,
}

/// RFC 7807 problem document returned on every Horizon failure
#[derive(Debug, Clone, Deserialize)]
pub struct Problem {
    #[serde(rename = "type")]
    pub problem_type: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub status: Option<u16>,
    #[serde(default)]
    pub detail: Option<String>,
    #[serde(default)]
    pub extras: Option<ProblemExtras>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProblemExtras {
    #[serde(default)]
    pub envelope_xdr: Option<String>,
    #[serde(default)]
    pub result_xdr: Option<String>,
    #[serde(default)]
    pub result_codes: Option<TransactionResultCodes>,
}

impl Problem {
    /// Convert to the core rejection, preferring the HTTP status when the
    /// document omits its own
    pub fn into_rejection(self, http_status: u16) -> LedgerRejection {
        let extras = self.extras.unwrap_or_default();
        let mut rejection = LedgerRejection::new(self.status.unwrap_or(http_status), self.problem_type);
        rejection.title = self.title;
        rejection.detail = self.detail;
        rejection.result_xdr = extras.result_xdr;
        rejection.result_codes = extras.result_codes;
        rejection
    }
}
