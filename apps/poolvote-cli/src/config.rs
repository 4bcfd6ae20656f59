use crate::{
    error::{CliError, CliResult},
    Cli,
};
use poolvote_batch_tx::TxBatchConfig;
use poolvote_keystore::keystore_path;
use poolvote_sdk::{address_from_secret, public_key_from_address, Network};
use std::{ops::Range, path::PathBuf};
use tracing::warn;

/// Funding account used when `--src` is not given
pub const DEFAULT_FUNDER: &str = "GCFXD4OBX4TZ5GGBWIXLIJHTU2Z6OWVPYYU44QSKCCU7P2RGFOOHTEST";

/// Lowest accepted starting balance, in stroops
pub const MIN_STARTING_BALANCE: i64 = 10_000_000;

/// Length of an encoded secret seed
const SECRET_LEN: usize = 56;

/// Validated settings for one run
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub network: Network,
    pub horizon_url: String,

    /// Account whose sequence drives direct funding
    pub funder_address: String,
    pub funder_secret: Option<String>,
    pub inflation_dest: String,

    /// Keystore to read extra voters from; `None` when disabled
    pub input: Option<PathBuf>,
    /// Keystore the generated signers are saved to; `None` when disabled
    pub output: Option<PathBuf>,

    pub num_accounts: usize,
    pub balance_range: Range<i64>,
    pub batch: TxBatchConfig,

    pub use_sink: bool,
    pub only_generate: bool,
}

impl RunConfig {
    /// Clamp the numeric flags into range and reject unusable combinations
    pub fn from_args(args: Cli) -> CliResult<Self> {
        let num_accounts = args.num.max(0) as usize;
        let ops_per_tx = TxBatchConfig::clamp_ops_per_tx(args.ops);

        let mut min = args.min.max(MIN_STARTING_BALANCE);
        let mut max = args.max.max(MIN_STARTING_BALANCE + 1);
        if min == max {
            max = min + 1;
        }
        if max < min {
            std::mem::swap(&mut min, &mut max);
        }

        let funder_secret = match args.sec.as_str() {
            "" => None,
            secret if !secret.starts_with('S') || secret.len() < SECRET_LEN => {
                return Err(CliError::InvalidConfig("Invalid secret key".to_string()));
            }
            secret => Some(secret.to_string()),
        };

        if funder_secret.is_none() && !args.sink && !args.only_generate {
            return Err(CliError::InvalidConfig(
                "Provide a secret key or set a flag like 'sink' or 'only-generate'".to_string(),
            ));
        }

        let network = Network::from_live_flag(args.live);
        if args.sink && args.live && funder_secret.is_none() && !args.only_generate {
            return Err(CliError::InvalidConfig(
                "friendbot only exists on testnet; provide a secret key to fund on livenet"
                    .to_string(),
            ));
        }

        let funder_address = match &funder_secret {
            Some(secret) => {
                let derived = address_from_secret(secret)
                    .map_err(|e| CliError::InvalidConfig(format!("Invalid secret key: {}", e)))?;
                if derived != args.src {
                    warn!(
                        src = %args.src,
                        account = %derived,
                        "--src does not match --sec; funding from the secret's account"
                    );
                }
                derived
            }
            None => args.src.clone(),
        };

        let inflation_dest = args.dest.unwrap_or_else(|| args.src.clone());
        if !args.only_generate && public_key_from_address(&inflation_dest).is_err() {
            return Err(CliError::InvalidConfig(format!(
                "Invalid inflation destination: {}",
                inflation_dest
            )));
        }

        let horizon_url = if args.horizon.is_empty() {
            network.default_horizon_url().to_string()
        } else {
            args.horizon
        };

        let batch = TxBatchConfig {
            ops_per_tx,
            ..TxBatchConfig::default()
        };
        batch.validate()?;

        Ok(Self {
            network,
            horizon_url,
            funder_address,
            funder_secret,
            inflation_dest,
            input: non_empty_keystore(&args.input),
            output: non_empty_keystore(&args.output),
            num_accounts,
            balance_range: min..max,
            batch,
            use_sink: args.sink,
            only_generate: args.only_generate,
        })
    }

    /// Friendbot funds the accounts instead of the funder's balance
    pub fn uses_friendbot(&self) -> bool {
        self.use_sink && self.network == Network::Test
    }

    pub fn input_display(&self) -> String {
        self.input
            .as_ref()
            .map(|path| path.display().to_string())
            .unwrap_or_else(|| "-".to_string())
    }
}

fn non_empty_keystore(name: &str) -> Option<PathBuf> {
    (!name.is_empty()).then(|| keystore_path(name))
}
