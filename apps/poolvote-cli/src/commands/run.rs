/*!
# Run

The whole pipeline behind the `poolvote` binary:

1. generate fresh signers
2. fund them, through friendbot or from the funder's balance
3. append previously funded signers from the input keystore
4. set every signer's inflation destination

The generated signers are written to the output keystore once the run ends,
whether it finished, failed or was interrupted.
*/

use crate::{
    commands::{fund, generate, set_inflation},
    config::RunConfig,
    error::{CliError, CliResult},
};
use poolvote_batch_tx::Signer;
use poolvote_client::{Friendbot, HorizonClient};
use poolvote_keystore::{read_signers, write_signers, SignerRecord};
use poolvote_sdk::{signer_from_secret, AccountFunder, InflationSetter};
use std::{path::Path, sync::Arc};
use tracing::{error, info, warn};

/// Counts reported at the end of a run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub generated: usize,
    pub funded: usize,
    pub imported: usize,
    pub voted: usize,
}

pub async fn execute(config: &RunConfig) -> CliResult<RunSummary> {
    let generated = generate::execute(config.num_accounts);

    let result = tokio::select! {
        result = process(config, generated.clone()) => result,
        _ = tokio::signal::ctrl_c() => {
            warn!("Interrupted; saving generated signers before exiting");
            Err(CliError::Interrupted)
        }
    };

    match (save_generated(config, &generated), result) {
        (Ok(()), result) => result,
        (Err(save_err), Ok(_)) => Err(save_err),
        (Err(save_err), Err(err)) => {
            error!("Failed to save generated signers: {}", save_err);
            Err(err)
        }
    }
}

async fn process(config: &RunConfig, generated: Vec<Signer>) -> CliResult<RunSummary> {
    let mut summary = RunSummary {
        generated: generated.len(),
        ..RunSummary::default()
    };

    if config.only_generate {
        info!("Only generating signers; skipping funding and inflation");
        return Ok(summary);
    }

    let client = Arc::new(HorizonClient::new(&config.horizon_url)?);
    info!(horizon = %config.horizon_url, network = ?config.network, "Connected");

    let mut voters = if config.uses_friendbot() {
        fund_with_friendbot(config, generated).await?
    } else {
        let secret = config.funder_secret.as_deref().ok_or_else(|| {
            CliError::InvalidConfig("a funder secret is required for direct funding".to_string())
        })?;
        let funder = Arc::new(AccountFunder::new(
            secret,
            config.network,
            config.balance_range.clone(),
        )?);
        fund::directly(
            client.clone(),
            funder,
            &config.funder_address,
            generated,
            &config.batch,
        )
        .await?
    };
    summary.funded = voters.len();

    if let Some(input) = &config.input {
        let imported = load_voters(input);
        summary.imported = imported.len();
        voters.extend(imported);
    }

    let setter = Arc::new(InflationSetter::new(
        client.clone(),
        config.network,
        &config.inflation_dest,
    )?);
    let voted = set_inflation::execute(client, setter, voters, &config.batch).await?;
    summary.voted = voted.len();

    Ok(summary)
}

async fn fund_with_friendbot(config: &RunConfig, signers: Vec<Signer>) -> CliResult<Vec<Signer>> {
    let url = config.network.friendbot_url().ok_or_else(|| {
        CliError::InvalidConfig(format!("no friendbot on {:?}", config.network))
    })?;
    let friendbot = Friendbot::new(url)?;

    fund::with_faucet(signers, config.batch.max_parallel_jobs, move |signer| {
        let friendbot = friendbot.clone();
        async move {
            match friendbot.fund(signer.address()).await {
                Ok(funded) => funded,
                Err(err) => {
                    warn!(account = %signer.address(), "Friendbot request failed: {}", err);
                    false
                }
            }
        }
    })
    .await
}

/// Previously funded signers; a missing or unreadable keystore yields none
fn load_voters(path: &Path) -> Vec<Signer> {
    if !path.exists() {
        info!(path = %path.display(), "No input keystore");
        return Vec::new();
    }

    match read_signers(path, |record: &SignerRecord| signer_from_secret(&record.secret)) {
        Ok(signers) => {
            info!(path = %path.display(), count = signers.len(), "Loaded input keystore");
            signers
        }
        Err(err) => {
            warn!(path = %path.display(), "Ignoring input keystore: {}", err);
            Vec::new()
        }
    }
}

fn save_generated(config: &RunConfig, generated: &[Signer]) -> CliResult<()> {
    let Some(output) = &config.output else {
        return Ok(());
    };
    write_signers(output, generated)?;
    info!(path = %output.display(), count = generated.len(), "Saved generated signers");
    Ok(())
}
