use colored::Colorize;
use podimage::{CopyImageArgs, CopyImagePipeline};
use podimage_azure::{ArmClient, ComputeClient, IdentityCredential, PollerOptions};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to initialize logging: {}", e))?;

    let config = match CopyImageArgs::parse_normalized().validate() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{} {}", "Error:".red().bold(), e);
            eprintln!();
            eprintln!("Run `copy-image --help` for the list of flags");
            std::process::exit(1);
        }
    };

    let credential = match IdentityCredential::from_default_chain() {
        Ok(credential) => credential,
        Err(e) => {
            tracing::error!("creating credential: {}", e);
            std::process::exit(1);
        }
    };

    let arm = Arc::new(
        ArmClient::new(Arc::new(credential))
            .with_endpoint(config.arm_endpoint.as_str())
            .with_poller_options(PollerOptions {
                frequency: config.poll_interval,
            }),
    );

    if let Err(e) = arm.authenticate().await {
        tracing::error!("creating credential: {}", e);
        std::process::exit(1);
    }

    let compute = ComputeClient::new(arm, config.subscription_id.as_str());
    if let Err(e) = CopyImagePipeline::new(&compute, &config).run().await {
        tracing::error!("{}", e);
        std::process::exit(1);
    }

    Ok(())
}
