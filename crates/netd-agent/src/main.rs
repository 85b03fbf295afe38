//! Discovery agent entry point: loads configuration and a job
//! specification, wires the XML/HTTP reporter and SNMP transports, and
//! runs the scheduler to completion or abort.

mod job_spec;
mod reporting_xml;

use anyhow::{Context, Result};
use clap::Parser;
use netd_core::Config;
use netd_engine::DiscoveryTask;
use netd_net::ProbeCapabilities;
use reporting_xml::XmlHttpReporter;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

#[derive(Debug, Parser)]
#[command(name = "netd-agent", version, about = "Network discovery agent")]
struct Args {
    /// TOML configuration file (server URL, agent/device id, target expiration).
    #[arg(long)]
    config: PathBuf,

    /// JSON job specification (RANGEIP/PARAM/AUTHENTICATION per option).
    #[arg(long)]
    jobs: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    run(args).await
}

async fn run(args: Args) -> Result<()> {
    let config = Config::load_from_file(&args.config)
        .with_context(|| format!("loading config from {:?}", args.config))?;

    let job_spec_contents = std::fs::read_to_string(&args.jobs)
        .with_context(|| format!("reading job spec from {:?}", args.jobs))?;
    let job_spec_file: job_spec::JobSpecFile = serde_json::from_str(&job_spec_contents)
        .with_context(|| format!("parsing job spec from {:?}", args.jobs))?;
    let jobs = job_spec::assemble_jobs(job_spec_file);

    if jobs.is_empty() {
        info!("no valid jobs in spec, disabling task");
        return Ok(());
    }

    let client = reqwest::Client::new();
    let reporter = Arc::new(XmlHttpReporter::new(
        client,
        config.server_url.clone(),
        config.agent_device_id.clone(),
        config.agent_version.clone(),
        config.module_version.clone(),
    ));

    let capabilities = ProbeCapabilities::detect();
    let task = DiscoveryTask::new(
        jobs,
        reporter,
        capabilities,
        config.agent_version.clone(),
        Duration::from_secs(config.effective_target_expiration_secs()),
    );

    let abort = task.abort_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("termination signal received, requesting graceful abort");
            abort.set();
        }
    });

    let summary = task.run().await;
    if summary.aborted {
        info!("discovery run aborted");
    } else {
        info!("discovery run completed");
    }
    Ok(())
}
