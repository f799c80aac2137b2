//! `mirage simulate` — Run one simulated process and report its exit code.

use std::time::Duration;

use clap::Args;
use mirage_common::types::{Capacity, ContainerSpec, ProcessSpec, Signal};
use mirage_runtime::backend::{Backend, InMemoryBackend};
use mirage_runtime::process::parse_run_spec;

/// Arguments for the `simulate` command.
#[derive(Args, Debug)]
pub struct SimulateArgs {
    /// Run-spec payload, e.g. `{"duration_in_seconds": 3, "exit_code": 2}`.
    #[arg(long, default_value = "")]
    pub spec: String,

    /// Send a terminate signal after this many seconds.
    #[arg(long)]
    pub signal_after: Option<u64>,
}

/// Executes the `simulate` command.
///
/// # Errors
///
/// Returns an error if the async runtime cannot be built or the simulated
/// process cannot be started or awaited.
pub fn execute(args: SimulateArgs) -> anyhow::Result<()> {
    if let Err(e) = parse_run_spec(&args.spec) {
        tracing::warn!(error = %e, "spec does not decode, the process will exit immediately with 0");
    }

    let runtime = tokio::runtime::Runtime::new()?;
    let exit_code = runtime.block_on(simulate(&args))?;
    println!("exit code: {exit_code}");
    Ok(())
}

async fn simulate(args: &SimulateArgs) -> anyhow::Result<i64> {
    let backend = InMemoryBackend::new(Capacity::default(), Duration::ZERO);
    let container = backend
        .create(ContainerSpec::default())
        .map_err(|e| anyhow::anyhow!("{e}"))?;
    let process = container
        .run(&ProcessSpec::with_payload(args.spec.clone()))
        .map_err(|e| anyhow::anyhow!("{e}"))?;
    tracing::info!(handle = container.handle(), id = %process.id(), "simulating");

    if let Some(secs) = args.signal_after {
        let signaler = std::sync::Arc::clone(&process);
        drop(tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(secs)).await;
            signaler.signal(Signal::Terminate);
        }));
    }

    let exit_code = process.wait().await.map_err(|e| anyhow::anyhow!("{e}"))?;
    backend
        .destroy(container.handle())
        .map_err(|e| anyhow::anyhow!("{e}"))?;
    Ok(exit_code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn simulate_reports_encoded_exit_code() {
        let args = SimulateArgs {
            spec: r#"{"duration_in_seconds": 4, "exit_code": 6}"#.into(),
            signal_after: None,
        };
        assert_eq!(simulate(&args).await.unwrap(), 6);
    }

    #[tokio::test(start_paused = true)]
    async fn simulate_signal_cuts_the_run_short() {
        let args = SimulateArgs {
            spec: r#"{"duration_in_seconds": 60, "exit_code": 6}"#.into(),
            signal_after: Some(1),
        };
        assert_eq!(simulate(&args).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn simulate_empty_spec_exits_zero() {
        let args = SimulateArgs {
            spec: String::new(),
            signal_after: None,
        };
        assert_eq!(simulate(&args).await.unwrap(), 0);
    }
}
