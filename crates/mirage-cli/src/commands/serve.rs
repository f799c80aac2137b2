//! `mirage serve` — Host the in-memory backend until interrupted.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use clap::Args;
use mirage_common::config::MirageConfig;
use mirage_common::constants::{APP_NAME, DEFAULT_LISTEN_ADDRESS, DEFAULT_LISTEN_NETWORK};
use mirage_runtime::backend::{Backend, InMemoryBackend};

use crate::output::{format_bytes, format_duration};

/// Arguments for the `serve` command.
#[derive(Args, Debug)]
pub struct ServeArgs {
    /// How to listen on the address (unix, tcp, ...).
    #[arg(long, default_value = DEFAULT_LISTEN_NETWORK, env = "MIRAGE_LISTEN_NETWORK")]
    pub listen_network: String,

    /// Address to listen on.
    #[arg(long, default_value = DEFAULT_LISTEN_ADDRESS, env = "MIRAGE_LISTEN_ADDRESS")]
    pub listen_address: String,

    /// Time in seconds after which idle containers would be destroyed.
    #[arg(long, value_name = "SECONDS", default_value_t = 0, env = "MIRAGE_CONTAINER_GRACE_TIME_SECS")]
    pub container_grace_time_secs: u64,

    /// Total memory capacity in bytes.
    #[arg(long, default_value_t = 0, env = "MIRAGE_MEMORY_IN_BYTES")]
    pub memory_in_bytes: u64,

    /// Total disk capacity in bytes.
    #[arg(long, default_value_t = 0, env = "MIRAGE_DISK_IN_BYTES")]
    pub disk_in_bytes: u64,

    /// Maximum number of containers that can be created.
    #[arg(long, default_value_t = 0, env = "MIRAGE_MAX_CONTAINERS")]
    pub max_containers: u64,
}

impl ServeArgs {
    /// Builds the backend configuration from the parsed flags.
    pub fn config(&self) -> MirageConfig {
        MirageConfig {
            listen_network: self.listen_network.clone(),
            listen_address: self.listen_address.clone(),
            memory_in_bytes: self.memory_in_bytes,
            disk_in_bytes: self.disk_in_bytes,
            max_containers: self.max_containers,
            container_grace_time: Duration::from_secs(self.container_grace_time_secs),
        }
    }
}

/// Executes the `serve` command.
///
/// # Errors
///
/// Returns an error if the configuration is invalid, the backend fails to
/// start, or the Ctrl+C handler cannot be installed.
pub fn execute(args: ServeArgs) -> anyhow::Result<()> {
    let config = args.config();
    config.validate().map_err(|e| anyhow::anyhow!("{e}"))?;

    let backend = InMemoryBackend::from_config(&config);
    backend.start().map_err(|e| anyhow::anyhow!("{e}"))?;
    tracing::info!(
        app = APP_NAME,
        network = %config.listen_network,
        addr = %config.listen_address,
        memory = %format_bytes(config.memory_in_bytes),
        disk = %format_bytes(config.disk_in_bytes),
        max_containers = config.max_containers,
        grace_time = %format_duration(config.container_grace_time),
        "started"
    );

    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    })
    .map_err(|e| anyhow::anyhow!("failed to set Ctrl+C handler: {e}"))?;

    while running.load(Ordering::SeqCst) {
        std::thread::sleep(Duration::from_millis(250));
    }

    backend.stop();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_carries_every_flag() {
        let args = ServeArgs {
            listen_network: "tcp".into(),
            listen_address: "127.0.0.1:7777".into(),
            container_grace_time_secs: 30,
            memory_in_bytes: 1024,
            disk_in_bytes: 2048,
            max_containers: 4,
        };
        let config = args.config();
        assert_eq!(config.listen_network, "tcp");
        assert_eq!(config.container_grace_time, Duration::from_secs(30));
        assert_eq!(config.capacity().max_containers, 4);
        assert!(config.validate().is_ok());
    }
}
