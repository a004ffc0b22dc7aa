//! Web server command.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Args;
use colored::Colorize;
use taskdeck_core::realtime::{ConnectionConfig, HubConfig};
use taskdeck_db::{MemoryStore, RedisStore, SharedStore};
use taskdeck_web::ServerConfig;

#[derive(Args)]
pub struct ServeArgs {
    /// Port to listen on
    #[arg(long, env = "TASKDECK_PORT", default_value = "3030")]
    pub port: u16,

    /// Host to bind to
    #[arg(long, env = "TASKDECK_HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Redis connection URL. Data is kept in memory when omitted.
    #[arg(long, env = "TASKDECK_REDIS_URL")]
    pub redis_url: Option<String>,

    /// Seconds between WebSocket pings
    #[arg(long, env = "TASKDECK_HEARTBEAT_SECS", default_value = "60")]
    pub heartbeat_secs: u64,

    /// Events buffered per connection before it is dropped as unresponsive
    #[arg(long, env = "TASKDECK_QUEUE_CAPACITY", default_value = "256")]
    pub queue_capacity: usize,

    /// Seconds allowed for a single WebSocket write
    #[arg(long, env = "TASKDECK_WRITE_TIMEOUT_SECS", default_value = "10")]
    pub write_timeout_secs: u64,

    /// Seconds of client silence before the connection is dropped
    #[arg(long, env = "TASKDECK_IDLE_TIMEOUT_SECS", default_value = "90")]
    pub idle_timeout_secs: u64,

    /// Seconds to wait for connections to close on shutdown
    #[arg(long, env = "TASKDECK_SHUTDOWN_GRACE_SECS", default_value = "5")]
    pub shutdown_grace_secs: u64,

    /// Requests per minute allowed from one client (0 disables the limit)
    #[arg(long, env = "TASKDECK_RATE_LIMIT", default_value = "100")]
    pub rate_limit: u32,

    /// Also write logs to this file
    #[arg(long, env = "TASKDECK_LOG_FILE")]
    pub log_file: Option<PathBuf>,
}

impl ServeArgs {
    /// Build the server configuration. The heartbeat must fire before the
    /// idle timeout, or quiet but healthy clients would be dropped.
    pub fn server_config(&self) -> Result<ServerConfig> {
        if self.heartbeat_secs >= self.idle_timeout_secs {
            bail!(
                "--heartbeat-secs ({}) must be shorter than --idle-timeout-secs ({})",
                self.heartbeat_secs,
                self.idle_timeout_secs
            );
        }
        Ok(ServerConfig {
            host: self.host.clone(),
            port: self.port,
            hub: HubConfig {
                queue_capacity: self.queue_capacity,
                shutdown_grace: Duration::from_secs(self.shutdown_grace_secs),
            },
            connection: ConnectionConfig {
                heartbeat_interval: Duration::from_secs(self.heartbeat_secs),
                write_timeout: Duration::from_secs(self.write_timeout_secs),
                idle_timeout: Duration::from_secs(self.idle_timeout_secs),
            },
            rate_limit_per_minute: self.rate_limit,
        })
    }
}

pub async fn execute(args: ServeArgs) -> Result<()> {
    let config = args.server_config()?;

    let (store, storage): (SharedStore, String) = match &args.redis_url {
        Some(url) => {
            let store = RedisStore::connect(url)
                .await
                .with_context(|| format!("Failed to connect to Redis at {}", url))?;
            (Arc::new(store), format!("redis ({})", url))
        }
        None => (Arc::new(MemoryStore::new()), "in-memory".to_string()),
    };

    println!();
    println!("  {} {}", "Taskdeck".cyan().bold(), "Server".bold());
    println!();
    println!("  {}        http://{}/api", "API".green(), config.addr());
    println!("  {}  ws://{}/ws", "WebSocket".green(), config.addr());
    println!("  {}    {}", "Storage".green(), storage);
    println!();
    println!("  {}", "Ctrl+C to stop".dimmed());
    println!();

    taskdeck_web::run_server(config, store).await?;

    Ok(())
}
