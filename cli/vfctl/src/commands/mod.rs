//! CLI commands.

mod release;
mod resolve;
mod show;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use vfnet_netconf::{CacheKey, ConfigCache, ConfigResolver, FsBlobStore};
use vfnet_sysfs::SysfsHost;

use crate::config::Config;
use crate::output::OutputFormat;

/// vfctl - Resolve, cache and release SR-IOV VF network configurations.
#[derive(Debug, Parser)]
#[command(name = "vfctl")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Output format (table or json).
    #[arg(long, global = true, default_value = "table")]
    format: String,

    /// Directory holding cached netconf entries.
    #[arg(long, global = true)]
    cache_dir: Option<PathBuf>,

    /// Sysfs mount point used for VF introspection.
    #[arg(long, global = true)]
    sysfs_root: Option<PathBuf>,

    /// Emit logs as JSON lines on stderr.
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Resolve a netconf against host state, caching it for an attachment.
    Resolve(resolve::ResolveCommand),

    /// Show the cached netconf of an attachment.
    Show(show::ShowCommand),

    /// Remove the cached netconf of a detached attachment.
    Release(release::ReleaseCommand),
}

impl Cli {
    /// Whether logs should be emitted as JSON.
    pub fn log_json(&self) -> bool {
        self.log_json
    }

    /// Run the CLI command.
    pub fn run(self) -> Result<()> {
        let format = OutputFormat::parse(&self.format);

        let mut config = Config::from_env()?;
        if let Some(dir) = self.cache_dir {
            config.cache_dir = dir;
        }
        if let Some(root) = self.sysfs_root {
            config.sysfs_root = root;
        }

        let ctx = CommandContext { config, format };

        match self.command {
            Commands::Resolve(cmd) => cmd.run(ctx),
            Commands::Show(cmd) => cmd.run(ctx),
            Commands::Release(cmd) => cmd.run(ctx),
        }
    }
}

/// Identity of one container interface attachment.
#[derive(Debug, Args)]
pub struct AttachmentArgs {
    /// Container ID of the attachment.
    #[arg(long, env = "CNI_CONTAINERID")]
    container_id: String,

    /// Interface name inside the container.
    #[arg(long, env = "CNI_IFNAME")]
    ifname: String,
}

impl AttachmentArgs {
    pub fn key(&self) -> Result<CacheKey> {
        CacheKey::new(&self.container_id, &self.ifname).with_context(|| {
            format!(
                "invalid attachment {}/{}",
                self.container_id, self.ifname
            )
        })
    }
}

/// Shared command context.
pub struct CommandContext {
    pub config: Config,
    pub format: OutputFormat,
}

impl CommandContext {
    /// Resolver backed by the configured sysfs tree.
    pub fn resolver(&self) -> ConfigResolver<SysfsHost> {
        ConfigResolver::new(self.config.sysfs_host())
    }

    /// Cache backed by the configured directory.
    pub fn cache(&self) -> ConfigCache<FsBlobStore> {
        ConfigCache::new(self.config.cache_config(), FsBlobStore::new())
    }
}
