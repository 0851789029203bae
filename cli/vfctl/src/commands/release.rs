//! Release command.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use tracing::debug;
use vfnet_netconf::{BlobStore, CacheKey, ConfigCache, VfNetConf};

use crate::output::print_netconf;

use super::{AttachmentArgs, CommandContext};

/// Load the cached netconf of a detached attachment, then drop the entry.
#[derive(Debug, Args)]
pub struct ReleaseCommand {
    #[command(flatten)]
    attachment: AttachmentArgs,
}

impl ReleaseCommand {
    pub fn run(self, ctx: CommandContext) -> Result<()> {
        let key = self.attachment.key()?;
        let (conf, address) = release(&ctx.cache(), &key)?;

        print_netconf(&conf, Some(&address), ctx.format)
    }
}

/// Read back the record stored at attach time and remove its entry.
pub(crate) fn release<S: BlobStore>(
    cache: &ConfigCache<S>,
    key: &CacheKey,
) -> Result<(VfNetConf, PathBuf)> {
    let (conf, address) = cache
        .load(key)
        .with_context(|| format!("no usable cached netconf for {}", key))?;

    cache
        .remove(&address)
        .with_context(|| format!("failed to remove cached netconf for {}", key))?;

    debug!(key = %key, address = %address.display(), "Released cached netconf");
    Ok((conf, address))
}
