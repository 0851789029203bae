//! Resolve command.

use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Args;
use tracing::debug;
use vfnet_netconf::{BlobStore, CacheKey, ConfigCache, ConfigResolver, HostIntrospection, VfNetConf};

use crate::output::{print_netconf, OutputFormat};

use super::CommandContext;

/// Resolve a netconf document and optionally cache it for an attachment.
#[derive(Debug, Args)]
pub struct ResolveCommand {
    /// Netconf JSON file (reads stdin when omitted).
    #[arg(long, short)]
    input: Option<PathBuf>,

    /// Container ID; the result is cached when given together with --ifname.
    #[arg(long, env = "CNI_CONTAINERID")]
    container_id: Option<String>,

    /// Interface name inside the container.
    #[arg(long, env = "CNI_IFNAME")]
    ifname: Option<String>,
}

impl ResolveCommand {
    pub fn run(self, ctx: CommandContext) -> Result<()> {
        let raw = read_input(self.input.as_deref())?;

        let key = match (self.container_id.as_deref(), self.ifname.as_deref()) {
            (Some(container_id), Some(ifname)) => Some(
                CacheKey::new(container_id, ifname)
                    .with_context(|| format!("invalid attachment {}/{}", container_id, ifname))?,
            ),
            (None, None) => None,
            _ => bail!("--container-id and --ifname must be given together"),
        };

        let (conf, address) = resolve_and_cache(&raw, &ctx.resolver(), &ctx.cache(), key.as_ref())?;

        // Resolved records go to stdout as JSON so they can be piped into the next stage.
        print_netconf(&conf, address.as_deref(), OutputFormat::Json)
    }
}

fn read_input(path: Option<&Path>) -> Result<Vec<u8>> {
    match path {
        Some(path) => {
            fs::read(path).with_context(|| format!("failed to read netconf from {}", path.display()))
        }
        None => {
            let mut buf = Vec::new();
            io::stdin()
                .read_to_end(&mut buf)
                .context("failed to read netconf from stdin")?;
            Ok(buf)
        }
    }
}

/// Resolve `raw` and, when a key is given, store the result under it.
pub(crate) fn resolve_and_cache<H, S>(
    raw: &[u8],
    resolver: &ConfigResolver<H>,
    cache: &ConfigCache<S>,
    key: Option<&CacheKey>,
) -> Result<(VfNetConf, Option<PathBuf>)>
where
    H: HostIntrospection,
    S: BlobStore,
{
    let conf = resolver.resolve(raw).context("failed to resolve netconf")?;

    let address = match key {
        Some(key) => {
            let address = cache
                .store(key, &conf)
                .with_context(|| format!("failed to cache netconf for {}", key))?;
            debug!(key = %key, address = %address.display(), "Cached netconf for attachment");
            Some(address)
        }
        None => None,
    };

    Ok((conf, address))
}
