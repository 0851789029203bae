//! Show command.

use anyhow::{Context, Result};
use clap::Args;

use crate::output::print_netconf;

use super::{AttachmentArgs, CommandContext};

/// Show the cached netconf of an attachment.
#[derive(Debug, Args)]
pub struct ShowCommand {
    #[command(flatten)]
    attachment: AttachmentArgs,
}

impl ShowCommand {
    pub fn run(self, ctx: CommandContext) -> Result<()> {
        let key = self.attachment.key()?;
        let (conf, address) = ctx
            .cache()
            .load(&key)
            .with_context(|| format!("no usable cached netconf for {}", key))?;

        print_netconf(&conf, Some(&address), ctx.format)
    }
}
