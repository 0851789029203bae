//! Error display for the CLI.

use colored::Colorize;
use vfnet_netconf::{CacheError, KeyError, ResolveError};

/// Reason code of the first library error in the chain.
pub fn reason_code(err: &anyhow::Error) -> Option<&'static str> {
    err.chain().find_map(|cause| {
        cause
            .downcast_ref::<ResolveError>()
            .map(ResolveError::reason_code)
            .or_else(|| cause.downcast_ref::<CacheError>().map(CacheError::reason_code))
            .or_else(|| cause.downcast_ref::<KeyError>().map(KeyError::reason_code))
    })
}

fn hint(reason: &str) -> Option<&'static str> {
    match reason {
        "unresolved_device_mode" => Some(
            "Hint: bind the VF to a netdev driver or to a kernel-bypass driver (e.g. vfio-pci).",
        ),
        "driver_detection_failed" => {
            Some("Hint: the VF has no netdev and no bound driver; check `lspci -k`.")
        }
        "cache_miss_or_read_error" => {
            Some("Hint: no cached netconf for this attachment; was it attached on this host?")
        }
        "ambiguous_container_id" => Some(
            "Hint: cache entries are named <container-id>-<ifname>, so container IDs \
             containing '-' cannot be cached; use the runtime's hex container ID.",
        ),
        _ => None,
    }
}

/// Print an error with its cause chain in a user-friendly format.
pub fn print_error(err: &anyhow::Error) {
    eprintln!("{} {}", "Error:".red().bold(), err);

    for cause in err.chain().skip(1) {
        eprintln!("  {} {}", "caused by:".dimmed(), cause);
    }

    if let Some(reason) = reason_code(err) {
        eprintln!("{} {}", "reason:".dimmed(), reason);
        if let Some(hint) = hint(reason) {
            eprintln!("\n{}", hint.yellow());
        }
    }
}
