//! Output formatting for CLI commands.

use std::path::Path;

use anyhow::Result;
use serde::Serialize;
use tabled::{Table, Tabled};
use vfnet_netconf::VfNetConf;

/// Output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable table format.
    #[default]
    Table,
    /// JSON format.
    Json,
}

impl OutputFormat {
    /// Parse a `--format` value; anything but `json` is a table.
    pub fn parse(s: &str) -> Self {
        match s {
            "json" => OutputFormat::Json,
            _ => OutputFormat::Table,
        }
    }
}

#[derive(Tabled)]
struct FieldRow {
    #[tabled(rename = "FIELD")]
    field: String,
    #[tabled(rename = "VALUE")]
    value: String,
}

impl FieldRow {
    fn new(field: &str, value: impl ToString) -> Self {
        Self {
            field: field.to_string(),
            value: value.to_string(),
        }
    }
}

#[derive(Serialize)]
struct CachedNetConf<'a> {
    address: &'a Path,
    netconf: &'a VfNetConf,
}

/// Render a netconf record, with its cache address if it has one.
pub fn render_netconf(
    conf: &VfNetConf,
    address: Option<&Path>,
    format: OutputFormat,
) -> Result<String> {
    match format {
        OutputFormat::Json => {
            let json = match address {
                Some(address) => serde_json::to_string_pretty(&CachedNetConf {
                    address,
                    netconf: conf,
                })?,
                None => serde_json::to_string_pretty(conf)?,
            };
            Ok(json)
        }
        OutputFormat::Table => {
            let mode = if conf.kernel_bypass {
                "kernel-bypass"
            } else {
                "netdev"
            };

            let mut rows = vec![
                FieldRow::new("device", &conf.device_id),
                FieldRow::new("pf", &conf.pf_name),
                FieldRow::new("vf index", conf.vf_index),
                FieldRow::new("mode", mode),
                FieldRow::new("host ifnames", &conf.host_if_names),
                FieldRow::new("vlan", conf.vlan),
                FieldRow::new("vlan qos", conf.vlan_qos),
            ];
            for (key, value) in &conf.extra {
                rows.push(FieldRow::new(key, value));
            }
            if let Some(address) = address {
                rows.push(FieldRow::new("cache", address.display()));
            }

            Ok(Table::new(rows).to_string())
        }
    }
}

/// Print a netconf record to stdout.
pub fn print_netconf(conf: &VfNetConf, address: Option<&Path>, format: OutputFormat) -> Result<()> {
    println!("{}", render_netconf(conf, address, format)?);
    Ok(())
}
