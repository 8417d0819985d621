//! Command-line and environment configuration.

use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "refund_engine", about = "Season refund reporting service")]
pub struct Arguments {
    /// Address the HTTP server binds to.
    #[clap(long, env = "REFUND_BIND_ADDR", default_value = "127.0.0.1:3000")]
    pub bind_addr: SocketAddr,

    /// Directory holding one JSON file per season.
    #[clap(long, env = "REFUND_DATA_DIR", default_value = "seasons")]
    pub data_dir: PathBuf,

    /// Comma-separated emails of administrators.
    #[clap(long, env = "ADMIN_EMAILS", value_delimiter = ',', default_value = "")]
    pub admin_emails: Vec<String>,

    /// UTC offset of the study's reference time zone, in hours. Day
    /// boundaries and the past-due cutoff follow this zone.
    #[clap(
        long,
        env = "REFUND_UTC_OFFSET_HOURS",
        default_value = "9",
        allow_negative_numbers = true,
        value_parser = clap::value_parser!(i32).range(-23..=23),
    )]
    pub utc_offset_hours: i32,

    /// Tracing filter, same syntax as `RUST_LOG`.
    #[clap(long, env = "REFUND_LOG", default_value = "info,refund_engine=debug")]
    pub log_filter: String,
}

impl std::fmt::Display for Arguments {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "bind_addr: {}", self.bind_addr)?;
        writeln!(f, "data_dir: {}", self.data_dir.display())?;
        let admins = self.admin_emails.iter().filter(|e| !e.trim().is_empty()).count();
        writeln!(f, "admin_emails: {admins} configured")?;
        writeln!(f, "utc_offset_hours: {}", self.utc_offset_hours)?;
        writeln!(f, "log_filter: {}", self.log_filter)?;
        Ok(())
    }
}
