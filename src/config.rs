use clap::Parser;
use std::path::PathBuf;

use crate::logging::LogFormat;

#[derive(Debug, Parser)]
#[command(
    name = "temrind",
    version,
    about = "Student score roster daemon speaking line-delimited JSON over stdio"
)]
pub struct CliArgs {
    /// Open this workspace at startup instead of waiting for `workspace.select`.
    #[arg(long, env = "TEMRIND_WORKSPACE", value_name = "PATH")]
    pub workspace: Option<PathBuf>,

    #[arg(long, env = "TEMRIND_LOG_FORMAT", value_enum, default_value_t = LogFormat::Pretty)]
    pub log_format: LogFormat,

    /// tracing filter directive, e.g. `info` or `temrind=debug`.
    #[arg(long, env = "TEMRIND_LOG", default_value = "info")]
    pub log: String,
}
