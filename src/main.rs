mod app;
mod calc;
mod config;
mod db;
mod ipc;
mod logging;
mod model;
mod store;
mod validate;

use clap::Parser;
use std::io::{self, BufRead, Write};
use tracing::{debug, error, info, warn};

fn main() -> anyhow::Result<()> {
    let cli = config::CliArgs::parse();
    logging::init_logging(cli.log_format, &cli.log)?;
    info!(version = env!("CARGO_PKG_VERSION"), "temrind starting");

    let mut state = ipc::AppState::default();
    if let Some(path) = cli.workspace.as_deref() {
        if let Err(e) = ipc::open_workspace(&mut state, path) {
            // Keep serving; the shell can still pick another workspace.
            error!(workspace = %path.display(), error = %e, "startup workspace failed to open");
        }
    }

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(v) => v,
            Err(e) => {
                warn!(error = %e, "stdin read failed");
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        let req: ipc::Request = match serde_json::from_str(&line) {
            Ok(v) => v,
            Err(e) => {
                // Can't reply without id.
                let body = serde_json::json!({
                    "ok": false,
                    "error": { "code": "bad_json", "message": e.to_string() }
                });
                let _ = writeln!(stdout, "{body}");
                let _ = stdout.flush();
                continue;
            }
        };

        debug!(id = %req.id, method = %req.method, "request");
        let resp = ipc::handle_request(&mut state, req);
        let _ = writeln!(
            stdout,
            "{}",
            serde_json::to_string(&resp).unwrap_or_else(|_| "{\"ok\":false}".to_string())
        );
        let _ = stdout.flush();
    }

    state.close();
    info!("temrind stopped");
    Ok(())
}
