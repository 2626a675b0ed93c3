//! `medibox` — medicine lookup and daily reminder daemon.
//!
//! Usage: `medibox [config.toml]`. Commands are read from stdin, one per line;
//! reminder notifications are printed as they fire.

use std::path::PathBuf;

use anyhow::{Context, Result};
use medibox_core::MediboxConfig;
use medibox_runtime::AppContext;
use medibox_runtime::console::{self, Command, CommandError};
use medibox_runtime::telemetry;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    let config = match std::env::args_os().nth(1).map(PathBuf::from) {
        Some(path) => MediboxConfig::from_file(&path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => MediboxConfig::default(),
    };
    telemetry::init(&config.general.log_level);

    let context = match AppContext::bootstrap(config.clone()).await {
        Ok(context) => context,
        Err(e) => {
            warn!(error = %e, "Starting without the medicine catalog");
            eprintln!("{}", e.user_message());
            AppContext::offline(config)
        }
    };

    let session = context.search_session();
    let scheduler = context.start_scheduler();
    let mut notices = context.notices().subscribe();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    info!("medibox ready");
    println!("{}", console::HELP);

    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            changed = notices.changed() => {
                if changed.is_err() {
                    break;
                }
                if let Some(notice) = notices.borrow_and_update().clone() {
                    println!("[reminder] {}", notice.message);
                }
            }
            line = lines.next_line() => {
                let Some(line) = line.context("failed to read stdin")? else {
                    break;
                };
                match line.parse::<Command>() {
                    Ok(Command::Quit) => break,
                    Ok(command) => {
                        let reply = console::execute(&context, &session, command);
                        if !reply.is_empty() {
                            println!("{reply}");
                        }
                    }
                    Err(CommandError::Empty) => {}
                    Err(e) => println!("{e}"),
                }
            }
        }
    }

    scheduler.shutdown();
    info!("medibox stopped");
    Ok(())
}
