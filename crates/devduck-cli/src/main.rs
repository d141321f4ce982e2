//! devduck: terminal front-end for the DevDuck router
//!
//! Reads one message per line from stdin, prints the selected tool and
//! streams the reply as it arrives. `bye` ends the session; Ctrl-C stops
//! the reply in flight.

mod cli;

use std::error::Error;
use std::io::Write;
use std::sync::Arc;

use devduck_core::config::{ConfigLevel, ConfigProvider, FileConfigProvider};
use devduck_core::{secrets, Router, SessionContext, TracingLogger};
use futures::StreamExt;
use tokio::io::{AsyncBufReadExt, BufReader};

const EXIT_WORD: &str = "bye";

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let args = cli::parse();

    let filter = match cli::filter_directive(args.log_level.as_deref()) {
        Some(directive) => tracing_subscriber::EnvFilter::new(directive),
        None => tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "devduck=info,devduck_cli=info".into()),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let provider = match &args.config {
        Some(path) => FileConfigProvider::new(path, ConfigLevel::User),
        None => FileConfigProvider::discover(std::env::current_dir()?),
    };
    tracing::info!(path = %provider.path().display(), exists = provider.exists(), "Loading config");

    let config = provider.get_config().await?;
    config.validate()?;
    let router = config.build_router(&secrets::default_store(), Arc::new(TracingLogger))?;

    repl(&router, SessionContext::new(args.session)).await
}

async fn repl(router: &Router, mut session: SessionContext) -> Result<(), Box<dyn Error>> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = std::io::stdout();

    loop {
        print!("> ");
        stdout.flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let text = line.trim();
        if text.is_empty() {
            continue;
        }
        if text.eq_ignore_ascii_case(EXIT_WORD) {
            println!("Goodbye!");
            break;
        }

        let mut exchange = match router.route(&mut session, text).await {
            Ok(exchange) => exchange,
            Err(e) => {
                tracing::error!(error = %e, "Routing failed");
                eprintln!("error: {}", e);
                continue;
            }
        };

        println!("**Selected tool: {}**", exchange.tool());
        let finished = loop {
            tokio::select! {
                fragment = exchange.next() => match fragment {
                    Some(Ok(text)) => {
                        print!("{}", text);
                        stdout.flush()?;
                    }
                    Some(Err(e)) => break Err(e),
                    None => break Ok(()),
                },
                _ = tokio::signal::ctrl_c() => exchange.cancel(),
            }
        };
        println!();

        match finished {
            Ok(()) => {
                exchange.commit()?;
            }
            Err(e) if e.is_cancelled() => {
                tracing::info!("Reply cancelled");
            }
            Err(e) => {
                tracing::error!(tool = exchange.tool(), error = %e, "Reply failed");
                eprintln!("error: {}", e);
            }
        }
    }

    Ok(())
}
