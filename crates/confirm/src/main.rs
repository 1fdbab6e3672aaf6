// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::Arc;

use clap::Parser;
use tracing::{error, info, warn};

use wallet_confirm::channel::StaticToken;
use wallet_confirm::config::Config;
use wallet_confirm::i18n::{resolve_language, system_locale, Catalog};
use wallet_confirm::loader::Loader;
use wallet_confirm::service::{Collaborators, ConfirmationService};
use wallet_confirm::terminal::{TerminalAlerter, TerminalPrompter};
use wallet_confirm::transport::WsConnector;

#[tokio::main]
async fn main() {
    let config = Config::parse();

    if let Err(e) = config.validate() {
        eprintln!("error: {e}");
        std::process::exit(2);
    }

    init_tracing(&config);

    if let Err(e) = run(config).await {
        error!("fatal: {e:#}");
        std::process::exit(1);
    }
}

fn init_tracing(config: &Config) {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("info"));

    // Prompts own stdout; logs go to stderr.
    match config.log_format.as_str() {
        "json" => {
            fmt::fmt().with_env_filter(filter).with_writer(std::io::stderr).json().init();
        }
        _ => {
            fmt::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
        }
    }
}

fn load_catalog(config: &Config) -> anyhow::Result<Catalog> {
    let system = system_locale();
    let lang = resolve_language(config.lang.as_deref(), system.as_deref(), &config.default_lang);
    info!(%lang, "ui language");
    match &config.i18n_dir {
        Some(dir) => Catalog::load_dir(dir, &lang),
        None => Catalog::bundled(&lang),
    }
}

async fn run(config: Config) -> anyhow::Result<()> {
    let kinds = config.channel_kinds()?;
    let catalog = load_catalog(&config)?;

    if config.token.is_empty() {
        warn!("no wallet token configured; the server will likely reject the channels");
    }

    let loader = Arc::new(Loader::new());
    let mut busy = loader.subscribe();
    tokio::spawn(async move {
        while busy.changed().await.is_ok() {
            let now = *busy.borrow_and_update();
            info!(busy = now, "loading indicator");
        }
    });

    let collab = Collaborators {
        connector: Arc::new(WsConnector),
        tokens: Arc::new(StaticToken(config.token.clone())),
        loader,
        translator: Arc::new(catalog),
        prompter: Arc::new(TerminalPrompter::new()),
        alerter: Arc::new(TerminalAlerter),
    };
    let service = ConfirmationService::new(&config.websocket_url, collab, config.flow_settings());

    for kind in &kinds {
        service
            .connect(*kind)
            .await
            .map_err(|e| anyhow::anyhow!("connecting {kind} channel: {e}"))?;
    }
    info!(channels = ?kinds, "waiting for confirmation requests");

    tokio::signal::ctrl_c().await?;
    info!("shutting down");
    service.close_pin();
    service.close_notification();
    Ok(())
}
