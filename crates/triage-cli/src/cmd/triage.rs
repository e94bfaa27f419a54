use crate::{interval, output};
use anyhow::{Context, Result};
use github_client::Client;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use triage_core::{Profile, SystemBrowser, Triage};

pub struct Options {
    pub profile: String,
    pub watch: bool,
    pub interval: String,
}

pub fn run(opts: Options) -> Result<()> {
    let profile = Profile::load(&opts.profile)?;
    let interval = if opts.watch {
        Some(interval::parse(&opts.interval).context("invalid interval")?)
    } else {
        None
    };
    let client = Client::from_env()?;
    tracing::debug!(base_url = client.base_url(), "using GitHub API");

    let mut triage = Triage::new(
        profile,
        Arc::new(client),
        Arc::new(SystemBrowser),
        output::stdout_renderer(),
        Box::new(std::io::stdout()),
    );

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async move {
        match interval {
            Some(every) => watch(&mut triage, every).await,
            None => {
                triage.run(&CancellationToken::new()).await?;
                Ok(())
            }
        }
    })
}

// ---------------------------------------------------------------------------
// watch
// ---------------------------------------------------------------------------

async fn watch(triage: &mut Triage, every: Duration) -> Result<()> {
    let cancel = CancellationToken::new();
    spawn_signal_handler(cancel.clone());

    tracing::info!(interval = ?every, "starting watch mode");

    let mut ticker = tokio::time::interval_at(Instant::now() + every, every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = cancel.cancelled() => break,
        }
        match triage.run(&cancel).await {
            Ok(summary) => tracing::debug!(
                opened = summary.opened,
                marked_read = summary.marked_read,
                listed = summary.listed,
                "triage done"
            ),
            Err(e) if e.is_cancelled() => break,
            Err(e) => tracing::error!(error = %e, "triage failed"),
        }
    }

    tracing::info!("watch mode stopped");
    Ok(())
}

fn spawn_signal_handler(cancel: CancellationToken) {
    tokio::spawn(async move {
        let signal = shutdown_signal().await;
        tracing::info!(signal, "received signal, shutting down gracefully");
        cancel.cancel();
    });
}

#[cfg(unix)]
async fn shutdown_signal() -> &'static str {
    use tokio::signal::unix::{signal, SignalKind};

    let mut term = match signal(SignalKind::terminate()) {
        Ok(term) => term,
        Err(e) => {
            tracing::warn!(error = %e, "cannot listen for SIGTERM");
            return ctrl_c().await;
        }
    };
    tokio::select! {
        name = ctrl_c() => name,
        _ = term.recv() => "SIGTERM",
    }
}

#[cfg(not(unix))]
async fn shutdown_signal() -> &'static str {
    ctrl_c().await
}

async fn ctrl_c() -> &'static str {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "cannot listen for SIGINT");
        std::future::pending::<()>().await;
    }
    "SIGINT"
}
