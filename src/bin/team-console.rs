//! Terminal team client. Shares the round document with the server through
//! the configured state file: press Enter to buzz, `q` to quit.

use std::{env, sync::Arc};

use anyhow::{Context, bail};
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    sync::mpsc,
};
use tracing::warn;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use photo_buzz::{
    config::AppConfig,
    dao::round_store::FileRoundStore,
    services::{
        buzzer::BuzzerArbiter,
        coordination::CoordinationStore,
        team_service::{self, PollerEvent, TeamPoller, TeamView},
    },
};

const TEAM_ENV: &str = "PHOTO_BUZZ_TEAM";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let Some(raw_name) = env::args().nth(1).or_else(|| env::var(TEAM_ENV).ok()) else {
        bail!("usage: team-console <team name> (or set {TEAM_ENV})");
    };

    let config = AppConfig::load();
    let backend = FileRoundStore::open(config.state_path.clone())
        .await
        .context("coordination unavailable")?;
    let store = CoordinationStore::new(Arc::new(backend), config.retry);
    let arbiter = BuzzerArbiter::new(store.clone());

    let team = team_service::register(&store, &raw_name)
        .await
        .context("coordination unavailable")?;
    println!("registered as {team}; press Enter to buzz, q to quit");

    let (buzz_tx, buzz_rx) = mpsc::channel(4);
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) if line.trim().eq_ignore_ascii_case("q") => break,
                Ok(Some(_)) => {
                    if buzz_tx.send(()).await.is_err() {
                        break;
                    }
                }
                Ok(None) => break,
                Err(err) => {
                    warn!(error = %err, "failed to read stdin");
                    break;
                }
            }
        }
    });

    let poller = TeamPoller::new(store, arbiter, team, config.team_poll_interval);
    poller
        .run(buzz_rx, |event| match event {
            PollerEvent::Status(status) => {
                if status.reregistered {
                    println!("(the host removed this team; registered again)");
                }
                let subject = if status.subject.is_empty() {
                    String::new()
                } else {
                    format!("[{}] ", status.subject)
                };
                println!("{subject}{}", describe(&status.view));
            }
            PollerEvent::Buzzed { accepted: true } => println!("buzz accepted"),
            PollerEvent::Buzzed { accepted: false } => println!("buzz refused"),
        })
        .await
        .context("coordination unavailable")?;

    Ok(())
}

fn describe(view: &TeamView) -> String {
    match view {
        TeamView::Excluded => "excluded for this photo; wait for the next one".into(),
        TeamView::WaitingForHost => "waiting for the host".into(),
        TeamView::SomeoneElseAnswering { winner } => format!("{winner} is answering"),
        TeamView::YouAreFirst => "you are first! answer now".into(),
        TeamView::BuzzAvailable => "BUZZ! (press Enter)".into(),
    }
}

fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "warn".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
