use std::{fmt, path::PathBuf, time::Duration};

use anyhow::{Context, Result, ensure};
use clap::Args as ClapArgs;
use tracing::info;
use vidsync_core::{loopback::LoopbackSession, prelude::MediaBackend};
use vidsync_model::{PlayerConfig, PlayerState, VideoErrorCode};

#[derive(ClapArgs, Debug)]
pub struct SimulateArgs {
    /// Number of peers; the first one hosts the session
    #[arg(long, default_value_t = 3)]
    pub peers: usize,

    /// Media the host plays once the session is up
    #[arg(long, default_value = "https://example.com/movie.mp4")]
    pub url: String,

    /// Scheduler passes to run
    #[arg(long, default_value_t = 100)]
    pub steps: usize,

    /// Simulated seconds per scheduler pass
    #[arg(long, default_value_t = 0.1)]
    pub step_secs: f64,

    /// Media duration every backend reports, in seconds ("inf" for a live stream)
    #[arg(long, default_value_t = 600.0)]
    pub duration: f64,

    /// Make the host's first load fail to exercise the retry path
    #[arg(long, default_value_t = false)]
    pub fail_first_load: bool,

    /// Player config file (TOML or JSON)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Pace passes in wall-clock time instead of running them back to back
    #[arg(long, default_value_t = false)]
    pub realtime: bool,
}

pub async fn run(args: SimulateArgs, config: PlayerConfig) -> Result<()> {
    ensure!(args.peers > 0, "--peers must be at least 1");
    ensure!(
        args.step_secs.is_finite() && args.step_secs > 0.0,
        "--step-secs must be a positive number of seconds"
    );

    let mut session = LoopbackSession::new(&config, args.peers, args.duration);
    if args.fail_first_load {
        session
            .peer(0)
            .backend
            .fail_next_loads(1, VideoErrorCode::PlayerError);
    }
    session.start();
    session
        .peer_mut(0)
        .player
        .request_play(&args.url)
        .with_context(|| format!("host could not play {}", args.url))?;
    info!(peers = args.peers, url = %args.url, steps = args.steps, "simulation started");

    if args.realtime {
        let mut interval =
            tokio::time::interval(Duration::from_secs_f64(args.step_secs));
        for _ in 0..args.steps {
            interval.tick().await;
            session.step(args.step_secs);
        }
    } else {
        for _ in 0..args.steps {
            session.step(args.step_secs);
        }
    }

    let report = Report::collect(&session, config.sync_threshold_secs);
    print!("{report}");
    ensure!(
        report.in_sync(),
        "peers drifted more than {}s from the session",
        report.threshold
    );
    info!(elapsed = session.clock().now(), "simulation finished");
    Ok(())
}

#[derive(Debug)]
struct PeerLine {
    index: usize,
    owner: bool,
    state: PlayerState,
    generation: u64,
    position: f64,
    drift: Option<f64>,
}

/// End-of-run snapshot of every peer.
#[derive(Debug)]
struct Report {
    elapsed: f64,
    threshold: f64,
    lines: Vec<PeerLine>,
}

impl Report {
    fn collect(session: &LoopbackSession, threshold: f64) -> Self {
        let now = session.clock().now();
        let lines = session
            .peers()
            .iter()
            .enumerate()
            .map(|(index, peer)| {
                let player = &peer.player;
                let position = peer.backend.position();
                let drift = match player.state() {
                    PlayerState::Playing => player
                        .record()
                        .start_time
                        .elapsed(now)
                        .map(|expected| expected.clamp(0.0, player.duration().max(0.0)))
                        .map(|expected| position - expected),
                    _ => None,
                };
                PeerLine {
                    index,
                    owner: player.is_owner(),
                    state: player.state(),
                    generation: player.applied_generation().get(),
                    position,
                    drift,
                }
            })
            .collect();

        Self {
            elapsed: now,
            threshold,
            lines,
        }
    }

    fn in_sync(&self) -> bool {
        self.lines
            .iter()
            .filter_map(|line| line.drift)
            .all(|drift| drift.abs() <= self.threshold)
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "session time {:.2}s", self.elapsed)?;
        writeln!(
            f,
            "{:<5} {:<6} {:<8} {:>4} {:>10} {:>8}",
            "peer", "owner", "state", "gen", "position", "drift"
        )?;
        for line in &self.lines {
            let drift = line
                .drift
                .map(|drift| format!("{drift:+.3}"))
                .unwrap_or_else(|| "-".to_string());
            writeln!(
                f,
                "{:<5} {:<6} {:<8} {:>4} {:>10.3} {:>8}",
                line.index,
                if line.owner { "yes" } else { "no" },
                line.state.to_string(),
                line.generation,
                line.position,
                drift
            )?;
        }
        Ok(())
    }
}
