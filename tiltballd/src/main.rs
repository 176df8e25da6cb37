//! Tiltball client daemon.
//!
//! Connects to a training server, then hands control over: the server
//! decides when to reset, step, train and finish; the daemon simulates
//! the board, applies commanded actions in real time and reports
//! observations back. When the server finishes a run, the daemon tears
//! the session down and bootstraps a fresh one.
//!
//! The human player steers over stdin: `a`/`left`, `d`/`right`,
//! `s`/`stop`, or a raw axis value in `-1..=1`.

use std::sync::Arc;
use std::time::Duration;

use tiltball::{
    Bootstrap, CommandChannel, GameWorld, HttpTransport, SessionExit, SessionLoop, Telemetry,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::Instant;
use tracing::info;

mod game;

use game::BallWorld;

const TARGET_FPS: u32 = 60;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let transport = Arc::new(HttpTransport::new()?);
    let world = Arc::new(BallWorld::new());
    let telemetry = Arc::new(Telemetry::new());

    tokio::spawn(async {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Ctrl-C: shutting down");
            std::process::exit(0);
        }
    });

    // Human steering from stdin
    {
        let world = Arc::clone(&world);
        tokio::spawn(async move {
            let mut lines = BufReader::new(tokio::io::stdin()).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                let axis = match line.trim() {
                    "a" | "left" => -1.0,
                    "d" | "right" => 1.0,
                    "s" | "stop" | "" => 0.0,
                    other => match other.parse::<f32>() {
                        Ok(value) => value,
                        Err(_) => continue,
                    },
                };
                world.set_human_axis(axis);
            }
        });
    }

    // Frame task: advance the board and feed the fps counters, the way
    // a render loop would.
    {
        let world = Arc::clone(&world);
        let telemetry = Arc::clone(&telemetry);
        tokio::spawn(async move {
            let frame_millis = (1000 / TARGET_FPS).max(1) as u64;
            let mut last = Instant::now();
            loop {
                tokio::time::sleep(Duration::from_millis(frame_millis)).await;
                let now = Instant::now();
                let dt = now.duration_since(last).as_secs_f32();
                last = now;
                world.advance(dt);
                telemetry.record_frame(dt, world.frozen());
            }
        });
    }

    loop {
        let resolved = Bootstrap::new(Arc::clone(&transport)).resolve().await;
        info!(host = resolved.location.host(), "session starting");

        world.configure(&resolved.config);
        world.reload();
        telemetry.episode_restarted();

        let channel = CommandChannel::new(Arc::clone(&transport), resolved.location.clone());
        let world_handle: Arc<dyn GameWorld> = world.clone();
        let mut session = SessionLoop::new(
            channel,
            resolved.config,
            world_handle,
            Arc::clone(&telemetry),
        );

        match session.run().await {
            SessionExit::Reload => info!(
                episode_pause = telemetry.episode_pause_seconds(),
                "run finished, rebuilding session"
            ),
        }
    }
}
