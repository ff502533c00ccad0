//! Grav Flip entry point
//!
//! The browser build is driven from JavaScript through `web::GameHandle`.
//! Natively this runs the game headless in idle mode and logs the run.

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use grav_flip::FrameDriver;
    use grav_flip::sim::{GameEvent, GameState};

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut args = std::env::args().skip(1);
    let seconds: f64 = args.next().and_then(|s| s.parse().ok()).unwrap_or(120.0);
    let seed: u64 = args.next().and_then(|s| s.parse().ok()).unwrap_or(1);

    log::info!("Grav Flip (native) running {seconds}s of demo with seed {seed}");

    let mut state = GameState::new(seed);
    let mut driver = FrameDriver::new();
    driver.idle_mode = true;

    let frame_dt = 1.0 / 60.0;
    let mut now = 0.0;
    let mut explosions = 0u32;
    let mut coins = 0u32;
    while now <= seconds {
        driver.frame(&mut state, now);
        for event in state.drain_events() {
            match event {
                GameEvent::StageChanged(stage) => {
                    log::info!("[{now:7.2}s] stage {stage:?} at x={:.0}", state.player.x)
                }
                GameEvent::Explosion => explosions += 1,
                GameEvent::CoinCollected => coins += 1,
                _ => {}
            }
        }
        now += frame_dt;
    }

    let summary = serde_json::json!({
        "seed": seed,
        "seconds": seconds,
        "stage": state.stage,
        "distance": state.player.x.max(0.0),
        "health": state.player.health,
        "explosions": explosions,
        "coins": coins,
        "obstacles_live": state.obstacles.len(),
    });
    println!("{summary}");
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is web::GameHandle, this is just to satisfy the compiler
}
