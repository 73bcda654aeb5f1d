//! Caffeine Rush - headless demo
//!
//! Runs one autopiloted junior workday through the fixed-timestep loop with
//! synthetic 16ms frames and prints the final snapshot as JSON.

#[cfg(not(target_arch = "wasm32"))]
mod headless {
    use caffeine_rush::persistence::MemoryPersistence;
    use caffeine_rush::sim::{DrinkKind, GameNotice, GameSnapshot, PowerUpKind, format_score};
    use caffeine_rush::{
        Difficulty, GameConfig, GameLoop, GamePhase, GameStateManager, LoopConfig,
    };

    /// Synthetic frame interval (ms)
    const FRAME_MS: f64 = 16.0;
    /// How often the bot looks at the numbers (ms)
    const BOT_INTERVAL_MS: f64 = 250.0;
    /// Hard stop for the demo (ms of host time)
    const MAX_HOST_TIME: f64 = 400_000.0;

    const DRINK_PREFERENCE: [DrinkKind; 4] = [
        DrinkKind::GreenTea,
        DrinkKind::ColdBrew,
        DrinkKind::Soda,
        DrinkKind::Espresso,
    ];

    fn log_notices(snapshot: &GameSnapshot) {
        for notice in &snapshot.notices {
            match notice {
                GameNotice::PhaseChanged { from, to } => log::info!("{:?} -> {:?}", from, to),
                GameNotice::EventWarning { kind, starts_at } => {
                    log::info!("{} incoming at {:.1}s", kind, starts_at / 1000.0)
                }
                GameNotice::EventStarted(kind) => log::info!("{} started", kind),
                GameNotice::EventEnded(kind) => log::info!("{} ended", kind),
                GameNotice::Milestone(points) => log::info!("{} points!", format_score(*points as f64)),
                GameNotice::AchievementUnlocked(id) => {
                    log::info!("Achievement: {} ({})", id.title(), id.description())
                }
                GameNotice::NewHighScore { rank } => log::info!("High score #{}", rank),
                GameNotice::GameEnded(outcome) => log::info!("Game ended: {:?}", outcome),
                other => log::debug!("{:?}", other),
            }
        }
    }

    /// Keep caffeine just under the zone center and patch up health
    fn autopilot(manager: &mut GameStateManager) {
        let zone = manager.optimal_zone();
        let center = (zone.low + zone.high) / 2.0;
        let caffeine = manager.stats().caffeine;
        let health = manager.stats().health;
        let drinking = !manager.drinks().active_effects().is_empty();

        if caffeine < center - 3.0 && !drinking {
            let now = manager.now();
            let ready = DRINK_PREFERENCE
                .into_iter()
                .find(|kind| !manager.drinks().is_on_cooldown(*kind, now));
            if let Some(kind) = ready {
                match manager.drink(kind) {
                    Ok(receipt) => log::debug!("{}", receipt.message),
                    Err(refusal) => log::debug!("Bot skipped a drink: {}", refusal),
                }
            }
        } else if caffeine > zone.high - 2.0 && !drinking {
            if let Err(refusal) = manager.drink(DrinkKind::Water) {
                log::debug!("Bot skipped water: {}", refusal);
            }
        }

        if health < 60.0 {
            for kind in [PowerUpKind::ProteinBar, PowerUpKind::PowerNap] {
                if manager.activate_power_up(kind) {
                    break;
                }
            }
        }
        for kind in [PowerUpKind::Meditation, PowerUpKind::Vitamins, PowerUpKind::DeepFocus] {
            manager.activate_power_up(kind);
        }
    }

    pub fn run() {
        log::info!("Caffeine Rush (headless) starting...");

        let manager = GameStateManager::new(GameConfig::with_difficulty(Difficulty::Junior))
            .with_persistence(Box::new(MemoryPersistence::new()));
        let mut game = GameLoop::new(manager, LoopConfig::default());
        game.subscribe(log_notices);

        if !game.start() {
            log::error!("Could not start the workday");
            return;
        }

        let mut host_time = 0.0;
        let mut next_bot = 0.0;
        while game.manager().state() == GamePhase::Playing && host_time < MAX_HOST_TIME {
            game.frame(host_time);
            if game.now() >= next_bot {
                autopilot(game.manager_mut());
                next_bot = game.now() + BOT_INTERVAL_MS;
            }
            host_time += FRAME_MS;
        }

        let snapshot = game.manager().snapshot();
        if let Some(breakdown) = snapshot.data.final_score {
            let rank = breakdown.rank.info();
            log::info!(
                "Final score {} - rank {} \"{}\"",
                format_score(breakdown.total),
                rank.label,
                rank.title
            );
        }
        log::info!("Simulated {} steps", game.total_steps());

        match serde_json::to_string_pretty(&snapshot) {
            Ok(json) => println!("{json}"),
            Err(err) => log::error!("Could not serialize snapshot: {}", err),
        }
        match game.manager().persistence() {
            Some(store) => log::info!("Lifetime stats: {:?}", store.statistics()),
            None => log::warn!("No persistence attached"),
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    headless::run();
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // Hosts embed the library; there is no wasm binary
}
