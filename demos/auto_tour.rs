use stellar::{RunError, TourConfig};

fn main() -> Result<(), RunError> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // Moves to the next scene after each settle delay. Press A to stop.
    stellar::run(TourConfig::new().title("Stellar Tour").auto_advance(true))
}
