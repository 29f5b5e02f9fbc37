use anyhow::Context;
use log::error;

use stellar::{RunError, TourConfig};

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = TourConfig::from_env();
    match stellar::run(config) {
        Ok(()) => Ok(()),
        Err(RunError::Gpu(e)) => {
            error!("{}", e);
            eprintln!("Stellar needs a GPU it can render with, and none was usable here.\n{}", e);
            std::process::exit(1);
        }
        Err(e) => Err(e).context("tour stopped unexpectedly"),
    }
}
