//! Configures an engine launch by hand from a few flags and plays one episode with random actions.
//!
//! Pass `--attach` to use an engine instance that is already running instead of launching one.

use anyhow::{Context, Result};
use clap::Parser;
use enginerl::*;
use tracing::Level;

const ENV: EnvKind = EnvKind::ActionRpg;

fn main() -> Result<()> {
    let args = Args::parse();

    let startup = StartupConfig {
        log_level: Level::DEBUG,
        debug: true,
    };
    logging::init(&startup);

    // Use `add_option`/`add_param` to pass anything else to the engine.
    let params = (!args.attach).then(|| LaunchParams::from_args(&args));
    let locator = EngineLocator {
        engine_dir: args.engine_dir.clone(),
        project_dir: args.project_dir.clone(),
        build: startup.build(),
    };

    let mut policy = RandomPolicy::new();
    let mut stdout = std::io::stdout();
    run(
        || ENV.make(params, args.port, &locator),
        &mut policy,
        &mut stdout,
    )
    .with_context(|| format!("running {ENV} on port {}", args.port))?;

    Ok(())
}
