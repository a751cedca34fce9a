extern crate rand;
extern crate reqwest;
extern crate serde;
extern crate serde_json;

pub mod cli;
pub mod client;
pub mod common;
pub mod engine;
pub mod envs;
pub mod error;
pub mod logging;
pub mod params;
pub mod policy;
pub mod runner;
pub mod spaces;

pub use cli::Args;
pub use client::Client;
pub use common::defs::DEFAULT_PORT;
pub use engine::{EngineBuild, EngineLocator, EngineProcess};
pub use envs::{EnvKind, Environment, RemoteEnvironment, StepInfo};
pub use error::{Error, Result};
pub use logging::StartupConfig;
pub use params::{LaunchOption, LaunchParams};
pub use policy::{random_action, Policy, RandomPolicy};
pub use runner::{run, run_episode, EnvGuard};
pub use spaces::{Space, SpaceItem};
