use crate::common::defs::*;
use clap::Parser;
use std::path::PathBuf;

/// Launches (or attaches to) an engine instance and plays one episode with random actions.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// 1 requests single threaded engine execution.
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    pub nothreads: i32,

    /// 1 disables rendering.
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    pub norendering: i32,

    /// 1 disables audio.
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    pub nosound: i32,

    #[arg(long, default_value_t = DEFAULT_RESX, allow_negative_numbers = true)]
    pub resx: i32,

    #[arg(long, default_value_t = DEFAULT_RESY, allow_negative_numbers = true)]
    pub resy: i32,

    #[arg(long, default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Engine install root.
    #[arg(long, env = "UE_ENGINE_DIR")]
    pub engine_dir: Option<PathBuf>,

    /// Directory holding one folder per project.
    #[arg(long, env = "UE_PROJECTS_DIR")]
    pub project_dir: Option<PathBuf>,

    /// Connect to an engine instance that is already running instead of launching one.
    #[arg(long)]
    pub attach: bool,
}
