/// Control port the engine plugin listens on unless told otherwise.
pub const DEFAULT_PORT: u16 = 15151;

pub const DEFAULT_RESX: i32 = 800;
pub const DEFAULT_RESY: i32 = 600;

pub const LOCALHOST: &str = "127.0.0.1";
