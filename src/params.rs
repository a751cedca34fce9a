use crate::cli::Args;
use crate::common::defs::*;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LaunchOption {
    /// Rendered as `-Key=Value`.
    Value(String, String),
    /// Rendered as `-Flag`.
    Flag(String),
}

/// Configures an engine instance to be launched. Environments take it by value, so a different launch
/// needs a new instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchParams {
    rendering: bool,
    single_thread: bool,
    sound: bool,
    resolution: (i32, i32),
    extra: Vec<LaunchOption>,
}

impl Default for LaunchParams {
    fn default() -> Self {
        Self {
            rendering: true,
            single_thread: false,
            sound: true,
            resolution: (DEFAULT_RESX, DEFAULT_RESY),
            extra: Vec::new(),
        }
    }
}

impl LaunchParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_args(args: &Args) -> Self {
        Self::new()
            .rendering(args.norendering == 0)
            .single_thread(args.nothreads == 1)
            .sound(args.nosound == 0)
            .resolution(args.resx, args.resy)
    }

    pub fn rendering(mut self, enabled: bool) -> Self {
        self.rendering = enabled;
        self
    }

    pub fn single_thread(mut self, enabled: bool) -> Self {
        self.single_thread = enabled;
        self
    }

    pub fn sound(mut self, enabled: bool) -> Self {
        self.sound = enabled;
        self
    }

    pub fn resolution(mut self, x: i32, y: i32) -> Self {
        self.resolution = (x, y);
        self
    }

    pub fn add_option(mut self, key: &str, value: &str) -> Self {
        self.extra
            .push(LaunchOption::Value(key.to_string(), value.to_string()));
        self
    }

    pub fn add_param(mut self, flag: &str) -> Self {
        self.extra.push(LaunchOption::Flag(flag.to_string()));
        self
    }

    pub fn rendering_enabled(&self) -> bool {
        self.rendering
    }

    pub fn single_threaded(&self) -> bool {
        self.single_thread
    }

    pub fn sound_enabled(&self) -> bool {
        self.sound
    }

    pub fn resolution_value(&self) -> (i32, i32) {
        self.resolution
    }

    pub fn extra(&self) -> &[LaunchOption] {
        &self.extra
    }

    /// Arguments passed to the engine executable, project first.
    pub fn command_line(&self, project: &Path, port: u16) -> Vec<String> {
        let mut args = vec![
            project.display().to_string(),
            "-game".to_string(),
            "-windowed".to_string(),
            format!("-ResX={}", self.resolution.0),
            format!("-ResY={}", self.resolution.1),
        ];
        if !self.rendering {
            args.push("-nullrhi".to_string());
        }
        if self.single_thread {
            args.push("-onethread".to_string());
        }
        if !self.sound {
            args.push("-nosound".to_string());
        }
        args.push(format!("-4MLPort={port}"));
        args.extend(self.extra.iter().map(|opt| match opt {
            LaunchOption::Value(k, v) => format!("-{k}={v}"),
            LaunchOption::Flag(f) => format!("-{f}"),
        }));

        args
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use insta::assert_snapshot;
    use std::path::PathBuf;

    #[test]
    fn default_command_line() {
        let project = PathBuf::from("ActionRPG.uproject");
        let cmd = LaunchParams::default().command_line(&project, DEFAULT_PORT);
        assert_snapshot!(
            cmd.join(" "),
            @"ActionRPG.uproject -game -windowed -ResX=800 -ResY=600 -4MLPort=15151"
        );
    }

    #[test]
    fn headless_command_line_with_extras() {
        let project = PathBuf::from("ShooterGame.uproject");
        let cmd = LaunchParams::new()
            .rendering(false)
            .single_thread(true)
            .sound(false)
            .resolution(320, 240)
            .add_option("Map", "Highrise")
            .add_param("unattended")
            .command_line(&project, 9000);
        assert_snapshot!(
            cmd.join(" "),
            @"ShooterGame.uproject -game -windowed -ResX=320 -ResY=240 -nullrhi -onethread -nosound -4MLPort=9000 -Map=Highrise -unattended"
        );
    }

    #[test]
    fn extras_keep_insertion_order() {
        let params = LaunchParams::new()
            .add_param("a")
            .add_option("b", "1")
            .add_param("c");
        assert_eq!(
            params.extra(),
            [
                LaunchOption::Flag("a".into()),
                LaunchOption::Value("b".into(), "1".into()),
                LaunchOption::Flag("c".into()),
            ]
        );
    }
}
