use anyhow::Context;
use dmgemu_core::Button;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// A scripted button press: `button` is held from frame `frame` for `held_frames` frames.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct InputEvent {
    pub frame: u32,
    pub button: Button,
    #[serde(default = "default_held_frames")]
    pub held_frames: u32,
}

impl InputEvent {
    pub fn is_active(&self, frame: u32) -> bool {
        frame >= self.frame && frame - self.frame < self.held_frames
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CliConfig {
    pub gb_file_path: Option<String>,

    #[serde(default = "default_save_dir")]
    pub save_dir: PathBuf,

    /// Stop after this many frames. Runs until the emulator stops on its own if unset.
    #[serde(default)]
    pub frames: Option<u32>,

    #[serde(default = "default_limit_frame_rate")]
    pub limit_frame_rate: bool,

    #[serde(default)]
    pub screenshot: Option<PathBuf>,

    #[serde(default)]
    pub input: Vec<InputEvent>,
}

fn default_held_frames() -> u32 {
    5
}

fn default_save_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_limit_frame_rate() -> bool {
    true
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            gb_file_path: None,
            save_dir: default_save_dir(),
            frames: None,
            limit_frame_rate: default_limit_frame_rate(),
            screenshot: None,
            input: Vec::new(),
        }
    }
}

impl CliConfig {
    pub fn from_toml_file<P>(path: P) -> Result<Self, anyhow::Error>
    where
        P: AsRef<Path> + std::fmt::Debug,
    {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("error reading TOML config file from '{path:?}'"))?;
        let config: Self = toml::from_str(&config_str)
            .with_context(|| format!("error parsing config from TOML file at '{path:?}'"))?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_uses_defaults() {
        let config: CliConfig = toml::from_str("").unwrap();
        assert_eq!(CliConfig::default(), config);
    }

    #[test]
    fn full_config() {
        let config: CliConfig = toml::from_str(
            r#"
            gb_file_path = "roms/tetris.gb"
            save_dir = "saves"
            frames = 300
            limit_frame_rate = false
            screenshot = "out.ppm"

            [[input]]
            frame = 60
            button = "start"

            [[input]]
            frame = 120
            button = "A"
            held_frames = 2
            "#,
        )
        .unwrap();

        assert_eq!(Some("roms/tetris.gb".into()), config.gb_file_path);
        assert_eq!(PathBuf::from("saves"), config.save_dir);
        assert_eq!(Some(300), config.frames);
        assert!(!config.limit_frame_rate);
        assert_eq!(Some(PathBuf::from("out.ppm")), config.screenshot);
        assert_eq!(
            vec![
                InputEvent { frame: 60, button: Button::Start, held_frames: 5 },
                InputEvent { frame: 120, button: Button::A, held_frames: 2 },
            ],
            config.input
        );
    }

    #[test]
    fn unknown_button_rejected() {
        let result: Result<CliConfig, _> = toml::from_str(
            r#"
            [[input]]
            frame = 1
            button = "turbo"
            "#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn input_event_window() {
        let event = InputEvent { frame: 10, button: Button::B, held_frames: 3 };
        assert!(!event.is_active(9));
        assert!(event.is_active(10));
        assert!(event.is_active(12));
        assert!(!event.is_active(13));
    }
}
