mod config;
mod script;

use anyhow::{anyhow, Context};
use clap::Parser;
use config::CliConfig;
use dmgemu_core::{RunConfig, RunSummary, SharedState, XRES, YRES};
use env_logger::Env;
use script::InputScript;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

const POLL_INTERVAL: Duration = Duration::from_millis(1);

#[derive(Parser)]
struct Cli {
    /// ROM file to load
    #[arg(short = 'f', long)]
    gb_file_path: Option<String>,

    /// TOML config file; command line flags take precedence over its values
    #[arg(short = 'c', long)]
    config: Option<PathBuf>,

    /// Directory for battery save files
    #[arg(short = 's', long)]
    save_dir: Option<PathBuf>,

    /// Stop after this many frames
    #[arg(short = 'n', long)]
    frames: Option<u32>,

    /// Run as fast as possible instead of at ~59.7 frames per second
    #[arg(long)]
    unthrottled: bool,

    /// Write the last frame to this path as a binary PPM
    #[arg(short = 'o', long)]
    screenshot: Option<PathBuf>,
}

impl Cli {
    fn apply_to(self, config: &mut CliConfig) {
        if self.gb_file_path.is_some() {
            config.gb_file_path = self.gb_file_path;
        }
        if let Some(save_dir) = self.save_dir {
            config.save_dir = save_dir;
        }
        if self.frames.is_some() {
            config.frames = self.frames;
        }
        if self.unthrottled {
            config.limit_frame_rate = false;
        }
        if self.screenshot.is_some() {
            config.screenshot = self.screenshot;
        }
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let args = Cli::parse();

    let mut config = match &args.config {
        Some(path) => CliConfig::from_toml_file(path)?,
        None => CliConfig::default(),
    };
    args.apply_to(&mut config);

    let gb_file_path = config
        .gb_file_path
        .clone()
        .context("no ROM file given, pass -f/--gb-file-path or set gb_file_path in the config")?;

    let run_config = RunConfig {
        gb_file_path,
        save_dir: config.save_dir.clone(),
        limit_frame_rate: config.limit_frame_rate,
    };

    let shared = Arc::new(SharedState::new());

    let simulation = thread::Builder::new()
        .name("simulation".into())
        .spawn({
            let shared = Arc::clone(&shared);
            move || dmgemu_core::run(&run_config, shared)
        })
        .context("error spawning simulation thread")?;

    let mut script = InputScript::new(config.input.clone());
    while !simulation.is_finished() {
        let frame = shared.frame_counter();
        script.update(frame, &shared);

        if config.frames.is_some_and(|frames| frame >= frames) {
            shared.request_shutdown();
            break;
        }

        thread::sleep(POLL_INTERVAL);
    }

    let summary = simulation
        .join()
        .map_err(|_| anyhow!("simulation thread panicked"))?
        .context("emulation terminated with an error")?;

    report(&summary);

    if let Some(path) = &config.screenshot {
        write_ppm(path, &shared.frame_buffer())?;
        log::info!("Wrote screenshot to '{}'", path.display());
    }

    Ok(())
}

fn report(summary: &RunSummary) {
    log::info!("Emulation stopped after {} frames", summary.frames);

    if !summary.serial_output.is_empty() {
        println!("{}", summary.serial_output);
    }
}

/// Encode 0xAARRGGBB pixels as a binary (P6) PPM image.
fn encode_ppm(pixels: &[u32]) -> Vec<u8> {
    let mut ppm = format!("P6\n{XRES} {YRES}\n255\n").into_bytes();
    ppm.reserve(3 * pixels.len());

    for &pixel in pixels {
        let [_, r, g, b] = pixel.to_be_bytes();
        ppm.extend([r, g, b]);
    }

    ppm
}

fn write_ppm(path: &Path, pixels: &[u32]) -> anyhow::Result<()> {
    fs::write(path, encode_ppm(pixels))
        .with_context(|| format!("error writing screenshot to '{}'", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use dmgemu_core::FRAME_BUFFER_LEN;

    #[test]
    fn ppm_encoding() {
        let mut pixels = vec![0xFFFF_FFFF; FRAME_BUFFER_LEN];
        pixels[0] = 0xFF12_3456;

        let ppm = encode_ppm(&pixels);
        let header = b"P6\n160 144\n255\n";

        assert_eq!(header, &ppm[..header.len()]);
        assert_eq!(header.len() + 3 * FRAME_BUFFER_LEN, ppm.len());
        assert_eq!([0x12, 0x34, 0x56], ppm[header.len()..header.len() + 3]);
        assert_eq!([0xFF, 0xFF, 0xFF], ppm[header.len() + 3..header.len() + 6]);
    }

    #[test]
    fn flags_override_config() {
        let mut config = CliConfig {
            gb_file_path: Some("from_file.gb".into()),
            frames: Some(10),
            ..CliConfig::default()
        };

        let cli = Cli::parse_from(["dmgemu-cli", "-n", "20", "--unthrottled", "-o", "shot.ppm"]);
        cli.apply_to(&mut config);

        assert_eq!(Some("from_file.gb".into()), config.gb_file_path);
        assert_eq!(Some(20), config.frames);
        assert!(!config.limit_frame_rate);
        assert_eq!(Some(PathBuf::from("shot.ppm")), config.screenshot);
        assert_eq!(PathBuf::from("."), config.save_dir);
    }
}
