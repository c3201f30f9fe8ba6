use std::fmt::Formatter;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct RunConfig {
    pub gb_file_path: String,
    /// Directory where `<rom stem>.battery` files are read and written.
    pub save_dir: PathBuf,
    /// Sleep at the end of each frame to hold the simulation at ~59.7 frames per second.
    pub limit_frame_rate: bool,
}

impl std::fmt::Display for RunConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "gb_file_path: {}", self.gb_file_path)?;
        writeln!(f, "save_dir: {}", self.save_dir.display())?;
        writeln!(f, "limit_frame_rate: {}", self.limit_frame_rate)?;

        Ok(())
    }
}
