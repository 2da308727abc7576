//! Default locations of the race file and database.

use directories::ProjectDirs;
use std::path::PathBuf;

/// Default locations of the stored race history
pub struct AppDirs;

impl AppDirs {
    fn data_dir() -> Option<PathBuf> {
        if let Ok(home) = std::env::var("HOME") {
            Some(
                PathBuf::from(home)
                    .join(".local")
                    .join("share")
                    .join("racetrend"),
            )
        } else {
            ProjectDirs::from("", "", "racetrend").map(|pd| pd.data_local_dir().to_path_buf())
        }
    }

    /// Semicolon-delimited race file
    pub fn races_path() -> Option<PathBuf> {
        Self::data_dir().map(|d| d.join("races.txt"))
    }

    pub fn db_path() -> Option<PathBuf> {
        Self::data_dir().map(|d| d.join("races.db"))
    }
}
