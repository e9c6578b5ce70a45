use directories::ProjectDirs;
use std::path::PathBuf;

const APP_NAME: &str = "wordup";

/// Centralized application directory resolution
pub struct AppDirs;

impl AppDirs {
    /// History database under $HOME/.local/state/wordup, falling back to the platform data dir
    pub fn db_path() -> Option<PathBuf> {
        if let Ok(home) = std::env::var("HOME") {
            let state_dir = PathBuf::from(home)
                .join(".local")
                .join("state")
                .join(APP_NAME);
            Some(state_dir.join("history.db"))
        } else {
            ProjectDirs::from("", "", APP_NAME)
                .map(|proj_dirs| proj_dirs.data_local_dir().join("history.db"))
        }
    }

    pub fn config_path() -> PathBuf {
        match ProjectDirs::from("", "", APP_NAME) {
            Some(pd) => pd.config_dir().join("config.json"),
            None => PathBuf::from("wordup_config.json"),
        }
    }
}
