use directories::ProjectDirs;
use std::path::PathBuf;

const APP_NAME: &str = "stroop-screen";

/// Centralized application directory resolution
pub struct AppDirs;

impl AppDirs {
    fn project() -> Option<ProjectDirs> {
        ProjectDirs::from("", "", APP_NAME)
    }

    pub fn config_path() -> PathBuf {
        Self::project()
            .map(|pd| pd.config_dir().join("config.json"))
            .unwrap_or_else(|| PathBuf::from("stroop_config.json"))
    }

    /// Where a trained model artifact is looked up when none is configured
    pub fn default_model_path() -> PathBuf {
        Self::project()
            .map(|pd| pd.data_dir().join("model.json"))
            .unwrap_or_else(|| PathBuf::from("model.json"))
    }

    pub fn export_dir() -> PathBuf {
        Self::project()
            .map(|pd| pd.data_local_dir().join("exports"))
            .unwrap_or_else(|| PathBuf::from("exports"))
    }

    pub fn log_path() -> PathBuf {
        if let Ok(home) = std::env::var("HOME") {
            PathBuf::from(home)
                .join(".local")
                .join("state")
                .join(APP_NAME)
                .join("stroop.log")
        } else {
            Self::project()
                .map(|pd| pd.data_local_dir().join("stroop.log"))
                .unwrap_or_else(|| PathBuf::from("stroop.log"))
        }
    }
}
