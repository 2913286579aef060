use directories::ProjectDirs;
use std::path::PathBuf;

const APP_NAME: &str = "glyphdrill";

/// Centralized application directory resolution
pub struct AppDirs;

impl AppDirs {
    fn project() -> Option<ProjectDirs> {
        ProjectDirs::from("", "", APP_NAME)
    }

    pub fn config_path() -> PathBuf {
        Self::project()
            .map(|pd| pd.config_dir().join("config.json"))
            .unwrap_or_else(|| PathBuf::from(format!("{APP_NAME}_config.json")))
    }

    pub fn log_path() -> Option<PathBuf> {
        if let Ok(home) = std::env::var("HOME") {
            let state_dir = PathBuf::from(home)
                .join(".local")
                .join("state")
                .join(APP_NAME);
            Some(state_dir.join(format!("{APP_NAME}.log")))
        } else {
            Self::project().map(|pd| pd.data_local_dir().join(format!("{APP_NAME}.log")))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_are_named_after_the_app() {
        assert!(AppDirs::config_path().ends_with("config.json"));
        if let Some(log) = AppDirs::log_path() {
            assert!(log.ends_with("glyphdrill.log"));
        }
    }
}
