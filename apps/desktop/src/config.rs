use std::{collections::HashMap, fs, path::PathBuf};

use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub backend_url: String,
    pub page_url: String,
    pub asset_root: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            backend_url: "http://127.0.0.1:8787".into(),
            page_url: "http://localhost:1420/welcome".into(),
            asset_root: PathBuf::from("./assets"),
        }
    }
}

pub fn load_settings() -> Settings {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string("welcome.toml") {
        if let Ok(file_cfg) = toml::from_str::<HashMap<String, String>>(&raw) {
            if let Some(v) = file_cfg.get("backend_url") {
                settings.backend_url = v.clone();
            }
            if let Some(v) = file_cfg.get("page_url") {
                settings.page_url = v.clone();
            }
            if let Some(v) = file_cfg.get("asset_root") {
                settings.asset_root = PathBuf::from(v);
            }
        }
    }

    if let Ok(v) = std::env::var("BACKEND_URL") {
        settings.backend_url = v;
    }
    if let Ok(v) = std::env::var("WELCOME__BACKEND_URL") {
        settings.backend_url = v;
    }

    if let Ok(v) = std::env::var("PAGE_URL") {
        settings.page_url = v;
    }
    if let Ok(v) = std::env::var("WELCOME__PAGE_URL") {
        settings.page_url = v;
    }

    if let Ok(v) = std::env::var("ASSET_ROOT") {
        settings.asset_root = PathBuf::from(v);
    }
    if let Ok(v) = std::env::var("WELCOME__ASSET_ROOT") {
        settings.asset_root = PathBuf::from(v);
    }

    settings
}

#[cfg(test)]
mod tests {
    use std::{
        env, fs,
        time::{SystemTime, UNIX_EPOCH},
    };

    use super::*;

    #[test]
    fn defaults_apply_without_config_sources() {
        let settings = Settings::default();
        assert_eq!(settings.page_url, "http://localhost:1420/welcome");
        assert!(settings.backend_url.starts_with("http://"));
        assert_eq!(settings.asset_root, PathBuf::from("./assets"));
    }

    #[test]
    fn welcome_toml_overrides_defaults() {
        let suffix = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock")
            .as_nanos();

        let temp_root = env::temp_dir().join(format!("welcome_desktop_test_{suffix}"));
        fs::create_dir_all(&temp_root).expect("temp root");

        let original_dir = env::current_dir().expect("cwd");
        env::set_current_dir(&temp_root).expect("set cwd");

        fs::write(
            "welcome.toml",
            "backend_url = \"https://billing.example\"\npage_url = \"tauri://localhost/welcome\"\n",
        )
        .expect("write config");

        let settings = load_settings();
        assert_eq!(settings.backend_url, "https://billing.example");
        assert_eq!(settings.page_url, "tauri://localhost/welcome");

        env::set_current_dir(original_dir).expect("restore cwd");
        fs::remove_dir_all(temp_root).expect("cleanup");
    }

    #[test]
    fn env_overrides_take_precedence() {
        env::set_var("WELCOME__ASSET_ROOT", "/tmp/welcome-assets");
        let settings = load_settings();
        assert_eq!(settings.asset_root, PathBuf::from("/tmp/welcome-assets"));
        env::remove_var("WELCOME__ASSET_ROOT");
    }
}
