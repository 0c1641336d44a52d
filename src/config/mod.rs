use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::palette::DEFAULT_SAMPLE_BUDGET;
use crate::tools::{DEFAULT_CURVE_STEPS, DEFAULT_POLYGON_SIDES, MIN_CURVE_STEPS, MIN_POLYGON_SIDES};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigPathError {
    MissingHomeDirectory,
}

const APP_DIR: &str = "brushwork";
const APP_CONFIG_FILE: &str = "config.json";

/// Engine defaults from `config.json`. Every field is optional in the file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub smoothing: bool,
    pub curve_steps: usize,
    pub polygon_sides: u32,
    pub default_brush_size: f32,
    pub default_palette_count: usize,
    pub kmeans_sample_budget: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            smoothing: true,
            curve_steps: DEFAULT_CURVE_STEPS,
            polygon_sides: DEFAULT_POLYGON_SIDES,
            default_brush_size: 8.0,
            default_palette_count: 5,
            kmeans_sample_budget: DEFAULT_SAMPLE_BUDGET,
        }
    }
}

impl EngineConfig {
    /// Pulls out-of-range values back to the nearest usable setting.
    pub fn sanitized(self) -> Self {
        let defaults = Self::default();
        let size = self.default_brush_size;
        let default_brush_size = if size.is_finite() && size > 0.0 {
            size
        } else {
            defaults.default_brush_size
        };
        Self {
            smoothing: self.smoothing,
            curve_steps: self.curve_steps.max(MIN_CURVE_STEPS),
            polygon_sides: self.polygon_sides.max(MIN_POLYGON_SIDES),
            default_brush_size,
            default_palette_count: self.default_palette_count.max(1),
            kmeans_sample_budget: self.kmeans_sample_budget.max(1),
        }
    }
}

pub fn load_engine_config() -> EngineConfig {
    let (xdg_config_home, home) = config_env_dirs();
    load_engine_config_with(xdg_config_home.as_deref(), home.as_deref())
}

fn load_engine_config_with(xdg_config_home: Option<&Path>, home: Option<&Path>) -> EngineConfig {
    let path = match app_config_path(APP_DIR, APP_CONFIG_FILE, xdg_config_home, home) {
        Ok(p) => p,
        Err(_) => return EngineConfig::default(),
    };
    if !path.exists() {
        return EngineConfig::default();
    }
    match std::fs::read_to_string(&path) {
        Ok(contents) => parse_engine_config(&contents).unwrap_or_else(|err| {
            tracing::warn!(?err, ?path, "failed to parse config.json; using defaults");
            EngineConfig::default()
        }),
        Err(err) => {
            tracing::warn!(?err, ?path, "failed to read config.json; using defaults");
            EngineConfig::default()
        }
    }
}

pub fn parse_engine_config(contents: &str) -> serde_json::Result<EngineConfig> {
    let config: EngineConfig = serde_json::from_str(contents)?;
    let sanitized = config.clone().sanitized();
    if sanitized != config {
        tracing::warn!(?config, "config.json values out of range; clamped");
    }
    Ok(sanitized)
}

pub fn config_env_dirs() -> (Option<PathBuf>, Option<PathBuf>) {
    (
        std::env::var_os("XDG_CONFIG_HOME").map(PathBuf::from),
        std::env::var_os("HOME").map(PathBuf::from),
    )
}

pub fn app_config_path(
    app_dir: &str,
    file_name: &str,
    xdg_config_home: Option<&Path>,
    home: Option<&Path>,
) -> Result<PathBuf, ConfigPathError> {
    let mut path = config_root(xdg_config_home, home)?;
    path.push(app_dir);
    path.push(file_name);
    Ok(path)
}

fn config_root(
    xdg_config_home: Option<&Path>,
    home: Option<&Path>,
) -> Result<PathBuf, ConfigPathError> {
    if let Some(xdg) = xdg_config_home.filter(|path| !path.as_os_str().is_empty()) {
        return Ok(xdg.to_path_buf());
    }

    let home = home.ok_or(ConfigPathError::MissingHomeDirectory)?;
    Ok(home.join(".config"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn app_config_path_prefers_xdg_config_home() {
        let path = app_config_path(
            "brushwork",
            "config.json",
            Some(Path::new("/tmp/config-root")),
            Some(Path::new("/tmp/home")),
        )
        .expect("path should resolve");

        assert_eq!(path, PathBuf::from("/tmp/config-root/brushwork/config.json"));
    }

    #[test]
    fn app_config_path_falls_back_to_home_dot_config() {
        let path = app_config_path("brushwork", "config.json", None, Some(Path::new("/tmp/home")))
            .expect("path should resolve");

        assert_eq!(path, PathBuf::from("/tmp/home/.config/brushwork/config.json"));
    }

    #[test]
    fn app_config_path_ignores_empty_xdg_config_home() {
        let path = app_config_path(
            "brushwork",
            "config.json",
            Some(Path::new("")),
            Some(Path::new("/tmp/home")),
        )
        .expect("path should resolve");

        assert_eq!(path, PathBuf::from("/tmp/home/.config/brushwork/config.json"));
    }

    #[test]
    fn app_config_path_errors_when_home_missing_and_xdg_unset() {
        let error = app_config_path("brushwork", "config.json", None, None).unwrap_err();
        assert_eq!(error, ConfigPathError::MissingHomeDirectory);
    }

    #[test]
    fn missing_fields_take_defaults() {
        let config = parse_engine_config(r#"{ "smoothing": false }"#).expect("valid json");
        assert!(!config.smoothing);
        assert_eq!(config.curve_steps, 2);
        assert_eq!(config.polygon_sides, 6);
        assert_eq!(config.kmeans_sample_budget, 10_000);
    }

    #[test]
    fn out_of_range_values_are_clamped() {
        let config = parse_engine_config(
            r#"{
                "curve_steps": 0,
                "polygon_sides": 1,
                "default_brush_size": -3.0,
                "default_palette_count": 0
            }"#,
        )
        .expect("valid json");
        assert_eq!(config.curve_steps, 2);
        assert_eq!(config.polygon_sides, 3);
        assert_eq!(config.default_brush_size, 8.0);
        assert_eq!(config.default_palette_count, 1);
    }

    #[test]
    fn malformed_file_falls_back_to_defaults() {
        let root = std::env::temp_dir().join(format!("brushwork-config-{}", std::process::id()));
        let dir = root.join(APP_DIR);
        std::fs::create_dir_all(&dir).expect("create config dir");
        std::fs::write(dir.join(APP_CONFIG_FILE), "{ not json").expect("write config");

        let config = load_engine_config_with(Some(&root), None);
        assert_eq!(config, EngineConfig::default());

        std::fs::remove_dir_all(&root).expect("remove config dir");
    }

    #[test]
    fn missing_file_uses_defaults() {
        let root = std::env::temp_dir().join("brushwork-config-absent");
        assert_eq!(load_engine_config_with(Some(&root), None), EngineConfig::default());
    }
}
