//! Scene configuration resource.
//!
//! Server settings loaded from an INI file. Every value has a safe default,
//! so a missing file or key never prevents the scene from starting.
//!
//! # Configuration File Format
//!
//! ```ini
//! [tick]
//! interval_ms = 50
//!
//! [space]
//! cell_size = 64
//! depth = 6
//!
//! [clients]
//! interest_radius = 400
//! pawn = hero
//! entrance_seed = 7
//!
//! [scene]
//! path = assets/scene.json
//! ```

use bevy_ecs::prelude::*;
use configparser::ini::Ini;
use log::info;
use std::path::PathBuf;

use crate::resources::sceneclock::DEFAULT_TICK_INTERVAL_MS;

const DEFAULT_CELL_SIZE: f32 = 64.0;
const DEFAULT_DEPTH: u8 = 6;
const DEFAULT_INTEREST_RADIUS: f32 = 400.0;
const DEFAULT_ENTRANCE_SEED: u64 = 0;
const DEFAULT_CONFIG_PATH: &str = "./config.ini";

#[derive(Resource, Debug, Clone)]
pub struct SceneConfig {
    /// Milliseconds between ticks.
    pub tick_interval_ms: u32,
    /// Side of the finest spatial index cell.
    pub cell_size: f32,
    /// Number of spatial index levels.
    pub depth: u8,
    /// Half-size of the square each client receives updates for.
    pub interest_radius: f32,
    /// Actor config spawned as the pawn of each entering client.
    pub pawn: Option<String>,
    /// Seed for picking default entrances.
    pub entrance_seed: u64,
    /// Scene document to load at startup.
    pub scene_path: Option<PathBuf>,
    /// Path to the configuration file.
    pub config_path: PathBuf,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneConfig {
    pub fn new() -> Self {
        Self {
            tick_interval_ms: DEFAULT_TICK_INTERVAL_MS,
            cell_size: DEFAULT_CELL_SIZE,
            depth: DEFAULT_DEPTH,
            interest_radius: DEFAULT_INTEREST_RADIUS,
            pawn: None,
            entrance_seed: DEFAULT_ENTRANCE_SEED,
            scene_path: None,
            config_path: PathBuf::from(DEFAULT_CONFIG_PATH),
        }
    }

    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: path.into(),
            ..Self::new()
        }
    }

    pub fn ticks_per_second(&self) -> u32 {
        1000 / self.tick_interval_ms.max(1)
    }

    /// Load configuration from the INI file.
    ///
    /// Missing values retain their current values.
    pub fn load_from_file(&mut self) -> Result<(), String> {
        let mut config = Ini::new();
        config
            .load(&self.config_path)
            .map_err(|e| format!("Failed to load config file: {}", e))?;
        self.apply(&config);
        Ok(())
    }

    /// Load configuration from INI text.
    pub fn load_from_str(&mut self, text: &str) -> Result<(), String> {
        let mut config = Ini::new();
        config
            .read(text.to_string())
            .map_err(|e| format!("Failed to parse config: {}", e))?;
        self.apply(&config);
        Ok(())
    }

    fn apply(&mut self, config: &Ini) {
        // [tick] section
        if let Some(interval) = config.getuint("tick", "interval_ms").ok().flatten() {
            self.tick_interval_ms = (interval as u32).max(1);
        }

        // [space] section
        if let Some(cell_size) = config.getfloat("space", "cell_size").ok().flatten() {
            self.cell_size = cell_size as f32;
        }
        if let Some(depth) = config.getuint("space", "depth").ok().flatten() {
            self.depth = depth.clamp(1, 16) as u8;
        }

        // [clients] section
        if let Some(radius) = config.getfloat("clients", "interest_radius").ok().flatten() {
            self.interest_radius = radius as f32;
        }
        if let Some(pawn) = config.get("clients", "pawn") {
            self.pawn = (!pawn.is_empty()).then_some(pawn);
        }
        if let Some(seed) = config.getuint("clients", "entrance_seed").ok().flatten() {
            self.entrance_seed = seed;
        }

        // [scene] section
        if let Some(path) = config.get("scene", "path") {
            self.scene_path = Some(PathBuf::from(path));
        }

        info!(
            "Loaded config: tick={}ms, space={}x{}, interest={}, pawn={:?}",
            self.tick_interval_ms, self.cell_size, self.depth, self.interest_radius, self.pawn
        );
    }
    /// Save configuration to the INI file.
    pub fn save_to_file(&self) -> Result<(), String> {
        let mut config = Ini::new();

        config.set("tick", "interval_ms", Some(self.tick_interval_ms.to_string()));
        config.set("space", "cell_size", Some(self.cell_size.to_string()));
        config.set("space", "depth", Some(self.depth.to_string()));
        config.set(
            "clients",
            "interest_radius",
            Some(self.interest_radius.to_string()),
        );
        config.set("clients", "pawn", self.pawn.clone());
        config.set(
            "clients",
            "entrance_seed",
            Some(self.entrance_seed.to_string()),
        );
        if let Some(path) = &self.scene_path {
            config.set("scene", "path", Some(path.display().to_string()));
        }

        config
            .write(&self.config_path)
            .map_err(|e| format!("Failed to save config file: {}", e))?;

        info!("Saved config to {:?}", self.config_path);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = SceneConfig::new();
        assert_eq!(config.tick_interval_ms, 50);
        assert_eq!(config.ticks_per_second(), 20);
        assert_eq!(config.cell_size, 64.0);
        assert_eq!(config.depth, 6);
        assert!(config.pawn.is_none());
    }

    #[test]
    fn partial_ini_overrides_only_present_keys() {
        let mut config = SceneConfig::new();
        config
            .load_from_str("[tick]\ninterval_ms = 100\n[clients]\npawn = hero\n")
            .unwrap();
        assert_eq!(config.tick_interval_ms, 100);
        assert_eq!(config.ticks_per_second(), 10);
        assert_eq!(config.pawn.as_deref(), Some("hero"));
        assert_eq!(config.cell_size, 64.0);
    }

    #[test]
    fn saved_file_loads_back() {
        let path = std::env::temp_dir().join(format!(
            "tickscene-config-{}.ini",
            std::process::id()
        ));
        let mut config = SceneConfig::with_path(&path);
        config.tick_interval_ms = 40;
        config.cell_size = 32.0;
        config.depth = 4;
        config.pawn = Some("hero".to_string());
        config.entrance_seed = 11;
        config.scene_path = Some(PathBuf::from("assets/scene.json"));
        config.save_to_file().unwrap();

        let mut loaded = SceneConfig::with_path(&path);
        loaded.load_from_file().unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(loaded.tick_interval_ms, 40);
        assert_eq!(loaded.cell_size, 32.0);
        assert_eq!(loaded.depth, 4);
        assert_eq!(loaded.interest_radius, 400.0);
        assert_eq!(loaded.pawn.as_deref(), Some("hero"));
        assert_eq!(loaded.entrance_seed, 11);
        assert_eq!(loaded.scene_path, Some(PathBuf::from("assets/scene.json")));
    }

    #[test]
    fn missing_file_is_an_error_and_keeps_defaults() {
        let mut config = SceneConfig::with_path("/nonexistent/scene-config.ini");
        assert!(config.load_from_file().is_err());
        assert_eq!(config.tick_interval_ms, 50);
    }
}
