use glam::Vec2;
use serde::{Deserialize, Serialize};
use sidescroll_entities::LifecycleConfig;
use sidescroll_player::PlayerConfig;
use sidescroll_pool::PoolConfig;
use sidescroll_stream::StreamConfig;
use std::path::Path;

/// Errors from loading or validating a scene configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Every tunable of a scene. Missing keys take their defaults.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    pub stream: StreamConfig,
    pub player: PlayerConfig,
    pub pools: PoolConfig,
    pub lifecycle: LifecycleConfig,
    pub world: WorldConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Distance below the level's bottom edge at which the player has fallen out.
    pub fall_margin: f32,
    /// Spawn point used when the level has no `PlayerStart`.
    pub fallback_spawn: Vec2,
    /// Time spent dying before the player is respawned.
    pub respawn_delay_ms: u64,
    /// Game-state transitions kept by the store; 0 keeps none.
    pub state_history: usize,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            fall_margin: 100.0,
            fallback_spawn: Vec2::new(64.0, 100.0),
            respawn_delay_ms: 500,
            state_history: 100,
        }
    }
}

impl SceneConfig {
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let config: SceneConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let data = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml_str(&data)
    }

    pub fn to_yaml_string(&self) -> Result<String, ConfigError> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: &str| Err(ConfigError::Invalid(msg.to_string()));
        let s = &self.stream;
        if !(s.section_width.is_finite() && s.section_width > 0.0) {
            return invalid("stream.section_width must be positive");
        }
        if s.buffer_sections < 0 || s.unload_slack < 0 {
            return invalid("stream.buffer_sections and stream.unload_slack must not be negative");
        }
        if !(s.move_epsilon >= 0.0) {
            return invalid("stream.move_epsilon must not be negative");
        }
        if self.pools.bullet_capacity == 0 || self.pools.particle_capacity == 0 {
            return invalid("pool capacities must be at least 1");
        }
        if self.pools.particle_lifetime_ms == 0 {
            return invalid("pools.particle_lifetime_ms must be positive");
        }
        if !(self.world.fall_margin >= 0.0) {
            return invalid("world.fall_margin must not be negative");
        }
        let p = &self.player;
        if !(p.max_stamina > 0.0) || p.max_health == 0 {
            return invalid("player.max_stamina and player.max_health must be positive");
        }
        if !p.roll_drain.is_ascending() || !p.hover_drain.is_ascending() {
            return invalid("drain tiers must have strictly increasing until_ms");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_are_valid() {
        let config = SceneConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.stream.section_width, 640.0);
        assert_eq!(config.pools.bullet_capacity, 20);
        assert_eq!(config.pools.particle_capacity, 50);
        assert_eq!(config.world.state_history, 100);
    }

    #[test]
    fn partial_yaml_fills_defaults() {
        let yaml = "stream:\n  buffer_sections: 3\nplayer:\n  lives: 5\n";
        let config = SceneConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.stream.buffer_sections, 3);
        assert_eq!(config.stream.section_width, 640.0);
        assert_eq!(config.player.lives, 5);
        assert_eq!(config.player.coyote_ms, 80);
    }

    #[test]
    fn rejects_bad_values() {
        let err = SceneConfig::from_yaml_str("stream:\n  section_width: 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
        let err = SceneConfig::from_yaml_str("stream:\n  buffer_sections: -1\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
        let err = SceneConfig::from_yaml_str("pools:\n  bullet_capacity: 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
        let yaml = "player:\n  roll_drain:\n    - { until_ms: 600, rate: 1.0 }\n    - { until_ms: 300, rate: 2.0 }\n";
        assert!(matches!(
            SceneConfig::from_yaml_str(yaml).unwrap_err(),
            ConfigError::Invalid(_)
        ));
    }

    #[test]
    fn malformed_yaml_is_a_yaml_error() {
        let err = SceneConfig::from_yaml_str("stream: [unclosed").unwrap_err();
        assert!(matches!(err, ConfigError::Yaml(_)));
    }

    #[test]
    fn load_from_file_round_trips() {
        let mut config = SceneConfig::default();
        config.stream.unload_slack = 1;
        config.lifecycle.marker_types.insert("Checkpoint".into());

        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(config.to_yaml_string().unwrap().as_bytes()).unwrap();

        let loaded = SceneConfig::load(file.path()).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = SceneConfig::load(dir.path().join("nope.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
