//! Process-level settings and gameplay tunables.

use std::time::Duration;

/// Settings for one server process, usually built from command-line flags.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Simulation ticks per second
    pub tick_rate: u32,
    /// Connections beyond this are told the server is full and closed
    pub max_clients: usize,
    /// Seed for the world RNG; a random one is drawn when absent
    pub seed: Option<u64>,
    pub game: GameConfig,
}

impl ServerConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Fixed wall-clock period of one tick.
    pub fn tick_duration(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.tick_rate.max(1) as f64)
    }

    /// Fixed simulated time advanced by one tick.
    pub fn tick_dt(&self) -> f32 {
        1.0 / self.tick_rate.max(1) as f32
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            tick_rate: 20,
            max_clients: 64,
            seed: None,
            game: GameConfig::default(),
        }
    }
}

/// Gameplay tunables. All durations are in simulated seconds.
#[derive(Debug, Clone, PartialEq)]
pub struct GameConfig {
    pub spawn_interval: f32,
    /// Live enemies at or above this count block regular spawns
    pub enemy_cap: usize,
    /// Chance per spawn cycle of an extra miniboss, independent of the cap
    pub miniboss_chance: f64,
    pub purge_interval: f32,
    pub ground_item_lifetime: f64,
}

impl GameConfig {
    /// A world that never spawns anything on its own.
    pub fn without_spawning() -> Self {
        Self {
            enemy_cap: 0,
            miniboss_chance: 0.0,
            ..Self::default()
        }
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            spawn_interval: 1.0,
            enemy_cap: 50,
            miniboss_chance: 0.02,
            purge_interval: 5.0,
            ground_item_lifetime: 60.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn test_default_server_config() {
        let config = ServerConfig::default();
        assert_eq!(config.bind_address(), "0.0.0.0:8080");
        assert_eq!(config.tick_duration(), Duration::from_millis(50));
        assert_approx_eq!(config.tick_dt(), 0.05);
    }

    #[test]
    fn test_zero_tick_rate_does_not_divide_by_zero() {
        let config = ServerConfig {
            tick_rate: 0,
            ..ServerConfig::default()
        };
        assert_eq!(config.tick_duration(), Duration::from_secs(1));
    }

    #[test]
    fn test_without_spawning() {
        let config = GameConfig::without_spawning();
        assert_eq!(config.enemy_cap, 0);
        assert_eq!(config.miniboss_chance, 0.0);
        assert_eq!(config.purge_interval, GameConfig::default().purge_interval);
    }
}
