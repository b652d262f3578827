use serde::{Deserialize, Serialize};
use std::time::Duration;

/// One step of an escalating drain: `rate` stamina per second applies while
/// the action's elapsed time is at most `until_ms`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DrainTier {
    pub until_ms: u64,
    pub rate: f32,
}

impl DrainTier {
    pub const fn new(until_ms: u64, rate: f32) -> Self {
        Self { until_ms, rate }
    }
}

/// Piecewise-constant stamina drain over the duration of an action.
///
/// Elapsed time past the last tier keeps draining at the last tier's rate.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DrainSchedule {
    tiers: Vec<DrainTier>,
}

impl DrainSchedule {
    pub fn new(tiers: Vec<DrainTier>) -> Self {
        Self { tiers }
    }

    pub fn roll() -> Self {
        Self::new(vec![
            DrainTier::new(300, 45.0),
            DrainTier::new(600, 60.0),
            DrainTier::new(900, 85.0),
            DrainTier::new(1200, 120.0),
        ])
    }

    pub fn hover() -> Self {
        Self::new(vec![
            DrainTier::new(500, 35.0),
            DrainTier::new(1000, 45.0),
            DrainTier::new(1500, 65.0),
            DrainTier::new(2000, 90.0),
        ])
    }

    pub fn tiers(&self) -> &[DrainTier] {
        &self.tiers
    }

    /// Tier boundaries strictly increase.
    pub fn is_ascending(&self) -> bool {
        self.tiers.windows(2).all(|w| w[0].until_ms < w[1].until_ms)
    }

    /// Drain rate per second at `elapsed` into the action.
    pub fn rate_at(&self, elapsed: Duration) -> f32 {
        let ms = elapsed.as_secs_f64() * 1000.0;
        self.tiers
            .iter()
            .find(|t| ms <= t.until_ms as f64)
            .or(self.tiers.last())
            .map_or(0.0, |t| t.rate)
    }

    /// Total stamina drained between two elapsed times, integrating each
    /// tier's rate over its slice of `[from, to]`.
    pub fn drain_between(&self, from: Duration, to: Duration) -> f32 {
        let Some(last) = self.tiers.last() else {
            return 0.0;
        };
        let end_ms = to.as_secs_f64() * 1000.0;
        let mut cursor = from.as_secs_f64() * 1000.0;
        let mut total = 0.0f64;

        for tier in &self.tiers {
            if cursor >= end_ms {
                break;
            }
            let slice_end = end_ms.min(tier.until_ms as f64);
            if slice_end > cursor {
                total += tier.rate as f64 * (slice_end - cursor) / 1000.0;
                cursor = slice_end;
            }
        }
        if cursor < end_ms {
            total += last.rate as f64 * (end_ms - cursor) / 1000.0;
        }
        total as f32
    }
}

/// Movement, stamina and health tuning. Times are in milliseconds, speeds in
/// world units per second (negative y is up).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    pub max_health: u32,
    pub damage: u32,
    pub invulnerability_ms: u64,
    pub lives: u32,

    pub max_stamina: f32,
    pub stamina_regen: f32,
    pub ground_regen_bonus: f32,
    pub regen_delay_ms: u64,

    pub movement_speed: f32,
    pub jump_speed: f32,
    pub max_jumps: u32,
    pub coyote_ms: u64,
    pub jump_buffer_ms: u64,

    pub roll_speed: f32,
    pub roll_drain: DrainSchedule,

    pub hover_drain: DrainSchedule,
    pub hover_max_ms: u64,
    pub hover_cooldown_ms: u64,
    pub hover_hold_ms: u64,
    pub hover_force: f32,
    /// Horizontal speed multiplier while hovering.
    pub hover_air_control: f32,
    /// Horizontal velocity multiplier per tick while hovering with no input.
    pub hover_drift_damping: f32,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            max_health: 100,
            damage: 25,
            invulnerability_ms: 1000,
            lives: 3,
            max_stamina: 100.0,
            stamina_regen: 12.0,
            ground_regen_bonus: 8.0,
            regen_delay_ms: 500,
            movement_speed: 300.0,
            jump_speed: -330.0,
            max_jumps: 1,
            coyote_ms: 80,
            jump_buffer_ms: 200,
            roll_speed: 450.0,
            roll_drain: DrainSchedule::roll(),
            hover_drain: DrainSchedule::hover(),
            hover_max_ms: 2000,
            hover_cooldown_ms: 1000,
            hover_hold_ms: 100,
            hover_force: -100.0,
            hover_air_control: 0.8,
            hover_drift_damping: 0.95,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    #[test]
    fn rate_lookup_is_inclusive_of_tier_end() {
        let roll = DrainSchedule::roll();
        assert_eq!(roll.rate_at(ms(0)), 45.0);
        assert_eq!(roll.rate_at(ms(300)), 45.0);
        assert_eq!(roll.rate_at(ms(301)), 60.0);
        assert_eq!(roll.rate_at(ms(1200)), 120.0);
        assert_eq!(roll.rate_at(ms(5000)), 120.0);
    }

    #[test]
    fn drain_integrates_across_tiers() {
        let roll = DrainSchedule::roll();
        // 45*0.3 + 60*0.3 + 85*0.3 + 120*0.1
        assert!((roll.drain_between(ms(0), ms(1000)) - 69.0).abs() < 1e-4);
        assert!((roll.drain_between(ms(250), ms(350)) - (45.0 * 0.05 + 60.0 * 0.05)).abs() < 1e-4);
        assert!((roll.drain_between(ms(1200), ms(1500)) - 36.0).abs() < 1e-4);
        assert_eq!(roll.drain_between(ms(400), ms(400)), 0.0);
    }

    #[test]
    fn empty_schedule_never_drains() {
        let none = DrainSchedule::default();
        assert_eq!(none.rate_at(ms(10)), 0.0);
        assert_eq!(none.drain_between(ms(0), ms(1000)), 0.0);
    }

    #[test]
    fn default_schedules_ascend() {
        let config = PlayerConfig::default();
        assert!(config.roll_drain.is_ascending());
        assert!(config.hover_drain.is_ascending());
        assert!(!DrainSchedule::new(vec![DrainTier::new(500, 1.0), DrainTier::new(500, 2.0)]).is_ascending());
    }

    #[test]
    fn partial_config_uses_defaults() {
        let config: PlayerConfig = serde_json::from_str(r#"{ "lives": 5 }"#).unwrap();
        assert_eq!(config.lives, 5);
        assert_eq!(config.coyote_ms, 80);
        assert_eq!(config.roll_drain, DrainSchedule::roll());
    }
}
