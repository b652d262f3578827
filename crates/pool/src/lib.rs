//! Object pools: preallocated bullets and particles recycled instead of
//! created and destroyed per shot or effect.
//!
//! # Invariants
//! - A pool never grows past its configured capacity.
//! - Handles to released slots never resolve.

mod bullets;
mod particles;
mod pool;

pub use bullets::{Bullet, BulletPool};
pub use particles::{Particle, ParticlePool};
pub use pool::{ObjectPool, PoolHandle, Poolable};

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Capacities and tuning for the bullet and particle pools.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    pub bullet_capacity: usize,
    pub bullet_speed: f32,
    pub bullet_damage: u32,
    /// Distance past the world bounds a bullet may travel before release.
    pub bullet_margin: f32,
    pub particle_capacity: usize,
    pub particle_lifetime_ms: u64,
    pub particle_min_speed: f32,
    pub particle_max_speed: f32,
    pub particle_end_scale: f32,
    pub particle_seed: u64,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            bullet_capacity: 20,
            bullet_speed: 600.0,
            bullet_damage: 10,
            bullet_margin: 50.0,
            particle_capacity: 50,
            particle_lifetime_ms: 300,
            particle_min_speed: 100.0,
            particle_max_speed: 200.0,
            particle_end_scale: 0.1,
            particle_seed: 0,
        }
    }
}

/// Axis-aligned world rectangle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: Vec2,
    pub max: Vec2,
}

impl Bounds {
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, p: Vec2) -> bool {
        p.cmpge(self.min).all() && p.cmple(self.max).all()
    }

    pub fn expanded(&self, margin: f32) -> Self {
        Self {
            min: self.min - Vec2::splat(margin),
            max: self.max + Vec2::splat(margin),
        }
    }
}

pub fn crate_info() -> &'static str {
    "sidescroll-pool v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds_contains_edges() {
        let b = Bounds::new(Vec2::ZERO, Vec2::new(10.0, 10.0));
        assert!(b.contains(Vec2::new(10.0, 0.0)));
        assert!(!b.contains(Vec2::new(10.1, 5.0)));
        assert!(b.expanded(1.0).contains(Vec2::new(10.5, -0.5)));
    }
}
