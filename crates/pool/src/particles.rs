use glam::Vec2;
use std::f32::consts::TAU;

use crate::PoolConfig;
use crate::pool::{ObjectPool, PoolHandle, Poolable};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Particle {
    pub position: Vec2,
    pub velocity: Vec2,
    pub color: u32,
    pub age: f32,
    pub lifetime: f32,
    pub alpha: f32,
    pub scale: f32,
}

impl Default for Particle {
    fn default() -> Self {
        Self {
            position: Vec2::ZERO,
            velocity: Vec2::ZERO,
            color: 0xffffff,
            age: 0.0,
            lifetime: 0.0,
            alpha: 1.0,
            scale: 1.0,
        }
    }
}

impl Poolable for Particle {
    fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Pooled burst particles that fly outward, shrink and fade, then recycle.
#[derive(Debug)]
pub struct ParticlePool {
    pool: ObjectPool<Particle>,
    seed: u64,
    lifetime: f32,
    min_speed: f32,
    max_speed: f32,
    end_scale: f32,
}

impl ParticlePool {
    pub fn new(config: &PoolConfig) -> Self {
        Self {
            pool: ObjectPool::new(config.particle_capacity, Particle::default),
            seed: config.particle_seed,
            lifetime: config.particle_lifetime_ms as f32 / 1000.0,
            min_speed: config.particle_min_speed,
            max_speed: config.particle_max_speed,
            end_scale: config.particle_end_scale,
        }
    }

    pub fn pool(&self) -> &ObjectPool<Particle> {
        &self.pool
    }

    pub fn active_count(&self) -> usize {
        self.pool.active_count()
    }

    /// Spawn up to `count` particles at `center` with random directions and
    /// speeds. Returns the handles actually spawned.
    pub fn burst(&mut self, center: Vec2, color: u32, count: usize) -> Vec<PoolHandle> {
        let mut spawned = Vec::with_capacity(count);
        for _ in 0..count {
            let angle = self.next_unit() * TAU;
            let speed = self.min_speed + self.next_unit() * (self.max_speed - self.min_speed);
            let velocity = Vec2::from_angle(angle) * speed;
            let lifetime = self.lifetime;
            let Some(handle) = self.pool.acquire(|p| {
                p.position = center;
                p.velocity = velocity;
                p.color = color;
                p.lifetime = lifetime;
            }) else {
                tracing::trace!(requested = count, spawned = spawned.len(), "particle pool exhausted");
                break;
            };
            spawned.push(handle);
        }
        spawned
    }

    /// Advance every particle; release those past their lifetime.
    pub fn update(&mut self, dt: f32) -> usize {
        let end_scale = self.end_scale;
        self.pool.retain_active(|p| {
            p.age += dt;
            if p.age >= p.lifetime {
                return false;
            }
            let t = p.age / p.lifetime;
            p.position += p.velocity * dt;
            p.alpha = 1.0 - t;
            p.scale = 1.0 + (end_scale - 1.0) * t;
            true
        })
    }

    pub fn clear(&mut self) -> usize {
        self.pool.release_all()
    }

    pub fn iter(&self) -> impl Iterator<Item = (PoolHandle, &Particle)> {
        self.pool.iter_active()
    }

    /// Uniform in `[0, 1)` from a splitmix64 stream.
    fn next_unit(&mut self) -> f32 {
        self.seed = self.seed.wrapping_add(0x9e37_79b9_7f4a_7c15);
        let mut z = self.seed;
        z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
        z ^= z >> 31;
        (z >> 40) as f32 / (1u64 << 24) as f32
    }
}
