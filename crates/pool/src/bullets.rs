use glam::Vec2;
use sidescroll_common::Facing;

use crate::pool::{ObjectPool, PoolHandle, Poolable};
use crate::{Bounds, PoolConfig};

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Bullet {
    pub position: Vec2,
    pub velocity: Vec2,
    pub damage: u32,
}

impl Poolable for Bullet {
    fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Pooled projectiles. Bullets ignore gravity and are released once they
/// leave the world bounds plus a margin.
#[derive(Debug)]
pub struct BulletPool {
    pool: ObjectPool<Bullet>,
    speed: f32,
    damage: u32,
    margin: f32,
}

impl BulletPool {
    pub fn new(config: &PoolConfig) -> Self {
        Self {
            pool: ObjectPool::new(config.bullet_capacity, Bullet::default),
            speed: config.bullet_speed,
            damage: config.bullet_damage,
            margin: config.bullet_margin,
        }
    }

    pub fn pool(&self) -> &ObjectPool<Bullet> {
        &self.pool
    }

    pub fn active_count(&self) -> usize {
        self.pool.active_count()
    }

    /// Fire horizontally in `facing` at the configured speed and damage.
    pub fn fire(&mut self, origin: Vec2, facing: Facing) -> Option<PoolHandle> {
        let velocity = Vec2::new(facing.sign() * self.speed, 0.0);
        self.fire_with(origin, velocity, self.damage)
    }

    pub fn fire_with(&mut self, origin: Vec2, velocity: Vec2, damage: u32) -> Option<PoolHandle> {
        let handle = self.pool.acquire(|b| {
            b.position = origin;
            b.velocity = velocity;
            b.damage = damage;
        });
        if handle.is_none() {
            tracing::trace!(capacity = self.pool.capacity(), "bullet pool exhausted");
        }
        handle
    }

    /// Release a bullet that hit something.
    pub fn hit(&mut self, handle: PoolHandle) -> bool {
        self.pool.release(handle)
    }

    /// Move every bullet and release those out of bounds. Returns the number released.
    pub fn update(&mut self, dt: f32, bounds: Bounds) -> usize {
        let bounds = bounds.expanded(self.margin);
        self.pool.retain_active(|b| {
            b.position += b.velocity * dt;
            bounds.contains(b.position)
        })
    }

    pub fn clear(&mut self) -> usize {
        self.pool.release_all()
    }

    pub fn iter(&self) -> impl Iterator<Item = (PoolHandle, &Bullet)> {
        self.pool.iter_active()
    }
}
