use std::hint::black_box;
use std::sync::Arc;
use std::time::Instant;

use glam::Vec2;
use sidescroll_entities::{
    BasicEntity, EntityFields, EntityInstance, EntityLifecycleManager, FactoryRegistry,
    LifecycleConfig, SpawnError,
};
use sidescroll_level::{EntityDef, LayerInstance, LevelDescription, SubLevel};
use sidescroll_stream::{StreamConfig, StreamController, TileLoader, TileMap};

fn make_level(sub_levels: usize, enemies_per_level: usize) -> Arc<LevelDescription> {
    let levels = (0..sub_levels)
        .map(|i| {
            let spacing = 2048.0 / enemies_per_level as f32;
            let enemies = (0..enemies_per_level)
                .map(|e| EntityDef::new("Enemy", e as f32 * spacing, 480.0))
                .collect();
            let csv = (0..64 * 16).map(|c| if c / 64 >= 14 { 1 + (c % 4) } else { 0 }).collect();
            SubLevel::new(format!("L{i}"), 2048, 512)
                .with_layer(LayerInstance::int_grid("Solid", 64, 16, 32, csv))
                .with_layer(LayerInstance::entities("Entities", enemies))
        })
        .collect();
    Arc::new(LevelDescription::from_sub_levels(levels).expect("non-empty level"))
}

fn make_controller(level: Arc<LevelDescription>) -> StreamController<()> {
    let mut registry = FactoryRegistry::new();
    registry.register("Enemy", |_: &mut (), pos: Vec2, fields: &EntityFields| {
        Ok::<_, SpawnError>(Box::new(BasicEntity::new("Enemy", pos, fields.clone())) as Box<dyn EntityInstance>)
    });
    let entities = EntityLifecycleManager::new(Arc::clone(&level), registry, LifecycleConfig::default());
    StreamController::new(StreamConfig::default(), level, entities)
}

fn bench_decode(sub_levels: usize, iterations: usize) {
    let level = make_level(sub_levels, 16);
    let controller = make_controller(Arc::clone(&level));
    let loader = TileLoader::new(level, *controller.grid());
    let max = controller.grid().max_section();

    let start = Instant::now();
    for i in 0..iterations {
        let section = (i as i32) % (max + 1);
        let _ = black_box(loader.placements_for_section(black_box(section)));
    }
    let elapsed = start.elapsed();
    let per_iter = elapsed / iterations as u32;
    println!("  decode ({sub_levels} sub-levels, {iterations} iters): {per_iter:?}/iter, total {elapsed:?}");
}

fn bench_traversal(sub_levels: usize, enemies_per_level: usize, step: f32) {
    let level = make_level(sub_levels, enemies_per_level);
    let world_width = level.world_width();
    let mut controller = make_controller(level);
    let mut surface = TileMap::new();

    let mut updates = 0u32;
    let mut x = 0.0;
    let start = Instant::now();
    while x < world_width {
        let _ = black_box(controller.update(black_box(x), &mut surface, &mut ()));
        x += step;
        updates += 1;
    }
    let elapsed = start.elapsed();
    println!(
        "  traversal ({sub_levels} sub-levels, {enemies_per_level} enemies each, step {step}): {:?}/update, worst {:?}, total {elapsed:?}",
        elapsed / updates.max(1),
        controller.history().max(),
    );
}

fn main() {
    println!("=== Stream Section Benchmarks ===\n");

    println!("Section decode:");
    bench_decode(4, 10000);
    bench_decode(32, 10000);

    println!("\nTraversal (load/unload as the player walks):");
    bench_traversal(8, 16, 5.0);
    bench_traversal(32, 16, 5.0);
    bench_traversal(32, 128, 5.0);

    println!("\n=== Done ===");
}
