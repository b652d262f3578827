use anyhow::Context;
use clap::{Parser, Subcommand};
use glam::Vec2;
use sidescroll_common::SectionGrid;
use sidescroll_entities::{BasicEntity, EntityFields, EntityInstance, FactoryRegistry, LifecycleConfig, SpawnError};
use sidescroll_input::{InputSignal, InputState};
use sidescroll_kernel::{GameEvent, Scene, SceneConfig, Topic};
use sidescroll_level::LevelDescription;
use sidescroll_player::BodyState;
use sidescroll_stream::{StreamConfig, TileLoader};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Entity types the demo game knows how to build.
const DEMO_TYPES: [&str; 4] = ["Enemy", "Zapper", "NeutralObject", "InteractiveObject"];

#[derive(Parser)]
#[command(name = "sidescroll-cli", about = "CLI tool for sidescroll levels")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print crate info
    Info,
    /// List every section of a level with its tile and entity counts
    Sections {
        /// Level description JSON
        #[arg(short, long)]
        level: PathBuf,
        /// Section width in world units
        #[arg(short = 'w', long)]
        section_width: Option<f32>,
    },
    /// Walk a headless player through a level and report streaming state
    Simulate {
        /// Level description JSON
        #[arg(short, long)]
        level: PathBuf,
        /// Number of ticks to simulate
        #[arg(short, long, default_value = "600")]
        ticks: u64,
        /// Walking speed in world units per second
        #[arg(short, long)]
        speed: Option<f32>,
        /// Scene configuration YAML
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Print a summary every N ticks
        #[arg(long, default_value = "60")]
        report_every: u64,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match cli.command {
        Commands::Info => {
            println!("sidescroll-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("common: {}", sidescroll_common::crate_info());
            println!("level: {}", sidescroll_level::crate_info());
            println!("input: {}", sidescroll_input::crate_info());
            println!("entities: {}", sidescroll_entities::crate_info());
            println!("stream: {}", sidescroll_stream::crate_info());
            println!("player: {}", sidescroll_player::crate_info());
            println!("pool: {}", sidescroll_pool::crate_info());
            println!("kernel: {}", sidescroll_kernel::crate_info());
        }
        Commands::Sections { level, section_width } => {
            let level = load_level(&level)?;
            let width = section_width.unwrap_or(StreamConfig::default().section_width);
            anyhow::ensure!(width > 0.0, "section width must be positive");
            print_sections(&level, width);
        }
        Commands::Simulate {
            level,
            ticks,
            speed,
            config,
            report_every,
        } => {
            let level = load_level(&level)?;
            let mut config = match config {
                Some(path) => SceneConfig::load(&path)
                    .with_context(|| format!("loading config {}", path.display()))?,
                None => SceneConfig::default(),
            };
            if let Some(speed) = speed {
                config.player.movement_speed = speed;
            }
            simulate(level, config, ticks, report_every.max(1))?;
        }
    }

    Ok(())
}

fn load_level(path: &PathBuf) -> anyhow::Result<Arc<LevelDescription>> {
    let level = LevelDescription::load(path).with_context(|| format!("loading level {}", path.display()))?;
    Ok(Arc::new(level))
}

fn print_sections(level: &Arc<LevelDescription>, section_width: f32) {
    let grid = SectionGrid::for_world(level.world_width(), section_width);
    let tiles = TileLoader::new(Arc::clone(level), grid);
    let rules = LifecycleConfig::default();

    println!(
        "Level: sub_levels={} world={}x{} tile={} sections={}",
        level.len(),
        level.world_width(),
        level.world_height(),
        level.grid_size(),
        grid.max_section() + 1
    );
    for section in 0..=grid.max_section() {
        let range = grid.world_range(section);
        let mut names = Vec::new();
        let mut entities = 0;
        for (_, origin_x, sub_level) in level.overlapping(range.start, range.end) {
            names.push(sub_level.identifier.as_str());
            if let Some(layer) = sub_level.entity_layer() {
                entities += layer
                    .entity_instances
                    .iter()
                    .filter(|e| !rules.is_marker(&e.identifier) && range.contains(&(origin_x + e.px[0])))
                    .count();
            }
        }
        println!(
            "  [{section:>3}] x={:>7.0}..{:<7.0} tiles={:<5} entities={:<3} sub_levels={}",
            range.start,
            range.end,
            tiles.placements_for_section(section).len(),
            entities,
            names.join(",")
        );
    }
}

fn demo_registry() -> FactoryRegistry<()> {
    let mut registry = FactoryRegistry::new();
    for name in DEMO_TYPES {
        registry.register(name, move |_: &mut (), pos: Vec2, fields: &EntityFields| {
            Ok::<_, SpawnError>(Box::new(BasicEntity::new(name, pos, fields.clone())) as Box<dyn EntityInstance>)
        });
    }
    registry
}

fn simulate(level: Arc<LevelDescription>, config: SceneConfig, ticks: u64, report_every: u64) -> anyhow::Result<()> {
    let dt = Duration::from_millis(16);
    let mut scene = Scene::new(config, level, demo_registry())?;
    let mut body = BodyState::grounded_at(scene.spawn_point());
    let mut input = InputState::new();
    let mut topics: BTreeMap<Topic, usize> = BTreeMap::new();
    let world_end = scene.level().world_width();

    println!("Simulating {ticks} ticks from ({}, {})", body.position.x, body.position.y);

    for _ in 0..ticks {
        let next = scene.now() + dt;
        input.begin_frame();
        input.set(InputSignal::Right, true, next);

        let report = scene.step(dt, &input, body, &mut ());

        if let Some(spawn) = report.respawn_at {
            body = BodyState::grounded_at(spawn);
        } else if !report.intent.frozen {
            body.velocity.x = report.intent.velocity_x;
            body.position.x = (body.position.x + body.velocity.x * dt.as_secs_f32()).clamp(0.0, world_end);
        }
        body.blocked_right = body.position.x >= world_end;

        for event in scene.bus_mut().drain_events() {
            *topics.entry(event.topic()).or_default() += 1;
            if let GameEvent::SectionLoaded { .. } | GameEvent::SectionUnloaded { .. } = event {
                tracing::debug!(?event, tick = report.tick, "stream event");
            }
        }

        if report.tick % report_every == 0 {
            println!("{}", scene.summary());
        }
        if report.game_over {
            println!("Game over at tick {}", report.tick);
            break;
        }
    }

    println!("Final: {}", scene.summary());
    println!("Final x={:.1} t={}ms", body.position.x, scene.now().as_millis());
    for (topic, count) in topics {
        println!("  {topic:?}: {count} events");
    }
    Ok(())
}
