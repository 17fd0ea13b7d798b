//! Demo simulation: particles that drift, age, and expire.
//!
//! | System    | Phase        | Work                                              |
//! |-----------|--------------|---------------------------------------------------|
//! | spawner   | Init         | spawns `spawn_count` particles                    |
//! | movement  | Update       | integrates `Position += Velocity * dt`            |
//! | aging     | FixedUpdate  | counts down `Lifetime`, despawns expired entities |
//! | respawner | FixedUpdate  | tops the population back up                       |
//! | reporter  | LateUpdate   | logs world stats every `report_every` frames      |
//! | teardown  | Destroy      | despawns whatever is left                         |

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use engine_ecs::{Component, Entity, FilterDescriptor, FilterId, World};
use engine_system::{Phase, System, SystemConfig, SystemContext, SystemsPipeline, system_fn};

/// Position in world units.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Component for Position {}

/// Velocity in world units per second.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Velocity {
    pub x: f64,
    pub y: f64,
}

impl Component for Velocity {}

/// Seconds until the entity expires.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Lifetime {
    pub remaining: f64,
}

impl Component for Lifetime {}

/// Demo settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DemoConfig {
    /// Particles spawned at init, and the population the respawner keeps.
    pub spawn_count: usize,
    /// Lifetime of the longest-lived particle, in seconds.
    pub max_lifetime: f64,
    /// Frames between two stats reports (0 = never).
    pub report_every: u64,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            spawn_count: 64,
            max_lifetime: 2.0,
            report_every: 60,
        }
    }
}

/// Filters created by [`install`].
#[derive(Debug, Clone, Copy)]
pub struct DemoFilters {
    /// Entities with `Position` and `Velocity`.
    pub moving: FilterId,
    /// Entities with `Lifetime`.
    pub mortal: FilterId,
}

/// Create the demo's filters on the default world and register its systems.
pub fn install(pipeline: &mut SystemsPipeline, config: &DemoConfig) -> DemoFilters {
    let world = pipeline.world_mut();
    let filters = DemoFilters {
        moving: world.create_filter(
            FilterDescriptor::new()
                .include::<Position>()
                .include::<Velocity>(),
        ),
        mortal: world.create_filter(FilterDescriptor::new().include::<Lifetime>()),
    };

    let spawner = Spawner::new(config);
    pipeline.register(spawner.clone(), Phase::Init);
    pipeline.register(Movement { filter: filters.moving }, Phase::Update);
    pipeline.register_with(
        SystemConfig::new("aging", Phase::FixedUpdate).with_execution_order(-10),
        Aging {
            filter: filters.mortal,
        },
    );
    pipeline.register_with(SystemConfig::new("respawner", Phase::FixedUpdate), spawner);

    let report_every = config.report_every;
    pipeline.register(
        system_fn("reporter", move |ctx| {
            if report_every > 0 && ctx.frame() % report_every == 0 {
                let stats = ctx.world().stats();
                info!(
                    frame = ctx.frame(),
                    stats = %serde_json::to_string(&stats)?,
                    "world stats"
                );
            }
            Ok(())
        }),
        Phase::LateUpdate,
    );
    pipeline.register(
        system_fn("teardown", |ctx| {
            let world = ctx.world();
            let remaining: Vec<Entity> = world.entities().iter().map(|r| r.entity).collect();
            for entity in &remaining {
                world.despawn(*entity)?;
            }
            world.refresh_filters();
            info!(despawned = remaining.len(), "world cleared");
            Ok(())
        }),
        Phase::Destroy,
    );

    filters
}

/// Spawns particles until the population reaches `target`.
#[derive(Debug, Clone)]
struct Spawner {
    target: usize,
    max_lifetime: f64,
    spawned: u64,
}

impl Spawner {
    fn new(config: &DemoConfig) -> Self {
        Self {
            target: config.spawn_count,
            max_lifetime: config.max_lifetime,
            spawned: 0,
        }
    }

    fn spawn_one(&mut self, world: &mut World) -> anyhow::Result<Entity> {
        let n = self.spawned;
        self.spawned += 1;

        let angle = (n % 360) as f64 * std::f64::consts::PI / 180.0;
        let speed = 1.0 + (n % 5) as f64;
        // Lifetimes cycle through ten steps up to max_lifetime.
        let lifetime = self.max_lifetime * ((n % 10) + 1) as f64 / 10.0;

        let entity = world.new_entity();
        world.add_component::<Position>(entity)?;
        world.insert_component(
            entity,
            Velocity {
                x: angle.cos() * speed,
                y: angle.sin() * speed,
            },
        )?;
        world.insert_component(entity, Lifetime { remaining: lifetime })?;
        Ok(entity)
    }
}

impl System for Spawner {
    fn name(&self) -> &str {
        "spawner"
    }

    fn run(&mut self, ctx: &mut SystemContext<'_>) -> anyhow::Result<()> {
        let world = ctx.world();
        let missing = self.target.saturating_sub(world.entity_count());
        for _ in 0..missing {
            self.spawn_one(world)?;
        }
        if missing > 0 && ctx.phase() == Phase::Init {
            info!(count = missing, "particles spawned");
        }
        Ok(())
    }
}

/// Integrates velocity into position.
#[derive(Debug)]
struct Movement {
    filter: FilterId,
}

impl System for Movement {
    fn name(&self) -> &str {
        "movement"
    }

    fn run(&mut self, ctx: &mut SystemContext<'_>) -> anyhow::Result<()> {
        let dt = ctx.dt();
        let world = ctx.world();
        for entity in world.matching_entities(self.filter).to_vec() {
            let velocity = *world.get_component::<Velocity>(entity)?;
            let position = world.get_component_mut::<Position>(entity)?;
            position.x += velocity.x * dt;
            position.y += velocity.y * dt;
        }
        Ok(())
    }
}

/// Counts lifetimes down and despawns expired entities.
#[derive(Debug)]
struct Aging {
    filter: FilterId,
}

impl System for Aging {
    fn name(&self) -> &str {
        "aging"
    }

    fn run(&mut self, ctx: &mut SystemContext<'_>) -> anyhow::Result<()> {
        let dt = ctx.dt();
        let world = ctx.world();
        let mut expired = Vec::new();
        for entity in world.matching_entities(self.filter).to_vec() {
            let lifetime = world.get_component_mut::<Lifetime>(entity)?;
            lifetime.remaining -= dt;
            if lifetime.remaining <= 0.0 {
                expired.push(entity);
            }
        }
        if expired.is_empty() {
            return Ok(());
        }

        for entity in &expired {
            world.despawn(*entity)?;
        }
        // Removals are not observed by filters.
        world.refresh_filters();
        debug!(expired = expired.len(), "particles expired");
        Ok(())
    }
}
