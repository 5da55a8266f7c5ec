use anyhow::{Context, Result};
use citygrid_assets::{AssetCatalog, Visual};
use citygrid_common::TileCoord;
use citygrid_kernel::{City, CityConfig};
use citygrid_render::{DebugTextRenderer, Renderer};
use citygrid_scene::{ReconcileReport, SceneGraph, SceneReconciler};
use citygrid_tools::{CityInspector, EventTally};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "citygrid-cli", about = "Headless driver for the citygrid engine")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print engine version and default parameters
    Info,
    /// Grow a city and keep its scene in sync, then print the result
    Run {
        /// YAML config file; flags below override its values
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Asset catalog JSON (defaults to the built-in catalog)
        #[arg(long)]
        catalog: Option<PathBuf>,
        /// Grid side length
        #[arg(long)]
        size: Option<u32>,
        /// RNG seed
        #[arg(short, long)]
        seed: Option<u64>,
        /// Growth probability per tile per tick
        #[arg(short, long)]
        probability: Option<f64>,
        /// Number of ticks to simulate
        #[arg(short, long, default_value = "30")]
        ticks: u64,
        /// Pace ticks at the configured interval instead of running flat out
        #[arg(long)]
        realtime: bool,
        /// Demolish the building at X,Y after the run (repeatable)
        #[arg(long, value_parser = parse_coord)]
        demolish: Vec<TileCoord>,
    },
    /// Check that replaying the event log reproduces the city
    Replay {
        /// Number of ticks to simulate
        #[arg(short, long, default_value = "100")]
        ticks: u64,
        /// RNG seed for deterministic replay
        #[arg(short, long, default_value = "42")]
        seed: u64,
        /// Grid side length
        #[arg(long, default_value = "8")]
        size: u32,
    },
    /// Write the built-in asset catalog as JSON
    Catalog {
        /// Output path
        #[arg(short, long, default_value = "catalog.json")]
        out: PathBuf,
    },
}

fn parse_coord(s: &str) -> Result<TileCoord, String> {
    let (x, y) = s
        .split_once(',')
        .ok_or_else(|| format!("expected X,Y, got {s:?}"))?;
    let parse = |v: &str| {
        v.trim()
            .parse::<u32>()
            .map_err(|e| format!("bad coordinate {v:?}: {e}"))
    };
    Ok(TileCoord::new(parse(x)?, parse(y)?))
}

/// Application state: the city, its reconciled scene, and the text view.
struct AppState {
    city: City,
    reconciler: SceneReconciler<AssetCatalog>,
    scene: SceneGraph<Visual>,
    renderer: DebugTextRenderer,
    tick_rate: Duration,
    /// Events drained from the city so far.
    history: EventTally,
}

impl AppState {
    fn new(config: &CityConfig, catalog: AssetCatalog) -> Result<Self> {
        let city = City::from_config(config)?;
        let mut reconciler = SceneReconciler::new(catalog);
        let mut scene = SceneGraph::new();
        reconciler.materialize_all(&city.snapshot(), &mut scene);

        Ok(Self {
            city,
            reconciler,
            scene,
            renderer: DebugTextRenderer::new(),
            tick_rate: Duration::from_millis(config.tick_interval_ms),
            history: EventTally::default(),
        })
    }

    /// One simulation step: grow the city, then bring the scene up to date.
    fn step(&mut self) -> Result<ReconcileReport> {
        self.city.tick();
        let report = self
            .reconciler
            .sync(&self.city.snapshot(), &mut self.scene)?;
        self.drain_history();
        Ok(report)
    }

    fn demolish(&mut self, coord: TileCoord) -> Result<ReconcileReport> {
        match self.city.demolish(coord)? {
            Some(tier) => tracing::info!(%coord, %tier, "demolished"),
            None => tracing::info!(%coord, "nothing to demolish"),
        }
        let report = self
            .reconciler
            .sync(&self.city.snapshot(), &mut self.scene)?;
        self.drain_history();
        Ok(report)
    }

    fn drain_history(&mut self) {
        self.history += CityInspector::tally_events(&self.city.drain_events());
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match cli.command {
        Commands::Info => {
            let config = CityConfig::default();
            let catalog = AssetCatalog::city_defaults();
            println!("citygrid-cli v{}", env!("CARGO_PKG_VERSION"));
            println!(
                "defaults: size={} probability={} seed={} interval={}ms",
                config.size, config.growth_probability, config.seed, config.tick_interval_ms
            );
            let kinds: Vec<String> = catalog.kinds().map(|k| k.to_string()).collect();
            println!("catalog: {}", kinds.join(", "));
        }
        Commands::Run {
            config,
            catalog,
            size,
            seed,
            probability,
            ticks,
            realtime,
            demolish,
        } => {
            let mut cfg = match config {
                Some(path) => CityConfig::load(&path)
                    .with_context(|| format!("loading config {}", path.display()))?,
                None => CityConfig::default(),
            };
            if let Some(size) = size {
                cfg.size = size;
            }
            if let Some(seed) = seed {
                cfg.seed = seed;
            }
            if let Some(p) = probability {
                cfg.growth_probability = p;
            }
            let catalog = match catalog {
                Some(path) => AssetCatalog::load(&path)
                    .with_context(|| format!("loading catalog {}", path.display()))?,
                None => AssetCatalog::city_defaults(),
            };

            let mut app = AppState::new(&cfg, catalog)?;
            tracing::info!(ticks, size = cfg.size, seed = cfg.seed, "running city");

            let mut totals = ReconcileReport::default();
            let mut next_tick = Instant::now();
            for _ in 0..ticks {
                if realtime {
                    next_tick += app.tick_rate;
                    std::thread::sleep(next_tick.saturating_duration_since(Instant::now()));
                }
                let report = app.step()?;
                totals.created += report.created;
                totals.removed += report.removed;
                totals.failed += report.failed;
            }
            for coord in demolish {
                let report = app.demolish(coord)?;
                totals.removed += report.removed;
            }

            print!("{}", app.renderer.render(&app.scene));
            println!("{}", CityInspector::summary(&app.city));
            println!(
                "Events: ticks={} advances={} demolitions={}",
                app.history.ticks, app.history.advances, app.history.demolitions
            );
            println!(
                "Scene: visuals={} created={} removed={} failed={}",
                app.scene.len(),
                totals.created,
                totals.removed,
                totals.failed
            );
        }
        Commands::Replay { ticks, seed, size } => {
            println!("Deterministic replay: seed={seed}, ticks={ticks}, size={size}");

            let cfg = CityConfig {
                size,
                seed,
                ..CityConfig::default()
            };
            let mut c1 = City::from_config(&cfg)?;
            for _ in 0..ticks {
                c1.tick();
            }
            let replayed =
                City::replay(c1.events()).context("replaying event log")?;

            let mut c2 = City::from_config(&cfg)?;
            for _ in 0..ticks {
                c2.tick();
            }

            let tally = CityInspector::tally_events(c1.events());
            println!(
                "Run 1: tick={}, hash={:#x}, advances={}",
                c1.tick_count(),
                c1.state_hash(),
                tally.advances
            );
            println!(
                "Replay: tick={}, hash={:#x}",
                replayed.tick_count(),
                replayed.state_hash()
            );
            println!("Run 2 (same seed): hash={:#x}", c2.state_hash());
            let ok = c1.state_hash() == replayed.state_hash()
                && c1.state_hash() == c2.state_hash();
            println!("Match: {}", if ok { "OK" } else { "MISMATCH" });
        }
        Commands::Catalog { out } => {
            AssetCatalog::city_defaults()
                .save(&out)
                .with_context(|| format!("writing catalog {}", out.display()))?;
            println!("catalog written to {}", out.display());
        }
    }

    Ok(())
}
