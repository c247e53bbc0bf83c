use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tc_app::{AppResult, ModelPreference, Session, SessionConfig};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "tc-cli")]
#[command(about = "TankCal CLI - dipstick calibration for horizontal cylindrical tanks", long_about = None)]
struct Cli {
    /// Registry document (defaults to tanks_config.json)
    #[arg(long, global = true)]
    store: Option<PathBuf>,
    /// Session configuration YAML
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Always use the interpolation model
    #[arg(long, global = true)]
    interp_only: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analytic volume for a dipstick height
    Volume {
        /// Height in inches
        #[arg(allow_negative_numbers = true)]
        height: f64,
        /// Diameter in inches (defaults to the current tank)
        #[arg(short, long)]
        diameter: Option<f64>,
        /// Length in inches (defaults to the current tank)
        #[arg(short, long)]
        length: Option<f64>,
    },
    /// Calibrated volume from a tank's model
    Predict {
        /// Height in inches
        #[arg(allow_negative_numbers = true)]
        height: f64,
        /// Tank ID (defaults to the current tank)
        #[arg(short, long)]
        tank: Option<String>,
    },
    /// Manage tanks
    #[command(subcommand)]
    Tanks(TankCommands),
    /// Add measured calibration points
    Calibrate {
        /// Measured heights in inches
        #[arg(long = "height", required = true)]
        heights: Vec<f64>,
        /// Measured volumes in gallons, one per height
        #[arg(long = "volume", required = true)]
        volumes: Vec<f64>,
        /// Tank ID (defaults to the current tank)
        #[arg(short, long)]
        tank: Option<String>,
    },
    /// Merge calibration points from a Pulgadas,Galones CSV file
    Import {
        /// Path to the CSV file
        path: PathBuf,
        /// Tank ID (defaults to the current tank)
        #[arg(short, long)]
        tank: Option<String>,
    },
    /// Write the current tank's dataset as CSV
    Export {
        /// Output CSV file path
        path: PathBuf,
    },
    /// Replace a tank's dataset with analytic samples
    Reset {
        /// Tank ID (defaults to the current tank)
        #[arg(short, long)]
        tank: Option<String>,
        /// Number of samples over [0, D]
        #[arg(long)]
        samples: Option<usize>,
    },
    /// Fit error of a tank's model against its dataset
    Evaluate {
        /// Tank ID (defaults to the current tank)
        #[arg(short, long)]
        tank: Option<String>,
    },
    /// Save the registry to a JSON file
    Save {
        /// Output JSON path
        path: PathBuf,
    },
    /// Load the registry from a JSON file
    Load {
        /// Input JSON path
        path: PathBuf,
    },
}

#[derive(Subcommand)]
enum TankCommands {
    /// List tanks
    List,
    /// Show a tank (defaults to the current tank)
    Show {
        /// Tank ID
        id: Option<String>,
    },
    /// Create a tank seeded with analytic samples
    Create {
        /// Display name
        name: String,
        /// Diameter in inches
        diameter: f64,
        /// Length in inches
        length: f64,
        /// Explicit tank ID
        #[arg(long)]
        id: Option<String>,
    },
    /// Make a tank current
    Select {
        /// Tank ID
        id: String,
    },
    /// Delete a tank
    Delete {
        /// Tank ID
        id: String,
    },
}

fn main() -> AppResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();
    let mut session = Session::open(session_config(&cli)?)?;

    match cli.command {
        Commands::Volume {
            height,
            diameter,
            length,
        } => cmd_volume(&session, height, diameter, length),
        Commands::Predict { height, tank } => cmd_predict(&session, height, tank.as_deref()),
        Commands::Tanks(tank_cmd) => match tank_cmd {
            TankCommands::List => cmd_tanks_list(&session),
            TankCommands::Show { id } => cmd_tanks_show(&session, id.as_deref()),
            TankCommands::Create {
                name,
                diameter,
                length,
                id,
            } => cmd_tanks_create(&mut session, &name, diameter, length, id.as_deref()),
            TankCommands::Select { id } => cmd_tanks_select(&mut session, &id),
            TankCommands::Delete { id } => {
                session.delete_tank(&id)?;
                println!("✓ Deleted tank {}", id);
                Ok(())
            }
        },
        Commands::Calibrate {
            heights,
            volumes,
            tank,
        } => cmd_calibrate(&mut session, heights, volumes, tank.as_deref()),
        Commands::Import { path, tank } => {
            let merged = session.import_csv(&path, tank.as_deref())?;
            println!("✓ Merged {} points from {}", merged, path.display());
            Ok(())
        }
        Commands::Export { path } => {
            let rows = session.export_csv(&path)?;
            println!("✓ Exported {} points to {}", rows, path.display());
            Ok(())
        }
        Commands::Reset { tank, samples } => {
            session.reset_to_analytic(tank.as_deref(), samples)?;
            let point_count = session.dataset(tank.as_deref())?.len();
            println!("✓ Reset to {} analytic samples", point_count);
            Ok(())
        }
        Commands::Evaluate { tank } => cmd_evaluate(&session, tank.as_deref()),
        Commands::Save { path } => {
            session.save_config(&path)?;
            println!("✓ Saved registry to {}", path.display());
            Ok(())
        }
        Commands::Load { path } => cmd_load(&mut session, &path),
    }
}

fn session_config(cli: &Cli) -> AppResult<SessionConfig> {
    let mut config = match &cli.config {
        Some(path) => SessionConfig::load_yaml(path)?,
        None => SessionConfig::default(),
    };
    if let Some(store) = &cli.store {
        config.store_path = Some(store.clone());
    }
    if cli.interp_only {
        config.trainer.preference = ModelPreference::Interp;
    }
    debug!(?config, "resolved session config");
    Ok(config)
}

/// Selection and whole-registry loads are not autosaved by the registry.
fn persist_store(session: &Session) -> AppResult<()> {
    if let Some(path) = session.registry().autosave_path() {
        session.save_config(path)?;
    }
    Ok(())
}

fn cmd_volume(
    session: &Session,
    height: f64,
    diameter: Option<f64>,
    length: Option<f64>,
) -> AppResult<()> {
    let volume = session.compute_volume(height, diameter, length)?;
    println!("{:.3} gal", volume);
    Ok(())
}

fn cmd_predict(session: &Session, height: f64, tank: Option<&str>) -> AppResult<()> {
    let volume = session.predict_volume(height, tank)?;
    let analytic = match tank {
        Some(id) => {
            let tank = session.registry().get(id)?;
            tank.analytic_volume(height)
        }
        None => session.compute_volume(height, None, None)?,
    };
    println!("{:.3} gal", volume);
    println!("  Analytic: {:.3} gal ({:+.3})", analytic, volume - analytic);
    if tank.is_none() {
        println!("  Fill: {:.1}%", session.fill_percent(height)?);
    }
    Ok(())
}

fn cmd_tanks_list(session: &Session) -> AppResult<()> {
    let current = session.current_tank().id;
    println!("Tanks:");
    for tank in session.list_tanks() {
        let marker = if tank.id == current { "*" } else { " " };
        println!(
            "{} {} - {} (D={} in, L={} in, {} points)",
            marker, tank.id, tank.name, tank.diameter, tank.length, tank.point_count
        );
    }
    Ok(())
}

fn cmd_tanks_show(session: &Session, id: Option<&str>) -> AppResult<()> {
    let info = match id {
        Some(id) => session.registry().get(id)?.info(),
        None => session.current_tank(),
    };
    println!("Tank: {} ({})", info.id, info.name);
    println!("  Diameter: {} in", info.diameter);
    println!("  Length: {} in", info.length);
    println!("  Radius: {} in", info.radius);
    println!("  Points: {}", info.point_count);
    println!("  Model: {}", info.model_kind);
    Ok(())
}

fn cmd_tanks_create(
    session: &mut Session,
    name: &str,
    diameter: f64,
    length: f64,
    id: Option<&str>,
) -> AppResult<()> {
    let id = match id {
        Some(id) => session.create_tank_with_id(id, name, diameter, length)?,
        None => session.create_tank(name, diameter, length)?,
    };
    println!("✓ Created tank {}", id);
    Ok(())
}

fn cmd_tanks_select(session: &mut Session, id: &str) -> AppResult<()> {
    session.select_tank(id)?;
    persist_store(session)?;
    let info = session.current_tank();
    println!("✓ Selected {} - {} (D={} in, L={} in)", info.id, info.name, info.diameter, info.length);
    Ok(())
}

fn cmd_calibrate(
    session: &mut Session,
    heights: Vec<f64>,
    volumes: Vec<f64>,
    tank: Option<&str>,
) -> AppResult<()> {
    let readings = heights.clone();
    let added = session.append_calibration(heights, volumes, tank)?;
    println!("✓ Added {} calibration points", added);
    for h in readings {
        println!("  {:.3} in -> {:.3} gal", h, session.predict_volume(h, tank)?);
    }
    Ok(())
}

fn cmd_evaluate(session: &Session, tank: Option<&str>) -> AppResult<()> {
    let metrics = session.evaluate(tank)?;
    println!("Fit over {} samples:", metrics.samples);
    println!("  MAE:  {:.4} gal", metrics.mae);
    println!("  RMSE: {:.4} gal", metrics.rmse);
    Ok(())
}

fn cmd_load(session: &mut Session, path: &Path) -> AppResult<()> {
    if session.load_config(path) {
        persist_store(session)?;
        println!("✓ Loaded {} tanks from {}", session.list_tanks().len(), path.display());
    } else {
        println!("Nothing loaded from {}; registry unchanged", path.display());
    }
    Ok(())
}
