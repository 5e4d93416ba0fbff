use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use forge::{DrawCategory, EnhanceOutcome};
use idle_forge::{GameConfig, GameSession};
use items::{Grade, ItemId};
use player::EquipSlot;
use save::{LoadSource, now_millis};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "idle_forge")]
#[command(about = "Draw, enhance, inherit and synthesize gear", long_about = None)]
struct Cli {
    /// JSON config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Overrides the configured save directory
    #[arg(long, global = true)]
    save_dir: Option<PathBuf>,

    /// Overrides the configured random seed
    #[arg(long, global = true)]
    seed: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show credits, stage, stats and items
    Status,

    /// Buy gacha draws
    Draw {
        /// armor, accessory, weaponPet or potion
        category: DrawCategory,

        #[arg(long, default_value_t = 1)]
        count: u32,
    },

    /// Try to raise an item by one enhancement level
    Enhance {
        id: String,

        /// Turn a destroying failure into a plain failure
        #[arg(long)]
        protect: bool,
    },

    /// Move a source item's enhancement onto a higher-grade target
    Inherit { source: String, target: String },

    /// Merge ten inventory items of a grade into one of the next grade
    Synthesize { grade: Grade },

    Equip { id: String },

    Unequip { slot: EquipSlot },

    /// Wipe all progress
    Reset {
        #[arg(long)]
        yes: bool,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = GameConfig::load_or_default(cli.config.as_deref())?;
    if let Some(dir) = cli.save_dir {
        config.save_dir = dir;
    }
    if cli.seed.is_some() {
        config.seed = cli.seed;
    }

    let mut session = GameSession::from_config(config, now_millis()).context("Failed to open save directory")?;
    let startup = session.startup().clone();
    if startup.source == LoadSource::Default {
        println!("New game started");
    }
    if let Some(from) = startup.migrated_from {
        println!("Save upgraded from {from}");
    }
    if startup.offline_credits > 0 {
        println!("Earned {} credits while away", startup.offline_credits);
    }

    run(&mut session, cli.command)?;

    if let Err(e) = session.save_now(now_millis()) {
        eprintln!("Warning: {e}");
    }
    Ok(())
}

fn run(session: &mut GameSession, command: Commands) -> Result<()> {
    match command {
        Commands::Status => print_status(session),
        Commands::Draw { category, count } => {
            let drawn = if count == 1 {
                vec![session.draw(category)?]
            } else {
                session.draw_many(category, count)?
            };
            for item in drawn {
                println!("Drew {item}");
            }
        }
        Commands::Enhance { id, protect } => {
            let attempt = session.enhance(&ItemId::new(id), protect)?;
            match attempt.outcome {
                EnhanceOutcome::Success => println!("Success: +{} -> +{}", attempt.level_before, attempt.level_after),
                EnhanceOutcome::PartialSuccess => println!("Near miss, the item survived"),
                EnhanceOutcome::Failure => println!("Failed, item unchanged"),
                EnhanceOutcome::Destruction => println!("Failed, the item was destroyed"),
            }
            println!("Paid {} credits", attempt.cost_paid);
        }
        Commands::Inherit { source, target } => {
            let outcome = session.inherit(&ItemId::new(source), &ItemId::new(target))?;
            match outcome.inherited_item {
                Some(item) => println!("Inherited: {item}"),
                None => println!("Inheritance failed ({:.0}% chance); source consumed", outcome.success_rate * 100.0),
            }
        }
        Commands::Synthesize { grade } => {
            let outcome = session.synthesize(grade)?;
            println!("Synthesized {}", outcome.synthesized_item);
        }
        Commands::Equip { id } => {
            let slot = session.equip(&ItemId::new(id))?;
            println!("Equipped into {slot}");
        }
        Commands::Unequip { slot } => {
            let id = session.unequip(slot)?;
            println!("Moved {id} to the inventory");
        }
        Commands::Reset { yes } => {
            if !yes {
                bail!("reset wipes all progress; pass --yes to confirm");
            }
            session.reset(now_millis())?;
            println!("Progress reset");
        }
    }
    Ok(())
}

fn print_status(session: &GameSession) {
    let player = session.player();
    let stats = &player.player_stats;
    println!("Credits: {} (+{}/s)", player.credits, player.income_per_second());
    println!("Stage: {}", player.current_stage);
    println!(
        "Attack {}  Defense {}  Penetration {}  Extra attack {}  Crit {}  Crit damage {}",
        stats.attack,
        stats.defense,
        stats.defense_penetration,
        stats.additional_attack_chance,
        stats.critical_chance,
        stats.critical_damage_multiplier
    );
    println!("Equipped:");
    for (slot, item) in player.equipped_items.iter() {
        println!("  {slot}: {item}");
    }
    println!("Inventory ({}):", player.inventory.len());
    for item in player.inventory.iter() {
        println!("  {item}");
    }
}
