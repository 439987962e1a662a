use anyhow::{bail, Result};
use clap::Parser;
use log::info;
use multiworld::generate::{GenerationOutput, Generator};
use multiworld::multiworld::seeded_rng;
use multiworld::player_options::load_players;
use multiworld::worlds::default_registry;
use multiworld::GenerationError;
use rand::{RngCore, SeedableRng};
use std::path::PathBuf;

#[derive(Parser)]
struct Args {
    /// Player options files, or directories of them.
    #[arg(long, required = true, num_args = 1..)]
    players: Vec<PathBuf>,

    #[arg(long)]
    seed: Option<u64>,

    #[arg(long)]
    output: Option<PathBuf>,

    #[arg(long)]
    spoiler: Option<PathBuf>,

    /// Attempts before giving up; each retry draws a fresh seed.
    #[arg(
        long,
        default_value_t = 1,
        value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(1..)
    )]
    max_attempts: usize,
}

fn get_generation(args: &Args, generator: &Generator) -> Result<GenerationOutput> {
    let root_seed = match args.seed {
        Some(s) => s,
        None => rand::rngs::StdRng::from_entropy().next_u64(),
    };
    let mut rng = seeded_rng(root_seed);
    for attempt_num in 1..=args.max_attempts {
        // The first attempt uses the given seed itself, so that a seed reproduces alone.
        let seed = if attempt_num == 1 {
            root_seed
        } else {
            rng.next_u64()
        };
        info!(
            "Attempt {attempt_num}/{}: seed={seed}",
            args.max_attempts
        );
        match generator.generate(attempt_num, seed) {
            Ok(output) => return Ok(output),
            Err(e) => {
                // Only fill failures depend on the seed; anything else fails every attempt.
                let retryable = matches!(
                    e.downcast_ref::<GenerationError>(),
                    Some(GenerationError::FillInfeasible { .. })
                        | Some(GenerationError::Unbeatable { .. })
                );
                if !retryable {
                    return Err(e);
                }
                info!(
                    "Attempt {attempt_num}/{}: Generation failed: {e}",
                    args.max_attempts
                );
            }
        }
    }
    bail!("Exhausted generation attempts");
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let args = Args::parse();
    let registry = default_registry()?;
    let settings = load_players(&args.players)?;
    if settings.is_empty() {
        bail!("No players found");
    }
    info!("Loaded {} players", settings.len());
    let generator = Generator::new(&registry, &settings);

    let output = get_generation(&args, &generator)?;

    if let Some(output_path) = &args.output {
        println!("Writing generation output to {}", output_path.display());
        let output_str = serde_json::to_string_pretty(&output)?;
        std::fs::write(output_path, output_str)?;
    }

    if let Some(spoiler_path) = &args.spoiler {
        println!("Writing spoiler log to {}", spoiler_path.display());
        let spoiler_str = serde_json::to_string_pretty(&output.spoiler)?;
        std::fs::write(spoiler_path, spoiler_str)?;
    }

    Ok(())
}
