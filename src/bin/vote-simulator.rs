//! Vote Simulator CLI Tool
//!
//! Seeds a roster of characters with hidden strengths, runs votes through the
//! real coordinator against an in-memory store and prints the leaderboard, so
//! rating convergence can be eyeballed without the HTTP service.
//!
//! Usage:
//!   cargo run --bin vote-simulator -- --characters 8 --votes 2000 --seed 42
//!   cargo run --bin vote-simulator -- --draw-rate 0.1

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{anyhow, Result};
use clap::Parser;
use faceoff::rating::expected_score;
use faceoff::types::{CharacterId, CharacterSubmission, Matchup};
use faceoff::voting::pick_matchup;
use faceoff::{InMemoryArenaStore, VoteCoordinator};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

#[derive(Parser)]
#[command(name = "vote-simulator")]
#[command(about = "Simulate pairwise votes and print the resulting leaderboard")]
struct Cli {
    /// Number of characters to register
    #[arg(short, long, default_value = "8")]
    characters: usize,

    /// Number of votes to cast
    #[arg(short, long, default_value = "1000")]
    votes: usize,

    /// Probability that a vote is a draw
    #[arg(short, long, default_value = "0.05")]
    draw_rate: f64,

    /// RNG seed for reproducible runs
    #[arg(short, long)]
    seed: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .init();

    let cli = Cli::parse();

    if cli.characters < 2 {
        return Err(anyhow!("At least two characters are needed for a matchup"));
    }
    if !(0.0..=1.0).contains(&cli.draw_rate) {
        return Err(anyhow!("Draw rate must be between 0 and 1"));
    }

    let mut rng = match cli.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_rng(&mut rand::rng()),
    };

    let coordinator = VoteCoordinator::new(Arc::new(InMemoryArenaStore::new()));

    // Hidden strengths decide who wins; the ratings should learn them
    let mut strengths: HashMap<CharacterId, f64> = HashMap::new();
    for i in 0..cli.characters {
        let character = coordinator
            .register_character(CharacterSubmission {
                name: format!("Contender {:02}", i + 1),
                image_url: None,
            })
            .await?;
        strengths.insert(character.id, rng.random_range(1200.0..1800.0));
    }

    println!(
        "🧪 Simulating {} votes across {} characters (draw rate {:.2})",
        cli.votes, cli.characters, cli.draw_rate
    );

    let mut draws = 0usize;
    for _ in 0..cli.votes {
        let characters = coordinator.leaderboard().await?;
        let (first, second) = match pick_matchup(characters, &mut rng) {
            Matchup::Available { first, second } => (first, second),
            Matchup::Unavailable => return Err(anyhow!("Matchup unavailable")),
        };

        let winner_id = if rng.random_bool(cli.draw_rate) {
            draws += 1;
            None
        } else {
            let strength_first = strengths.get(&first.id).copied().unwrap_or_default();
            let strength_second = strengths.get(&second.id).copied().unwrap_or_default();
            if rng.random::<f64>() < expected_score(strength_first, strength_second) {
                Some(first.id)
            } else {
                Some(second.id)
            }
        };

        coordinator
            .process_vote(first.id, second.id, winner_id)
            .await?;
    }

    let leaderboard = coordinator.leaderboard().await?;
    let recorded = coordinator.store().count_votes().await?;

    println!("\n📊 Leaderboard after {} votes ({} draws):", recorded, draws);
    println!(
        "  {:<4} {:<14} {:>9} {:>9} {:>6} {:>6} {:>6}",
        "#", "Name", "Rating", "Hidden", "W", "L", "D"
    );
    for (rank, character) in leaderboard.iter().enumerate() {
        println!(
            "  {:<4} {:<14} {:>9.2} {:>9.2} {:>6} {:>6} {:>6}",
            rank + 1,
            character.name,
            character.rating,
            strengths.get(&character.id).copied().unwrap_or_default(),
            character.wins,
            character.losses,
            character.draws
        );
    }

    Ok(())
}
