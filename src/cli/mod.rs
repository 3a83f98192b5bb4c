// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// Parses arguments with clap and hands each subcommand to its
// use case. Results are printed here and nowhere else.
//
//   train  — fit the autoencoder, write checkpoints + encodings
//   encode — encode a feature file with a trained encoder
//   embed  — print a text embedding as JSON
//
// Reference: Rust Book §7 (Modules), §12 (CLI programs)

pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, EmbedArgs, EncodeArgs, TrainArgs};

use crate::application::{
    embed_use_case::EmbedUseCase,
    encode_use_case::EncodeUseCase,
    train_use_case::TrainUseCase,
};

#[derive(Parser, Debug)]
#[command(
    name = "catalog-embed",
    version,
    about = "Train an autoencoder over catalog features and extract text embeddings."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Train(args)  => run_train(args),
            Commands::Encode(args) => run_encode(args),
            Commands::Embed(args)  => run_embed(args),
        }
    }
}

fn run_train(args: TrainArgs) -> Result<()> {
    tracing::info!("Training on features in: {}", args.features);

    let outcome = TrainUseCase::new(args.into()).execute()?;

    match outcome.history.last() {
        Some((train, val)) => println!("Training complete. Last losses: train={train:.6} val={val:.6}"),
        None               => println!("Training complete."),
    }
    println!("Encoded {} rows → '{}'", outcome.rows, outcome.encodings_path.display());
    Ok(())
}

fn run_encode(args: EncodeArgs) -> Result<()> {
    let request = args.into();
    let encodings = EncodeUseCase::new(request).execute()?;
    println!("Encoded {} rows into {} dimensions.", encodings.nrows(), encodings.ncols());
    Ok(())
}

fn run_embed(args: EmbedArgs) -> Result<()> {
    let vector = EmbedUseCase::new(args.into()).execute()?;
    println!("{}", serde_json::to_string(&vector)?);
    Ok(())
}
