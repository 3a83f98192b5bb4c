// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Three subcommands: `train`, `encode` and `embed`.
//
// Each Args struct converts into its application-layer request
// with `From`, so Layer 2 never sees clap types.
//
// Reference: Rust Book §12 (Building a CLI Program)

use std::path::PathBuf;

use clap::{Args, Subcommand};

use crate::application::{
    embed_use_case::EmbedRequest,
    encode_use_case::EncodeRequest,
    train_use_case::{TrainConfig, ENCODINGS_FILE},
};
use crate::domain::embedding_model::EmbeddingModel;
use crate::infra::checkpoint::DEFAULT_DIR;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Train the autoencoder on a numeric feature CSV
    Train(TrainArgs),

    /// Encode a feature CSV with a trained encoder
    Encode(EncodeArgs),

    /// Embed a piece of text with bow, tf-idf or bert
    Embed(EmbedArgs),
}

#[derive(Args, Debug)]
pub struct TrainArgs {
    /// Numeric CSV, one record per row (header optional)
    #[arg(long, default_value = "data/features.csv")]
    pub features: String,

    /// Where checkpoints, train_config.json, metrics.csv and
    /// encodings.csv are written
    #[arg(long, default_value = DEFAULT_DIR)]
    pub checkpoint_dir: String,

    /// Number of full passes over the training rows
    #[arg(long, default_value_t = 10)]
    pub epochs: usize,

    /// Score the validation rows every N batches (0 disables)
    #[arg(long, default_value_t = 100)]
    pub report_every: usize,

    /// Min-max scale every column into [0, 1] before training
    #[arg(long)]
    pub scale: bool,

    /// Width of the hidden layer on both sides of the code
    #[arg(long, default_value_t = 1000)]
    pub intermediate_size: usize,

    /// Length of each encoding
    #[arg(long, default_value_t = 100)]
    pub encoding_size: usize,

    /// Disable BatchNorm after each linear layer
    #[arg(long)]
    pub no_normalization: bool,

    /// Dropout probability while training
    #[arg(long, default_value_t = 0.2)]
    pub dropout: f64,

    /// Share of rows held out for validation, in [0, 1)
    #[arg(long, default_value_t = 0.2)]
    pub validation_fraction: f64,

    /// Seeds the split, the weight init and the batch order
    #[arg(long, default_value_t = 0)]
    pub seed: u64,

    /// Adam learning rate
    #[arg(long, default_value_t = 1e-3)]
    pub lr: f64,

    /// Adam L2 weight decay
    #[arg(long, default_value_t = 1e-8)]
    pub weight_decay: f64,

    #[arg(long, default_value_t = 64)]
    pub batch_size: usize,

    /// Background threads assembling batches (0 = none)
    #[arg(long, default_value_t = 0)]
    pub num_workers: usize,
}

impl From<TrainArgs> for TrainConfig {
    fn from(a: TrainArgs) -> Self {
        TrainConfig {
            features_path:       a.features,
            checkpoint_dir:      a.checkpoint_dir,
            epochs:              a.epochs,
            report_every:        a.report_every,
            scale:               a.scale,
            intermediate_size:   a.intermediate_size,
            encoding_size:       a.encoding_size,
            use_normalization:   !a.no_normalization,
            dropout:             a.dropout,
            validation_fraction: a.validation_fraction,
            seed:                a.seed,
            lr:                  a.lr,
            weight_decay:        a.weight_decay,
            batch_size:          a.batch_size,
            num_workers:         a.num_workers,
            input_size:          None,
            scaling:             None,
        }
    }
}

#[derive(Args, Debug)]
pub struct EncodeArgs {
    /// Numeric CSV with the same columns the encoder was trained on
    #[arg(long)]
    pub features: PathBuf,

    /// Directory written by `train`
    #[arg(long, default_value = DEFAULT_DIR)]
    pub checkpoint_dir: PathBuf,

    /// Output CSV (defaults to <checkpoint-dir>/encodings.csv)
    #[arg(long)]
    pub output: Option<PathBuf>,
}

impl From<EncodeArgs> for EncodeRequest {
    fn from(a: EncodeArgs) -> Self {
        let output = a.output.unwrap_or_else(|| a.checkpoint_dir.join(ENCODINGS_FILE));
        EncodeRequest {
            features_path:  a.features,
            checkpoint_dir: a.checkpoint_dir,
            output_path:    Some(output),
        }
    }
}

#[derive(Args, Debug)]
pub struct EmbedArgs {
    /// bow, tf-idf or bert
    #[arg(long, default_value = "bow")]
    pub model: EmbeddingModel,

    /// The text to embed
    #[arg(long)]
    pub text: String,

    /// One document per line; vocabulary / idf / tokenizer source
    #[arg(long)]
    pub corpus: PathBuf,

    /// Holds tokenizer.json for bert (built from the corpus if absent)
    #[arg(long, default_value = DEFAULT_DIR)]
    pub tokenizer_dir: PathBuf,

    /// Burn record with contextual encoder weights
    #[arg(long)]
    pub weights: Option<PathBuf>,

    #[arg(long, default_value_t = 30522)]
    pub vocab_size: usize,

    #[arg(long, default_value_t = 256)]
    pub d_model: usize,

    #[arg(long, default_value_t = 4)]
    pub num_heads: usize,

    #[arg(long, default_value_t = 2)]
    pub num_layers: usize,

    #[arg(long, default_value_t = 128)]
    pub max_seq_len: usize,
}

impl From<EmbedArgs> for EmbedRequest {
    fn from(a: EmbedArgs) -> Self {
        EmbedRequest {
            model:         a.model,
            text:          a.text,
            corpus_path:   a.corpus,
            tokenizer_dir: a.tokenizer_dir,
            weights:       a.weights,
            vocab_size:    a.vocab_size,
            d_model:       a.d_model,
            num_heads:     a.num_heads,
            num_layers:    a.num_layers,
            max_seq_len:   a.max_seq_len,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;
    use clap::Parser;

    #[test]
    fn test_train_flags_map_to_config() {
        let cli = Cli::try_parse_from([
            "catalog-embed", "train", "--features", "f.csv", "--epochs", "3",
            "--no-normalization", "--scale",
        ])
        .unwrap();
        let Commands::Train(args) = cli.command else { panic!("expected train") };

        let cfg: TrainConfig = args.into();
        assert_eq!(cfg.features_path, "f.csv");
        assert_eq!(cfg.epochs, 3);
        assert!(!cfg.use_normalization);
        assert!(cfg.scale);
        assert_eq!(cfg.encoding_size, 100);
    }

    #[test]
    fn test_embed_model_parsing() {
        let cli = Cli::try_parse_from([
            "catalog-embed", "embed", "--model", "tf-idf", "--text", "x", "--corpus", "c.txt",
        ])
        .unwrap();
        let Commands::Embed(args) = cli.command else { panic!("expected embed") };
        assert_eq!(args.model, EmbeddingModel::TfIdf);

        assert!(Cli::try_parse_from([
            "catalog-embed", "embed", "--model", "word2vec", "--text", "x", "--corpus", "c.txt",
        ])
        .is_err());
    }

    #[test]
    fn test_encode_output_defaults_into_checkpoint_dir() {
        let cli = Cli::try_parse_from(["catalog-embed", "encode", "--features", "f.csv"]).unwrap();
        let Commands::Encode(args) = cli.command else { panic!("expected encode") };
        let req: EncodeRequest = args.into();
        assert_eq!(req.output_path, Some(PathBuf::from("checkpoint").join("encodings.csv")));
    }
}
