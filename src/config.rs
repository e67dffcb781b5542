//! Command line and environment configuration

use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;

use crate::artifacts::ArtifactPaths;

#[derive(Parser, Debug)]
#[command(name = "exam-score")]
#[command(about = "Predict student exam scores from a trained model")]
pub struct Args {
    /// Directory holding label_encoders.json, scaler.json and model.bin
    #[arg(
        long,
        global = true,
        env = "EXAM_SCORE_ARTIFACTS",
        default_value = "artifacts"
    )]
    pub artifacts_dir: PathBuf,

    /// Label encoder file (overrides the one in the artifacts directory)
    #[arg(long, global = true)]
    pub encoders: Option<PathBuf>,

    /// Scaler file (overrides the one in the artifacts directory)
    #[arg(long, global = true)]
    pub scaler: Option<PathBuf>,

    /// Model bundle (overrides the one in the artifacts directory)
    #[arg(long, global = true)]
    pub model: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Command {
    /// Serve predictions over HTTP
    Serve {
        #[arg(long, env = "EXAM_SCORE_ADDR", default_value = "127.0.0.1:8000")]
        addr: SocketAddr,

        /// Allowed origins, comma-separated, or `*`
        #[arg(long, env = "EXAM_SCORE_CORS_ORIGIN", default_value = "*")]
        cors_origin: String,
    },

    /// Score one profile read as JSON from a file or stdin
    Predict {
        /// Input file; `-` or omitted reads stdin
        #[arg(long)]
        input: Option<PathBuf>,
    },
}

impl Args {
    pub fn artifact_paths(&self) -> ArtifactPaths {
        let defaults = ArtifactPaths::in_dir(&self.artifacts_dir);
        ArtifactPaths {
            encoders: self.encoders.clone().unwrap_or(defaults.encoders),
            scaler: self.scaler.clone().unwrap_or(defaults.scaler),
            model: self.model.clone().unwrap_or(defaults.model),
        }
    }
}
