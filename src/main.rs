//! Exam Score - prediction service and one-shot CLI
//!
//! `serve` loads the artifacts once and answers `POST /predict`;
//! `predict` scores a single JSON profile and prints the result.

use clap::Parser;
use std::error::Error;
use std::fs;
use std::io::{self, Read};
use std::path::Path;
use std::sync::Arc;
use tracing::error;

use exam_score::config::{Args, Command};
use exam_score::http::{self, ApiState};
use exam_score::{logging, Artifacts, InferencePipeline, StudentProfile};

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    logging::init();

    let artifacts = match Artifacts::load(&args.artifact_paths()) {
        Ok(artifacts) => artifacts,
        Err(err) => {
            error!(error = %err, "failed to load model artifacts");
            return Err(err.into());
        }
    };
    let pipeline = InferencePipeline::new(Arc::new(artifacts));

    match args.command {
        Command::Serve { addr, cors_origin } => {
            let runtime = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()?;
            let state = ApiState { pipeline };
            runtime.block_on(http::serve(addr, state, http::cors_layer(&cors_origin)))
        }
        Command::Predict { input } => {
            let profile = read_profile(input.as_deref())?;
            let result = pipeline.predict(&profile)?;
            println!("{}", serde_json::to_string(&result)?);
            Ok(())
        }
    }
}

/// Read a profile from a file, or stdin for `-` / no path
fn read_profile(input: Option<&Path>) -> Result<StudentProfile, Box<dyn Error>> {
    let text = match input {
        Some(path) if path != Path::new("-") => fs::read_to_string(path)?,
        _ => {
            let mut text = String::new();
            io::stdin().read_to_string(&mut text)?;
            text
        }
    };

    Ok(serde_json::from_str(&text)?)
}
