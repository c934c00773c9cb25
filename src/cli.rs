use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::models::Stage;

#[derive(Parser)]
#[command(name = "gtsf-intake")]
#[command(about = "Record fish biometrics during a GTSF sampling collection")]
pub struct Cli {
    /// Print results as JSON where a command has structured output.
    #[arg(long, global = true, default_value_t = false)]
    pub json: bool,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Show active stages, entry count and sampling info.
    Status,
    /// Edit the sampling-session metadata.
    Info(InfoArgs),
    /// List collections available on the backend.
    Collections,
    /// Create a backend collection from the sampling info and make it active.
    Start {
        #[arg(long)]
        name: Option<String>,
    },
    /// Make a backend collection the active one.
    Select { collection_id: i64 },
    #[command(subcommand)]
    Stage(StageCommand),
    /// Record the measurement of the fish at the measurement station.
    Record(RecordArgs),
    /// Write all entries to a CSV file.
    Export {
        #[arg(long)]
        dir: Option<PathBuf>,
    },
    /// Send all entries to the backend in one request.
    Save {
        #[arg(long, default_value_t = false)]
        quiet: bool,
    },
    /// Clear entries and stages and start a new session.
    Reset,
}

#[derive(Subcommand)]
pub enum StageCommand {
    /// Put a new fish in front of the camera.
    Begin {
        #[arg(long)]
        fish_id: Option<String>,
    },
    /// Move the fish in a stage on to the next one.
    Advance { stage: Stage },
    /// Drop the fish in a stage without recording it.
    Clear { stage: Stage },
}

#[derive(Args)]
pub struct InfoArgs {
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long)]
    pub pen_id: Option<String>,
    #[arg(long)]
    pub species: Option<String>,
    #[arg(long)]
    pub location: Option<String>,
    #[arg(long)]
    pub notes: Option<String>,
}

#[derive(Args)]
pub struct RecordArgs {
    #[arg(long, default_value = "")]
    pub weight: String,
    #[arg(long, default_value = "")]
    pub length: String,
    #[arg(long, default_value = "")]
    pub width: String,
    #[arg(long, default_value = "")]
    pub breadth: String,
    #[arg(long, default_value = "")]
    pub circumference: String,
    #[arg(long)]
    pub notes: Option<String>,
    /// Also save the fish to the active collection.
    #[arg(long, default_value_t = false)]
    pub submit: bool,
}
