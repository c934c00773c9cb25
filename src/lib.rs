mod cli;
pub mod config;
pub mod export;
pub mod models;
pub mod remote;
pub mod session;
pub mod storage;
mod utils;
pub mod validation;

use anyhow::Context;
use clap::Parser;
use serde::Serialize;

use cli::{Cli, Command, StageCommand};
use config::Config;
use models::SamplingPatch;
use remote::RemoteClient;
use session::{
    commands::{self, MeasurementInput},
    SessionStore,
};
use storage::SqlitePersistence;

/// Everything the shell needs: the session store it owns and the backend
/// client it talks through.
pub struct AppState {
    pub(crate) store: SessionStore,
    pub(crate) remote: RemoteClient,
    pub(crate) config: Config,
}

impl AppState {
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let store = match SqlitePersistence::open(config.storage_path()) {
            Ok(persistence) => SessionStore::initialize(Box::new(persistence)),
            Err(err) => {
                log::warn!("Session storage unavailable, keeping the session in memory: {err:#}");
                SessionStore::detached()
            }
        };
        let remote = RemoteClient::new(&config)?;
        Ok(Self {
            store,
            remote,
            config,
        })
    }
}

pub fn run() {
    // Initialize logging (reads RUST_LOG env var)
    let level = if config::debug_enabled() {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();

    let cli = Cli::parse();
    let result = (|| -> anyhow::Result<Result<String, String>> {
        let config = Config::load()?;
        log::debug!("Using backend at {}", config.api_base);

        let mut state = AppState::new(config)?;
        let runtime = tokio::runtime::Runtime::new().context("failed to start async runtime")?;
        Ok(runtime.block_on(dispatch(&mut state, cli)))
    })();

    match result {
        Ok(Ok(message)) => {
            if !message.is_empty() {
                println!("{message}");
            }
        }
        Ok(Err(message)) => {
            eprintln!("{message}");
            std::process::exit(1);
        }
        Err(err) => {
            log::error!("{err:#}");
            std::process::exit(2);
        }
    }
}

fn render<T: Serialize + std::fmt::Debug>(value: &T, json: bool) -> Result<String, String> {
    if json {
        serde_json::to_string_pretty(value).map_err(|e| e.to_string())
    } else {
        Ok(format!("{value:#?}"))
    }
}

async fn dispatch(state: &mut AppState, cli: Cli) -> Result<String, String> {
    let json = cli.json;
    match cli.command {
        Command::Status => render(&commands::get_overview(state), json),
        Command::Info(args) => {
            let info = commands::update_sampling_info(
                state,
                SamplingPatch {
                    name: args.name,
                    pen_id: args.pen_id,
                    species: args.species,
                    location: args.location,
                    notes: args.notes,
                },
            );
            render(&info, json)
        }
        Command::Collections => {
            let collections = commands::list_collections(state).await?;
            if json {
                return render(&collections, true);
            }
            Ok(collections
                .iter()
                .map(|c| format!("{:>5}  {}  ({} fish)", c.id, c.name, c.num_fish))
                .collect::<Vec<_>>()
                .join("\n"))
        }
        Command::Start { name } => commands::start_collection(state, name).await,
        Command::Select { collection_id } => {
            commands::select_collection(state, collection_id).await
        }
        Command::Stage(StageCommand::Begin { fish_id }) => commands::begin_intake(state, fish_id),
        Command::Stage(StageCommand::Advance { stage }) => commands::advance_stage(state, stage),
        Command::Stage(StageCommand::Clear { stage }) => commands::clear_stage(state, stage),
        Command::Record(args) => {
            let count = commands::record_measurement(
                state,
                MeasurementInput {
                    weight: args.weight,
                    length: args.length,
                    width: args.width,
                    breadth: args.breadth,
                    circumference: args.circumference,
                    notes: args.notes,
                },
            )?;
            let recorded = format!("Recorded fish #{count}");
            if !args.submit {
                return Ok(recorded);
            }
            // The entry is already kept locally, so a failed submit only
            // needs reporting.
            match commands::submit_latest(state).await {
                Ok(saved) => Ok(format!("{recorded}\n{saved}")),
                Err(err) => Err(format!("{recorded}\n{err}")),
            }
        }
        Command::Export { dir } => {
            let dir = dir.unwrap_or_else(|| state.config.export_dir());
            commands::export_entries(state, &dir)
        }
        Command::Save { quiet } => commands::save_entries(state, quiet).await,
        Command::Reset => Ok(commands::reset_session(state)),
    }
}
