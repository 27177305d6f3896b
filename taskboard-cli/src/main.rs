mod config;
mod lookup;
mod render;

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Parser, Subcommand};

use taskboard_core::storage::load_or_seed;
use taskboard_core::storage::local::FileStore;
use taskboard_core::{BoardEngine, BoardSession, FilterStatus};

#[derive(Parser, Debug)]
#[command(name = "taskboard", version, about = "Kanban-style task board")]
struct Cli {
    /// Config file (default: <config dir>/taskboard/config.json)
    #[arg(long, env = "TASKBOARD_CONFIG")]
    config: Option<PathBuf>,

    /// Directory holding the board file, overrides the config
    #[arg(long, env = "TASKBOARD_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the board
    Show {
        /// Free-text search, substring or fuzzy
        #[arg(short, long, default_value = "")]
        query: String,
        /// all, completed or incomplete
        #[arg(short, long, default_value = "all")]
        status: FilterStatus,
        #[arg(long)]
        json: bool,
    },
    AddTask { column: String, text: String },
    EditTask { task: String, text: String },
    Toggle { task: String },
    DeleteTask { task: String },
    AddColumn { title: String },
    EditColumn { column: String, title: String },
    DeleteColumn { column: String },
    /// Move a task to another column (or another position in its own)
    Move {
        task: String,
        column: String,
        #[arg(long)]
        index: Option<usize>,
    },
    ReorderTask { column: String, from: usize, to: usize },
    ReorderColumn { from: usize, to: usize },
    /// Mark tasks completed (or incomplete with --undo)
    BulkComplete {
        #[arg(long)]
        undo: bool,
        #[arg(required = true)]
        tasks: Vec<String>,
    },
    BulkDelete {
        #[arg(required = true)]
        tasks: Vec<String>,
    },
    BulkMove {
        column: String,
        #[arg(required = true)]
        tasks: Vec<String>,
    },
    /// Replace the board with the sample board
    Reset,
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config_path = cli.config.clone().unwrap_or_else(config::default_config_path);
    let mut config = config::load_config(&config_path);
    if let Some(dir) = cli.data_dir.clone() {
        config.data_dir = dir;
    }

    std::fs::create_dir_all(&config.data_dir)
        .with_context(|| format!("creating data dir {}", config.data_dir.display()))?;
    let store = FileStore::new(&config.data_dir, &config.slot);
    log::info!("Using board file {}", store.path().display());

    let mut session = open_session(store);
    session.set_fuzzy_threshold(config.fuzzy_threshold);

    run(&mut session, cli.command)
}

/// Session over the stored board with random ids and the system clock.
fn open_session(store: FileStore) -> BoardSession<FileStore> {
    let doc = load_or_seed(&store);
    BoardSession::with_engine(store, BoardEngine::with_defaults(doc))
}

fn run(session: &mut BoardSession<FileStore>, command: Command) -> Result<()> {
    let doc = session.snapshot();
    let applied = match command {
        Command::Show {
            query,
            status,
            json,
        } => {
            session.set_search_query(&query);
            session.set_filter_status(status);
            let view = render::board_view(session);
            if json {
                println!("{}", serde_json::to_string_pretty(&view)?);
            } else {
                print!("{}", render::render_text(&view));
            }
            return Ok(());
        }
        Command::AddTask { column, text } => {
            let id = session.add_task(&lookup::column_id(&doc, &column), &text);
            if let Some(id) = &id {
                println!("Added task {}", id);
            }
            id.is_some()
        }
        Command::EditTask { task, text } => session.edit_task(&lookup::task_id(&doc, &task), &text),
        Command::Toggle { task } => session.toggle_task(&lookup::task_id(&doc, &task)),
        Command::DeleteTask { task } => session.delete_task(&lookup::task_id(&doc, &task)),
        Command::AddColumn { title } => {
            let id = session.add_column(&title);
            if let Some(id) = &id {
                println!("Added column {}", id);
            }
            id.is_some()
        }
        Command::EditColumn { column, title } => {
            session.edit_column(&lookup::column_id(&doc, &column), &title)
        }
        Command::DeleteColumn { column } => session.delete_column(&lookup::column_id(&doc, &column)),
        Command::Move {
            task,
            column,
            index,
        } => session.move_task(
            &lookup::task_id(&doc, &task),
            &lookup::column_id(&doc, &column),
            index,
        ),
        Command::ReorderTask { column, from, to } => {
            session.reorder_task(&lookup::column_id(&doc, &column), from, to)
        }
        Command::ReorderColumn { from, to } => session.reorder_column(from, to),
        Command::BulkComplete { undo, tasks } => {
            session.bulk_set_completed(&lookup::task_ids(&doc, &tasks), !undo) > 0
        }
        Command::BulkDelete { tasks } => session.bulk_delete(&lookup::task_ids(&doc, &tasks)) > 0,
        Command::BulkMove { column, tasks } => {
            session.bulk_move(&lookup::task_ids(&doc, &tasks), &lookup::column_id(&doc, &column)) > 0
        }
        Command::Reset => {
            session.reset();
            true
        }
    };

    if !applied {
        bail!("nothing changed: unknown id or blank text");
    }
    print!("{}", render::render_text(&render::board_view(session)));
    Ok(())
}
