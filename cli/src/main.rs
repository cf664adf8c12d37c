use std::error::Error;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use todo_core::{
    ClientConfig, Notice, NoticeLevel, ReqwestTransport, StoreError, TodoId, TodoState, TodoStore,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "todo")]
#[command(about = "Keep track of the todos stored by the todo backend", long_about = None)]
struct Cli {
    /// Backend base URL [default: $TODO_API_URL or http://localhost:3000]
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List todos
    List,

    /// Add a todo
    Add {
        #[arg(required = true, num_args = 1..)]
        description: Vec<String>,
    },

    /// Mark a todo done, or not done again
    Toggle { id: TodoId },

    /// Reword a todo
    Edit {
        id: TodoId,
        #[arg(required = true, num_args = 1..)]
        description: Vec<String>,
    },

    /// Delete a todo
    Rm { id: TodoId },
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut config = ClientConfig::from_env();
    if let Some(base_url) = cli.base_url {
        config.base_url = base_url;
    }
    let store = TodoStore::connect(&config)?;

    let outcome = run(&store, cli.command.unwrap_or(Commands::List)).await;
    if let Err(err) = &outcome {
        tracing::debug!(error = ?err, "command failed");
    }

    for notice in store.drain_notices() {
        eprintln!("{}", format_notice(&notice));
    }
    print!("{}", render(&store.snapshot()));

    Ok(if outcome.is_ok() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(store: &TodoStore<ReqwestTransport>, command: Commands) -> Result<(), StoreError> {
    store.load().await?;
    match command {
        Commands::List => {}
        Commands::Add { description } => {
            store.add(&description.join(" ")).await?;
        }
        Commands::Toggle { id } => {
            store.toggle_completed(id).await?;
        }
        Commands::Edit { id, description } => {
            store.begin_edit(id)?;
            store.set_draft(&description.join(" "))?;
            store.commit_edit().await?;
        }
        Commands::Rm { id } => store.remove(id).await?,
    }
    Ok(())
}

fn format_notice(notice: &Notice) -> String {
    match notice.level {
        NoticeLevel::Info => notice.message.clone(),
        NoticeLevel::Warning => format!("warning: {}", notice.message),
        NoticeLevel::Error => format!("error: {}", notice.message),
    }
}

fn render(state: &TodoState) -> String {
    if state.load_failed && state.items.is_empty() {
        return "todos could not be loaded\n".to_string();
    }
    let mut lines: Vec<String> = state
        .items
        .iter()
        .map(|item| {
            let mark = if item.completed { 'x' } else { ' ' };
            format!("[{mark}] {:>4}  {}", item.id.0, item.description)
        })
        .collect();
    lines.push(state.summary());
    lines.join("\n") + "\n"
}
