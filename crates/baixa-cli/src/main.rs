mod commands;
mod output;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "baixa",
    version,
    about = "Extract obligation, CNPJ and period from PDFs and complete pending tasks"
)]
struct Cli {
    /// SQLite database holding layouts, clients and tasks
    #[arg(long, global = true, value_name = "FILE", default_value = "baixa.db")]
    db: PathBuf,

    /// Engine configuration JSON (default: built-in)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Output format: table (default) or json
    #[arg(short, long, global = true, default_value = "table")]
    output: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Preview one layout against a document (no changes are saved)
    TestLayout {
        /// Layout id
        layout_id: i64,

        /// PDF or pre-extracted text file
        input_file: PathBuf,
    },
    /// Extract a document and complete the matching pending task
    AutoComplete {
        #[arg(short, long)]
        tenant: i64,

        /// PDF or pre-extracted text file
        input_file: PathBuf,
    },
    /// Run auto-complete over several documents, one at a time
    AutoCompleteBatch {
        #[arg(short, long)]
        tenant: i64,

        /// PDF or pre-extracted text files, processed in order
        #[arg(required = true)]
        input_files: Vec<PathBuf>,
    },
    /// Recompute and save a layout's status from its reference document
    RecomputeStatus {
        /// Layout id
        layout_id: i64,
    },
    /// Print the tokenized lines of a document
    Tokenize {
        /// PDF or pre-extracted text file
        input_file: PathBuf,
    },
    /// Manage layouts
    Layouts {
        #[command(subcommand)]
        action: LayoutsAction,
    },
}

#[derive(Subcommand)]
enum LayoutsAction {
    /// Import layout definition file(s) for a tenant
    Import {
        #[arg(short, long)]
        tenant: i64,

        /// Path(s) to JSON layout definitions
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// List a tenant's layouts
    List {
        #[arg(short, long)]
        tenant: i64,
    },
    /// Validate a layout definition file
    Validate {
        /// Path to JSON layout definition
        file: PathBuf,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    let result = commands::Context::load(cli.db, cli.config.as_deref(), cli.output).and_then(|ctx| {
        match cli.command {
            Commands::TestLayout {
                layout_id,
                input_file,
            } => commands::pipeline::test_layout(&ctx, layout_id, &input_file),
            Commands::AutoComplete { tenant, input_file } => {
                commands::pipeline::auto_complete(&ctx, tenant, &input_file)
            }
            Commands::AutoCompleteBatch {
                tenant,
                input_files,
            } => commands::pipeline::auto_complete_batch(&ctx, tenant, &input_files),
            Commands::RecomputeStatus { layout_id } => {
                commands::pipeline::recompute_status(&ctx, layout_id)
            }
            Commands::Tokenize { input_file } => commands::tokenize::run(&ctx, &input_file),
            Commands::Layouts { action } => match action {
                LayoutsAction::Import { tenant, files } => {
                    commands::layouts::import(&ctx, tenant, &files)
                }
                LayoutsAction::List { tenant } => commands::layouts::list(&ctx, tenant),
                LayoutsAction::Validate { file } => commands::layouts::validate(&file),
            },
        }
    });

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
