use std::path::PathBuf;

use clap::{Parser, Subcommand};

use admission_rag::commands::{
    add_document, ask, build_index, list_documents, remove_document, show_config, show_status,
};

#[derive(Parser)]
#[command(name = "admission-rag")]
#[command(about = "A retrieval-based question answering system for university admission documents")]
#[command(version)]
struct Cli {
    /// Base directory for corpus, index, and configuration
    #[arg(long, global = true)]
    base_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rebuild the vector index from the PDF corpus
    Build,
    /// Answer an admission question from the indexed documents
    Ask {
        /// The question to answer
        question: String,
    },
    /// Add a PDF to the corpus and rebuild the index
    Add {
        /// Path to the PDF file to add
        path: PathBuf,
    },
    /// Remove a PDF from the corpus and rebuild the index
    Remove {
        /// Corpus filename to remove
        filename: String,
    },
    /// List the PDFs currently in the corpus
    List,
    /// Show index and corpus status
    Status,
    /// Show the active configuration
    Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Build => {
            build_index(cli.base_dir).await?;
        }
        Commands::Ask { question } => {
            ask(question, cli.base_dir).await?;
        }
        Commands::Add { path } => {
            add_document(path, cli.base_dir).await?;
        }
        Commands::Remove { filename } => {
            remove_document(filename, cli.base_dir).await?;
        }
        Commands::List => {
            list_documents(cli.base_dir)?;
        }
        Commands::Status => {
            show_status(cli.base_dir)?;
        }
        Commands::Config => {
            show_config(cli.base_dir)?;
        }
    }

    Ok(())
}
