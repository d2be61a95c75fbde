use anyhow::Result;
use clap::{Parser, Subcommand};
use college_rag::commands::{add_image, add_pdf_dir, add_text_dir, ask, serve_http, show_status};
use college_rag::config::{Config, run_interactive_config, show_config};
use college_rag::rag::Requester;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "college-rag")]
#[command(about = "A retrieval-augmented question answering assistant for college information")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Configure the embedding server and completion API
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,
    },
    /// Add every .txt file in a directory to the knowledge base
    AddText {
        /// Directory containing text files
        dir: PathBuf,
    },
    /// Add every .pdf file in a directory to the knowledge base
    AddPdf {
        /// Directory containing PDF files
        dir: PathBuf,
        /// Document type recorded with each chunk, e.g. "syllabus" or "question_paper"
        #[arg(long, default_value = "general")]
        doc_type: String,
    },
    /// Add a described image to the knowledge base
    AddImage {
        /// Path of the image
        path: String,
        /// What the image shows
        #[arg(long)]
        description: String,
        /// Optional category, e.g. "campus"
        #[arg(long)]
        category: Option<String>,
    },
    /// Ask a question
    Ask {
        question: String,
        /// Role of the person asking, e.g. "student" or "faculty"
        #[arg(long)]
        role: Option<String>,
        /// Name of the person asking
        #[arg(long)]
        user_name: Option<String>,
        /// Number of chunks to retrieve
        #[arg(long, value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(1..))]
        top_k: Option<usize>,
    },
    /// Show the knowledge base and service status
    Status,
    /// Start the HTTP API
    Serve {
        /// Port to listen on, overriding the configuration
        #[arg(long)]
        port: Option<u16>,
    },
}

fn requester(role: Option<String>, user_name: Option<String>) -> Option<Requester> {
    match (role, user_name) {
        (None, None) => None,
        (role, user_name) => Some(Requester::new(
            role.unwrap_or_else(|| "student".to_string()),
            user_name.unwrap_or_else(|| "Student".to_string()),
        )),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    if let Commands::Config { show } = cli.command {
        let config_dir = Config::default_dir()?;
        if show {
            show_config(&Config::load(&config_dir)?);
        } else {
            run_interactive_config(&config_dir)?;
        }
        return Ok(());
    }

    let config = Config::load_default()?;

    match cli.command {
        Commands::Config { .. } => {}
        Commands::AddText { dir } => {
            tokio::task::block_in_place(|| add_text_dir(&config, &dir))?;
        }
        Commands::AddPdf { dir, doc_type } => {
            tokio::task::block_in_place(|| add_pdf_dir(&config, &dir, &doc_type))?;
        }
        Commands::AddImage {
            path,
            description,
            category,
        } => {
            tokio::task::block_in_place(|| add_image(&config, &path, &description, category))?;
        }
        Commands::Ask {
            question,
            role,
            user_name,
            top_k,
        } => {
            let requester = requester(role, user_name);
            tokio::task::block_in_place(|| ask(&config, &question, requester.as_ref(), top_k))?;
        }
        Commands::Status => {
            tokio::task::block_in_place(|| show_status(&config))?;
        }
        Commands::Serve { port } => {
            serve_http(&config, port).await?;
        }
    }

    Ok(())
}
