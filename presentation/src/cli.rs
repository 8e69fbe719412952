use application::ingest_service::IngestService;
use application::rag_service::{GeminiRagService, FALLBACK_ANSWER};
use clap::{Parser, Subcommand};
use colored::Colorize;
use infrastructure::config::Config;
use infrastructure::document_loader::load_document;
use shared::confirmation::confirm_index_reset;
use shared::types::Result;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "lawgeeks")]
#[command(about = "Ask questions about a legal agreement, grounded in indexed Indian statutes")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Answer one question about a document
    Ask {
        /// Agreement to read (.pdf, .docx or plain text)
        #[arg(short, long)]
        document: PathBuf,

        /// Copy the answer to the clipboard
        #[arg(long)]
        copy: bool,

        /// The question to ask
        #[arg(trailing_var_arg = true, required = true)]
        question: Vec<String>,
    },

    /// Ask several questions about the same document
    Chat {
        #[arg(short, long)]
        document: PathBuf,
    },

    /// Index a directory of statutes into the vector store
    Ingest {
        /// Directory holding the statute files
        #[arg(short, long, default_value = "corpus")]
        corpus: PathBuf,

        /// Drop the existing index before ingesting
        #[arg(long)]
        rebuild: bool,

        /// Do not ask before dropping the index
        #[arg(short, long)]
        yes: bool,
    },
}

pub struct CliApp {
    config: Config,
}

impl CliApp {
    /// Fails immediately when the credential is missing.
    pub fn new() -> Result<Self> {
        Ok(Self {
            config: Config::load()?,
        })
    }

    pub async fn run(&self, cli: Cli) -> Result<()> {
        match cli.command {
            Command::Ask {
                document,
                copy,
                question,
            } => self.handle_ask(&document, &question.join(" "), copy).await,
            Command::Chat { document } => self.handle_chat(&document).await,
            Command::Ingest {
                corpus,
                rebuild,
                yes,
            } => self.handle_ingest(&corpus, rebuild, yes).await,
        }
    }

    async fn handle_ask(&self, document: &Path, question: &str, copy: bool) -> Result<()> {
        let document_text = load_document(document)?;
        let service = GeminiRagService::from_config(&self.config)?;
        let answer = service.answer(&document_text, question).await;
        print_answer(&answer);
        if copy && answer != FALLBACK_ANSWER {
            copy_to_clipboard(&answer);
        }
        Ok(())
    }

    async fn handle_chat(&self, document: &Path) -> Result<()> {
        use dialoguer::{theme::ColorfulTheme, Input};

        let document_text = load_document(document)?;
        let service = GeminiRagService::from_config(&self.config)?;
        println!(
            "{} {} ({} chars). Type 'exit' to quit.",
            "Loaded".green(),
            document.display(),
            document_text.len()
        );
        loop {
            let question: String = Input::with_theme(&ColorfulTheme::default())
                .with_prompt("Question")
                .interact_text()?;
            let question = question.trim();
            if question.eq_ignore_ascii_case("exit") || question.eq_ignore_ascii_case("quit") {
                break;
            }
            if question.is_empty() {
                continue;
            }
            let answer = service.answer(&document_text, question).await;
            print_answer(&answer);
        }
        Ok(())
    }

    async fn handle_ingest(&self, corpus: &Path, rebuild: bool, yes: bool) -> Result<()> {
        if !corpus.is_dir() {
            anyhow::bail!("corpus directory '{}' does not exist", corpus.display());
        }
        let ingest = IngestService::from_config(&self.config, corpus)?;
        if rebuild {
            let storage = ingest.storage();
            if !yes && !confirm_index_reset(storage.chunk_count()?, storage.path())? {
                println!("{}", "Rebuild cancelled.".yellow());
                return Ok(());
            }
            ingest.clear_index()?;
        }
        let report = ingest.build_index().await?;
        println!(
            "{} {} files scanned, {} indexed, {} unchanged, {} skipped, {} removed, {} chunks written",
            "Indexing complete:".green(),
            report.files_scanned,
            report.files_indexed,
            report.files_unchanged,
            report.files_skipped,
            report.files_removed,
            report.chunks_written
        );
        Ok(())
    }
}

fn print_answer(answer: &str) {
    if answer == FALLBACK_ANSWER {
        println!("{}", answer.yellow());
    } else {
        println!("\n{}\n{}\n", "Answer:".green().bold(), answer);
    }
}

fn copy_to_clipboard(answer: &str) {
    match arboard::Clipboard::new().and_then(|mut clipboard| clipboard.set_text(answer)) {
        Ok(()) => println!("{}", "Answer copied to clipboard.".green()),
        Err(e) => tracing::warn!(error = %e, "could not copy answer to clipboard"),
    }
}
