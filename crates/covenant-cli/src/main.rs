mod display;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, bail};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};
use covenant_ai::{ModelClient, ModelConfig};
use covenant_core::{AnalysisKind, Contract, ContractType};
use covenant_engine::{
    AnalysisOrchestrator, DocumentVersionManager, EngineConfig, UploadPolicy, UploadRequest,
};
use covenant_store::{DuckStore, FsBlobStore, Repository};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};
use uuid::Uuid;

/// Output format for command results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

/// Contract document versioning and AI analysis.
#[derive(Parser)]
#[command(name = "covenant", version, about = "Contract document versioning and AI analysis")]
struct Cli {
    /// Directory holding the database and uploaded files
    #[arg(long, global = true, env = "COVENANT_DATA_DIR", default_value = ".covenant")]
    data_dir: PathBuf,

    /// Output format (text or json)
    #[arg(long, global = true, default_value = "text", value_enum)]
    output: OutputFormat,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage contract records
    Contract {
        #[command(subcommand)]
        command: ContractCommands,
    },

    /// Upload, list and remove contract documents
    Document {
        #[command(subcommand)]
        command: DocumentCommands,
    },

    /// Run an AI analysis of a contract document and wait for it to finish
    Analyze {
        contract_id: Uuid,
        /// Analyse this document version instead of the latest
        #[arg(long)]
        document: Option<Uuid>,
        /// Analysis focus (e.g. full-analysis, risk-assessment)
        #[arg(long, default_value = "full-analysis")]
        kind: AnalysisKind,
        /// Requesting user
        #[arg(long, default_value_t = Uuid::nil())]
        user: Uuid,
        #[command(flatten)]
        model: ModelArgs,
    },

    /// Inspect analysis jobs
    Job {
        #[command(subcommand)]
        command: JobCommands,
    },
}

#[derive(Subcommand)]
enum ContractCommands {
    /// Register a contract
    Add {
        #[arg(long)]
        name: String,
        #[arg(long)]
        party: String,
        /// Contract type (e.g. service-agreement, nda, license)
        #[arg(long = "type", default_value = "other")]
        contract_type: ContractType,
        #[arg(long)]
        value: Option<f64>,
        #[arg(long, default_value = "USD")]
        currency: String,
        /// Start date (YYYY-MM-DD)
        #[arg(long)]
        start: Option<NaiveDate>,
        /// Expiry date (YYYY-MM-DD)
        #[arg(long)]
        expiry: Option<NaiveDate>,
        #[arg(long)]
        description: Option<String>,
    },

    /// Show one contract
    Show { id: Uuid },
}

#[derive(Subcommand)]
enum DocumentCommands {
    /// Upload a file as the contract's new latest version
    Upload {
        contract_id: Uuid,
        file: PathBuf,
        /// MIME type; guessed from the file extension when omitted
        #[arg(long)]
        mime: Option<String>,
        /// Uploading user
        #[arg(long, default_value_t = Uuid::nil())]
        user: Uuid,
    },

    /// List every version of a contract's document
    List { contract_id: Uuid },

    /// Show the latest version
    Latest { contract_id: Uuid },

    /// Show one document version
    Show { id: Uuid },

    /// Write a document version's bytes to a file
    Download {
        id: Uuid,
        #[arg(short, long)]
        out: PathBuf,
    },

    /// Delete a document version
    Delete { id: Uuid },
}

#[derive(Subcommand)]
enum JobCommands {
    /// Show one analysis job
    Get { id: Uuid },

    /// List a contract's analysis jobs, newest first
    List { contract_id: Uuid },
}

/// Model connection settings.
#[derive(Args)]
struct ModelArgs {
    /// API key; without one, analyses use the offline model
    #[arg(long, env = "CLAUDE_API_KEY", hide_env_values = true)]
    api_key: Option<String>,
    #[arg(long, env = "CLAUDE_MODEL")]
    model: Option<String>,
    #[arg(long, env = "CLAUDE_API_URL")]
    api_url: Option<String>,
    /// Per-call model timeout in seconds
    #[arg(long, env = "COVENANT_MODEL_TIMEOUT_SECS", default_value_t = 120)]
    timeout_secs: u64,
    /// Total tries for transient model failures
    #[arg(long, default_value_t = 1)]
    attempts: u32,
}

impl ModelArgs {
    fn offline() -> Self {
        Self {
            api_key: None,
            model: None,
            api_url: None,
            timeout_secs: 120,
            attempts: 1,
        }
    }

    fn model_config(&self) -> ModelConfig {
        let mut cfg = ModelConfig {
            timeout: Duration::from_secs(self.timeout_secs),
            ..ModelConfig::default()
        }
        .with_api_key(self.api_key.clone());
        if let Some(m) = &self.model {
            cfg.model = m.clone();
        }
        if let Some(u) = &self.api_url {
            cfg.api_url = u.clone();
        }
        cfg
    }

    fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            model_timeout: Duration::from_secs(self.timeout_secs),
            model_attempts: self.attempts.max(1),
            ..EngineConfig::default()
        }
    }
}

/// Open stores under the data directory.
struct Workspace {
    repo: Arc<DuckStore>,
    docs: Arc<DocumentVersionManager>,
}

impl Workspace {
    async fn open(data_dir: &Path) -> anyhow::Result<Self> {
        tokio::fs::create_dir_all(data_dir)
            .await
            .with_context(|| format!("creating data directory {}", data_dir.display()))?;
        let db_path = data_dir.join("covenant.duckdb");
        let repo = Arc::new(
            DuckStore::open_persistent(&db_path)
                .with_context(|| format!("opening database {}", db_path.display()))?,
        );
        let blobs = Arc::new(
            FsBlobStore::open(data_dir.join("blobs"))
                .await
                .context("opening blob directory")?,
        );
        debug!(data_dir = %data_dir.display(), "workspace opened");
        let docs = Arc::new(DocumentVersionManager::new(
            repo.clone(),
            blobs,
            UploadPolicy::default(),
        ));
        Ok(Self { repo, docs })
    }

    fn orchestrator(&self, model: &ModelArgs) -> anyhow::Result<AnalysisOrchestrator> {
        let client = ModelClient::new(model.model_config()).context("building model client")?;
        Ok(AnalysisOrchestrator::new(
            self.repo.clone(),
            self.docs.clone(),
            Arc::new(client),
            model.engine_config(),
        ))
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
    info!("covenant v{}", env!("CARGO_PKG_VERSION"));

    let ws = Workspace::open(&cli.data_dir).await?;
    let out = cli.output;

    match cli.command {
        Commands::Contract { command } => match command {
            ContractCommands::Add {
                name,
                party,
                contract_type,
                value,
                currency,
                start,
                expiry,
                description,
            } => {
                if let (Some(s), Some(e)) = (start, expiry)
                    && e < s
                {
                    bail!("expiry date {e} is before start date {s}");
                }
                let mut contract = Contract::new(name, party, contract_type);
                contract.value = value;
                contract.currency = currency;
                contract.start_date = start;
                contract.expiry_date = expiry;
                contract.description = description;
                ws.repo
                    .insert_contract(&contract)
                    .await
                    .context("saving contract")?;
                emit(out, &contract, display::contract_card)?;
            }
            ContractCommands::Show { id } => {
                let contract = ws
                    .repo
                    .contract(id)
                    .await?
                    .with_context(|| format!("contract not found: {id}"))?;
                emit(out, &contract, display::contract_card)?;
            }
        },

        Commands::Document { command } => match command {
            DocumentCommands::Upload {
                contract_id,
                file,
                mime,
                user,
            } => {
                let bytes = tokio::fs::read(&file)
                    .await
                    .with_context(|| format!("reading {}", file.display()))?;
                let filename = file
                    .file_name()
                    .and_then(|n| n.to_str())
                    .context("file path has no usable file name")?
                    .to_string();
                let mime_type = mime.unwrap_or_else(|| guess_mime(&filename).to_string());
                let doc = ws
                    .docs
                    .upload(UploadRequest {
                        contract_id,
                        uploader_id: user,
                        filename,
                        mime_type,
                        bytes,
                    })
                    .await?;
                emit(out, &doc, display::document_card)?;
            }
            DocumentCommands::List { contract_id } => {
                let docs = ws.docs.list_for_contract(contract_id).await?;
                emit(out, &docs, |d| display::document_table(d))?;
            }
            DocumentCommands::Latest { contract_id } => {
                let doc = ws.docs.latest_for(contract_id).await?;
                emit(out, &doc, display::document_card)?;
            }
            DocumentCommands::Show { id } => {
                let doc = ws.docs.get(id).await?;
                emit(out, &doc, display::document_card)?;
            }
            DocumentCommands::Download { id, out: path } => {
                let (doc, mut reader) = ws.docs.open(id).await?;
                let mut file = tokio::fs::File::create(&path)
                    .await
                    .with_context(|| format!("creating {}", path.display()))?;
                let written = tokio::io::copy(&mut reader, &mut file).await?;
                file.flush().await?;
                eprintln!(
                    "  Wrote {} v{} ({written} bytes) to {}",
                    doc.original_name,
                    doc.version,
                    path.display()
                );
            }
            DocumentCommands::Delete { id } => {
                let doc = ws.docs.delete(id).await?;
                eprintln!("  Deleted {} v{}", doc.original_name, doc.version);
                emit(out, &doc, display::document_card)?;
            }
        },

        Commands::Analyze {
            contract_id,
            document,
            kind,
            user,
            model,
        } => {
            let engine = ws.orchestrator(&model)?;
            let job = engine.submit(contract_id, document, user, kind).await?;
            eprintln!("  Submitted analysis {} ({kind}), waiting...", job.id);
            engine.wait_idle().await;
            let job = engine.get(job.id).await?;
            emit(out, &job, display::job_card)?;
        }

        Commands::Job { command } => {
            // Job inspection never calls the model; default settings suffice.
            let engine = ws.orchestrator(&ModelArgs::offline())?;
            match command {
                JobCommands::Get { id } => {
                    let job = engine.get(id).await?;
                    emit(out, &job, display::job_card)?;
                }
                JobCommands::List { contract_id } => {
                    let jobs = engine.list_for_contract(contract_id).await?;
                    emit(out, &jobs, |j| display::job_table(j))?;
                }
            }
        }
    }

    Ok(())
}

/// Print `value` as a text card or as pretty JSON.
fn emit<T, F>(format: OutputFormat, value: &T, render: F) -> anyhow::Result<()>
where
    T: serde::Serialize + ?Sized,
    F: FnOnce(&T) -> String,
{
    match format {
        OutputFormat::Text => print!("{}", render(value)),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(value)?),
    }
    Ok(())
}

fn guess_mime(filename: &str) -> &'static str {
    let ext = Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("pdf") => "application/pdf",
        Some("doc") => "application/msword",
        Some("docx") => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        _ => "application/octet-stream",
    }
}
