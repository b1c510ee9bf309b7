//! AskDocs command-line client
//!
//! Run with: cargo run -p askdocs-client --bin askdocs -- --help

use std::path::PathBuf;
use std::sync::Arc;

use askdocs_client::orchestration::{FileOutcome, SUGGESTED_QUERIES};
use askdocs_client::render::citation::{parse_answer, resolve, source_lines, Segment};
use askdocs_client::render::{ExpansionState, StatsView};
use askdocs_client::types::FileType;
use askdocs_client::{
    BatchReport, ClientConfig, Error, HttpBackend, Namespace, NamespaceManager, QueryResult,
    RagBackend, Session, UploadResult, UploadTask,
};
use clap::{Parser, Subcommand};
use console::style;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "askdocs", version, about = "Upload documents and ask questions with cited answers")]
struct Cli {
    /// Path to a TOML config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Backend base URL (overrides config and ASKDOCS_API_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Upload files into one shared namespace, in the given order
    Upload {
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Title for every file (defaults to each file name)
        #[arg(long)]
        title: Option<String>,
        /// Namespace to add the files to
        #[arg(long)]
        namespace: Option<String>,
    },
    /// Upload pasted text
    Paste {
        text: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        namespace: Option<String>,
    },
    /// Ask a question
    Ask {
        question: String,
        /// Namespace returned by a previous upload
        #[arg(long)]
        namespace: Option<String>,
        /// Citation numbers to toggle open, in order
        #[arg(long)]
        expand: Vec<u32>,
    },
    /// Interactive session: upload, ask and expand citations
    Session,
    /// Check backend health
    Health,
    /// List index contents
    Docs {
        #[arg(long)]
        namespace: Option<String>,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "askdocs_client=info,askdocs=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let mut config = ClientConfig::load(cli.config.as_deref())?;
    if let Some(url) = &cli.api_url {
        config.apply_api_url(url);
    }
    tracing::debug!("Using backend at {}", config.backend.base_url);

    let backend: Arc<dyn RagBackend> = Arc::new(HttpBackend::new(&config.backend)?);

    match cli.command {
        Command::Upload {
            files,
            title,
            namespace,
        } => {
            let mut session = session_with(&backend, &config, namespace.as_deref());
            let selected = load_files(&config, &files, title.as_deref()).await;
            let report = upload_selected(&mut session, selected).await?;
            print_batch(&report);
        }
        Command::Paste {
            text,
            title,
            namespace,
        } => {
            let mut session = session_with(&backend, &config, namespace.as_deref());
            let report = session.paste(&text, title.as_deref()).await?;
            print_batch(&report);
        }
        Command::Ask {
            question,
            namespace,
            expand,
        } => {
            let mut session = session_with(&backend, &config, namespace.as_deref());
            if session.namespace().is_none() {
                println!("{}", style("No namespace given; searching the default index").yellow());
            }
            let result = session.ask(&question).await?;
            for number in expand {
                session.toggle_citation(number);
            }
            print_answer(&result, session.state().expansion());
        }
        Command::Session => run_interactive(&backend, &config).await?,
        Command::Health => {
            if backend.health_check().await? {
                println!("{} backend at {} is healthy", style("✓").green(), config.backend.base_url);
            } else {
                println!("{} backend at {} is unavailable", style("✗").red(), config.backend.base_url);
                std::process::exit(1);
            }
        }
        Command::Docs { namespace } => {
            let session = session_with(&backend, &config, namespace.as_deref());
            print_index(&session).await?;
        }
    }

    Ok(())
}

fn session_with(
    backend: &Arc<dyn RagBackend>,
    config: &ClientConfig,
    namespace: Option<&str>,
) -> Session {
    let namespaces = match namespace.and_then(Namespace::new) {
        Some(ns) => NamespaceManager::with_namespace(ns),
        None => NamespaceManager::new(),
    };
    Session::with_namespaces(Arc::clone(backend), config, namespaces)
}

/// A selected file, read and ready or already failed locally
enum Selected {
    Ready(UploadTask),
    Unreadable(FileOutcome),
}

/// Read selected files in order
///
/// Files of an unsupported type are skipped with a warning, like a file
/// picker filter. Files that cannot be read stay in the batch as failures.
async fn load_files(config: &ClientConfig, files: &[PathBuf], title: Option<&str>) -> Vec<Selected> {
    let mut selected = Vec::with_capacity(files.len());

    for path in files {
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        if FileType::from_filename(&filename).is_none() {
            let accepted: Vec<_> = FileType::ALL.iter().map(FileType::display_name).collect();
            tracing::warn!(
                "Skipping {}: accepted types are {}",
                path.display(),
                accepted.join(", ")
            );
            continue;
        }

        match UploadTask::from_path(path, title).await {
            Ok(task) => {
                if task.size_bytes() > config.upload.max_file_size_bytes {
                    tracing::warn!(
                        "{} is {} bytes, over the advisory {} byte limit",
                        path.display(),
                        task.size_bytes(),
                        config.upload.max_file_size_bytes
                    );
                }
                selected.push(Selected::Ready(task));
            }
            Err(e) => {
                tracing::warn!("Cannot read {}: {}", path.display(), e);
                let title = title
                    .map(str::trim)
                    .filter(|t| !t.is_empty())
                    .map(str::to_string)
                    .unwrap_or(filename);
                selected.push(Selected::Unreadable(FileOutcome {
                    title,
                    requested_namespace: None,
                    result: UploadResult::Failed {
                        message: e.user_message(),
                    },
                }));
            }
        }
    }

    selected
}

/// Upload the readable files and splice local failures back in input order
async fn upload_selected(session: &mut Session, selected: Vec<Selected>) -> askdocs_client::Result<BatchReport> {
    let mut tasks = Vec::new();
    let mut slots = Vec::with_capacity(selected.len());
    for item in selected {
        match item {
            Selected::Ready(task) => {
                tasks.push(task);
                slots.push(None);
            }
            Selected::Unreadable(outcome) => slots.push(Some(outcome)),
        }
    }

    let report = if tasks.is_empty() && !slots.is_empty() {
        BatchReport {
            namespace: session.namespace(),
            ..BatchReport::default()
        }
    } else {
        session.upload(tasks).await?
    };

    Ok(report.with_local_failures(slots))
}

fn print_batch(report: &BatchReport) {
    let log = report.log();
    if report.has_failures() {
        println!("{}", style(log).yellow());
    } else {
        println!("{}", style(log).green());
    }

    for outcome in &report.outcomes {
        if let Some(stats) = outcome.result.stats() {
            println!(
                "    {}: {} {}",
                outcome.title,
                outcome.result.message(),
                style(format!("({})", stats.summary())).dim()
            );
        }
    }

    match &report.namespace {
        Some(ns) => println!("Namespace: {}", style(ns).cyan().bold()),
        None => println!("{}", style("No namespace established").yellow()),
    }
}

fn print_answer(result: &QueryResult, expansion: ExpansionState) {
    println!("{}", style("Answer").bold());

    let mut rendered = String::new();
    for segment in parse_answer(&result.answer) {
        match &segment {
            Segment::Text(text) => rendered.push_str(text),
            Segment::Reference(reference) => {
                let tag = reference.raw.clone();
                let resolved = reference
                    .number
                    .and_then(|n| resolve(n, &result.citations))
                    .is_some();
                let tag = if reference.number.is_some_and(|n| expansion.is_expanded(n)) {
                    style(tag).cyan().bold().underlined()
                } else if resolved {
                    style(tag).cyan()
                } else {
                    style(tag).dim()
                };
                rendered.push_str(&tag.to_string());
            }
        }
    }
    println!("{}\n", rendered);

    if !result.citations.is_empty() {
        println!("{}", style("Sources").bold());
        for line in source_lines(&result.citations, expansion) {
            println!("{}", line);
        }
        println!();
    }

    let stats = StatsView::from_result(result);
    if !stats.is_empty() {
        println!("{}", style(stats.badges().join("  ·  ")).dim());
    }
}

async fn print_index(session: &Session) -> anyhow::Result<()> {
    let (summary, indexed) = session.documents().await?;
    println!("{} vectors in {} namespace(s)", summary.total_vectors, summary.namespaces.len());
    for ns in &summary.namespaces {
        println!("  {}", ns);
    }
    if let (Some(ns), Some(indexed)) = (session.namespace(), indexed) {
        if indexed {
            println!("{} session namespace {} is indexed", style("✓").green(), ns);
        } else {
            println!("{} session namespace {} not found", style("✗").red(), ns);
        }
    }
    Ok(())
}

async fn run_interactive(backend: &Arc<dyn RagBackend>, config: &ClientConfig) -> anyhow::Result<()> {
    let mut session = Session::new(Arc::clone(backend), config);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    println!("Commands: :upload <files..>  :paste <text>  :expand <n>  :log  :docs  :ns  :quit");
    println!("Try asking: {}", SUGGESTED_QUERIES.join(" / "));

    loop {
        print!("> ");
        use std::io::Write as _;
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let (command, rest) = line.split_once(' ').unwrap_or((line, ""));
        let outcome: anyhow::Result<()> = match command {
            ":quit" | ":q" => break,
            ":ns" => {
                match session.namespace() {
                    Some(ns) => println!("Namespace: {}", ns),
                    None => println!("Upload a document first"),
                }
                Ok(())
            }
            ":log" => {
                match session.last_upload_log() {
                    Some(log) => println!("{}", log),
                    None => println!("Nothing uploaded yet"),
                }
                Ok(())
            }
            ":docs" => print_index(&session).await,
            ":upload" => {
                let files: Vec<PathBuf> = rest.split_whitespace().map(PathBuf::from).collect();
                let selected = load_files(config, &files, None).await;
                upload_selected(&mut session, selected)
                    .await
                    .map(|r| print_batch(&r))
                    .map_err(Into::into)
            }
            ":paste" => session
                .paste(rest, None)
                .await
                .map(|r| print_batch(&r))
                .map_err(Into::into),
            ":expand" => {
                match rest.trim().parse::<u32>() {
                    Ok(number) => {
                        session.toggle_citation(number);
                        match session.state().result() {
                            Some(result) => print_answer(result, session.state().expansion()),
                            None => println!("Ask a question first"),
                        }
                    }
                    Err(_) => println!("Usage: :expand <citation number>"),
                }
                Ok(())
            }
            _ => match session.ask(line).await {
                Ok(result) => {
                    print_answer(&result, session.state().expansion());
                    Ok(())
                }
                Err(e) => Err(e.into()),
            },
        };

        if let Err(e) = outcome {
            report_error(&e);
        }
    }

    Ok(())
}

fn report_error(err: &anyhow::Error) {
    let message = match err.downcast_ref::<Error>() {
        Some(e) => e.user_message(),
        None => err.to_string(),
    };
    println!("{}", style(message).red());
}
