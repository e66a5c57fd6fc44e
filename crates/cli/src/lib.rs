use anyhow::Result;
use clap::{Args, Parser, Subcommand, ValueEnum};
use deskpilot_actions::builtin_catalog;
use deskpilot_codegen::render_script;
use deskpilot_registry::ActionRegistry;
use deskpilot_retrieval::{infer_params, ConversationHistory, RetrievalService};
use deskpilot_server::AppState;
use deskpilot_vector_index::encoder_from_env;
use std::env;
use std::io;
use std::path::PathBuf;

fn print_stdout(text: &str) -> Result<()> {
    use std::io::Write;

    let mut stdout = io::stdout().lock();
    if let Err(err) = stdout
        .write_all(text.as_bytes())
        .and_then(|_| stdout.write_all(b"\n"))
        .and_then(|_| stdout.flush())
    {
        if err.kind() == io::ErrorKind::BrokenPipe {
            return Ok(());
        }
        return Err(err.into());
    }
    Ok(())
}

#[derive(Parser)]
#[command(name = "deskpilot")]
#[command(about = "Natural-language dispatch for desktop automation actions", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode: log only warnings/errors (stdout is reserved for JSON)
    #[arg(long, global = true)]
    quiet: bool,

    /// Override embedding backend in this process
    #[arg(long, global = true, value_enum)]
    embed_mode: Option<EmbedMode>,

    /// Model directory (overrides DESKPILOT_MODEL_DIR)
    #[arg(long, global = true)]
    model_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the prompt dispatch API over HTTP
    Serve(ServeArgs),

    /// Resolve a prompt to an action name without executing anything
    Resolve(ResolveArgs),

    /// Execute a catalog action directly
    Run(RunArgs),

    /// List the built-in action catalog
    Actions(ActionsArgs),
}

#[derive(Args)]
struct ServeArgs {
    /// Bind address, e.g. 127.0.0.1:8000 (falls back to DESKPILOT_BIND)
    #[arg(long)]
    bind: Option<String>,
}

#[derive(Args)]
struct ResolveArgs {
    /// Free-text prompt
    prompt: String,

    /// Output JSON format
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct RunArgs {
    /// Action name from the catalog
    name: String,

    /// Parameter values, in declaration order
    #[arg(last = true)]
    values: Vec<String>,
}

#[derive(Args)]
struct ActionsArgs {
    /// Output JSON format
    #[arg(long)]
    json: bool,
}

#[derive(Copy, Clone, ValueEnum)]
enum EmbedMode {
    Onnx,
    Stub,
}

impl EmbedMode {
    const fn as_str(self) -> &'static str {
        match self {
            EmbedMode::Onnx => "onnx",
            EmbedMode::Stub => "stub",
        }
    }
}

pub async fn main_entry() -> Result<()> {
    let mut cli = Cli::parse();

    if let Some(dir) = &cli.model_dir {
        env::set_var("DESKPILOT_MODEL_DIR", dir);
    }
    if let Some(mode) = cli.embed_mode {
        env::set_var("DESKPILOT_EMBEDDING_MODE", mode.as_str());
    }

    // Auto-enable quiet mode when --json is used (to keep stdout clean for JSON parsing)
    let json_output = match &cli.command {
        Commands::Resolve(args) => args.json,
        Commands::Actions(args) => args.json,
        _ => false,
    };
    if json_output {
        cli.quiet = true;
    }

    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if cli.quiet {
        builder.filter_level(log::LevelFilter::Warn);
    } else if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    // Always silence ort crate unless verbose mode (ORT is extremely noisy)
    if !cli.verbose {
        builder.filter_module("ort", log::LevelFilter::Off);
    }
    builder.target(env_logger::Target::Stderr).init();

    match cli.command {
        Commands::Serve(args) => run_serve(args).await?,
        Commands::Resolve(args) => run_resolve(args).await?,
        Commands::Run(args) => run_run(args)?,
        Commands::Actions(args) => run_actions(args)?,
    }

    Ok(())
}

/// Builds the retrieval service over the built-in catalog. Loads the
/// embedding model, so run it on a blocking thread.
fn build_service() -> Result<RetrievalService> {
    let encoder = encoder_from_env()?;
    let registry = ActionRegistry::from_descriptors(builtin_catalog())?;
    Ok(RetrievalService::new(registry, encoder)?)
}

async fn run_serve(args: ServeArgs) -> Result<()> {
    let bind = args
        .bind
        .or_else(|| env::var("DESKPILOT_BIND").ok())
        .unwrap_or_else(|| "127.0.0.1:8000".to_string());

    let service = tokio::task::spawn_blocking(build_service).await??;
    let state = AppState::new(service);

    print_stdout(&format!("Serving dispatch API: http://{bind}/execute"))?;
    print_stdout(&format!("Execution monitor: http://{bind}/monitor"))?;

    deskpilot_server::serve(&bind, state).await
}

async fn run_resolve(args: ResolveArgs) -> Result<()> {
    let json = args.json;
    let prompt = args.prompt;
    let resolved = tokio::task::spawn_blocking(move || -> Result<Option<(String, String)>> {
        let service = build_service()?;
        let history = ConversationHistory::new();
        let Some(function) = service.resolve(&prompt, &history) else {
            return Ok(None);
        };
        let params = service
            .descriptor(&function)
            .and_then(|descriptor| infer_params(descriptor, &prompt, &history))
            .unwrap_or_default();
        let code = render_script(&function, &params)?;
        Ok(Some((function, code)))
    })
    .await??;

    match resolved {
        Some((function, code)) => {
            if json {
                print_stdout(
                    &serde_json::json!({ "function": function, "code": code }).to_string(),
                )?;
            } else {
                print_stdout(&function)?;
                print_stdout(code.trim_end())?;
            }
        }
        None => {
            if json {
                print_stdout(&serde_json::json!({ "function": null }).to_string())?;
            } else {
                log::error!("No registered action matches the prompt");
            }
            std::process::exit(1);
        }
    }

    Ok(())
}

fn run_run(args: RunArgs) -> Result<()> {
    let report = deskpilot_actions::run_action(&args.name, &args.values)?;
    if let Some(line) = report.output {
        print_stdout(&line)?;
    }
    Ok(())
}

fn run_actions(args: ActionsArgs) -> Result<()> {
    let catalog = builtin_catalog();

    if args.json {
        print_stdout(&serde_json::to_string_pretty(&catalog)?)?;
        return Ok(());
    }

    for descriptor in &catalog {
        match descriptor.params.as_deref() {
            Some(params) if !params.is_empty() => print_stdout(&format!(
                "{} ({})  {}",
                descriptor.name,
                params.join(", "),
                descriptor.description
            ))?,
            _ => print_stdout(&format!("{}  {}", descriptor.name, descriptor.description))?,
        }
    }

    Ok(())
}
