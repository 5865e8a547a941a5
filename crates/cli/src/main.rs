use anyhow::{bail, Context as AnyhowContext, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use trigger_context::{standard_codec, PersistedRecord, RecordKind, RecordSummary};
use trigger_doc::{DocConfig, DocumentCodec, ReferenceStyle};

#[derive(Parser)]
#[command(name = "trigger-context")]
#[command(about = "Inspect, migrate and check persisted trigger context records", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode: log only warnings/errors (stdout is reserved for output)
    #[arg(long, global = true)]
    quiet: bool,

    /// TOML file with document settings
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// How repeated contexts are marked when writing
    #[arg(long, global = true, value_enum)]
    reference_style: Option<StyleArg>,

    /// Spaces per nesting level when writing (0 for a single line)
    #[arg(long, global = true)]
    indent: Option<usize>,
}

#[derive(Subcommand)]
enum Commands {
    /// Decode a record and print a JSON summary of its trigger contexts
    Inspect(InspectArgs),

    /// Decode a record (older layouts included) and write it in the current layout
    Migrate(MigrateArgs),

    /// Check that records decode
    Check(CheckArgs),
}

#[derive(Args)]
struct InspectArgs {
    /// Record to read
    path: PathBuf,

    /// Record kind; detected from the root element when omitted
    #[arg(long, value_enum)]
    kind: Option<KindArg>,
}

#[derive(Args)]
struct MigrateArgs {
    /// Record to read
    path: PathBuf,

    /// Destination file (stdout when omitted)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Record kind; detected from the root element when omitted
    #[arg(long, value_enum)]
    kind: Option<KindArg>,
}

#[derive(Args)]
struct CheckArgs {
    /// Records to check
    #[arg(required = true)]
    paths: Vec<PathBuf>,

    /// Fail records that hold no trigger context
    #[arg(long)]
    require_context: bool,

    /// Output results as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum KindArg {
    Build,
    Action,
    Context,
}

impl From<KindArg> for RecordKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Build => RecordKind::Build,
            KindArg::Action => RecordKind::Action,
            KindArg::Context => RecordKind::Context,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum StyleArg {
    Id,
    RelativePath,
}

impl From<StyleArg> for ReferenceStyle {
    fn from(style: StyleArg) -> Self {
        match style {
            StyleArg::Id => ReferenceStyle::Id,
            StyleArg::RelativePath => ReferenceStyle::RelativePath,
        }
    }
}

#[derive(Serialize)]
struct CheckOutcome {
    path: String,
    ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    kind: Option<RecordKind>,
    contexts: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

fn main() -> Result<()> {
    let mut cli = Cli::parse();

    if let Commands::Check(args) = &cli.command {
        if args.json {
            cli.quiet = true;
        }
    }

    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if cli.quiet {
        builder.filter_level(log::LevelFilter::Warn);
    } else if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.target(env_logger::Target::Stderr).init();

    let codec = build_codec(&cli)?;

    match cli.command {
        Commands::Inspect(args) => run_inspect(&codec, args)?,
        Commands::Migrate(args) => run_migrate(&codec, args)?,
        Commands::Check(args) => run_check(&codec, args)?,
    }

    Ok(())
}

fn build_codec(cli: &Cli) -> Result<DocumentCodec> {
    let mut config = match &cli.config {
        Some(path) => DocConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => DocConfig::default(),
    };
    if let Some(style) = cli.reference_style {
        config.reference_style = style.into();
    }
    if let Some(indent) = cli.indent {
        config.indent = (indent > 0).then_some(indent);
    }
    log::debug!("document config: {config:?}");

    standard_codec(config).context("Invalid document configuration")
}

fn read_record(codec: &DocumentCodec, path: &Path, kind: Option<KindArg>) -> Result<PersistedRecord> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    PersistedRecord::decode(codec, &raw, kind.map(Into::into))
        .with_context(|| format!("Failed to decode {}", path.display()))
}

fn run_inspect(codec: &DocumentCodec, args: InspectArgs) -> Result<()> {
    let record = read_record(codec, &args.path, args.kind)?;
    let summary = RecordSummary::from(&record);
    log::info!(
        "{}: {} record with {} trigger context(s)",
        args.path.display(),
        summary.kind,
        summary.contexts.len()
    );
    println!("{}", summary.to_json()?);
    Ok(())
}

fn run_migrate(codec: &DocumentCodec, args: MigrateArgs) -> Result<()> {
    let record = read_record(codec, &args.path, args.kind)?;
    let migrated = record
        .encode(codec)
        .with_context(|| format!("Failed to encode {}", args.path.display()))?;

    match &args.output {
        Some(output) => {
            fs::write(output, &migrated)
                .with_context(|| format!("Failed to write {}", output.display()))?;
            log::info!("Migrated {} -> {}", args.path.display(), output.display());
        }
        None => println!("{migrated}"),
    }
    Ok(())
}

fn check_one(codec: &DocumentCodec, path: &Path, require_context: bool) -> CheckOutcome {
    let outcome = read_record(codec, path, None).and_then(|record| {
        if require_context {
            record.primary_context()?;
        }
        Ok(record)
    });

    match outcome {
        Ok(record) => CheckOutcome {
            path: path.display().to_string(),
            ok: true,
            kind: Some(record.kind()),
            contexts: record.contexts().len(),
            error: None,
        },
        Err(err) => CheckOutcome {
            path: path.display().to_string(),
            ok: false,
            kind: None,
            contexts: 0,
            error: Some(format!("{err:#}")),
        },
    }
}

fn run_check(codec: &DocumentCodec, args: CheckArgs) -> Result<()> {
    let outcomes: Vec<CheckOutcome> = args
        .paths
        .iter()
        .map(|path| check_one(codec, path, args.require_context))
        .collect();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&outcomes)?);
    } else {
        for outcome in &outcomes {
            match (&outcome.kind, &outcome.error) {
                (Some(kind), None) => println!(
                    "ok      {} ({kind}, {} context(s))",
                    outcome.path, outcome.contexts
                ),
                (_, error) => println!(
                    "FAILED  {}: {}",
                    outcome.path,
                    error.as_deref().unwrap_or("unknown error")
                ),
            }
        }
    }

    let failed = outcomes.iter().filter(|outcome| !outcome.ok).count();
    if failed > 0 {
        bail!("{failed} of {} record(s) failed", outcomes.len());
    }
    Ok(())
}
