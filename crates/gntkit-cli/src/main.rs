use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use glob::glob;
use gntkit_core::{
    Corpus, DEFAULT_GENERATED_AT, DatasetKind, DatasetRegistry, DecoderOptions, ErrorPolicy,
    ExportSummary, GntFileSource, LengthCheck, PngDirectorySink, RegistryError, Report,
    analyze_corpus, discover_gnt_files, export_corpus, is_gnt_path,
};
use serde::Serialize;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("GNTKIT_BUILD_COMMIT"),
    " ",
    env!("GNTKIT_BUILD_DATE"),
    ")"
);

#[derive(Parser, Debug)]
#[command(name = "gntkit")]
#[command(version, long_version = LONG_VERSION)]
#[command(
    about = "Decoder for CASIA handwriting sample archives (GNT).",
    long_about = None,
    after_help = "Examples:\n  gntkit inspect HWDB1.1tst_gnt/ -o report.json\n  gntkit inspect '*.gnt' --stdout --on-error skip\n  gntkit export --all-datasets --root ~/CASIA_data --out raw/\n  gntkit datasets --root ~/CASIA_data"
)]
struct Cli {
    /// Suppress non-error output
    #[arg(short = 'q', long, global = true)]
    quiet: bool,

    /// Enable debug logging
    #[arg(short = 'v', long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Decode every sample and write a JSON summary report.
    #[command(alias = "analyze")]
    Inspect {
        #[command(flatten)]
        input: InputArgs,

        /// Output report path (JSON)
        #[arg(short = 'o', long, required_unless_present = "stdout")]
        report: Option<PathBuf>,

        /// Write JSON report to stdout
        #[arg(long, conflicts_with = "report")]
        stdout: bool,

        /// Pretty-print JSON output
        #[arg(long, conflicts_with = "compact")]
        pretty: bool,

        /// Compact JSON output (default)
        #[arg(long)]
        compact: bool,

        /// Exit with a non-zero code if any member failed or warned
        #[arg(long)]
        strict: bool,
    },
    /// Re-encode every sample as a PNG under <OUT>/<label>/<label>_<n>.png.
    Export {
        #[command(flatten)]
        input: InputArgs,

        /// Output directory
        #[arg(long)]
        out: PathBuf,

        /// Also write the export summary as JSON
        #[arg(long)]
        summary: Option<PathBuf>,
    },
    /// List the dataset registry and which datasets are extracted under --root.
    Datasets {
        /// Dataset registry JSON (defaults to the built-in CASIA table)
        #[arg(long)]
        registry: Option<PathBuf>,

        /// Directory holding extracted datasets (default: ~/CASIA_data)
        #[arg(long)]
        root: Option<PathBuf>,

        /// Print the listing as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args, Debug)]
struct InputArgs {
    /// GNT files, directories of GNT files, or glob patterns
    #[arg(required_unless_present_any = ["dataset", "all_datasets"])]
    inputs: Vec<PathBuf>,

    /// Dataset name from the registry, resolved under --root
    #[arg(long, conflicts_with = "inputs")]
    dataset: Option<String>,

    /// Every character dataset in the registry, resolved under --root
    #[arg(long, conflicts_with_all = ["inputs", "dataset"])]
    all_datasets: bool,

    /// Directory holding extracted datasets (default: ~/CASIA_data)
    #[arg(long)]
    root: Option<PathBuf>,

    /// Dataset registry JSON (defaults to the built-in CASIA table)
    #[arg(long)]
    registry: Option<PathBuf>,

    /// What to do when a member fails to decode
    #[arg(long, value_enum, default_value_t = OnError::Abort)]
    on_error: OnError,

    /// Warn when a record's declared length disagrees with its header
    #[arg(long)]
    check_length: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OnError {
    /// Stop at the first failing member
    Abort,
    /// Report the failing member and continue with the next one
    Skip,
}

impl From<OnError> for ErrorPolicy {
    fn from(value: OnError) -> Self {
        match value {
            OnError::Abort => ErrorPolicy::AbortCorpus,
            OnError::Skip => ErrorPolicy::SkipSource,
        }
    }
}

impl InputArgs {
    fn decoder_options(&self) -> DecoderOptions {
        DecoderOptions {
            length_check: if self.check_length {
                LengthCheck::Warn
            } else {
                LengthCheck::Ignore
            },
        }
    }

    fn corpus(&self) -> Result<Corpus<GntFileSource>, CliError> {
        Ok(self.corpus_of(resolve_members(self)?))
    }

    fn corpus_of(&self, members: Vec<GntFileSource>) -> Corpus<GntFileSource> {
        Corpus::new(members)
            .with_policy(self.on_error.into())
            .with_decoder_options(self.decoder_options())
    }

    fn dataset_root(&self) -> PathBuf {
        dataset_root(self.root.clone())
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    setup_logging(cli.verbose, cli.quiet);
    let quiet = cli.quiet;

    let result = match cli.command {
        Commands::Inspect {
            input,
            report,
            stdout,
            pretty,
            compact: _,
            strict,
        } => cmd_inspect(input, report, stdout, pretty, strict, quiet),
        Commands::Export {
            input,
            out,
            summary,
        } => cmd_export(input, out, summary, quiet),
        Commands::Datasets {
            registry,
            root,
            json,
        } => cmd_datasets(registry, root, json),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {}", err.message);
            if let Some(hint) = err.hint {
                eprintln!("hint: {}", hint);
            }
            ExitCode::from(2)
        }
    }
}

fn setup_logging(verbose: bool, quiet: bool) {
    let level = if quiet {
        Level::ERROR
    } else if verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();

    if let Err(err) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("warning: logging disabled: {}", err);
    }
}

#[derive(Debug)]
struct CliError {
    message: String,
    hint: Option<String>,
}

impl CliError {
    fn new(message: impl Into<String>, hint: Option<String>) -> Self {
        Self {
            message: message.into(),
            hint,
        }
    }
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

impl From<anyhow::Error> for CliError {
    fn from(err: anyhow::Error) -> Self {
        CliError::new(format!("{:#}", err), None)
    }
}

fn cmd_inspect(
    input: InputArgs,
    report: Option<PathBuf>,
    stdout: bool,
    pretty: bool,
    strict: bool,
    quiet: bool,
) -> Result<(), CliError> {
    let corpus = input.corpus()?;
    let mut rep = analyze_corpus(&corpus).context("GNT decoding failed")?;
    rep.generated_at = now_rfc3339();
    let json = serialize_json(&rep, pretty)?;

    if stdout {
        println!("{}", json);
    } else {
        let report = report.ok_or_else(|| {
            CliError::new(
                "missing output path",
                Some("use -o/--report or --stdout".to_string()),
            )
        })?;
        write_output(&report, &json)?;
        if !quiet {
            eprintln!("OK: report written -> {}", report.display());
        }
    }

    if strict && has_problems(&rep) {
        return Err(CliError::new(
            "corpus problems detected",
            Some("inspect the report's members and warnings".to_string()),
        ));
    }
    Ok(())
}

fn cmd_export(
    input: InputArgs,
    out: PathBuf,
    summary: Option<PathBuf>,
    quiet: bool,
) -> Result<(), CliError> {
    if out.is_file() {
        return Err(CliError::new(
            format!("output is not a directory: {}", out.display()),
            Some("choose a directory path for --out".to_string()),
        ));
    }
    let mut result = ExportSummary::default();
    for (target, members) in export_targets(&input, &out)? {
        let corpus = input.corpus_of(members);
        let mut sink = PngDirectorySink::new(&target);
        let written = export_corpus(&corpus, &mut sink)
            .with_context(|| format!("PNG export to {} failed", target.display()))?;
        result.merge(written);
    }

    if let Some(path) = summary.as_ref() {
        write_output(path, &serialize_json(&result, true)?)?;
    }
    if !quiet {
        eprintln!(
            "OK: {} samples ({} labels) written -> {}",
            result.samples_written,
            result.labels.len(),
            out.display()
        );
        for failed in &result.failed_members {
            eprintln!("  skipped {}", failed);
        }
    }
    Ok(())
}

#[derive(Debug, Serialize)]
struct DatasetListing {
    name: String,
    kind: &'static str,
    url: String,
    path: String,
    present: bool,
}

fn cmd_datasets(
    registry: Option<PathBuf>,
    root: Option<PathBuf>,
    json: bool,
) -> Result<(), CliError> {
    let registry = load_registry(registry.as_deref())?;
    let root = dataset_root(root);

    let listings: Vec<DatasetListing> = registry
        .iter()
        .map(|entry| {
            let path = root.join(&entry.name);
            DatasetListing {
                name: entry.name.clone(),
                kind: kind_name(entry.kind),
                url: entry.url.clone(),
                present: path.is_dir(),
                path: path.display().to_string(),
            }
        })
        .collect();

    if json {
        println!("{}", serialize_json(&listings, true)?);
        return Ok(());
    }
    for listing in &listings {
        println!(
            "{:<20} {:<4} {:<8} {}",
            listing.name,
            listing.kind,
            if listing.present { "present" } else { "missing" },
            listing.url
        );
    }
    Ok(())
}

fn kind_name(kind: DatasetKind) -> &'static str {
    match kind {
        DatasetKind::Gnt => "gnt",
        DatasetKind::Dgr => "dgr",
    }
}

fn serialize_json<T: Serialize + ?Sized>(value: &T, pretty: bool) -> Result<String, CliError> {
    if pretty {
        serde_json::to_string_pretty(value)
            .context("JSON serialization failed")
            .map_err(Into::into)
    } else {
        serde_json::to_string(value)
            .context("JSON serialization failed")
            .map_err(Into::into)
    }
}

fn write_output(path: &Path, contents: &str) -> Result<(), CliError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create output directory: {}", parent.display())
            })?;
        }
    }
    fs::write(path, contents)
        .with_context(|| format!("Failed to write output: {}", path.display()))?;
    Ok(())
}

fn has_problems(rep: &Report) -> bool {
    !rep.warnings.is_empty() || rep.members.iter().any(|member| member.error.is_some())
}

fn now_rfc3339() -> String {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_else(|_| DEFAULT_GENERATED_AT.to_string())
}

fn load_registry(path: Option<&Path>) -> Result<DatasetRegistry, CliError> {
    match path {
        None => Ok(DatasetRegistry::casia()),
        Some(path) => DatasetRegistry::from_path(path).map_err(|err| {
            CliError::new(
                format!("cannot load registry {}: {}", path.display(), err),
                Some("expected {\"datasets\": [{\"name\", \"url\", \"kind\"}]}".to_string()),
            )
        }),
    }
}

fn dataset_root(root: Option<PathBuf>) -> PathBuf {
    root.unwrap_or_else(|| {
        std::env::var_os("HOME")
            .map(PathBuf::from)
            .unwrap_or_default()
            .join("CASIA_data")
    })
}

fn dataset_error(name: &str, root: &Path, err: RegistryError) -> CliError {
    CliError::new(
        format!("cannot resolve dataset '{}': {}", name, err),
        Some(format!(
            "extract the dataset under {} or pass --root",
            root.display()
        )),
    )
}

fn resolve_members(input: &InputArgs) -> Result<Vec<GntFileSource>, CliError> {
    if input.all_datasets {
        let registry = load_registry(input.registry.as_deref())?;
        let root = input.dataset_root();
        return registry.character_set_members(&root).map_err(|err| {
            CliError::new(
                format!("cannot resolve character datasets: {}", err),
                Some(format!(
                    "extract every character dataset under {} or pass --root",
                    root.display()
                )),
            )
        });
    }
    if let Some(name) = input.dataset.as_deref() {
        let registry = load_registry(input.registry.as_deref())?;
        let root = input.dataset_root();
        return registry
            .members(&root, name)
            .map_err(|err| dataset_error(name, &root, err));
    }

    let mut members = Vec::new();
    for path in &input.inputs {
        members.extend(resolve_input(path)?);
    }
    if members.is_empty() {
        return Err(CliError::new(
            "no GNT members found",
            Some("pass .gnt files or directories containing them".to_string()),
        ));
    }
    Ok(members)
}

/// Output directories paired with the members exported into them. Registry
/// datasets land in `<out>/<dataset>/`; plain inputs go straight to `<out>`.
fn export_targets(
    input: &InputArgs,
    out: &Path,
) -> Result<Vec<(PathBuf, Vec<GntFileSource>)>, CliError> {
    if !input.all_datasets && input.dataset.is_none() {
        return Ok(vec![(out.to_path_buf(), resolve_members(input)?)]);
    }

    let registry = load_registry(input.registry.as_deref())?;
    let root = input.dataset_root();
    let names: Vec<String> = match input.dataset.as_ref() {
        Some(name) => vec![name.clone()],
        None => registry
            .character_sets()
            .map(|entry| entry.name.clone())
            .collect(),
    };
    names
        .into_iter()
        .map(|name| -> Result<_, CliError> {
            let members = registry
                .members(&root, &name)
                .map_err(|err| dataset_error(&name, &root, err))?;
            Ok((out.join(&name), members))
        })
        .collect()
}

fn resolve_input(input: &Path) -> Result<Vec<GntFileSource>, CliError> {
    let pattern = input.to_string_lossy();
    if is_glob_pattern(&pattern) {
        return resolve_pattern(&pattern);
    }
    if input.is_dir() {
        return discover_gnt_files(input).map_err(|err| {
            CliError::new(
                format!("cannot list directory {}: {}", input.display(), err),
                None,
            )
        });
    }
    validate_input_file(input)?;
    Ok(vec![GntFileSource::new(input)])
}

fn resolve_pattern(pattern: &str) -> Result<Vec<GntFileSource>, CliError> {
    let paths = glob(pattern).map_err(|err| {
        CliError::new(
            format!("invalid input pattern '{}'", pattern),
            Some(format!("pattern error: {}", err.msg)),
        )
    })?;

    let mut matches = Vec::new();
    for entry in paths {
        let path = entry.map_err(|err| {
            CliError::new(
                format!("invalid input pattern '{}'", pattern),
                Some(format!("pattern error: {}", err)),
            )
        })?;
        if path.is_file() && is_gnt_path(&path) {
            matches.push(GntFileSource::new(path));
        }
    }

    if matches.is_empty() {
        return Err(CliError::new(
            format!("no files match pattern '{}'", pattern),
            Some("check the path or quote the pattern; expected .gnt files".to_string()),
        ));
    }
    Ok(matches)
}

fn validate_input_file(input: &Path) -> Result<(), CliError> {
    if !input.exists() {
        return Err(CliError::new(
            format!("input file not found: {}", input.display()),
            Some("use a .gnt file or a directory of them".to_string()),
        ));
    }
    if !is_gnt_path(input) {
        return Err(CliError::new(
            format!("unsupported input format '{}'", input.display()),
            Some("expected a .gnt file".to_string()),
        ));
    }
    Ok(())
}

fn is_glob_pattern(input: &str) -> bool {
    input.contains('*') || input.contains('?') || input.contains('[')
}
