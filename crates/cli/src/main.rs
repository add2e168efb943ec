// ABOUTME: CLI binary for yamscrape: loads a selector configuration and evaluates it.
// ABOUTME: Reads HTML files or fetches URLs and prints extracted fields as JSON or a sectioned report.

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Parser, ValueEnum};
use scraper::Html;
use serde::Serialize;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;
use yamscrape_engine::{
    decode_html, fetch, load, render_report, Engine, EvalError, Extraction, FetchOptions,
    Record, ReportOptions, SelectorConfiguration,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Json,
    Report,
}

/// Evaluate a selector configuration against HTML pages.
#[derive(Parser, Debug)]
#[command(name = "yamscrape")]
#[command(about = "Extract named fields from HTML with a YAML selector configuration", long_about = None)]
struct Args {
    /// Configuration file path, or the YAML/JSON configuration itself
    #[arg(short = 'c', long = "config")]
    config: String,

    /// HTML file(s) to evaluate
    #[arg(long = "html")]
    html: Vec<PathBuf>,

    /// URLs to fetch and evaluate
    #[arg()]
    urls: Vec<String>,

    /// Output format
    #[arg(short = 'f', long = "format", value_enum, default_value_t = Format::Json)]
    format: Format,

    /// Abort a page on the first selector error instead of collecting errors
    #[arg(long = "strict")]
    strict: bool,

    /// Output compact JSON instead of pretty
    #[arg(long = "compact")]
    compact: bool,

    /// Separator for joining multiple matches of a leaf selector (\n and \t are unescaped)
    #[arg(long = "separator")]
    separator: Option<String>,

    /// Allow fetching from private/local networks
    #[arg(long = "allow-private-networks")]
    allow_private_networks: bool,

    /// Collapse each element's text to a single line in report output
    #[arg(long = "single-line")]
    single_line: bool,

    /// Output file path (default: stdout)
    #[arg(short = 'o', long = "output")]
    output: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    verbose: u8,
}

enum Target {
    File(PathBuf),
    Url(String),
}

impl Target {
    fn label(&self) -> String {
        match self {
            Target::File(path) => path.display().to_string(),
            Target::Url(url) => url.clone(),
        }
    }
}

/// Per-target outcome: the extraction or the rendered report text.
enum Outcome {
    Json(Extraction),
    Report(String),
}

/// One entry of the multi-target envelope.
#[derive(Debug, Serialize)]
struct TargetResult {
    target: String,
    ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    fields: Option<Record>,
    #[serde(skip_serializing_if = "Option::is_none")]
    errors: Option<Vec<EvalError>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    report: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl TargetResult {
    fn new(target: String, outcome: Result<Outcome>) -> Self {
        let mut result = Self {
            target,
            ok: outcome.is_ok(),
            fields: None,
            errors: None,
            report: None,
            error: None,
        };
        match outcome {
            Ok(Outcome::Json(extraction)) => {
                result.fields = Some(extraction.fields);
                result.errors = Some(extraction.errors);
            }
            Ok(Outcome::Report(text)) => result.report = Some(text),
            Err(err) => result.error = Some(format!("{:#}", err)),
        }
        result
    }
}

#[derive(Debug, Serialize)]
struct Envelope {
    results: Vec<TargetResult>,
    total: usize,
    failed: usize,
}

fn init_logging(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn unescape(separator: &str) -> String {
    separator.replace("\\n", "\n").replace("\\t", "\t")
}

async fn read_target(
    client: &reqwest::Client,
    target: &Target,
    opts: &FetchOptions,
) -> Result<String> {
    match target {
        Target::File(path) => {
            let bytes =
                fs::read(path).with_context(|| format!("reading {}", path.display()))?;
            Ok(decode_html(&bytes, None))
        }
        Target::Url(url) => Ok(fetch(client, url, opts).await?.text()),
    }
}

fn evaluate(
    engine: &Engine,
    config: &SelectorConfiguration,
    html: &str,
    format: Format,
    report: &ReportOptions,
) -> Result<Outcome> {
    let doc = Html::parse_document(html);
    match format {
        Format::Json => Ok(Outcome::Json(engine.evaluate(config, &doc)?)),
        Format::Report => Ok(Outcome::Report(render_report(engine, config, &doc, report)?)),
    }
}

fn to_json<T: Serialize>(value: &T, compact: bool) -> serde_json::Result<String> {
    if compact {
        serde_json::to_string(value)
    } else {
        serde_json::to_string_pretty(value)
    }
}

/// A single successful target prints its extraction; anything else prints
/// the envelope. Returns the text and the number of failed targets.
fn format_json(results: Vec<(String, Result<Outcome>)>, compact: bool) -> Result<(String, usize)> {
    if let [(_, Ok(Outcome::Json(extraction)))] = results.as_slice() {
        return Ok((to_json(extraction, compact)?, 0));
    }
    let total = results.len();
    let results: Vec<TargetResult> = results
        .into_iter()
        .map(|(target, outcome)| TargetResult::new(target, outcome))
        .collect();
    let failed = results.iter().filter(|r| !r.ok).count();
    let envelope = Envelope {
        results,
        total,
        failed,
    };
    Ok((to_json(&envelope, compact)?, failed))
}

fn format_report(results: Vec<(String, Result<Outcome>)>) -> Result<(String, usize)> {
    let single = results.len() == 1;
    let mut failed = 0;
    let mut sections = Vec::new();
    for (target, outcome) in results {
        match outcome {
            Ok(Outcome::Report(text)) if single => sections.push(text),
            Ok(Outcome::Report(text)) => sections.push(format!("=== {} ===\n\n{}", target, text)),
            Ok(Outcome::Json(extraction)) => sections.push(serde_json::to_string(&extraction)?),
            Err(err) => {
                failed += 1;
                eprintln!("error evaluating {}: {:#}", target, err);
            }
        }
    }
    Ok((sections.join("\n\n"), failed))
}

async fn run(args: Args) -> Result<bool> {
    let mut targets: Vec<Target> = args.html.iter().cloned().map(Target::File).collect();
    targets.extend(args.urls.iter().cloned().map(Target::Url));
    if targets.is_empty() {
        bail!("at least one --html file or URL is required");
    }

    let config = load(&args.config).context("loading selector configuration")?;
    info!(
        definitions = config.len(),
        name = config.name.as_deref().unwrap_or(""),
        "configuration loaded"
    );

    let mut builder = Engine::builder().strict(args.strict);
    if let Some(separator) = &args.separator {
        builder = builder.value_separator(unescape(separator));
    }
    let engine = builder.build();
    let report = ReportOptions {
        keep_newlines: !args.single_line,
    };
    let fetch_opts = FetchOptions {
        allow_private_networks: args.allow_private_networks,
        ..Default::default()
    };
    let client = reqwest::Client::builder()
        .user_agent(concat!("yamscrape/", env!("CARGO_PKG_VERSION")))
        .build()?;

    let mut results = Vec::with_capacity(targets.len());
    for target in &targets {
        let label = target.label();
        debug!(target = %label, "evaluating target");
        let outcome = match read_target(&client, target, &fetch_opts).await {
            Ok(html) => evaluate(&engine, &config, &html, args.format, &report),
            Err(err) => Err(err),
        };
        results.push((label, outcome));
    }

    let (output, failed) = match args.format {
        Format::Json => format_json(results, args.compact)?,
        Format::Report => format_report(results)?,
    };

    if let Some(path) = &args.output {
        fs::write(path, &output).with_context(|| format!("writing {}", path.display()))?;
    } else {
        println!("{}", output);
    }

    Ok(failed == 0)
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.verbose);

    match run(args).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(err) => {
            eprintln!("error: {:#}", err);
            ExitCode::from(1)
        }
    }
}
