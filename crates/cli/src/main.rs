use std::path::{Path, PathBuf};
use std::process;

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use parspec_core::fill::apply_json;
use parspec_core::xml::to_xml;
use parspec_core::{Config, LoadError, LoadOptions, LoadReport, Policy, Registry, SchemaNode};
use tracing_subscriber::EnvFilter;

/// Output format for CLI responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    Text,
    Json,
}

/// Policy override for load problems.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum PolicyArg {
    Raise,
    Warn,
    Ignore,
}

impl From<PolicyArg> for Policy {
    fn from(p: PolicyArg) -> Self {
        match p {
            PolicyArg::Raise => Policy::Raise,
            PolicyArg::Warn => Policy::Warn,
            PolicyArg::Ignore => Policy::Ignore,
        }
    }
}

/// Input spec schema tool.
#[derive(Parser)]
#[command(
    name = "parspec",
    version,
    about = "Read input specs from source comments and build parameter lists"
)]
struct Cli {
    /// Output format (text or json)
    #[arg(long, global = true, default_value = "text", value_enum)]
    output: OutputFormat,

    /// Suppress non-essential output
    #[arg(long, global = true)]
    quiet: bool,

    /// More log output (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    /// Configuration file with extra source roots and load options
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// What to do with files that fail to load
    #[arg(long, global = true, value_enum)]
    on_error: Option<PolicyArg>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List every registered spec name
    List {
        /// Source directories or files
        sources: Vec<PathBuf>,
    },

    /// Load sources and report every problem
    Check {
        /// Source directories or files
        sources: Vec<PathBuf>,
    },

    /// Show the parameters of a spec
    Explain {
        /// Source directory or file
        source: PathBuf,
        /// Spec name, e.g. `main-spec` or `observation-spec-list`
        spec: String,
    },

    /// Fill a spec from JSON values and write ParameterList XML
    Build {
        /// Source directory or file
        source: PathBuf,
        /// Spec name of the top-level list
        spec: String,
        /// JSON file with the parameter values
        #[arg(long)]
        values: PathBuf,
        /// Name of the top-level ParameterList
        #[arg(long, default_value = "main")]
        name: String,
        /// Write XML here instead of stdout
        #[arg(short = 'o', long = "out")]
        out: Option<PathBuf>,
        /// Fail (exit 2) instead of writing an incomplete list
        #[arg(long)]
        strict: bool,
    },
}

/// Shared settings for every subcommand.
struct Context {
    output: OutputFormat,
    quiet: bool,
    options: LoadOptions,
    extra_sources: Vec<PathBuf>,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = match &cli.config {
        Some(path) => match Config::read(path) {
            Ok(c) => c,
            Err(e) => {
                report_error(&e.to_string(), cli.output, cli.quiet);
                process::exit(1);
            }
        },
        None => Config::default(),
    };
    let mut options = config.load;
    if let Some(policy) = cli.on_error {
        options.on_error = policy.into();
    }
    let ctx = Context {
        output: cli.output,
        quiet: cli.quiet,
        options,
        extra_sources: config.sources,
    };

    match cli.command {
        Commands::List { sources } => cmd_list(&ctx, &sources),
        Commands::Check { sources } => cmd_check(&ctx, &sources),
        Commands::Explain { source, spec } => cmd_explain(&ctx, &source, &spec),
        Commands::Build {
            source,
            spec,
            values,
            name,
            out,
            strict,
        } => cmd_build(
            &ctx,
            &source,
            &spec,
            BuildArgs {
                values: &values,
                name: &name,
                out: out.as_deref(),
                strict,
            },
        ),
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Load `sources` plus the configured roots, exiting on a fatal load error.
fn load_or_exit(ctx: &Context, sources: &[PathBuf], options: &LoadOptions) -> (Registry, LoadReport) {
    let roots: Vec<&Path> = sources
        .iter()
        .chain(&ctx.extra_sources)
        .map(PathBuf::as_path)
        .collect();
    if roots.is_empty() {
        report_error(
            "no source directories given (pass one or set `sources` in the config)",
            ctx.output,
            ctx.quiet,
        );
        process::exit(1);
    }
    tracing::debug!(roots = roots.len(), "loading sources");
    match parspec_core::load(&roots, options) {
        Ok(loaded) => loaded,
        Err(e) => {
            report_load_error(&e, ctx.output, ctx.quiet);
            process::exit(1);
        }
    }
}

fn get_or_exit(ctx: &Context, registry: &Registry, spec: &str) -> SchemaNode {
    match registry.get(spec) {
        Ok(node) => node,
        Err(e) => {
            report_error(&e.to_string(), ctx.output, ctx.quiet);
            process::exit(1);
        }
    }
}

fn cmd_list(ctx: &Context, sources: &[PathBuf]) {
    let (registry, _) = load_or_exit(ctx, sources, &ctx.options);
    let names = registry.names();
    match ctx.output {
        OutputFormat::Json => print_json(&serde_json::json!(names)),
        OutputFormat::Text => {
            for name in names {
                println!("{}", name);
            }
        }
    }
}

fn cmd_check(ctx: &Context, sources: &[PathBuf]) {
    // Collect everything and print it below; only a missing root aborts.
    let options = LoadOptions {
        on_error: Policy::Ignore,
        ..ctx.options.clone()
    };
    let (_, report) = load_or_exit(ctx, sources, &options);
    let problems: Vec<&LoadError> = report.skipped.iter().chain(&report.unresolved).collect();

    match ctx.output {
        OutputFormat::Json => match serde_json::to_value(&report) {
            Ok(v) => print_json(&v),
            Err(e) => report_error(&format!("serialization error: {}", e), ctx.output, false),
        },
        OutputFormat::Text => {
            for p in &problems {
                eprintln!("{}", p);
            }
            if !ctx.quiet {
                println!(
                    "{} files, {} specs, {} problems",
                    report.files_read,
                    report.specs,
                    problems.len()
                );
            }
        }
    }
    if !problems.is_empty() {
        process::exit(1);
    }
}

fn cmd_explain(ctx: &Context, source: &Path, spec: &str) {
    let (registry, _) = load_or_exit(ctx, &[source.to_path_buf()], &ctx.options);
    let node = get_or_exit(ctx, &registry, spec);
    match ctx.output {
        OutputFormat::Text => println!("{}", node),
        OutputFormat::Json => print_json(&summary(spec, &node)),
    }
}

struct BuildArgs<'a> {
    values: &'a Path,
    name: &'a str,
    out: Option<&'a Path>,
    strict: bool,
}

fn cmd_build(ctx: &Context, source: &Path, spec: &str, args: BuildArgs<'_>) {
    let values = match read_json(args.values) {
        Ok(v) => v,
        Err(msg) => {
            report_error(&msg, ctx.output, ctx.quiet);
            process::exit(1);
        }
    };

    let (registry, _) = load_or_exit(ctx, &[source.to_path_buf()], &ctx.options);
    let mut node = get_or_exit(ctx, &registry, spec);
    if let Err(e) = apply_json(&mut node, &values) {
        report_error(&e.to_string(), ctx.output, ctx.quiet);
        process::exit(1);
    }

    if !node.is_complete() {
        warn_incomplete(ctx, spec, &node);
        if args.strict {
            process::exit(2);
        }
    }

    let xml = match to_xml(args.name, &node) {
        Ok(x) => x,
        Err(e) => {
            report_error(&e.to_string(), ctx.output, ctx.quiet);
            process::exit(1);
        }
    };
    match args.out {
        Some(path) => {
            if let Err(e) = std::fs::write(path, xml) {
                let msg = format!("error writing '{}': {}", path.display(), e);
                report_error(&msg, ctx.output, ctx.quiet);
                process::exit(1);
            }
        }
        None => print!("{}", xml),
    }
}

fn warn_incomplete(ctx: &Context, spec: &str, node: &SchemaNode) {
    if ctx.quiet {
        return;
    }
    match ctx.output {
        OutputFormat::Json => eprintln!("{}", summary(spec, node)),
        OutputFormat::Text => {
            eprintln!("warning: {} is incomplete", spec);
            for p in node.unfilled() {
                eprintln!("  unfilled: {}", p.name());
            }
            for open in node.open_alternations() {
                let at = if open.path.is_empty() {
                    spec.to_owned()
                } else {
                    open.path.join("/")
                };
                let choice = serde_json::to_string(&open.choice).unwrap_or_default();
                eprintln!("  open at {}: {}", at, choice);
            }
        }
    }
}

/// Machine-readable state of an instance.
fn summary(spec: &str, node: &SchemaNode) -> serde_json::Value {
    let names = |params: Vec<&parspec_core::Parameter>| -> Vec<String> {
        params.iter().map(|p| p.name().to_owned()).collect()
    };
    serde_json::json!({
        "spec": spec,
        "complete": node.is_complete(),
        "parameters": names(node.parameters()),
        "unfilled": names(node.unfilled()),
        "optional": names(node.optional()),
        "open": node.open_alternations(),
    })
}

fn read_json(path: &Path) -> Result<serde_json::Value, String> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| format!("error reading file '{}': {}", path.display(), e))?;
    serde_json::from_str(&text)
        .map_err(|e| format!("error parsing JSON in '{}': {}", path.display(), e))
}

fn print_json(value: &serde_json::Value) {
    let pretty =
        serde_json::to_string_pretty(value).unwrap_or_else(|e| format!("serialization error: {}", e));
    println!("{}", pretty);
}

fn report_load_error(e: &LoadError, output: OutputFormat, quiet: bool) {
    if quiet {
        return;
    }
    match output {
        OutputFormat::Json => {
            let err_json = serde_json::to_string_pretty(&e.to_json_value())
                .unwrap_or_else(|_| format!("{{\"error\": \"{:?}\"}}", e));
            eprintln!("{}", err_json);
        }
        OutputFormat::Text => eprintln!("error: {}", e),
    }
}

pub(crate) fn report_error(msg: &str, output: OutputFormat, quiet: bool) {
    if quiet {
        return;
    }
    match output {
        OutputFormat::Text => eprintln!("error: {}", msg),
        OutputFormat::Json => {
            eprintln!("{}", serde_json::json!({ "error": msg }));
        }
    }
}
