use anyhow::{Context, Result};
use chrono::{SecondsFormat, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use joltgen_core::{
    apply_overrides, classify, enhance_with_defaults, filter_empty_operations, generate,
    parse_operations, Field, FieldOverride, GenerateOptions, GenerateRequest, ParsedRequest,
    RequestTarget,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::level_filters::LevelFilter;

#[derive(Parser)]
#[command(name = "joltgen")]
#[command(about = "Generate JOLT transform specifications for USSD API templates")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify a parsed request into mappable fields
    Classify {
        /// Parsed request JSON file
        input: PathBuf,

        /// Field overrides to apply after classification
        #[arg(long)]
        overrides: Option<PathBuf>,

        /// Output file (defaults to stdout if not specified)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Pretty)]
        format: OutputFormat,
    },

    /// Generate request, form-body, response and session specs
    Generate {
        /// Generate request JSON file
        input: PathBuf,

        /// Output file (defaults to stdout if not specified)
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        defaults: DefaultArgs,

        /// Do not nest response source paths under `input`
        #[arg(long)]
        no_response_input: bool,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Pretty)]
        format: OutputFormat,
    },

    /// Drop operations that would have no effect
    Filter {
        /// Operation list JSON file
        input: PathBuf,

        /// Output file (defaults to stdout if not specified)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Pretty)]
        format: OutputFormat,
    },

    /// Add defaults for every shift target of an operation list
    Enhance {
        /// Operation list JSON file
        input: PathBuf,

        /// Output file (defaults to stdout if not specified)
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        defaults: DefaultArgs,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Pretty)]
        format: OutputFormat,
    },
}

/// Auto-default settings shared by `generate` and `enhance`.
#[derive(clap::Args)]
struct DefaultArgs {
    /// Timestamp for response outcome blocks (`now` for the current UTC time)
    #[arg(long)]
    timestamp: Option<String>,

    /// Do not add defaults for response shift targets
    #[arg(long)]
    no_auto_default: bool,

    /// Default written for scalar targets
    #[arg(long)]
    default_value: Option<String>,

    /// Default element written for array targets (`name[]`)
    #[arg(long)]
    array_default: Option<String>,
}

impl DefaultArgs {
    fn into_options(self) -> GenerateOptions {
        let base = GenerateOptions::default();
        GenerateOptions {
            auto_default: !self.no_auto_default,
            default_value: self.default_value.unwrap_or(base.default_value),
            array_default_value: self.array_default.unwrap_or(base.array_default_value),
            wrap_response_input: base.wrap_response_input,
            timestamp: self.timestamp.map(|ts| resolve_timestamp(&ts)),
        }
    }
}

fn resolve_timestamp(raw: &str) -> String {
    if raw.eq_ignore_ascii_case("now") {
        Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
    } else {
        raw.to_string()
    }
}

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
enum OutputFormat {
    Pretty,
    Compact,
}

/// Output of `classify`.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Classification {
    request_target: RequestTarget,
    fields: Vec<Field>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so stdout stays clean for JSON
    let log_level = if cli.verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::WARN
    };
    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Classify {
            input,
            overrides,
            output,
            format,
        } => {
            let request: ParsedRequest = read_json(&input, "parsed request")?;

            let mut fields = classify(&request)
                .map_err(|e| anyhow::Error::from(e).context("Classification failed"))?;
            if let Some(path) = overrides {
                let edits: Vec<FieldOverride> = read_json(&path, "overrides")?;
                apply_overrides(&mut fields, &edits);
            }
            let request_target = RequestTarget::from_request(&request)
                .map_err(|e| anyhow::Error::from(e).context("Invalid request target"))?;

            write_json(
                &Classification {
                    request_target,
                    fields,
                },
                output.as_ref(),
                format,
            )?;
        }
        Commands::Generate {
            input,
            output,
            defaults,
            no_response_input,
            format,
        } => {
            let request: GenerateRequest = read_json(&input, "generate request")?;

            let options = GenerateOptions {
                wrap_response_input: !no_response_input,
                ..defaults.into_options()
            };

            let specs = generate(&request, &options)
                .map_err(|e| anyhow::Error::from(e).context("Generation failed"))?;

            write_json(&specs, output.as_ref(), format)?;
        }
        Commands::Filter {
            input,
            output,
            format,
        } => {
            let raw: serde_json::Value = read_json(&input, "operations")?;
            let ops = parse_operations(raw)
                .map_err(|e| anyhow::Error::from(e).context("Invalid operation list"))?;

            write_json(&filter_empty_operations(ops), output.as_ref(), format)?;
        }
        Commands::Enhance {
            input,
            output,
            defaults,
            format,
        } => {
            let raw: serde_json::Value = read_json(&input, "operations")?;
            let ops = parse_operations(raw)
                .map_err(|e| anyhow::Error::from(e).context("Invalid operation list"))?;

            let enhanced = enhance_with_defaults(ops, &defaults.into_options())
                .map_err(|e| anyhow::Error::from(e).context("Enhancement failed"))?;

            write_json(&enhanced, output.as_ref(), format)?;
        }
    }

    Ok(())
}

fn read_json<T: DeserializeOwned>(path: &Path, what: &str) -> Result<T> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open {what} file: {}", path.display()))?;
    let reader = BufReader::new(file);
    serde_json::from_reader(reader)
        .with_context(|| format!("Failed to parse {what} from: {}", path.display()))
}

fn write_json<T: serde::Serialize>(
    val: &T,
    path: Option<&PathBuf>,
    format: OutputFormat,
) -> Result<()> {
    let mut writer: Box<dyn Write> = if let Some(p) = path {
        let file = File::create(p)
            .with_context(|| format!("Failed to create output file: {}", p.display()))?;
        Box::new(BufWriter::new(file))
    } else {
        Box::new(BufWriter::new(io::stdout()))
    };

    match format {
        OutputFormat::Pretty => {
            serde_json::to_writer_pretty(&mut writer, val).context("Failed to write JSON")?;
        }
        OutputFormat::Compact => {
            serde_json::to_writer(&mut writer, val).context("Failed to write JSON")?;
        }
    }

    // Ensure trailing newline
    writeln!(writer).context("Failed to write trailing newline")?;
    writer.flush().context("Failed to flush output")?;

    Ok(())
}
