//! Service Guard CLI.
//!
//! - `sg sign`: compute a request signature
//! - `sg verify`: check a signature (exit 1 on mismatch)
//! - `sg redact`: redact a JSON record against a schema

use clap::{Args, Parser, Subcommand, ValueEnum};
use sg_core::config::{load_config, GuardConfig, ResolvedConfig, SigningConfig};
use sg_core::exit_codes::ExitCode;
use sg_core::logging::{init_logging, LogConfig, LogFormat, LogLevel};
use sg_core::CliError;
use sg_redact::{record_from_json, record_to_json, redacted};
use sg_sign::{string_to_sign, Signer, SigningAttributes, SIGNED_HEADER_NAMES};
use std::io::Read;
use std::path::PathBuf;

/// Service Guard - request signing and log redaction
#[derive(Parser)]
#[command(name = "sg")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    global: GlobalOpts,
}

/// Global options available to all commands
#[derive(Args, Debug)]
struct GlobalOpts {
    /// Config file (overrides SG_CONFIG and the XDG location)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long, global = true)]
    log_level: Option<LogLevel>,

    /// Log format (human, jsonl)
    #[arg(long, global = true)]
    log_format: Option<LogFormat>,

    /// Output format
    #[arg(long, short = 'f', global = true, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute the signature of a request
    Sign(SignArgs),

    /// Verify the signature of a request
    Verify(VerifyArgs),

    /// Redact a JSON record using a schema document
    Redact(RedactArgs),
}

/// Request attributes bound into the signature
#[derive(Args, Debug)]
struct AttributeArgs {
    /// Request timestamp
    #[arg(long)]
    timestamp: Option<String>,

    /// API name (defaults to [signing].api_name)
    #[arg(long)]
    api_name: Option<String>,

    /// API version (defaults to [signing].api_version)
    #[arg(long)]
    api_version: Option<String>,

    /// Calling channel (defaults to [signing].channel)
    #[arg(long)]
    channel: Option<String>,

    /// Calling user id
    #[arg(long)]
    user_id: String,

    /// Request body
    #[arg(long, conflicts_with = "payload_file")]
    payload: Option<String>,

    /// Read the request body from a file
    #[arg(long)]
    payload_file: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct SignArgs {
    #[command(flatten)]
    attrs: AttributeArgs,
}

#[derive(Args, Debug)]
struct VerifyArgs {
    #[command(flatten)]
    attrs: AttributeArgs,

    /// Hex signature to check
    #[arg(long)]
    signature: String,
}

#[derive(Args, Debug)]
struct RedactArgs {
    /// Schema document (defaults to [schema].path)
    #[arg(long)]
    schema: Option<PathBuf>,

    /// Fully-qualified record type, e.g. bank.v1.Account
    #[arg(long = "type")]
    type_name: String,

    /// Input JSON file (stdin when omitted)
    #[arg(long)]
    input: Option<PathBuf>,
}

// ============================================================================
// Main entry point
// ============================================================================

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let code = match err.kind() {
                clap::error::ErrorKind::DisplayHelp | clap::error::ErrorKind::DisplayVersion => {
                    ExitCode::Clean
                }
                _ => ExitCode::ArgsError,
            };
            let _ = err.print();
            std::process::exit(code.as_i32());
        }
    };

    let resolved = load_config(cli.global.config.as_deref());

    let file_logging = resolved
        .as_ref()
        .map(|r| r.config.logging.clone())
        .unwrap_or_default();
    let mut base = LogConfig::default();
    if let Some(level) = file_logging.level {
        base.level = level;
    }
    if let Some(format) = file_logging.format {
        base.format = format;
    }
    let log_config = base.layered(
        |name| std::env::var(name).ok(),
        cli.global.log_level,
        cli.global.log_format,
    );
    init_logging(&log_config);

    let exit_code = match resolved {
        Ok(resolved) => run(&cli, &resolved),
        Err(err) => report(CliError::from(err)),
    };

    std::process::exit(exit_code.as_i32());
}

fn run(cli: &Cli, resolved: &ResolvedConfig) -> ExitCode {
    tracing::debug!(source = ?resolved.source, "running command");

    let result = match &cli.command {
        Commands::Sign(args) => run_sign(&cli.global, &resolved.config, args),
        Commands::Verify(args) => run_verify(&cli.global, &resolved.config, args),
        Commands::Redact(args) => run_redact(&cli.global, &resolved.config, args),
    };

    match result {
        Ok(code) => code,
        Err(err) => report(err),
    }
}

fn report(err: CliError) -> ExitCode {
    let code = err.exit_code();
    tracing::debug!(exit_code = %code, "command failed");
    eprintln!("sg: {}", err);
    code
}

// ============================================================================
// Command implementations
// ============================================================================

fn required(
    value: Option<&String>,
    fallback: Option<&String>,
    flag: &str,
) -> Result<String, CliError> {
    value.or(fallback).cloned().ok_or_else(|| {
        CliError::Args(format!("{} is required (flag or [signing] config)", flag))
    })
}

fn attributes(
    args: &AttributeArgs,
    signing: &SigningConfig,
    timestamp: String,
) -> Result<SigningAttributes, CliError> {
    Ok(SigningAttributes {
        timestamp,
        api_name: required(args.api_name.as_ref(), signing.api_name.as_ref(), "--api-name")?,
        api_version: required(
            args.api_version.as_ref(),
            signing.api_version.as_ref(),
            "--api-version",
        )?,
        channel: required(args.channel.as_ref(), signing.channel.as_ref(), "--channel")?,
        user_id: args.user_id.clone(),
    })
}

fn read_payload(args: &AttributeArgs) -> Result<Vec<u8>, CliError> {
    if let Some(path) = &args.payload_file {
        return std::fs::read(path).map_err(|source| CliError::Io {
            path: path.clone(),
            source,
        });
    }
    Ok(args.payload.clone().unwrap_or_default().into_bytes())
}

fn signer(signing: &SigningConfig) -> Result<Signer, CliError> {
    Ok(signing.signer()?)
}

fn run_sign(
    global: &GlobalOpts,
    config: &GuardConfig,
    args: &SignArgs,
) -> Result<ExitCode, CliError> {
    let timestamp = args
        .attrs
        .timestamp
        .clone()
        .unwrap_or_else(|| chrono::Utc::now().timestamp_millis().to_string());
    let attrs = attributes(&args.attrs, &config.signing, timestamp)?;
    let payload = read_payload(&args.attrs)?;
    let signer = signer(&config.signing)?;

    let signature = signer.sign(&attrs, &payload);
    tracing::debug!(
        api_name = %attrs.api_name,
        api_version = %attrs.api_version,
        payload_len = payload.len(),
        "request signed"
    );

    match global.format {
        OutputFormat::Text => println!("{}", signature),
        OutputFormat::Json => {
            let response = serde_json::json!({
                "signature": signature,
                "string_to_sign": string_to_sign(&attrs, &payload),
                "signed_headers": SIGNED_HEADER_NAMES,
                "timestamp": attrs.timestamp,
            });
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
    }
    Ok(ExitCode::Clean)
}

fn run_verify(
    global: &GlobalOpts,
    config: &GuardConfig,
    args: &VerifyArgs,
) -> Result<ExitCode, CliError> {
    let timestamp = args
        .attrs
        .timestamp
        .clone()
        .ok_or_else(|| CliError::Args("--timestamp is required for verify".to_string()))?;
    let attrs = attributes(&args.attrs, &config.signing, timestamp)?;
    let payload = read_payload(&args.attrs)?;
    let signer = signer(&config.signing)?;

    let valid = signer.verify(&attrs, &payload, &args.signature);
    if !valid {
        tracing::warn!(api_name = %attrs.api_name, "signature mismatch");
    }

    match global.format {
        OutputFormat::Text => println!("{}", if valid { "valid" } else { "invalid" }),
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string_pretty(&serde_json::json!({ "valid": valid }))?
            );
        }
    }

    Ok(if valid {
        ExitCode::Clean
    } else {
        ExitCode::VerifyFailed
    })
}

fn run_redact(
    global: &GlobalOpts,
    config: &GuardConfig,
    args: &RedactArgs,
) -> Result<ExitCode, CliError> {
    let schemas = config.schema.load(args.schema.as_deref())?;

    let input = match &args.input {
        Some(path) => std::fs::read_to_string(path).map_err(|source| CliError::Io {
            path: path.clone(),
            source,
        })?,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .map_err(|source| CliError::Io {
                    path: PathBuf::from("<stdin>"),
                    source,
                })?;
            buf
        }
    };

    let json: serde_json::Value = serde_json::from_str(&input)?;
    let record = record_from_json(&args.type_name, &json, &schemas)?;
    let out = redacted(&record, &schemas);

    for diagnostic in &out.report.diagnostics {
        tracing::warn!(
            record_type = %args.type_name,
            diagnostic = %diagnostic,
            "redaction policy not applied"
        );
    }
    tracing::debug!(
        cleared = out.report.cleared,
        masked = out.report.masked,
        "record redacted"
    );

    let rendered = record_to_json(&out.record, &schemas);
    match global.format {
        OutputFormat::Text => println!("{}", serde_json::to_string_pretty(&rendered)?),
        OutputFormat::Json => {
            let diagnostics: Vec<String> = out
                .report
                .diagnostics
                .iter()
                .map(ToString::to_string)
                .collect();
            let response = serde_json::json!({
                "record": rendered,
                "cleared": out.report.cleared,
                "masked": out.report.masked,
                "diagnostics": diagnostics,
            });
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
    }
    Ok(ExitCode::Clean)
}
