//! Purpose: `wikiquery` CLI entry point.
//! Exports: Binary entry (`main`) plus internal helpers for dispatch and output.
//! Role: Thin shell over the `api` client: parse args, build a transport, print JSON.
//! Invariants: Successful output is JSON on stdout; errors are JSON (or text on a TTY) on stderr.
//! Invariants: Exit codes come from `to_exit_code`; an interrupted drain is a notice, not an error.
#![allow(clippy::result_large_err)]

use std::io::{self, IsTerminal};
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use clap::error::ErrorKind as ClapErrorKind;
use clap::{CommandFactory, Parser, Subcommand, ValueEnum, ValueHint};
use clap_complete::aot::Shell;
use serde_json::{Map, Value, json};
use std::error::Error as StdError;
use tracing_subscriber::EnvFilter;

mod notice;

use notice::{Notice, interruption_notice, notice_json};
use wikiquery::api::{
    CancelToken, ClassifyContext, Continuation, DEFAULT_MAX_PAGES, DrainOptions, DrainOutcome,
    Error, ErrorKind, HttpTransport, Interruption, MergeMode, Method, Paged, Params, RawApiError,
    Request, TokenType, WikiClient, classify, to_exit_code,
};
use wikiquery::api::meta::{SiteInfoRequest, TokensRequest};
use wikiquery::api::queries::RawListQuery;

#[derive(Copy, Clone, Debug)]
struct RunOutcome {
    exit_code: i32,
}

impl RunOutcome {
    fn ok() -> Self {
        Self { exit_code: 0 }
    }

    fn with_code(exit_code: i32) -> Self {
        Self { exit_code }
    }
}

const CANCELLED_EXIT_CODE: i32 = 130;

#[derive(Parser, Debug)]
#[command(
    name = "wikiquery",
    version,
    about = "Typed client for a wiki's query/action API",
    long_about = None,
    after_help = r#"EXAMPLES
  $ wikiquery --api https://wiki.example/w/api.php list allpages apprefix=Rust
  $ wikiquery list categorymembers cmtitle=Category:Tools --drain --max-items 500
  $ wikiquery call parse page=Main_Page prop=text
  $ wikiquery classify badtoken "Invalid CSRF token." --token-type csrf"#,
    arg_required_else_help = true
)]
struct Cli {
    #[arg(
        long,
        global = true,
        env = "WIKIQUERY_API",
        help = "Full api.php endpoint URL",
        value_hint = ValueHint::Url
    )]
    api: Option<String>,
    #[arg(long, global = true, help = "User-Agent header sent with every request")]
    user_agent: Option<String>,
    #[arg(long, global = true, default_value_t = 30_000, help = "Per-request timeout in milliseconds")]
    timeout_ms: u64,
    #[arg(
        long,
        global = true,
        help = "PEM file with the CA certificates to trust",
        value_hint = ValueHint::FilePath
    )]
    tls_ca: Option<PathBuf>,
    #[arg(
        long,
        global = true,
        default_value = "auto",
        value_enum,
        help = "Colorize stderr diagnostics: auto|always|never"
    )]
    color: ColorMode,

    #[command(subcommand)]
    command: Command,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum ColorMode {
    Auto,
    Always,
    Never,
}

impl ColorMode {
    fn use_color(self, is_tty: bool) -> bool {
        match self {
            ColorMode::Auto => is_tty,
            ColorMode::Always => true,
            ColorMode::Never => false,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    #[command(about = "Fetch one page of a list/prop module, or drain it")]
    List {
        #[arg(help = "Module name, e.g. allpages or revisions")]
        module: String,
        #[arg(help = "Extra parameters as key=value", value_parser = parse_param)]
        params: Vec<(String, String)>,
        #[arg(long, help = "Parameter prefix (known modules default it)")]
        shortname: Option<String>,
        #[arg(long, help = "Treat the module as prop= (implied for info, linkshere, transcludedin, revisions)")]
        prop: bool,
        #[arg(long, help = "Follow continuations until the list is exhausted")]
        drain: bool,
        #[arg(long, default_value_t = DEFAULT_MAX_PAGES, help = "Stop a drain after this many pages")]
        max_pages: usize,
        #[arg(long, help = "Stop a drain once this many items are collected")]
        max_items: Option<usize>,
        #[arg(long, help = "Continuation handle JSON from a previous run")]
        resume: Option<String>,
    },
    #[command(about = "Dispatch any action with key=value parameters")]
    Call {
        action: String,
        #[arg(value_parser = parse_param)]
        params: Vec<(String, String)>,
        #[arg(long, help = "Send as a form POST")]
        post: bool,
    },
    #[command(about = "Fetch tokens (csrf by default)")]
    Tokens {
        #[arg(help = "Token types, e.g. csrf login watch")]
        types: Vec<String>,
    },
    #[command(about = "Fetch site information")]
    Siteinfo {
        #[arg(help = "siprop sections (default: general statistics)")]
        prop: Vec<String>,
    },
    #[command(about = "Classify an error code/info pair offline")]
    Classify {
        code: String,
        #[arg(default_value = "")]
        info: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        target: Option<String>,
        #[arg(long)]
        token_type: Option<String>,
        #[arg(long)]
        module: Option<String>,
        #[arg(long)]
        filename: Option<String>,
        #[arg(long, value_delimiter = ',', help = "Comma-separated error details")]
        details: Vec<String>,
    },
    #[command(about = "Generate shell completions")]
    Completion {
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn main() {
    let exit_code = match run() {
        Ok(outcome) => outcome.exit_code,
        Err((err, color_mode)) => {
            emit_error(&err, color_mode);
            to_exit_code(err.kind())
        }
    };
    std::process::exit(exit_code);
}

fn run() -> Result<RunOutcome, (Error, ColorMode)> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => match err.kind() {
            ClapErrorKind::DisplayHelp
            | ClapErrorKind::DisplayVersion
            | ClapErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => {
                err.print().map_err(|io_err| {
                    (
                        Error::new(ErrorKind::Internal)
                            .with_message("failed to write help")
                            .with_source(io_err),
                        ColorMode::Auto,
                    )
                })?;
                let exit_code = if matches!(
                    err.kind(),
                    ClapErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
                ) {
                    2
                } else {
                    0
                };
                return Ok(RunOutcome::with_code(exit_code));
            }
            _ => {
                return Err((
                    Error::new(ErrorKind::Usage)
                        .with_message(clap_error_summary(&err))
                        .with_hint("Try `wikiquery --help`."),
                    ColorMode::Auto,
                ));
            }
        },
    };

    init_tracing();
    let color_mode = cli.color;
    dispatch(cli).map_err(|err| (err, color_mode))
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(io::stderr)
        .try_init();
}

fn dispatch(cli: Cli) -> Result<RunOutcome, Error> {
    let color_mode = cli.color;
    match cli.command {
        Command::Completion { shell } => {
            let mut cmd = Cli::command();
            clap_complete::aot::generate(shell, &mut cmd, "wikiquery", &mut io::stdout());
            Ok(RunOutcome::ok())
        }
        Command::Classify {
            code,
            info,
            title,
            target,
            token_type,
            module,
            filename,
            details,
        } => {
            let token_type = token_type.as_deref().map(parse_token_type).transpose()?;
            let mut raw = RawApiError::new(code, info);
            if !details.is_empty() {
                raw = raw.with_extra("details", json!(details));
            }
            let ctx = ClassifyContext {
                title,
                target,
                token_type,
                module,
                filename,
            };
            let classified = classify(&raw, &ctx);
            emit_json(json!({"code": classified.code(), "error": classified}));
            Ok(RunOutcome::ok())
        }
        Command::List {
            module,
            params,
            shortname,
            prop,
            drain,
            max_pages,
            max_items,
            resume,
        } => {
            let client = WikiClient::new(http_transport(
                cli.api,
                cli.user_agent,
                cli.timeout_ms,
                cli.tls_ca,
            )?);
            let shortname = shortname
                .or_else(|| known_shortname(&module).map(str::to_string))
                .ok_or_else(|| {
                    Error::new(ErrorKind::Usage)
                        .with_message(format!("no known parameter prefix for module {module}"))
                        .with_hint("Pass --shortname, e.g. --shortname ap for allpages.")
                })?;
            let mut query = if prop || is_prop_module(&module) {
                RawListQuery::prop(&module, &shortname)
            } else {
                RawListQuery::list(&module, &shortname)
            };
            for (key, value) in params {
                query = query.with(&key, value);
            }
            let resume = resume.as_deref().map(parse_resume).transpose()?;

            let cancel = CancelToken::new();
            install_interrupt_handler(cancel.flag())?;
            let mut options = DrainOptions::default()
                .with_max_pages(max_pages)
                .with_cancel(cancel);
            if let Some(max_items) = max_items {
                options = options.with_max_items(max_items);
            }
            let mode = if drain {
                MergeMode::Drain
            } else {
                MergeMode::SinglePage
            };

            let paged = client.paginate(&query, mode, &options, resume.as_ref())?;
            let outcome = match &paged {
                Paged::Drained(DrainOutcome::Interrupted {
                    partial,
                    reason,
                    resume,
                }) => {
                    let notice = interruption_notice(
                        notice_time_now().unwrap_or_else(|| "unknown".to_string()),
                        &module,
                        *reason,
                        partial.pages,
                        partial.items.len(),
                        resume.as_ref(),
                    );
                    emit_notice(&notice, color_mode);
                    if *reason == Interruption::Cancelled {
                        RunOutcome::with_code(CANCELLED_EXIT_CODE)
                    } else {
                        RunOutcome::ok()
                    }
                }
                _ => RunOutcome::ok(),
            };
            emit_serialized(&paged)?;
            Ok(outcome)
        }
        Command::Call {
            action,
            params,
            post,
        } => {
            let client = WikiClient::new(http_transport(
                cli.api,
                cli.user_agent,
                cli.timeout_ms,
                cli.tls_ca,
            )?);
            let params: Params = std::iter::once(("action".to_string(), action))
                .chain(params)
                .collect();
            let method = if post { Method::Post } else { Method::Get };
            let request = Request::from_params(method, params)?;
            let payload = client.call(&request)?;
            emit_json(payload);
            Ok(RunOutcome::ok())
        }
        Command::Tokens { types } => {
            let client = WikiClient::new(http_transport(
                cli.api,
                cli.user_agent,
                cli.timeout_ms,
                cli.tls_ca,
            )?);
            let types = if types.is_empty() {
                vec![TokenType::Csrf]
            } else {
                types
                    .iter()
                    .map(|name| parse_token_type(name))
                    .collect::<Result<Vec<_>, _>>()?
            };
            let tokens = client.tokens(&TokensRequest::new(types))?;
            emit_serialized(&tokens)?;
            Ok(RunOutcome::ok())
        }
        Command::Siteinfo { prop } => {
            let client = WikiClient::new(http_transport(
                cli.api,
                cli.user_agent,
                cli.timeout_ms,
                cli.tls_ca,
            )?);
            let request = if prop.is_empty() {
                SiteInfoRequest::default()
            } else {
                SiteInfoRequest { prop }
            };
            let info = client.site_info(&request)?;
            emit_serialized(&info)?;
            Ok(RunOutcome::ok())
        }
    }
}

fn http_transport(
    api: Option<String>,
    user_agent: Option<String>,
    timeout_ms: u64,
    tls_ca: Option<PathBuf>,
) -> Result<HttpTransport, Error> {
    let api = api.ok_or_else(|| {
        Error::new(ErrorKind::Usage)
            .with_message("no api endpoint configured")
            .with_hint("Pass --api <url> or set WIKIQUERY_API.")
    })?;
    let mut transport =
        HttpTransport::new(api)?.with_timeout(Duration::from_millis(timeout_ms));
    if let Some(user_agent) = user_agent {
        transport = transport.with_user_agent(user_agent);
    }
    if let Some(path) = tls_ca {
        transport = transport.with_tls_ca_file(path)?;
    }
    Ok(transport)
}

fn install_interrupt_handler(flag: Arc<AtomicBool>) -> Result<(), Error> {
    signal_hook::flag::register(signal_hook::consts::SIGINT, flag)
        .map(|_| ())
        .map_err(|err| {
            Error::new(ErrorKind::Internal)
                .with_message("failed to install interrupt handler")
                .with_source(err)
        })
}

fn known_shortname(module: &str) -> Option<&'static str> {
    let prefix = match module {
        "allcategories" => "ac",
        "allimages" => "ai",
        "allpages" => "ap",
        "categorymembers" => "cm",
        "logevents" => "le",
        "recentchanges" => "rc",
        "usercontribs" => "uc",
        "users" => "us",
        "info" => "in",
        "linkshere" => "lh",
        "transcludedin" => "ti",
        "revisions" => "rv",
        _ => return None,
    };
    Some(prefix)
}

/// Modules whose items come back under `query.pages` and are requested as `prop=`.
fn is_prop_module(module: &str) -> bool {
    matches!(module, "info" | "linkshere" | "transcludedin" | "revisions")
}

fn parse_param(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected key=value, got {raw:?}")),
    }
}

fn parse_token_type(raw: &str) -> Result<TokenType, Error> {
    TokenType::parse(raw).ok_or_else(|| {
        let known: Vec<&str> = TokenType::ALL.iter().map(|t| t.as_str()).collect();
        Error::new(ErrorKind::Usage)
            .with_message(format!("unknown token type {raw}"))
            .with_hint(format!("Known types: {}.", known.join(", ")))
    })
}

fn parse_resume(raw: &str) -> Result<Continuation, Error> {
    serde_json::from_str(raw).map_err(|err| {
        Error::new(ErrorKind::Usage)
            .with_message("--resume is not a continuation handle")
            .with_hint("Pass the `resume` object printed by an interrupted drain, or a page's `continue` object.")
            .with_source(err)
    })
}

fn emit_json(value: Value) {
    let json = serde_json::to_string(&value)
        .unwrap_or_else(|_| "{\"error\":\"json encode failed\"}".to_string());
    println!("{json}");
}

fn emit_serialized<T: serde::Serialize>(value: &T) -> Result<(), Error> {
    let value = serde_json::to_value(value).map_err(|err| {
        Error::new(ErrorKind::Internal)
            .with_message("failed to encode output json")
            .with_source(err)
    })?;
    emit_json(value);
    Ok(())
}

#[derive(Copy, Clone)]
enum AnsiColor {
    Red,
    Yellow,
}

fn colorize_label(label: &str, enabled: bool, color: AnsiColor) -> String {
    if !enabled {
        return label.to_string();
    }
    let code = match color {
        AnsiColor::Red => "31",
        AnsiColor::Yellow => "33",
    };
    format!("\u{1b}[{code}m{label}\u{1b}[0m")
}

fn emit_error(err: &Error, color_mode: ColorMode) {
    let is_tty = io::stderr().is_terminal();
    if is_tty {
        eprintln!("{}", error_text(err, color_mode.use_color(is_tty)));
        return;
    }

    let value = error_json(err);
    let json = serde_json::to_string(&value).unwrap_or_else(|_| {
        "{\"error\":{\"kind\":\"Internal\",\"message\":\"json encode failed\"}}".to_string()
    });
    eprintln!("{json}");
}

fn notice_time_now() -> Option<String> {
    use time::format_description::well_known::Rfc3339;
    let duration = SystemTime::now().duration_since(UNIX_EPOCH).ok()?;
    let ts = time::OffsetDateTime::from_unix_timestamp_nanos(duration.as_nanos() as i128).ok()?;
    ts.format(&Rfc3339).ok()
}

fn emit_notice(notice: &Notice, color_mode: ColorMode) {
    let is_tty = io::stderr().is_terminal();
    if is_tty {
        let label = colorize_label("notice:", color_mode.use_color(is_tty), AnsiColor::Yellow);
        eprintln!("{label} {} (module: {})", notice.message, notice.module);
        return;
    }

    let value = notice_json(notice);
    let json = serde_json::to_string(&value).unwrap_or_else(|_| {
        "{\"notice\":{\"kind\":\"Internal\",\"message\":\"json encode failed\"}}".to_string()
    });
    eprintln!("{json}");
}

fn error_message(err: &Error) -> String {
    if let Some(message) = err.message() {
        return message.to_string();
    }
    match err.kind() {
        ErrorKind::Internal => "internal error".to_string(),
        ErrorKind::Usage => "usage error".to_string(),
        ErrorKind::InvalidRequest => "invalid request".to_string(),
        ErrorKind::Api => "api error".to_string(),
        ErrorKind::Transport => "transport failure".to_string(),
        ErrorKind::Decode => "unexpected response shape".to_string(),
    }
}

fn error_causes(err: &Error) -> Vec<String> {
    let mut causes = Vec::new();
    let mut cur = err.source();
    while let Some(source) = cur {
        causes.push(source.to_string());
        cur = source.source();
    }
    causes
}

fn error_json(err: &Error) -> Value {
    let mut inner = Map::new();
    inner.insert("kind".to_string(), json!(format!("{:?}", err.kind())));
    inner.insert("message".to_string(), json!(error_message(err)));
    if let Some(hint) = err.hint() {
        inner.insert("hint".to_string(), json!(hint));
    }
    if let Some(status) = err.status() {
        inner.insert("status".to_string(), json!(status));
    }
    if let Some(api) = err.api_error() {
        inner.insert("code".to_string(), json!(api.code()));
        if let Ok(value) = serde_json::to_value(api) {
            inner.insert("api".to_string(), value);
        }
    }
    let causes = error_causes(err);
    if !causes.is_empty() {
        inner.insert("causes".to_string(), json!(causes));
    }

    let mut outer = Map::new();
    outer.insert("error".to_string(), Value::Object(inner));
    Value::Object(outer)
}

fn error_text(err: &Error, use_color: bool) -> String {
    let mut lines = Vec::new();
    lines.push(format!(
        "{} {}",
        colorize_label("error:", use_color, AnsiColor::Red),
        error_message(err)
    ));
    if let Some(hint) = err.hint() {
        lines.push(format!(
            "{} {hint}",
            colorize_label("hint:", use_color, AnsiColor::Yellow)
        ));
    }
    for cause in error_causes(err) {
        lines.push(format!("  caused by: {cause}"));
    }
    lines.join("\n")
}

fn clap_error_summary(err: &clap::Error) -> String {
    for line in err.to_string().lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if let Some(rest) = trimmed.strip_prefix("error:") {
            return rest.trim().to_string();
        }
        return trimmed.to_string();
    }
    "invalid arguments".to_string()
}
