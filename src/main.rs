//! Thin CLI over the brute-forcing engine.
//!
//! Argument surface mirrors the classic brute tools: a target URL template,
//! one of `--user`/`--user-list`, a required `--password-list`, exactly one
//! match rule, and an optional auth strategy. Interrupted runs exit with
//! code 99 so wrapping scripts can tell a forced stop from completion.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{ArgAction, ArgGroup, Parser};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use picklock::config::{resolve_headers, RunConfig, DEFAULT_TIMEOUT_MS};
use picklock::{
    wordlist, AuthStrategy, Coordinator, HttpMethod, MatchRule, Outcome, ReqwestHttpClient, Report,
    Result,
};

/// Exit code for an operator-interrupted run.
const EXIT_INTERRUPTED: i32 = 99;

#[derive(Parser, Debug)]
#[command(author, version, about = "HTTP credential brute-forcing engine")]
#[command(group(ArgGroup::new("users").required(true).args(["user", "user_list"])))]
#[command(group(
    ArgGroup::new("expected")
        .required(true)
        .args(["expected_codes", "expected_response", "no_expected_response"])
))]
#[command(group(ArgGroup::new("auth").args(["auth_basic", "auth_digest", "auth_ntlm"])))]
struct Args {
    /// Target URL, may contain {{Username}} and {{Password}} placeholders
    #[arg(long)]
    target: String,

    /// Username(s), repeatable
    #[arg(short = 'u', long = "user", action = ArgAction::Append)]
    user: Vec<String>,

    /// File with one username per line
    #[arg(long)]
    user_list: Option<PathBuf>,

    /// File with one password per line
    #[arg(long)]
    password_list: PathBuf,

    /// Status code(s) that signal a successful login
    #[arg(long, num_args = 1.., value_name = "CODE")]
    expected_codes: Vec<u16>,

    /// Substring the response body contains on success
    #[arg(long)]
    expected_response: Option<String>,

    /// Substring the response body must NOT contain on success
    #[arg(long)]
    no_expected_response: Option<String>,

    /// Request type
    #[arg(short, long, default_value = "GET")]
    method: String,

    /// Custom header(s) as "Key: value", repeatable
    #[arg(short = 'H', long = "header", action = ArgAction::Append)]
    headers: Vec<String>,

    /// Number of worker tasks
    #[arg(short, long, default_value_t = 1)]
    threads: usize,

    /// Proxy URL for all requests
    #[arg(short, long)]
    proxy: Option<String>,

    /// HTTP POST data template
    #[arg(short = 'd', long = "data")]
    data: Option<String>,

    /// Basic HTTP authentication
    #[arg(long)]
    auth_basic: bool,

    /// Digest access authentication
    #[arg(long)]
    auth_digest: bool,

    /// NTLM authentication
    #[arg(long)]
    auth_ntlm: bool,

    /// Per-request timeout in milliseconds
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_MS)]
    timeout_ms: u64,

    /// Increase verbosity (-v per-attempt lines, -vv engine internals)
    #[arg(short = 'v', action = ArgAction::Count)]
    verbose: u8,
}

impl Args {
    fn match_rule(&self) -> MatchRule {
        // clap enforces that exactly one of the three is present.
        if !self.expected_codes.is_empty() {
            MatchRule::ExpectedCodes(self.expected_codes.clone())
        } else if let Some(needle) = &self.expected_response {
            MatchRule::ExpectedBodyContains(needle.clone())
        } else {
            MatchRule::ExpectedBodyNotContains(
                self.no_expected_response.clone().unwrap_or_default(),
            )
        }
    }

    fn auth_strategy(&self) -> AuthStrategy {
        if self.auth_basic {
            AuthStrategy::Basic
        } else if self.auth_digest {
            AuthStrategy::Digest
        } else if self.auth_ntlm {
            AuthStrategy::Ntlm
        } else {
            AuthStrategy::None
        }
    }
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "picklock=info",
        1 => "picklock=debug",
        _ => "picklock=trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(args: Args) -> Result<Report> {
    let usernames = match &args.user_list {
        Some(path) => wordlist::load(path)?,
        None => args.user.clone(),
    };
    wordlist::ensure_non_empty(&usernames, "username")?;

    let passwords = wordlist::load(&args.password_list)?;
    wordlist::ensure_non_empty(&passwords, "password")?;

    let method: HttpMethod = args.method.parse()?;
    let config = RunConfig {
        target: args.target.clone(),
        method,
        body: args.data.clone(),
        headers: resolve_headers(method, &args.headers)?,
        proxy: args.proxy.clone(),
        auth: args.auth_strategy(),
        threads: args.threads,
        rule: args.match_rule(),
        timeout_ms: args.timeout_ms,
        usernames,
        passwords,
    };
    config.validate()?;

    let client = ReqwestHttpClient::from_config(&config)?;
    let cancel = CancellationToken::new();

    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            interrupt.cancel();
        }
    });

    let mut coordinator = Coordinator::new(Arc::new(config), client);

    // Per-attempt progress lines only at -v and above.
    if args.verbose >= 1 {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        coordinator = coordinator.with_progress(tx);
        tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                match event.outcome {
                    Outcome::Match => {
                        println!("Success: {}:{}", event.username, event.password)
                    }
                    Outcome::NoMatch => {
                        println!("Failed: {}:{}", event.username, event.password)
                    }
                }
            }
        });
    }

    coordinator.run(cancel).await
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    init_tracing(args.verbose);

    match run(args).await {
        Ok(report) => {
            if !report.matches.is_empty() {
                println!("Total credentials: {}", report.matches.len());
                for credential in &report.matches {
                    println!("Success: {credential}");
                }
            }
            if report.interrupted {
                tracing::warn!("User interrupted execution");
                std::process::exit(EXIT_INTERRUPTED);
            }
        }
        Err(e) => {
            tracing::error!(error = %e, "Run failed");
            std::process::exit(1);
        }
    }
}
