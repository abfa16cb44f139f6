//! Command-line front end: parses `XPath` expressions and prints their trees.
//!
//! Expressions come from the command line, or one per line from stdin when
//! none are given.

use std::io::{self, BufRead};
use std::process::ExitCode;
use std::time::Instant;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use xpathoxide::xpath::cache::DEFAULT_CACHE_CAPACITY;
use xpathoxide::xpath::{ParseCache, ParseOptions};

const EXIT_SUCCESS: u8 = 0;
const EXIT_PARSE_ERROR: u8 = 1;

// ---------------------------------------------------------------------------
// CLI argument definitions
// ---------------------------------------------------------------------------

/// xpath-ast -- parse `XPath` 1.0 expressions and print their syntax trees.
#[derive(Parser, Debug)]
#[command(name = "xpath-ast", version, about, long_about = None)]
struct Cli {
    /// Expressions to parse. Reads one expression per line from stdin when
    /// omitted.
    expressions: Vec<String>,

    /// Print the Rust debug representation instead of an S-expression.
    #[arg(long)]
    debug: bool,

    /// Maximum nesting depth accepted by the parser.
    #[arg(long, value_name = "N")]
    max_depth: Option<u32>,

    /// Maximum height of a parsed tree.
    #[arg(long, value_name = "N")]
    max_tree_depth: Option<u32>,

    /// Print parse timings.
    #[arg(long)]
    timing: bool,

    /// Log at info level (overridden by `RUST_LOG`).
    #[arg(long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut options = ParseOptions::default();
    if let Some(max) = cli.max_depth {
        options = options.max_depth(max);
    }
    if let Some(max) = cli.max_tree_depth {
        options = options.max_tree_depth(max);
    }
    let cache = ParseCache::with_options(DEFAULT_CACHE_CAPACITY, options);

    let mut worst_exit = EXIT_SUCCESS;
    if cli.expressions.is_empty() {
        for line in io::stdin().lock().lines() {
            let expression = match line {
                Ok(line) => line,
                Err(e) => {
                    eprintln!("error: failed to read stdin: {e}");
                    return ExitCode::from(EXIT_PARSE_ERROR);
                }
            };
            worst_exit = worst_exit.max(process_expression(&cli, &cache, &expression));
        }
    } else {
        for expression in &cli.expressions {
            worst_exit = worst_exit.max(process_expression(&cli, &cache, expression));
        }
    }

    ExitCode::from(worst_exit)
}

fn init_tracing(verbose: bool) {
    let filter = log_filter(verbose, std::env::var(EnvFilter::DEFAULT_ENV).ok());
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

/// `RUST_LOG` directives when set and valid, otherwise `warn` (`info` when
/// verbose).
fn log_filter(verbose: bool, directives: Option<String>) -> EnvFilter {
    directives
        .filter(|directives| !directives.trim().is_empty())
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(if verbose { "info" } else { "warn" }))
}

/// Parses one expression, prints the result, and returns an exit code.
fn process_expression(cli: &Cli, cache: &ParseCache, expression: &str) -> u8 {
    let start = Instant::now();
    let result = cache.get_or_parse(expression);

    if cli.timing {
        eprintln!("Parsing {expression:?} took {:?}", start.elapsed());
    }

    match result {
        Ok(Some(tree)) => {
            info!(expression, "parsed");
            if cli.debug {
                println!("{tree:#?}");
            } else {
                println!("{tree}");
            }
            EXIT_SUCCESS
        }
        Ok(None) => {
            println!("()");
            EXIT_SUCCESS
        }
        Err(e) => {
            eprintln!("error: {expression}: {e}");
            EXIT_PARSE_ERROR
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing::level_filters::LevelFilter;

    #[test]
    fn test_rust_log_overrides_default_level() {
        let filter = log_filter(false, Some("debug".to_string()));
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::DEBUG));

        let filter = log_filter(true, Some("error".to_string()));
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::ERROR));
    }

    #[test]
    fn test_default_level_without_rust_log() {
        assert_eq!(log_filter(false, None).max_level_hint(), Some(LevelFilter::WARN));
        assert_eq!(log_filter(true, None).max_level_hint(), Some(LevelFilter::INFO));
        assert_eq!(
            log_filter(true, Some("  ".to_string())).max_level_hint(),
            Some(LevelFilter::INFO)
        );
    }
}
