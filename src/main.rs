//! poke - MySQL 慢查询日志转 JSON 行

use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use slowlog_poke::{
    FieldRuleEngine, MalformedFieldPolicy, ParseError, ParserConfig, QueryJoin, for_each_record,
};

/// Convert a MySQL slow query log into one JSON object per line
#[derive(Parser, Debug)]
#[command(name = "poke", version, about)]
struct Cli {
    /// Slow query log to read (standard input when omitted)
    #[arg(short = 'f', long = "file", value_name = "PATH")]
    file: Option<PathBuf>,

    /// Skip metadata values that fail to convert instead of aborting
    #[arg(long)]
    skip_malformed: bool,

    /// Join multi-line queries with a newline instead of nothing
    #[arg(long)]
    preserve_newlines: bool,

    /// Enable verbose output
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn parser_config(&self) -> ParserConfig {
        let mut config = ParserConfig::default();
        if self.skip_malformed {
            config = config.with_malformed_field(MalformedFieldPolicy::Skip);
        }
        if self.preserve_newlines {
            config = config.with_query_join(QueryJoin::Newline);
        }
        config
    }

    fn input(&self) -> Result<Box<dyn BufRead>> {
        match &self.file {
            Some(path) => {
                let file = File::open(path)
                    .with_context(|| format!("can't open file: {}", path.display()))?;
                Ok(Box::new(BufReader::with_capacity(256 * 1024, file)))
            }
            None => Ok(Box::new(io::stdin().lock())),
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // 日志写到 stderr，stdout 只输出 JSON 行
    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .with_writer(io::stderr)
        .init();

    let engine = FieldRuleEngine::new(&cli.parser_config()).context("invalid field rules")?;
    let input = cli.input()?;

    let mut out = io::stdout().lock();
    let stats = for_each_record(input, &engine, |record| {
        serde_json::to_writer(&mut out, &record)?;
        out.write_all(b"\n")
            .map_err(|e| ParseError::SerializeError(e.to_string()))
    })
    .context("can't process slow query log")?;
    out.flush().context("can't write output")?;

    info!(
        boundaries = stats.boundaries,
        finalized = stats.finalized,
        emitted = stats.emitted,
        dropped = stats.dropped,
        "done"
    );
    Ok(())
}
