use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use authorgraph::entity::{EntityDataClient, ENTITY_DATA_BASE};
use authorgraph::sparql::{WdqsClient, WDQS_ENDPOINT};
use authorgraph::types::AuthorRecord;
use authorgraph::{enrich, io, resolve, words};

#[derive(Parser)]
#[command(
    name = "authorgraph",
    version,
    about = "Resolve corpus author names against Wikidata and enrich them with biographical places"
)]
struct Cli {
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// Collect per-author document metadata (optionally with word counts) by publication year
    Words {
        infile: PathBuf,
        outfile: PathBuf,
        data_dir: PathBuf,
        #[arg(long, short = 's', default_value_t = 0)]
        start: i32,
        #[arg(long, short = 'e', default_value_t = 3000)]
        end: i32,
        /// Copy word counts into the output instead of recording side-file paths
        #[arg(long, short = 'w')]
        words: bool,
    },
    /// Search the knowledge base for candidate entities per author
    Search {
        infile: PathBuf,
        outfile: PathBuf,
        /// Attempts per query against the query service
        #[arg(long, default_value_t = 5)]
        max_retries: u32,
        /// Queries per second against the query service
        #[arg(long, default_value_t = 5)]
        qps: u32,
        /// Per-request timeout in milliseconds
        #[arg(long, default_value_t = 30_000)]
        timeout_ms: u64,
    },
    /// Disambiguate candidates and fetch biographical facts
    Enrich {
        infile: PathBuf,
        outfile: PathBuf,
        /// Per-request timeout in milliseconds
        #[arg(long, default_value_t = 30_000)]
        timeout_ms: u64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "authorgraph=info".into()),
        )
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Cmd::Words { infile, outfile, data_dir, start, end, words: load } => {
            let by_author = words::collect_words(&infile, &data_dir, start, end, load)?;
            io::write_json(&outfile, &by_author)?;
        }
        Cmd::Search { infile, outfile, max_retries, qps, timeout_ms } => {
            let docs: BTreeMap<String, serde_json::Value> = io::read_json(&infile)?;
            let client = WdqsClient::new(WDQS_ENDPOINT, max_retries, qps, timeout_ms)?;
            let records =
                resolve::search_authors(&client, docs.keys().map(String::as_str)).await;
            io::write_json(&outfile, &records)?;
        }
        Cmd::Enrich { infile, outfile, timeout_ms } => {
            let records: BTreeMap<String, AuthorRecord> = io::read_json(&infile)?;
            let client = EntityDataClient::new(ENTITY_DATA_BASE, timeout_ms)?;
            let enriched = enrich::enrich_authors(&client, &records).await;
            io::write_json(&outfile, &enriched)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_flags_belong_to_the_remote_stages() {
        let cli = Cli::try_parse_from([
            "authorgraph", "search", "in.json", "out.json", "--max-retries", "3", "--qps", "1",
        ])
        .unwrap();
        let Cmd::Search { max_retries, qps, .. } = cli.cmd else {
            panic!("expected search subcommand");
        };
        assert_eq!(max_retries, 3);
        assert_eq!(qps, 1);

        assert!(Cli::try_parse_from([
            "authorgraph", "enrich", "in.json", "out.json", "--timeout-ms", "5000",
        ])
        .is_ok());

        // words is file-only and takes no transport flags
        assert!(Cli::try_parse_from([
            "authorgraph", "words", "in.csv", "out.json", "data", "--max-retries", "3",
        ])
        .is_err());
    }
}
