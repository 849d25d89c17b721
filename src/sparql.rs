//! Client for the knowledge base's SPARQL query service: two query forms
//! (exact entity search and free-text label search), bounded retries, and
//! rate limiting to stay polite against the public endpoint.

use std::future::Future;
use std::num::NonZeroU32;
use std::time::Duration;

use async_trait::async_trait;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use nonzero_ext::nonzero;
use reqwest::Client;
use thiserror::Error;

use crate::types::SparqlResponse;

pub const WDQS_ENDPOINT: &str = "https://query.wikidata.org/sparql";

const USER_AGENT: &str = concat!(
    "authorgraph/",
    env!("CARGO_PKG_VERSION"),
    " (bibliographic author resolution)"
);

#[derive(Debug, Error)]
pub enum QueryError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("query service returned status {0}")]
    Status(reqwest::StatusCode),
    #[error("could not decode query response: {0}")]
    Decode(#[source] reqwest::Error),
}

/// Seam over the query service so the pipeline can be driven by a fake.
#[async_trait]
pub trait Sparql: Send + Sync {
    /// Exact-label entity search for a person whose occupation is a
    /// subclass of author.
    async fn exact_search(&self, name: &str) -> Result<SparqlResponse, QueryError>;

    /// Free-text label-contains search under the same type and occupation
    /// constraints; used as a fallback when the exact form finds nothing.
    async fn label_search(&self, name: &str) -> Result<SparqlResponse, QueryError>;
}

/// Retry `op` up to `attempts` times, returning the last error once the
/// bound is exhausted. At least one attempt is always made.
pub async fn with_retries<T, E, Fut>(
    attempts: u32,
    mut op: impl FnMut() -> Fut,
) -> Result<T, E>
where
    E: std::fmt::Display,
    Fut: Future<Output = Result<T, E>>,
{
    let attempts = attempts.max(1);
    let mut n = 0;
    loop {
        n += 1;
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if n < attempts => {
                tracing::debug!(attempt = n, %err, "remote call failed, retrying");
            }
            Err(err) => return Err(err),
        }
    }
}

pub struct WdqsClient {
    http: Client,
    endpoint: String,
    limiter: DefaultDirectRateLimiter,
    max_retries: u32,
}

impl WdqsClient {
    pub fn new(
        endpoint: impl Into<String>,
        max_retries: u32,
        qps: u32,
        timeout_ms: u64,
    ) -> Result<Self, QueryError> {
        let http = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_millis(timeout_ms))
            .build()?;
        let qps = NonZeroU32::new(qps).unwrap_or(nonzero!(1u32));
        Ok(Self {
            http,
            endpoint: endpoint.into(),
            limiter: RateLimiter::direct(Quota::per_second(qps)),
            max_retries,
        })
    }

    async fn run(&self, query: &str) -> Result<SparqlResponse, QueryError> {
        with_retries(self.max_retries, || async {
            self.limiter.until_ready().await;
            self.attempt(query).await
        })
        .await
    }

    async fn attempt(&self, query: &str) -> Result<SparqlResponse, QueryError> {
        let resp = self
            .http
            .get(&self.endpoint)
            .query(&[("query", query), ("format", "json")])
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(QueryError::Status(resp.status()));
        }
        resp.json::<SparqlResponse>().await.map_err(QueryError::Decode)
    }
}

#[async_trait]
impl Sparql for WdqsClient {
    async fn exact_search(&self, name: &str) -> Result<SparqlResponse, QueryError> {
        self.run(&exact_query(name)).await
    }

    async fn label_search(&self, name: &str) -> Result<SparqlResponse, QueryError> {
        self.run(&label_query(name)).await
    }
}

fn escape_literal(name: &str) -> String {
    name.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Exact-match form: the EntitySearch API must surface the name, and the
/// entity must be a human (P31 Q5) whose occupation is a subclass of
/// author (P106/P279 Q482980).
fn exact_query(name: &str) -> String {
    format!(
        r#"SELECT DISTINCT ?item ?label
WHERE
{{
  SERVICE wikibase:mwapi
  {{
    bd:serviceParam wikibase:endpoint "www.wikidata.org";
                    wikibase:api "EntitySearch";
                    mwapi:search "{name}";
                    mwapi:language "en".
    ?item wikibase:apiOutputItem mwapi:item.
  }}
  ?item rdfs:label ?label. FILTER( LANG(?label)="en" )
  ?item wdt:P31 wd:Q5;
        wdt:P106/wdt:P279 wd:Q482980.
}}
"#,
        name = escape_literal(name)
    )
}

/// Fallback form: full-text generator search with `inlabel:` semantics,
/// same type and occupation constraints.
fn label_query(name: &str) -> String {
    format!(
        r#"SELECT DISTINCT ?item ?label
WHERE
{{
  SERVICE wikibase:mwapi
  {{
    bd:serviceParam wikibase:endpoint "www.wikidata.org";
                    wikibase:api "Generator";
                    mwapi:generator "search";
                    mwapi:gsrsearch "inlabel:{name}"@en;
                    mwapi:gsrlimit "max".
    ?item wikibase:apiOutputItem mwapi:title.
  }}
  ?item rdfs:label ?label. FILTER( LANG(?label)="en" )
  ?item wdt:P31 wd:Q5;
        wdt:P106/wdt:P279 wd:Q482980.
}}
"#,
        name = escape_literal(name)
    )
}
