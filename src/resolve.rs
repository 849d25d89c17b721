//! Search stage: one candidate lookup per unique raw author name, exact
//! query first, free-text fallback when the exact form finds nothing.

use std::collections::BTreeMap;

use crate::normalize::format_author;
use crate::sparql::Sparql;
use crate::types::{AuthorRecord, Provenance, SparqlResponse};

/// Run the two-tier search for every author, strictly sequentially.
///
/// Failures never abort the loop: a failed exact search leaves an empty
/// result set with `none` provenance, and a failed fallback leaves whatever
/// the exact stage recorded. The fallback runs whenever the current result
/// set is empty, including after a swallowed exact-search error. Once the
/// fallback succeeds its results replace the exact ones outright.
pub async fn search_authors<'a, I>(client: &dyn Sparql, authors: I) -> BTreeMap<String, AuthorRecord>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut out = BTreeMap::new();
    for raw in authors {
        let formatted = format_author(raw);
        let mut record = match client.exact_search(&formatted).await {
            Ok(res) => AuthorRecord {
                formatted_name: Some(formatted.clone()),
                wikidata_obj: res,
                prov: Provenance::Exact,
            },
            Err(err) => {
                tracing::warn!(author = %raw, %err, "exact search failed");
                AuthorRecord {
                    formatted_name: Some(formatted.clone()),
                    wikidata_obj: SparqlResponse::empty(),
                    prov: Provenance::None,
                }
            }
        };

        if record.wikidata_obj.results.bindings.is_empty() {
            match client.label_search(&formatted).await {
                Ok(res) => {
                    record.wikidata_obj = res;
                    record.prov = Provenance::Fallback;
                }
                Err(err) => {
                    tracing::warn!(author = %raw, %err, "fallback search failed");
                }
            }
        }

        tracing::info!(
            author = %raw,
            results = record.wikidata_obj.results.bindings.len(),
            prov = ?record.prov,
            "searched"
        );
        out.insert(raw.to_string(), record);
    }

    let found = out
        .values()
        .filter(|r| !r.wikidata_obj.results.bindings.is_empty())
        .count();
    tracing::info!(total = out.len(), found, "author search complete");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sparql::QueryError;
    use crate::types::{Binding, RdfTerm, Results};
    use async_trait::async_trait;

    fn response(labels: &[(&str, &str)]) -> SparqlResponse {
        SparqlResponse {
            results: Results {
                bindings: labels
                    .iter()
                    .map(|(id, label)| Binding {
                        item: RdfTerm {
                            ty: "uri".into(),
                            value: format!("http://www.wikidata.org/entity/{id}"),
                        },
                        label: RdfTerm { ty: "literal".into(), value: (*label).into() },
                    })
                    .collect(),
            },
            ..SparqlResponse::empty()
        }
    }

    /// `None` plays a failing query; `Some` a successful one.
    struct FakeWdqs {
        exact: Option<SparqlResponse>,
        fallback: Option<SparqlResponse>,
    }

    #[async_trait]
    impl Sparql for FakeWdqs {
        async fn exact_search(&self, _name: &str) -> Result<SparqlResponse, QueryError> {
            self.exact
                .clone()
                .ok_or(QueryError::Status(reqwest::StatusCode::BAD_GATEWAY))
        }

        async fn label_search(&self, _name: &str) -> Result<SparqlResponse, QueryError> {
            self.fallback
                .clone()
                .ok_or(QueryError::Status(reqwest::StatusCode::BAD_GATEWAY))
        }
    }

    #[tokio::test]
    async fn exact_hit_keeps_main_provenance() {
        let client = FakeWdqs {
            exact: Some(response(&[("Q1", "John Smith")])),
            fallback: Some(response(&[("Q9", "Other")])),
        };
        let out = search_authors(&client, ["Smith, John"]).await;
        let rec = &out["Smith, John"];
        assert_eq!(rec.formatted_name.as_deref(), Some("John Smith"));
        assert_eq!(rec.prov, Provenance::Exact);
        assert_eq!(rec.wikidata_obj.results.bindings[0].entity_id(), "Q1");
    }

    #[tokio::test]
    async fn empty_exact_result_triggers_fallback() {
        let client = FakeWdqs {
            exact: Some(response(&[])),
            fallback: Some(response(&[("Q2", "John Smith")])),
        };
        let out = search_authors(&client, ["Smith, John"]).await;
        let rec = &out["Smith, John"];
        assert_eq!(rec.prov, Provenance::Fallback);
        assert_eq!(rec.wikidata_obj.results.bindings.len(), 1);
    }

    #[tokio::test]
    async fn exact_error_is_swallowed_and_fallback_still_runs() {
        let client = FakeWdqs {
            exact: None,
            fallback: Some(response(&[("Q2", "John Smith")])),
        };
        let out = search_authors(&client, ["Smith, John"]).await;
        assert_eq!(out["Smith, John"].prov, Provenance::Fallback);
        assert_eq!(out["Smith, John"].wikidata_obj.results.bindings.len(), 1);
    }

    #[tokio::test]
    async fn both_queries_failing_records_an_empty_result() {
        let client = FakeWdqs { exact: None, fallback: None };
        let out = search_authors(&client, ["Smith, John", "Doe, Jane"]).await;
        assert_eq!(out.len(), 2);
        for rec in out.values() {
            assert_eq!(rec.prov, Provenance::None);
            assert!(rec.wikidata_obj.results.bindings.is_empty());
        }
    }

    #[tokio::test]
    async fn fallback_error_leaves_exact_result_in_place() {
        let client = FakeWdqs { exact: Some(response(&[])), fallback: None };
        let out = search_authors(&client, ["Smith, John"]).await;
        let rec = &out["Smith, John"];
        assert_eq!(rec.prov, Provenance::Exact);
        assert!(rec.wikidata_obj.results.bindings.is_empty());
    }

    #[test]
    fn provenance_serializes_with_wire_names() {
        let rec = AuthorRecord {
            formatted_name: Some("John Smith".into()),
            wikidata_obj: SparqlResponse::empty(),
            prov: Provenance::Exact,
        };
        let value = serde_json::to_value(&rec).unwrap();
        assert_eq!(value["prov"], "main");

        // Records written before provenance existed deserialize as `none`.
        let legacy = serde_json::json!({
            "formatted_name": "John Smith",
            "wikidata_obj": { "head": { "vars": ["item", "label"] },
                              "results": { "bindings": [] } }
        });
        let rec: AuthorRecord = serde_json::from_value(legacy).unwrap();
        assert_eq!(rec.prov, Provenance::None);
    }
}
