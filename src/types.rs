use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One RDF term in a query-service binding, e.g. `{"type": "uri", "value": "..."}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RdfTerm {
    #[serde(rename = "type", default)]
    pub ty: String,
    pub value: String,
}

/// One candidate entity surfaced by a search query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Binding {
    pub item: RdfTerm,
    pub label: RdfTerm,
}

impl Binding {
    /// Entity id, i.e. the last path segment of the item URI.
    pub fn entity_id(&self) -> &str {
        self.item.value.rsplit('/').next().unwrap_or(&self.item.value)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Head {
    #[serde(default)]
    pub vars: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Results {
    #[serde(default)]
    pub bindings: Vec<Binding>,
}

/// A SPARQL SELECT result document as returned by the query service.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SparqlResponse {
    #[serde(default)]
    pub head: Head,
    #[serde(default)]
    pub results: Results,
}

impl SparqlResponse {
    /// The empty result document recorded when a search fails outright.
    pub fn empty() -> Self {
        Self {
            head: Head { vars: vec!["item".into(), "label".into()] },
            results: Results::default(),
        }
    }
}

/// Which search form produced an author's candidate set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Provenance {
    #[serde(rename = "main")]
    Exact,
    Fallback,
    #[default]
    None,
}

/// Search-stage output for one raw author name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorRecord {
    pub formatted_name: Option<String>,
    pub wikidata_obj: SparqlResponse,
    #[serde(default)]
    pub prov: Provenance,
}

/// An entity a biographical claim points at, with its English label and,
/// for places, an optional coordinate pair.
///
/// `coord` is absent when the entity carries no coordinate claim, and an
/// explicit `null` when the claim exists but its shape is unreadable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferencedEntity {
    pub id: String,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coord: Option<Option<[f64; 2]>>,
}

/// Outcome of dereferencing one biographical relation.
///
/// `NotFound` and `FetchFailed` both serialize to `null` so the output file
/// keeps its established shape, but stay distinguishable in code and tests.
#[derive(Debug, Clone, PartialEq)]
pub enum FactOutcome {
    Found(ReferencedEntity),
    NotFound,
    FetchFailed,
}

impl FactOutcome {
    pub fn is_found(&self) -> bool {
        matches!(self, FactOutcome::Found(_))
    }
}

impl Serialize for FactOutcome {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            FactOutcome::Found(entity) => entity.serialize(serializer),
            FactOutcome::NotFound | FactOutcome::FetchFailed => serializer.serialize_none(),
        }
    }
}

/// The five biographical relations extracted for a resolved author.
/// All five keys are always written, absent facts as `null`.
#[derive(Debug, Clone, Serialize)]
pub struct Enrichment {
    pub citizenship: FactOutcome,
    pub birth: FactOutcome,
    pub death: FactOutcome,
    pub burial: FactOutcome,
    pub residence: FactOutcome,
}

/// Word data attached to one document in the metadata stage: either the
/// loaded token counts, the path to the count file, or `null` when the
/// file is missing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WordData {
    Counts(BTreeMap<String, u64>),
    Path(String),
    Missing,
}

/// One in-range document attributed to an author.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WordsEntry {
    pub htid: String,
    pub title: String,
    pub date: i32,
    pub words: WordData,
}
