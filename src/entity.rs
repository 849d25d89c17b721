//! Client for the knowledge base's entity-data REST endpoint, plus
//! navigation helpers over the JSON documents it returns.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use thiserror::Error;

pub const ENTITY_DATA_BASE: &str = "https://www.wikidata.org/wiki/Special:EntityData/";

/// Place-coordinate property probed on dereferenced entities.
pub const COORDINATE_PROP: &str = "P625";

#[derive(Debug, Error)]
pub enum EntityError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("entity endpoint returned status {0}")]
    Status(reqwest::StatusCode),
    #[error("entity endpoint returned content type {0:?}")]
    ContentType(String),
    #[error("could not decode entity document: {0}")]
    Decode(#[source] reqwest::Error),
}

/// Seam over the entity-data endpoint so enrichment can run against a fake.
#[async_trait]
pub trait EntitySource: Send + Sync {
    async fn entity(&self, id: &str) -> Result<Value, EntityError>;
}

pub struct EntityDataClient {
    http: Client,
    base: String,
}

impl EntityDataClient {
    pub fn new(base: impl Into<String>, timeout_ms: u64) -> Result<Self, EntityError> {
        let http = Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .build()?;
        Ok(Self { http, base: base.into() })
    }
}

#[async_trait]
impl EntitySource for EntityDataClient {
    async fn entity(&self, id: &str) -> Result<Value, EntityError> {
        let url = format!("{}{}.json", self.base, id);
        let resp = self.http.get(&url).send().await?;
        let content_type = resp
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        acceptable(resp.status(), &content_type)?;
        resp.json::<Value>().await.map_err(EntityError::Decode)
    }
}

/// A usable entity response has a success status and a JSON content type;
/// anything else degrades the author to "no enrichment" upstream.
fn acceptable(status: reqwest::StatusCode, content_type: &str) -> Result<(), EntityError> {
    if !status.is_success() {
        return Err(EntityError::Status(status));
    }
    if !content_type.contains("application/json") {
        return Err(EntityError::ContentType(content_type.to_string()));
    }
    Ok(())
}

/// The claims map of `id` within an entity-data document.
pub fn entity_claims<'a>(doc: &'a Value, id: &str) -> Option<&'a Value> {
    doc.get("entities")?.get(id)?.get("claims")
}

/// The English display label of `id` within an entity-data document.
pub fn english_label<'a>(doc: &'a Value, id: &str) -> Option<&'a str> {
    doc.get("entities")?
        .get(id)?
        .get("labels")?
        .get("en")?
        .get("value")?
        .as_str()
}

/// The entity id the first statement of a claim array points at.
pub fn claim_target(claim: &Value) -> Option<&str> {
    claim
        .get(0)?
        .get("mainsnak")?
        .get("datavalue")?
        .get("value")?
        .get("id")?
        .as_str()
}

/// Coordinate probe for a dereferenced place entity.
///
/// `None`: no coordinate claim at all (the slot is omitted downstream).
/// `Some(None)`: a claim exists but its shape is unreadable (explicit null).
/// `Some(Some(pair))`: a readable coordinate. Both components carry the
/// longitude value; published runs of this pipeline have that shape and
/// downstream data depends on it, so it is kept as-is.
pub fn coordinate(claims: &Value) -> Option<Option<[f64; 2]>> {
    let place = claims.get(COORDINATE_PROP)?;
    let longitude = place
        .get(0)
        .and_then(|c| c.get("mainsnak"))
        .and_then(|s| s.get("datavalue"))
        .and_then(|d| d.get("value"))
        .and_then(|v| v.get("longitude"))
        .and_then(Value::as_f64);
    match longitude {
        Some(long) => Some(Some([long, long])),
        None => Some(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(id: &str, label: &str, claims: Value) -> Value {
        json!({
            "entities": {
                id: { "labels": { "en": { "value": label } }, "claims": claims }
            }
        })
    }

    #[test]
    fn navigates_labels_and_claims() {
        let d = doc("Q2", "Canada", json!({ "P27": [] }));
        assert_eq!(english_label(&d, "Q2"), Some("Canada"));
        assert!(entity_claims(&d, "Q2").is_some());
        assert_eq!(english_label(&d, "Q3"), None);
    }

    #[test]
    fn claim_target_reads_first_statement() {
        let claim = json!([
            { "mainsnak": { "datavalue": { "value": { "id": "Q16" } } } },
            { "mainsnak": { "datavalue": { "value": { "id": "Q30" } } } }
        ]);
        assert_eq!(claim_target(&claim), Some("Q16"));
        assert_eq!(claim_target(&json!([{ "mainsnak": {} }])), None);
        assert_eq!(claim_target(&json!([])), None);
    }

    #[test]
    fn coordinate_reads_longitude_into_both_slots() {
        let claims = json!({
            "P625": [{ "mainsnak": { "datavalue": { "value": {
                "latitude": 45.42, "longitude": -75.69
            } } } }]
        });
        assert_eq!(coordinate(&claims), Some(Some([-75.69, -75.69])));
    }

    #[test]
    fn json_responses_are_accepted() {
        use reqwest::StatusCode;
        assert!(acceptable(StatusCode::OK, "application/json").is_ok());
        assert!(acceptable(StatusCode::OK, "application/json; charset=utf-8").is_ok());
    }

    #[test]
    fn non_json_content_types_are_rejected() {
        use reqwest::StatusCode;
        let err = acceptable(StatusCode::OK, "text/html; charset=utf-8").unwrap_err();
        assert!(matches!(err, EntityError::ContentType(ct) if ct.starts_with("text/html")));
        // header missing entirely
        let err = acceptable(StatusCode::OK, "").unwrap_err();
        assert!(matches!(err, EntityError::ContentType(ct) if ct.is_empty()));
    }

    #[test]
    fn error_statuses_are_rejected_before_content_type() {
        use reqwest::StatusCode;
        let err = acceptable(StatusCode::NOT_FOUND, "application/json").unwrap_err();
        assert!(matches!(err, EntityError::Status(s) if s == StatusCode::NOT_FOUND));
    }

    #[test]
    fn coordinate_absent_versus_malformed() {
        assert_eq!(coordinate(&json!({})), None);
        let malformed = json!({ "P625": [{ "mainsnak": {} }] });
        assert_eq!(coordinate(&malformed), Some(None));
    }
}
