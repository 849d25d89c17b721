//! Enrichment stage: disambiguate each author's candidate set, fetch the
//! chosen entity's record, and dereference its biographical place claims.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::disambig;
use crate::entity::{self, EntitySource};
use crate::types::{AuthorRecord, Enrichment, FactOutcome, ReferencedEntity};

/// Enrich every author record, strictly sequentially. Every input key
/// appears in the output exactly once; authors that do not resolve to a
/// single entity, or whose detail fetch fails, map to `None`.
pub async fn enrich_authors(
    source: &dyn EntitySource,
    records: &BTreeMap<String, AuthorRecord>,
) -> BTreeMap<String, Option<Enrichment>> {
    let mut out = BTreeMap::new();
    for (raw, record) in records {
        let enrichment = enrich_one(source, record).await;
        match &enrichment {
            Some(_) => tracing::info!(author = %raw, "enriched"),
            None => tracing::info!(author = %raw, "no resolvable entity"),
        }
        out.insert(raw.clone(), enrichment);
    }
    out
}

async fn enrich_one(source: &dyn EntitySource, record: &AuthorRecord) -> Option<Enrichment> {
    let formatted = record.formatted_name.as_deref().unwrap_or_default();
    let chosen = disambig::choose(formatted, &record.wikidata_obj.results.bindings)?;
    let id = chosen.entity_id().to_string();

    let doc = match source.entity(&id).await {
        Ok(doc) => doc,
        Err(err) => {
            tracing::warn!(entity = %id, %err, "entity fetch failed, dropping enrichment");
            return None;
        }
    };

    let claims = entity::entity_claims(&doc, &id);
    let slot = |prop: &str| claims.and_then(|c| c.get(prop));
    Some(Enrichment {
        citizenship: deref_slot(source, slot("P27")).await,
        birth: deref_slot(source, slot("P19")).await,
        death: deref_slot(source, slot("P20")).await,
        burial: deref_slot(source, slot("P119")).await,
        residence: deref_slot(source, slot("P551")).await,
    })
}

/// Dereference one relation claim to the entity it points at. Shape and
/// fetch problems are confined to this slot; the remaining slots and
/// authors keep processing.
async fn deref_slot(source: &dyn EntitySource, claim: Option<&Value>) -> FactOutcome {
    let Some(claim) = claim else {
        return FactOutcome::NotFound;
    };
    let Some(target) = entity::claim_target(claim) else {
        return FactOutcome::FetchFailed;
    };

    let doc = match source.entity(target).await {
        Ok(doc) => doc,
        Err(err) => {
            tracing::warn!(entity = target, %err, "label fetch failed");
            return FactOutcome::FetchFailed;
        }
    };
    let Some(label) = entity::english_label(&doc, target) else {
        return FactOutcome::FetchFailed;
    };

    let coord = entity::entity_claims(&doc, target).and_then(entity::coordinate);
    FactOutcome::Found(ReferencedEntity {
        id: target.to_string(),
        label: label.to_string(),
        coord,
    })
}
