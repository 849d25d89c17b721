//! Resolves free-text author names from a bibliographic corpus to Wikidata
//! entities and enriches each resolved entity with biographical places
//! (citizenship, birth, death, burial, residence) and their coordinates.
//!
//! Three file-to-file stages: `words` projects corpus metadata into a
//! per-author document list, `search` finds candidate entities per author,
//! and `enrich` disambiguates candidates and dereferences their claims.
//! Remote failures never abort a run; they degrade the affected author or
//! fact to `null` so the output always covers every input author.

pub mod disambig;
pub mod enrich;
pub mod entity;
pub mod io;
pub mod normalize;
pub mod resolve;
pub mod sparql;
pub mod types;
pub mod words;
