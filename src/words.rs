//! Metadata stage: filters the corpus metadata by publication year and
//! groups documents (optionally with their word counts) by author. The
//! author keys of its output feed the search stage.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::types::{WordData, WordsEntry};

/// Publication year of an imprint-date field.
///
/// A plain four-digit literal parses directly; a hyphenated range yields its
/// lower bound; anything tagged "estimate" or "unparsed" (and anything else
/// unparseable) yields `None`.
pub fn parse_imprint_year(raw: &str) -> Option<i32> {
    if raw.len() == 4 && raw.chars().all(|c| c.is_ascii_digit()) {
        return raw.parse().ok();
    }
    if raw.contains('-') && !raw.contains("estimate") && !raw.contains("unparsed") {
        let mut bounds: Vec<&str> = raw.split('-').collect();
        bounds.sort_unstable();
        return bounds.first().and_then(|b| b.parse().ok());
    }
    None
}

/// A record with no parseable year is outside every range.
pub fn year_in_range(year: Option<i32>, start: i32, end: i32) -> bool {
    year.map_or(false, |y| (start..=end).contains(&y))
}

#[derive(Debug, Deserialize)]
struct MetaRow {
    imprintdate: String,
    htid: String,
    title: String,
    author: String,
}

/// Read the metadata CSV, keep rows whose imprint year falls in
/// `[start, end]`, and group them by author. With `load_words` set the
/// per-document TSV side file is read into a token count map; otherwise its
/// path is recorded. A missing side file records `null`.
pub fn collect_words(
    infile: &Path,
    data_dir: &Path,
    start: i32,
    end: i32,
    load_words: bool,
) -> Result<BTreeMap<String, Vec<WordsEntry>>> {
    let mut reader = csv::Reader::from_path(infile)
        .with_context(|| format!("opening metadata file {}", infile.display()))?;

    let mut by_author: BTreeMap<String, Vec<WordsEntry>> = BTreeMap::new();
    for row in reader.deserialize() {
        let row: MetaRow = row.context("reading metadata row")?;
        let year = parse_imprint_year(&row.imprintdate);
        if !year_in_range(year, start, end) {
            continue;
        }
        let Some(date) = year else { continue };

        let data_file = data_dir.join(format!("{}.tsv", row.htid));
        let words = if load_words {
            load_word_counts(&data_file)
        } else {
            WordData::Path(data_file.display().to_string())
        };
        by_author.entry(row.author).or_default().push(WordsEntry {
            htid: row.htid,
            title: row.title,
            date,
            words,
        });
    }
    Ok(by_author)
}

fn load_word_counts(path: &Path) -> WordData {
    let reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .quoting(false)
        .has_headers(false)
        .from_path(path);
    let mut reader = match reader {
        Ok(r) => r,
        Err(err) => {
            tracing::warn!(file = %path.display(), %err, "word count file unreadable");
            return WordData::Missing;
        }
    };

    let mut counts = BTreeMap::new();
    for record in reader.records() {
        let record = match record {
            Ok(r) => r,
            Err(err) => {
                tracing::warn!(file = %path.display(), %err, "word count file malformed");
                return WordData::Missing;
            }
        };
        if let (Some(token), Some(n)) = (record.get(0), record.get(1)) {
            if let Ok(n) = n.parse::<u64>() {
                counts.insert(token.to_string(), n);
            }
        }
    }
    WordData::Counts(counts)
}
