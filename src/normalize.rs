/// Converts a catalog-style `"Family, Given"` author string into natural
/// display order, the form the knowledge base labels people under.
///
/// Malformed input (fewer than two comma segments, empty given name, or a
/// given name that is just a period) falls back to returning the raw string
/// unchanged; this function never errors.
pub fn format_author(raw: &str) -> String {
    let segments: Vec<&str> = raw.split(',').filter(|s| !s.is_empty()).collect();
    if segments.len() < 2 {
        return raw.to_string();
    }
    let family = segments[0].trim();
    let given = segments[1].trim();
    if given.is_empty() {
        return raw.to_string();
    }

    // Strip a trailing period unless it closes a single-letter initial
    // ("Johnathan." loses it, "J." keeps it). Narrow heuristic; it does not
    // try to recognize abbreviations in general.
    let chars: Vec<char> = given.chars().collect();
    let given = match chars.as_slice() {
        ['.'] => return raw.to_string(),
        [.., prev, '.'] if !prev.is_uppercase() => &given[..given.len() - 1],
        _ => given,
    };

    format!("{given} {family}")
}
