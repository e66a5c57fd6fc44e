//! Prompt-side matching primitives.
//!
//! These are the deterministic half of resolution: literal keyword hits and
//! anaphora handling. The probabilistic half (embedding search) lives in
//! the vector index.

/// Returns the first registered name the prompt mentions.
///
/// Comparison is against the lowercased prompt; names match either verbatim
/// or with underscores read as spaces, so a prompt saying "open calculator"
/// hits `open_calculator`. Scan order is registration order and the first
/// hit wins.
pub fn keyword_match<'a, I>(query: &str, names: I) -> Option<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    let query_lower = query.to_lowercase();
    names.into_iter().find(|name| {
        let spaced = name.replace('_', " ");
        query_lower.contains(&spaced) || query_lower.contains(*name)
    })
}

/// Whether the prompt leans on the previous one.
///
/// The markers are plain substrings, so "edit" or "item" trigger the
/// augmented retry too; the retry still carries the full prompt, so such
/// prompts resolve on their own content.
#[must_use]
pub fn has_context_marker(query: &str) -> bool {
    let query_lower = query.to_lowercase();
    query_lower.contains("it") || query_lower.contains("again")
}

/// Rewrites an anaphoric prompt with the previous prompt appended.
#[must_use]
pub fn augment_with_context(query: &str, last_prompt: &str) -> String {
    format!("{query} (context: {last_prompt})")
}
