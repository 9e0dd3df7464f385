//! Small text helpers shared by the dedup and split reports.

use crate::config::Normalization;
use crate::types::SentenceKey;

/// Join tokens with single spaces, optionally lowercased.
///
/// Two records are duplicates exactly when their keys are equal.
pub fn sentence_key<S: AsRef<str>>(tokens: &[S], normalization: Normalization) -> SentenceKey {
    let mut key = String::new();
    for (idx, token) in tokens.iter().enumerate() {
        if idx > 0 {
            key.push(' ');
        }
        key.push_str(token.as_ref());
    }
    match normalization {
        Normalization::Verbatim => key,
        Normalization::CaseFolded => key.to_lowercase(),
    }
}

/// Comma-separated names, cut to `limit` entries with a trailing `...`.
pub fn truncated_list<S: AsRef<str>>(names: &[S], limit: usize) -> String {
    let shown: Vec<&str> = names.iter().take(limit).map(AsRef::as_ref).collect();
    let mut out = shown.join(", ");
    if names.len() > limit {
        out.push_str(", ...");
    }
    out
}
