//! JSON document boundary shared by every persisted table.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeSet;

use crate::error::{BoardError, BoardResult, DocumentKind};

/// Parses a document, tagging failures with the document kind.
pub(crate) fn parse_document<T: DeserializeOwned>(
    json: &str,
    document: DocumentKind,
) -> BoardResult<T> {
    serde_json::from_str(json).map_err(|source| BoardError::MalformedDocument { document, source })
}

/// Encodes a document as pretty-printed JSON.
pub(crate) fn encode_document<T: Serialize + ?Sized>(value: &T) -> BoardResult<String> {
    serde_json::to_string_pretty(value).map_err(BoardError::Encode)
}

/// Fails on the first key seen twice.
pub(crate) fn reject_duplicates<K: Ord + Clone>(
    keys: impl Iterator<Item = K>,
    document: DocumentKind,
    describe: impl Fn(K) -> String,
) -> BoardResult<()> {
    let mut seen = BTreeSet::new();
    for key in keys {
        if !seen.insert(key.clone()) {
            return Err(BoardError::InvalidDocument {
                document,
                reason: describe(key),
            });
        }
    }
    Ok(())
}
