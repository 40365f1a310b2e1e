use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Stable identifier of a catalog item.
///
/// The value is opaque. An empty identifier can be represented (it arrives
/// from untrusted payloads) but is rejected by every mutating operation.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(String);

impl ItemId {
    pub fn new(value: impl Into<String>) -> Self {
        ItemId(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&str> for ItemId {
    fn from(value: &str) -> Self {
        ItemId(value.to_string())
    }
}

impl From<String> for ItemId {
    fn from(value: String) -> Self {
        ItemId(value)
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Content hash of an id-set.
///
/// Order-sensitive: a set that was reordered (remove then re-add) gets a
/// new fingerprint, since the newest item must stay last.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SetFingerprint(String);

impl SetFingerprint {
    pub fn of<'a>(ids: impl IntoIterator<Item = &'a ItemId>) -> Self {
        let mut hasher = Sha256::new();
        for id in ids.into_iter().map(ItemId::as_str) {
            hasher.update(id.as_bytes());
            // Separator keeps ["ab", "c"] distinct from ["a", "bc"]
            hasher.update([0u8]);
        }

        let hex = hex::encode(hasher.finalize());
        SetFingerprint(format!("sha256:{hex}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_the_empty_id_is_empty() {
        assert!(ItemId::from("").is_empty());
        assert!(!ItemId::from(" ").is_empty());
        assert!(!ItemId::from("prod_01").is_empty());
    }

    #[test]
    fn fingerprint_tracks_order() {
        let a = [ItemId::from("x"), ItemId::from("y")];
        let b = [ItemId::from("y"), ItemId::from("x")];
        assert_ne!(SetFingerprint::of(&a), SetFingerprint::of(&b));
    }

    #[test]
    fn fingerprint_separates_boundaries() {
        let a = [ItemId::from("ab"), ItemId::from("c")];
        let b = [ItemId::from("a"), ItemId::from("bc")];
        assert_ne!(SetFingerprint::of(&a), SetFingerprint::of(&b));
        assert!(SetFingerprint::of(&a).as_str().starts_with("sha256:"));
    }
}
