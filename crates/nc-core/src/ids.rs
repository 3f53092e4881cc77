use core::fmt;
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Build an id, rejecting empty or whitespace-only strings.
            pub fn try_new(id: impl Into<String>) -> CoreResult<Self> {
                let id = id.into();
                if id.trim().is_empty() {
                    return Err(CoreError::InvalidId { id });
                }
                Ok(Self(id))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn into_string(self) -> String {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl PartialEq<str> for $name {
            fn eq(&self, other: &str) -> bool {
                self.0 == other
            }
        }

        impl PartialEq<&str> for $name {
            fn eq(&self, other: &&str) -> bool {
                self.0 == *other
            }
        }
    };
}

string_id!(
    /// Identifier of a placed node instance (`node_<n>` when minted locally).
    NodeId
);
string_id!(
    /// Identifier of a connection between two ports.
    EdgeId
);
string_id!(
    /// Identifier of a super-block grouping label.
    SuperBlockId
);

pub const NODE_ID_PREFIX: &str = "node_";
pub const EDGE_ID_PREFIX: &str = "edge_";
pub const SUPER_BLOCK_ID_PREFIX: &str = "superblock_";

/// Monotonic generator of `<prefix><n>` identifiers.
///
/// Ids loaded from elsewhere may carry arbitrary text; `reseed` scans them for
/// the largest `<prefix><digits>` occurrence so freshly minted ids never reuse
/// a loaded number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdSequence {
    prefix: &'static str,
    last: u64,
}

impl IdSequence {
    pub const fn new(prefix: &'static str) -> Self {
        Self { prefix, last: 0 }
    }

    pub fn nodes() -> Self {
        Self::new(NODE_ID_PREFIX)
    }

    pub fn edges() -> Self {
        Self::new(EDGE_ID_PREFIX)
    }

    pub fn super_blocks() -> Self {
        Self::new(SUPER_BLOCK_ID_PREFIX)
    }

    pub fn prefix(&self) -> &'static str {
        self.prefix
    }

    /// Largest number handed out (or seen on reseed) so far; 0 when fresh.
    pub fn last(&self) -> u64 {
        self.last
    }

    /// Mint the next identifier. Fails once the counter has reached
    /// `u64::MAX`; the counter is left unchanged.
    pub fn next_id<T: From<String>>(&mut self) -> CoreResult<T> {
        self.last = self
            .last
            .checked_add(1)
            .ok_or(CoreError::IdExhausted { prefix: self.prefix })?;
        Ok(T::from(format!("{}{}", self.prefix, self.last)))
    }

    /// Reset the counter to the largest numeric suffix among `ids` (0 if none).
    pub fn reseed<'a, I>(&mut self, ids: I)
    where
        I: IntoIterator<Item = &'a str>,
    {
        let last = ids
            .into_iter()
            .filter_map(|id| self.numeric_suffix(id))
            .max()
            .unwrap_or(0);
        self.last = last;
    }

    /// Move the counter forward to `last`; never moves it back.
    pub fn advance_to(&mut self, last: u64) {
        self.last = self.last.max(last);
    }

    /// Number following the first `<prefix><digits>` occurrence in `id`.
    pub fn numeric_suffix(&self, id: &str) -> Option<u64> {
        for (start, _) in id.match_indices(self.prefix) {
            let rest = &id[start + self.prefix.len()..];
            let digits_len = rest
                .find(|c: char| !c.is_ascii_digit())
                .unwrap_or(rest.len());
            if digits_len > 0 {
                return rest[..digits_len].parse().ok();
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence_is_monotonic() {
        let mut seq = IdSequence::nodes();
        let a: NodeId = seq.next_id().unwrap();
        let b: NodeId = seq.next_id().unwrap();
        assert_eq!(a.as_str(), "node_1");
        assert_eq!(b.as_str(), "node_2");
        assert_eq!(seq.last(), 2);
    }

    #[test]
    fn reseed_takes_max_suffix() {
        let mut seq = IdSequence::nodes();
        seq.reseed(["node_3", "node_12", "custom", "node_7"]);
        assert_eq!(seq.last(), 12);
        let next: NodeId = seq.next_id().unwrap();
        assert_eq!(next, "node_13");
    }

    #[test]
    fn reseed_without_matches_resets_to_zero() {
        let mut seq = IdSequence::nodes();
        let _: NodeId = seq.next_id().unwrap();
        seq.reseed(["n1", "input"]);
        assert_eq!(seq.last(), 0);
    }

    #[test]
    fn suffix_found_inside_longer_ids() {
        let seq = IdSequence::nodes();
        assert_eq!(seq.numeric_suffix("imported_node_41"), Some(41));
        assert_eq!(seq.numeric_suffix("node_x_node_5"), Some(5));
        assert_eq!(seq.numeric_suffix("node_"), None);
    }

    #[test]
    fn advance_never_rewinds() {
        let mut seq = IdSequence::edges();
        seq.advance_to(9);
        seq.advance_to(4);
        assert_eq!(seq.last(), 9);
    }

    #[test]
    fn exhausted_sequence_refuses_to_repeat() {
        let mut seq = IdSequence::nodes();
        seq.reseed(["node_18446744073709551615"]);
        assert_eq!(seq.last(), u64::MAX);
        let err = seq.next_id::<NodeId>().unwrap_err();
        assert_eq!(err, CoreError::IdExhausted { prefix: "node_" });
        assert_eq!(seq.last(), u64::MAX);
    }

    #[test]
    fn try_new_rejects_blank() {
        assert!(NodeId::try_new("  ").is_err());
        assert!(NodeId::try_new("node_1").is_ok());
    }

    #[test]
    fn ids_serialize_as_plain_strings() {
        let id = EdgeId::new("edge_4");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"edge_4\"");
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn next_after_reseed_never_collides(nums in prop::collection::vec(0u64..100_000, 0..20)) {
            let ids: Vec<String> = nums.iter().map(|n| format!("node_{n}")).collect();
            let mut seq = IdSequence::nodes();
            seq.reseed(ids.iter().map(String::as_str));
            let next: NodeId = seq.next_id().unwrap();
            prop_assert!(!ids.iter().any(|id| next == id.as_str()));
        }
    }
}
