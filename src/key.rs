// Copyright 2021 Datafuse Labs
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Raw key helpers.
//!
//! Keys are raw byte strings ordered lexicographically.
//! An empty key is ambiguous: as a start key it is the smallest key,
//! as an end key it means "no upper limit".
//! [`KeyBound`] makes the end-key meaning explicit so that it is never compared as the smallest key.

use std::cmp::Ordering;
use std::fmt;

/// The upper bound of a key range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyBound<'a> {
    /// Exclusive upper bound at the given key.
    Bounded(&'a [u8]),

    /// The range extends to the end of the keyspace.
    Unbounded,
}

impl<'a> KeyBound<'a> {
    /// Interpret a raw end key: an empty key is [`KeyBound::Unbounded`].
    pub fn from_end_key(end_key: &'a [u8]) -> Self {
        if end_key.is_empty() {
            KeyBound::Unbounded
        } else {
            KeyBound::Bounded(end_key)
        }
    }

    /// Convert back to the raw end key representation.
    pub fn as_end_key(&self) -> &'a [u8] {
        match self {
            KeyBound::Bounded(k) => *k,
            KeyBound::Unbounded => &[],
        }
    }

    pub fn is_unbounded(&self) -> bool {
        matches!(self, KeyBound::Unbounded)
    }

    /// Returns `true` if `key` is beyond this bound, i.e., `key >= bound`.
    pub fn is_reached_by(&self, key: &[u8]) -> bool {
        match self {
            KeyBound::Bounded(end) => key >= *end,
            KeyBound::Unbounded => false,
        }
    }
}

impl PartialOrd for KeyBound<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for KeyBound<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (KeyBound::Bounded(a), KeyBound::Bounded(b)) => a.cmp(b),
            (KeyBound::Bounded(_), KeyBound::Unbounded) => Ordering::Less,
            (KeyBound::Unbounded, KeyBound::Bounded(_)) => Ordering::Greater,
            (KeyBound::Unbounded, KeyBound::Unbounded) => Ordering::Equal,
        }
    }
}

/// Display a raw key in hex, e.g. `0x6162`.
///
/// An empty key is displayed as `""`.
pub struct DisplayKey<'a>(pub &'a [u8]);

impl fmt::Display for DisplayKey<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return write!(f, "\"\"");
        }

        write!(f, "0x")?;
        for b in self.0 {
            write!(f, "{:02x}", b)?;
        }
        Ok(())
    }
}

impl fmt::Debug for DisplayKey<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

/// Shortcut to build a [`DisplayKey`].
pub fn display_key(key: &[u8]) -> DisplayKey<'_> {
    DisplayKey(key)
}
