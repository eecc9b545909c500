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

//! Region metadata returned by a [`RegionScanner`](crate::RegionScanner).

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

use crate::key::display_key;
use crate::key::KeyBound;

/// A replica of a region, identified by its id and the store it lives on.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Peer {
    pub id: u64,
    pub store_id: u64,
}

impl Peer {
    pub fn new(id: u64, store_id: u64) -> Self {
        Self { id, store_id }
    }
}

/// Version of a region, bumped on membership change or split/merge.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct RegionEpoch {
    pub conf_ver: u64,
    pub version: u64,
}

/// A contiguous key range `[start_key, end_key)` of the cluster.
///
/// An empty `end_key` means the region extends to the end of the keyspace.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct Region {
    pub id: u64,
    pub start_key: Vec<u8>,
    pub end_key: Vec<u8>,
    pub epoch: RegionEpoch,
}

impl Region {
    pub fn new(id: u64, start_key: impl Into<Vec<u8>>, end_key: impl Into<Vec<u8>>) -> Self {
        Self {
            id,
            start_key: start_key.into(),
            end_key: end_key.into(),
            epoch: RegionEpoch::default(),
        }
    }

    pub fn with_epoch(mut self, epoch: RegionEpoch) -> Self {
        self.epoch = epoch;
        self
    }

    /// The upper bound of this region.
    pub fn end_bound(&self) -> KeyBound<'_> {
        KeyBound::from_end_key(&self.end_key)
    }

    /// Returns `true` if `key` falls in `[start_key, end_key)`.
    pub fn contains(&self, key: &[u8]) -> bool {
        key >= self.start_key.as_slice() && !self.end_bound().is_reached_by(key)
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "region-{}[{}, {})",
            self.id,
            display_key(&self.start_key),
            display_key(&self.end_key)
        )
    }
}

/// A region and the peer currently serving reads and writes for it.
///
/// `leader` is `None` when the metadata source does not know the leader yet,
/// e.g., right after an election started.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct RegionWithLeader {
    pub region: Region,
    pub leader: Option<Peer>,
}

impl RegionWithLeader {
    pub fn new(region: Region, leader: Option<Peer>) -> Self {
        Self { region, leader }
    }

    pub fn start_key(&self) -> &[u8] {
        &self.region.start_key
    }

    pub fn end_key(&self) -> &[u8] {
        &self.region.end_key
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_region_contains() {
        let r = Region::new(1, "b", "d");
        assert!(!r.contains(b"a"));
        assert!(r.contains(b"b"));
        assert!(r.contains(b"c"));
        assert!(!r.contains(b"d"));

        let tail = Region::new(2, "d", "");
        assert!(!tail.contains(b"c"));
        assert!(tail.contains(b"d"));
        assert!(tail.contains(b"\xff\xff\xff"));

        let whole = Region::new(3, "", "");
        assert!(whole.contains(b""));
        assert!(whole.contains(b"x"));
    }

    #[test]
    fn test_region_display() {
        assert_eq!(
            "region-7[0x61, \"\")",
            Region::new(7, "a", "").to_string()
        );
    }

    #[test]
    fn test_region_with_leader_serde() -> anyhow::Result<()> {
        let r = RegionWithLeader::new(
            Region::new(1, "a", "b").with_epoch(RegionEpoch {
                conf_ver: 2,
                version: 3,
            }),
            Some(Peer::new(10, 100)),
        );

        let s = serde_json::to_string(&r)?;
        let got: RegionWithLeader = serde_json::from_str(&s)?;
        assert_eq!(r, got);

        assert_eq!(got.start_key(), b"a");
        assert_eq!(got.end_key(), b"b");
        Ok(())
    }
}
