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

//! Provides a simple in-memory implementation of [`RegionScanner`].
//!
//! The [`RegionTable`] stores regions in a [`BTreeMap`] keyed by start key.
//! It's primarily intended for testing and demonstration purposes.

use std::collections::BTreeMap;
use std::io;
use std::ops::Bound;

use log::warn;

use crate::key::KeyBound;
use crate::region::RegionWithLeader;
use crate::RegionScanner;

/// An in-memory region directory.
///
/// Regions are not required to be contiguous:
/// a table with holes or overlaps serves inconsistent pages,
/// which is useful to simulate a metadata source being updated.
///
/// # Examples
///
/// ```
/// use region_iter::impls::region_table::RegionTable;
/// use region_iter::Region;
/// use region_iter::RegionWithLeader;
///
/// let table: RegionTable = [("", "m"), ("m", "")]
///     .into_iter()
///     .enumerate()
///     .map(|(i, (s, e))| RegionWithLeader::new(Region::new(i as u64, s, e), None))
///     .collect();
///
/// let got = table.scan(b"n", b"", 10);
/// assert_eq!(got.len(), 1);
/// assert_eq!(got[0].start_key(), b"m");
/// ```
#[derive(Debug, Clone, Default)]
pub struct RegionTable {
    regions: BTreeMap<Vec<u8>, RegionWithLeader>,
}

impl RegionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a region, replacing the one with the same start key.
    pub fn insert(&mut self, region: RegionWithLeader) -> Option<RegionWithLeader> {
        self.regions.insert(region.start_key().to_vec(), region)
    }

    /// Remove the region starting at `start_key`.
    pub fn remove(&mut self, start_key: &[u8]) -> Option<RegionWithLeader> {
        self.regions.remove(start_key)
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// All regions, ordered by start key.
    pub fn regions(&self) -> impl Iterator<Item = &RegionWithLeader> {
        self.regions.values()
    }

    /// The region whose range contains `key`.
    pub fn get_region(&self, key: &[u8]) -> Option<&RegionWithLeader> {
        let (_, r) = self
            .regions
            .range::<[u8], _>((Bound::Unbounded, Bound::Included(key)))
            .next_back()?;

        if r.region.contains(key) {
            Some(r)
        } else {
            None
        }
    }

    /// Split the region containing `split_key` into `[start, split_key)` and `[split_key, end)`.
    ///
    /// The right half gets `new_region_id`; both halves get a bumped epoch version.
    /// Returns `false` if no region contains `split_key` or `split_key` is already a boundary.
    pub fn split(&mut self, split_key: &[u8], new_region_id: u64) -> bool {
        let Some(origin) = self.get_region(split_key).cloned() else {
            return false;
        };

        if origin.start_key() == split_key {
            return false;
        }

        let mut left = origin.clone();
        left.region.end_key = split_key.to_vec();
        left.region.epoch.version += 1;

        let mut right = origin;
        right.region.id = new_region_id;
        right.region.start_key = split_key.to_vec();
        right.region.epoch.version += 1;

        self.insert(left);
        self.insert(right);
        true
    }

    /// Return at most `limit` regions, starting from the region that contains `key`,
    /// up to the region that contains the key right before `end_key`.
    ///
    /// `limit == 0` means no limit.
    /// If no region contains `key`, it starts from the first region after `key`.
    pub fn scan(&self, key: &[u8], end_key: &[u8], limit: usize) -> Vec<RegionWithLeader> {
        let from = match self.get_region(key) {
            Some(r) => r.start_key(),
            None => key,
        };

        let end = KeyBound::from_end_key(end_key);
        let limit = if limit == 0 { usize::MAX } else { limit };

        let res = self
            .regions
            .range::<[u8], _>((Bound::Included(from), Bound::Unbounded))
            .map(|(_, r)| r)
            .take_while(|r| !end.is_reached_by(r.start_key()))
            .take(limit)
            .cloned()
            .collect::<Vec<_>>();

        if res.len() > 10_000 {
            warn!("RegionTable::scan() returns big range of len={}", res.len());
        }

        res
    }
}

impl FromIterator<RegionWithLeader> for RegionTable {
    fn from_iter<T: IntoIterator<Item = RegionWithLeader>>(iter: T) -> Self {
        let mut table = RegionTable::new();
        for r in iter {
            table.insert(r);
        }
        table
    }
}

#[async_trait::async_trait]
impl RegionScanner for RegionTable {
    async fn region_scan(
        &self,
        key: &[u8],
        end_key: &[u8],
        limit: usize,
    ) -> Result<Vec<RegionWithLeader>, io::Error> {
        Ok(self.scan(key, end_key, limit))
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::region::Peer;
    use crate::region::Region;

    fn table(ranges: &[(&str, &str)]) -> RegionTable {
        ranges
            .iter()
            .enumerate()
            .map(|(i, (s, e))| {
                let id = i as u64 + 1;
                RegionWithLeader::new(Region::new(id, *s, *e), Some(Peer::new(id * 10, 1)))
            })
            .collect()
    }

    fn starts(rs: &[RegionWithLeader]) -> Vec<&str> {
        rs.iter()
            .map(|r| std::str::from_utf8(r.start_key()).unwrap())
            .collect()
    }

    #[test]
    fn test_get_region() {
        let t = table(&[("", "c"), ("c", "f"), ("g", "")]);

        assert_eq!(Some(1), t.get_region(b"").map(|r| r.region.id));
        assert_eq!(Some(1), t.get_region(b"b").map(|r| r.region.id));
        assert_eq!(Some(2), t.get_region(b"c").map(|r| r.region.id));
        assert_eq!(Some(2), t.get_region(b"e").map(|r| r.region.id));
        assert_eq!(None, t.get_region(b"f").map(|r| r.region.id));
        assert_eq!(Some(3), t.get_region(b"zzz").map(|r| r.region.id));
    }

    #[test]
    fn test_scan_starts_from_containing_region() {
        let t = table(&[("", "c"), ("c", "f"), ("f", "")]);

        assert_eq!(vec!["c", "f"], starts(&t.scan(b"d", b"", 10)));
        assert_eq!(vec!["", "c", "f"], starts(&t.scan(b"", b"", 10)));
        assert_eq!(vec!["f"], starts(&t.scan(b"x", b"", 10)));
    }

    #[test]
    fn test_scan_honours_end_key() {
        let t = table(&[("", "c"), ("c", "f"), ("f", "")]);

        // "f" is excluded: the region starting at "f" is not in `[a, f)`.
        assert_eq!(vec!["", "c"], starts(&t.scan(b"a", b"f", 10)));
        assert_eq!(vec!["", "c", "f"], starts(&t.scan(b"a", b"g", 10)));
        assert_eq!(vec![""], starts(&t.scan(b"a", b"b", 10)));
    }

    #[test]
    fn test_scan_honours_limit() {
        let t = table(&[("", "c"), ("c", "f"), ("f", "")]);

        assert_eq!(vec![""], starts(&t.scan(b"", b"", 1)));
        assert_eq!(vec!["", "c"], starts(&t.scan(b"", b"", 2)));
        assert_eq!(vec!["", "c", "f"], starts(&t.scan(b"", b"", 0)));
    }

    #[test]
    fn test_scan_with_hole() {
        let t = table(&[("", "c"), ("d", "")]);

        // "c" is in the hole: start from the next region.
        assert_eq!(vec!["d"], starts(&t.scan(b"c", b"", 10)));
        assert_eq!(vec!["", "d"], starts(&t.scan(b"a", b"", 10)));
    }

    #[test]
    fn test_split() {
        let mut t = table(&[("", "m"), ("m", "")]);

        assert!(t.split(b"f", 100));
        assert!(!t.split(b"f", 101), "already a boundary");
        assert_eq!(3, t.len());

        let got = t.scan(b"", b"", 0);
        assert_eq!(vec!["", "f", "m"], starts(&got));
        assert_eq!(b"f", got[0].end_key());
        assert_eq!(100, got[1].region.id);
        assert_eq!(b"m", got[1].end_key());
        assert_eq!(1, got[0].region.epoch.version);
        assert_eq!(1, got[1].region.epoch.version);
        assert_eq!(0, got[2].region.epoch.version);

        let mut empty = RegionTable::new();
        assert!(!empty.split(b"a", 1));
    }

    #[tokio::test]
    async fn test_region_scan() -> anyhow::Result<()> {
        let t = table(&[("", "c"), ("c", "f"), ("f", "")]);

        let got = t.region_scan(b"d", b"g", 10).await?;
        assert_eq!(vec!["c", "f"], starts(&got));
        assert_eq!(Some(Peer::new(20, 1)), got[0].leader);
        Ok(())
    }
}
