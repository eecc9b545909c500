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

use std::io;

use crate::key::display_key;

/// A page of regions does not form a gap-free cover of the queried range.
///
/// The metadata source does not guarantee an atomic snapshot,
/// thus such an error is usually transient.
#[derive(Clone, PartialEq, Eq, thiserror::Error, Debug)]
pub enum ConsistencyError {
    #[error("scan region returns empty result, start_key: {}, end_key: {}", display_key(.start_key), display_key(.end_key))]
    EmptyResult { start_key: Vec<u8>, end_key: Vec<u8> },

    /// There is a gap before the first returned region.
    #[error("first region's start_key > start_key, start_key: {}, region_start_key: {}", display_key(.start_key), display_key(.region_start_key))]
    StartMismatch {
        start_key: Vec<u8>,
        region_start_key: Vec<u8>,
    },

    /// The returned regions do not reach the queried end.
    #[error("last region's end_key < end_key, end_key: {}, region_end_key: {}", display_key(.end_key), display_key(.region_end_key))]
    EndMismatch {
        end_key: Vec<u8>,
        region_end_key: Vec<u8>,
    },

    /// The page ends at or before where it was queried from,
    /// e.g., a stale page served after the cursor already moved past it.
    #[error("last region's end_key <= start_key, start_key: {}, region_end_key: {}", display_key(.start_key), display_key(.region_end_key))]
    NoProgress {
        start_key: Vec<u8>,
        region_end_key: Vec<u8>,
    },

    /// Two adjacent regions are not contiguous.
    #[error("region end_key not equal to next region start_key, end_key: {}, next_start_key: {}", display_key(.end_key), display_key(.next_start_key))]
    GapDetected {
        end_key: Vec<u8>,
        next_start_key: Vec<u8>,
    },
}

/// A single failed attempt to scan a page of regions.
#[derive(thiserror::Error, Debug)]
pub enum ScanError {
    #[error("region scan transport error: {0}")]
    Transport(#[from] io::Error),

    #[error("inconsistent regions: {0}")]
    Inconsistent(#[from] ConsistencyError),
}

impl ScanError {
    pub fn as_consistency_error(&self) -> Option<&ConsistencyError> {
        match self {
            ScanError::Transport(_) => None,
            ScanError::Inconsistent(e) => Some(e),
        }
    }
}

/// Error returned by [`with_retry`](crate::retry::with_retry).
#[derive(thiserror::Error, Debug)]
pub enum RetryError<E> {
    #[error("gave up after {attempts} attempts, last error: {last}")]
    Exhausted { attempts: usize, last: E },

    #[error("cancelled")]
    Cancelled,
}

/// Error returned by [`RegionIter::next_page`](crate::RegionIter::next_page).
#[derive(thiserror::Error, Debug)]
pub enum RegionIterError {
    #[error("failed to scan regions in [{}, {}) after {attempts} attempts: {source}", display_key(.start_key), display_key(.end_key))]
    RetryExhausted {
        start_key: Vec<u8>,
        end_key: Vec<u8>,
        attempts: usize,
        #[source]
        source: ScanError,
    },

    #[error("scan regions in [{}, {}) is cancelled", display_key(.start_key), display_key(.end_key))]
    Cancelled { start_key: Vec<u8>, end_key: Vec<u8> },
}

impl RegionIterError {
    /// The last attempt's error if the retry budget is exhausted.
    pub fn last_scan_error(&self) -> Option<&ScanError> {
        match self {
            RegionIterError::RetryExhausted { source, .. } => Some(source),
            RegionIterError::Cancelled { .. } => None,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, RegionIterError::Cancelled { .. })
    }

    /// The `[start_key, end_key)` that could not be scanned.
    pub fn bounds(&self) -> (&[u8], &[u8]) {
        match self {
            RegionIterError::RetryExhausted {
                start_key, end_key, ..
            } => (start_key.as_slice(), end_key.as_slice()),
            RegionIterError::Cancelled { start_key, end_key } => {
                (start_key.as_slice(), end_key.as_slice())
            }
        }
    }
}
