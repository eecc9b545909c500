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

//! Validation of a page of regions.

use crate::errors::ConsistencyError;
use crate::key::KeyBound;
use crate::region::RegionWithLeader;

/// Check that `regions` is a gap-free, ordered cover of `[start_key, end_key)`.
///
/// An empty `end_key` means the end of the keyspace,
/// which is only covered if the last region is unbounded too.
///
/// Rules are checked in order and the first violation is returned:
/// 1. `regions` is not empty.
/// 2. The first region does not start after `start_key`.
/// 3. The last region does not end before `end_key`.
/// 4. Every region ends exactly where the next one starts.
pub fn check_region_consistency(
    start_key: &[u8],
    end_key: &[u8],
    regions: &[RegionWithLeader],
) -> Result<(), ConsistencyError> {
    let (Some(first), Some(last)) = (regions.first(), regions.last()) else {
        return Err(ConsistencyError::EmptyResult {
            start_key: start_key.to_vec(),
            end_key: end_key.to_vec(),
        });
    };

    if first.start_key() > start_key {
        return Err(ConsistencyError::StartMismatch {
            start_key: start_key.to_vec(),
            region_start_key: first.start_key().to_vec(),
        });
    }

    if last.region.end_bound() < KeyBound::from_end_key(end_key) {
        return Err(ConsistencyError::EndMismatch {
            end_key: end_key.to_vec(),
            region_end_key: last.end_key().to_vec(),
        });
    }

    for pair in regions.windows(2) {
        let (cur, next) = (&pair[0], &pair[1]);
        if cur.end_key() != next.start_key() {
            return Err(ConsistencyError::GapDetected {
                end_key: cur.end_key().to_vec(),
                next_start_key: next.start_key().to_vec(),
            });
        }
    }

    Ok(())
}
