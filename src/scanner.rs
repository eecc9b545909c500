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

//! Defines the source of region metadata.
//!
//! The [`RegionScanner`] trait is the only network-facing dependency of this crate:
//! an RPC client to the cluster's placement service, an HTTP client or an in-process
//! table may implement it, as long as it returns regions in order.

use std::io;
use std::sync::Arc;

use crate::region::RegionWithLeader;

/// Provides paginated access to the regions of a cluster.
///
/// # Contract
///
/// - Regions are returned sorted ascending by start key,
///   starting from the region that contains `key`.
/// - The returned regions cover a prefix of `[key, end_key)`,
///   or of `[key, +inf)` if `end_key` is empty.
/// - At most `limit` regions are returned; fewer is allowed.
/// - The result reflects the leader of each region at the time of the call.
///
/// Successive calls are not assumed to observe an atomic snapshot.
/// A result may be empty or inconsistent while the metadata is being updated,
/// the caller is expected to validate and retry.
#[async_trait::async_trait]
pub trait RegionScanner: Send + Sync {
    /// Get a list of regions, starting from the region that contains `key`.
    async fn region_scan(
        &self,
        key: &[u8],
        end_key: &[u8],
        limit: usize,
    ) -> Result<Vec<RegionWithLeader>, io::Error>;
}

#[async_trait::async_trait]
impl<T> RegionScanner for &T
where T: RegionScanner + ?Sized
{
    async fn region_scan(
        &self,
        key: &[u8],
        end_key: &[u8],
        limit: usize,
    ) -> Result<Vec<RegionWithLeader>, io::Error> {
        (**self).region_scan(key, end_key, limit).await
    }
}

#[async_trait::async_trait]
impl<T> RegionScanner for Arc<T>
where T: RegionScanner + ?Sized
{
    async fn region_scan(
        &self,
        key: &[u8],
        end_key: &[u8],
        limit: usize,
    ) -> Result<Vec<RegionWithLeader>, io::Error> {
        (**self).region_scan(key, end_key, limit).await
    }
}
