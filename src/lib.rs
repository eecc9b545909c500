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

//! # Region Iter
//!
//! Iterate over all regions of a partitioned key-value cluster that cover a key range,
//! by repeatedly calling a paginated region-scan API.
//!
//! The metadata source is not assumed to return atomic snapshots:
//! every page is checked to be a contiguous, gap-free cover of the range it was queried for,
//! and a failed or inconsistent scan is retried with a bounded budget.
//!
//! ## Core Components
//!
//! - [`RegionScanner`]: the source of region metadata, e.g. an RPC client
//! - [`check_region_consistency`]: validates a page of regions
//! - [`RegionIter`]: the cursor driving the scan page by page
//! - [`with_retry`]: bounded retry with delay, jitter and cancellation
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use std::future::pending;
//!
//! use region_iter::impls::region_table::RegionTable;
//! use region_iter::Peer;
//! use region_iter::Region;
//! use region_iter::RegionIter;
//! use region_iter::RegionWithLeader;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let mut table = RegionTable::new();
//!     table.insert(RegionWithLeader::new(Region::new(1, "", "m"), Some(Peer::new(1, 1))));
//!     table.insert(RegionWithLeader::new(Region::new(2, "m", ""), Some(Peer::new(2, 2))));
//!
//!     // An empty end key scans to the end of the keyspace.
//!     let mut it = RegionIter::new(&table, "a", "");
//!     while !it.is_done() {
//!         for r in it.next_page(pending()).await? {
//!             println!("{} led by {:?}", r.region, r.leader);
//!         }
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod consistency;
pub mod errors;
pub mod impls;
pub mod key;
pub mod region;
pub mod region_iter;
pub mod retry;
pub mod scanner;


pub use crate::consistency::check_region_consistency;
pub use crate::errors::ConsistencyError;
pub use crate::errors::RegionIterError;
pub use crate::errors::RetryError;
pub use crate::errors::ScanError;
pub use crate::key::KeyBound;
pub use crate::region::Peer;
pub use crate::region::Region;
pub use crate::region::RegionEpoch;
pub use crate::region::RegionWithLeader;
pub use crate::region_iter::iterate_region;
pub use crate::region_iter::RegionIter;
pub use crate::region_iter::RegionPageStream;
pub use crate::region_iter::DEFAULT_PAGE_SIZE;
pub use crate::retry::with_retry;
pub use crate::retry::RetryPolicy;
pub use crate::scanner::RegionScanner;
