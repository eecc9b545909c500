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

//! Page by page iteration over the regions covering a key range.

use std::future::Future;

use futures_util::stream::BoxStream;
use futures_util::StreamExt;
use log::debug;

use crate::consistency::check_region_consistency;
use crate::errors::ConsistencyError;
use crate::errors::RegionIterError;
use crate::errors::RetryError;
use crate::errors::ScanError;
use crate::key::display_key;
use crate::key::KeyBound;
use crate::region::RegionWithLeader;
use crate::retry::with_retry;
use crate::retry::RetryPolicy;
use crate::scanner::RegionScanner;

/// Default max number of regions returned by one [`RegionIter::next_page`].
pub const DEFAULT_PAGE_SIZE: usize = 2048;

/// A stream of region pages, see [`RegionIter::into_stream`].
pub type RegionPageStream = BoxStream<'static, Result<Vec<RegionWithLeader>, RegionIterError>>;

/// Create an iterator over the regions covering `[start_key, end_key)`.
///
/// An empty `end_key` means to scan to the end of the keyspace.
pub fn iterate_region<S>(
    scanner: S,
    start_key: impl Into<Vec<u8>>,
    end_key: impl Into<Vec<u8>>,
) -> RegionIter<S>
where
    S: RegionScanner,
{
    RegionIter::new(scanner, start_key, end_key)
}

/// Iterates over the regions covering a key range, one page at a time.
///
/// Every page is checked to be a gap-free cover of the range it was queried for,
/// before the cursor advances.
/// A failed scan or an inconsistent page is retried according to the [`RetryPolicy`].
///
/// Pages are fetched strictly in order:
/// `next_page` takes `&mut self`, use independent iterators over disjoint ranges
/// to scan in parallel.
///
/// ```rust,no_run
/// use std::future::pending;
///
/// use region_iter::impls::region_table::RegionTable;
/// use region_iter::RegionIter;
///
/// # async fn run(table: RegionTable) -> Result<(), region_iter::RegionIterError> {
/// let mut it = RegionIter::new(&table, "a", "");
/// while !it.is_done() {
///     for r in it.next_page(pending()).await? {
///         println!("{}", r.region);
///     }
/// }
/// # Ok(())
/// # }
/// ```
pub struct RegionIter<S> {
    scanner: S,

    start_key: Vec<u8>,
    end_key: Vec<u8>,

    /// Where the next page starts.
    current_start_key: Vec<u8>,

    /// Set when a region with an unbounded end is returned.
    ///
    /// `current_start_key` then becomes the empty key,
    /// which can not be compared with `end_key` to tell the scan is done.
    finished: bool,

    /// Max number of regions returned by the next [`RegionIter::next_page`].
    ///
    /// It can be changed between two calls.
    pub page_size: usize,

    retry_policy: RetryPolicy,
}

impl<S> RegionIter<S>
where S: RegionScanner
{
    pub fn new(scanner: S, start_key: impl Into<Vec<u8>>, end_key: impl Into<Vec<u8>>) -> Self {
        let start_key = start_key.into();
        Self {
            scanner,
            current_start_key: start_key.clone(),
            start_key,
            end_key: end_key.into(),
            finished: false,
            page_size: DEFAULT_PAGE_SIZE,
            retry_policy: RetryPolicy::default(),
        }
    }

    pub fn with_retry_policy(mut self, retry_policy: RetryPolicy) -> Self {
        self.retry_policy = retry_policy;
        self
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn start_key(&self) -> &[u8] {
        &self.start_key
    }

    pub fn end_key(&self) -> &[u8] {
        &self.end_key
    }

    pub fn current_start_key(&self) -> &[u8] {
        &self.current_start_key
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry_policy
    }

    /// Fetch the next page of regions.
    ///
    /// Returns a non-empty, gap-free list of regions starting from the region
    /// that contains the current cursor, or an empty list if the iteration is already done.
    ///
    /// `cancel` aborts the fetch as soon as it resolves, during a scan or between two retries.
    /// The cursor is left untouched on error.
    pub async fn next_page<C>(&mut self, cancel: C) -> Result<Vec<RegionWithLeader>, RegionIterError>
    where C: Future<Output = ()> {
        if self.is_done() {
            return Ok(vec![]);
        }

        let scanner = &self.scanner;
        let start_key = self.current_start_key.as_slice();
        let end_key = self.end_key.as_slice();
        let limit = self.page_size;

        let res = with_retry(&self.retry_policy, cancel, |_attempt| {
            scan_page(scanner, start_key, end_key, limit)
        })
        .await;

        let regions = match res {
            Ok(regions) => regions,
            Err(RetryError::Exhausted { attempts, last }) => {
                return Err(RegionIterError::RetryExhausted {
                    start_key: start_key.to_vec(),
                    end_key: end_key.to_vec(),
                    attempts,
                    source: last,
                });
            }
            Err(RetryError::Cancelled) => {
                return Err(RegionIterError::Cancelled {
                    start_key: start_key.to_vec(),
                    end_key: end_key.to_vec(),
                });
            }
        };

        if let Some(last) = regions.last() {
            // We have met the last region.
            if last.end_key().is_empty() {
                self.finished = true;
            }
            self.current_start_key = last.end_key().to_vec();
        }

        debug!(
            "scanned {} regions, next start_key: {}, finished: {}",
            regions.len(),
            display_key(&self.current_start_key),
            self.finished
        );

        Ok(regions)
    }

    /// Returns `true` if all regions in the range have been returned.
    pub fn is_done(&self) -> bool {
        if self.finished {
            return true;
        }

        KeyBound::from_end_key(&self.end_key).is_reached_by(&self.current_start_key)
    }

    /// Convert into a stream of pages.
    ///
    /// The stream ends after the last page or right after the first error.
    /// Retries are not cancellable; drop the stream to stop it.
    pub fn into_stream(self) -> RegionPageStream
    where S: 'static {
        futures::stream::unfold(Some(self), |state| async move {
            let mut it = state?;
            if it.is_done() {
                return None;
            }

            match it.next_page(std::future::pending()).await {
                Ok(page) => Some((Ok(page), Some(it))),
                Err(e) => Some((Err(e), None)),
            }
        })
        .boxed()
    }
}

/// Scan one page and check it covers `[start_key, end of the last region)`.
///
/// An empty page is checked against the queried `end_key` and always fails.
/// A page that does not end after `start_key` is rejected too,
/// otherwise the cursor would move backward.
async fn scan_page<S>(
    scanner: &S,
    start_key: &[u8],
    end_key: &[u8],
    limit: usize,
) -> Result<Vec<RegionWithLeader>, ScanError>
where
    S: RegionScanner + ?Sized,
{
    let regions = scanner.region_scan(start_key, end_key, limit).await?;

    let observed_end = match regions.last() {
        Some(last) => last.end_key(),
        None => end_key,
    };
    check_region_consistency(start_key, observed_end, &regions)?;

    if let Some(last) = regions.last() {
        if last.region.end_bound().is_reached_by(start_key) {
            return Err(ConsistencyError::NoProgress {
                start_key: start_key.to_vec(),
                region_end_key: last.end_key().to_vec(),
            }
            .into());
        }
    }

    Ok(regions)
}
