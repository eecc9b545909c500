use std::future::pending;
use std::time::Duration;

use futures_util::TryStreamExt;
use region_iter::impls::region_table::RegionTable;
use region_iter::Peer;
use region_iter::Region;
use region_iter::RegionIter;
use region_iter::RegionWithLeader;
use region_iter::RetryPolicy;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Build a region directory: ["", "g"), ["g", "p"), ["p", "")
    let mut table = RegionTable::new();
    table.insert(RegionWithLeader::new(
        Region::new(1, "", "g"),
        Some(Peer::new(11, 1)),
    ));
    table.insert(RegionWithLeader::new(
        Region::new(2, "g", "p"),
        Some(Peer::new(21, 2)),
    ));
    table.insert(RegionWithLeader::new(
        Region::new(3, "p", ""),
        Some(Peer::new(31, 3)),
    ));

    // Split a region, as the cluster would do when it grows.
    table.split(b"k", 4);

    // Scan a bounded range, one region per page.
    let mut it = RegionIter::new(&table, "c", "m")
        .with_page_size(1)
        .with_retry_policy(RetryPolicy::default().with_max_attempts(3));

    while !it.is_done() {
        let page = it.next_page(pending()).await?;
        for r in page {
            println!("bounded: {} led by {:?}", r.region, r.leader);
        }
    }

    // Scan to the end of the keyspace as a stream, giving up after 5 seconds.
    let strm = RegionIter::new(table.clone(), "", "")
        .with_page_size(2)
        .into_stream();

    let pages = tokio::time::timeout(Duration::from_secs(5), strm.try_collect::<Vec<_>>()).await??;
    for (i, page) in pages.iter().enumerate() {
        println!("page-{}: {} regions", i, page.len());
    }

    Ok(())
}
