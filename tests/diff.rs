//! Integration tests for the paginated diff engine

use futures::StreamExt;
use pagediff::{
    collect_results, compare_numeric, page_fn, Changes, Page, PageFetcher, PaginationDiff,
    SourceConfig, VecPages,
};
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
struct SourceDown(&'static str);

/// Serves `pages` with a varying delay per call, then end-of-stream
fn delayed(pages: Vec<Vec<i64>>, seed: u64) -> impl PageFetcher<Record = i64, Error = SourceDown> {
    let mut pages = VecDeque::from(pages);
    let mut calls = 0u64;
    page_fn(move || {
        calls += 1;
        let page = Page::from(pages.pop_front());
        let delay = Duration::from_millis(1 + (calls * 7 + seed) % 12);
        async move {
            tokio::time::sleep(delay).await;
            Ok::<_, SourceDown>(page)
        }
    })
}

/// Serves `pages`, then fails instead of signaling end-of-stream
fn failing_after(
    pages: Vec<Vec<i64>>,
    delay: Option<Duration>,
) -> impl PageFetcher<Record = i64, Error = SourceDown> {
    let mut pages = VecDeque::from(pages);
    page_fn(move || {
        let page = pages.pop_front();
        async move {
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            page.map(Page::Records).ok_or(SourceDown("blah"))
        }
    })
}

async fn diff_sources<A, B>(a: A, b: B) -> Result<Changes<i64>, SourceDown>
where
    A: PageFetcher<Record = i64, Error = SourceDown> + 'static,
    B: PageFetcher<Record = i64, Error = SourceDown> + 'static,
{
    let diff = PaginationDiff::new(SourceConfig::new(a, 6), SourceConfig::new(b, 6), i64::cmp);
    collect_results(diff.into_stream()).await
}

#[tokio::test]
async fn test_multiple_pages() {
    let result = diff_sources(
        delayed(vec![vec![1, 20], vec![29, 30], vec![34, 38, 40, 42]], 3),
        delayed(vec![vec![1, 19], vec![32, 34], vec![35, 36, 38]], 5),
    )
    .await
    .unwrap();

    assert_eq!(result.add, vec![19, 32, 35, 36]);
    assert_eq!(result.remove, vec![20, 29, 30, 40, 42]);
}

#[tokio::test]
async fn test_one_page_each() {
    let result = diff_sources(
        delayed(vec![vec![2, 20, 25, 30]], 1),
        delayed(vec![vec![1, 30, 40]], 8),
    )
    .await
    .unwrap();

    assert_eq!(result.add, vec![1, 40]);
    assert_eq!(result.remove, vec![2, 20, 25]);
}

#[tokio::test]
async fn test_source_b_empty_removes_everything() {
    let result = diff_sources(delayed(vec![vec![1, 2, 3]], 0), delayed(vec![], 0))
        .await
        .unwrap();

    assert!(result.add.is_empty());
    assert_eq!(result.remove, vec![1, 2, 3]);
}

#[tokio::test]
async fn test_source_a_empty_adds_everything() {
    let result = diff_sources(delayed(vec![], 2), delayed(vec![vec![4, 5], vec![6]], 4))
        .await
        .unwrap();

    assert_eq!(result.add, vec![4, 5, 6]);
    assert!(result.remove.is_empty());
}

#[tokio::test]
async fn test_identical_sources_with_different_pages() {
    let result = diff_sources(
        delayed(vec![vec![1], vec![2, 3, 4], vec![5]], 9),
        delayed(vec![vec![1, 2], vec![3], vec![4, 5]], 2),
    )
    .await
    .unwrap();

    assert!(result.is_empty());
}

#[tokio::test]
async fn test_json_records_with_numeric_comparator() {
    let a: VecPages<Value> = VecPages::new(vec![vec![json!(1), json!("20")], vec![json!(29)]]);
    let b: VecPages<Value> = VecPages::new(vec![vec![json!("1"), json!(19)], vec![json!(29)]]);
    let diff = PaginationDiff::new(
        SourceConfig::with_default_buffer(a),
        SourceConfig::with_default_buffer(b),
        compare_numeric,
    );

    let result: Changes<Value> = collect_results(diff.into_stream()).await.unwrap();

    assert_eq!(result.add, vec![json!(19)]);
    assert_eq!(result.remove, vec![json!("20")]);
}

#[tokio::test]
async fn test_large_integer_ids_are_not_merged() {
    let a: VecPages<Value> = VecPages::new(vec![vec![json!(9007199254740993u64)]]);
    let b: VecPages<Value> = VecPages::new(vec![vec![json!(9007199254740992u64)]]);
    let diff = PaginationDiff::new(
        SourceConfig::with_default_buffer(a),
        SourceConfig::with_default_buffer(b),
        compare_numeric,
    );

    let result: Changes<Value> = collect_results(diff.into_stream()).await.unwrap();

    assert_eq!(result.add, vec![json!(9007199254740992u64)]);
    assert_eq!(result.remove, vec![json!(9007199254740993u64)]);
}

#[tokio::test]
async fn test_fails_after_some_pages() {
    let result = diff_sources(
        delayed(vec![vec![2, 20, 25, 30]], 4),
        failing_after(vec![vec![1, 19], vec![32, 34], vec![35, 36, 38]], None),
    )
    .await;

    assert_eq!(result, Err(SourceDown("blah")));
}

#[tokio::test]
async fn test_fails_on_first_fetch() {
    let result = diff_sources(
        delayed(vec![vec![2, 20, 25, 30]], 4),
        failing_after(vec![], None),
    )
    .await;

    assert_eq!(result, Err(SourceDown("blah")));
}

#[tokio::test]
async fn test_fails_after_some_delayed_pages() {
    let result = diff_sources(
        delayed(vec![vec![2, 20, 25, 30]], 6),
        failing_after(
            vec![vec![1, 19], vec![32, 34], vec![35, 36, 38]],
            Some(Duration::from_millis(7)),
        ),
    )
    .await;

    assert_eq!(result, Err(SourceDown("blah")));
}

#[tokio::test]
async fn test_fails_slowly_before_any_data() {
    let result = diff_sources(
        delayed(vec![vec![2, 20, 25, 30]], 6),
        failing_after(vec![], Some(Duration::from_millis(40))),
    )
    .await;

    assert_eq!(result, Err(SourceDown("blah")));
}

#[tokio::test]
async fn test_no_batches_after_failure() {
    let diff = PaginationDiff::new(
        SourceConfig::new(delayed(vec![vec![1], vec![2], vec![3]], 0), 6),
        SourceConfig::new(failing_after(vec![vec![1]], None), 6),
        i64::cmp,
    );
    let batches: Vec<_> = diff.into_stream().collect().await;

    let last = batches.last().unwrap();
    assert_eq!(last, &Err(SourceDown("blah")));
    assert_eq!(batches.iter().filter(|batch| batch.is_err()).count(), 1);
}

#[tokio::test]
async fn test_never_two_fetches_in_flight() {
    fn guarded(pages: Vec<Vec<i64>>) -> impl PageFetcher<Record = i64, Error = SourceDown> {
        let in_flight = Arc::new(AtomicBool::new(false));
        let mut pages = VecDeque::from(pages);
        page_fn(move || {
            let reentered = in_flight.swap(true, Ordering::SeqCst);
            let in_flight = Arc::clone(&in_flight);
            let page = Page::from(pages.pop_front());
            async move {
                if reentered {
                    return Err(SourceDown("fetch issued while another was in flight"));
                }
                tokio::time::sleep(Duration::from_millis(3)).await;
                in_flight.store(false, Ordering::SeqCst);
                Ok(page)
            }
        })
    }

    let a: Vec<Vec<i64>> = (0..20).map(|i| vec![i * 10, i * 10 + 1]).collect();
    let b: Vec<Vec<i64>> = (0..15).map(|i| vec![i * 10 + 1, i * 10 + 5, i * 10 + 7]).collect();

    let diff = PaginationDiff::new(
        SourceConfig::new(guarded(a), 1),
        SourceConfig::new(guarded(b), 1),
        i64::cmp,
    );
    let result = collect_results(diff.into_stream()).await.unwrap();

    assert_eq!(result.remove.first(), Some(&0));
    assert_eq!(result.add.first(), Some(&5));
}

#[tokio::test]
async fn test_dropping_the_stream_stops_fetching() {
    let started = Arc::new(AtomicUsize::new(0));
    let finished = Arc::new(AtomicUsize::new(0));

    let counted = {
        let started = Arc::clone(&started);
        let finished = Arc::clone(&finished);
        let mut next = 0i64;
        page_fn(move || {
            started.fetch_add(1, Ordering::SeqCst);
            let finished = Arc::clone(&finished);
            next += 1;
            let page = vec![next];
            async move {
                tokio::time::sleep(Duration::from_millis(30)).await;
                finished.fetch_add(1, Ordering::SeqCst);
                Ok::<_, SourceDown>(Page::Records(page))
            }
        })
    };
    let endless_b = page_fn(|| async { Ok::<_, SourceDown>(Page::Records(vec![0i64])) });

    let mut batches = Box::pin(
        PaginationDiff::new(
            SourceConfig::new(counted, 6),
            SourceConfig::new(endless_b, 6),
            i64::cmp,
        )
        .into_stream(),
    );

    assert!(batches.next().await.unwrap().is_ok());
    let issued = started.load(Ordering::SeqCst);
    drop(batches);

    tokio::time::sleep(Duration::from_millis(100)).await;

    assert_eq!(started.load(Ordering::SeqCst), issued);
    // the fetch-ahead started during the first round was aborted
    assert!(finished.load(Ordering::SeqCst) < issued);
}
