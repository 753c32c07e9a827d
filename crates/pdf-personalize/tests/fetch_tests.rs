mod common;

use common::{Reply, serve};
use pdf_personalize::*;
use std::time::{Duration, Instant};

fn options(retries: u32, backoff_ms: u64) -> FetchOptions {
    FetchOptions {
        timeout_ms: 2_000,
        retries,
        backoff_ms,
    }
}

#[tokio::test]
async fn test_fetch_success() {
    let server = serve(|_| Reply::Ok(b"%PDF-1.7 body".to_vec())).await;
    let fetcher = RemoteTailFetcher::new(options(3, 10)).unwrap();
    assert_eq!(fetcher.options().retries, 3);

    let bytes = fetcher.fetch(&server.url).await.unwrap();
    assert_eq!(bytes, b"%PDF-1.7 body");
    assert_eq!(server.hits(), 1);
}

#[tokio::test]
async fn test_fetch_retries_then_succeeds() {
    let server = serve(|n| {
        if n < 3 {
            Reply::Status(503)
        } else {
            Reply::Ok(b"tail".to_vec())
        }
    })
    .await;
    let fetcher = RemoteTailFetcher::new(options(3, 50)).unwrap();

    let started = Instant::now();
    let bytes = fetcher.fetch(&server.url).await.unwrap();
    assert_eq!(bytes, b"tail");
    assert_eq!(server.hits(), 3);
    // Waits of 50ms then 100ms between the three attempts
    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_millis(150));
    assert!(
        elapsed < Duration::from_millis(150) + Duration::from_secs(1),
        "backoff took {:?}",
        elapsed
    );
}

#[tokio::test]
async fn test_fetch_exhausts_attempts() {
    let server = serve(|_| Reply::Status(404)).await;
    let fetcher = RemoteTailFetcher::new(options(2, 10)).unwrap();

    let result = fetcher.fetch(&server.url).await;
    match result {
        Err(PersonalizeError::Fetch {
            attempts,
            source: FetchError::Status(status),
            ..
        }) => {
            assert_eq!(attempts, 2);
            assert_eq!(status.as_u16(), 404);
        }
        other => panic!("Expected Fetch error, got {:?}", other),
    }
    assert_eq!(server.hits(), 2);
}

#[tokio::test]
async fn test_fetch_times_out_each_attempt() {
    let server = serve(|_| Reply::Hang).await;
    let fetcher = RemoteTailFetcher::new(FetchOptions {
        timeout_ms: 100,
        retries: 2,
        backoff_ms: 10,
    })
    .unwrap();

    let started = Instant::now();
    let result = fetcher.fetch(&server.url).await;
    assert!(matches!(
        result,
        Err(PersonalizeError::Fetch {
            source: FetchError::Timeout(_),
            ..
        })
    ));
    assert!(started.elapsed() < Duration::from_secs(5));
}

#[tokio::test]
async fn test_single_attempt_does_not_wait() {
    let server = serve(|_| Reply::Status(500)).await;
    let fetcher = RemoteTailFetcher::new(options(1, 5_000)).unwrap();

    let started = Instant::now();
    assert!(fetcher.fetch(&server.url).await.is_err());
    assert!(started.elapsed() < Duration::from_secs(2));
    assert_eq!(server.hits(), 1);
}

#[test]
fn test_zero_retries_rejected() {
    assert!(matches!(
        RemoteTailFetcher::new(options(0, 10)),
        Err(PersonalizeError::Config(_))
    ));
}
