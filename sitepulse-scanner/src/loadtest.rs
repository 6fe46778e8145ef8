use crate::error::{Result, ScanError};
use crate::result::{LoadTestResult, RequestQueueItem};
use crate::stats::{LoadTestSummary, summarize};
use crate::transport::HttpTransport;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, mpsc};
use tokio::time::Instant;
use tracing::{debug, info};

pub const DEFAULT_CONCURRENCY: usize = 10;
pub const DEFAULT_REQUESTS_PER_URL: usize = 1;

pub type LoadTestResultCallback = Arc<dyn Fn(&LoadTestResult) + Send + Sync>;

#[derive(Debug, Clone, PartialEq)]
pub struct LoadTestConfig {
    /// Maximum number of outstanding requests.
    pub concurrency: usize,
    pub requests_per_url: usize,
    /// Soft cap on dispatch; in-flight requests still drain after it elapses.
    pub duration: Option<Duration>,
}

impl Default for LoadTestConfig {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            requests_per_url: DEFAULT_REQUESTS_PER_URL,
            duration: None,
        }
    }
}

impl LoadTestConfig {
    pub fn validate(&self) -> Result<()> {
        if self.concurrency == 0 {
            return Err(ScanError::InvalidConfig(
                "concurrency must be at least 1".to_string(),
            ));
        }
        if self.requests_per_url == 0 {
            return Err(ScanError::InvalidConfig(
                "requests per URL must be at least 1".to_string(),
            ));
        }
        if let Some(duration) = self.duration
            && duration.is_zero()
        {
            return Err(ScanError::InvalidConfig(
                "duration must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Results in completion order, plus the summary derived from them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadTestOutcome {
    pub summary: LoadTestSummary,
    pub results: Vec<LoadTestResult>,
}

/// Every (url, repetition) pair, one full pass over `urls` per repetition.
pub fn build_queue(urls: &[String], requests_per_url: usize) -> VecDeque<RequestQueueItem> {
    let mut queue = VecDeque::with_capacity(urls.len() * requests_per_url);
    for repetition in 0..requests_per_url {
        for url in urls {
            queue.push_back(RequestQueueItem {
                url: url.clone(),
                repetition,
            });
        }
    }
    queue
}

pub struct LoadTester {
    transport: Arc<dyn HttpTransport>,
    config: LoadTestConfig,
    result_callback: Option<LoadTestResultCallback>,
}

impl LoadTester {
    pub fn new(transport: Arc<dyn HttpTransport>, config: LoadTestConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            transport,
            config,
            result_callback: None,
        })
    }

    pub fn with_result_callback(mut self, callback: LoadTestResultCallback) -> Self {
        self.result_callback = Some(callback);
        self
    }

    pub fn config(&self) -> &LoadTestConfig {
        &self.config
    }

    pub async fn run(&self, urls: &[String]) -> Result<LoadTestOutcome> {
        let queue = build_queue(urls, self.config.requests_per_url);
        let total = queue.len();
        let workers = self.config.concurrency.min(total);

        info!(
            "Starting load test: {} requests ({} URLs x {}) with {} workers",
            total,
            urls.len(),
            self.config.requests_per_url,
            workers
        );

        let start = Instant::now();
        let queue = Arc::new(Mutex::new(queue));
        let (tx, mut rx) = mpsc::unbounded_channel::<LoadTestResult>();

        let mut worker_handles = Vec::with_capacity(workers);
        for worker_id in 0..workers {
            let transport = self.transport.clone();
            let queue = queue.clone();
            let tx = tx.clone();
            let duration = self.config.duration;

            let handle = tokio::spawn(async move {
                debug!("Worker {} started", worker_id);

                loop {
                    if let Some(limit) = duration
                        && start.elapsed() >= limit
                    {
                        debug!("Worker {} stopping: duration cap reached", worker_id);
                        break;
                    }

                    let item = { queue.lock().await.pop_front() };
                    let Some(item) = item else {
                        break;
                    };

                    let result = execute_request(transport.as_ref(), item).await;
                    if tx.send(result).is_err() {
                        break;
                    }
                }

                debug!("Worker {} finished", worker_id);
            });

            worker_handles.push(handle);
        }

        // The channel closes once every worker has dropped its sender.
        drop(tx);

        let mut results = Vec::with_capacity(total);
        while let Some(result) = rx.recv().await {
            if let Some(ref callback) = self.result_callback {
                callback(&result);
            }
            results.push(result);
        }

        for handle in worker_handles {
            handle.await?;
        }

        let elapsed = start.elapsed().as_secs_f64();
        let undispatched = queue.lock().await.len();
        if undispatched > 0 {
            info!("Duration cap reached, {} requests were not dispatched", undispatched);
        }

        let summary = summarize(&results, elapsed);
        info!(
            "Load test complete: {} requests in {:.2}s ({:.2} req/s)",
            summary.total_requests, summary.total_duration, summary.requests_per_second
        );

        Ok(LoadTestOutcome { summary, results })
    }
}

async fn execute_request(transport: &dyn HttpTransport, item: RequestQueueItem) -> LoadTestResult {
    let dispatched = Instant::now();
    let outcome = transport.get(&item.url).await;
    let response_time = dispatched.elapsed().as_millis() as u64;

    match outcome {
        Ok(response) => LoadTestResult::from_status(item.url, response.status, response_time),
        Err(e) => {
            debug!("Request to {} failed: {}", item.url, e);
            LoadTestResult::from_error(item.url, e.to_string(), response_time)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransportError;
    use crate::transport::{LOAD_TEST_TIMEOUT, ReqwestTransport, TransportResponse};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{method, path},
    };

    /// Answers after a fixed latency and tracks how many calls overlap.
    struct MockTransport {
        latency: Duration,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
        calls: std::sync::Mutex<Vec<String>>,
    }

    impl MockTransport {
        fn new(latency: Duration) -> Arc<Self> {
            Arc::new(Self {
                latency,
                in_flight: AtomicUsize::new(0),
                max_in_flight: AtomicUsize::new(0),
                calls: std::sync::Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl HttpTransport for MockTransport {
        async fn get(&self, url: &str) -> std::result::Result<TransportResponse, TransportError> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            self.calls.lock().unwrap().push(url.to_string());

            tokio::time::sleep(self.latency).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            if url.contains("timeout") {
                Err(TransportError::Timeout(15000))
            } else if url.contains("error") {
                Ok(TransportResponse {
                    status: 500,
                    body: String::new(),
                })
            } else {
                Ok(TransportResponse {
                    status: 200,
                    body: String::new(),
                })
            }
        }

        async fn head(&self, url: &str) -> std::result::Result<TransportResponse, TransportError> {
            self.get(url).await
        }
    }

    fn urls(count: usize) -> Vec<String> {
        (0..count)
            .map(|i| format!("https://example.com/page{}", i))
            .collect()
    }

    fn config(concurrency: usize, requests_per_url: usize) -> LoadTestConfig {
        LoadTestConfig {
            concurrency,
            requests_per_url,
            duration: None,
        }
    }

    #[test]
    fn test_build_queue_enumerates_each_pass_in_url_order() {
        let urls = vec!["a".to_string(), "b".to_string()];
        let queue: Vec<_> = build_queue(&urls, 2)
            .into_iter()
            .map(|item| (item.url, item.repetition))
            .collect();

        assert_eq!(
            queue,
            vec![
                ("a".to_string(), 0),
                ("b".to_string(), 0),
                ("a".to_string(), 1),
                ("b".to_string(), 1),
            ]
        );
    }

    #[test]
    fn test_config_validation() {
        assert!(LoadTestConfig::default().validate().is_ok());
        assert!(matches!(
            config(0, 1).validate(),
            Err(ScanError::InvalidConfig(_))
        ));
        assert!(matches!(
            config(1, 0).validate(),
            Err(ScanError::InvalidConfig(_))
        ));

        let zero_duration = LoadTestConfig {
            duration: Some(Duration::ZERO),
            ..LoadTestConfig::default()
        };
        assert!(LoadTester::new(MockTransport::new(Duration::ZERO), zero_duration).is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_outstanding_requests_never_exceed_concurrency() {
        let transport = MockTransport::new(Duration::from_millis(20));
        let tester = LoadTester::new(transport.clone(), config(3, 1)).unwrap();

        let outcome = tester.run(&urls(20)).await.unwrap();

        assert_eq!(outcome.results.len(), 20);
        assert_eq!(transport.max_in_flight.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_produces_exactly_n_times_k_results() {
        let transport = MockTransport::new(Duration::from_millis(5));
        let tester = LoadTester::new(transport, config(5, 3)).unwrap();
        let urls = urls(4);

        let outcome = tester.run(&urls).await.unwrap();

        assert_eq!(outcome.results.len(), 12);
        assert_eq!(outcome.summary.total_requests, 12);
        for url in &urls {
            let hits = outcome.results.iter().filter(|r| &r.url == url).count();
            assert_eq!(hits, 3, "{} should be requested 3 times", url);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_worker_follows_enumeration_order() {
        let transport = MockTransport::new(Duration::from_millis(10));
        let tester = LoadTester::new(transport.clone(), config(1, 1)).unwrap();
        let urls = vec![
            "https://example.com/a".to_string(),
            "https://example.com/b".to_string(),
        ];

        let outcome = tester.run(&urls).await.unwrap();

        let recorded: Vec<_> = outcome.results.iter().map(|r| r.url.clone()).collect();
        assert_eq!(recorded, urls);
        assert_eq!(transport.max_in_flight.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_duration_cap_stops_dispatch_and_drains() {
        let transport = MockTransport::new(Duration::from_millis(50));
        let tester = LoadTester::new(
            transport.clone(),
            LoadTestConfig {
                concurrency: 2,
                requests_per_url: 1,
                duration: Some(Duration::from_millis(120)),
            },
        )
        .unwrap();

        let outcome = tester.run(&urls(50)).await.unwrap();

        // Dispatch at t=0, 50 and 100ms; the pair started at 100ms drains at 150ms.
        assert_eq!(outcome.results.len(), 6);
        assert_eq!(transport.calls.lock().unwrap().len(), 6);
        assert!(outcome.summary.total_duration >= 0.15);
        assert!(outcome.summary.total_duration < 0.2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_throughput_matches_duration() {
        let transport = MockTransport::new(Duration::from_millis(100));
        let tester = LoadTester::new(transport, config(4, 2)).unwrap();

        let outcome = tester.run(&urls(10)).await.unwrap();
        let summary = &outcome.summary;

        let estimated = summary.requests_per_second * summary.total_duration;
        assert!((estimated - summary.total_requests as f64).abs() < 1.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failures_are_recorded_not_raised() {
        let transport = MockTransport::new(Duration::from_millis(1));
        let tester = LoadTester::new(transport, config(2, 1)).unwrap();
        let urls = vec![
            "https://example.com/ok".to_string(),
            "https://example.com/error".to_string(),
            "https://example.com/timeout".to_string(),
        ];

        let outcome = tester.run(&urls).await.unwrap();

        let by_url = |suffix: &str| {
            outcome
                .results
                .iter()
                .find(|r| r.url.ends_with(suffix))
                .unwrap()
                .clone()
        };

        let ok = by_url("/ok");
        assert!(ok.success);
        assert_eq!(ok.status_code, Some(200));

        let server_error = by_url("/error");
        assert!(!server_error.success);
        assert_eq!(server_error.status_code, Some(500));
        assert!(server_error.error.is_none());

        let timeout = by_url("/timeout");
        assert!(!timeout.success);
        assert_eq!(timeout.status_code, None);
        assert_eq!(timeout.error.as_deref(), Some("timeout of 15000ms exceeded"));

        assert_eq!(outcome.summary.successful_requests, 1);
        assert_eq!(outcome.summary.failed_requests, 2);
        assert_eq!(outcome.summary.errors.len(), 1);
    }

    #[tokio::test]
    async fn test_empty_url_list() {
        let transport = MockTransport::new(Duration::ZERO);
        let tester = LoadTester::new(transport, LoadTestConfig::default()).unwrap();

        let outcome = tester.run(&[]).await.unwrap();

        assert!(outcome.results.is_empty());
        assert_eq!(outcome.summary.total_requests, 0);
        assert_eq!(outcome.summary.average_response_time, 0.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_result_callback_sees_every_result() {
        let seen = Arc::new(AtomicUsize::new(0));
        let seen_clone = seen.clone();
        let transport = MockTransport::new(Duration::from_millis(5));
        let tester = LoadTester::new(transport, config(3, 2))
            .unwrap()
            .with_result_callback(Arc::new(move |_result| {
                seen_clone.fetch_add(1, Ordering::SeqCst);
            }));

        tester.run(&urls(5)).await.unwrap();

        assert_eq!(seen.load(Ordering::SeqCst), 10);
    }

    #[tokio::test]
    async fn test_load_test_against_live_server() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/up"))
            .respond_with(ResponseTemplate::new(200).set_body_string("fine"))
            .expect(4)
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(path("/down"))
            .respond_with(ResponseTemplate::new(503))
            .expect(4)
            .mount(&mock_server)
            .await;

        let transport = Arc::new(ReqwestTransport::with_timeout(LOAD_TEST_TIMEOUT).unwrap());
        let tester = LoadTester::new(transport, config(3, 4)).unwrap();
        let urls = vec![
            format!("{}/up", mock_server.uri()),
            format!("{}/down", mock_server.uri()),
        ];

        let outcome = tester.run(&urls).await.unwrap();

        assert_eq!(outcome.results.len(), 8);
        assert_eq!(outcome.summary.successful_requests, 4);
        assert_eq!(outcome.summary.status_code_distribution.get(&503), Some(&4));
        assert!(outcome.summary.errors.is_empty());
    }
}
