pub mod error;
pub mod loadtest;
pub mod reachability;
pub mod result;
pub mod sitemap;
pub mod stats;
pub mod transport;

pub use error::{ScanError, TransportError};
pub use loadtest::{LoadTestConfig, LoadTestOutcome, LoadTestResultCallback, LoadTester};
pub use reachability::{CheckProgressCallback, Reachability, ReachabilityChecker, ReachabilityReport};
pub use result::{LoadTestResult, RequestQueueItem};
pub use sitemap::{ResolveStats, ResolverProgressCallback, SitemapNode, SitemapResolver};
pub use stats::{LoadTestSummary, summarize};
pub use transport::{HttpTransport, ReqwestTransport, TransportResponse};
