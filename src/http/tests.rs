//! Tests for the HTTP fetch module

use super::*;
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn instant_fetcher(max_retries: u32) -> RateLimitedFetcher {
    let config = FetcherConfig::builder()
        .max_retries(max_retries)
        .no_delays()
        .build();
    RateLimitedFetcher::with_config(config).unwrap()
}

// ============================================================================
// Config Tests
// ============================================================================

#[test]
fn test_fetcher_config_default() {
    let config = FetcherConfig::default();
    assert_eq!(config.timeout, Duration::from_secs(30));
    assert_eq!(config.max_retries, 5);
    assert_eq!(config.pacing, Pacing::default());
    assert_eq!(config.rate_limited_backoff, Backoff::rate_limited());
    assert_eq!(config.network_backoff, Backoff::network());
    assert_eq!(config.user_agents.len(), DEFAULT_USER_AGENTS.len());
    assert!(config.rate_limit.is_none());
}

#[test]
fn test_fetcher_config_builder() {
    let config = FetcherConfig::builder()
        .timeout(Duration::from_secs(5))
        .max_retries(2)
        .header("Referer", "https://www.example.com/")
        .user_agents(UserAgentPool::new(vec!["agent-a".to_string()]))
        .rate_limit(RateLimiterConfig::per_minute(10))
        .no_delays()
        .build();

    assert_eq!(config.timeout, Duration::from_secs(5));
    assert_eq!(config.max_retries, 2);
    assert_eq!(config.pacing, Pacing::none());
    assert_eq!(config.rate_limited_backoff, Backoff::none());
    assert_eq!(
        config.default_headers.get("Referer"),
        Some(&"https://www.example.com/".to_string())
    );
    assert_eq!(config.user_agents.agents(), ["agent-a".to_string()]);
    assert_eq!(config.rate_limit, Some(RateLimiterConfig::per_minute(10)));
}

#[test]
fn test_fetch_request_builder() {
    let request = FetchRequest::new("https://api.example.com/list")
        .param("mid", "42")
        .param("pn", 3)
        .retries(2);

    assert_eq!(request.params.get("mid"), Some(&"42".to_string()));
    assert_eq!(request.params.get("pn"), Some(&"3".to_string()));
    assert_eq!(request.max_retries, Some(2));
}

// ============================================================================
// Fetch Tests
// ============================================================================

#[tokio::test]
async fn test_fetch_success_returns_payload() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/x/list"))
        .and(query_param("mid", "42"))
        .and(query_param("pn", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"code": 0, "data": {}})))
        .expect(1)
        .mount(&server)
        .await;

    let fetcher = instant_fetcher(3);
    let request = FetchRequest::new(format!("{}/x/list", server.uri()))
        .param("mid", "42")
        .param("pn", "1");

    let payload = fetcher.fetch(&request).await.unwrap();
    assert_eq!(payload["code"], 0);
    assert_eq!(fetcher.requests_issued(), 1);
}

#[tokio::test]
async fn test_fetch_sends_rotated_agent_and_default_headers() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(header("user-agent", "agent-a"))
        .and(header("referer", "https://www.example.com/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .expect(1)
        .mount(&server)
        .await;

    let config = FetcherConfig::builder()
        .user_agents(UserAgentPool::new(vec!["agent-a".to_string()]))
        .header("Referer", "https://www.example.com/")
        .no_delays()
        .build();
    let fetcher = RateLimitedFetcher::with_config(config).unwrap();

    let payload = fetcher.fetch(&FetchRequest::new(server.uri())).await.unwrap();
    assert_eq!(payload["ok"], true);
}

#[tokio::test]
async fn test_fetch_retries_after_rate_limit() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(429))
        .up_to_n_times(2)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"value": 7})))
        .mount(&server)
        .await;

    let fetcher = instant_fetcher(5);
    let payload = fetcher.fetch(&FetchRequest::new(server.uri())).await.unwrap();

    assert_eq!(payload["value"], 7);
    assert_eq!(fetcher.requests_issued(), 3);
}

#[tokio::test]
async fn test_fetch_rate_limit_exhausts_retries() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(429))
        .expect(3)
        .mount(&server)
        .await;

    let fetcher = instant_fetcher(3);
    let failure = fetcher
        .fetch(&FetchRequest::new(server.uri()))
        .await
        .unwrap_err();

    assert_eq!(failure.kind, FailureKind::RateLimited);
    assert_eq!(failure.attempts, 3);
}

#[tokio::test]
async fn test_fetch_other_status_retried_then_fails() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(412).set_body_string("blocked"))
        .expect(4)
        .mount(&server)
        .await;

    let fetcher = instant_fetcher(4);
    let failure = fetcher
        .fetch(&FetchRequest::new(server.uri()))
        .await
        .unwrap_err();

    assert_eq!(failure.kind, FailureKind::PermanentHttp(412));
    assert_eq!(failure.attempts, 4);
}

#[tokio::test]
async fn test_fetch_server_error_recovers() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"code": 0})))
        .mount(&server)
        .await;

    let fetcher = instant_fetcher(2);
    assert!(fetcher.fetch(&FetchRequest::new(server.uri())).await.is_ok());
}

#[tokio::test]
async fn test_fetch_request_override_retries() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let fetcher = instant_fetcher(5);
    let failure = fetcher
        .fetch(&FetchRequest::new(server.uri()).retries(1))
        .await
        .unwrap_err();

    assert_eq!(failure.attempts, 1);
}

#[tokio::test]
async fn test_fetch_invalid_json_is_not_retried() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>captcha</html>"))
        .expect(1)
        .mount(&server)
        .await;

    let fetcher = instant_fetcher(5);
    let failure = fetcher
        .fetch(&FetchRequest::new(server.uri()))
        .await
        .unwrap_err();

    assert_eq!(failure.kind, FailureKind::Decode);
    assert_eq!(failure.attempts, 1);
}

#[tokio::test]
async fn test_fetch_connection_refused_is_transient() {
    // Port 9 (discard) is not listening on test hosts
    let fetcher = instant_fetcher(2);
    let failure = fetcher
        .fetch(&FetchRequest::new("http://127.0.0.1:9/list"))
        .await
        .unwrap_err();

    assert_eq!(failure.kind, FailureKind::TransientNetwork);
    assert_eq!(failure.attempts, 2);
    assert_eq!(fetcher.requests_issued(), 2);
}

#[tokio::test]
async fn test_fetch_timeout_is_transient() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"late": true}))
                .set_delay(Duration::from_millis(500)),
        )
        .mount(&server)
        .await;

    let config = FetcherConfig::builder()
        .timeout(Duration::from_millis(50))
        .max_retries(1)
        .no_delays()
        .build();
    let fetcher = RateLimitedFetcher::with_config(config).unwrap();

    let failure = fetcher
        .fetch(&FetchRequest::new(server.uri()))
        .await
        .unwrap_err();
    assert_eq!(failure.kind, FailureKind::TransientNetwork);
}

#[tokio::test]
async fn test_fetch_zero_retries_still_attempts_once() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let fetcher = instant_fetcher(0);
    assert!(fetcher.fetch(&FetchRequest::new(server.uri())).await.is_ok());
}

#[tokio::test]
async fn test_fetcher_with_shared_rate_limiter() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;

    let limiter = RateLimiter::new(&RateLimiterConfig::new(600, 10));
    let first = instant_fetcher(1).with_rate_limiter(limiter.clone());
    let second = instant_fetcher(1).with_rate_limiter(limiter);

    assert!(first.has_rate_limiter());
    assert!(first.fetch(&FetchRequest::new(server.uri())).await.is_ok());
    assert!(second.fetch(&FetchRequest::new(server.uri())).await.is_ok());
    // Each fetcher keeps its own pacing counter
    assert_eq!(first.requests_issued(), 1);
    assert_eq!(second.requests_issued(), 1);
}

// ============================================================================
// Timing Tests
// ============================================================================

const FIRST: Duration = Duration::from_millis(50);
const LATER: Duration = Duration::from_millis(200);
const BACKOFF_BASE: Duration = Duration::from_millis(150);

/// Fetcher with fixed pacing and no backoff
fn paced_fetcher() -> RateLimitedFetcher {
    let config = FetcherConfig::builder()
        .max_retries(1)
        .pacing(Pacing {
            first: DelayRange::new(FIRST.as_secs_f64(), FIRST.as_secs_f64()),
            subsequent: DelayRange::new(LATER.as_secs_f64(), LATER.as_secs_f64()),
        })
        .backoff(Backoff::none(), Backoff::none())
        .build();
    RateLimitedFetcher::with_config(config).unwrap()
}

/// Fetcher with no pacing and a short exponential backoff on both schedules
fn backoff_fetcher(max_retries: u32) -> RateLimitedFetcher {
    let backoff = Backoff::exponential(BACKOFF_BASE, Duration::from_secs(1));
    let config = FetcherConfig::builder()
        .max_retries(max_retries)
        .timeout(Duration::from_secs(5))
        .pacing(Pacing::none())
        .backoff(backoff, backoff)
        .build();
    RateLimitedFetcher::with_config(config).unwrap()
}

#[tokio::test]
async fn test_first_request_uses_short_pacing_range() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;

    let fetcher = paced_fetcher();
    let request = FetchRequest::new(server.uri());

    let started = std::time::Instant::now();
    fetcher.fetch(&request).await.unwrap();
    let first = started.elapsed();
    assert!(first >= FIRST, "{first:?}");
    assert!(first < LATER, "{first:?}");

    for _ in 0..2 {
        let started = std::time::Instant::now();
        fetcher.fetch(&request).await.unwrap();
        let later = started.elapsed();
        assert!(later >= LATER, "{later:?}");
        assert!(later < LATER * 2, "{later:?}");
    }
    assert_eq!(fetcher.requests_issued(), 3);
}

#[tokio::test]
async fn test_rate_limit_backoff_starts_at_base() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(429))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .mount(&server)
        .await;

    let fetcher = backoff_fetcher(3);
    let started = std::time::Instant::now();
    fetcher.fetch(&FetchRequest::new(server.uri())).await.unwrap();
    let elapsed = started.elapsed();

    // One wait of delay(0); delay(1) would be twice as long
    assert!(elapsed >= BACKOFF_BASE, "{elapsed:?}");
    assert!(elapsed < BACKOFF_BASE * 2, "{elapsed:?}");
}

#[tokio::test]
async fn test_no_backoff_after_final_attempt() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(429))
        .expect(3)
        .mount(&server)
        .await;

    let fetcher = backoff_fetcher(3);
    let started = std::time::Instant::now();
    let failure = fetcher
        .fetch(&FetchRequest::new(server.uri()))
        .await
        .unwrap_err();
    let elapsed = started.elapsed();

    assert_eq!(failure.kind, FailureKind::RateLimited);
    // delay(0) + delay(1) between the three attempts, nothing after the last
    assert!(elapsed >= BACKOFF_BASE * 3, "{elapsed:?}");
    assert!(elapsed < BACKOFF_BASE * 6, "{elapsed:?}");
}

#[tokio::test]
async fn test_refused_connection_backs_off_once_before_final_attempt() {
    let fetcher = backoff_fetcher(2);
    let started = std::time::Instant::now();
    let failure = fetcher
        .fetch(&FetchRequest::new("http://127.0.0.1:9/list"))
        .await
        .unwrap_err();
    let elapsed = started.elapsed();

    assert_eq!(failure.kind, FailureKind::TransientNetwork);
    assert!(elapsed >= BACKOFF_BASE, "{elapsed:?}");
    assert!(elapsed < BACKOFF_BASE * 2, "{elapsed:?}");
}

#[tokio::test]
async fn test_refused_connection_then_success() {
    // Reserve a port, then free it so the first attempt is refused
    let addr = std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap();
    let fetcher = backoff_fetcher(3);
    let request = FetchRequest::new(format!("http://{addr}/list"));

    let task = tokio::spawn(async move {
        let started = std::time::Instant::now();
        let outcome = fetcher.fetch(&request).await;
        (outcome, started.elapsed(), fetcher.requests_issued())
    });

    // Come up while the fetcher is in its first backoff wait
    tokio::time::sleep(BACKOFF_BASE / 5).await;
    let listener = std::net::TcpListener::bind(addr).unwrap();
    let server = MockServer::builder().listener(listener).start().await;
    Mock::given(method("GET"))
        .and(path("/list"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .mount(&server)
        .await;

    let (outcome, elapsed, issued) = task.await.unwrap();

    assert_eq!(outcome.unwrap(), json!({"ok": true}));
    assert_eq!(issued, 2);
    assert!(elapsed >= BACKOFF_BASE, "{elapsed:?}");
    assert!(elapsed < BACKOFF_BASE * 2, "{elapsed:?}");
}
