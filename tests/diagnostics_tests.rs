use std::io::Write;
use std::sync::{Arc, Mutex};

use serde_json::Value;
use tracing::Level;
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

use post_burst::client::build_client;
use post_burst::config::{Config, NUM_WORKERS};
use post_burst::payload;
use post_burst::runner::dispatch;

/// In-memory log sink shared between the subscriber and the test.
#[derive(Clone, Default)]
struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl LogBuffer {
    /// Every captured event, one JSON object per line.
    fn events(&self) -> Vec<Value> {
        let bytes = self.0.lock().unwrap().clone();
        String::from_utf8(bytes)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).expect("log line is JSON"))
            .collect()
    }

    fn errors(&self) -> Vec<Value> {
        self.events()
            .into_iter()
            .filter(|e| e["level"] == "ERROR")
            .collect()
    }
}

/// Runs a burst with a JSON subscriber installed as the thread default.
///
/// The test runtime is current-thread, so every worker task logs through it.
async fn run_capturing(num_requests: usize, url: String) -> LogBuffer {
    let logs = LogBuffer::default();
    let subscriber = tracing_subscriber::fmt()
        .json()
        .with_max_level(Level::DEBUG)
        .with_writer({
            let logs = logs.clone();
            move || logs.clone()
        })
        .finish();
    let _default = tracing::subscriber::set_default(subscriber);

    let client = build_client(NUM_WORKERS).expect("Failed to build HTTP client");
    let payload = payload::load().expect("payload must encode");
    let config = Config::new(num_requests, url);
    dispatch(client, &config, payload).await;

    logs
}

#[tokio::test]
async fn each_server_error_is_logged_with_its_body() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("database is locked"))
        .expect(5)
        .mount(&server)
        .await;

    let logs = run_capturing(5, server.uri()).await;
    let errors = logs.errors();

    assert_eq!(errors.len(), 5, "expected one error event per failed request");

    let mut jobs: Vec<u64> = errors
        .iter()
        .map(|e| {
            assert_eq!(e["fields"]["body"], "database is locked");
            assert_eq!(e["fields"]["status_code"], 500);
            e["fields"]["job"].as_u64().unwrap()
        })
        .collect();
    jobs.sort_unstable();
    assert_eq!(jobs, vec![0, 1, 2, 3, 4]);
}

#[tokio::test]
async fn successful_burst_logs_no_errors() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(10)
        .mount(&server)
        .await;

    let logs = run_capturing(10, server.uri()).await;

    assert!(logs.errors().is_empty(), "unexpected errors: {:?}", logs.errors());
    let completed = logs
        .events()
        .iter()
        .filter(|e| e["fields"]["message"] == "Request completed")
        .count();
    assert_eq!(completed, 10);
}

#[tokio::test]
async fn transport_failures_are_logged_per_request() {
    let logs = run_capturing(3, "not a url".to_string()).await;
    let errors = logs.errors();

    assert_eq!(errors.len(), 3);
    for event in &errors {
        assert_eq!(event["fields"]["message"], "Request failed");
        assert!(event["fields"]["error"].is_string());
    }
}
