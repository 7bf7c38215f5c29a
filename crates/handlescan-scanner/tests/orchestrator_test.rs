use async_trait::async_trait;
use handlescan_catalog::{PlatformCatalog, PlatformCategory, PlatformDescriptor};
use handlescan_core::{PlatformId, ProbeConfig};
use handlescan_scanner::{
    FetchFailure, FetchResult, Fetcher, PlatformFilter, ProbeOrchestrator, ProbeSettings,
    RunCompletion, ScanError, UncertainReason, VerdictKind,
};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// What the scripted fetcher does for one call.
#[derive(Clone)]
enum Step {
    Respond(u16, String),
    Fail(FetchFailure),
    Delay(Duration, Box<Step>),
    Hang,
    Panic,
}

fn ok(body: &str) -> Step {
    Step::Respond(200, body.to_string())
}

/// Fetcher that replays per-URL scripts and records concurrency.
struct ScriptedFetcher {
    scripts: Mutex<HashMap<String, VecDeque<Step>>>,
    fallback: Step,
    calls: Mutex<Vec<String>>,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

impl ScriptedFetcher {
    fn new(fallback: Step) -> Self {
        Self {
            scripts: Mutex::new(HashMap::new()),
            fallback,
            calls: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        }
    }

    fn script(self, url: &str, steps: Vec<Step>) -> Self {
        self.scripts
            .lock()
            .unwrap()
            .insert(url.to_string(), steps.into());
        self
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn calls_to(&self, url: &str) -> usize {
        self.calls().iter().filter(|called| *called == url).count()
    }

    fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    fn next_step(&self, url: &str) -> Step {
        self.scripts
            .lock()
            .unwrap()
            .get_mut(url)
            .and_then(VecDeque::pop_front)
            .unwrap_or_else(|| self.fallback.clone())
    }
}

struct InFlightGuard<'a>(&'a AtomicUsize);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl Fetcher for ScriptedFetcher {
    async fn get(&self, url: &str, _timeout: Duration) -> FetchResult {
        self.calls.lock().unwrap().push(url.to_string());
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        let _guard = InFlightGuard(&self.in_flight);

        let mut step = self.next_step(url);
        loop {
            match step {
                Step::Respond(status, body) => return FetchResult::response(url, url, status, body),
                Step::Fail(failure) => return FetchResult::failed(url, failure),
                Step::Delay(delay, then) => {
                    tokio::time::sleep(delay).await;
                    step = *then;
                }
                Step::Hang => return std::future::pending().await,
                Step::Panic => panic!("scripted panic for {url}"),
            }
        }
    }
}

fn id(value: &str) -> PlatformId {
    PlatformId::new(value).expect("valid test platform ID")
}

fn url(index: usize, username: &str) -> String {
    format!("https://p{index:02}.example/{username}")
}

/// Catalog of `n` platforms `p00`, `p01`, ... with a shared body marker.
fn catalog(n: usize) -> PlatformCatalog {
    let platforms = (0..n)
        .map(|i| {
            let category = if i % 2 == 0 {
                PlatformCategory::Social
            } else {
                PlatformCategory::Developer
            };
            PlatformDescriptor::new(
                id(&format!("p{i:02}")),
                format!("Platform {i}"),
                format!("https://p{i:02}.example/{{username}}"),
            )
            .with_category(category)
            .with_not_found_markers(["No such user"])
        })
        .collect();
    PlatformCatalog::new(platforms).expect("valid test catalog")
}

fn settings() -> ProbeSettings {
    ProbeSettings {
        retry_delay: Duration::from_millis(1),
        ..ProbeSettings::default()
    }
}

fn orchestrator(fetcher: &Arc<ScriptedFetcher>, settings: ProbeSettings) -> ProbeOrchestrator {
    ProbeOrchestrator::new(fetcher.clone(), settings).expect("valid settings")
}

#[tokio::test(start_paused = true)]
async fn test_every_platform_reported_in_catalog_order() {
    // Earlier platforms answer last
    let mut fetcher = ScriptedFetcher::new(ok(""));
    for i in 0..6 {
        let delay = Duration::from_millis(100 * (6 - i as u64));
        fetcher = fetcher.script(&url(i, "jane"), vec![Step::Delay(delay, Box::new(ok("")))]);
    }
    let fetcher = Arc::new(fetcher);

    let report = orchestrator(&fetcher, settings())
        .run("jane", &catalog(6), CancellationToken::new())
        .await
        .expect("run succeeds");

    assert_eq!(report.completion, RunCompletion::Complete);
    assert_eq!(report.username, "jane");
    let ids: Vec<&str> = report.outcomes.iter().map(|o| o.platform_id.as_str()).collect();
    assert_eq!(ids, ["p00", "p01", "p02", "p03", "p04", "p05"]);
    assert!(report.outcomes.iter().all(|o| o.kind() == VerdictKind::Found));
    assert_eq!(report.summary().found, 6);
}

#[tokio::test]
async fn test_platform_failures_are_isolated() {
    let fetcher = Arc::new(
        ScriptedFetcher::new(ok("<h1>jane</h1>"))
            .script(
                &url(1, "jane"),
                vec![
                    Step::Fail(FetchFailure::Connect("connection refused".to_string())),
                    Step::Fail(FetchFailure::Connect("connection refused".to_string())),
                ],
            )
            .script(&url(2, "jane"), vec![Step::Respond(404, String::new())])
            .script(&url(3, "jane"), vec![ok("<p>No such user</p>")])
            .script(&url(4, "jane"), vec![Step::Respond(429, String::new())]),
    );

    let report = orchestrator(&fetcher, settings())
        .run("jane", &catalog(5), CancellationToken::new())
        .await
        .expect("run succeeds");

    assert_eq!(report.outcomes.len(), 5);
    let kinds: Vec<VerdictKind> = report.outcomes.iter().map(|o| o.kind()).collect();
    assert_eq!(
        kinds,
        [
            VerdictKind::Found,
            VerdictKind::Uncertain,
            VerdictKind::NotFound,
            VerdictKind::NotFound,
            VerdictKind::Uncertain,
        ]
    );

    assert!(matches!(
        report.outcomes[1].verdict.evidence.reason,
        Some(UncertainReason::FetchFailed(FetchFailure::Connect(_)))
    ));
    assert_eq!(
        report.outcomes[4].verdict.evidence.reason,
        Some(UncertainReason::UnexpectedStatus(429))
    );

    let summary = report.summary();
    assert_eq!((summary.found, summary.not_found, summary.uncertain), (1, 2, 2));
}

#[tokio::test(start_paused = true)]
async fn test_concurrency_limit_is_respected() {
    let fetcher = Arc::new(ScriptedFetcher::new(Step::Delay(
        Duration::from_millis(50),
        Box::new(ok("")),
    )));
    let limited = ProbeSettings {
        concurrency_limit: 3,
        ..settings()
    };

    let report = orchestrator(&fetcher, limited)
        .run("jane", &catalog(25), CancellationToken::new())
        .await
        .expect("run succeeds");

    assert_eq!(report.outcomes.len(), 25);
    assert!(fetcher.peak() <= 3, "peak in flight was {}", fetcher.peak());
    assert!(fetcher.peak() >= 1);
    assert_eq!(fetcher.calls().len(), 25);
}

#[tokio::test]
async fn test_metadata_extracted_only_for_found_profiles() {
    let page = r#"<html><head>
        <meta property="og:image" content="/avatar.png">
        <meta name="description" content="Jane's page">
    </head></html>"#;
    let fetcher = Arc::new(
        ScriptedFetcher::new(ok(page))
            .script(&url(1, "jane"), vec![Step::Respond(404, page.to_string())]),
    );

    let report = orchestrator(&fetcher, settings())
        .run("jane", &catalog(2), CancellationToken::new())
        .await
        .expect("run succeeds");

    let found = report.outcomes[0]
        .metadata
        .as_ref()
        .expect("metadata for found profile");
    assert_eq!(found.image.as_deref(), Some("https://p00.example/avatar.png"));
    assert_eq!(found.description.as_deref(), Some("Jane's page"));

    assert_eq!(report.outcomes[1].kind(), VerdictKind::NotFound);
    assert!(report.outcomes[1].metadata.is_none());
}

#[tokio::test(start_paused = true)]
async fn test_cancellation_keeps_finished_outcomes() {
    let slow = Step::Delay(Duration::from_secs(30), Box::new(ok("")));
    let fetcher = Arc::new(ScriptedFetcher::new(slow).script(&url(0, "jane"), vec![ok("")]));
    let patient = ProbeSettings {
        request_timeout: Duration::from_secs(60),
        ..settings()
    };

    let cancel = CancellationToken::new();
    let canceller = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(1)).await;
        canceller.cancel();
    });

    let report = orchestrator(&fetcher, patient)
        .run("jane", &catalog(4), cancel)
        .await
        .expect("run succeeds");

    assert_eq!(report.completion, RunCompletion::Cancelled);
    assert!(!report.is_complete());
    assert_eq!(report.outcomes.len(), 4);
    assert_eq!(report.outcomes[0].kind(), VerdictKind::Found);
    for outcome in &report.outcomes[1..] {
        assert_eq!(outcome.kind(), VerdictKind::Uncertain);
        assert_eq!(
            outcome.verdict.evidence.reason,
            Some(UncertainReason::Cancelled)
        );
    }
}

#[tokio::test(start_paused = true)]
async fn test_run_deadline() {
    let slow = Step::Delay(Duration::from_secs(30), Box::new(ok("")));
    let fetcher = Arc::new(ScriptedFetcher::new(slow).script(&url(0, "jane"), vec![ok("")]));
    let bounded = ProbeSettings {
        request_timeout: Duration::from_secs(60),
        run_deadline: Some(Duration::from_secs(2)),
        ..settings()
    };

    let report = orchestrator(&fetcher, bounded)
        .run("jane", &catalog(3), CancellationToken::new())
        .await
        .expect("run succeeds");

    assert_eq!(report.completion, RunCompletion::DeadlineExceeded);
    assert_eq!(report.outcomes.len(), 3);
    assert_eq!(report.outcomes[0].kind(), VerdictKind::Found);
    assert_eq!(report.outcomes[2].kind(), VerdictKind::Uncertain);
    assert!(report.elapsed < Duration::from_secs(30));
}

#[tokio::test]
async fn test_unreachable_run_deadline_means_no_deadline() {
    let fetcher = Arc::new(ScriptedFetcher::new(ok("")));
    let unbounded = ProbeSettings {
        run_deadline: Some(Duration::from_secs(u64::MAX)),
        ..settings()
    };

    let report = orchestrator(&fetcher, unbounded)
        .run("jane", &catalog(3), CancellationToken::new())
        .await
        .expect("run succeeds");

    assert_eq!(report.completion, RunCompletion::Complete);
    assert!(report.outcomes.iter().all(|o| o.kind() == VerdictKind::Found));
}

#[tokio::test]
async fn test_max_deadline_from_config_completes() {
    let config = ProbeConfig {
        run_deadline_secs: Some(u64::MAX),
        retry_delay_ms: 1,
        ..ProbeConfig::default()
    };
    let refused = Step::Fail(FetchFailure::Connect("refused".to_string()));
    let fetcher =
        Arc::new(ScriptedFetcher::new(ok("")).script(&url(1, "jane"), vec![refused, ok("")]));

    let report = orchestrator(&fetcher, ProbeSettings::from(&config))
        .run("jane", &catalog(2), CancellationToken::new())
        .await
        .expect("run succeeds");

    assert_eq!(report.completion, RunCompletion::Complete);
    assert_eq!(report.outcomes[1].kind(), VerdictKind::Found);
    assert_eq!(report.outcomes[1].attempts, 2);
}

#[tokio::test]
async fn test_transient_failure_is_retried() {
    let fetcher = Arc::new(
        ScriptedFetcher::new(ok(""))
            .script(&url(0, "jane"), vec![Step::Fail(FetchFailure::Timeout), ok("")])
            .script(
                &url(1, "jane"),
                vec![Step::Fail(FetchFailure::TooManyRedirects { limit: 5 })],
            ),
    );

    let report = orchestrator(&fetcher, settings())
        .run("jane", &catalog(2), CancellationToken::new())
        .await
        .expect("run succeeds");

    assert_eq!(report.outcomes[0].kind(), VerdictKind::Found);
    assert_eq!(report.outcomes[0].attempts, 2);
    assert_eq!(fetcher.calls_to(&url(0, "jane")), 2);

    assert_eq!(report.outcomes[1].kind(), VerdictKind::Uncertain);
    assert_eq!(report.outcomes[1].attempts, 1);
    assert_eq!(fetcher.calls_to(&url(1, "jane")), 1);
}

#[tokio::test]
async fn test_retries_are_bounded() {
    let fetcher = Arc::new(ScriptedFetcher::new(Step::Fail(FetchFailure::Timeout)));
    let retrying = ProbeSettings {
        max_retries: 2,
        ..settings()
    };

    let report = orchestrator(&fetcher, retrying)
        .run("jane", &catalog(1), CancellationToken::new())
        .await
        .expect("run succeeds");

    assert_eq!(report.outcomes[0].attempts, 3);
    assert_eq!(fetcher.calls().len(), 3);
    assert_eq!(report.outcomes[0].kind(), VerdictKind::Uncertain);
}

#[tokio::test(start_paused = true)]
async fn test_hanging_fetch_times_out() {
    let fetcher = Arc::new(ScriptedFetcher::new(Step::Hang));
    let quick = ProbeSettings {
        request_timeout: Duration::from_secs(1),
        max_retries: 0,
        ..settings()
    };

    let report = orchestrator(&fetcher, quick)
        .run("jane", &catalog(2), CancellationToken::new())
        .await
        .expect("run succeeds");

    assert_eq!(report.completion, RunCompletion::Complete);
    for outcome in &report.outcomes {
        assert_eq!(
            outcome.verdict.evidence.reason,
            Some(UncertainReason::FetchFailed(FetchFailure::Timeout))
        );
    }
}

#[tokio::test]
async fn test_panicking_probe_is_contained() {
    let fetcher = Arc::new(ScriptedFetcher::new(ok("")).script(&url(1, "jane"), vec![Step::Panic]));

    let report = orchestrator(&fetcher, settings())
        .run("jane", &catalog(3), CancellationToken::new())
        .await
        .expect("run succeeds");

    assert_eq!(report.completion, RunCompletion::Complete);
    assert_eq!(report.outcomes[0].kind(), VerdictKind::Found);
    assert_eq!(report.outcomes[2].kind(), VerdictKind::Found);
    assert!(matches!(
        &report.outcomes[1].verdict.evidence.reason,
        Some(UncertainReason::Internal(message)) if message.contains("scripted panic")
    ));
}

#[tokio::test]
async fn test_invalid_username_makes_no_requests() {
    let fetcher = Arc::new(ScriptedFetcher::new(ok("")));

    let result = orchestrator(&fetcher, settings())
        .run("   ", &catalog(3), CancellationToken::new())
        .await;

    assert!(matches!(result, Err(ScanError::InvalidUsername { .. })));
    assert!(fetcher.calls().is_empty());
}

#[tokio::test]
async fn test_username_is_encoded_into_urls() {
    let fetcher = Arc::new(ScriptedFetcher::new(ok("")));

    let report = orchestrator(&fetcher, settings())
        .run(" @john doe ", &catalog(1), CancellationToken::new())
        .await
        .expect("run succeeds");

    assert_eq!(report.username, "john doe");
    assert_eq!(report.outcomes[0].url, "https://p00.example/john+doe");
    assert_eq!(fetcher.calls(), ["https://p00.example/john+doe"]);
}

#[tokio::test]
async fn test_filter_restricts_platforms() {
    let fetcher = Arc::new(ScriptedFetcher::new(ok("")));
    let filter = PlatformFilter::Specific(vec![id("p03"), id("p01")]);

    let report = orchestrator(&fetcher, settings())
        .with_filter(filter)
        .run("jane", &catalog(5), CancellationToken::new())
        .await
        .expect("run succeeds");

    let ids: Vec<&str> = report.outcomes.iter().map(|o| o.platform_id.as_str()).collect();
    assert_eq!(ids, ["p01", "p03"]);
    assert_eq!(fetcher.calls().len(), 2);

    let social = orchestrator(&fetcher, settings())
        .with_filter(PlatformFilter::Category(PlatformCategory::Social))
        .run("jane", &catalog(5), CancellationToken::new())
        .await
        .expect("run succeeds");
    assert_eq!(social.outcomes.len(), 3);
}

#[tokio::test]
async fn test_pre_cancelled_run() {
    let fetcher = Arc::new(ScriptedFetcher::new(ok("")));
    let cancel = CancellationToken::new();
    cancel.cancel();

    let report = orchestrator(&fetcher, settings())
        .run("jane", &catalog(3), cancel)
        .await
        .expect("run succeeds");

    assert_eq!(report.completion, RunCompletion::Cancelled);
    assert_eq!(report.outcomes.len(), 3);
    assert_eq!(report.summary().uncertain, 3);
    assert!(fetcher.calls().is_empty());
}

#[tokio::test]
async fn test_invalid_settings_rejected() {
    let fetcher = Arc::new(ScriptedFetcher::new(ok("")));
    let settings = ProbeSettings {
        concurrency_limit: 0,
        ..ProbeSettings::default()
    };

    assert!(matches!(
        ProbeOrchestrator::new(fetcher, settings),
        Err(ScanError::InvalidSettings { .. })
    ));
}

#[tokio::test]
async fn test_builtin_catalog_run() {
    let fetcher = Arc::new(ScriptedFetcher::new(Step::Respond(404, String::new())));
    let catalog = PlatformCatalog::builtin().expect("builtin catalog");

    let report = orchestrator(&fetcher, settings())
        .run("octocat", &catalog, CancellationToken::new())
        .await
        .expect("run succeeds");

    assert_eq!(report.outcomes.len(), catalog.len());
    assert_eq!(report.summary().not_found, catalog.len());
    assert!(fetcher.calls().contains(&"https://github.com/octocat".to_string()));
    assert!(fetcher.calls().contains(&"https://medium.com/@octocat".to_string()));
}
