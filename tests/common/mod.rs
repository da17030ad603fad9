#![allow(dead_code)]

use async_trait::async_trait;
use axum::{Router, extract::ConnectInfo, routing::get};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::mpsc;
use tower::Layer;

use link_redirector::api::handlers::{health_handler, redirect_handler};
use link_redirector::api::routes::api_routes;
use link_redirector::application::services::{
    ClickRecorder, ClickRecorderOptions, FraudGuard, FraudGuardOptions, Resolver, ResolverOptions,
};
use link_redirector::domain::click_event::{ClickJob, RequestSignals};
use link_redirector::domain::entities::{ClickIncrement, LinkRecord, NewClickEvent};
use link_redirector::domain::repositories::{ClickRepository, LinkRepository};
use link_redirector::error::AppError;
use link_redirector::infrastructure::cache::MemoryCache;
use link_redirector::infrastructure::counters::MemoryCounters;
use link_redirector::infrastructure::enrichment::{HeaderEnricher, NullGeoLookup};
use link_redirector::infrastructure::hot_links::MemoryHotLinks;
use link_redirector::infrastructure::memory::MemoryStore;
use link_redirector::state::AppState;
use link_redirector::utils::identity::IdentityHasher;

pub const TEST_SECRET: &str = "test-identity-secret";
pub const TEST_SALT: &[u8] = b"link-salt-bytes!";

/// In-memory system of record keyed by slug.
#[derive(Default)]
pub struct FakeLinks {
    records: Mutex<HashMap<String, LinkRecord>>,
    reads: AtomicUsize,
    read_delay: Mutex<Option<Duration>>,
}

impl FakeLinks {
    pub fn insert(&self, record: LinkRecord) {
        self.records
            .lock()
            .unwrap()
            .insert(record.slug.clone(), record);
    }

    pub fn update(&self, slug: &str, change: impl FnOnce(&mut LinkRecord)) {
        let mut records = self.records.lock().unwrap();
        change(records.get_mut(slug).expect("link exists"));
    }

    pub fn click_count(&self, slug: &str) -> i64 {
        self.records.lock().unwrap()[slug].click_count
    }

    pub fn last_clicked_at(&self, slug: &str) -> Option<DateTime<Utc>> {
        self.records.lock().unwrap()[slug].last_clicked_at
    }

    /// Number of `find_by_slug` calls so far.
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn set_read_delay(&self, delay: Duration) {
        *self.read_delay.lock().unwrap() = Some(delay);
    }

    fn apply(&self, link_id: i64, count: i64, at: DateTime<Utc>) {
        let mut records = self.records.lock().unwrap();
        if let Some(record) = records.values_mut().find(|r| r.id == link_id) {
            record.click_count += count;
            record.last_clicked_at = Some(record.last_clicked_at.map_or(at, |prev| prev.max(at)));
        }
    }
}

#[async_trait]
impl LinkRepository for FakeLinks {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<LinkRecord>, AppError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        let delay = *self.read_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        Ok(self.records.lock().unwrap().get(slug).cloned())
    }

    async fn find_password_hash(&self, slug: &str) -> Result<Option<String>, AppError> {
        Ok(self
            .records
            .lock()
            .unwrap()
            .get(slug)
            .and_then(|r| r.password_hash.clone()))
    }

    async fn increment_clicks(&self, link_id: i64, at: DateTime<Utc>) -> Result<(), AppError> {
        self.apply(link_id, 1, at);
        Ok(())
    }

    async fn increment_clicks_bulk(&self, increments: Vec<ClickIncrement>) -> Result<(), AppError> {
        for inc in increments {
            self.apply(inc.link_id, inc.count, inc.last_clicked_at);
        }
        Ok(())
    }

    async fn ping(&self) -> Result<(), AppError> {
        Ok(())
    }
}

/// In-memory click log.
#[derive(Default)]
pub struct FakeClicks {
    events: Mutex<Vec<NewClickEvent>>,
}

impl FakeClicks {
    pub fn events(&self) -> Vec<NewClickEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn count_for(&self, link_id: i64) -> usize {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.link_id == link_id)
            .count()
    }
}

#[async_trait]
impl ClickRepository for FakeClicks {
    async fn append(&self, event: NewClickEvent) -> Result<(), AppError> {
        self.events.lock().unwrap().push(event);
        Ok(())
    }

    async fn append_batch(&self, events: Vec<NewClickEvent>) -> Result<(), AppError> {
        self.events.lock().unwrap().extend(events);
        Ok(())
    }

    async fn delete_older_than(&self, cutoff: DateTime<Utc>) -> Result<u64, AppError> {
        let mut events = self.events.lock().unwrap();
        let before = events.len();
        events.retain(|e| e.clicked_at >= cutoff);
        Ok((before - events.len()) as u64)
    }

    async fn count_for_link(&self, link_id: i64) -> Result<i64, AppError> {
        Ok(self.count_for(link_id) as i64)
    }
}

pub fn link(id: i64, slug: &str, destination: &str) -> LinkRecord {
    LinkRecord {
        id,
        slug: slug.to_string(),
        destination: destination.to_string(),
        is_active: true,
        expires_at: None,
        max_clicks: None,
        click_count: 0,
        last_clicked_at: None,
        password_hash: None,
        owner_id: Some(1),
        title: None,
        description: None,
        created_at: Utc::now(),
    }
}

/// Signals of an ordinary browser request from `ip`.
pub fn browser(ip: &str) -> RequestSignals {
    RequestSignals {
        ip: Some(ip.to_string()),
        user_agent: Some(
            "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36"
                .to_string(),
        ),
        accept: Some("text/html,application/xhtml+xml".to_string()),
        accept_language: Some("en-US,en;q=0.9".to_string()),
        ..Default::default()
    }
}

pub struct HarnessOptions {
    pub queue_capacity: usize,
    pub fraud_threshold: u64,
    pub uniform_temporary: bool,
    pub store_timeout: Duration,
}

impl Default for HarnessOptions {
    fn default() -> Self {
        Self {
            queue_capacity: 100,
            fraud_threshold: 10,
            uniform_temporary: false,
            store_timeout: Duration::from_millis(300),
        }
    }
}

/// Fully wired resolver over in-memory stores.
///
/// The click queue is not consumed automatically: call
/// [`Harness::flush_clicks`] to hand queued jobs to the recorder.
pub struct Harness {
    pub links: Arc<FakeLinks>,
    pub clicks: Arc<FakeClicks>,
    pub cache: Arc<MemoryCache>,
    pub hot_links: Arc<MemoryHotLinks>,
    pub resolver: Arc<Resolver>,
    pub recorder: Arc<ClickRecorder>,
    pub state: AppState,
    click_rx: tokio::sync::Mutex<mpsc::Receiver<ClickJob>>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_options(HarnessOptions::default())
    }

    pub fn with_options(options: HarnessOptions) -> Self {
        let links = Arc::new(FakeLinks::default());
        let clicks = Arc::new(FakeClicks::default());

        let store = MemoryStore::spawn(4);
        let cache = Arc::new(MemoryCache::new(store.clone(), Duration::from_secs(3600)));
        let counters = Arc::new(MemoryCounters::new(store));
        let hot_links = Arc::new(MemoryHotLinks::spawn(100));
        let hasher = IdentityHasher::new(TEST_SECRET);

        let recorder = Arc::new(ClickRecorder::new(
            links.clone(),
            clicks.clone(),
            cache.clone(),
            counters.clone(),
            Arc::new(HeaderEnricher::new(Arc::new(NullGeoLookup))),
            hasher.clone(),
            ClickRecorderOptions::default(),
        ));

        let fraud_guard = Arc::new(FraudGuard::new(
            counters,
            FraudGuardOptions {
                threshold: options.fraud_threshold,
                ..Default::default()
            },
        ));

        let (tx, rx) = mpsc::channel(options.queue_capacity);
        let resolver = Arc::new(Resolver::new(
            links.clone(),
            cache.clone(),
            hot_links.clone(),
            fraud_guard,
            hasher,
            tx,
            ResolverOptions {
                uniform_temporary: options.uniform_temporary,
                store_timeout: options.store_timeout,
                ..Default::default()
            },
        ));

        let state = AppState::new(
            resolver.clone(),
            recorder.clone(),
            cache.clone(),
            hot_links.clone(),
            links.clone(),
            false,
        );

        Self {
            links,
            clicks,
            cache,
            hot_links,
            resolver,
            recorder,
            state,
            click_rx: tokio::sync::Mutex::new(rx),
        }
    }

    /// Records every queued click one by one; returns how many were recorded.
    pub async fn flush_clicks(&self) -> usize {
        let mut rx = self.click_rx.lock().await;
        let mut recorded = 0;
        while let Ok(job) = rx.try_recv() {
            self.recorder.record(job).await.unwrap();
            recorded += 1;
        }
        recorded
    }

    /// Takes queued clicks without recording them.
    pub async fn take_queued(&self) -> Vec<ClickJob> {
        let mut rx = self.click_rx.lock().await;
        let mut jobs = Vec::new();
        while let Ok(job) = rx.try_recv() {
            jobs.push(job);
        }
        jobs
    }

    /// Public routes with a fixed peer address injected.
    pub fn router(&self) -> Router {
        Router::new()
            .route("/{slug}", get(redirect_handler))
            .route("/health", get(health_handler))
            .merge(api_routes())
            .layer(MockConnectInfoLayer)
            .with_state(self.state.clone())
    }
}

#[derive(Clone)]
pub struct MockConnectInfoLayer;

impl<S> Layer<S> for MockConnectInfoLayer {
    type Service = MockConnectInfoService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        MockConnectInfoService { inner }
    }
}

#[derive(Clone)]
pub struct MockConnectInfoService<S> {
    inner: S,
}

impl<S, B> tower::Service<axum::http::Request<B>> for MockConnectInfoService<S>
where
    S: tower::Service<axum::http::Request<B>> + Clone + Send + 'static,
    S::Future: Send + 'static,
    B: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = S::Future;

    fn poll_ready(
        &mut self,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: axum::http::Request<B>) -> Self::Future {
        let addr: SocketAddr = "127.0.0.1:12345".parse().unwrap();
        req.extensions_mut().insert(ConnectInfo(addr));
        self.inner.call(req)
    }
}
