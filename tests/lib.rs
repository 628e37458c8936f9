//! Shared fakes for the behavioral test suites: a scripted HTTP transport,
//! static source connectors, and a counting token refresher.

use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Instant;

use pickline_core::{
    FetchPage, HttpClient, HttpError, HttpRequest, HttpResponse, SaleSource, SourceError,
    SourceId, TokenRefresher,
};

/// Transport that replays a fixed script of responses and records every
/// request it receives, with arrival timestamps for backoff assertions.
pub struct ScriptedHttpClient {
    script: Mutex<VecDeque<Result<HttpResponse, HttpError>>>,
    requests: Mutex<Vec<(Instant, HttpRequest)>>,
}

impl ScriptedHttpClient {
    pub fn new(script: Vec<Result<HttpResponse, HttpError>>) -> Self {
        Self {
            script: Mutex::new(script.into_iter().collect()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().expect("request log").len()
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests
            .lock()
            .expect("request log")
            .iter()
            .map(|(_, request)| request.clone())
            .collect()
    }

    /// Milliseconds between consecutive requests.
    pub fn request_gaps_ms(&self) -> Vec<u128> {
        let requests = self.requests.lock().expect("request log");
        requests
            .windows(2)
            .map(|pair| (pair[1].0 - pair[0].0).as_millis())
            .collect()
    }
}

impl HttpClient for ScriptedHttpClient {
    fn execute<'a>(
        &'a self,
        request: HttpRequest,
    ) -> Pin<Box<dyn Future<Output = Result<HttpResponse, HttpError>> + Send + 'a>> {
        self.requests
            .lock()
            .expect("request log")
            .push((Instant::now(), request));
        let next = self
            .script
            .lock()
            .expect("script")
            .pop_front()
            .unwrap_or_else(|| Err(HttpError::new("script exhausted")));
        Box::pin(async move { next })
    }
}

/// Token refresher that counts invocations.
#[derive(Default)]
pub struct CountingRefresher {
    refreshes: AtomicUsize,
    fail: bool,
}

impl CountingRefresher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            refreshes: AtomicUsize::new(0),
            fail: true,
        }
    }

    pub fn refresh_count(&self) -> usize {
        self.refreshes.load(Ordering::SeqCst)
    }
}

impl TokenRefresher for CountingRefresher {
    fn refresh<'a>(
        &'a self,
    ) -> Pin<Box<dyn Future<Output = Result<(), SourceError>> + Send + 'a>> {
        self.refreshes.fetch_add(1, Ordering::SeqCst);
        let fail = self.fail;
        Box::pin(async move {
            if fail {
                Err(SourceError::auth_failed("refresh rejected"))
            } else {
                Ok(())
            }
        })
    }
}

/// Connector that serves a fixed page sequence. `fetch(None)` serves page 0,
/// `fetch(Some(n))` page n; `Err` entries simulate a mid-drain failure.
pub struct StaticSource {
    id: SourceId,
    label: String,
    init_result: Result<(), SourceError>,
    pages: Vec<Result<FetchPage, SourceError>>,
}

impl StaticSource {
    pub fn new(id: SourceId, label: impl Into<String>) -> Self {
        Self {
            id,
            label: label.into(),
            init_result: Ok(()),
            pages: Vec::new(),
        }
    }

    pub fn with_init_error(mut self, error: SourceError) -> Self {
        self.init_result = Err(error);
        self
    }

    pub fn with_page(mut self, page: FetchPage) -> Self {
        self.pages.push(Ok(page));
        self
    }

    pub fn with_failing_page(mut self, error: SourceError) -> Self {
        self.pages.push(Err(error));
        self
    }
}

impl SaleSource for StaticSource {
    fn id(&self) -> SourceId {
        self.id
    }

    fn label(&self) -> &str {
        &self.label
    }

    fn init<'a>(
        &'a self,
    ) -> Pin<Box<dyn Future<Output = Result<(), SourceError>> + Send + 'a>> {
        let result = self.init_result.clone();
        Box::pin(async move { result })
    }

    fn fetch<'a>(
        &'a self,
        cursor: Option<u64>,
    ) -> Pin<Box<dyn Future<Output = Result<FetchPage, SourceError>> + Send + 'a>> {
        let index = cursor.unwrap_or(0) as usize;
        let result = match self.pages.get(index) {
            Some(Ok(page)) => {
                let mut page = page.clone();
                page.next_cursor = if index + 1 < self.pages.len() {
                    Some(index as u64 + 1)
                } else {
                    None
                };
                Ok(page)
            }
            Some(Err(error)) => Err(error.clone()),
            None => Ok(FetchPage::default()),
        };
        Box::pin(async move { result })
    }
}
