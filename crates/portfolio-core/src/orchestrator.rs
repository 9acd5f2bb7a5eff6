//! Repository fetch orchestration
//!
//! [`ProjectsOrchestrator`] owns the retry loop, the cancellation token of the
//! active fetch and every piece of state a repository listing needs:
//! the full list, the search/language/sort query, the current page and the
//! transient loading/error/toast fields. Results are published through
//! `tokio::sync::watch` channels (and a broadcast channel for toasts), always
//! while holding the state lock, so observers never see a half-applied update.

use crate::backoff::RetryPolicy;
use crate::config::Config;
use crate::error::{FetchError, Result};
use crate::filter::{available_languages, derive_view, language_options};
use crate::paginate::{self, paginate, Page, DEFAULT_PAGE_SIZE};
use crate::transport::{HttpTransport, RepositoryTransport};
use crate::types::{RepositoryRecord, SortMode};
use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Persistent error shown once every attempt has failed
pub const LOAD_FAILED_MESSAGE: &str = "Failed to load repositories.";

/// Toast shown once every attempt has failed
pub const RETRY_TOAST: &str = "Failed to load data. Use the Retry button.";

const TOAST_CAPACITY: usize = 64;

/// Toast emitted after a retryable failure
pub fn progress_toast(attempt: u32, max_attempts: u32) -> String {
    format!("Loading... attempt {} of {}", attempt, max_attempts)
}

/// A page of the derived repository view
pub type RepositoryPage = Page<RepositoryRecord>;

/// Orchestrator settings
#[derive(Debug, Clone)]
pub struct OrchestratorOptions {
    pub retry: RetryPolicy,

    /// Repository name excluded from every fetched list, ignoring case
    pub ignored_repository: String,

    pub page_size: usize,
}

impl Default for OrchestratorOptions {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::default(),
            ignored_repository: "SoaresCRF".to_string(),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl From<&Config> for OrchestratorOptions {
    fn from(config: &Config) -> Self {
        Self {
            retry: config.fetch.retry_policy(),
            ignored_repository: config.fetch.ignored_repository.clone(),
            page_size: config.view.page_size,
        }
    }
}

#[derive(Debug, Default)]
struct FetchState {
    all_repositories: Vec<RepositoryRecord>,
    search_query: String,
    selected_language: String,
    sort_mode: SortMode,
    page_number: usize,
    pending_toast: Option<String>,

    /// Token of the running fetch sequence, if any
    active: Option<CancellationToken>,
}

struct Channels {
    page: watch::Sender<RepositoryPage>,
    loading: watch::Sender<bool>,
    timeout_loading: watch::Sender<bool>,
    error: watch::Sender<Option<String>>,
    toasts: broadcast::Sender<String>,
}

impl Channels {
    fn new() -> Self {
        Self {
            page: watch::channel(RepositoryPage::default()).0,
            loading: watch::channel(false).0,
            timeout_loading: watch::channel(false).0,
            error: watch::channel(None).0,
            toasts: broadcast::channel(TOAST_CAPACITY).0,
        }
    }
}

struct Shared {
    transport: Arc<dyn RepositoryTransport>,
    options: OrchestratorOptions,
    state: Mutex<FetchState>,
    channels: Channels,
}

impl Shared {
    fn lock_state(&self) -> MutexGuard<'_, FetchState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run `f` under the state lock unless `token` has been cancelled.
    ///
    /// Cancellation also happens under the lock, so nothing a cancelled
    /// sequence does can land after `cancel_fetch` returns.
    fn mutate_if_active<F>(&self, token: &CancellationToken, f: F) -> bool
    where
        F: FnOnce(&mut FetchState, &Shared),
    {
        let mut state = self.lock_state();
        if token.is_cancelled() {
            return false;
        }
        f(&mut *state, self);
        true
    }

    /// Recompute the derived view and publish the current page
    fn publish_view(&self, state: &mut FetchState) {
        let view = derive_view(
            &state.all_repositories,
            &state.search_query,
            &state.selected_language,
            state.sort_mode,
        );
        let page = paginate(&view, state.page_number, self.options.page_size);
        state.page_number = page.page_number;

        debug!(
            "Derived view: {} of {} repositories, page {}/{}",
            view.len(),
            state.all_repositories.len(),
            page.page_number,
            page.total_pages
        );
        self.channels.page.send_replace(page);
    }

    fn push_toast(&self, state: &mut FetchState, message: String) {
        state.pending_toast = Some(message.clone());
        // No subscribers is fine; the pending slot still holds it
        let _ = self.channels.toasts.send(message);
    }

    fn finish_loading(&self, state: &mut FetchState) {
        state.active = None;
        self.channels.loading.send_replace(false);
        self.channels.timeout_loading.send_replace(false);
    }

    async fn run(&self, token: CancellationToken) -> std::result::Result<usize, FetchError> {
        let policy = self.options.retry;
        let mut attempt: u32 = 0;

        info!("Fetching repositories (max {} attempts)", policy.max_attempts);

        loop {
            if token.is_cancelled() {
                return Err(FetchError::Cancelled);
            }

            let outcome = tokio::select! {
                biased;
                _ = token.cancelled() => return Err(FetchError::Cancelled),
                outcome = self.transport.fetch_repository_list() => outcome,
            };

            let failure = match outcome {
                Ok(repos) => return self.apply_fetched(&token, repos),
                Err(e) => FetchError::from(e),
            };

            let e = match failure {
                FetchError::Transient(e) => e,
                fatal => return Err(self.fail_fatal(&token, fatal)),
            };

            attempt += 1;
            warn!(
                "Attempt {} of {} failed: {}",
                attempt, policy.max_attempts, e
            );

            let published = self.mutate_if_active(&token, |state, shared| {
                shared.channels.timeout_loading.send_replace(true);
                shared.push_toast(state, progress_toast(attempt, policy.max_attempts));
            });
            if !published {
                return Err(FetchError::Cancelled);
            }

            if attempt >= policy.max_attempts {
                break;
            }

            let delay = policy.next_delay(attempt);
            debug!("Retrying in {:?}", delay);
            tokio::select! {
                biased;
                _ = token.cancelled() => return Err(FetchError::Cancelled),
                _ = tokio::time::sleep(delay) => {}
            }
        }

        error!(
            "Failed to load repositories after {} attempts",
            attempt
        );
        let published = self.mutate_if_active(&token, |state, shared| {
            shared
                .channels
                .error
                .send_replace(Some(LOAD_FAILED_MESSAGE.to_string()));
            shared.push_toast(state, RETRY_TOAST.to_string());
            shared.finish_loading(state);
        });
        if !published {
            return Err(FetchError::Cancelled);
        }

        Err(FetchError::ExhaustedRetries { attempts: attempt })
    }

    fn apply_fetched(
        &self,
        token: &CancellationToken,
        repos: Vec<RepositoryRecord>,
    ) -> std::result::Result<usize, FetchError> {
        let ignored = self.options.ignored_repository.to_lowercase();
        let repos: Vec<RepositoryRecord> = repos
            .into_iter()
            .filter(|r| ignored.is_empty() || r.name.to_lowercase() != ignored)
            .collect();
        let count = repos.len();

        let published = self.mutate_if_active(token, |state, shared| {
            state.all_repositories = repos;
            state.page_number = 1;
            shared.publish_view(state);
            shared.channels.error.send_replace(None);
            shared.finish_loading(state);
        });
        if !published {
            return Err(FetchError::Cancelled);
        }

        info!("Loaded {} repositories", count);
        Ok(count)
    }

    fn fail_fatal(&self, token: &CancellationToken, fatal: FetchError) -> FetchError {
        error!("Repository fetch failed: {}", fatal);

        let published = self.mutate_if_active(token, |state, shared| {
            shared.channels.error.send_replace(Some(fatal.to_string()));
            shared.finish_loading(state);
        });
        if published {
            fatal
        } else {
            FetchError::Cancelled
        }
    }
}

/// Stateful controller behind a repository listing
pub struct ProjectsOrchestrator {
    shared: Arc<Shared>,
}

impl ProjectsOrchestrator {
    /// Create an orchestrator over any transport
    pub fn new(transport: Arc<dyn RepositoryTransport>, options: OrchestratorOptions) -> Self {
        Self {
            shared: Arc::new(Shared {
                transport,
                options,
                state: Mutex::new(FetchState {
                    page_number: 1,
                    ..Default::default()
                }),
                channels: Channels::new(),
            }),
        }
    }

    /// Create an orchestrator talking HTTP to the configured backend
    pub fn from_config(config: &Config) -> Result<Self> {
        let transport = HttpTransport::from_config(&config.api)?;
        Ok(Self::new(Arc::new(transport), OrchestratorOptions::from(config)))
    }

    /// Start (or restart) the fetch-with-retry sequence.
    ///
    /// Any sequence still in flight is cancelled first. Must be called from
    /// within a tokio runtime.
    pub fn fetch_repositories(&self) -> JoinHandle<std::result::Result<usize, FetchError>> {
        let token = CancellationToken::new();
        {
            let mut state = self.shared.lock_state();
            if let Some(previous) = state.active.replace(token.clone()) {
                info!("Cancelling in-flight fetch");
                previous.cancel();
            }
            let channels = &self.shared.channels;
            channels.loading.send_replace(true);
            channels.error.send_replace(None);
            channels.timeout_loading.send_replace(false);
        }

        let shared = Arc::clone(&self.shared);
        tokio::spawn(async move { shared.run(token).await })
    }

    /// Cancel the running fetch, if any, and clear the loading indicators
    pub fn cancel_fetch(&self) {
        let mut state = self.shared.lock_state();
        if let Some(token) = state.active.take() {
            token.cancel();
            self.shared.channels.loading.send_replace(false);
            self.shared.channels.timeout_loading.send_replace(false);
            info!("Fetch cancelled");
        }
    }

    /// Whether a fetch sequence is running
    pub fn is_fetching(&self) -> bool {
        self.shared.lock_state().active.is_some()
    }

    pub fn update_search_query(&self, query: impl Into<String>) {
        let mut state = self.shared.lock_state();
        state.search_query = query.into();
        state.page_number = 1;
        self.shared.publish_view(&mut state);
    }

    /// `""` clears the language filter
    pub fn update_selected_language(&self, language: impl Into<String>) {
        let mut state = self.shared.lock_state();
        state.selected_language = language.into();
        state.page_number = 1;
        self.shared.publish_view(&mut state);
    }

    /// Advance Recent -> Oldest -> Alphabetical -> Recent
    pub fn cycle_sort_mode(&self) -> SortMode {
        let mut state = self.shared.lock_state();
        state.sort_mode = state.sort_mode.next();
        state.page_number = 1;
        self.shared.publish_view(&mut state);
        state.sort_mode
    }

    pub fn set_sort_mode(&self, sort_mode: SortMode) {
        let mut state = self.shared.lock_state();
        state.sort_mode = sort_mode;
        state.page_number = 1;
        self.shared.publish_view(&mut state);
    }

    pub fn next_page(&self) -> RepositoryPage {
        let mut state = self.shared.lock_state();
        let total_pages = self.shared.channels.page.borrow().total_pages;
        state.page_number = paginate::next_page(state.page_number, total_pages);
        self.shared.publish_view(&mut state);
        self.current_page()
    }

    pub fn previous_page(&self) -> RepositoryPage {
        let mut state = self.shared.lock_state();
        state.page_number = paginate::previous_page(state.page_number);
        self.shared.publish_view(&mut state);
        self.current_page()
    }

    /// Jump to a page; out-of-range numbers are clamped
    pub fn go_to_page(&self, page_number: usize) -> RepositoryPage {
        let mut state = self.shared.lock_state();
        state.page_number = page_number;
        self.shared.publish_view(&mut state);
        self.current_page()
    }

    pub fn current_page(&self) -> RepositoryPage {
        self.shared.channels.page.borrow().clone()
    }

    pub fn sort_mode(&self) -> SortMode {
        self.shared.lock_state().sort_mode
    }

    pub fn search_query(&self) -> String {
        self.shared.lock_state().search_query.clone()
    }

    pub fn selected_language(&self) -> String {
        self.shared.lock_state().selected_language.clone()
    }

    /// Number of repositories before filtering
    pub fn total_repository_count(&self) -> usize {
        self.shared.lock_state().all_repositories.len()
    }

    /// Distinct languages of the unfiltered list
    pub fn available_languages(&self) -> BTreeSet<String> {
        available_languages(&self.shared.lock_state().all_repositories)
    }

    /// Language picker entries, "All" first
    pub fn language_options(&self) -> Vec<String> {
        language_options(&self.shared.lock_state().all_repositories)
    }

    pub fn is_loading(&self) -> bool {
        *self.shared.channels.loading.borrow()
    }

    pub fn show_timeout_loading(&self) -> bool {
        *self.shared.channels.timeout_loading.borrow()
    }

    pub fn error_message(&self) -> Option<String> {
        self.shared.channels.error.borrow().clone()
    }

    /// Take the latest toast; each toast is returned at most once
    pub fn take_toast(&self) -> Option<String> {
        self.shared.lock_state().pending_toast.take()
    }

    pub fn clear_toast(&self) {
        self.shared.lock_state().pending_toast = None;
    }

    pub fn subscribe_page(&self) -> watch::Receiver<RepositoryPage> {
        self.shared.channels.page.subscribe()
    }

    pub fn subscribe_loading(&self) -> watch::Receiver<bool> {
        self.shared.channels.loading.subscribe()
    }

    pub fn subscribe_timeout_loading(&self) -> watch::Receiver<bool> {
        self.shared.channels.timeout_loading.subscribe()
    }

    pub fn subscribe_error(&self) -> watch::Receiver<Option<String>> {
        self.shared.channels.error.subscribe()
    }

    /// Every toast emitted after subscribing, in order
    pub fn subscribe_toasts(&self) -> broadcast::Receiver<String> {
        self.shared.channels.toasts.subscribe()
    }
}

impl Drop for ProjectsOrchestrator {
    fn drop(&mut self) {
        self.cancel_fetch();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransportError;
    use crate::transport::MockRepositoryTransport;
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio_test::{assert_err, assert_ok};

    /// Fails the first `failures` calls with `error`, then returns `repos`
    struct FlakyTransport {
        failures: usize,
        error: TransportError,
        repos: Vec<RepositoryRecord>,
        first_call_delay: Duration,
        success_delay: Duration,
        calls: AtomicUsize,
    }

    impl FlakyTransport {
        fn new(failures: usize, repos: Vec<RepositoryRecord>) -> Self {
            Self {
                failures,
                error: TransportError::Timeout("operation timed out".to_string()),
                repos,
                first_call_delay: Duration::ZERO,
                success_delay: Duration::ZERO,
                calls: AtomicUsize::new(0),
            }
        }

        fn with_error(mut self, error: TransportError) -> Self {
            self.error = error;
            self
        }

        fn with_success_delay(mut self, delay: Duration) -> Self {
            self.success_delay = delay;
            self
        }

        fn with_first_call_delay(mut self, delay: Duration) -> Self {
            self.first_call_delay = delay;
            self
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl RepositoryTransport for FlakyTransport {
        async fn fetch_repository_list(
            &self,
        ) -> std::result::Result<Vec<RepositoryRecord>, TransportError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call == 0 && !self.first_call_delay.is_zero() {
                tokio::time::sleep(self.first_call_delay).await;
            }
            if call < self.failures {
                return Err(self.error.clone());
            }
            if !self.success_delay.is_zero() {
                tokio::time::sleep(self.success_delay).await;
            }
            Ok(self.repos.clone())
        }
    }

    fn create_test_repo(id: u64, name: &str, language: &str) -> RepositoryRecord {
        RepositoryRecord {
            id,
            name: name.to_string(),
            description: None,
            language: language.to_string(),
            html_url: format!("https://github.com/soarescrf/{}", name),
            zip_url: String::new(),
            created_at: "2022-01-01T00:00:00Z".to_string(),
            pushed_at: format!("2024-01-{:02}T00:00:00Z", (id % 28) + 1),
            updated_at: "2024-02-01T00:00:00Z".to_string(),
        }
    }

    fn many_repos(n: u64) -> Vec<RepositoryRecord> {
        (1..=n)
            .map(|i| {
                let language = if i % 2 == 0 { "Kotlin" } else { "Java" };
                create_test_repo(i, &format!("project-{:02}", i), language)
            })
            .collect()
    }

    fn instant_options() -> OrchestratorOptions {
        OrchestratorOptions {
            retry: RetryPolicy {
                base_delay: Duration::ZERO,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn drain(rx: &mut broadcast::Receiver<String>) -> Vec<String> {
        let mut out = Vec::new();
        while let Ok(msg) = rx.try_recv() {
            out.push(msg);
        }
        out
    }

    #[tokio::test]
    async fn test_recovers_after_three_timeouts() {
        let transport = Arc::new(FlakyTransport::new(3, many_repos(12)));
        let orchestrator = ProjectsOrchestrator::new(transport.clone(), instant_options());
        let mut toasts = orchestrator.subscribe_toasts();

        let count = assert_ok!(orchestrator.fetch_repositories().await.unwrap());

        assert_eq!(count, 12);
        assert_eq!(transport.calls(), 4);
        assert_eq!(orchestrator.total_repository_count(), 12);
        assert_eq!(orchestrator.error_message(), None);
        assert!(!orchestrator.is_loading());
        assert!(!orchestrator.show_timeout_loading());
        assert!(!orchestrator.is_fetching());
        assert_eq!(
            drain(&mut toasts),
            vec![
                "Loading... attempt 1 of 10",
                "Loading... attempt 2 of 10",
                "Loading... attempt 3 of 10",
            ]
        );
    }

    #[tokio::test]
    async fn test_connection_failures_are_retried() {
        let transport = Arc::new(
            FlakyTransport::new(2, many_repos(5))
                .with_error(TransportError::Io("connection reset by peer".to_string())),
        );
        let orchestrator = ProjectsOrchestrator::new(transport.clone(), instant_options());
        let mut toasts = orchestrator.subscribe_toasts();

        let count = assert_ok!(orchestrator.fetch_repositories().await.unwrap());

        assert_eq!(count, 5);
        assert_eq!(transport.calls(), 3);
        assert_eq!(orchestrator.error_message(), None);
        assert_eq!(
            drain(&mut toasts),
            vec!["Loading... attempt 1 of 10", "Loading... attempt 2 of 10"]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_status_observers_follow_retried_fetch() {
        let transport = Arc::new(
            FlakyTransport::new(2, many_repos(4)).with_success_delay(Duration::from_secs(5)),
        );
        let orchestrator = ProjectsOrchestrator::new(transport, instant_options());
        let mut loading = orchestrator.subscribe_loading();
        let mut timeout_loading = orchestrator.subscribe_timeout_loading();
        let mut error = orchestrator.subscribe_error();
        assert!(!*loading.borrow_and_update());
        assert!(!*timeout_loading.borrow_and_update());

        let handle = orchestrator.fetch_repositories();
        assert!(*loading.borrow_and_update());
        assert!(!*timeout_loading.borrow_and_update());

        // The successful call is still sleeping when the first failure lands
        timeout_loading.changed().await.unwrap();
        assert!(*timeout_loading.borrow_and_update());
        assert!(*loading.borrow());

        assert_ok!(handle.await.unwrap());

        assert!(loading.has_changed().unwrap());
        assert!(!*loading.borrow_and_update());
        assert!(timeout_loading.has_changed().unwrap());
        assert!(!*timeout_loading.borrow_and_update());
        assert_eq!(*error.borrow_and_update(), None);
    }

    #[tokio::test]
    async fn test_ignored_repository_is_excluded() {
        let mut repos = many_repos(3);
        repos.push(create_test_repo(99, "soarescrf", "Markdown"));
        let transport = Arc::new(FlakyTransport::new(0, repos));
        let orchestrator = ProjectsOrchestrator::new(transport, instant_options());

        assert_ok!(orchestrator.fetch_repositories().await.unwrap());

        assert_eq!(orchestrator.total_repository_count(), 3);
        assert!(!orchestrator.available_languages().contains("Markdown"));
        assert!(orchestrator
            .current_page()
            .items
            .iter()
            .all(|r| r.name != "soarescrf"));
    }

    #[tokio::test]
    async fn test_exhausted_retries() {
        let transport = Arc::new(FlakyTransport::new(usize::MAX, Vec::new()));
        let orchestrator = ProjectsOrchestrator::new(transport.clone(), instant_options());
        let mut toasts = orchestrator.subscribe_toasts();
        let mut error = orchestrator.subscribe_error();
        let mut loading = orchestrator.subscribe_loading();

        let err = assert_err!(orchestrator.fetch_repositories().await.unwrap());

        assert_eq!(err, FetchError::ExhaustedRetries { attempts: 10 });
        assert!(error.has_changed().unwrap());
        assert_eq!(
            error.borrow_and_update().as_deref(),
            Some(LOAD_FAILED_MESSAGE)
        );
        assert!(!*loading.borrow_and_update());
        assert_eq!(transport.calls(), 10);
        assert_eq!(
            orchestrator.error_message().as_deref(),
            Some(LOAD_FAILED_MESSAGE)
        );
        assert!(!orchestrator.is_loading());
        assert!(!orchestrator.show_timeout_loading());

        let emitted = drain(&mut toasts);
        assert_eq!(emitted.len(), 11);
        assert_eq!(emitted[9], "Loading... attempt 10 of 10");
        assert_eq!(emitted.last().map(String::as_str), Some(RETRY_TOAST));

        assert_eq!(orchestrator.take_toast().as_deref(), Some(RETRY_TOAST));
        assert_eq!(orchestrator.take_toast(), None);
    }

    #[tokio::test]
    async fn test_fatal_error_is_not_retried() {
        let mut mock = MockRepositoryTransport::new();
        mock.expect_fetch_repository_list()
            .times(1)
            .returning(|| Err(TransportError::Other("backend returned HTTP 500".to_string())));
        let orchestrator = ProjectsOrchestrator::new(Arc::new(mock), instant_options());
        let mut toasts = orchestrator.subscribe_toasts();

        let err = assert_err!(orchestrator.fetch_repositories().await.unwrap());

        assert!(matches!(err, FetchError::Fatal(_)));
        assert_eq!(
            orchestrator.error_message().as_deref(),
            Some("unexpected error: backend returned HTTP 500")
        );
        assert!(!orchestrator.is_loading());
        assert!(drain(&mut toasts).is_empty());
    }

    #[tokio::test]
    async fn test_mock_transport_success() {
        let mut mock = MockRepositoryTransport::new();
        mock.expect_fetch_repository_list()
            .times(1)
            .returning(|| Ok(many_repos(2)));
        let orchestrator = ProjectsOrchestrator::new(Arc::new(mock), instant_options());
        let mut page_rx = orchestrator.subscribe_page();

        assert_ok!(orchestrator.fetch_repositories().await.unwrap());

        assert!(page_rx.has_changed().unwrap());
        let page = page_rx.borrow_and_update().clone();
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.total_items, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_during_backoff() {
        let transport = Arc::new(FlakyTransport::new(usize::MAX, Vec::new()));
        let orchestrator = ProjectsOrchestrator::new(transport.clone(), OrchestratorOptions::default());
        let mut toasts = orchestrator.subscribe_toasts();

        let handle = orchestrator.fetch_repositories();
        assert_eq!(toasts.recv().await.unwrap(), "Loading... attempt 1 of 10");

        orchestrator.cancel_fetch();
        let err = assert_err!(handle.await.unwrap());

        assert_eq!(err, FetchError::Cancelled);
        assert!(transport.calls() < 10);
        assert_eq!(orchestrator.error_message(), None);
        assert!(!orchestrator.is_loading());
        assert!(!orchestrator.show_timeout_loading());
        assert!(!orchestrator.is_fetching());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_during_transport_call() {
        let transport = Arc::new(
            FlakyTransport::new(0, many_repos(5)).with_first_call_delay(Duration::from_secs(60)),
        );
        let orchestrator = ProjectsOrchestrator::new(transport, instant_options());

        let handle = orchestrator.fetch_repositories();
        tokio::task::yield_now().await;
        assert!(orchestrator.is_loading());

        orchestrator.cancel_fetch();
        assert_eq!(handle.await.unwrap(), Err(FetchError::Cancelled));

        // Nothing from the cancelled call was applied
        assert_eq!(orchestrator.total_repository_count(), 0);
        assert!(!orchestrator.is_loading());
    }

    #[tokio::test(start_paused = true)]
    async fn test_restart_cancels_previous_fetch() {
        let transport = Arc::new(
            FlakyTransport::new(0, many_repos(5)).with_first_call_delay(Duration::from_secs(60)),
        );
        let orchestrator = ProjectsOrchestrator::new(transport.clone(), instant_options());

        let first = orchestrator.fetch_repositories();
        tokio::task::yield_now().await;
        let second = orchestrator.fetch_repositories();

        assert_eq!(first.await.unwrap(), Err(FetchError::Cancelled));
        assert_eq!(second.await.unwrap(), Ok(5));
        assert_eq!(transport.calls(), 2);
        assert_eq!(orchestrator.total_repository_count(), 5);
        assert!(!orchestrator.is_loading());
        assert!(!orchestrator.is_fetching());
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_cancels_fetch() {
        let transport = Arc::new(
            FlakyTransport::new(0, many_repos(5)).with_first_call_delay(Duration::from_secs(60)),
        );
        let orchestrator = ProjectsOrchestrator::new(transport, instant_options());

        let handle = orchestrator.fetch_repositories();
        drop(orchestrator);

        assert_eq!(handle.await.unwrap(), Err(FetchError::Cancelled));
    }

    #[tokio::test]
    async fn test_pagination_and_query_changes() {
        let transport = Arc::new(FlakyTransport::new(0, many_repos(25)));
        let orchestrator = ProjectsOrchestrator::new(transport, instant_options());
        assert_ok!(orchestrator.fetch_repositories().await.unwrap());

        let page = orchestrator.current_page();
        assert_eq!(page.page_number, 1);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.items.len(), 10);

        assert_eq!(orchestrator.previous_page().page_number, 1);
        orchestrator.next_page();
        let last = orchestrator.next_page();
        assert_eq!(last.page_number, 3);
        assert_eq!(last.items.len(), 5);
        assert_eq!(orchestrator.next_page().page_number, 3);

        // Any query change goes back to the first page
        orchestrator.update_selected_language("Kotlin");
        let page = orchestrator.current_page();
        assert_eq!(page.page_number, 1);
        assert_eq!(page.total_items, 12);
        assert!(page.items.iter().all(|r| r.language == "Kotlin"));

        orchestrator.go_to_page(2);
        orchestrator.update_search_query("PROJECT-1");
        let page = orchestrator.current_page();
        assert_eq!(page.page_number, 1);
        let names: Vec<&str> = page.items.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["project-18", "project-16", "project-14", "project-12", "project-10"]);

        orchestrator.update_search_query("");
        orchestrator.update_selected_language("");
        assert_eq!(orchestrator.go_to_page(9999).page_number, 3);
        assert_eq!(orchestrator.go_to_page(0).page_number, 1);
    }

    #[tokio::test]
    async fn test_sort_cycle_and_languages() {
        let transport = Arc::new(FlakyTransport::new(0, many_repos(4)));
        let orchestrator = ProjectsOrchestrator::new(transport, instant_options());
        assert_ok!(orchestrator.fetch_repositories().await.unwrap());

        assert_eq!(orchestrator.sort_mode(), SortMode::Recent);
        assert_eq!(orchestrator.current_page().items[0].name, "project-04");

        assert_eq!(orchestrator.cycle_sort_mode(), SortMode::Oldest);
        assert_eq!(orchestrator.current_page().items[0].name, "project-01");

        assert_eq!(orchestrator.cycle_sort_mode(), SortMode::Alphabetical);
        assert_eq!(orchestrator.cycle_sort_mode(), SortMode::Recent);

        assert_eq!(orchestrator.language_options(), vec!["All", "Java", "Kotlin"]);
    }

    #[test]
    fn test_options_from_config() {
        let mut config = Config::default();
        config.view.page_size = 25;
        config.fetch.ignored_repository = "dotfiles".to_string();

        let options = OrchestratorOptions::from(&config);
        assert_eq!(options.page_size, 25);
        assert_eq!(options.ignored_repository, "dotfiles");
        assert_eq!(options.retry, RetryPolicy::default());
    }
}
