use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::watch;
use tracing::{debug, warn};

use cupid_api::{ApiError, MessagesApi};
use cupid_types::api::MessagePage;
use cupid_types::models::Record;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnauthorizedReason {
    /// No token in the session; the network was never touched.
    MissingToken,
    /// Server answered 401 or 403.
    Status(u16),
}

impl fmt::Display for UnauthorizedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingToken => write!(f, "Authentication token not found"),
            Self::Status(status) => write!(f, "Access Denied. Status: {}", status),
        }
    }
}

/// A successfully fetched page. `page`, `total_pages` and `total_count` are
/// the server's numbers, not the page the client asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageSnapshot {
    pub records: Vec<Record>,
    pub page: u32,
    pub total_pages: u32,
    pub total_count: u64,
}

impl From<MessagePage> for PageSnapshot {
    fn from(page: MessagePage) -> Self {
        Self {
            records: page.messages,
            page: page.current_page,
            total_pages: page.total_pages,
            total_count: page.total_messages,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FetchState {
    #[default]
    Idle,
    Loading { page: u32 },
    Success(PageSnapshot),
    Unauthorized(UnauthorizedReason),
    Failed(String),
}

impl FetchState {
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading { .. })
    }
}

impl From<ApiError> for FetchState {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::AuthenticationMissing => Self::Unauthorized(UnauthorizedReason::MissingToken),
            ApiError::AuthorizationDenied { status, .. } => {
                Self::Unauthorized(UnauthorizedReason::Status(status))
            }
            other => Self::Failed(other.to_string()),
        }
    }
}

/// Drives the "list records" call and owns the resulting [`FetchState`].
///
/// Every `request` takes a new generation number. A response is only
/// published if its generation is still the latest when it resolves, so a
/// slow earlier page can never overwrite a newer request's state.
pub struct FetchController<A> {
    api: Arc<A>,
    generation: AtomicU64,
    state: watch::Sender<FetchState>,
}

impl<A: MessagesApi> FetchController<A> {
    pub fn new(api: Arc<A>) -> Self {
        let (state, _) = watch::channel(FetchState::Idle);
        Self {
            api,
            generation: AtomicU64::new(0),
            state,
        }
    }

    pub fn state(&self) -> FetchState {
        self.state.borrow().clone()
    }

    /// Read the current state without cloning it.
    pub fn with_state<T>(&self, f: impl FnOnce(&FetchState) -> T) -> T {
        f(&self.state.borrow())
    }

    /// Receiver that observes every published transition.
    pub fn subscribe(&self) -> watch::Receiver<FetchState> {
        self.state.subscribe()
    }

    /// Fetch `page`. Resolves once this request has either published its
    /// outcome or been superseded by a newer one.
    pub async fn request(&self, page: u32, token: Option<&str>) {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        let Some(token) = token.filter(|t| !t.is_empty()) else {
            warn!("No session token, not fetching page {}", page);
            self.publish(generation, ApiError::AuthenticationMissing.into());
            return;
        };

        self.publish(generation, FetchState::Loading { page });

        let next = match self.api.list_messages(page, token).await {
            Ok(fetched) => FetchState::Success(fetched.into()),
            Err(e) => {
                warn!("Fetching page {} failed: {}", page, e);
                e.into()
            }
        };
        self.publish(generation, next);
    }

    fn publish(&self, generation: u64, next: FetchState) {
        // The generation check runs under the watch's write lock so it
        // cannot interleave with another publish.
        let applied = self.state.send_if_modified(|state| {
            if self.generation.load(Ordering::SeqCst) != generation {
                return false;
            }
            *state = next;
            true
        });
        if !applied {
            debug!("Dropped stale response for request #{}", generation);
        }
    }
}
