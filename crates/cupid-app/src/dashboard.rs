use std::sync::Arc;

use tracing::debug;

use cupid_api::MessagesApi;
use cupid_session::SessionRepository;

use crate::fetch::{FetchController, FetchState};

/// Records per page on the server side; used for row numbering only.
pub const PAGE_SIZE: u32 = 5;

/// Current page and page count. Navigation is clamped to `[1, total]`;
/// stepping past either end is a no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageCursor {
    current: u32,
    total: u32,
}

impl Default for PageCursor {
    fn default() -> Self {
        Self { current: 1, total: 1 }
    }
}

impl PageCursor {
    pub fn new(current: u32, total: u32) -> Self {
        let total = total.max(1);
        Self {
            current: current.clamp(1, total),
            total,
        }
    }

    pub fn current(&self) -> u32 {
        self.current
    }

    pub fn total(&self) -> u32 {
        self.total
    }

    pub fn has_previous(&self) -> bool {
        self.current > 1
    }

    pub fn has_next(&self) -> bool {
        self.current < self.total
    }

    /// Step back one page. Returns the new page, or `None` at page 1.
    pub fn previous(&mut self) -> Option<u32> {
        if !self.has_previous() {
            return None;
        }
        self.current -= 1;
        Some(self.current)
    }

    /// Step forward one page. Returns the new page, or `None` on the last.
    pub fn next(&mut self) -> Option<u32> {
        if !self.has_next() {
            return None;
        }
        self.current += 1;
        Some(self.current)
    }

    /// Adopt the server's pagination numbers after a successful fetch.
    pub fn observe(&mut self, page: u32, total_pages: u32) {
        *self = Self::new(page, total_pages);
    }

    /// 1-based position of the `index`-th row of the current page across
    /// the whole result set.
    pub fn row_number(&self, index: usize) -> u64 {
        u64::from(self.current - 1) * u64::from(PAGE_SIZE) + index as u64 + 1
    }
}

/// The admin dashboard: a fetch controller seeded from the session store
/// plus the page cursor that drives it.
pub struct Dashboard<A, R> {
    controller: FetchController<A>,
    session: Arc<R>,
    cursor: PageCursor,
    total_count: u64,
}

impl<A: MessagesApi, R: SessionRepository> Dashboard<A, R> {
    pub fn new(api: Arc<A>, session: Arc<R>) -> Self {
        Self {
            controller: FetchController::new(api),
            session,
            cursor: PageCursor::default(),
            total_count: 0,
        }
    }

    pub fn controller(&self) -> &FetchController<A> {
        &self.controller
    }

    pub fn cursor(&self) -> PageCursor {
        self.cursor
    }

    /// Total submissions as of the last successful fetch.
    pub fn total_count(&self) -> u64 {
        self.total_count
    }

    pub fn state(&self) -> FetchState {
        self.controller.state()
    }

    /// Initial load: page 1.
    pub async fn mount(&mut self) {
        self.mount_at(1).await;
    }

    /// Initial load straight at `page`. The page count is unknown until the
    /// server answers, so the request goes out as asked and the server's
    /// pagination numbers then correct the cursor.
    pub async fn mount_at(&mut self, page: u32) {
        self.cursor = PageCursor::new(page, page);
        self.load().await;
    }

    /// Returns false (and fetches nothing) when already on the last page.
    pub async fn next_page(&mut self) -> bool {
        if self.cursor.next().is_none() {
            debug!("Already on last page {}", self.cursor.current());
            return false;
        }
        self.load().await;
        true
    }

    /// Returns false (and fetches nothing) when already on page 1.
    pub async fn previous_page(&mut self) -> bool {
        if self.cursor.previous().is_none() {
            debug!("Already on first page");
            return false;
        }
        self.load().await;
        true
    }

    /// Jump to `page`, clamped to the known page count. Returns false (and
    /// fetches nothing) when that is the page already shown.
    pub async fn go_to(&mut self, page: u32) -> bool {
        let target = PageCursor::new(page, self.cursor.total());
        if target == self.cursor {
            return false;
        }
        self.cursor = target;
        self.load().await;
        true
    }

    pub async fn reload(&mut self) {
        self.load().await;
    }

    async fn load(&mut self) {
        // The token is re-read on every fetch so a logout elsewhere is
        // picked up on the next page change.
        let token = self.session.read().token().map(str::to_string);
        self.controller.request(self.cursor.current(), token.as_deref()).await;

        let observed = self.controller.with_state(|state| match state {
            FetchState::Success(snapshot) => {
                Some((snapshot.page, snapshot.total_pages, snapshot.total_count))
            }
            _ => None,
        });
        if let Some((page, total_pages, total_count)) = observed {
            self.cursor.observe(page, total_pages);
            self.total_count = total_count;
        }
    }
}
