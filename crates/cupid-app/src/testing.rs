//! In-process fake of the remote API shared by the unit tests.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::oneshot;

use cupid_api::{ApiError, MessagesApi};
use cupid_types::api::{CreateMessageRequest, LoginRequest, LoginResponse, MessagePage};
use cupid_types::models::{Record, RecordId};

type PageResult = Result<MessagePage, ApiError>;

pub(crate) struct FakeApi {
    pub list_calls: Mutex<Vec<(u32, String)>>,
    pub create_calls: Mutex<Vec<CreateMessageRequest>>,
    pub login_calls: Mutex<Vec<LoginRequest>>,
    pages: Mutex<HashMap<u32, PageResult>>,
    gates: Mutex<HashMap<u32, oneshot::Receiver<PageResult>>>,
    create_result: Mutex<Result<u16, ApiError>>,
    login_result: Mutex<Result<LoginResponse, ApiError>>,
}

impl FakeApi {
    pub fn new() -> Self {
        Self {
            list_calls: Mutex::new(Vec::new()),
            create_calls: Mutex::new(Vec::new()),
            login_calls: Mutex::new(Vec::new()),
            pages: Mutex::new(HashMap::new()),
            gates: Mutex::new(HashMap::new()),
            create_result: Mutex::new(Ok(201)),
            login_result: Mutex::new(Err(ApiError::Transport { detail: "unset".into() })),
        }
    }

    pub fn with_page(self, page: u32, result: PageResult) -> Self {
        self.pages.lock().unwrap().insert(page, result);
        self
    }

    /// Hold the response for `page` until the returned sender fires.
    pub fn gate(&self, page: u32) -> oneshot::Sender<PageResult> {
        let (tx, rx) = oneshot::channel();
        self.gates.lock().unwrap().insert(page, rx);
        tx
    }

    pub fn with_create_result(self, result: Result<u16, ApiError>) -> Self {
        *self.create_result.lock().unwrap() = result;
        self
    }

    pub fn with_login_result(self, result: Result<LoginResponse, ApiError>) -> Self {
        *self.login_result.lock().unwrap() = result;
        self
    }

    pub fn list_count(&self) -> usize {
        self.list_calls.lock().unwrap().len()
    }
}

#[async_trait]
impl MessagesApi for FakeApi {
    async fn login(&self, req: &LoginRequest) -> Result<LoginResponse, ApiError> {
        self.login_calls.lock().unwrap().push(req.clone());
        self.login_result.lock().unwrap().clone()
    }

    async fn list_messages(&self, page: u32, token: &str) -> PageResult {
        self.list_calls.lock().unwrap().push((page, token.to_string()));
        let gate = self.gates.lock().unwrap().remove(&page);
        if let Some(rx) = gate {
            return rx
                .await
                .unwrap_or_else(|_| Err(ApiError::Transport { detail: "gate dropped".into() }));
        }
        let stored = self.pages.lock().unwrap().get(&page).cloned();
        stored.unwrap_or_else(|| {
            Err(ApiError::Server { status: 404, message: format!("no page {}", page), from_body: false })
        })
    }

    async fn create_message(&self, req: &CreateMessageRequest) -> Result<u16, ApiError> {
        self.create_calls.lock().unwrap().push(req.clone());
        self.create_result.lock().unwrap().clone()
    }
}

/// A page of `count` records whose ids are prefixed with the page number.
pub(crate) fn page(current: u32, total_pages: u32, total: u64, count: usize) -> MessagePage {
    MessagePage {
        messages: (0..count)
            .map(|i| Record {
                id: RecordId(format!("p{}-{}", current, i)),
                submitter_name: format!("submitter {}", i),
                target_name: format!("crush {}", i),
                created_at: None,
            })
            .collect(),
        current_page: current,
        total_pages,
        total_messages: total,
    }
}
