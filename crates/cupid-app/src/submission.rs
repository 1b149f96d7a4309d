//! The public prank form.
//!
//! A submission is shown as a success as soon as the create request has been
//! issued. What the server does with it is only reported to a
//! [`DeliverySink`] and never reaches the user.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use cupid_api::{ApiError, MessagesApi};
use cupid_types::api::CreateMessageRequest;

pub const EMPTY_NAMES: &str = "Please enter both your name and your crush's name!";

/// What the user gets to see. There is only one answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionOutcome {
    Shown,
}

/// What actually happened to the create request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    Accepted { status: u16 },
    Failed(ApiError),
}

/// Receives delivery results for diagnostics.
pub trait DeliverySink: Send + Sync {
    fn record(&self, request: &CreateMessageRequest, delivery: &Delivery);
}

/// Sink that uses the `tracing` crate.
pub struct TracingSink;

impl DeliverySink for TracingSink {
    fn record(&self, request: &CreateMessageRequest, delivery: &Delivery) {
        match delivery {
            Delivery::Accepted { status } => {
                info!(
                    submitter = %request.submitter_name,
                    status = *status,
                    "Submission stored"
                );
            }
            Delivery::Failed(e @ ApiError::Transport { detail }) => {
                error!(submitter = %request.submitter_name, detail = %detail, "Failed to post names: {}", e);
            }
            Delivery::Failed(e) => {
                warn!(submitter = %request.submitter_name, "API call may have failed: {}", e);
            }
        }
    }
}

/// Sink that discards everything.
pub struct NullSink;

impl DeliverySink for NullSink {
    fn record(&self, _request: &CreateMessageRequest, _delivery: &Delivery) {}
}

/// Both names must be non-blank. Values are sent trimmed.
pub fn validate(submitter_name: &str, target_name: &str) -> Result<CreateMessageRequest, ApiError> {
    let submitter_name = submitter_name.trim();
    let target_name = target_name.trim();
    if submitter_name.is_empty() || target_name.is_empty() {
        return Err(ApiError::Validation(EMPTY_NAMES.to_string()));
    }
    Ok(CreateMessageRequest {
        submitter_name: submitter_name.to_string(),
        target_name: target_name.to_string(),
    })
}

/// Handle on a create request that is still on its way.
#[derive(Debug)]
pub struct PendingDelivery {
    handle: JoinHandle<Delivery>,
}

impl PendingDelivery {
    pub fn is_settled(&self) -> bool {
        self.handle.is_finished()
    }

    /// Wait for the request to finish. The result has already been handed to
    /// the sink by the time this returns.
    pub async fn settled(self) -> Delivery {
        match self.handle.await {
            Ok(delivery) => delivery,
            Err(e) => {
                error!("Submission task did not complete: {}", e);
                Delivery::Failed(ApiError::Transport { detail: e.to_string() })
            }
        }
    }
}

pub struct Submitted {
    pub outcome: SubmissionOutcome,
    pub delivery: PendingDelivery,
}

pub struct SubmissionController<A> {
    api: Arc<A>,
    sink: Arc<dyn DeliverySink>,
}

impl<A: MessagesApi + 'static> SubmissionController<A> {
    pub fn new(api: Arc<A>, sink: Arc<dyn DeliverySink>) -> Self {
        Self { api, sink }
    }

    /// Validate and issue exactly one create request. Returns as soon as the
    /// request is spawned; must be called from inside a tokio runtime.
    ///
    /// The only error is a validation failure, in which case nothing is sent.
    pub fn submit(&self, submitter_name: &str, target_name: &str) -> Result<Submitted, ApiError> {
        let request = validate(submitter_name, target_name)?;

        let api = self.api.clone();
        let sink = self.sink.clone();
        let handle = tokio::spawn(async move {
            let delivery = match api.create_message(&request).await {
                Ok(status) => Delivery::Accepted { status },
                Err(e) => Delivery::Failed(e),
            };
            sink.record(&request, &delivery);
            delivery
        });

        Ok(Submitted {
            outcome: SubmissionOutcome::Shown,
            delivery: PendingDelivery { handle },
        })
    }
}

/// State behind the home page form.
#[derive(Debug, Default)]
pub struct PrankForm {
    pub submitter_name: String,
    pub target_name: String,
    error: Option<String>,
    modal_open: bool,
    in_flight: Option<PendingDelivery>,
}

impl PrankForm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true when a request was issued. On success the fields are
    /// cleared and the modal opens. Ignored while a previous request is
    /// still in flight.
    pub fn submit<A: MessagesApi + 'static>(&mut self, controller: &SubmissionController<A>) -> bool {
        if self.is_submitting() {
            return false;
        }
        self.error = None;
        match controller.submit(&self.submitter_name, &self.target_name) {
            Ok(submitted) => {
                self.submitter_name.clear();
                self.target_name.clear();
                self.modal_open = submitted.outcome == SubmissionOutcome::Shown;
                self.in_flight = Some(submitted.delivery);
                true
            }
            Err(e) => {
                self.error = Some(e.to_string());
                false
            }
        }
    }

    pub fn is_submitting(&self) -> bool {
        self.in_flight.as_ref().is_some_and(|pending| !pending.is_settled())
    }

    /// Hand over the last request so the caller can wait on it.
    pub fn take_delivery(&mut self) -> Option<PendingDelivery> {
        self.in_flight.take()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_modal_open(&self) -> bool {
        self.modal_open
    }

    pub fn dismiss_modal(&mut self) {
        self.modal_open = false;
    }
}
