//! Order-submission workflow.
//!
//! The one place in the portal that suspends: a finished cart is handed to
//! the checkout provider through an ordered sequence of named phases. The
//! sequence is strictly sequential, never concurrent, and not cancellable
//! once started - the handoff is at-least-once and partial completion
//! cannot be safely unwound, so the work runs on a detached task that
//! outlives a dropped request.
//!
//! States: `Idle → Submitting(phase) → Succeeded | Failed`. A terminal
//! state is re-entrant: the next submission starts the sequence from
//! scratch.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use pedidoflex_core::{
    BillingEntity, CartItem, Money, Order, OrderId, OrderStatus, PaymentReference,
};
use serde::Serialize;
use thiserror::Error;
use tokio::sync::watch;
use tracing::instrument;

use crate::checkout::{self, CheckoutError, SharedCheckout};
use crate::stores::{OrderStore, StoreError};

/// The named sync phases, in execution order.
///
/// Each phase is bound to a real step against the provider; none may be
/// skipped or reordered, and suspension only happens between phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionPhase {
    AuthenticatingEntity,
    SendingBillingAddress,
    GeneratingPaymentSession,
}

impl SubmissionPhase {
    /// Progress text shown to the buyer while the phase runs.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::AuthenticatingEntity => "authenticating billing entity",
            Self::SendingBillingAddress => "sending billing address",
            Self::GeneratingPaymentSession => "generating payment session",
        }
    }
}

/// Why a submission failed, coarse enough for the UI to route on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The billing entity needs its address completed first; send the user
    /// to entity editing.
    IncompleteAddress,
    /// The provider refused the request outright.
    Rejected,
    /// Network-shaped failure; retrying the same cart may succeed.
    Transient,
}

impl From<&CheckoutError> for FailureKind {
    fn from(error: &CheckoutError) -> Self {
        match error {
            CheckoutError::IncompleteAddress { .. } => Self::IncompleteAddress,
            CheckoutError::Rejected(_) => Self::Rejected,
            CheckoutError::Http(_) | CheckoutError::Timeout(_) | CheckoutError::Parse(_) => {
                Self::Transient
            }
        }
    }
}

/// Observable workflow state, published per session for progress display.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SubmissionState {
    Idle,
    Submitting {
        phase: SubmissionPhase,
        label: &'static str,
    },
    Succeeded {
        order_id: OrderId,
        payment_url: String,
    },
    Failed {
        kind: FailureKind,
        reason: String,
    },
}

/// Errors returned to the submitting caller.
#[derive(Debug, Error)]
pub enum SubmitError {
    /// Submitting an empty cart is a no-op; the workflow never leaves
    /// `Idle` and the provider is never called.
    #[error("cart is empty")]
    EmptyCart,

    /// At most one submission may be in flight per session.
    #[error("a submission is already in flight for this session")]
    AlreadyInFlight,

    /// The provider handoff failed; the cart is preserved for retry.
    #[error(transparent)]
    Checkout(#[from] CheckoutError),

    /// The order could not be recorded after a successful handoff.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The detached submission task died. Should not happen; surfaced
    /// rather than swallowed.
    #[error("submission task failed: {0}")]
    Task(String),
}

/// What a successful submission hands back to the caller.
#[derive(Debug, Clone, Serialize)]
pub struct SubmissionReceipt {
    pub order: Order,
    pub payment_url: String,
}

/// The snapshot captured when a submission enters `Submitting`.
///
/// Owned data only: cart mutations made while the sequence runs cannot
/// reach the in-flight submission.
struct OrderDraft {
    entity: BillingEntity,
    items: Vec<CartItem>,
    total: Money,
}

/// Runs submissions and tracks one workflow slot per session.
#[derive(Clone)]
pub struct SubmissionCoordinator {
    inner: Arc<CoordinatorInner>,
}

struct CoordinatorInner {
    checkout: SharedCheckout,
    orders: OrderStore,
    /// Deadline imposed on each phase in case the provider client carries
    /// no timeout of its own. Expiry counts as a transient failure.
    phase_timeout: Duration,
    /// Last known state per session key. An entry in `Submitting` blocks a
    /// second submission; terminal entries stay readable for polling.
    slots: Mutex<HashMap<String, watch::Receiver<SubmissionState>>>,
}

impl SubmissionCoordinator {
    /// Create a coordinator over the configured provider and order store.
    #[must_use]
    pub fn new(checkout: SharedCheckout, orders: OrderStore, phase_timeout: Duration) -> Self {
        Self {
            inner: Arc::new(CoordinatorInner {
                checkout,
                orders,
                phase_timeout,
                slots: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// The current workflow state for a session.
    #[must_use]
    pub fn status(&self, session_key: &str) -> SubmissionState {
        self.inner
            .slots
            .lock()
            .ok()
            .and_then(|slots| slots.get(session_key).map(|rx| rx.borrow().clone()))
            .unwrap_or(SubmissionState::Idle)
    }

    /// Run the full submission sequence for a snapshot of the cart.
    ///
    /// The sequence itself executes on a spawned task: if the caller goes
    /// away mid-flight the handoff still runs to completion and the
    /// outcome remains observable via [`SubmissionCoordinator::status`].
    ///
    /// # Errors
    ///
    /// Returns [`SubmitError::EmptyCart`] without any state change when
    /// `items` is empty, [`SubmitError::AlreadyInFlight`] if this session
    /// already has a submission running, or the failure that ended the
    /// sequence. On failure the caller's cart must be left untouched.
    #[instrument(skip(self, entity, items, total), fields(entity = %entity.id))]
    pub async fn submit(
        &self,
        session_key: &str,
        entity: BillingEntity,
        items: Vec<CartItem>,
        total: Money,
    ) -> Result<SubmissionReceipt, SubmitError> {
        if items.is_empty() {
            return Err(SubmitError::EmptyCart);
        }

        let tx = self.claim_slot(session_key)?;
        let draft = OrderDraft {
            entity,
            items,
            total,
        };

        let inner = Arc::clone(&self.inner);
        let handle = tokio::spawn(async move { run_sequence(&inner, &tx, draft).await });

        handle
            .await
            .map_err(|e| SubmitError::Task(e.to_string()))?
    }

    /// Reserve the session's workflow slot, rejecting concurrent entry.
    fn claim_slot(&self, session_key: &str) -> Result<watch::Sender<SubmissionState>, SubmitError> {
        let mut slots = self
            .inner
            .slots
            .lock()
            .map_err(|_| SubmitError::Task("submission registry poisoned".to_owned()))?;

        if let Some(rx) = slots.get(session_key)
            && matches!(*rx.borrow(), SubmissionState::Submitting { .. })
        {
            return Err(SubmitError::AlreadyInFlight);
        }

        let (tx, rx) = watch::channel(SubmissionState::Submitting {
            phase: SubmissionPhase::AuthenticatingEntity,
            label: SubmissionPhase::AuthenticatingEntity.label(),
        });
        slots.insert(session_key.to_owned(), rx);
        Ok(tx)
    }
}

/// Execute the phases strictly in order, publishing progress on `tx`.
async fn run_sequence(
    inner: &CoordinatorInner,
    tx: &watch::Sender<SubmissionState>,
    draft: OrderDraft,
) -> Result<SubmissionReceipt, SubmitError> {
    enter_phase(tx, SubmissionPhase::AuthenticatingEntity);
    bounded(inner.phase_timeout, inner.checkout.validate_customer(&draft.entity.tax_number))
        .await
        .map_err(|e| fail(tx, e))?;

    enter_phase(tx, SubmissionPhase::SendingBillingAddress);
    checkout::verify_prefill(&draft.entity).map_err(|e| fail(tx, e))?;

    enter_phase(tx, SubmissionPhase::GeneratingPaymentSession);
    let session = bounded(
        inner.phase_timeout,
        inner.checkout.create_order(&draft.entity, &draft.items, &draft.total),
    )
    .await
    .map_err(|e| fail(tx, e))?;

    let order = Order {
        id: OrderId::generate(),
        entity_id: draft.entity.id.clone(),
        tax_number: draft.entity.tax_number.clone(),
        created_at: Utc::now(),
        total: draft.total,
        status: OrderStatus::Pending,
        payment: Some(PaymentReference {
            reference_id: session.reference_id,
            payment_url: session.payment_url.clone(),
        }),
        items: draft.items,
    };

    if let Err(e) = inner.orders.append(order.clone()).await {
        let _ = tx.send(SubmissionState::Failed {
            kind: FailureKind::Transient,
            reason: e.to_string(),
        });
        return Err(SubmitError::Store(e));
    }

    tracing::info!(order_id = %order.id, total = %order.total, "order submitted");
    let _ = tx.send(SubmissionState::Succeeded {
        order_id: order.id.clone(),
        payment_url: session.payment_url.clone(),
    });

    Ok(SubmissionReceipt {
        order,
        payment_url: session.payment_url,
    })
}

fn enter_phase(tx: &watch::Sender<SubmissionState>, phase: SubmissionPhase) {
    tracing::debug!(phase = phase.label(), "submission phase");
    let _ = tx.send(SubmissionState::Submitting {
        phase,
        label: phase.label(),
    });
}

/// Publish the failure state and pass the error through.
fn fail(tx: &watch::Sender<SubmissionState>, error: CheckoutError) -> SubmitError {
    let _ = tx.send(SubmissionState::Failed {
        kind: FailureKind::from(&error),
        reason: error.to_string(),
    });
    SubmitError::Checkout(error)
}

/// Impose the workflow's own deadline on an external call.
async fn bounded<T>(
    limit: Duration,
    call: impl Future<Output = Result<T, CheckoutError>>,
) -> Result<T, CheckoutError> {
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => Err(CheckoutError::Timeout(limit)),
    }
}
