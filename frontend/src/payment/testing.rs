use std::cell::{Cell, RefCell};
use std::collections::VecDeque;

use async_trait::async_trait;
use futures::channel::oneshot;

use crate::api::billing::BillingApi;
use crate::api::error::ApiError;
use crate::payment::attempt::AttemptTracker;
use crate::payment::poller::Sleeper;
use crate::plans::models::{
    ActivateFreeRequest, GeneratePaymentRequest, NotificationRequest, PaymentStatus, PixCharge,
    Plan, Subscription, TransitionRequest,
};

/// In-memory backend that records every call by name.
pub struct FakeBilling {
    calls: RefCell<Vec<&'static str>>,
    statuses: RefCell<VecDeque<Result<PaymentStatus, ApiError>>>,
    pub charge: RefCell<Result<PixCharge, ApiError>>,
    pub mark_error: RefCell<Option<ApiError>>,
    pub transition_error: RefCell<Option<ApiError>>,
    pub notification_error: RefCell<Option<ApiError>>,
    pub transitions: RefCell<Vec<TransitionRequest>>,
    pub generated: RefCell<Vec<GeneratePaymentRequest>>,
    /// Starts a newer attempt while generation is in flight.
    pub restart_on_generate: RefCell<Option<AttemptTracker>>,
    /// Holds the transition call open until the sender fires.
    pub transition_gate: RefCell<Option<oneshot::Receiver<()>>>,
}

pub fn charge(payment_id: &str) -> PixCharge {
    PixCharge {
        payment_id: payment_id.to_string(),
        qr_code: "00020126580014br.gov.bcb.pix".to_string(),
        qr_code_base64: "iVBORw0KGgo".to_string(),
        amount_cents: 4990,
        expires_at: None,
    }
}

pub fn plan(id: &str, price_cents: i64) -> Plan {
    Plan {
        id: id.to_string(),
        name: id.to_string(),
        description: None,
        price_cents,
        interval: "month".to_string(),
        features: vec![],
        is_popular: false,
    }
}

impl FakeBilling {
    /// Status checks return the given results in order, then `pending` forever.
    pub fn with_statuses(statuses: Vec<Result<PaymentStatus, ApiError>>) -> Self {
        Self {
            calls: RefCell::new(Vec::new()),
            statuses: RefCell::new(statuses.into()),
            charge: RefCell::new(Ok(charge("pay_1"))),
            mark_error: RefCell::new(None),
            transition_error: RefCell::new(None),
            notification_error: RefCell::new(None),
            transitions: RefCell::new(Vec::new()),
            generated: RefCell::new(Vec::new()),
            restart_on_generate: RefCell::new(None),
            transition_gate: RefCell::new(None),
        }
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.borrow().clone()
    }

    fn record(&self, name: &'static str) {
        self.calls.borrow_mut().push(name);
    }

    fn fail_with(slot: &RefCell<Option<ApiError>>) -> Result<(), ApiError> {
        match slot.borrow().clone() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[async_trait(?Send)]
impl BillingApi for FakeBilling {
    async fn list_plans(&self) -> Result<Vec<Plan>, ApiError> {
        self.record("list_plans");
        Ok(vec![plan("free", 0), plan("pro", 4990)])
    }

    async fn current_subscription(&self, _user_id: &str) -> Result<Option<Subscription>, ApiError> {
        self.record("current_subscription");
        Ok(None)
    }

    async fn activate_free_plan(&self, _request: &ActivateFreeRequest) -> Result<(), ApiError> {
        self.record("activate_free");
        Ok(())
    }

    async fn generate_pix_payment(&self, request: &GeneratePaymentRequest) -> Result<PixCharge, ApiError> {
        self.record("generate");
        self.generated.borrow_mut().push(request.clone());
        if let Some(tracker) = self.restart_on_generate.borrow_mut().take() {
            tracker.begin();
        }
        self.charge.borrow().clone()
    }

    async fn check_payment_status(&self, _payment_id: &str) -> Result<PaymentStatus, ApiError> {
        self.record("check");
        self.statuses
            .borrow_mut()
            .pop_front()
            .unwrap_or(Ok(PaymentStatus::Pending))
    }

    async fn mark_payment_approved(&self, _payment_id: &str) -> Result<(), ApiError> {
        self.record("mark_approved");
        Self::fail_with(&self.mark_error)
    }

    async fn transition_subscription(&self, request: &TransitionRequest) -> Result<(), ApiError> {
        self.record("transition");
        self.transitions.borrow_mut().push(request.clone());
        let gate = self.transition_gate.borrow_mut().take();
        if let Some(gate) = gate {
            let _ = gate.await;
        }
        Self::fail_with(&self.transition_error)
    }

    async fn send_notification(&self, _request: &NotificationRequest) -> Result<(), ApiError> {
        self.record("notify");
        Self::fail_with(&self.notification_error)
    }
}

/// Returns immediately and remembers each requested delay.
pub struct FakeSleeper {
    sleeps: RefCell<Vec<u32>>,
    invalidate_after: Cell<Option<usize>>,
    tracker: Option<AttemptTracker>,
}

impl FakeSleeper {
    pub fn new() -> Self {
        Self {
            sleeps: RefCell::new(Vec::new()),
            invalidate_after: Cell::new(None),
            tracker: None,
        }
    }

    /// Invalidates `tracker` once `count` sleeps have happened, standing in
    /// for the user closing the modal mid-poll.
    pub fn invalidating_after(count: usize, tracker: AttemptTracker) -> Self {
        Self {
            sleeps: RefCell::new(Vec::new()),
            invalidate_after: Cell::new(Some(count)),
            tracker: Some(tracker),
        }
    }

    pub fn sleeps(&self) -> Vec<u32> {
        self.sleeps.borrow().clone()
    }
}

#[async_trait(?Send)]
impl Sleeper for FakeSleeper {
    async fn sleep(&self, millis: u32) {
        self.sleeps.borrow_mut().push(millis);
        if let (Some(count), Some(tracker)) = (self.invalidate_after.get(), &self.tracker) {
            if self.sleeps.borrow().len() >= count {
                tracker.invalidate();
                self.invalidate_after.set(None);
            }
        }
    }
}
