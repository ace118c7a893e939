use std::future::Future;
use std::rc::Rc;

use futures::future::{abortable, AbortHandle, Aborted};
use log::{error, info};

use crate::api::billing::BillingApi;
use crate::api::error::ApiError;
use crate::config::FlowTiming;
use crate::payment::attempt::Attempt;
use crate::payment::commit::{commit_approved_payment, CommitContext};
use crate::payment::poller::{poll_until_terminal, PollOutcome, Sleeper};
use crate::plans::models::{GeneratePaymentRequest, PaymentStatus, PixCharge, Plan};

#[derive(Clone, Debug, PartialEq)]
pub enum PaymentPhase {
    Generating,
    AwaitingPayment(PixCharge),
    Activating,
    Activated,
    Declined(PaymentStatus),
    Failed(String),
}

impl PaymentPhase {
    pub fn title(&self) -> &'static str {
        match self {
            PaymentPhase::Generating => "Generating PIX charge",
            PaymentPhase::AwaitingPayment(_) => "Scan to pay",
            PaymentPhase::Activating => "Payment approved",
            PaymentPhase::Activated => "Plan activated",
            PaymentPhase::Declined(_) => "Payment not completed",
            PaymentPhase::Failed(_) => "Something went wrong",
        }
    }

    pub fn message(&self) -> String {
        match self {
            PaymentPhase::Generating => "Please wait while we create your charge...".to_string(),
            PaymentPhase::AwaitingPayment(_) => {
                "Waiting for payment confirmation. This screen updates automatically.".to_string()
            }
            PaymentPhase::Activating => "Activating your new plan...".to_string(),
            PaymentPhase::Activated => "All set! Redirecting to your dashboard...".to_string(),
            PaymentPhase::Declined(status) => match status {
                PaymentStatus::Rejected => "The payment was rejected. You can try again.".to_string(),
                PaymentStatus::Cancelled => "The payment was cancelled.".to_string(),
                PaymentStatus::Expired => "The PIX charge expired before it was paid.".to_string(),
                _ => "The payment provider reported an error. You can try again.".to_string(),
            },
            PaymentPhase::Failed(message) => message.clone(),
        }
    }

    pub fn can_retry(&self) -> bool {
        matches!(self, PaymentPhase::Declined(_) | PaymentPhase::Failed(_))
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum CheckoutOutcome {
    Activated,
    Declined(PaymentStatus),
    Failed(String),
    /// The backend rejected the session token; the caller has to log in again.
    Unauthorized,
    Superseded,
}

#[derive(Clone, Debug, PartialEq)]
pub struct CheckoutRequest {
    pub user_id: String,
    pub email: String,
    pub plan: Plan,
}

/// Result of the cancellable half of a checkout.
#[derive(Clone, Debug, PartialEq)]
pub enum Approval {
    Approved { payment_id: String },
    Finished(CheckoutOutcome),
}

fn report<F: Fn(PaymentPhase)>(attempt: &Attempt, on_phase: &F, phase: PaymentPhase) {
    if attempt.is_current() {
        on_phase(phase);
    }
}

fn fail<F: Fn(PaymentPhase)>(attempt: &Attempt, on_phase: &F, error: &ApiError, message: String) -> CheckoutOutcome {
    error!("Checkout attempt {} failed: {}", attempt.id(), message);
    report(attempt, on_phase, PaymentPhase::Failed(message.clone()));
    if error.is_unauthorized() {
        CheckoutOutcome::Unauthorized
    } else {
        CheckoutOutcome::Failed(message)
    }
}

/// Generates the charge and polls it until it settles. Safe to drop at any
/// await point: nothing has been written to the backend yet.
pub async fn await_approval<A, S, F>(
    api: &A,
    sleeper: &S,
    request: &CheckoutRequest,
    attempt: &Attempt,
    timing: FlowTiming,
    on_phase: &F,
) -> Approval
where
    A: BillingApi + ?Sized,
    S: Sleeper + ?Sized,
    F: Fn(PaymentPhase),
{
    report(attempt, on_phase, PaymentPhase::Generating);
    let generate = GeneratePaymentRequest {
        user_id: request.user_id.clone(),
        plan_id: request.plan.id.clone(),
        amount_cents: request.plan.price_cents,
        email: request.email.clone(),
    };
    let charge = api.generate_pix_payment(&generate).await;
    if !attempt.is_current() {
        return Approval::Finished(CheckoutOutcome::Superseded);
    }
    let charge = match charge {
        Ok(charge) => charge,
        Err(e) => {
            let message = format!("Could not generate the PIX charge: {}", e);
            return Approval::Finished(fail(attempt, on_phase, &e, message));
        }
    };
    info!("Charge {} created for plan {}", charge.payment_id, request.plan.id);
    let payment_id = charge.payment_id.clone();
    report(attempt, on_phase, PaymentPhase::AwaitingPayment(charge));

    let outcome = poll_until_terminal(
        api,
        sleeper,
        &payment_id,
        timing.poll_interval_ms,
        timing.max_poll_attempts,
        attempt,
    )
    .await;
    let finished = match outcome {
        Ok(PollOutcome::Settled(PaymentStatus::Approved)) => {
            return Approval::Approved { payment_id };
        }
        Ok(PollOutcome::Settled(status)) => {
            report(attempt, on_phase, PaymentPhase::Declined(status.clone()));
            CheckoutOutcome::Declined(status)
        }
        Ok(PollOutcome::TimedOut) => {
            report(attempt, on_phase, PaymentPhase::Declined(PaymentStatus::Expired));
            CheckoutOutcome::Declined(PaymentStatus::Expired)
        }
        Ok(PollOutcome::Superseded) => CheckoutOutcome::Superseded,
        Err(e) => fail(attempt, on_phase, &e, e.to_string()),
    };
    Approval::Finished(finished)
}

/// Commits an approved payment and waits out the redirect delay. Runs to
/// completion even when the attempt goes stale; only phase reports stop.
pub async fn activate_plan<A, S, F>(
    api: &A,
    sleeper: &S,
    request: &CheckoutRequest,
    payment_id: &str,
    attempt: &Attempt,
    timing: FlowTiming,
    on_phase: &F,
) -> CheckoutOutcome
where
    A: BillingApi + ?Sized,
    S: Sleeper + ?Sized,
    F: Fn(PaymentPhase),
{
    report(attempt, on_phase, PaymentPhase::Activating);
    let ctx = CommitContext {
        user_id: request.user_id.clone(),
        plan_id: request.plan.id.clone(),
        payment_id: payment_id.to_string(),
    };
    if let Err(e) = commit_approved_payment(api, &ctx).await {
        return fail(attempt, on_phase, e.api_error(), e.to_string());
    }

    report(attempt, on_phase, PaymentPhase::Activated);
    sleeper.sleep(timing.redirect_delay_ms).await;
    CheckoutOutcome::Activated
}

/// Builds the task the payment modal spawns. Aborting the returned handle
/// cancels generation and polling, but once the payment is approved the
/// commit is no longer covered by the handle. `on_done` is not called for an
/// aborted run.
pub fn checkout_task<A, S, F, D>(
    api: Rc<A>,
    sleeper: Rc<S>,
    request: CheckoutRequest,
    attempt: Attempt,
    timing: FlowTiming,
    on_phase: F,
    on_done: D,
) -> (impl Future<Output = ()>, AbortHandle)
where
    A: BillingApi + ?Sized + 'static,
    S: Sleeper + ?Sized + 'static,
    F: Fn(PaymentPhase) + 'static,
    D: FnOnce(CheckoutOutcome) + 'static,
{
    let on_phase = Rc::new(on_phase);
    let (approval, handle) = abortable({
        let api = api.clone();
        let sleeper = sleeper.clone();
        let request = request.clone();
        let attempt = attempt.clone();
        let on_phase = on_phase.clone();
        async move { await_approval(&*api, &*sleeper, &request, &attempt, timing, &*on_phase).await }
    });

    let task = async move {
        let outcome = match approval.await {
            Ok(Approval::Approved { payment_id }) => {
                activate_plan(&*api, &*sleeper, &request, &payment_id, &attempt, timing, &*on_phase).await
            }
            Ok(Approval::Finished(outcome)) => outcome,
            Err(Aborted) => return,
        };
        on_done(outcome);
    };
    (task, handle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payment::attempt::AttemptTracker;
    use crate::payment::testing::{charge, plan, FakeBilling, FakeSleeper};
    use futures::channel::oneshot;
    use futures::executor::{block_on, LocalPool};
    use futures::task::LocalSpawnExt;
    use std::cell::RefCell;

    fn request() -> CheckoutRequest {
        CheckoutRequest {
            user_id: "user-1".to_string(),
            email: "ana@example.com".to_string(),
            plan: plan("pro", 4990),
        }
    }

    fn timing() -> FlowTiming {
        FlowTiming { poll_interval_ms: 5_000, redirect_delay_ms: 2_000, max_poll_attempts: 10 }
    }

    fn run(api: &FakeBilling, sleeper: &FakeSleeper, attempt: &Attempt) -> (CheckoutOutcome, Vec<PaymentPhase>) {
        let phases = RefCell::new(Vec::new());
        let on_phase = |phase: PaymentPhase| phases.borrow_mut().push(phase);
        let request = request();
        let outcome = block_on(async {
            match await_approval(api, sleeper, &request, attempt, timing(), &on_phase).await {
                Approval::Approved { payment_id } => {
                    activate_plan(api, sleeper, &request, &payment_id, attempt, timing(), &on_phase).await
                }
                Approval::Finished(outcome) => outcome,
            }
        });
        (outcome, phases.into_inner())
    }

    #[test]
    fn approved_payment_activates_plan_then_waits_before_redirect() {
        let api = FakeBilling::with_statuses(vec![Ok(PaymentStatus::Pending), Ok(PaymentStatus::Approved)]);
        let sleeper = FakeSleeper::new();
        let attempt = AttemptTracker::new().begin();

        let (outcome, phases) = run(&api, &sleeper, &attempt);

        assert_eq!(outcome, CheckoutOutcome::Activated);
        assert_eq!(
            phases,
            vec![
                PaymentPhase::Generating,
                PaymentPhase::AwaitingPayment(charge("pay_1")),
                PaymentPhase::Activating,
                PaymentPhase::Activated,
            ]
        );
        assert_eq!(
            api.calls(),
            vec!["generate", "check", "check", "mark_approved", "transition", "notify"]
        );
        assert_eq!(sleeper.sleeps(), vec![5_000, 2_000]);

        let generated = api.generated.borrow();
        assert_eq!(generated[0].plan_id, "pro");
        assert_eq!(generated[0].amount_cents, 4990);
    }

    #[test]
    fn generation_failure_is_reported() {
        let api = FakeBilling::with_statuses(vec![]);
        *api.charge.borrow_mut() = Err(ApiError::Status { status: 502, message: "gateway".to_string() });
        let sleeper = FakeSleeper::new();
        let attempt = AttemptTracker::new().begin();

        let (outcome, phases) = run(&api, &sleeper, &attempt);

        assert!(matches!(outcome, CheckoutOutcome::Failed(ref m) if m.contains("gateway")));
        assert!(matches!(phases.last(), Some(PaymentPhase::Failed(_))));
        assert_eq!(api.calls(), vec!["generate"]);
    }

    #[test]
    fn rejected_payment_does_not_commit() {
        let api = FakeBilling::with_statuses(vec![Ok(PaymentStatus::Rejected)]);
        let sleeper = FakeSleeper::new();
        let attempt = AttemptTracker::new().begin();

        let (outcome, phases) = run(&api, &sleeper, &attempt);

        assert_eq!(outcome, CheckoutOutcome::Declined(PaymentStatus::Rejected));
        assert_eq!(phases.last(), Some(&PaymentPhase::Declined(PaymentStatus::Rejected)));
        assert_eq!(api.calls(), vec!["generate", "check"]);
    }

    #[test]
    fn unanswered_charge_ends_as_expired() {
        let api = FakeBilling::with_statuses(vec![]);
        let sleeper = FakeSleeper::new();
        let attempt = AttemptTracker::new().begin();

        let (outcome, _) = run(&api, &sleeper, &attempt);

        assert_eq!(outcome, CheckoutOutcome::Declined(PaymentStatus::Expired));
        assert_eq!(api.calls().iter().filter(|c| **c == "check").count(), 10);
    }

    #[test]
    fn transition_failure_halts_before_redirect() {
        let api = FakeBilling::with_statuses(vec![Ok(PaymentStatus::Approved)]);
        *api.transition_error.borrow_mut() = Some(ApiError::Network("offline".to_string()));
        let sleeper = FakeSleeper::new();
        let attempt = AttemptTracker::new().begin();

        let (outcome, phases) = run(&api, &sleeper, &attempt);

        assert!(matches!(outcome, CheckoutOutcome::Failed(_)));
        assert!(!phases.contains(&PaymentPhase::Activated));
        assert!(!sleeper.sleeps().contains(&2_000));
        assert_eq!(api.calls(), vec!["generate", "check", "mark_approved", "transition"]);
    }

    #[test]
    fn superseded_attempt_reports_nothing_further() {
        let tracker = AttemptTracker::new();
        let attempt = tracker.begin();
        let api = FakeBilling::with_statuses(vec![]);
        let sleeper = FakeSleeper::invalidating_after(1, tracker.clone());

        let (outcome, phases) = run(&api, &sleeper, &attempt);

        assert_eq!(outcome, CheckoutOutcome::Superseded);
        assert_eq!(phases.len(), 2);
        assert_eq!(api.calls(), vec!["generate", "check"]);
    }

    #[test]
    fn retry_during_generation_drops_the_charge() {
        let tracker = AttemptTracker::new();
        let attempt = tracker.begin();
        let api = FakeBilling::with_statuses(vec![]);
        *api.restart_on_generate.borrow_mut() = Some(tracker.clone());
        let sleeper = FakeSleeper::new();

        let (outcome, phases) = run(&api, &sleeper, &attempt);

        assert_eq!(outcome, CheckoutOutcome::Superseded);
        assert_eq!(phases, vec![PaymentPhase::Generating]);
        assert_eq!(api.calls(), vec!["generate"]);
    }

    #[test]
    fn expired_session_during_generation_is_unauthorized() {
        let api = FakeBilling::with_statuses(vec![]);
        *api.charge.borrow_mut() = Err(ApiError::Unauthorized);
        let sleeper = FakeSleeper::new();
        let attempt = AttemptTracker::new().begin();

        let (outcome, _) = run(&api, &sleeper, &attempt);

        assert_eq!(outcome, CheckoutOutcome::Unauthorized);
        assert_eq!(api.calls(), vec!["generate"]);
    }

    #[test]
    fn expired_session_while_polling_is_unauthorized() {
        let api = FakeBilling::with_statuses(vec![Err(ApiError::Unauthorized)]);
        let sleeper = FakeSleeper::new();
        let attempt = AttemptTracker::new().begin();

        let (outcome, _) = run(&api, &sleeper, &attempt);

        assert_eq!(outcome, CheckoutOutcome::Unauthorized);
        assert_eq!(api.calls(), vec!["generate", "check"]);
    }

    #[test]
    fn expired_session_during_commit_is_unauthorized() {
        let api = FakeBilling::with_statuses(vec![Ok(PaymentStatus::Approved)]);
        *api.mark_error.borrow_mut() = Some(ApiError::Unauthorized);
        let sleeper = FakeSleeper::new();
        let attempt = AttemptTracker::new().begin();

        let (outcome, _) = run(&api, &sleeper, &attempt);

        assert_eq!(outcome, CheckoutOutcome::Unauthorized);
        assert_eq!(api.calls(), vec!["generate", "check", "mark_approved"]);
    }

    #[test]
    fn aborting_after_approval_still_finishes_the_commit() {
        let (open_transition, transition_gate) = oneshot::channel();
        let api = Rc::new(FakeBilling::with_statuses(vec![Ok(PaymentStatus::Approved)]));
        *api.transition_gate.borrow_mut() = Some(transition_gate);
        let sleeper = Rc::new(FakeSleeper::new());
        let tracker = AttemptTracker::new();
        let done = Rc::new(RefCell::new(None));

        let (task, handle) = checkout_task(
            api.clone(),
            sleeper.clone(),
            request(),
            tracker.begin(),
            timing(),
            |_| {},
            {
                let done = done.clone();
                move |outcome| *done.borrow_mut() = Some(outcome)
            },
        );
        let mut pool = LocalPool::new();
        pool.spawner().spawn_local(task).unwrap();
        pool.run_until_stalled();
        assert_eq!(api.calls(), vec!["generate", "check", "mark_approved", "transition"]);

        // The modal unmounts while the transition is in flight
        tracker.invalidate();
        handle.abort();
        open_transition.send(()).unwrap();
        pool.run_until_stalled();

        assert_eq!(
            api.calls(),
            vec!["generate", "check", "mark_approved", "transition", "notify"]
        );
        assert_eq!(*done.borrow(), Some(CheckoutOutcome::Activated));
    }

    #[test]
    fn aborting_before_approval_skips_everything() {
        let api = Rc::new(FakeBilling::with_statuses(vec![Ok(PaymentStatus::Approved)]));
        let sleeper = Rc::new(FakeSleeper::new());
        let done = Rc::new(RefCell::new(None));

        let (task, handle) = checkout_task(
            api.clone(),
            sleeper,
            request(),
            AttemptTracker::new().begin(),
            timing(),
            |_| {},
            {
                let done = done.clone();
                move |outcome| *done.borrow_mut() = Some(outcome)
            },
        );
        handle.abort();
        let mut pool = LocalPool::new();
        pool.spawner().spawn_local(task).unwrap();
        pool.run_until_stalled();

        assert!(api.calls().is_empty());
        assert_eq!(*done.borrow(), None);
    }

    #[test]
    fn only_terminal_failures_offer_retry() {
        assert!(PaymentPhase::Failed("x".to_string()).can_retry());
        assert!(PaymentPhase::Declined(PaymentStatus::Rejected).can_retry());
        assert!(!PaymentPhase::Generating.can_retry());
        assert!(!PaymentPhase::Activated.can_retry());
    }

    #[test]
    fn expired_charge_has_its_own_message() {
        let message = PaymentPhase::Declined(PaymentStatus::Expired).message();
        assert!(message.contains("expired"));
    }
}
