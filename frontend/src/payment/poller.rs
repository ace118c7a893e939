use async_trait::async_trait;
use gloo_timers::future::TimeoutFuture;
use log::{debug, info, warn};

use crate::api::billing::BillingApi;
use crate::api::error::ApiError;
use crate::payment::attempt::Attempt;
use crate::plans::models::PaymentStatus;

#[async_trait(?Send)]
pub trait Sleeper {
    async fn sleep(&self, millis: u32);
}

pub struct BrowserSleeper;

#[async_trait(?Send)]
impl Sleeper for BrowserSleeper {
    async fn sleep(&self, millis: u32) {
        TimeoutFuture::new(millis).await;
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum PollOutcome {
    Settled(PaymentStatus),
    /// No terminal status within the attempt budget.
    TimedOut,
    /// A newer attempt took over or the modal closed.
    Superseded,
}

/// Checks the charge right away and then once per interval until it reaches
/// a terminal status. Failed checks are retried on the next tick, except for
/// an expired session which ends polling.
pub async fn poll_until_terminal<A, S>(
    api: &A,
    sleeper: &S,
    payment_id: &str,
    interval_ms: u32,
    max_attempts: u32,
    attempt: &Attempt,
) -> Result<PollOutcome, ApiError>
where
    A: BillingApi + ?Sized,
    S: Sleeper + ?Sized,
{
    let max_attempts = max_attempts.max(1);
    let mut checks = 0;
    loop {
        if !attempt.is_current() {
            return Ok(PollOutcome::Superseded);
        }
        checks += 1;
        let result = api.check_payment_status(payment_id).await;
        if !attempt.is_current() {
            return Ok(PollOutcome::Superseded);
        }
        match result {
            Ok(status) if status.is_terminal() => {
                info!("Payment {} settled as {} after {} checks", payment_id, status, checks);
                return Ok(PollOutcome::Settled(status));
            }
            Ok(status) => debug!("Payment {} still {}", payment_id, status),
            Err(e) if e.is_unauthorized() => return Err(e),
            Err(e) => warn!("Status check for payment {} failed: {}", payment_id, e),
        }
        if checks >= max_attempts {
            warn!("Gave up on payment {} after {} checks", payment_id, checks);
            return Ok(PollOutcome::TimedOut);
        }
        sleeper.sleep(interval_ms).await;
    }
}
