use log::{info, warn};
use thiserror::Error;

use crate::api::billing::BillingApi;
use crate::api::error::ApiError;
use crate::plans::models::{NotificationRequest, TransitionRequest};

pub const ACTIVATION_NOTIFICATION: &str = "subscription_activated";

#[derive(Clone, Debug, PartialEq)]
pub struct CommitContext {
    pub user_id: String,
    pub plan_id: String,
    pub payment_id: String,
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum CommitError {
    #[error("Payment received, but recording it failed: {0}")]
    RecordPayment(ApiError),

    #[error("Payment received, but switching your plan failed: {0}")]
    Transition(ApiError),
}

impl CommitError {
    pub fn api_error(&self) -> &ApiError {
        match self {
            CommitError::RecordPayment(e) | CommitError::Transition(e) => e,
        }
    }
}

/// Applies an approved payment: stores it as approved, moves the user to the
/// new plan, then sends the confirmation notification. The notification is
/// best effort and never fails the commit.
pub async fn commit_approved_payment<A>(api: &A, ctx: &CommitContext) -> Result<(), CommitError>
where
    A: BillingApi + ?Sized,
{
    api.mark_payment_approved(&ctx.payment_id)
        .await
        .map_err(CommitError::RecordPayment)?;

    let transition = TransitionRequest {
        user_id: ctx.user_id.clone(),
        new_plan_id: ctx.plan_id.clone(),
        payment_id: Some(ctx.payment_id.clone()),
    };
    api.transition_subscription(&transition)
        .await
        .map_err(CommitError::Transition)?;
    info!("User {} moved to plan {}", ctx.user_id, ctx.plan_id);

    let notification = NotificationRequest {
        user_id: ctx.user_id.clone(),
        kind: ACTIVATION_NOTIFICATION.to_string(),
        plan_id: ctx.plan_id.clone(),
        payment_id: ctx.payment_id.clone(),
    };
    if let Err(e) = api.send_notification(&notification).await {
        warn!("Activation notification for {} not sent: {}", ctx.user_id, e);
    }
    Ok(())
}
