//! Decides what happens when the user picks a plan card.

use thiserror::Error;

use crate::plans::models::{Plan, Subscription};
use crate::session::Session;

#[derive(Clone, Debug, PartialEq)]
pub enum Selection {
    /// Free target, switch without a payment.
    ActivateFree,
    /// Cheaper than the current plan, ask before continuing.
    ConfirmDowngrade,
    /// Paid target, open the payment modal.
    Checkout,
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum SelectionError {
    #[error("You need to log in before choosing a plan")]
    NotAuthenticated,

    #[error("This is already your current plan")]
    AlreadyOnPlan,
}

pub fn validate_selection(
    session: Option<&Session>,
    current: Option<&Plan>,
    target: &Plan,
) -> Result<Selection, SelectionError> {
    if session.is_none() {
        return Err(SelectionError::NotAuthenticated);
    }
    if let Some(current) = current {
        if current.id == target.id {
            return Err(SelectionError::AlreadyOnPlan);
        }
        if target.price_cents < current.price_cents {
            return Ok(Selection::ConfirmDowngrade);
        }
    }
    Ok(direct_selection(target))
}

/// Next step once the user has confirmed a downgrade.
pub fn after_downgrade_confirmed(target: &Plan) -> Selection {
    direct_selection(target)
}

/// The plan the user is on: the one embedded in the subscription, or the
/// listed plan with the subscription's `plan_id`.
pub fn resolve_current_plan(plans: &[Plan], subscription: Option<&Subscription>) -> Option<Plan> {
    let subscription = subscription?;
    if let Some(plan) = &subscription.plan {
        return Some(plan.clone());
    }
    plans.iter().find(|p| p.id == subscription.plan_id).cloned()
}

fn direct_selection(target: &Plan) -> Selection {
    if target.is_free() {
        Selection::ActivateFree
    } else {
        Selection::Checkout
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> Session {
        Session {
            access_token: "token".to_string(),
            user_id: "user-1".to_string(),
            email: "ana@example.com".to_string(),
        }
    }

    fn plan(id: &str, price_cents: i64) -> Plan {
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

    #[test]
    fn rejects_anonymous_user() {
        let target = plan("pro", 4990);
        assert_eq!(
            validate_selection(None, None, &target),
            Err(SelectionError::NotAuthenticated)
        );
    }

    #[test]
    fn anonymous_check_runs_before_same_plan_check() {
        let pro = plan("pro", 4990);
        assert_eq!(
            validate_selection(None, Some(&pro), &pro),
            Err(SelectionError::NotAuthenticated)
        );
    }

    #[test]
    fn rejects_current_plan() {
        let session = session();
        let pro = plan("pro", 4990);
        assert_eq!(
            validate_selection(Some(&session), Some(&pro), &pro.clone()),
            Err(SelectionError::AlreadyOnPlan)
        );
    }

    #[test]
    fn cheaper_plan_needs_confirmation() {
        let session = session();
        let current = plan("premium", 9990);
        assert_eq!(
            validate_selection(Some(&session), Some(&current), &plan("pro", 4990)),
            Ok(Selection::ConfirmDowngrade)
        );
        assert_eq!(
            validate_selection(Some(&session), Some(&current), &plan("free", 0)),
            Ok(Selection::ConfirmDowngrade)
        );
    }

    #[test]
    fn upgrade_goes_to_checkout() {
        let session = session();
        let current = plan("pro", 4990);
        assert_eq!(
            validate_selection(Some(&session), Some(&current), &plan("premium", 9990)),
            Ok(Selection::Checkout)
        );
    }

    #[test]
    fn same_price_different_plan_goes_to_checkout() {
        let session = session();
        let current = plan("pro-monthly", 4990);
        assert_eq!(
            validate_selection(Some(&session), Some(&current), &plan("pro-plus", 4990)),
            Ok(Selection::Checkout)
        );
    }

    #[test]
    fn free_plan_without_subscription_activates_directly() {
        let session = session();
        assert_eq!(
            validate_selection(Some(&session), None, &plan("free", 0)),
            Ok(Selection::ActivateFree)
        );
    }

    #[test]
    fn paid_plan_without_subscription_goes_to_checkout() {
        let session = session();
        assert_eq!(
            validate_selection(Some(&session), None, &plan("pro", 4990)),
            Ok(Selection::Checkout)
        );
    }

    fn subscription(plan_id: &str, embedded: Option<Plan>) -> Subscription {
        Subscription {
            id: "sub-1".to_string(),
            user_id: "user-1".to_string(),
            plan_id: plan_id.to_string(),
            status: "active".to_string(),
            current_period_end: None,
            plan: embedded,
        }
    }

    #[test]
    fn current_plan_prefers_embedded_row() {
        let plans = vec![plan("free", 0), plan("pro", 4990)];
        let mut embedded = plan("pro", 5990);
        embedded.name = "Pro (legacy price)".to_string();
        let sub = subscription("pro", Some(embedded.clone()));
        assert_eq!(resolve_current_plan(&plans, Some(&sub)), Some(embedded));
    }

    #[test]
    fn current_plan_falls_back_to_listing() {
        let plans = vec![plan("free", 0), plan("pro", 4990)];
        let sub = subscription("pro", None);
        assert_eq!(resolve_current_plan(&plans, Some(&sub)), Some(plan("pro", 4990)));
        assert_eq!(resolve_current_plan(&plans, Some(&subscription("gone", None))), None);
        assert_eq!(resolve_current_plan(&plans, None), None);
    }

    #[test]
    fn confirmed_downgrade_routes_by_price() {
        assert_eq!(after_downgrade_confirmed(&plan("free", 0)), Selection::ActivateFree);
        assert_eq!(after_downgrade_confirmed(&plan("pro", 4990)), Selection::Checkout);
    }
}
