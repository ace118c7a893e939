use futures::future::join;
use log::{error, info};
use wasm_bindgen_futures::spawn_local;
use yew::prelude::*;
use yew_hooks::use_title;
use yew_router::prelude::*;

use crate::api::billing::BillingApi;
use crate::api::client::BackendClient;
use crate::api::error::ApiError;
use crate::components::downgrade_dialog::DowngradeDialog;
use crate::components::error_modal::ErrorModal;
use crate::components::payment_modal::PaymentModal;
use crate::components::plan_card::PlanCard;
use crate::plans::models::{format_date, ActivateFreeRequest, Plan, Subscription};
use crate::plans::validation::{
    after_downgrade_confirmed, resolve_current_plan, validate_selection, Selection, SelectionError,
};
use crate::session::Session;
use crate::Route;

#[derive(Clone, PartialEq)]
enum RetryAction {
    Reload,
    ActivateFree(Plan),
}

#[derive(Clone, PartialEq)]
struct PageError {
    title: String,
    message: String,
    retry: Option<RetryAction>,
}

fn redirect_to_login(navigator: &Option<Navigator>) {
    Session::clear();
    if let Some(navigator) = navigator {
        navigator.push(&Route::Login);
    }
}

#[function_component(PlanSelection)]
pub fn plan_selection() -> Html {
    use_title("Choose your plan".to_string());

    let navigator = use_navigator();
    let session = use_state(Session::load);
    let plans = use_state(Vec::<Plan>::new);
    let subscription = use_state(|| None::<Subscription>);
    let loading = use_state(|| true);
    let busy = use_state(|| false);
    let reload = use_state(|| 0u32);
    let page_error = use_state(|| None::<PageError>);
    let downgrade_target = use_state(|| None::<Plan>);
    let checkout_plan = use_state(|| None::<Plan>);

    // Fetch plans and the caller's subscription
    {
        let session = (*session).clone();
        let plans = plans.clone();
        let subscription = subscription.clone();
        let loading = loading.clone();
        let page_error = page_error.clone();
        let navigator = navigator.clone();

        use_effect_with_deps(move |_| {
            loading.set(true);
            spawn_local(async move {
                let api = BackendClient::from_session(session.clone());
                let current = async {
                    match &session {
                        Some(session) => api.current_subscription(&session.user_id).await,
                        None => Ok(None),
                    }
                };
                let (listed, current) = join(api.list_plans(), current).await;

                match (listed, current) {
                    (Ok(listed), Ok(current)) => {
                        info!("Loaded {} plans", listed.len());
                        plans.set(listed);
                        subscription.set(current);
                    }
                    (Err(ApiError::Unauthorized), _) | (_, Err(ApiError::Unauthorized)) => {
                        redirect_to_login(&navigator);
                    }
                    (Err(e), _) | (_, Err(e)) => {
                        error!("Failed to load plans: {}", e);
                        page_error.set(Some(PageError {
                            title: "Could not load plans".to_string(),
                            message: e.to_string(),
                            retry: Some(RetryAction::Reload),
                        }));
                    }
                }
                loading.set(false);
            });
            || ()
        }, *reload);
    }

    let current_plan = resolve_current_plan(&plans, (*subscription).as_ref());

    let activate_free = {
        let session = (*session).clone();
        let busy = busy.clone();
        let page_error = page_error.clone();
        let navigator = navigator.clone();

        Callback::from(move |plan: Plan| {
            let Some(session) = session.clone() else {
                redirect_to_login(&navigator);
                return;
            };
            let busy = busy.clone();
            let page_error = page_error.clone();
            let navigator = navigator.clone();
            busy.set(true);

            spawn_local(async move {
                let api = BackendClient::from_session(Some(session.clone()));
                let request = ActivateFreeRequest {
                    user_id: session.user_id.clone(),
                    plan_id: plan.id.clone(),
                };
                match api.activate_free_plan(&request).await {
                    Ok(()) => {
                        info!("Free plan {} activated", plan.id);
                        if let Some(navigator) = &navigator {
                            navigator.push(&Route::Dashboard);
                        }
                    }
                    Err(ApiError::Unauthorized) => redirect_to_login(&navigator),
                    Err(e) => {
                        error!("Free plan activation failed: {}", e);
                        page_error.set(Some(PageError {
                            title: "Could not activate plan".to_string(),
                            message: e.to_string(),
                            retry: Some(RetryAction::ActivateFree(plan)),
                        }));
                    }
                }
                busy.set(false);
            });
        })
    };

    let route_selection = {
        let activate_free = activate_free.clone();
        let checkout_plan = checkout_plan.clone();
        let downgrade_target = downgrade_target.clone();
        move |selection: Selection, plan: Plan| match selection {
            Selection::ActivateFree => activate_free.emit(plan),
            Selection::ConfirmDowngrade => downgrade_target.set(Some(plan)),
            Selection::Checkout => checkout_plan.set(Some(plan)),
        }
    };

    let on_select = {
        let session = (*session).clone();
        let current_plan = current_plan.clone();
        let page_error = page_error.clone();
        let navigator = navigator.clone();
        let route_selection = route_selection.clone();

        Callback::from(move |plan: Plan| {
            match validate_selection(session.as_ref(), current_plan.as_ref(), &plan) {
                Ok(selection) => route_selection(selection, plan),
                Err(SelectionError::NotAuthenticated) => {
                    if let Some(navigator) = &navigator {
                        navigator.push(&Route::Login);
                    }
                }
                Err(e) => page_error.set(Some(PageError {
                    title: "Nothing to change".to_string(),
                    message: e.to_string(),
                    retry: None,
                })),
            }
        })
    };

    let on_downgrade_confirmed = {
        let downgrade_target = downgrade_target.clone();
        Callback::from(move |plan: Plan| {
            downgrade_target.set(None);
            route_selection(after_downgrade_confirmed(&plan), plan);
        })
    };

    let on_downgrade_cancel = {
        let downgrade_target = downgrade_target.clone();
        Callback::from(move |_: ()| downgrade_target.set(None))
    };

    let on_payment_close = {
        let checkout_plan = checkout_plan.clone();
        Callback::from(move |_: ()| checkout_plan.set(None))
    };

    let on_payment_success = {
        let checkout_plan = checkout_plan.clone();
        let navigator = navigator.clone();
        Callback::from(move |_: ()| {
            checkout_plan.set(None);
            if let Some(navigator) = &navigator {
                navigator.push(&Route::Dashboard);
            }
        })
    };

    let on_payment_unauthorized = {
        let checkout_plan = checkout_plan.clone();
        let session = session.clone();
        let navigator = navigator.clone();
        Callback::from(move |_: ()| {
            checkout_plan.set(None);
            session.set(None);
            redirect_to_login(&navigator);
        })
    };

    let error_modal = (*page_error).clone().map(|err| {
        let on_close = {
            let page_error = page_error.clone();
            Callback::from(move |_: ()| page_error.set(None))
        };
        let on_retry = err.retry.clone().map(|action| {
            let page_error = page_error.clone();
            let reload = reload.clone();
            let activate_free = activate_free.clone();
            Callback::from(move |_: ()| {
                page_error.set(None);
                match &action {
                    RetryAction::Reload => reload.set(*reload + 1),
                    RetryAction::ActivateFree(plan) => activate_free.emit(plan.clone()),
                }
            })
        });
        html! {
            <ErrorModal title={err.title} message={err.message} {on_close} {on_retry} />
        }
    });

    html! {
        <div class="pricing-container">
            <div class="pricing-header">
                <h1>{"Choose your plan"}</h1>
                {
                    match (&current_plan, (*subscription).as_ref()) {
                        (Some(plan), Some(sub)) => html! {
                            <p class="current-plan-banner">
                                {format!("You are on the {} plan", plan.name)}
                                {
                                    if let Some(end) = &sub.current_period_end {
                                        format!(", renewing on {}", format_date(end))
                                    } else {
                                        String::new()
                                    }
                                }
                            </p>
                        },
                        _ => html! {},
                    }
                }
            </div>

            {
                if *loading {
                    html! { <div class="spinner"></div> }
                } else if plans.is_empty() {
                    html! { <p class="empty-plans">{"No plans are available right now."}</p> }
                } else {
                    html! {
                        <div class="pricing-grid">
                            {
                                for plans.iter().map(|plan| html! {
                                    <PlanCard
                                        key={plan.id.clone()}
                                        plan={plan.clone()}
                                        current={current_plan.clone()}
                                        busy={*busy}
                                        on_select={on_select.clone()}
                                    />
                                })
                            }
                        </div>
                    }
                }
            }

            {
                match (&*downgrade_target, &current_plan) {
                    (Some(target), Some(current)) => html! {
                        <DowngradeDialog
                            current={current.clone()}
                            target={target.clone()}
                            on_confirm={on_downgrade_confirmed}
                            on_cancel={on_downgrade_cancel}
                        />
                    },
                    _ => html! {},
                }
            }

            {
                match (&*checkout_plan, &*session) {
                    (Some(plan), Some(session)) => html! {
                        <PaymentModal
                            plan={plan.clone()}
                            session={session.clone()}
                            on_close={on_payment_close}
                            on_success={on_payment_success}
                            on_unauthorized={on_payment_unauthorized}
                        />
                    },
                    _ => html! {},
                }
            }

            { error_modal.unwrap_or_default() }

            <style>
                {r#"
                .pricing-container {
                    max-width: 1100px;
                    margin: 0 auto;
                    padding: 6rem 2rem 4rem;
                    color: #fff;
                }
                .pricing-header {
                    text-align: center;
                    margin-bottom: 3rem;
                }
                .pricing-header h1 {
                    font-size: 2.5rem;
                    background: linear-gradient(45deg, #fff, #7EB2FF);
                    -webkit-background-clip: text;
                    -webkit-text-fill-color: transparent;
                }
                .current-plan-banner {
                    color: rgba(255, 255, 255, 0.7);
                }
                .pricing-grid {
                    display: grid;
                    grid-template-columns: repeat(auto-fit, minmax(260px, 1fr));
                    gap: 2rem;
                }
                .pricing-card {
                    background: rgba(30, 30, 30, 0.8);
                    border: 1px solid rgba(30, 144, 255, 0.1);
                    border-radius: 16px;
                    padding: 2rem;
                    display: flex;
                    flex-direction: column;
                    position: relative;
                }
                .pricing-card.subscription {
                    background: rgba(30, 144, 255, 0.15);
                    border-color: rgba(30, 144, 255, 0.3);
                }
                .pricing-card.current {
                    border-color: #4caf50;
                }
                .pricing-card ul {
                    flex: 1;
                    padding-left: 1.2rem;
                    color: rgba(255, 255, 255, 0.8);
                }
                .popular-tag {
                    position: absolute;
                    top: 1rem;
                    right: 1rem;
                    background: #1E90FF;
                    padding: 0.2rem 0.8rem;
                    border-radius: 12px;
                    font-size: 0.8rem;
                }
                .price .amount {
                    font-size: 2rem;
                    font-weight: bold;
                }
                .price .period {
                    color: rgba(255, 255, 255, 0.6);
                    margin-left: 0.3rem;
                }
                .iq-button {
                    width: 100%;
                    background: linear-gradient(45deg, #1E90FF, #4169E1);
                    border: none;
                    color: white;
                    padding: 0.8rem 1.5rem;
                    border-radius: 8px;
                    font-size: 1rem;
                    cursor: pointer;
                }
                .iq-button:disabled, .iq-button.disabled {
                    background: rgba(255, 255, 255, 0.1);
                    cursor: not-allowed;
                }
                .modal-overlay {
                    position: fixed;
                    inset: 0;
                    background: rgba(0, 0, 0, 0.7);
                    display: flex;
                    align-items: center;
                    justify-content: center;
                    z-index: 1000;
                }
                .modal-content {
                    background: #1a1a1a;
                    border: 1px solid rgba(30, 144, 255, 0.2);
                    border-radius: 12px;
                    padding: 2rem;
                    width: 90%;
                    max-width: 440px;
                    color: #fff;
                }
                .modal-buttons {
                    display: flex;
                    gap: 1rem;
                    justify-content: flex-end;
                    margin-top: 1.5rem;
                }
                .confirm-button, .cancel-button {
                    padding: 0.6rem 1.2rem;
                    border-radius: 8px;
                    border: none;
                    cursor: pointer;
                }
                .confirm-button {
                    background: linear-gradient(45deg, #1E90FF, #4169E1);
                    color: white;
                }
                .cancel-button {
                    background: rgba(255, 255, 255, 0.1);
                    color: white;
                }
                .cancel-button:disabled {
                    opacity: 0.4;
                    cursor: not-allowed;
                }
                .spinner {
                    margin: 2rem auto;
                    width: 40px;
                    height: 40px;
                    border: 4px solid rgba(255, 255, 255, 0.1);
                    border-top-color: #1E90FF;
                    border-radius: 50%;
                    animation: spin 1s linear infinite;
                }
                @keyframes spin {
                    to { transform: rotate(360deg); }
                }
                "#}
            </style>
        </div>
    }
}
