use log::error;
use wasm_bindgen_futures::spawn_local;
use yew::prelude::*;
use yew_hooks::use_title;
use yew_router::prelude::*;

use crate::api::billing::BillingApi;
use crate::api::client::BackendClient;
use crate::api::error::ApiError;
use crate::plans::models::{format_brl, format_date, Subscription};
use crate::session::Session;
use crate::Route;

#[function_component(Dashboard)]
pub fn dashboard() -> Html {
    use_title("Your subscription".to_string());

    let navigator = use_navigator();
    let subscription = use_state(|| None::<Subscription>);
    let loading = use_state(|| true);
    let error = use_state(|| None::<String>);

    {
        let subscription = subscription.clone();
        let loading = loading.clone();
        let error = error.clone();
        use_effect_with_deps(move |_| {
            match Session::load() {
                Some(session) => {
                    spawn_local(async move {
                        let api = BackendClient::from_session(Some(session.clone()));
                        match api.current_subscription(&session.user_id).await {
                            Ok(current) => subscription.set(current),
                            Err(ApiError::Unauthorized) => {
                                Session::clear();
                                if let Some(navigator) = navigator {
                                    navigator.push(&Route::Login);
                                }
                            }
                            Err(e) => {
                                error!("Failed to load subscription: {}", e);
                                error.set(Some(e.to_string()));
                            }
                        }
                        loading.set(false);
                    });
                }
                None => {
                    if let Some(navigator) = navigator {
                        navigator.push(&Route::Login);
                    }
                }
            }
            || ()
        }, ());
    }

    let content = if *loading {
        html! { <div class="spinner"></div> }
    } else if let Some(message) = (*error).clone() {
        html! { <p class="error-message">{message}</p> }
    } else if let Some(sub) = (*subscription).clone() {
        let plan_name = sub.plan.as_ref().map(|p| p.name.clone()).unwrap_or_else(|| sub.plan_id.clone());
        html! {
            <div class="subscription-summary">
                <div class="summary-row">
                    <span>{"Plan"}</span>
                    <strong>{plan_name}</strong>
                </div>
                {
                    if let Some(plan) = &sub.plan {
                        html! {
                            <div class="summary-row">
                                <span>{"Price"}</span>
                                <strong>{format!("{}{}", format_brl(plan.price_cents), plan.interval_label())}</strong>
                            </div>
                        }
                    } else {
                        html! {}
                    }
                }
                <div class="summary-row">
                    <span>{"Status"}</span>
                    <strong>{&sub.status}</strong>
                </div>
                {
                    if let Some(end) = &sub.current_period_end {
                        html! {
                            <div class="summary-row">
                                <span>{"Renews on"}</span>
                                <strong>{format_date(end)}</strong>
                            </div>
                        }
                    } else {
                        html! {}
                    }
                }
            </div>
        }
    } else {
        html! { <p>{"You don't have an active plan yet."}</p> }
    };

    html! {
        <div class="dashboard-container">
            <h1>{"Your subscription"}</h1>
            {content}
            <Link<Route> to={Route::Plans} classes="forward-link">
                <button class="iq-button">{"Change plan"}</button>
            </Link<Route>>
            <style>
                {r#"
                .dashboard-container {
                    max-width: 560px;
                    margin: 0 auto;
                    padding: 6rem 2rem;
                    color: #fff;
                }
                .subscription-summary {
                    background: rgba(30, 30, 30, 0.8);
                    border: 1px solid rgba(30, 144, 255, 0.2);
                    border-radius: 12px;
                    padding: 1.5rem;
                    margin-bottom: 2rem;
                }
                .summary-row {
                    display: flex;
                    justify-content: space-between;
                    padding: 0.5rem 0;
                }
                .error-message {
                    color: #ff6b6b;
                }
                .iq-button {
                    width: 100%;
                    background: linear-gradient(45deg, #1E90FF, #4169E1);
                    border: none;
                    color: white;
                    padding: 0.8rem 1.5rem;
                    border-radius: 8px;
                    cursor: pointer;
                }
                "#}
            </style>
        </div>
    }
}
