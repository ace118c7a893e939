use std::cell::RefCell;
use std::rc::Rc;

use futures::future::AbortHandle;
use gloo_timers::callback::Timeout;
use log::{info, warn};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::{spawn_local, JsFuture};
use yew::prelude::*;

use crate::api::client::BackendClient;
use crate::config::FlowTiming;
use crate::payment::attempt::AttemptTracker;
use crate::payment::flow::{checkout_task, CheckoutOutcome, CheckoutRequest, PaymentPhase};
use crate::payment::poller::BrowserSleeper;
use crate::plans::models::{format_brl, format_date, Plan};
use crate::session::Session;

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = ["navigator", "clipboard"], js_name = writeText, catch)]
    fn write_text(text: &str) -> Result<js_sys::Promise, JsValue>;
}

async fn copy_to_clipboard(text: &str) -> Result<(), JsValue> {
    JsFuture::from(write_text(text)?).await?;
    Ok(())
}

#[derive(Properties, PartialEq, Clone)]
pub struct PaymentModalProps {
    pub plan: Plan,
    pub session: Session,
    pub on_close: Callback<()>,
    pub on_success: Callback<()>,
    /// The backend rejected the session mid checkout.
    pub on_unauthorized: Callback<()>,
}

#[function_component(PaymentModal)]
pub fn payment_modal(props: &PaymentModalProps) -> Html {
    let phase = use_state(|| PaymentPhase::Generating);
    let tracker = use_state(AttemptTracker::new);
    let abort_handle: Rc<RefCell<Option<AbortHandle>>> = use_mut_ref(|| None);
    let retries = use_state(|| 0u32);
    let copied = use_state(|| false);

    // One checkout run per (plan, retry). Re-running or unmounting aborts the
    // previous run's generation and polling and stales its attempt so late
    // results are dropped.
    {
        let phase = phase.clone();
        let tracker = (*tracker).clone();
        let abort_handle = abort_handle.clone();
        let on_success = props.on_success.clone();
        let on_unauthorized = props.on_unauthorized.clone();
        let request = CheckoutRequest {
            user_id: props.session.user_id.clone(),
            email: props.session.email.clone(),
            plan: props.plan.clone(),
        };
        let session = props.session.clone();

        use_effect_with_deps(move |_| {
            if let Some(previous) = abort_handle.borrow_mut().take() {
                previous.abort();
            }
            let attempt = tracker.begin();
            info!("Starting checkout attempt {} for plan {}", attempt.id(), request.plan.id);

            let on_phase = {
                let phase = phase.clone();
                move |next: PaymentPhase| phase.set(next)
            };
            let on_done = {
                let attempt = attempt.clone();
                move |outcome: CheckoutOutcome| match outcome {
                    CheckoutOutcome::Unauthorized if attempt.is_current() => on_unauthorized.emit(()),
                    CheckoutOutcome::Activated if attempt.is_current() => on_success.emit(()),
                    _ => {}
                }
            };
            // Only generation and polling are abortable; an approved payment
            // is always committed.
            let (run, handle) = checkout_task(
                Rc::new(BackendClient::from_session(Some(session))),
                Rc::new(BrowserSleeper),
                request,
                attempt,
                FlowTiming::default(),
                on_phase,
                on_done,
            );
            *abort_handle.borrow_mut() = Some(handle);
            spawn_local(run);

            move || {
                tracker.invalidate();
                if let Some(handle) = abort_handle.borrow_mut().take() {
                    handle.abort();
                }
            }
        }, (props.plan.id.clone(), *retries));
    }

    let close = {
        let tracker = (*tracker).clone();
        let abort_handle = abort_handle.clone();
        let on_close = props.on_close.clone();
        Callback::from(move |_: MouseEvent| {
            tracker.invalidate();
            if let Some(handle) = abort_handle.borrow_mut().take() {
                handle.abort();
            }
            on_close.emit(());
        })
    };

    let retry = {
        let retries = retries.clone();
        let phase = phase.clone();
        Callback::from(move |_: MouseEvent| {
            phase.set(PaymentPhase::Generating);
            retries.set(*retries + 1);
        })
    };

    let copy_code = {
        let copied = copied.clone();
        let phase = phase.clone();
        Callback::from(move |_: MouseEvent| {
            let code = match &*phase {
                PaymentPhase::AwaitingPayment(charge) => charge.qr_code.clone(),
                _ => return,
            };
            let copied = copied.clone();
            spawn_local(async move {
                match copy_to_clipboard(&code).await {
                    Ok(()) => {
                        copied.set(true);
                        let copied = copied.clone();
                        Timeout::new(2_000, move || copied.set(false)).forget();
                    }
                    Err(e) => warn!("Clipboard write failed: {:?}", e),
                }
            });
        })
    };

    // The commit survives unmount, but closing mid-commit would hide its result
    let closable = *phase != PaymentPhase::Activating && *phase != PaymentPhase::Activated;

    let body = match &*phase {
        PaymentPhase::Generating => html! {
            <div class="payment-loading">
                <div class="spinner"></div>
            </div>
        },
        PaymentPhase::AwaitingPayment(charge) => html! {
            <div class="pix-charge">
                <img class="pix-qr" src={charge.qr_image_src()} alt="PIX QR code" />
                <div class="pix-amount">
                    {format_brl(if charge.amount_cents > 0 { charge.amount_cents } else { props.plan.price_cents })}
                </div>
                <label class="pix-code-label">{"PIX copy and paste code"}</label>
                <div class="pix-code-row">
                    <input class="pix-code" type="text" readonly=true value={charge.qr_code.clone()} />
                    <button class="copy-button" onclick={copy_code}>
                        { if *copied { "Copied!" } else { "Copy" } }
                    </button>
                </div>
                {
                    if let Some(expires_at) = &charge.expires_at {
                        html! { <p class="pix-expiry">{format!("Valid until {}", format_date(expires_at))}</p> }
                    } else {
                        html! {}
                    }
                }
            </div>
        },
        PaymentPhase::Activating | PaymentPhase::Activated => html! {
            <div class="payment-success">{"✓"}</div>
        },
        PaymentPhase::Declined(_) | PaymentPhase::Failed(_) => html! {},
    };

    html! {
        <div class="modal-overlay">
            <div class="modal-content payment-modal" role="dialog">
                <h3>{phase.title()}</h3>
                <p class="payment-plan">
                    {format!("{} · {}{}", props.plan.name, format_brl(props.plan.price_cents), props.plan.interval_label())}
                </p>
                {body}
                <p class={classes!("payment-status", phase.can_retry().then(|| "error-message"))}>
                    {phase.message()}
                </p>
                <div class="modal-buttons">
                    {
                        if phase.can_retry() {
                            html! { <button class="confirm-button" onclick={retry}>{"Try again"}</button> }
                        } else {
                            html! {}
                        }
                    }
                    <button class="cancel-button" onclick={close} disabled={!closable}>{"Close"}</button>
                </div>
            </div>
            <style>
                {r#"
                .payment-modal {
                    text-align: center;
                }
                .payment-plan {
                    color: rgba(255, 255, 255, 0.7);
                }
                .pix-qr {
                    width: 220px;
                    height: 220px;
                    background: white;
                    border-radius: 8px;
                    padding: 0.5rem;
                }
                .pix-amount {
                    font-size: 1.6rem;
                    font-weight: bold;
                    margin: 1rem 0;
                }
                .pix-code-label {
                    display: block;
                    font-size: 0.85rem;
                    color: rgba(255, 255, 255, 0.6);
                    margin-bottom: 0.4rem;
                }
                .pix-code-row {
                    display: flex;
                    gap: 0.5rem;
                }
                .pix-code {
                    flex: 1;
                    padding: 0.5rem;
                    border-radius: 6px;
                    border: 1px solid rgba(30, 144, 255, 0.3);
                    background: rgba(0, 0, 0, 0.3);
                    color: white;
                    font-family: monospace;
                }
                .copy-button {
                    padding: 0.5rem 1rem;
                    border-radius: 6px;
                    border: none;
                    background: #1E90FF;
                    color: white;
                    cursor: pointer;
                }
                .pix-expiry {
                    font-size: 0.85rem;
                    color: rgba(255, 255, 255, 0.6);
                }
                .payment-status {
                    margin-top: 1rem;
                }
                .payment-success {
                    font-size: 3rem;
                    color: #4caf50;
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
