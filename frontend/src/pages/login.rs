use gloo_console::log;
use wasm_bindgen_futures::spawn_local;
use web_sys::HtmlInputElement;
use yew::prelude::*;
use yew_hooks::use_title;

use crate::api::client::BackendClient;

#[function_component(Login)]
pub fn login() -> Html {
    use_title("Log in".to_string());

    let email = use_state(String::new);
    let password = use_state(String::new);
    let error = use_state(|| None::<String>);
    let is_loading = use_state(|| false);

    let onsubmit = {
        let email = email.clone();
        let password = password.clone();
        let error = error.clone();
        let is_loading = is_loading.clone();

        Callback::from(move |e: SubmitEvent| {
            e.prevent_default();
            if email.is_empty() || password.is_empty() {
                error.set(Some("Enter your email and password".to_string()));
                return;
            }
            let email = (*email).clone();
            let password = (*password).clone();
            let error = error.clone();
            let is_loading = is_loading.clone();
            is_loading.set(true);

            spawn_local(async move {
                let client = BackendClient::from_session(None);
                match client.sign_in(&email, &password).await {
                    Ok(session) => {
                        if session.store() {
                            log!("Session stored");
                            error.set(None);
                            // Full reload so the navigation bar picks up the session
                            if let Some(window) = web_sys::window() {
                                let _ = window.location().set_href("/plans");
                            }
                        } else {
                            error.set(Some("Could not save your session in this browser".to_string()));
                        }
                    }
                    Err(e) => {
                        log!("Login failed:", e.to_string());
                        error.set(Some(e.to_string()));
                    }
                }
                is_loading.set(false);
            });
        })
    };

    let on_email = {
        let email = email.clone();
        Callback::from(move |e: InputEvent| {
            let input: HtmlInputElement = e.target_unchecked_into();
            email.set(input.value());
        })
    };

    let on_password = {
        let password = password.clone();
        Callback::from(move |e: InputEvent| {
            let input: HtmlInputElement = e.target_unchecked_into();
            password.set(input.value());
        })
    };

    html! {
        <div style="min-height: 100vh; display: flex; align-items: center; justify-content: center; padding: 2rem;">
            <div class="login-container">
                <h1>{"Log in"}</h1>
                <p>{"Log in to pick or change your plan."}</p>
                {
                    if let Some(message) = (*error).as_ref() {
                        html! { <div class="message error-message">{message}</div> }
                    } else {
                        html! {}
                    }
                }
                <form {onsubmit}>
                    <input
                        type="email"
                        placeholder="Email"
                        value={(*email).clone()}
                        oninput={on_email}
                    />
                    <input
                        type="password"
                        placeholder="Password"
                        value={(*password).clone()}
                        oninput={on_password}
                    />
                    <button type="submit" class="iq-button" disabled={*is_loading}>
                        { if *is_loading { "Logging in..." } else { "Log in" } }
                    </button>
                </form>
            </div>
            <style>
                {r#".login-container {
                    background: rgba(30, 30, 30, 0.7);
                    border: 1px solid rgba(30, 144, 255, 0.1);
                    border-radius: 16px;
                    padding: 3rem;
                    width: 100%;
                    max-width: 480px;
                    backdrop-filter: blur(10px);
                    box-shadow: 0 8px 32px rgba(0, 0, 0, 0.3);
                    color: #fff;
                }
                .login-container h1 {
                    font-size: 2rem;
                    margin-bottom: 1.5rem;
                    text-align: center;
                    background: linear-gradient(45deg, #fff, #7EB2FF);
                    -webkit-background-clip: text;
                    -webkit-text-fill-color: transparent;
                }
                .login-container p {
                    text-align: center;
                    color: rgba(255, 255, 255, 0.8);
                    font-size: 0.9rem;
                    margin-bottom: 1.5rem;
                }
                .login-container input {
                    width: 100%;
                    padding: 0.8rem;
                    margin-bottom: 1rem;
                    border-radius: 8px;
                    border: 1px solid rgba(30, 144, 255, 0.2);
                    background: rgba(0, 0, 0, 0.3);
                    color: white;
                    box-sizing: border-box;
                }
                .login-container .iq-button {
                    width: 100%;
                    background: linear-gradient(45deg, #1E90FF, #4169E1);
                    border: none;
                    color: white;
                    padding: 0.8rem 1.5rem;
                    border-radius: 8px;
                    cursor: pointer;
                }
                .message.error-message {
                    color: #ff6b6b;
                    text-align: center;
                    margin-bottom: 1rem;
                }
                "#}
            </style>
        </div>
    }
}
