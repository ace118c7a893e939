use yew::prelude::*;
use yew_router::prelude::*;
use log::{info, Level};
use web_sys::MouseEvent;

mod config;
mod session;
mod api {
    pub mod billing;
    pub mod client;
    pub mod error;
}
mod plans {
    pub mod models;
    pub mod validation;
}
mod payment {
    pub mod attempt;
    pub mod commit;
    pub mod flow;
    pub mod poller;
    #[cfg(test)]
    pub mod testing;
}
mod components {
    pub mod downgrade_dialog;
    pub mod error_modal;
    pub mod payment_modal;
    pub mod plan_card;
}
mod pages {
    pub mod dashboard;
    pub mod login;
    pub mod plans;
}

use pages::{
    dashboard::Dashboard,
    login::Login,
    plans::PlanSelection,
};
use session::{is_logged_in, Session};


#[derive(Clone, Routable, PartialEq)]
pub enum Route {
    #[at("/")]
    Home,
    #[at("/plans")]
    Plans,
    #[at("/dashboard")]
    Dashboard,
    #[at("/login")]
    Login,
    #[not_found]
    #[at("/404")]
    NotFound,
}


fn switch(routes: Route) -> Html {
    match routes {
        Route::Home | Route::Plans => {
            info!("Rendering Plans page");
            html! { <PlanSelection /> }
        },
        Route::Dashboard => {
            info!("Rendering Dashboard page");
            html! { <Dashboard /> }
        },
        Route::Login => {
            info!("Rendering Login page");
            html! { <Login /> }
        },
        Route::NotFound => {
            html! {
                <div class="not-found">
                    <h1>{"Page not found"}</h1>
                    <Link<Route> to={Route::Plans}>{"See plans"}</Link<Route>>
                </div>
            }
        },
    }
}


#[derive(Properties, PartialEq)]
pub struct NavProps {
    pub logged_in: bool,
    pub on_logout: Callback<()>,
}

#[function_component(Nav)]
pub fn nav(props: &NavProps) -> Html {
    let NavProps { logged_in, on_logout } = props;

    let handle_logout = {
        let on_logout = on_logout.clone();
        Callback::from(move |e: MouseEvent| {
            e.prevent_default();
            on_logout.emit(());
        })
    };

    html! {
        <nav class="top-nav">
            <div class="nav-content">
                <Link<Route> to={Route::Home} classes="nav-logo">
                    {"planpix"}
                </Link<Route>>
                <div class="nav-right">
                    <Link<Route> to={Route::Plans} classes="nav-link">
                        {"Plans"}
                    </Link<Route>>
                    {
                        if *logged_in {
                            html! {
                                <>
                                    <Link<Route> to={Route::Dashboard} classes="nav-link">
                                        {"My subscription"}
                                    </Link<Route>>
                                    <button onclick={handle_logout} class="nav-logout-button">
                                        {"Logout"}
                                    </button>
                                </>
                            }
                        } else {
                            html! {
                                <Link<Route> to={Route::Login} classes="nav-login-button">
                                    {"Login"}
                                </Link<Route>>
                            }
                        }
                    }
                </div>
            </div>
            <style>
                {r#"
                body {
                    margin: 0;
                    background: #121212;
                    font-family: -apple-system, BlinkMacSystemFont, "Segoe UI", Roboto, Helvetica, Arial, sans-serif;
                }
                .top-nav {
                    position: fixed;
                    top: 0;
                    width: 100%;
                    background: rgba(18, 18, 18, 0.9);
                    backdrop-filter: blur(10px);
                    z-index: 100;
                }
                .nav-content {
                    max-width: 1100px;
                    margin: 0 auto;
                    display: flex;
                    justify-content: space-between;
                    align-items: center;
                    padding: 1rem 2rem;
                }
                .nav-logo {
                    color: #fff;
                    font-weight: bold;
                    font-size: 1.3rem;
                    text-decoration: none;
                }
                .nav-right {
                    display: flex;
                    gap: 1.5rem;
                    align-items: center;
                }
                .nav-link, .nav-login-button {
                    color: rgba(255, 255, 255, 0.8);
                    text-decoration: none;
                }
                .nav-logout-button {
                    background: transparent;
                    border: 1px solid rgba(30, 144, 255, 0.4);
                    color: #fff;
                    padding: 0.4rem 1rem;
                    border-radius: 6px;
                    cursor: pointer;
                }
                .not-found {
                    color: #fff;
                    text-align: center;
                    padding-top: 8rem;
                }
                "#}
            </style>
        </nav>
    }
}


#[function_component]
fn App() -> Html {
    let logged_in = use_state(is_logged_in);
    let handle_logout = {
        Callback::from(move |_: ()| {
            Session::clear();
            if let Some(window) = web_sys::window() {
                // Reload the page to reflect the logged out state
                let _ = window.location().reload();
            }
        })
    };

    html! {
        <BrowserRouter>
            <Nav logged_in={*logged_in} on_logout={handle_logout} />
            <Switch<Route> render={switch} />
        </BrowserRouter>
    }
}


fn main() {
    // Initialize console error panic hook for better error messages
    console_error_panic_hook::set_once();

    // Initialize logging
    if let Err(e) = console_log::init_with_level(Level::Info) {
        gloo_console::error!("error initializing log:", e.to_string());
    }

    info!("Starting application");
    yew::Renderer::<App>::new().render();
}
