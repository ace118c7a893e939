use yew::prelude::*;

fn default_title() -> String {
    "Something went wrong".to_string()
}

#[derive(Properties, PartialEq, Clone)]
pub struct ErrorModalProps {
    #[prop_or_else(default_title)]
    pub title: String,
    pub message: String,
    pub on_close: Callback<()>,
    #[prop_or_default]
    pub on_retry: Option<Callback<()>>,
}

#[function_component(ErrorModal)]
pub fn error_modal(props: &ErrorModalProps) -> Html {
    let close = {
        let on_close = props.on_close.clone();
        Callback::from(move |_: MouseEvent| on_close.emit(()))
    };

    // Clicks inside the dialog must not reach the backdrop
    let stop = Callback::from(|e: MouseEvent| e.stop_propagation());

    html! {
        <div class="modal-overlay" onclick={close.clone()}>
            <div class="modal-content error-modal" role="alertdialog" onclick={stop}>
                <h3>{&props.title}</h3>
                <p class="error-message">{&props.message}</p>
                <div class="modal-buttons">
                    {
                        if let Some(on_retry) = props.on_retry.clone() {
                            html! {
                                <button
                                    class="confirm-button"
                                    onclick={Callback::from(move |_: MouseEvent| on_retry.emit(()))}
                                >
                                    {"Try again"}
                                </button>
                            }
                        } else {
                            html! {}
                        }
                    }
                    <button class="cancel-button" onclick={close}>{"Close"}</button>
                </div>
            </div>
            <style>
                {r#"
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
                    box-shadow: 0 8px 32px rgba(0, 0, 0, 0.4);
                }
                .error-modal h3 {
                    color: #ff6b6b;
                    margin-top: 0;
                }
                .error-message {
                    color: rgba(255, 255, 255, 0.85);
                    line-height: 1.5;
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
                    font-size: 0.95rem;
                }
                .confirm-button {
                    background: linear-gradient(45deg, #1E90FF, #4169E1);
                    color: white;
                }
                .confirm-button:disabled {
                    opacity: 0.5;
                    cursor: not-allowed;
                }
                .cancel-button {
                    background: rgba(255, 255, 255, 0.1);
                    color: white;
                }
                "#}
            </style>
        </div>
    }
}
