use yew::prelude::*;

use crate::plans::models::{format_brl, Plan};

#[derive(Properties, PartialEq, Clone)]
pub struct DowngradeDialogProps {
    pub current: Plan,
    pub target: Plan,
    pub on_confirm: Callback<Plan>,
    pub on_cancel: Callback<()>,
}

#[function_component(DowngradeDialog)]
pub fn downgrade_dialog(props: &DowngradeDialogProps) -> Html {
    let confirm = {
        let target = props.target.clone();
        let on_confirm = props.on_confirm.clone();
        Callback::from(move |_: MouseEvent| on_confirm.emit(target.clone()))
    };
    let cancel = {
        let on_cancel = props.on_cancel.clone();
        Callback::from(move |_: MouseEvent| on_cancel.emit(()))
    };

    html! {
        <div class="modal-overlay">
            <div class="modal-content" role="dialog">
                <h3>{"Confirm downgrade"}</h3>
                <p>
                    {format!(
                        "You are moving from {} ({}) to {} ({}).",
                        props.current.name,
                        format_brl(props.current.price_cents),
                        props.target.name,
                        format_brl(props.target.price_cents),
                    )}
                </p>
                <p class="downgrade-warning">
                    {"Features that are not part of the new plan will stop working once the change is applied."}
                </p>
                <div class="modal-buttons">
                    <button class="confirm-button" onclick={confirm}>{"Confirm downgrade"}</button>
                    <button class="cancel-button" onclick={cancel}>{"Keep current plan"}</button>
                </div>
            </div>
            <style>
                {r#"
                .downgrade-warning {
                    color: #ffb74d;
                    font-size: 0.9rem;
                }
                "#}
            </style>
        </div>
    }
}
