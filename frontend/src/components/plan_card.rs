use yew::prelude::*;

use crate::plans::models::{format_brl, Plan};

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PlanAction {
    Current,
    Upgrade,
    Downgrade,
    Choose,
}

impl PlanAction {
    pub fn for_plan(current: Option<&Plan>, plan: &Plan) -> PlanAction {
        match current {
            Some(current) if current.id == plan.id => PlanAction::Current,
            Some(current) if plan.price_cents < current.price_cents => PlanAction::Downgrade,
            Some(_) => PlanAction::Upgrade,
            None => PlanAction::Choose,
        }
    }

    pub fn label(&self, plan: &Plan) -> &'static str {
        match self {
            PlanAction::Current => "Current plan",
            PlanAction::Upgrade => "Upgrade",
            PlanAction::Downgrade => "Downgrade",
            PlanAction::Choose if plan.is_free() => "Start for free",
            PlanAction::Choose => "Choose plan",
        }
    }
}

#[derive(Properties, PartialEq, Clone)]
pub struct PlanCardProps {
    pub plan: Plan,
    #[prop_or_default]
    pub current: Option<Plan>,
    #[prop_or_default]
    pub busy: bool,
    pub on_select: Callback<Plan>,
}

#[function_component(PlanCard)]
pub fn plan_card(props: &PlanCardProps) -> Html {
    let plan = &props.plan;
    let action = PlanAction::for_plan(props.current.as_ref(), plan);

    let onclick = {
        let plan = plan.clone();
        let on_select = props.on_select.clone();
        Callback::from(move |e: MouseEvent| {
            e.prevent_default();
            on_select.emit(plan.clone());
        })
    };

    let card_class = classes!(
        "pricing-card",
        plan.is_popular.then(|| "subscription"),
        (action == PlanAction::Current).then(|| "current"),
    );

    html! {
        <div class={card_class}>
            {
                if plan.is_popular {
                    html! { <div class="popular-tag">{"Most Popular"}</div> }
                } else {
                    html! {}
                }
            }
            <div class="card-header">
                <h3>{&plan.name}</h3>
                <div class="price">
                    <span class="amount">{format_brl(plan.price_cents)}</span>
                    <span class="period">{plan.interval_label()}</span>
                </div>
                {
                    if let Some(description) = &plan.description {
                        html! { <p class="plan-description">{description}</p> }
                    } else {
                        html! {}
                    }
                }
            </div>
            <ul>
                { for plan.features.iter().map(|feature| html! { <li>{feature}</li> }) }
            </ul>
            <button
                class={classes!("iq-button", (action == PlanAction::Current).then(|| "disabled"))}
                disabled={action == PlanAction::Current || props.busy}
                {onclick}
            >
                <b>{action.label(plan)}</b>
            </button>
        </div>
    }
}
