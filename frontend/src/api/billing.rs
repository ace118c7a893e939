use async_trait::async_trait;
use chrono::Utc;

use crate::api::client::BackendClient;
use crate::api::error::ApiError;
use crate::plans::models::{
    ActivateFreeRequest, CheckStatusRequest, GeneratePaymentRequest, NotificationRequest,
    PaymentStatus, PaymentStatusResponse, PaymentUpdate, PixCharge, Plan, Subscription,
    TransitionRequest,
};

/// Backend operations used by the plan selection and payment flow.
#[async_trait(?Send)]
pub trait BillingApi {
    async fn list_plans(&self) -> Result<Vec<Plan>, ApiError>;

    async fn current_subscription(&self, user_id: &str) -> Result<Option<Subscription>, ApiError>;

    async fn activate_free_plan(&self, request: &ActivateFreeRequest) -> Result<(), ApiError>;

    async fn generate_pix_payment(&self, request: &GeneratePaymentRequest) -> Result<PixCharge, ApiError>;

    async fn check_payment_status(&self, payment_id: &str) -> Result<PaymentStatus, ApiError>;

    async fn mark_payment_approved(&self, payment_id: &str) -> Result<(), ApiError>;

    async fn transition_subscription(&self, request: &TransitionRequest) -> Result<(), ApiError>;

    async fn send_notification(&self, request: &NotificationRequest) -> Result<(), ApiError>;
}

#[async_trait(?Send)]
impl BillingApi for BackendClient {
    async fn list_plans(&self) -> Result<Vec<Plan>, ApiError> {
        self.rest_get("plans", "select=*&is_active=eq.true&order=price_cents.asc").await
    }

    async fn current_subscription(&self, user_id: &str) -> Result<Option<Subscription>, ApiError> {
        let query = format!(
            "select=*,plan:plans(*)&user_id=eq.{}&status=eq.active&order=created_at.desc&limit=1",
            urlencoding::encode(user_id)
        );
        let mut rows: Vec<Subscription> = self.rest_get("subscriptions", &query).await?;
        Ok(if rows.is_empty() { None } else { Some(rows.swap_remove(0)) })
    }

    async fn activate_free_plan(&self, request: &ActivateFreeRequest) -> Result<(), ApiError> {
        self.rpc("activate_free_plan", request).await
    }

    async fn generate_pix_payment(&self, request: &GeneratePaymentRequest) -> Result<PixCharge, ApiError> {
        let charge: PixCharge = self.invoke("generate-pix-payment", request).await?;
        if charge.qr_code.is_empty() {
            return Err(ApiError::Empty("PIX code"));
        }
        Ok(charge)
    }

    async fn check_payment_status(&self, payment_id: &str) -> Result<PaymentStatus, ApiError> {
        let request = CheckStatusRequest { payment_id: payment_id.to_string() };
        let response: PaymentStatusResponse = self.invoke("check-payment-status", &request).await?;
        Ok(response.status)
    }

    async fn mark_payment_approved(&self, payment_id: &str) -> Result<(), ApiError> {
        let update = PaymentUpdate {
            status: PaymentStatus::Approved,
            paid_at: Utc::now(),
        };
        let query = format!("id=eq.{}", urlencoding::encode(payment_id));
        self.rest_patch("payments", &query, &update).await
    }

    async fn transition_subscription(&self, request: &TransitionRequest) -> Result<(), ApiError> {
        self.rpc("transition_subscription", request).await
    }

    async fn send_notification(&self, request: &NotificationRequest) -> Result<(), ApiError> {
        let _: serde_json::Value = self.invoke("send-notification", request).await?;
        Ok(())
    }
}
