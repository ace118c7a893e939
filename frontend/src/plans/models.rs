use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct Plan {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price_cents: i64,
    #[serde(default = "default_interval")]
    pub interval: String,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default)]
    pub is_popular: bool,
}

fn default_interval() -> String {
    "month".to_string()
}

impl Plan {
    pub fn is_free(&self) -> bool {
        self.price_cents <= 0
    }

    pub fn interval_label(&self) -> &str {
        match self.interval.as_str() {
            "month" | "monthly" => "/mês",
            "year" | "yearly" | "annual" => "/ano",
            _ => "",
        }
    }
}

#[derive(Deserialize, Clone, Debug, PartialEq)]
pub struct Subscription {
    pub id: String,
    pub user_id: String,
    pub plan_id: String,
    pub status: String,
    #[serde(default)]
    pub current_period_end: Option<DateTime<Utc>>,
    // Embedded through `select=*,plan:plans(*)`
    #[serde(default)]
    pub plan: Option<Plan>,
}

/// Status of a PIX charge as reported by the status function.
///
/// Unrecognised strings are kept so they can be logged, and are treated as
/// still pending.
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, Eq)]
#[serde(from = "String", into = "String")]
pub enum PaymentStatus {
    Pending,
    InProcess,
    Approved,
    Rejected,
    Cancelled,
    Expired,
    Error,
    Unknown(String),
}

impl PaymentStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PaymentStatus::Approved
                | PaymentStatus::Rejected
                | PaymentStatus::Cancelled
                | PaymentStatus::Expired
                | PaymentStatus::Error
        )
    }

    pub fn as_str(&self) -> &str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::InProcess => "in_process",
            PaymentStatus::Approved => "approved",
            PaymentStatus::Rejected => "rejected",
            PaymentStatus::Cancelled => "cancelled",
            PaymentStatus::Expired => "expired",
            PaymentStatus::Error => "error",
            PaymentStatus::Unknown(other) => other,
        }
    }
}

impl From<String> for PaymentStatus {
    fn from(value: String) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "pending" => PaymentStatus::Pending,
            "in_process" | "in_mediation" | "authorized" => PaymentStatus::InProcess,
            "approved" | "paid" => PaymentStatus::Approved,
            "rejected" => PaymentStatus::Rejected,
            "cancelled" | "canceled" => PaymentStatus::Cancelled,
            "expired" => PaymentStatus::Expired,
            "error" => PaymentStatus::Error,
            _ => PaymentStatus::Unknown(value),
        }
    }
}

impl From<PaymentStatus> for String {
    fn from(status: PaymentStatus) -> Self {
        status.as_str().to_string()
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Deserialize, Clone, Debug, PartialEq)]
pub struct PixCharge {
    pub payment_id: String,
    /// PIX "copia e cola" code.
    pub qr_code: String,
    pub qr_code_base64: String,
    #[serde(default)]
    pub amount_cents: i64,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

impl PixCharge {
    pub fn qr_image_src(&self) -> String {
        if self.qr_code_base64.starts_with("data:") {
            self.qr_code_base64.clone()
        } else {
            format!("data:image/png;base64,{}", self.qr_code_base64)
        }
    }
}

#[derive(Deserialize, Clone, Debug, PartialEq)]
pub struct PaymentStatusResponse {
    pub status: PaymentStatus,
}

#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct GeneratePaymentRequest {
    pub user_id: String,
    pub plan_id: String,
    pub amount_cents: i64,
    pub email: String,
}

#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct CheckStatusRequest {
    pub payment_id: String,
}

#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct PaymentUpdate {
    pub status: PaymentStatus,
    pub paid_at: DateTime<Utc>,
}

/// Arguments of the `transition_subscription` procedure.
#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct TransitionRequest {
    #[serde(rename = "p_user_id")]
    pub user_id: String,
    #[serde(rename = "p_new_plan_id")]
    pub new_plan_id: String,
    #[serde(rename = "p_payment_id")]
    pub payment_id: Option<String>,
}

#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct ActivateFreeRequest {
    #[serde(rename = "p_user_id")]
    pub user_id: String,
    #[serde(rename = "p_plan_id")]
    pub plan_id: String,
}

#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct NotificationRequest {
    pub user_id: String,
    pub kind: String,
    pub plan_id: String,
    pub payment_id: String,
}

#[derive(Serialize)]
pub struct SignInRequest {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize, Clone, Debug)]
pub struct AuthUser {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Deserialize, Clone, Debug)]
pub struct SignInResponse {
    pub access_token: String,
    pub user: AuthUser,
}

/// Formats an amount in centavos as Brazilian reais, e.g. `R$ 1.234,56`.
pub fn format_brl(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    let reais = (abs / 100).to_string();
    let mut grouped = String::with_capacity(reais.len() + reais.len() / 3);
    for (i, ch) in reais.chars().enumerate() {
        if i > 0 && (reais.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }
    format!("{}R$ {},{:02}", sign, grouped, abs % 100)
}

pub fn format_date(date: &DateTime<Utc>) -> String {
    date.format("%d/%m/%Y %H:%M").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn plan(price_cents: i64) -> Plan {
        Plan {
            id: "p".to_string(),
            name: "Plan".to_string(),
            description: None,
            price_cents,
            interval: "month".to_string(),
            features: vec![],
            is_popular: false,
        }
    }

    #[test]
    fn formats_reais_with_thousands_separator() {
        assert_eq!(format_brl(0), "R$ 0,00");
        assert_eq!(format_brl(2990), "R$ 29,90");
        assert_eq!(format_brl(123456), "R$ 1.234,56");
        assert_eq!(format_brl(100000000), "R$ 1.000.000,00");
        assert_eq!(format_brl(-150), "-R$ 1,50");
    }

    #[test]
    fn zero_price_plan_is_free() {
        assert!(plan(0).is_free());
        assert!(!plan(990).is_free());
    }

    #[test]
    fn terminal_statuses() {
        assert!(PaymentStatus::Approved.is_terminal());
        assert!(PaymentStatus::Rejected.is_terminal());
        assert!(PaymentStatus::Error.is_terminal());
        assert!(PaymentStatus::Expired.is_terminal());
        assert!(!PaymentStatus::Pending.is_terminal());
        assert!(!PaymentStatus::InProcess.is_terminal());
        assert!(!PaymentStatus::Unknown("weird".to_string()).is_terminal());
    }

    #[test]
    fn status_parses_provider_spellings() {
        let parsed: PaymentStatusResponse =
            serde_json::from_str(r#"{"status":"canceled"}"#).unwrap();
        assert_eq!(parsed.status, PaymentStatus::Cancelled);

        let parsed: PaymentStatusResponse =
            serde_json::from_str(r#"{"status":"APPROVED"}"#).unwrap();
        assert_eq!(parsed.status, PaymentStatus::Approved);

        let parsed: PaymentStatusResponse =
            serde_json::from_str(r#"{"status":"refunded"}"#).unwrap();
        assert_eq!(parsed.status, PaymentStatus::Unknown("refunded".to_string()));
    }

    #[test]
    fn transition_request_uses_procedure_argument_names() {
        let request = TransitionRequest {
            user_id: "u1".to_string(),
            new_plan_id: "pro".to_string(),
            payment_id: Some("pay_1".to_string()),
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["p_user_id"], "u1");
        assert_eq!(json["p_new_plan_id"], "pro");
        assert_eq!(json["p_payment_id"], "pay_1");
    }

    #[test]
    fn qr_image_src_adds_data_prefix_once() {
        let mut charge = PixCharge {
            payment_id: "1".to_string(),
            qr_code: "000201".to_string(),
            qr_code_base64: "iVBOR".to_string(),
            amount_cents: 2990,
            expires_at: None,
        };
        assert_eq!(charge.qr_image_src(), "data:image/png;base64,iVBOR");
        charge.qr_code_base64 = "data:image/png;base64,iVBOR".to_string();
        assert_eq!(charge.qr_image_src(), "data:image/png;base64,iVBOR");
    }

    #[test]
    fn charge_deserializes_without_optional_fields() {
        let charge: PixCharge = serde_json::from_str(
            r#"{"payment_id":"42","qr_code":"000201","qr_code_base64":"abc"}"#,
        )
        .unwrap();
        assert_eq!(charge.amount_cents, 0);
        assert!(charge.expires_at.is_none());
    }

    #[test]
    fn formats_dates_day_first() {
        let date = Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 0).unwrap();
        assert_eq!(format_date(&date), "09/03/2024 14:05");
    }
}
