use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeviceId(pub String);

impl DeviceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn random() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// Wire form is the bare variant name; the welcome return URL carries it verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum WelcomeMode {
    #[default]
    Complete,
    OnlySipSettings,
    OnlyPayment,
}

impl WelcomeMode {
    pub fn from_query_value(value: Option<&str>) -> Self {
        match value {
            Some("Complete") => Self::Complete,
            Some("OnlySipSettings") => Self::OnlySipSettings,
            Some("OnlyPayment") => Self::OnlyPayment,
            _ => Self::Complete,
        }
    }

    pub fn as_query_value(&self) -> &'static str {
        match self {
            Self::Complete => "Complete",
            Self::OnlySipSettings => "OnlySipSettings",
            Self::OnlyPayment => "OnlyPayment",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentStatus {
    Succeeded,
    RequiresCapture,
    RequiresPaymentMethod,
    Other(String),
}

impl PaymentStatus {
    pub fn from_wire(raw: &str) -> Self {
        match raw {
            "succeeded" => Self::Succeeded,
            "requires_capture" => Self::RequiresCapture,
            "requires_payment_method" => Self::RequiresPaymentMethod,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_wire(&self) -> &str {
        match self {
            Self::Succeeded => "succeeded",
            Self::RequiresCapture => "requires_capture",
            Self::RequiresPaymentMethod => "requires_payment_method",
            Self::Other(raw) => raw,
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_wire())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionReason {
    SubscriptionActive,
    CapturePending,
    PaymentConfirmed,
}

impl CompletionReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SubscriptionActive => "subscription_active",
            Self::CapturePending => "capture_pending",
            Self::PaymentConfirmed => "payment_confirmed",
        }
    }
}

impl fmt::Display for CompletionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DrinkCharacter {
    YoungWoman,
    YoungMan,
    Diverse,
}

impl DrinkCharacter {
    pub const VARIANTS: [DrinkCharacter; 3] = [Self::YoungWoman, Self::YoungMan, Self::Diverse];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SipLevel {
    Minimal,
    Small,
    Medium,
    Large,
    Full,
}

impl SipLevel {
    pub const VARIANTS: [SipLevel; 5] = [
        Self::Minimal,
        Self::Small,
        Self::Medium,
        Self::Large,
        Self::Full,
    ];
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanDescriptor {
    pub trial: bool,
    pub trial_days_total: i64,
    pub trial_days_left: i64,
    pub monthly_price: String,
    pub yearly_price: String,
}

/// Inclusive day count, both endpoints counted.
pub fn days_between(start: DateTime<Utc>, end: DateTime<Utc>) -> i64 {
    (end - start).num_days() + 1
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn welcome_mode_falls_back_to_complete() {
        assert_eq!(WelcomeMode::from_query_value(None), WelcomeMode::Complete);
        assert_eq!(
            WelcomeMode::from_query_value(Some("NotAMode")),
            WelcomeMode::Complete
        );
        assert_eq!(
            WelcomeMode::from_query_value(Some("onlypayment")),
            WelcomeMode::Complete
        );
    }

    #[test]
    fn welcome_mode_parses_known_values() {
        assert_eq!(
            WelcomeMode::from_query_value(Some("OnlySipSettings")),
            WelcomeMode::OnlySipSettings
        );
        assert_eq!(
            WelcomeMode::from_query_value(Some("OnlyPayment")),
            WelcomeMode::OnlyPayment
        );
    }

    #[test]
    fn welcome_mode_serializes_as_variant_name() {
        let encoded = serde_json::to_string(&WelcomeMode::OnlyPayment).expect("serialize mode");
        assert_eq!(encoded, "\"OnlyPayment\"");
    }

    #[test]
    fn payment_status_preserves_unknown_wire_values() {
        assert_eq!(
            PaymentStatus::from_wire("succeeded"),
            PaymentStatus::Succeeded
        );
        assert_eq!(
            PaymentStatus::from_wire("requires_capture"),
            PaymentStatus::RequiresCapture
        );
        let other = PaymentStatus::from_wire("requires_action");
        assert_eq!(other, PaymentStatus::Other("requires_action".to_string()));
        assert_eq!(other.as_wire(), "requires_action");
    }

    #[test]
    fn days_between_counts_both_endpoints() {
        let start = Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2025, 3, 14, 9, 0, 0).unwrap();
        assert_eq!(days_between(start, end), 14);
        assert_eq!(days_between(start, start), 1);
    }
}
