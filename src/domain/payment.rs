use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Processor {
    Default,
    Fallback,
}

impl Processor {
    pub const ALL: [Processor; 2] = [Processor::Default, Processor::Fallback];

    pub fn as_str(&self) -> &'static str {
        match self {
            Processor::Default => "default",
            Processor::Fallback => "fallback",
        }
    }

    pub fn other(&self) -> Processor {
        match self {
            Processor::Default => Processor::Fallback,
            Processor::Fallback => Processor::Default,
        }
    }
}

impl fmt::Display for Processor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Processor {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "default" => Ok(Processor::Default),
            "fallback" => Ok(Processor::Fallback),
            other => Err(anyhow::anyhow!("unknown processor: {other}")),
        }
    }
}

/// Body accepted by `POST /payments`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePaymentRequest {
    pub correlation_id: Uuid,
    pub amount: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequest {
    pub correlation_id: Uuid,
    pub amount: Decimal,
    pub received_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettlementRecord {
    pub correlation_id: Uuid,
    pub amount: Decimal,
    pub processor: Processor,
    pub settled_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePaymentResponse {
    pub status: String,
    pub message: String,
    pub correlation_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct ErrorEnvelope {
    pub error: ErrorPayload,
}

#[derive(Debug, Serialize)]
pub struct ErrorPayload {
    pub code: String,
    pub message: String,
    pub details: Option<String>,
}

pub fn err(code: &str, message: &str) -> ErrorEnvelope {
    ErrorEnvelope {
        error: ErrorPayload {
            code: code.to_string(),
            message: message.to_string(),
            details: None,
        },
    }
}

/// Amount in cents. Amounts are rounded half away from zero to two places.
pub fn to_minor_units(amount: Decimal) -> anyhow::Result<i64> {
    amount
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
        .checked_mul(Decimal::ONE_HUNDRED)
        .and_then(|minor| minor.to_i64())
        .ok_or_else(|| anyhow::anyhow!("amount out of range: {amount}"))
}

/// Accepted for settlement: positive, at most cent precision, and countable in minor units.
pub fn validate_amount(amount: Decimal) -> Result<(), &'static str> {
    if amount <= Decimal::ZERO {
        return Err("Amount must be greater than zero");
    }
    if amount.normalize().scale() > 2 {
        return Err("Amount must have at most two decimal places");
    }
    if to_minor_units(amount).is_err() {
        return Err("Amount is too large");
    }
    Ok(())
}

pub fn from_minor_units(minor: i64) -> Decimal {
    Decimal::new(minor, 2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn minor_units_round_trip_two_places() {
        assert_eq!(to_minor_units(dec!(19.90)).unwrap(), 1990);
        assert_eq!(to_minor_units(dec!(0.005)).unwrap(), 1);
        assert!(to_minor_units(Decimal::MAX).is_err());
        assert_eq!(from_minor_units(10_000), dec!(100.00));
    }

    #[test]
    fn parses_processor_names() {
        assert_eq!("Default".parse::<Processor>().unwrap(), Processor::Default);
        assert_eq!(" fallback ".parse::<Processor>().unwrap(), Processor::Fallback);
        assert!("primary".parse::<Processor>().is_err());
        assert_eq!(Processor::Default.other(), Processor::Fallback);
    }

    #[test]
    fn create_request_uses_camel_case() {
        let body = r#"{"correlationId":"4a7901b8-7d26-4d9d-aa19-4dc1c7cf60b3","amount":19.90}"#;
        let req: CreatePaymentRequest = serde_json::from_str(body).unwrap();
        assert_eq!(req.amount, dec!(19.90));
    }

    #[test]
    fn amounts_must_fit_in_cents() {
        assert!(validate_amount(dec!(19.90)).is_ok());
        assert!(validate_amount(dec!(19.900)).is_ok());
        assert!(validate_amount(dec!(0.01)).is_ok());
        assert!(validate_amount(dec!(0)).is_err());
        assert!(validate_amount(dec!(-1)).is_err());
        assert!(validate_amount(dec!(0.004)).is_err());
        assert!(validate_amount(dec!(19.999)).is_err());
        assert!(validate_amount(Decimal::from_i128_with_scale(10_i128.pow(20), 0)).is_err());
    }
}
