//! Heuristic cyber-risk scoring
//!
//! Scores are fixed per event type, except transfers, which are banded on
//! the transferred amount. No model is consulted.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Transfers above this amount are flagged high risk
pub const HIGH_AMOUNT_THRESHOLD: Decimal = Decimal::from_parts(50_000, 0, 0, false, 0);

/// Transfers above this amount are medium risk and count as "large"
pub const MEDIUM_AMOUNT_THRESHOLD: Decimal = Decimal::from_parts(10_000, 0, 0, false, 0);

/// Deposits above this amount count as "large"
pub const LARGE_DEPOSIT_THRESHOLD: Decimal = HIGH_AMOUNT_THRESHOLD;

/// Alerts are raised for scores strictly above this value
pub const ALERT_THRESHOLD: u8 = 75;

/// A risk score in the range 0..=100
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RiskScore(u8);

impl RiskScore {
    pub const MAX: RiskScore = RiskScore(100);

    /// Default score for routine activity
    pub const LOW: RiskScore = RiskScore(10);
    pub const MEDIUM_TRANSFER: RiskScore = RiskScore(40);
    pub const HIGH_TRANSFER: RiskScore = RiskScore(75);

    pub const FAILED_LOGIN: RiskScore = RiskScore(50);
    pub const PASSWORD_CHANGED: RiskScore = RiskScore(10);
    pub const BENEFICIARY_ADDED: RiskScore = RiskScore(20);
    pub const DEPOSIT: RiskScore = RiskScore(10);
    pub const TRANSFER_RECEIVED: RiskScore = RiskScore(10);

    /// Create a score, clamping to 100
    pub fn new(value: u8) -> Self {
        Self(value.min(100))
    }

    pub fn value(&self) -> u8 {
        self.0
    }

    /// Parse a score cell; decimals are rounded and out-of-range values clamped
    pub fn parse(s: &str) -> Option<Self> {
        let value = s.trim().parse::<f64>().ok()?;
        if !value.is_finite() {
            return None;
        }
        Some(Self(value.round().clamp(0.0, 100.0) as u8))
    }

    /// True when the score should surface as an alert
    pub fn is_alert(&self) -> bool {
        self.0 > ALERT_THRESHOLD
    }

    pub fn band(&self) -> RiskBand {
        match self.0 {
            s if s >= Self::HIGH_TRANSFER.0 => RiskBand::High,
            s if s >= Self::MEDIUM_TRANSFER.0 => RiskBand::Medium,
            _ => RiskBand::Low,
        }
    }
}

impl std::fmt::Display for RiskScore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Coarse bucket that picks the log level for a scored transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiskBand {
    Low,
    Medium,
    High,
}

/// Score an outgoing transfer from its amount alone
pub fn transfer_risk(amount: Decimal) -> RiskScore {
    if amount > HIGH_AMOUNT_THRESHOLD {
        RiskScore::HIGH_TRANSFER
    } else if amount > MEDIUM_AMOUNT_THRESHOLD {
        RiskScore::MEDIUM_TRANSFER
    } else {
        RiskScore::LOW
    }
}

pub fn is_large_transfer(amount: Decimal) -> bool {
    amount > MEDIUM_AMOUNT_THRESHOLD
}

pub fn is_large_deposit(amount: Decimal) -> bool {
    amount > LARGE_DEPOSIT_THRESHOLD
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transfer_risk_bands() {
        assert_eq!(transfer_risk(Decimal::new(500, 0)), RiskScore::LOW);
        assert_eq!(transfer_risk(Decimal::new(10_000, 0)), RiskScore::LOW);
        assert_eq!(transfer_risk(Decimal::new(1_000_001, 2)), RiskScore::MEDIUM_TRANSFER);
        assert_eq!(transfer_risk(Decimal::new(50_000, 0)), RiskScore::MEDIUM_TRANSFER);
        assert_eq!(transfer_risk(Decimal::new(50_001, 0)), RiskScore::HIGH_TRANSFER);
    }

    #[test]
    fn test_high_transfer_is_not_an_alert() {
        // Alerts need a score above 75; the amount bands top out at 75.
        assert!(!RiskScore::HIGH_TRANSFER.is_alert());
        assert!(RiskScore::new(76).is_alert());
        assert_eq!(RiskScore::HIGH_TRANSFER.band(), RiskBand::High);
    }

    #[test]
    fn test_parse_clamps() {
        assert_eq!(RiskScore::parse("42"), Some(RiskScore::new(42)));
        assert_eq!(RiskScore::parse("88.6"), Some(RiskScore::new(89)));
        assert_eq!(RiskScore::parse("250"), Some(RiskScore::MAX));
        assert_eq!(RiskScore::parse("-3"), Some(RiskScore::new(0)));
        assert_eq!(RiskScore::parse(""), None);
        assert_eq!(RiskScore::new(200), RiskScore::MAX);
    }

    #[test]
    fn test_large_flags() {
        assert!(is_large_transfer(Decimal::new(10_001, 0)));
        assert!(!is_large_deposit(Decimal::new(10_001, 0)));
        assert!(is_large_deposit(Decimal::new(50_001, 0)));
    }
}
