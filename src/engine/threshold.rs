use rust_decimal::Decimal;

use super::error::ComplianceError;

/// The EPA CGP rain-event threshold: 0.25 inches in 24 hours.
pub fn default_threshold() -> Decimal {
    Decimal::new(25, 2)
}

/// Decide whether an aggregated precipitation amount meets the threshold.
///
/// Comparison is exact decimal semantics: 0.25 triggers, 0.249999 does not.
/// Both values are [`Decimal`] throughout the engine, so sums like
/// `0.1 + 0.15` equal exactly 0.25 rather than a binary-float neighbor of
/// it. Negative amounts are a data-quality failure and are rejected rather
/// than treated as "no rain".
pub fn evaluate(amount: Decimal, threshold: Decimal) -> Result<bool, ComplianceError> {
    if amount < Decimal::ZERO {
        return Err(ComplianceError::InvalidInput(format!(
            "precipitation amount {} is negative",
            amount
        )));
    }
    if threshold < Decimal::ZERO {
        return Err(ComplianceError::InvalidInput(format!(
            "threshold {} is negative",
            threshold
        )));
    }
    Ok(amount >= threshold)
}
