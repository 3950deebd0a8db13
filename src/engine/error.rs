use thiserror::Error;

/// Hard validation failures surfaced to the caller.
///
/// Transient collaborator failures are deliberately absent: a weather outage
/// is absorbed (logged, exposed through `last_error`) and a persistence
/// failure rides on the returned trigger as `saved = false`. Only inputs the
/// caller got wrong become errors.
#[derive(Debug, Error)]
pub enum ComplianceError {
    #[error("invalid location: {0}")]
    InvalidLocation(String),

    #[error("invalid timezone: {0}")]
    InvalidTimezone(String),

    #[error("invalid precipitation input: {0}")]
    InvalidInput(String),
}
