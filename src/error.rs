//! Error types for the roster core.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RosterError {
    /// An entry or save request names a template id the catalog does not hold.
    #[error("template '{0}' is not in the catalog")]
    DanglingTemplate(String),

    #[error("invalid wall-clock time '{0}' (expected HH:MM)")]
    InvalidTime(String),

    #[error("template id '{0}' already exists")]
    DuplicateTemplate(String),

    #[error("shift on {0} falls outside the supported date range")]
    OutOfRange(chrono::NaiveDate),

    #[error("unknown shift category '{0}'")]
    UnknownCategory(String),

    #[error("invalid extra hours '{0}' (expected none, before or after)")]
    InvalidExtraHours(String),

    #[error("no date selected")]
    NoDateSelected,

    #[error("cannot {action} while {state}")]
    InvalidTransition {
        action: &'static str,
        state: &'static str,
    },

    #[error("invalid config: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, RosterError>;
