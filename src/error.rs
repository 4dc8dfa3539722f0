use thiserror::Error;

use crate::Value;

/// Errors raised by the planner and its world-state container.
///
/// State-container errors ([`GoapError::FrozenStateMutation`],
/// [`GoapError::KeyNotFound`], [`GoapError::NonNumeric`],
/// [`GoapError::Overflow`]) indicate a bug in the calling domain code and are
/// propagated as-is. [`GoapError::NoPathFound`] is an ordinary planning
/// outcome that callers are expected to branch on.
///
/// # Examples
///
/// ```
/// use goap_planner::GoapError;
///
/// let err = GoapError::NoPathFound;
/// assert!(err.is_no_path());
/// assert_eq!(err.to_string(), "No path found to a state satisfying the goal");
/// ```
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GoapError {
    /// A write was attempted on a snapshot that has already been frozen
    #[error("Cannot mutate frozen state (key: {key})")]
    FrozenStateMutation { key: String },

    /// Indexed read of a variable that is not bound in the state
    #[error("Key not found in state: {0}")]
    KeyNotFound(String),

    /// An arithmetic mutator was applied to a non-numeric value
    #[error("Value of {key} is not numeric: {value}")]
    NonNumeric { key: String, value: Value },

    /// Integer arithmetic on a variable left the `i64` range
    #[error("Arithmetic overflow on {key}")]
    Overflow { key: String },

    /// An action was executed against a state that fails its preconditions
    #[error("Action precondition not met: {0}")]
    Inapplicable(String),

    /// The search frontier was exhausted without reaching the goal
    #[error("No path found to a state satisfying the goal")]
    NoPathFound,

    /// An action declared a negative or non-finite cost
    #[error("Action cost must be finite and non-negative ({action}: {cost})")]
    InvalidActionCost { action: String, cost: f64 },

    /// Two actions in one roster share a name
    #[error("Action already in collection: {0}")]
    ActionAlreadyInCollection(String),
}

impl GoapError {
    /// True when the error is the expected "goal unreachable" outcome rather
    /// than a programming error.
    pub fn is_no_path(&self) -> bool {
        matches!(self, GoapError::NoPathFound)
    }
}

pub type Result<T> = std::result::Result<T, GoapError>;
