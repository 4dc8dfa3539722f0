//! Partial assignments over world-state variables: goals, declared
//! preconditions and declared effects.

use std::collections::BTreeMap;
use std::fmt;

use crate::{Result, State, Value};

/// A partial assignment of variables to required (or assigned) values.
///
/// Variables not mentioned are unconstrained: a state with extra variables
/// still satisfies a set of conditions if every named variable matches.
///
/// # Examples
///
/// ```
/// use goap_planner::{Conditions, State};
///
/// let goal = Conditions::new().with("hungry", false);
///
/// let mut state = State::from_vars([("hungry", true), ("gold", false)]);
/// assert!(!goal.is_satisfied_by(&state));
/// assert_eq!(goal.unmet_count(&state), 1);
///
/// state.set("hungry", false).unwrap();
/// assert!(goal.is_satisfied_by(&state));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Conditions {
    entries: BTreeMap<String, Value>,
}

impl Conditions {
    pub const fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Adds or replaces one requirement.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.entries.insert(key.into(), value.into());
    }

    /// Builder form of [`Conditions::set`].
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// True iff every named variable has exactly the required value in `state`.
    pub fn is_satisfied_by(&self, state: &State) -> bool {
        self.iter().all(|(key, value)| state.get(key) == Some(value))
    }

    /// Number of named variables whose value in `state` differs from the
    /// required one. Absent variables count as unmet.
    pub fn unmet_count(&self, state: &State) -> usize {
        self.iter()
            .filter(|(key, value)| state.get(key) != Some(*value))
            .count()
    }

    /// Writes every entry into `state` as an unconditional assignment.
    pub fn apply_to(&self, state: &mut State) -> Result<()> {
        for (key, value) in self.iter() {
            state.set(key, *value)?;
        }
        Ok(())
    }
}

impl<K, V> FromIterator<(K, V)> for Conditions
where
    K: Into<String>,
    V: Into<Value>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl fmt::Display for Conditions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts = self
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>();
        write!(f, "{}", parts.join(", "))
    }
}
