//! # Copy-on-write world state
//!
//! A [`State`] is one snapshot of the world-state variables visited by the
//! planner. It is made of a shared, already-flattened *base* and a private
//! *overlay* holding the variables written since that base was taken. Reads
//! consult the overlay first and fall back to the base.
//!
//! Deriving a successor with [`State::child`] never copies the base: the child
//! shares the parent's flattened mapping through an `Arc` and starts with an
//! empty overlay. Only the variables an action actually touches are
//! allocated.
//!
//! Freezing merges the overlay into a new flattened base, computes its digest
//! once, and makes the snapshot read-only. The frozen form is exposed as a
//! [`StateKey`], which is what the search uses for its visited and frontier
//! bookkeeping.
//!
//! ```
//! use goap_planner::{State, Value};
//!
//! let mut root = State::from_vars([("gold", Value::from(0)), ("hungry", Value::from(true))]);
//! root.freeze();
//!
//! let mut left = root.child();
//! let mut right = root.child();
//! left.increment("gold", 10).unwrap();
//! right.set("hungry", false).unwrap();
//!
//! assert_eq!(left.get("gold"), Some(&Value::Int(10)));
//! assert_eq!(right.get("gold"), Some(&Value::Int(0)));
//! assert_eq!(root.get("gold"), Some(&Value::Int(0)));
//! assert!(root.set("gold", 1).is_err());
//! ```

use std::collections::hash_map::DefaultHasher;
use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::tick::Tick;
use crate::{GoapError, Result, Value};

/// Flattened, immutable variable bindings with their precomputed digest.
#[derive(Debug)]
struct Flattened {
    vars: BTreeMap<String, Value>,
    digest: u64,
}

impl Flattened {
    fn new(vars: BTreeMap<String, Value>) -> Self {
        let digest = digest(vars.iter().map(|(k, v)| (k.as_str(), v)));
        Self { vars, digest }
    }

    fn empty() -> Self {
        Self::new(BTreeMap::new())
    }
}

/// Digest over key-sorted pairs. Frozen and unfrozen states must feed the
/// same sequence for equal bindings.
fn digest<'a>(pairs: impl Iterator<Item = (&'a str, &'a Value)>) -> u64 {
    let mut hasher = DefaultHasher::new();
    let mut len = 0usize;
    for (key, value) in pairs {
        key.hash(&mut hasher);
        value.hash(&mut hasher);
        len += 1;
    }
    hasher.write_usize(len);
    hasher.finish()
}

/// Canonical, hashable form of a frozen [`State`].
///
/// Two keys are equal iff their flattened bindings are equal, regardless of
/// the chain of children and overlays that produced them. Cloning is an
/// `Arc` bump.
#[derive(Debug, Clone)]
pub struct StateKey(Arc<Flattened>);

impl StateKey {
    /// Variable bindings in ascending key order.
    pub fn pairs(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.vars.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.vars.get(key)
    }

    pub fn len(&self) -> usize {
        self.0.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.vars.is_empty()
    }
}

impl PartialEq for StateKey {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
            || (self.0.digest == other.0.digest && self.0.vars == other.0.vars)
    }
}

impl Eq for StateKey {}

impl Hash for StateKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.0.digest);
    }
}

impl fmt::Display for StateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_pairs(f, self.pairs())
    }
}

fn write_pairs<'a>(
    f: &mut fmt::Formatter<'_>,
    pairs: impl Iterator<Item = (&'a str, &'a Value)>,
) -> fmt::Result {
    write!(f, "{{")?;
    for (i, (key, value)) in pairs.enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}: {}", key, value)?;
    }
    write!(f, "}}")
}

/// A copy-on-write snapshot of the world-state variables.
///
/// Mutators fail with [`GoapError::FrozenStateMutation`] once the snapshot has
/// been frozen; callers needing to keep changing the world take a
/// [`State::child`] instead.
///
/// Equality and hashing are defined over the flattened bindings only. The
/// turn counter is auxiliary and takes no part in either.
#[derive(Debug, Clone)]
pub struct State {
    base: Arc<Flattened>,
    overlay: BTreeMap<String, Value>,
    frozen: bool,
    turn: u64,
}

impl State {
    /// Creates an empty, unfrozen root state.
    pub fn new() -> Self {
        Self {
            base: Arc::new(Flattened::empty()),
            overlay: BTreeMap::new(),
            frozen: false,
            turn: 0,
        }
    }

    /// Creates an unfrozen root state whose base holds `vars`.
    ///
    /// ```
    /// use goap_planner::{State, Value};
    ///
    /// let state = State::from_vars([("apple_tree", Value::from(true)), ("gold", Value::from(0))]);
    /// assert_eq!(state.len(), 2);
    /// assert!(!state.is_frozen());
    /// ```
    pub fn from_vars<K, V, I>(vars: I) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
        I: IntoIterator<Item = (K, V)>,
    {
        let vars = vars
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect::<BTreeMap<_, _>>();
        Self {
            base: Arc::new(Flattened::new(vars)),
            overlay: BTreeMap::new(),
            frozen: false,
            turn: 0,
        }
    }

    /// Looks a variable up, overlay first, then base.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.overlay.get(key).or_else(|| self.base.vars.get(key))
    }

    /// Looks a variable up, returning `default` when it is absent.
    pub fn get_or(&self, key: &str, default: impl Into<Value>) -> Value {
        self.get(key).copied().unwrap_or_else(|| default.into())
    }

    /// Indexed read that treats an absent variable as an error.
    ///
    /// # Errors
    ///
    /// Returns [`GoapError::KeyNotFound`] if `key` is not bound.
    pub fn value(&self, key: &str) -> Result<&Value> {
        self.get(key)
            .ok_or_else(|| GoapError::KeyNotFound(key.to_string()))
    }

    /// Boolean view of a variable; absent or non-boolean reads as `false`.
    pub fn flag(&self, key: &str) -> bool {
        self.get(key).and_then(Value::as_bool).unwrap_or(false)
    }

    /// Numeric view of a variable; absent or boolean reads as `0.0`.
    pub fn number(&self, key: &str) -> f64 {
        self.get(key).and_then(Value::as_f64).unwrap_or(0.0)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Writes `value` into the overlay.
    ///
    /// # Errors
    ///
    /// Returns [`GoapError::FrozenStateMutation`] if the snapshot is frozen.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Result<()> {
        let key = key.into();
        self.ensure_mutable(&key)?;
        self.overlay.insert(key, value.into());
        Ok(())
    }

    /// Adds `amount` to a numeric variable, treating an absent one as 0.
    pub fn increment(&mut self, key: &str, amount: impl Into<Value>) -> Result<()> {
        self.ensure_mutable(key)?;
        let current = self.get_or(key, 0);
        let amount = amount.into();
        let next = current
            .checked_add(amount)
            .ok_or_else(|| arithmetic_error(key, current, amount))?;
        self.overlay.insert(key.to_string(), next);
        Ok(())
    }

    /// Subtracts `amount` from a numeric variable, treating an absent one as 0.
    pub fn decrement(&mut self, key: &str, amount: impl Into<Value>) -> Result<()> {
        self.ensure_mutable(key)?;
        let current = self.get_or(key, 0);
        let amount = amount.into();
        let next = current
            .checked_sub(amount)
            .ok_or_else(|| arithmetic_error(key, current, amount))?;
        self.overlay.insert(key.to_string(), next);
        Ok(())
    }

    /// Subtracts `amount` but never goes below zero. A variable that is
    /// absent or already at (or below) zero is left untouched.
    ///
    /// ```
    /// use goap_planner::{State, Value};
    ///
    /// let mut state = State::from_vars([("whipped_cream", 1)]);
    /// state.decrement_floored_at_zero("whipped_cream", 3).unwrap();
    /// assert_eq!(state.get("whipped_cream"), Some(&Value::Int(0)));
    ///
    /// state.decrement_floored_at_zero("missing", 1).unwrap();
    /// assert!(!state.contains_key("missing"));
    /// ```
    pub fn decrement_floored_at_zero(&mut self, key: &str, amount: impl Into<Value>) -> Result<()> {
        self.ensure_mutable(key)?;
        let current = self.get_or(key, 0);
        let amount = amount.into();
        let positive = current
            .as_f64()
            .ok_or_else(|| arithmetic_error(key, current, amount))?
            > 0.0;
        if !positive {
            return Ok(());
        }
        let next = current
            .checked_sub(amount)
            .ok_or_else(|| arithmetic_error(key, current, amount))?;
        let next = match next.as_f64() {
            Some(n) if n < 0.0 => Value::Int(0),
            _ => next,
        };
        self.overlay.insert(key.to_string(), next);
        Ok(())
    }

    /// Flattens overlay and base into a single mapping, caches its digest and
    /// makes the snapshot read-only. Idempotent.
    ///
    /// ```
    /// use goap_planner::State;
    ///
    /// let mut state = State::new();
    /// state.set("hasKey", false).unwrap();
    /// let first = state.freeze();
    /// let second = state.freeze();
    /// assert_eq!(first, second);
    /// assert!(state.set("hasKey", true).is_err());
    /// ```
    pub fn freeze(&mut self) -> StateKey {
        if !self.frozen {
            if !self.overlay.is_empty() {
                let mut vars = self.base.vars.clone();
                vars.append(&mut self.overlay);
                self.base = Arc::new(Flattened::new(vars));
            }
            self.frozen = true;
        }
        StateKey(Arc::clone(&self.base))
    }

    /// The cached canonical form, or `None` if the snapshot is not frozen yet.
    /// Never freezes as a side effect.
    pub fn canonical_form(&self) -> Option<StateKey> {
        self.frozen.then(|| StateKey(Arc::clone(&self.base)))
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    /// Derives an unfrozen successor with an empty overlay, carrying the turn
    /// counter forward.
    ///
    /// On a frozen snapshot this is O(1): the child shares the flattened
    /// mapping. On an unfrozen one the current bindings are flattened into a
    /// fresh base for the child (O(k) in the variable count) and `self` stays
    /// mutable; freezing is always an explicit call.
    pub fn child(&self) -> State {
        let base = if self.frozen || self.overlay.is_empty() {
            Arc::clone(&self.base)
        } else {
            let mut vars = self.base.vars.clone();
            vars.extend(self.overlay.iter().map(|(k, v)| (k.clone(), *v)));
            Arc::new(Flattened::new(vars))
        };
        State {
            base,
            overlay: BTreeMap::new(),
            frozen: false,
            turn: self.turn,
        }
    }

    /// Number of turns this state has been advanced through [`State::real_tick`].
    pub fn turn(&self) -> u64 {
        self.turn
    }

    /// Runs the passive-evolution hook, as the search does after every
    /// hypothetical action.
    pub fn simulation_tick(&mut self, tick: &dyn Tick) -> Result<()> {
        tick.automatic(self)
    }

    /// Advances the turn counter, then runs the passive and the
    /// execution-only hooks. Used when an action is actually carried out.
    pub fn real_tick(&mut self, tick: &dyn Tick) -> Result<()> {
        self.ensure_mutable("turn")?;
        self.turn += 1;
        tick.automatic(self)?;
        tick.execution(self)
    }

    /// Variable bindings. Ascending key order once frozen; unspecified before.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        let overlay = &self.overlay;
        overlay.iter().map(|(k, v)| (k.as_str(), v)).chain(
            self.base
                .vars
                .iter()
                .filter(move |(k, _)| !overlay.contains_key(k.as_str()))
                .map(|(k, v)| (k.as_str(), v)),
        )
    }

    pub fn len(&self) -> usize {
        self.base.vars.len()
            + self
                .overlay
                .keys()
                .filter(|k| !self.base.vars.contains_key(k.as_str()))
                .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Variables written since the base was taken (always empty once frozen).
    pub fn changes(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.overlay.iter().map(|(k, v)| (k.as_str(), v))
    }

    fn sorted(&self) -> BTreeMap<&str, &Value> {
        self.iter().collect()
    }

    fn digest(&self) -> u64 {
        if self.frozen || self.overlay.is_empty() {
            self.base.digest
        } else {
            digest(self.sorted().into_iter())
        }
    }

    fn ensure_mutable(&self, key: &str) -> Result<()> {
        if self.frozen {
            return Err(GoapError::FrozenStateMutation {
                key: key.to_string(),
            });
        }
        Ok(())
    }
}

fn arithmetic_error(key: &str, current: Value, amount: Value) -> GoapError {
    let key = key.to_string();
    match (current.is_numeric(), amount.is_numeric()) {
        (true, true) => GoapError::Overflow { key },
        (false, _) => GoapError::NonNumeric { key, value: current },
        (true, false) => GoapError::NonNumeric { key, value: amount },
    }
}

impl Default for State {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for State {
    fn eq(&self, other: &Self) -> bool {
        if let (Some(a), Some(b)) = (self.canonical_form(), other.canonical_form()) {
            return a == b;
        }
        self.len() == other.len() && self.iter().all(|(k, v)| other.get(k) == Some(v))
    }
}

impl Eq for State {}

impl Hash for State {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.digest());
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_pairs(f, self.sorted().into_iter())
    }
}
