//! # Actions for Goal-Oriented Action Planning (GOAP)
//!
//! An action is a state transition rule: it checks whether it can operate on
//! a [`State`], and if so produces a successor state without touching its
//! input. Every action kind shares the [`Action`] contract:
//!
//! * [`Action::is_applicable`]: precondition check, by default an exact match
//!   of the declared [`Action::preconditions`]
//! * [`Action::apply`]: derive a child state, write the declared
//!   [`Action::effects`], then run [`Action::update_state`] for any extra logic
//! * [`Action::cost`]: non-negative step cost
//!
//! Declarative actions are built with [`SimpleAction`]. Actions that need
//! numeric thresholds or derived updates implement the trait directly:
//!
//! ```
//! use goap_planner::{Action, Result, State, Value};
//!
//! #[derive(Debug)]
//! struct SellApple;
//!
//! impl Action for SellApple {
//!     fn name(&self) -> &str {
//!         "sell apples"
//!     }
//!
//!     fn is_applicable(&self, state: &State) -> bool {
//!         state.number("apples") > 0.0
//!     }
//!
//!     fn update_state(&self, state: &mut State) -> Result<()> {
//!         state.decrement("apples", 1)?;
//!         state.increment("gold", 1)
//!     }
//! }
//!
//! let state = State::from_vars([("apples", 2)]);
//! let next = SellApple.apply(&state).unwrap().expect("applicable");
//! assert_eq!(next.get("apples"), Some(&Value::Int(1)));
//! assert_eq!(next.get("gold"), Some(&Value::Int(1)));
//! assert_eq!(state.get("apples"), Some(&Value::Int(2)));
//!
//! let empty = State::from_vars([("apples", 0)]);
//! assert!(SellApple.apply(&empty).unwrap().is_none());
//! ```

use std::collections::HashSet;
use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

use crate::{Conditions, GoapError, Result, State};

static NO_CONDITIONS: Conditions = Conditions::new();

/// The capability set shared by every action kind.
///
/// Actions are stateless: one instance is shared by every node of a search
/// and is handed the state to operate on for each attempt.
pub trait Action: fmt::Debug + Send + Sync {
    /// Name used for reporting and for roster uniqueness.
    fn name(&self) -> &str;

    /// Step cost. Must be finite and non-negative.
    fn cost(&self) -> f64 {
        1.0
    }

    /// Declared exact-match requirements checked by the default
    /// [`Action::is_applicable`].
    fn preconditions(&self) -> &Conditions {
        &NO_CONDITIONS
    }

    /// Declared unconditional assignments written by [`Action::apply`].
    fn effects(&self) -> &Conditions {
        &NO_CONDITIONS
    }

    fn is_applicable(&self, state: &State) -> bool {
        self.preconditions().is_satisfied_by(state)
    }

    /// Extra mutation applied to the child state after the declared effects.
    fn update_state(&self, _state: &mut State) -> Result<()> {
        Ok(())
    }

    /// Produces the successor of `state`, or `Ok(None)` when the action is
    /// inapplicable. The returned child is unfrozen so callers can still tick
    /// it; `state` itself is never modified.
    ///
    /// # Errors
    ///
    /// Only state-container errors raised by the effect logic.
    fn apply(&self, state: &State) -> Result<Option<State>> {
        if !self.is_applicable(state) {
            return Ok(None);
        }
        let mut next = state.child();
        self.effects().apply_to(&mut next)?;
        self.update_state(&mut next)?;
        Ok(Some(next))
    }
}

/// An action defined entirely by flat preconditions and effects.
///
/// # Examples
///
/// ```
/// use goap_planner::{Action, SimpleAction, State, Value};
///
/// let use_key = SimpleAction::new("use_key", 1.0)
///     .precondition("hasKey", true)
///     .effect("hasKey", false);
///
/// assert!(!use_key.is_applicable(&State::from_vars([("hasKey", false)])));
///
/// let next = use_key
///     .apply(&State::from_vars([("hasKey", true)]))
///     .unwrap()
///     .unwrap();
/// assert_eq!(next.get("hasKey"), Some(&Value::Bool(false)));
/// ```
#[derive(Debug, Clone)]
pub struct SimpleAction {
    /// The name of the action
    pub name: String,
    /// The cost of performing this action
    pub cost: f64,
    /// The preconditions that must be met to perform this action
    pub preconditions: Conditions,
    /// The effects this action has on the world state
    pub effects: Conditions,
}

impl SimpleAction {
    /// Creates an action with no preconditions and no effects. The cost is
    /// validated when the action joins a [`Roster`].
    pub fn new(name: impl Into<String>, cost: f64) -> Self {
        Self {
            name: name.into(),
            cost,
            preconditions: Conditions::new(),
            effects: Conditions::new(),
        }
    }

    pub fn precondition(mut self, key: impl Into<String>, value: impl Into<crate::Value>) -> Self {
        self.preconditions.set(key, value);
        self
    }

    pub fn effect(mut self, key: impl Into<String>, value: impl Into<crate::Value>) -> Self {
        self.effects.set(key, value);
        self
    }
}

impl Action for SimpleAction {
    fn name(&self) -> &str {
        &self.name
    }

    fn cost(&self) -> f64 {
        self.cost
    }

    fn preconditions(&self) -> &Conditions {
        &self.preconditions
    }

    fn effects(&self) -> &Conditions {
        &self.effects
    }
}

/// The fixed, ordered set of action kinds usable during a search.
///
/// A roster is immutable once built and cheap to clone; every search node
/// shares the same one.
///
/// # Examples
///
/// ```
/// use goap_planner::{GoapError, Roster, SimpleAction};
///
/// let roster = Roster::builder()
///     .with(SimpleAction::new("earn_gold", 1.0))
///     .with(SimpleAction::new("rest", 0.0))
///     .build()
///     .unwrap();
/// assert_eq!(roster.len(), 2);
///
/// let duplicate = Roster::builder()
///     .with(SimpleAction::new("rest", 1.0))
///     .with(SimpleAction::new("rest", 2.0))
///     .build();
/// assert!(matches!(duplicate, Err(GoapError::ActionAlreadyInCollection(_))));
/// ```
#[derive(Debug, Clone)]
pub struct Roster {
    actions: Arc<[Arc<dyn Action>]>,
}

impl Roster {
    /// Validates and wraps `actions`.
    ///
    /// # Errors
    ///
    /// * [`GoapError::InvalidActionCost`] if a cost is negative, NaN or infinite
    /// * [`GoapError::ActionAlreadyInCollection`] if two actions share a name
    pub fn new(actions: Vec<Arc<dyn Action>>) -> Result<Self> {
        let mut names = HashSet::new();
        for action in &actions {
            let cost = action.cost();
            if !cost.is_finite() || cost < 0.0 {
                return Err(GoapError::InvalidActionCost {
                    action: action.name().to_string(),
                    cost,
                });
            }
            if !names.insert(action.name()) {
                return Err(GoapError::ActionAlreadyInCollection(
                    action.name().to_string(),
                ));
            }
        }
        log::debug!("Roster assembled with {} action kinds", actions.len());
        Ok(Self {
            actions: actions.into(),
        })
    }

    pub fn builder() -> RosterBuilder {
        RosterBuilder::default()
    }

    /// Looks an action kind up by name.
    pub fn find(&self, name: &str) -> Option<&Arc<dyn Action>> {
        self.actions.iter().find(|a| a.name() == name)
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

impl Deref for Roster {
    type Target = [Arc<dyn Action>];

    fn deref(&self) -> &Self::Target {
        &self.actions
    }
}

/// Collects action kinds before validating them into a [`Roster`].
#[derive(Debug, Default)]
pub struct RosterBuilder {
    actions: Vec<Arc<dyn Action>>,
}

impl RosterBuilder {
    pub fn with(mut self, action: impl Action + 'static) -> Self {
        self.actions.push(Arc::new(action));
        self
    }

    pub fn with_shared(mut self, action: Arc<dyn Action>) -> Self {
        self.actions.push(action);
        self
    }

    pub fn build(self) -> Result<Roster> {
        Roster::new(self.actions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Value;

    #[derive(Debug)]
    struct BuyPie;

    impl Action for BuyPie {
        fn name(&self) -> &str {
            "buy a pie"
        }

        fn is_applicable(&self, state: &State) -> bool {
            state.number("gold") > 8.0
        }

        fn update_state(&self, state: &mut State) -> Result<()> {
            state.decrement("gold", 8)?;
            state.set("apple_pie", true)
        }
    }

    #[test]
    fn test_create_simple_action() {
        let action = SimpleAction::new("test_action", 1.0);
        assert_eq!(action.name(), "test_action");
        assert_eq!(Action::cost(&action), 1.0);
        assert!(Action::preconditions(&action).is_empty());
        assert!(Action::effects(&action).is_empty());
    }

    #[test]
    fn test_applicable_with_empty_preconditions() {
        let action = SimpleAction::new("test_action", 1.0);
        assert!(action.is_applicable(&State::new()));
    }

    #[test]
    fn test_applicable_with_matching_preconditions() {
        let action = SimpleAction::new("test_action", 1.0).precondition("has_tool", true);
        assert!(action.is_applicable(&State::from_vars([("has_tool", true)])));
        assert!(!action.is_applicable(&State::from_vars([("has_tool", false)])));
        assert!(!action.is_applicable(&State::new()));
    }

    #[test]
    fn test_apply_returns_child_and_keeps_parent() {
        let action = SimpleAction::new("pick_up_key", 1.0).effect("hasKey", true);
        let mut parent = State::from_vars([("hasKey", false)]);
        parent.freeze();

        let child = action.apply(&parent).unwrap().unwrap();
        assert!(!child.is_frozen());
        assert_eq!(child.get("hasKey"), Some(&Value::Bool(true)));
        assert_eq!(parent.get("hasKey"), Some(&Value::Bool(false)));
    }

    #[test]
    fn test_apply_inapplicable_is_none() {
        let action = SimpleAction::new("use_key", 1.0).precondition("hasKey", true);
        let state = State::from_vars([("hasKey", false)]);
        assert!(action.apply(&state).unwrap().is_none());
    }

    #[test]
    fn test_custom_action_logic() {
        let rich = State::from_vars([("gold", 9)]);
        let poor = State::from_vars([("gold", 8)]);
        assert!(BuyPie.apply(&poor).unwrap().is_none());

        let next = BuyPie.apply(&rich).unwrap().unwrap();
        assert_eq!(next.get("gold"), Some(&Value::Int(1)));
        assert_eq!(next.get("apple_pie"), Some(&Value::Bool(true)));
        assert_eq!(BuyPie.cost(), 1.0);
    }

    #[test]
    fn test_effects_apply_before_update_state() {
        #[derive(Debug)]
        struct Doubler {
            effects: Conditions,
        }

        impl Action for Doubler {
            fn name(&self) -> &str {
                "doubler"
            }

            fn effects(&self) -> &Conditions {
                &self.effects
            }

            fn update_state(&self, state: &mut State) -> Result<()> {
                state.increment("n", 1)
            }
        }

        let action = Doubler {
            effects: Conditions::new().with("n", 10),
        };
        let next = action.apply(&State::new()).unwrap().unwrap();
        assert_eq!(next.get("n"), Some(&Value::Int(11)));
    }

    #[test]
    fn test_roster_rejects_negative_cost() {
        let result = Roster::builder()
            .with(SimpleAction::new("invalid_action", -1.0))
            .build();
        assert!(matches!(
            result,
            Err(GoapError::InvalidActionCost { .. })
        ));

        let result = Roster::builder()
            .with(SimpleAction::new("invalid_action", f64::NAN))
            .build();
        assert!(matches!(
            result,
            Err(GoapError::InvalidActionCost { .. })
        ));
    }

    #[test]
    fn test_roster_accepts_zero_cost() {
        let roster = Roster::builder()
            .with(SimpleAction::new("free", 0.0))
            .build()
            .unwrap();
        assert_eq!(roster.len(), 1);
    }

    #[test]
    fn test_roster_rejects_duplicates() {
        let result = Roster::builder()
            .with(SimpleAction::new("a", 1.0))
            .with(BuyPie)
            .with(SimpleAction::new("a", 2.0))
            .build();
        assert_eq!(
            result.unwrap_err(),
            GoapError::ActionAlreadyInCollection("a".to_string())
        );
    }

    #[test]
    fn test_roster_preserves_order_and_lookup() {
        let roster = Roster::builder()
            .with(SimpleAction::new("first", 1.0))
            .with(BuyPie)
            .build()
            .unwrap();
        let names: Vec<_> = roster.iter().map(|a| a.name()).collect();
        assert_eq!(names, ["first", "buy a pie"]);
        assert!(roster.find("buy a pie").is_some());
        assert!(roster.find("nope").is_none());

        let shared = roster.clone();
        assert!(Arc::ptr_eq(&roster[0], &shared[0]));
    }

    #[test]
    fn test_shared_action_across_rosters() {
        let buy_pie: Arc<dyn Action> = Arc::new(BuyPie);
        let town = Roster::builder()
            .with_shared(Arc::clone(&buy_pie))
            .with(SimpleAction::new("walk", 1.0))
            .build()
            .unwrap();
        let farm = Roster::builder().with_shared(Arc::clone(&buy_pie)).build().unwrap();
        assert!(Arc::ptr_eq(&town[0], &farm[0]));
        assert_eq!(Arc::strong_count(&buy_pie), 3);
    }
}
