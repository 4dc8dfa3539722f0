//! Vertices of the implicit action graph explored by the search.

use std::fmt;
use std::sync::Arc;

use crate::tick::Tick;
use crate::{Action, Conditions, Result, Roster, State, StateKey};

/// A frozen state plus the action that produced it and the roster of action
/// kinds usable from here.
///
/// Identity for search bookkeeping is [`Node::canonical_key`], so nodes
/// reached by different paths that end in equal states collapse into one.
#[derive(Debug, Clone)]
pub struct Node {
    state: State,
    key: StateKey,
    roster: Roster,
    action: Option<Arc<dyn Action>>,
}

impl Node {
    /// Creates a root node. The state is frozen here if it is not already.
    pub fn new(state: State, roster: Roster) -> Self {
        Self::with_provenance(state, roster, None)
    }

    fn with_provenance(mut state: State, roster: Roster, action: Option<Arc<dyn Action>>) -> Self {
        let key = state.freeze();
        Self {
            state,
            key,
            roster,
            action,
        }
    }

    pub fn state(&self) -> &State {
        &self.state
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    /// The action that produced this node; `None` for a root.
    pub fn action(&self) -> Option<&Arc<dyn Action>> {
        self.action.as_ref()
    }

    pub fn canonical_key(&self) -> &StateKey {
        &self.key
    }

    /// Cost of the step that led here; zero for a root.
    pub fn cost(&self) -> f64 {
        self.action.as_ref().map_or(0.0, |a| a.cost())
    }

    /// Name of the producing action, or `"start"` for a root.
    pub fn describe(&self) -> &str {
        self.action.as_ref().map_or("start", |a| a.name())
    }

    pub fn is_goal(&self, goal: &Conditions) -> bool {
        goal.is_satisfied_by(&self.state)
    }

    /// Number of goal variables whose current value differs from the required
    /// one.
    ///
    /// This is a relaxation that only stays admissible when each unmet
    /// variable can be fixed by one unit-cost step with no interactions. With
    /// other costs or multi-step corrections it may overestimate, and plans
    /// found with it are not guaranteed to be optimal.
    pub fn heuristic_distance(&self, goal: &Conditions) -> usize {
        goal.unmet_count(&self.state)
    }

    /// Tries every roster action against this node's state, ticks each
    /// successful result and wraps it in a new node. Inapplicable actions are
    /// skipped.
    ///
    /// # Errors
    ///
    /// Propagates state-container errors raised by action or tick logic.
    pub fn expand(&self, tick: &dyn Tick) -> Result<Vec<Node>> {
        let mut neighbors = Vec::with_capacity(self.roster.len());
        for action in self.roster.iter() {
            let Some(mut next) = action.apply(&self.state)? else {
                continue;
            };
            next.simulation_tick(tick)?;
            neighbors.push(Node::with_provenance(
                next,
                self.roster.clone(),
                Some(Arc::clone(action)),
            ));
        }
        Ok(neighbors)
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.describe(), self.key)
    }
}
