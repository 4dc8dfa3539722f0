//! Passive state evolution hooks.
//!
//! A domain may let the world change on its own between actions: cream goes
//! off, saplings grow. The search calls [`Tick::automatic`] on every
//! hypothetical successor before it is frozen, so planning accounts for that
//! drift. [`Tick::execution`] only runs when an action is actually carried
//! out (see [`State::real_tick`](crate::State::real_tick)).

use crate::{Result, State};

/// Per-state evolution hook invoked after every successful action.
///
/// Implementations must be deterministic in `automatic`: the search relies on
/// equal inputs producing equal successors.
pub trait Tick {
    /// Evolution applied both during planning and during execution.
    fn automatic(&self, _state: &mut State) -> Result<()> {
        Ok(())
    }

    /// Evolution applied only when an action is really executed.
    fn execution(&self, _state: &mut State) -> Result<()> {
        Ok(())
    }
}

/// A world that never changes on its own.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoTick;

impl Tick for NoTick {}

/// Adapts a closure into an automatic [`Tick`].
///
/// # Examples
///
/// ```
/// use goap_planner::{FnTick, State, Value};
///
/// let decay = FnTick(|state: &mut State| state.decrement_floored_at_zero("whipped_cream", 1));
///
/// let mut state = State::from_vars([("whipped_cream", 2)]);
/// state.simulation_tick(&decay).unwrap();
/// assert_eq!(state.get("whipped_cream"), Some(&Value::Int(1)));
/// ```
pub struct FnTick<F>(pub F);

impl<F> Tick for FnTick<F>
where
    F: Fn(&mut State) -> Result<()>,
{
    fn automatic(&self, state: &mut State) -> Result<()> {
        (self.0)(state)
    }
}
