mod action;
mod agent;
mod conditions;
mod error;
mod node;
mod search;
mod state;
mod tick;
mod value;

pub use action::{Action, Roster, RosterBuilder, SimpleAction};
pub use agent::{Agent, Outcome, Run, Step};
pub use conditions::Conditions;
pub use error::{GoapError, Result};
pub use node::Node;
pub use search::{
    HeuristicStrategy, PathFinder, Plan, SearchConfig, UnmetGoalCount, ZeroHeuristic,
};
pub use state::{State, StateKey};
pub use tick::{FnTick, NoTick, Tick};
pub use value::Value;
