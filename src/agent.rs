//! Replanning loop: plan from scratch, carry out the first step, repeat.
//!
//! The planner never repairs a plan. Each [`Agent::step`] searches again from
//! the agent's current state, performs the first planned action for real
//! (running [`State::real_tick`] afterwards), and reports what happened.

use std::sync::Arc;

use crate::search::{Plan, SearchConfig};
use crate::tick::{NoTick, Tick};
use crate::{Conditions, GoapError, Node, PathFinder, Result, Roster, State};

/// What one [`Agent::step`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// The current state already satisfies the goal.
    GoalReached,
    /// The named action was carried out; `turn` is the state's new turn.
    Acted { action: String, turn: u64 },
    /// No plan leads from the current state to the goal.
    Stalled,
}

/// How an [`Agent::run`] ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    GoalReached,
    Stalled,
    StepLimit,
}

/// The actions carried out by [`Agent::run`] and why it stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Run {
    pub actions: Vec<String>,
    pub outcome: Outcome,
}

/// Drives a world state toward a goal one planned action at a time.
///
/// # Examples
///
/// ```
/// use goap_planner::{Agent, Conditions, Outcome, Roster, SimpleAction, State};
///
/// let roster = Roster::builder()
///     .with(SimpleAction::new("pick_up_key", 1.0).effect("hasKey", true))
///     .with(
///         SimpleAction::new("open_door", 1.0)
///             .precondition("hasKey", true)
///             .effect("door_open", true),
///     )
///     .build()
///     .unwrap();
///
/// let start = State::from_vars([("hasKey", false), ("door_open", false)]);
/// let mut agent = Agent::new(start, roster, Conditions::new().with("door_open", true));
///
/// let run = agent.run(10).unwrap();
/// assert_eq!(run.outcome, Outcome::GoalReached);
/// assert_eq!(run.actions, ["pick_up_key", "open_door"]);
/// assert_eq!(agent.state().turn(), 2);
/// ```
pub struct Agent {
    state: State,
    roster: Roster,
    goal: Conditions,
    tick: Arc<dyn Tick>,
    config: SearchConfig,
}

impl Agent {
    pub fn new(mut state: State, roster: Roster, goal: Conditions) -> Self {
        state.freeze();
        Self {
            state,
            roster,
            goal,
            tick: Arc::new(NoTick),
            config: SearchConfig::default(),
        }
    }

    pub fn with_tick(mut self, tick: Arc<dyn Tick>) -> Self {
        self.tick = tick;
        self
    }

    pub fn with_config(mut self, config: SearchConfig) -> Self {
        self.config = config;
        self
    }

    pub fn state(&self) -> &State {
        &self.state
    }

    pub fn goal(&self) -> &Conditions {
        &self.goal
    }

    /// Plans from the current state without acting.
    pub fn plan(&self) -> Result<Plan> {
        let start = Node::new(self.state.clone(), self.roster.clone());
        let mut finder = PathFinder::new(start, self.goal.clone())
            .with_tick(Arc::clone(&self.tick))
            .with_config(self.config.clone());
        finder.find_path().cloned()
    }

    /// Replans and performs the first step of the new plan.
    ///
    /// # Errors
    ///
    /// * [`GoapError::Inapplicable`] if the planned action no longer applies
    ///   to the real state (only possible with a nondeterministic tick)
    /// * state-container errors from action or tick logic
    pub fn step(&mut self) -> Result<Step> {
        let plan = match self.plan() {
            Ok(plan) => plan,
            Err(GoapError::NoPathFound) => {
                log::warn!("No plan improves the current state {}", self.state);
                return Ok(Step::Stalled);
            }
            Err(e) => return Err(e),
        };

        let Some(action) = plan.steps().first().and_then(|node| node.action()) else {
            log::info!("Goal is satisfied at turn {}", self.state.turn());
            return Ok(Step::GoalReached);
        };
        log::info!("Current plan: {}", plan);

        let name = action.name().to_string();
        let mut next = action
            .apply(&self.state)?
            .ok_or_else(|| GoapError::Inapplicable(name.clone()))?;
        next.real_tick(self.tick.as_ref())?;
        next.freeze();
        log::info!("> {} (turn {}): {}", name, next.turn(), next);

        let turn = next.turn();
        self.state = next;
        Ok(Step::Acted { action: name, turn })
    }

    /// Steps until the goal is reached, no plan exists, or `max_steps`
    /// actions have been carried out.
    pub fn run(&mut self, max_steps: usize) -> Result<Run> {
        let mut actions = Vec::new();
        loop {
            if actions.len() >= max_steps {
                return Ok(Run {
                    actions,
                    outcome: Outcome::StepLimit,
                });
            }
            match self.step()? {
                Step::Acted { action, .. } => actions.push(action),
                Step::GoalReached => {
                    return Ok(Run {
                        actions,
                        outcome: Outcome::GoalReached,
                    })
                }
                Step::Stalled => {
                    return Ok(Run {
                        actions,
                        outcome: Outcome::Stalled,
                    })
                }
            }
        }
    }
}
