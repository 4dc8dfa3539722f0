//! Best-first (A*-shaped) search over the action graph.
//!
//! The graph is never materialised: [`PathFinder`] asks the cheapest frontier
//! node for its neighbours ([`Node::expand`]) and keys all of its bookkeeping
//! by each state's canonical [`StateKey`], so structurally equal states found
//! along different paths are the same vertex.
//!
//! Frontier nodes are kept in a binary heap ordered by `f = g + h`. Ties on
//! `f` go to the deeper node, then to the earlier discovery; that order is an
//! implementation detail and callers should not rely on it. Closed nodes are
//! never reopened, so a heuristic that overestimates can yield a suboptimal
//! plan, but the search still terminates.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BinaryHeap, HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use ordered_float::OrderedFloat;

use crate::tick::{NoTick, Tick};
use crate::{Conditions, GoapError, Node, Result, StateKey};

/// A trait for heuristic functions used by the search.
pub trait HeuristicStrategy: Send + Sync {
    /// Estimated remaining cost from `node` to a state satisfying `goal`.
    fn estimate(&self, node: &Node, goal: &Conditions) -> f64;
}

/// Default heuristic: the number of goal variables not yet matched
/// (see [`Node::heuristic_distance`]). Not admissible in general.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnmetGoalCount;

impl HeuristicStrategy for UnmetGoalCount {
    fn estimate(&self, node: &Node, goal: &Conditions) -> f64 {
        node.heuristic_distance(goal) as f64
    }
}

/// Zero heuristic, turning the search into uniform-cost search. Plans are
/// optimal for non-negative costs at the price of a wider exploration.
#[derive(Debug, Clone, Copy, Default)]
pub struct ZeroHeuristic;

impl HeuristicStrategy for ZeroHeuristic {
    fn estimate(&self, _node: &Node, _goal: &Conditions) -> f64 {
        0.0
    }
}

/// Tuning knobs for a [`PathFinder`].
#[derive(Debug, Clone, Default)]
pub struct SearchConfig {
    /// Log the frontier size and f-cost histogram on every iteration.
    pub trace: bool,
    /// Give up with [`GoapError::NoPathFound`] rather than expand more than
    /// this many non-goal nodes. A goal popped within the bound still wins.
    pub max_expansions: Option<usize>,
}

impl SearchConfig {
    pub fn with_trace(mut self, trace: bool) -> Self {
        self.trace = trace;
        self
    }

    pub fn with_max_expansions(mut self, limit: usize) -> Self {
        self.max_expansions = Some(limit);
        self
    }
}

/// A plan: the node sequence from the start to a goal-satisfying node.
#[derive(Debug, Clone)]
pub struct Plan {
    nodes: Vec<Node>,
    total_cost: f64,
    expanded: usize,
}

impl Plan {
    /// Every node on the path, start included.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// The nodes produced by actions, i.e. everything after the start.
    pub fn steps(&self) -> &[Node] {
        &self.nodes[1..]
    }

    /// Number of nodes on the path, start included. Never zero.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always false: a plan contains at least its start node.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The final, goal-satisfying node.
    pub fn goal_node(&self) -> &Node {
        &self.nodes[self.nodes.len() - 1]
    }

    /// Sum of the step costs along the path (`g` at the goal).
    pub fn total_cost(&self) -> f64 {
        self.total_cost
    }

    /// Number of nodes the search closed before finding this plan.
    pub fn expanded(&self) -> usize {
        self.expanded
    }

    pub fn action_names(&self) -> Vec<&str> {
        self.steps().iter().map(Node::describe).collect()
    }

    /// Step names joined by `;`.
    pub fn describe(&self) -> String {
        self.action_names().join(";")
    }
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (cost {})", self.describe(), self.total_cost)
    }
}

impl<'a> IntoIterator for &'a Plan {
    type Item = &'a Node;
    type IntoIter = std::slice::Iter<'a, Node>;

    fn into_iter(self) -> Self::IntoIter {
        self.nodes.iter()
    }
}

/// Frontier entry; the heap pops the greatest, so ordering is reversed on f.
#[derive(Debug)]
struct OpenEntry {
    f: OrderedFloat<f64>,
    g: OrderedFloat<f64>,
    seq: u64,
    key: StateKey,
}

impl PartialEq for OpenEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for OpenEntry {}

impl PartialOrd for OpenEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OpenEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .f
            .cmp(&self.f)
            .then_with(|| self.g.cmp(&other.g))
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// Cost and parent bookkeeping for one discovered state.
#[derive(Debug)]
struct Record {
    g: f64,
    h: f64,
    parent: Option<StateKey>,
    node: Node,
}

/// Working memory of one search; dropped once a path is returned.
struct SearchContext {
    records: HashMap<StateKey, Record>,
    open: BinaryHeap<OpenEntry>,
    closed: HashSet<StateKey>,
    seq: u64,
}

impl SearchContext {
    fn new(root: Node, h: f64) -> Self {
        let mut context = Self {
            records: HashMap::new(),
            open: BinaryHeap::new(),
            closed: HashSet::new(),
            seq: 0,
        };
        context.discover(root, None, 0.0, h);
        context
    }

    /// Records `node` as reached with cost `g` and (re)places it on the frontier.
    fn discover(&mut self, node: Node, parent: Option<StateKey>, g: f64, h: f64) {
        let key = node.canonical_key().clone();
        self.open.push(OpenEntry {
            f: OrderedFloat(g + h),
            g: OrderedFloat(g),
            seq: self.seq,
            key: key.clone(),
        });
        self.seq += 1;
        self.records.insert(
            key,
            Record {
                g,
                h,
                parent,
                node,
            },
        );
    }

    /// Pops the cheapest live frontier key and closes it.
    fn next_node(&mut self) -> Option<StateKey> {
        while let Some(entry) = self.open.pop() {
            if self.closed.contains(&entry.key) {
                continue;
            }
            let stale = self
                .records
                .get(&entry.key)
                .map_or(true, |record| entry.g.0 > record.g);
            if stale {
                continue;
            }
            self.closed.insert(entry.key.clone());
            return Some(entry.key);
        }
        None
    }

    /// True if `g` improves on the best known cost for `key`.
    fn improves(&self, key: &StateKey, g: f64) -> bool {
        self.records.get(key).map_or(true, |record| g < record.g)
    }

    fn open_len(&self) -> usize {
        self.records.len() - self.closed.len()
    }

    fn f_histogram(&self) -> BTreeMap<OrderedFloat<f64>, usize> {
        let mut histogram = BTreeMap::new();
        for (key, record) in &self.records {
            if !self.closed.contains(key) {
                *histogram.entry(OrderedFloat(record.g + record.h)).or_insert(0) += 1;
            }
        }
        histogram
    }

    fn reconstruct_path(&self, goal: &StateKey) -> Vec<Node> {
        let mut path = Vec::new();
        let mut current = Some(goal);
        while let Some(key) = current {
            let Some(record) = self.records.get(key) else {
                break;
            };
            path.push(record.node.clone());
            current = record.parent.as_ref();
        }
        path.reverse();
        path
    }
}

/// Finds a minimum-estimated-cost path from a start node to a node satisfying
/// a goal.
///
/// The result for the fixed (start, goal) pair is cached: repeated calls to
/// [`PathFinder::find_path`] return the same plan without searching again.
///
/// # Examples
///
/// ```
/// use goap_planner::{Conditions, Node, PathFinder, Roster, SimpleAction, State};
/// use goap_planner::{Action, Result, Value};
///
/// #[derive(Debug)]
/// struct EarnGold;
///
/// impl Action for EarnGold {
///     fn name(&self) -> &str {
///         "earn_gold"
///     }
///
///     fn update_state(&self, state: &mut State) -> Result<()> {
///         state.increment("gold", 10)
///     }
/// }
///
/// let roster = Roster::builder().with(EarnGold).build().unwrap();
/// let start = Node::new(State::from_vars([("gold", 0)]), roster);
/// let goal = Conditions::new().with("gold", 10);
///
/// let mut finder = PathFinder::new(start, goal);
/// let plan = finder.find_path().unwrap();
/// assert_eq!(plan.len(), 2);
/// assert_eq!(plan.total_cost(), 1.0);
/// assert_eq!(plan.describe(), "earn_gold");
/// ```
pub struct PathFinder {
    start: Node,
    goal: Conditions,
    tick: Arc<dyn Tick>,
    heuristic: Box<dyn HeuristicStrategy>,
    config: SearchConfig,
    found: Option<Plan>,
}

impl PathFinder {
    /// Creates a path finder with no tick hook, the [`UnmetGoalCount`]
    /// heuristic and the default configuration.
    pub fn new(start: Node, goal: Conditions) -> Self {
        Self {
            start,
            goal,
            tick: Arc::new(NoTick),
            heuristic: Box::new(UnmetGoalCount),
            config: SearchConfig::default(),
            found: None,
        }
    }

    /// Sets the hook run on every successor state before it is frozen.
    pub fn with_tick(mut self, tick: Arc<dyn Tick>) -> Self {
        self.tick = tick;
        self
    }

    pub fn with_heuristic(mut self, heuristic: impl HeuristicStrategy + 'static) -> Self {
        self.heuristic = Box::new(heuristic);
        self
    }

    pub fn with_config(mut self, config: SearchConfig) -> Self {
        self.config = config;
        self
    }

    pub fn start(&self) -> &Node {
        &self.start
    }

    pub fn goal(&self) -> &Conditions {
        &self.goal
    }

    /// The plan found by an earlier [`PathFinder::find_path`], if any.
    pub fn cached_path(&self) -> Option<&Plan> {
        self.found.as_ref()
    }

    /// Runs the search, or returns the cached plan from a previous success.
    ///
    /// # Errors
    ///
    /// * [`GoapError::NoPathFound`] if every reachable state was closed without
    ///   meeting the goal, or the expansion limit was hit
    /// * state-container errors raised by action or tick logic
    pub fn find_path(&mut self) -> Result<&Plan> {
        let plan = match self.found.take() {
            Some(plan) => plan,
            None => self.search()?,
        };
        Ok(&*self.found.insert(plan))
    }

    fn search(&self) -> Result<Plan> {
        let goal = &self.goal;
        let h = self.heuristic.estimate(&self.start, goal);
        let mut context = SearchContext::new(self.start.clone(), h);
        let mut expanded = 0usize;

        while let Some(current) = context.next_node() {
            expanded += 1;
            if self.config.trace {
                log::debug!(
                    "open={} closed={} f-costs={:?}",
                    context.open_len(),
                    context.closed.len(),
                    context.f_histogram()
                );
            }

            let record = &context.records[&current];
            if record.node.is_goal(goal) {
                let nodes = context.reconstruct_path(&current);
                log::debug!(
                    "Goal reached after considering {} nodes (cost {}, {} steps)",
                    expanded,
                    record.g,
                    nodes.len() - 1
                );
                return Ok(Plan {
                    nodes,
                    total_cost: record.g,
                    expanded,
                });
            }

            if let Some(limit) = self.config.max_expansions {
                if expanded > limit {
                    log::warn!("Search abandoned after {} expansions", limit);
                    return Err(GoapError::NoPathFound);
                }
            }

            let current_g = record.g;
            let neighbors = record.node.expand(self.tick.as_ref())?;

            for neighbor in neighbors {
                let key = neighbor.canonical_key().clone();
                if context.closed.contains(&key) {
                    continue;
                }
                let g = current_g + neighbor.cost();
                if context.improves(&key, g) {
                    let h = self.heuristic.estimate(&neighbor, goal);
                    context.discover(neighbor, Some(current.clone()), g, h);
                }
            }
        }

        log::debug!("Frontier exhausted after considering {} nodes", expanded);
        Err(GoapError::NoPathFound)
    }
}

impl fmt::Debug for PathFinder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PathFinder")
            .field("start", &self.start)
            .field("goal", &self.goal)
            .field("config", &self.config)
            .field("found", &self.found.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Action, FnTick, Roster, SimpleAction, State, Value};

    fn make_action(
        name: &str,
        cost: f64,
        pre: Vec<(&str, bool)>,
        eff: Vec<(&str, bool)>,
    ) -> SimpleAction {
        let mut action = SimpleAction::new(name, cost);
        for (k, v) in pre {
            action.preconditions.set(k, v);
        }
        for (k, v) in eff {
            action.effects.set(k, v);
        }
        action
    }

    fn roster(actions: Vec<SimpleAction>) -> Roster {
        actions
            .into_iter()
            .fold(Roster::builder(), |builder, action| builder.with(action))
            .build()
            .unwrap()
    }

    fn finder(actions: Vec<SimpleAction>, start: State, goal: Conditions) -> PathFinder {
        PathFinder::new(Node::new(start, roster(actions)), goal)
    }

    #[derive(Debug)]
    struct Counter;

    impl Action for Counter {
        fn name(&self) -> &str {
            "count"
        }

        fn update_state(&self, state: &mut State) -> Result<()> {
            state.increment("n", 1)
        }
    }

    #[test]
    fn test_open_entry_ordering() {
        let key = {
            let mut state = State::new();
            state.freeze()
        };
        let entry = |f: f64, g: f64, seq: u64| OpenEntry {
            f: OrderedFloat(f),
            g: OrderedFloat(g),
            seq,
            key: key.clone(),
        };
        let mut heap = BinaryHeap::new();
        heap.push(entry(3.0, 1.0, 0));
        heap.push(entry(2.0, 0.0, 1));
        heap.push(entry(2.0, 2.0, 2));
        heap.push(entry(2.0, 2.0, 3));
        let order: Vec<_> = std::iter::from_fn(|| heap.pop()).map(|e| e.seq).collect();
        assert_eq!(order, [2, 3, 1, 0]);
    }

    #[test]
    fn test_astar_picks_cheaper_action() {
        let a = make_action("a", 1.0, vec![("start", true)], vec![("goal", true)]);
        let b = make_action("b", 5.0, vec![("start", true)], vec![("goal", true)]);

        let mut finder = finder(
            vec![b, a],
            State::from_vars([("start", true)]),
            Conditions::new().with("goal", true),
        );
        let plan = finder.find_path().unwrap();
        assert_eq!(plan.len(), 2);
        assert_eq!(plan.action_names(), ["a"]);
        assert_eq!(plan.total_cost(), 1.0);
    }

    #[test]
    fn test_zero_heuristic_search() {
        let a = make_action("a", 1.0, vec![("start", true)], vec![("goal", true)]);
        let b = make_action("b", 5.0, vec![("start", true)], vec![("goal", true)]);

        let mut finder = finder(
            vec![a, b],
            State::from_vars([("start", true)]),
            Conditions::new().with("goal", true),
        )
        .with_heuristic(ZeroHeuristic);
        let plan = finder.find_path().unwrap();
        assert_eq!(plan.action_names(), ["a"]);
    }

    #[test]
    fn test_multi_step_plan() {
        let action1 = make_action(
            "action1",
            1.0,
            vec![("condition1", true)],
            vec![("condition2", true)],
        );
        let action2 = make_action(
            "action2",
            1.0,
            vec![("condition2", true)],
            vec![("goal", true)],
        );

        let goal = Conditions::new().with("goal", true);
        let mut finder = finder(
            vec![action2, action1],
            State::from_vars([("condition1", true)]),
            goal.clone(),
        );
        let plan = finder.find_path().unwrap();
        assert_eq!(plan.action_names(), ["action1", "action2"]);
        assert_eq!(plan.nodes()[0].describe(), "start");
        assert!(plan.goal_node().is_goal(&goal));
    }

    #[test]
    fn test_goal_already_satisfied() {
        let pick_up = make_action("pick_up_key", 1.0, vec![], vec![("hasKey", true)]);
        let use_key = make_action(
            "use_key",
            1.0,
            vec![("hasKey", true)],
            vec![("hasKey", false)],
        );

        let mut finder = finder(
            vec![pick_up, use_key],
            State::from_vars([("hasKey", false)]),
            Conditions::new().with("hasKey", false),
        );
        let plan = finder.find_path().unwrap();
        assert_eq!(plan.len(), 1);
        assert!(plan.steps().is_empty());
        assert_eq!(plan.total_cost(), 0.0);
        assert_eq!(plan.expanded(), 1);
    }

    #[test]
    fn test_unreachable_goal_terminates() {
        let a = make_action("toggle_on", 1.0, vec![("x", false)], vec![("x", true)]);
        let b = make_action("toggle_off", 1.0, vec![("x", true)], vec![("x", false)]);

        let mut finder = finder(
            vec![a, b],
            State::from_vars([("x", false)]),
            Conditions::new().with("never_set", true),
        );
        let err = finder.find_path().unwrap_err();
        assert_eq!(err, GoapError::NoPathFound);
        assert!(finder.cached_path().is_none());
    }

    #[test]
    fn test_cheaper_path_replaces_open_entry() {
        // direct costs 10; the two-step detour costs 2
        let direct = make_action("direct", 10.0, vec![], vec![("goal", true)]);
        let step1 = make_action("step1", 1.0, vec![("mid", false)], vec![("mid", true)]);
        let step2 = make_action("step2", 1.0, vec![("mid", true)], vec![("goal", true)]);

        let mut finder = finder(
            vec![direct, step1, step2],
            State::from_vars([("mid", false), ("goal", false)]),
            Conditions::new().with("goal", true),
        );
        let plan = finder.find_path().unwrap();
        assert_eq!(plan.action_names(), ["step1", "step2"]);
        assert_eq!(plan.total_cost(), 2.0);
    }

    #[test]
    fn test_path_cost_matches_step_costs() {
        let a = make_action("a", 2.5, vec![("s", true)], vec![("m", true)]);
        let b = make_action("b", 0.5, vec![("m", true)], vec![("t", true)]);
        let mut finder = finder(
            vec![a, b],
            State::from_vars([("s", true)]),
            Conditions::new().with("t", true),
        );
        let plan = finder.find_path().unwrap();
        let sum: f64 = plan.steps().iter().map(Node::cost).sum();
        assert_eq!(sum, plan.total_cost());
        assert_eq!(plan.total_cost(), 3.0);
    }

    #[test]
    fn test_result_is_cached() {
        let roster = Roster::builder().with(Counter).build().unwrap();
        let start = Node::new(State::from_vars([("n", 0)]), roster);
        let mut finder = PathFinder::new(start, Conditions::new().with("n", 3));
        assert_eq!(finder.start().describe(), "start");
        assert_eq!(finder.goal().get("n"), Some(&Value::Int(3)));
        assert!(finder.cached_path().is_none());

        let first = finder.find_path().unwrap().clone();
        assert!(finder.cached_path().is_some());
        let second = finder.find_path().unwrap();
        assert_eq!(first.describe(), second.describe());
        assert_eq!(first.expanded(), second.expanded());
        assert_eq!(second.describe(), "count;count;count");
        assert_eq!(finder.start().state().get("n"), Some(&Value::Int(0)));
    }

    #[test]
    fn test_tick_is_applied_during_search() {
        // each action adds 2 cream, the world eats 1 per step
        #[derive(Debug)]
        struct Whip;
        impl Action for Whip {
            fn name(&self) -> &str {
                "whip_cream"
            }
            fn update_state(&self, state: &mut State) -> Result<()> {
                state.increment("cream", 2)
            }
        }
        let roster = Roster::builder().with(Whip).build().unwrap();
        let decay = FnTick(|state: &mut State| state.decrement_floored_at_zero("cream", 1));
        let start = Node::new(State::from_vars([("cream", 0)]), roster);
        let mut finder =
            PathFinder::new(start, Conditions::new().with("cream", 3)).with_tick(Arc::new(decay));
        let plan = finder.find_path().unwrap();
        assert_eq!(plan.action_names(), ["whip_cream"; 3]);
        assert_eq!(
            plan.goal_node().state().get("cream"),
            Some(&Value::Int(3))
        );
    }

    #[test]
    fn test_max_expansions_gives_up() {
        let roster = Roster::builder().with(Counter).build().unwrap();
        let start = Node::new(State::from_vars([("n", 0)]), roster);
        let mut finder = PathFinder::new(start, Conditions::new().with("n", 100))
            .with_config(SearchConfig::default().with_max_expansions(5).with_trace(true));
        assert_eq!(finder.find_path().unwrap_err(), GoapError::NoPathFound);
    }

    #[test]
    fn test_max_expansions_allows_goal_within_bound() {
        let goal = Conditions::new().with("n", 1);
        let search = |limit: usize| {
            let roster = Roster::builder().with(Counter).build().unwrap();
            let start = Node::new(State::from_vars([("n", 0)]), roster);
            PathFinder::new(start, goal.clone())
                .with_config(SearchConfig::default().with_max_expansions(limit))
                .find_path()
                .map(|plan| (plan.len(), plan.expanded()))
        };
        assert_eq!(search(0), Err(GoapError::NoPathFound));
        assert_eq!(search(1), Ok((2, 2)));
        assert_eq!(search(2), Ok((2, 2)));
    }

    #[test]
    fn test_revisited_states_are_not_reexpanded() {
        // a;b and b;a end in the same state, and re-applying a is a self-loop
        let a = make_action("a", 1.0, vec![], vec![("a", true)]);
        let b = make_action("b", 1.0, vec![], vec![("b", true)]);
        let mut finder = finder(
            vec![a, b],
            State::from_vars([("a", false), ("b", false)]),
            Conditions::new().with("a", true).with("b", true),
        );
        let plan = finder.find_path().unwrap();
        assert_eq!(plan.len(), 3);
        assert_eq!(plan.total_cost(), 2.0);
        assert_eq!(plan.expanded(), 3);
    }

    #[test]
    fn test_exhausted_finite_graph() {
        let a = make_action("a", 1.0, vec![], vec![("a", true)]);
        let b = make_action("b", 1.0, vec![], vec![("b", true)]);
        let mut finder = finder(
            vec![a, b],
            State::from_vars([("a", false), ("b", false)]),
            Conditions::new().with("c", true),
        );
        assert!(finder.find_path().unwrap_err().is_no_path());
    }
}
