//! Plans and then acts out a route from hungry to fed in the pie world.
//!
//! Run with `cargo run --example pie_world`.

mod pie_domain;

use goap_planner::{Agent, Node, Outcome, PathFinder, Result};

fn main() -> Result<()> {
    let roster = pie_domain::roster()?;

    let start = Node::new(pie_domain::initial_state(), roster.clone());
    let mut finder =
        PathFinder::new(start, pie_domain::goal()).with_tick(pie_domain::world());
    let plan = finder.find_path()?;
    println!("# current plan: {}", plan.describe());
    println!(
        "# considered {} states, total cost {}",
        plan.expanded(),
        plan.total_cost()
    );

    let mut agent = Agent::new(pie_domain::initial_state(), roster, pie_domain::goal())
        .with_tick(pie_domain::world());
    let run = agent.run(20)?;
    for (turn, action) in run.actions.iter().enumerate() {
        println!("{:>3} > {}", turn + 1, action);
    }
    match run.outcome {
        Outcome::GoalReached => println!("fed after {} turns: {}", agent.state().turn(), agent.state()),
        Outcome::Stalled => println!("no plan improves {}", agent.state()),
        Outcome::StepLimit => println!("still hungry after {} turns", run.actions.len()),
    }
    Ok(())
}
