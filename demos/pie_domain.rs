//! The pie world: an agent that is hungry and knows how to bake, milk cows
//! and do odd jobs.

use std::sync::Arc;

use goap_planner::{Action, Conditions, Result, Roster, SimpleAction, State, Tick, Value};

/// Passive evolution: whipped cream goes off and saplings grow into trees.
#[derive(Debug, Default)]
pub struct PieWorld;

impl Tick for PieWorld {
    fn automatic(&self, state: &mut State) -> Result<()> {
        state.decrement_floored_at_zero("whipped_cream", 1)?;

        let sapling = state.number("apple_sapling");
        if sapling >= 5.0 {
            state.set("apple_tree", true)?;
            state.set("apple_sapling", 0)?;
        } else if sapling > 0.0 {
            state.increment("apple_sapling", 1)?;
        }
        Ok(())
    }
}

#[derive(Debug)]
pub struct BuyCow;

impl Action for BuyCow {
    fn name(&self) -> &str {
        "buy cow"
    }

    fn is_applicable(&self, state: &State) -> bool {
        !state.flag("living_cow") && state.number("gold") > 12.0
    }

    fn update_state(&self, state: &mut State) -> Result<()> {
        state.decrement("gold", 12)?;
        state.set("living_cow", true)
    }
}

#[derive(Debug)]
pub struct PlantTree;

impl Action for PlantTree {
    fn name(&self) -> &str {
        "plant a tree"
    }

    fn is_applicable(&self, state: &State) -> bool {
        !state.flag("apple_tree")
    }

    fn update_state(&self, state: &mut State) -> Result<()> {
        state.set("apple_sapling", 1)
    }
}

#[derive(Debug)]
pub struct SellApple;

impl Action for SellApple {
    fn name(&self) -> &str {
        "sell apples"
    }

    fn is_applicable(&self, state: &State) -> bool {
        state.number("apples") > 0.0
    }

    fn update_state(&self, state: &mut State) -> Result<()> {
        state.decrement("apples", 1)?;
        state.increment("gold", 1)
    }
}

#[derive(Debug)]
pub struct SellMilk;

impl Action for SellMilk {
    fn name(&self) -> &str {
        "sell milk"
    }

    fn is_applicable(&self, state: &State) -> bool {
        state.number("fresh_milk") > 0.0
    }

    fn update_state(&self, state: &mut State) -> Result<()> {
        // two gold per unit of milk
        let milk = *state.value("fresh_milk")?;
        state.set("fresh_milk", 0)?;
        state.increment("gold", milk)?;
        state.increment("gold", milk)
    }
}

#[derive(Debug)]
pub struct BuyPie;

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

#[derive(Debug)]
pub struct MilkCow;

impl Action for MilkCow {
    fn name(&self) -> &str {
        "milk_cow"
    }

    fn is_applicable(&self, state: &State) -> bool {
        state.flag("living_cow") && state.number("raw_milk") <= 3.0
    }

    fn update_state(&self, state: &mut State) -> Result<()> {
        state.increment("raw_milk", 1)?;
        state.set("milked_cow", true)
    }
}

#[derive(Debug)]
pub struct ProcessMilk;

impl Action for ProcessMilk {
    fn name(&self) -> &str {
        "separate_cream"
    }

    fn is_applicable(&self, state: &State) -> bool {
        state.number("raw_milk") >= 1.0
    }

    fn update_state(&self, state: &mut State) -> Result<()> {
        let milk = *state.value("raw_milk")?;
        state.set("raw_milk", 0)?;
        state.increment("fresh_milk", milk)?;
        state.increment("fresh_cream", milk)
    }
}

#[derive(Debug)]
pub struct WhipCream;

impl Action for WhipCream {
    fn name(&self) -> &str {
        "whip_cream"
    }

    fn is_applicable(&self, state: &State) -> bool {
        state.number("fresh_cream") >= 1.0
    }

    fn update_state(&self, state: &mut State) -> Result<()> {
        state.decrement("fresh_cream", 1)?;
        state.increment("whipped_cream", 2)
    }
}

#[derive(Debug)]
pub struct PickApple;

impl Action for PickApple {
    fn name(&self) -> &str {
        "pick_apple"
    }

    fn is_applicable(&self, state: &State) -> bool {
        state.flag("apple_tree") && state.number("apples") <= 8.0
    }

    fn update_state(&self, state: &mut State) -> Result<()> {
        state.increment("apples", 1)
    }
}

#[derive(Debug)]
pub struct BakePie;

impl Action for BakePie {
    fn name(&self) -> &str {
        "bake_pie"
    }

    fn is_applicable(&self, state: &State) -> bool {
        state.number("apples") >= 4.0 && state.get("pie_crust") == Some(&Value::Bool(true))
    }

    fn update_state(&self, state: &mut State) -> Result<()> {
        state.decrement("apples", 4)?;
        state.set("pie_crust", false)?;
        state.set("apple_pie", true)?;
        state.set("baked_pie", true)
    }
}

#[derive(Debug)]
pub struct Labor;

impl Action for Labor {
    fn name(&self) -> &str {
        "do odd jobs"
    }

    fn update_state(&self, state: &mut State) -> Result<()> {
        state.increment("gold", 0.5)
    }
}

pub fn make_crust() -> SimpleAction {
    SimpleAction::new("make_pie_crust", 1.0)
        .precondition("pie_crust", false)
        .effect("pie_crust", true)
}

pub fn eat_pie() -> SimpleAction {
    SimpleAction::new("eat_pie", 1.0)
        .precondition("apple_pie", true)
        .precondition("whipped_cream", 1)
        .effect("apple_pie", false)
        .effect("hungry", false)
}

pub fn initial_state() -> State {
    State::from_vars([
        ("apple_tree", Value::from(true)),
        ("hungry", Value::from(true)),
        ("apple_pie", Value::from(false)),
        ("pie_crust", Value::from(false)),
        ("living_cow", Value::from(true)),
        ("gold", Value::from(0)),
        ("whipped_cream", Value::from(0)),
    ])
}

pub fn roster() -> Result<Roster> {
    Roster::builder()
        .with(PickApple)
        .with(BakePie)
        .with(eat_pie())
        .with(make_crust())
        .with(MilkCow)
        .with(ProcessMilk)
        .with(WhipCream)
        .with(SellMilk)
        .with(BuyPie)
        .with(PlantTree)
        .with(SellApple)
        .with(BuyCow)
        .with(Labor)
        .build()
}

pub fn goal() -> Conditions {
    Conditions::new().with("hungry", false)
}

pub fn world() -> Arc<dyn Tick> {
    Arc::new(PieWorld)
}
