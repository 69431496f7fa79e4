pub mod game_tester;
pub mod players;
pub mod reports;
pub mod scenarios;
pub mod seeds;
pub mod tester;

pub use players::PlayerStrategy;
pub use scenarios::{TestScenario, get_scenario, list_scenarios, scenario_keys};
pub use seeds::{SeedInfo, resolve_seed_inputs};
pub use tester::*;
