//! Planning and execution: records become [`PlannedAction`]s, collected
//! into a [`Plan`] that is either described (dry run) or executed.

pub mod actions;
pub mod executor;
pub mod factory;

pub use actions::{PlannedAction, Source};
pub use executor::{Plan, PlanReport};
pub use factory::{ActionFactory, PlanOptions};
