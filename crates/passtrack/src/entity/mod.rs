//! SeaORM entity definitions for the passtrack database schema.

pub mod beatmap;
pub mod completion;
pub mod mapset;
pub mod prelude;
pub mod ruleset;
pub mod update_task;
pub mod user;
