//! Pure rules for the Ashfall map and camp simulation.
//!
//! This crate holds the logic that doesn't need a live world: coordinate
//! math, time, skills, the food ledger, travel estimates and route planning.
//! Functions take plain data and return results, so they can be unit-tested
//! in isolation and shared by the engine and the headless harness.
//!
//! # Module Overview
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`calendar`] | Game time points and spans, seasons |
//! | [`constants`] | Grid dimensions, field density cap, camp tuning |
//! | [`coords`] | Points, scale conversions, distances, Bresenham lines |
//! | [`direction`] | Expansion compass directions and stamp orientation |
//! | [`encounter`] | Random encounter resolution for companions |
//! | [`food`] | Faction food ledger, ration cost, larder credit |
//! | [`fortify`] | Fortification line validation and per-tile stamps |
//! | [`missions`] | Mission kinds, worker caps, gathering parameters |
//! | [`salt_pipe`] | Salt-water pipe routing to the nearest swamp |
//! | [`skills`] | Skill levels, practice and group training |
//! | [`travel`] | Overland travel time, carry trips, work days |

pub mod calendar;
pub mod constants;
pub mod coords;
pub mod direction;
pub mod encounter;
pub mod food;
pub mod fortify;
pub mod missions;
pub mod salt_pipe;
pub mod skills;
pub mod travel;
