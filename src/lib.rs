//! CRYODEX: collection completion optimizer for cryostasis crew rosters.
//!
//! Catalogs and the player snapshot live in [`data`], the scoring and combo
//! engine in [`engine`], Rayon plumbing in [`parallel`], and the HTTP
//! surface in [`server`]. The binary dispatches through [`cli`].

pub mod cli;
pub mod data;
pub mod engine;
pub mod parallel;
pub mod server;
