//! Quiz-gated arcade shooter: the simulation core plus its persistence
//! collaborator.  The terminal front-end lives in `main.rs`.

pub mod ability;
pub mod backend;
pub mod combat;
pub mod compute;
pub mod config;
pub mod entities;
pub mod error;
pub mod motion;
pub mod phase;
pub mod quiz;
pub mod remote;
pub mod spawn;
