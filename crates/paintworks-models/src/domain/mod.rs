//! Domain layer for the Models module.

pub mod commands;
pub mod events;
pub mod model;
