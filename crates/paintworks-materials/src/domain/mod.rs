//! Domain layer for the Materials module.

pub mod commands;
pub mod events;
pub mod material;
