//! Application layer for the Models module.

pub mod command_handlers;
pub mod translators;
