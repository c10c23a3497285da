//! Application layer for the Materials module.

pub mod command_handlers;
pub mod translators;
