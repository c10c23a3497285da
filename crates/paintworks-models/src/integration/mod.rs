//! Integration layer for the Models module.

pub mod events;
