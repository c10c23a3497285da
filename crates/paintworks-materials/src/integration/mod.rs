//! Integration layer for the Materials module.

pub mod events;
