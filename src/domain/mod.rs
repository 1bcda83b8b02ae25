//! Configuration and remote-state model.

pub mod entities;
pub mod value_objects;
