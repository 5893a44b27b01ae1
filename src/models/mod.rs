//! Domain models for the generated hierarchy.

mod hierarchy;
mod person;

pub use hierarchy::{
    Hierarchy, Link, DEFAULT_COUNT, DEFAULT_DEGREE, MAX_DEGREE, MIN_DEGREE,
};
pub use person::{Person, PersonFactory, SampleFactory};
