//! Middle end of the Neve compiler: lowers a type checked module into a linear
//! three address IR and optimizes it with a bounded pipeline of passes.

pub mod error;
pub mod frontend;
pub mod index;
pub mod logger;
pub mod middle;
