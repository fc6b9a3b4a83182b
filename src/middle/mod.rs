//! The typed AST is lowered into a linear IR here, which is then optimized by
//! a bounded pipeline of passes.

pub mod ir;
pub mod optimization;
