//! Structured AST → linear three-address IR
//!
//! Consumes a resolved AST and produces an ordered list of labeled
//! locations plus catch clauses, preserving side-effect order and lifting
//! every branch target to an explicit label.

pub mod domain;
pub mod infrastructure;

pub use infrastructure::translator::lower_method;
