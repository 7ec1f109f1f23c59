//! Three-address IR model and textual serialization

pub mod domain;
pub mod infrastructure;

pub use domain::{CatchClause, IrStmt, Label, Location, MethodIr};
pub use infrastructure::printer::IrPrinter;
