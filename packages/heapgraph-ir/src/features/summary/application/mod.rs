pub mod driver;

pub use driver::{AnalysisDriver, DriverReport};
