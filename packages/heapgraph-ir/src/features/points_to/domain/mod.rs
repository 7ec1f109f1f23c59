pub mod pta_result;

pub use pta_result::PtaResult;
