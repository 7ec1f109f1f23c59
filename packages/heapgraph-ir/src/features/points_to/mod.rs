//! Points-to result store

pub mod domain;

pub use domain::PtaResult;
