//! Intraprocedural control-flow graphs

pub mod domain;
pub mod infrastructure;

pub use domain::{Icfg, IcfgNode, IcfgNodeKind, NodeId};
pub use infrastructure::build_icfg;
