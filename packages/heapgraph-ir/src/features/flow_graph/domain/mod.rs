pub mod icfg;

pub use icfg::{Icfg, IcfgNode, IcfgNodeKind, NodeId};
