//! Feature modules
//!
//! Each feature is a vertical slice with the layers it genuinely needs:
//! domain models, infrastructure implementations, ports for external
//! collaborators, and application-level orchestration.

pub mod flow_graph;
pub mod ir;
pub mod lowering;
pub mod points_to;
pub mod reaching;
pub mod summary;
