/*
 * Heapgraph IR - Summary-Based Interprocedural Heap Analysis
 *
 * Feature-First Hexagonal Architecture:
 * - shared/      : Common models (contexts, instances, slots, heap paths, rules)
 * - features/    : Vertical slices (lowering → ir → flow_graph → reaching → summary)
 *
 * Pipeline:
 * - A structured AST is lowered into a labeled three-address IR
 * - One work unit per method builds an ICFG, runs the reaching-facts
 *   fixpoint, and extracts heap-transfer rules over symbolic access paths
 * - Published summaries let callers resolve calls without re-descending
 */

#![allow(clippy::new_without_default)] // Default impl not always needed
#![allow(clippy::too_many_arguments)] // Transfer and walk plumbing carries context
#![allow(clippy::module_inception)] // Module naming intentional
#![allow(clippy::upper_case_acronyms)] // IR, ICFG naming

pub mod config;
pub mod errors;
pub mod features;
pub mod shared;

// ═══════════════════════════════════════════════════════════════════════════
// Re-exports
// ═══════════════════════════════════════════════════════════════════════════

pub use config::WorkUnitConfig;
pub use errors::{HeapgraphError, Result};

pub use features::flow_graph::{build_icfg, Icfg, IcfgNodeKind};
pub use features::ir::domain::{CatchClause, IrStmt, Label, Location, MethodIr};
pub use features::ir::IrPrinter;
pub use features::lowering::domain::{AstExpr, AstMethod, AstStmt, AstStmtKind};
pub use features::lowering::lower_method;
pub use features::points_to::PtaResult;
pub use features::reaching::{ReachingFactsEngine, RfaResult};
pub use features::summary::{
    AnalysisDriver, CallSite, ClassInfo, DriverReport, Global, HeapMap, HeapSummaryWorkUnit,
    ModelCallHandler, NoModelCalls, PointsToWorkUnit, PtStore, RuntimeModels, SummaryManager,
    TypeRegistry,
};
pub use shared::models::{
    Context, FactSet, HeapAccess, HeapBase, HeapRhs, HeapRoot, HeapSummary, HeapSummaryRule,
    Instance, MethodSignature, PtSummary, PtSummaryRule, RfaFact, Slot, Span, TypeRef,
    WILDCARD_FIELD,
};
