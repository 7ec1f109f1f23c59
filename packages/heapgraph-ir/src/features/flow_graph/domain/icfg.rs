//! Intraprocedural control-flow graph
//!
//! Nodes are entry/exit sentinels plus one node per IR location; call
//! statements get `Call` nodes. Return nodes exist in the model but the
//! summary engine builds with `need_return_node = false`: the return
//! effect is modeled inline at the call site, so call nodes flow straight
//! into their successors. Successor order is insertion order and the
//! fixpoint and extraction walk both depend on it being deterministic.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IcfgNodeKind {
    Entry,
    Exit,
    Normal,
    Call,
    Return,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IcfgNode {
    pub kind: IcfgNodeKind,
    /// Index into `MethodIr::locations`; `None` for entry/exit
    pub loc: Option<usize>,
}

pub type NodeId = usize;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Icfg {
    nodes: Vec<IcfgNode>,
    succs: Vec<Vec<NodeId>>,
    preds: Vec<Vec<NodeId>>,
    entry: NodeId,
    exit: NodeId,
    /// Location index → node id
    loc_nodes: FxHashMap<usize, NodeId>,
    need_return_node: bool,
}

impl Icfg {
    pub fn new(need_return_node: bool) -> Self {
        let mut g = Self {
            nodes: Vec::new(),
            succs: Vec::new(),
            preds: Vec::new(),
            entry: 0,
            exit: 0,
            loc_nodes: FxHashMap::default(),
            need_return_node,
        };
        g.entry = g.add_node(IcfgNodeKind::Entry, None);
        g.exit = g.add_node(IcfgNodeKind::Exit, None);
        g
    }

    pub fn add_node(&mut self, kind: IcfgNodeKind, loc: Option<usize>) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(IcfgNode { kind, loc });
        self.succs.push(Vec::new());
        self.preds.push(Vec::new());
        if let Some(l) = loc {
            // The primary node of a location; return nodes never shadow it
            self.loc_nodes.entry(l).or_insert(id);
        }
        id
    }

    /// Idempotent edge insertion preserving first-insertion order
    pub fn add_edge(&mut self, from: NodeId, to: NodeId) {
        if !self.succs[from].contains(&to) {
            self.succs[from].push(to);
            self.preds[to].push(from);
        }
    }

    pub fn entry(&self) -> NodeId {
        self.entry
    }

    pub fn exit(&self) -> NodeId {
        self.exit
    }

    pub fn node(&self, id: NodeId) -> &IcfgNode {
        &self.nodes[id]
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn succs(&self, id: NodeId) -> &[NodeId] {
        &self.succs[id]
    }

    pub fn preds(&self, id: NodeId) -> &[NodeId] {
        &self.preds[id]
    }

    pub fn node_of_loc(&self, loc: usize) -> Option<NodeId> {
        self.loc_nodes.get(&loc).copied()
    }

    pub fn need_return_node(&self) -> bool {
        self.need_return_node
    }
}
