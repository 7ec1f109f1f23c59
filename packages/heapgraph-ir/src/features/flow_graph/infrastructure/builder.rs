//! ICFG construction from a lowered method body

use crate::errors::{HeapgraphError, Result};
use crate::features::flow_graph::domain::icfg::{Icfg, IcfgNodeKind, NodeId};
use crate::features::ir::domain::{IrStmt, MethodIr};

/// Build the intraprocedural CFG of `method`.
///
/// Fall-through edges precede branch-target edges, so successor order is
/// stable. Every location inside a protected label range gets an edge to
/// its handler.
pub fn build_icfg(method: &MethodIr, need_return_node: bool) -> Result<Icfg> {
    let mut g = Icfg::new(need_return_node);

    // One node per location; calls get dedicated call (+ return) nodes
    let mut primary: Vec<NodeId> = Vec::with_capacity(method.locations.len());
    let mut after_call: Vec<Option<NodeId>> = vec![None; method.locations.len()];
    for loc in &method.locations {
        match &loc.stmt {
            IrStmt::Call { .. } => {
                let call = g.add_node(IcfgNodeKind::Call, Some(loc.index));
                primary.push(call);
                if need_return_node {
                    let ret = g.add_node(IcfgNodeKind::Return, Some(loc.index));
                    g.add_edge(call, ret);
                    after_call[loc.index] = Some(ret);
                }
            }
            _ => {
                primary.push(g.add_node(IcfgNodeKind::Normal, Some(loc.index)));
            }
        }
    }

    let find = |label: &str| -> Result<NodeId> {
        method
            .find_label(label)
            .map(|i| primary[i])
            .ok_or_else(|| {
                HeapgraphError::invariant(format!(
                    "branch target `{}` missing in {}",
                    label, method.signature
                ))
            })
    };

    if let Some(&first) = primary.first() {
        g.add_edge(g.entry(), first);
    } else {
        let (en, ex) = (g.entry(), g.exit());
        g.add_edge(en, ex);
    }

    for loc in &method.locations {
        let i = loc.index;
        // Source of the outgoing fall-through edge
        let from = after_call[i].unwrap_or(primary[i]);
        match &loc.stmt {
            IrStmt::Return { .. } | IrStmt::Throw { .. } => {
                let ex = g.exit();
                g.add_edge(primary[i], ex);
            }
            IrStmt::Goto { target } => {
                let t = find(target)?;
                g.add_edge(primary[i], t);
            }
            IrStmt::If { target, .. } => {
                let next = next_node(&primary, i, &g);
                g.add_edge(from, next);
                let t = find(target)?;
                g.add_edge(primary[i], t);
            }
            _ => {
                let next = next_node(&primary, i, &g);
                g.add_edge(from, next);
            }
        }
    }

    // Exception edges: every location in a protected range may transfer to
    // its handler
    for clause in &method.catches {
        let from_idx = method.find_label(&clause.from_label).ok_or_else(|| {
            HeapgraphError::invariant(format!(
                "catch range start `{}` missing in {}",
                clause.from_label, method.signature
            ))
        })?;
        let to_idx = method.find_label(&clause.to_label).ok_or_else(|| {
            HeapgraphError::invariant(format!(
                "catch range end `{}` missing in {}",
                clause.to_label, method.signature
            ))
        })?;
        let handler = find(&clause.handler_label)?;
        for idx in from_idx..=to_idx.min(method.locations.len() - 1) {
            g.add_edge(primary[idx], handler);
        }
    }

    Ok(g)
}

fn next_node(primary: &[NodeId], i: usize, g: &Icfg) -> NodeId {
    primary.get(i + 1).copied().unwrap_or_else(|| g.exit())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::ir::domain::{Label, LhsExpr, LitValue, Location, ReturnKind, RhsExpr};
    use crate::shared::models::{MethodSignature, TypeRef};
    use std::collections::BTreeMap;

    fn method(stmts: Vec<IrStmt>) -> MethodIr {
        let locations = stmts
            .into_iter()
            .enumerate()
            .map(|(i, stmt)| Location {
                index: i,
                label: Label::Std(i),
                stmt,
            })
            .collect();
        MethodIr {
            signature: MethodSignature::new("A", "m", vec![], TypeRef::void()),
            declaring_class: "A".to_string(),
            is_static: true,
            this_name: None,
            params: vec![],
            locals: BTreeMap::new(),
            locations,
            catches: vec![],
        }
    }

    #[test]
    fn test_straight_line() {
        let m = method(vec![
            IrStmt::Assign {
                lhs: LhsExpr::Var("x".into()),
                rhs: RhsExpr::Literal(LitValue::Int(1)),
            },
            IrStmt::Return {
                value: None,
                kind: Some(ReturnKind::Void),
            },
        ]);
        let g = build_icfg(&m, false).unwrap();
        let first = g.succs(g.entry())[0];
        assert_eq!(g.node(first).loc, Some(0));
        let second = g.succs(first)[0];
        assert_eq!(g.node(second).loc, Some(1));
        assert_eq!(g.succs(second), &[g.exit()]);
    }

    #[test]
    fn test_call_without_return_node_falls_through() {
        let m = method(vec![
            IrStmt::Call {
                lhs: None,
                signature: MethodSignature::new("A", "f", vec![], TypeRef::void()),
                recv: None,
                args: vec![],
                kind: crate::features::ir::domain::CallKind::Static,
            },
            IrStmt::Return {
                value: None,
                kind: Some(ReturnKind::Void),
            },
        ]);
        let g = build_icfg(&m, false).unwrap();
        let call = g.node_of_loc(0).unwrap();
        assert_eq!(g.node(call).kind, IcfgNodeKind::Call);
        // No return node in between
        assert_eq!(g.node(g.succs(call)[0]).loc, Some(1));
    }
}
