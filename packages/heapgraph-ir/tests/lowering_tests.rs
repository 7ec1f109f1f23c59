//! Lowering integration tests
//!
//! Drives the translator over the fixture constructs and checks the exact
//! three-address shapes, label discipline, and printer conventions.

use heapgraph_ir::features::ir::domain::{
    BinOp, CallKind, CmpOp, CondOperand, IrStmt, Label, LhsExpr, LitValue, RhsExpr,
};
use heapgraph_ir::features::lowering::domain::{
    AstBinOp, AstExpr, AstLit, AstMethod, AstStmt, AstStmtKind, AstUnOp, CallProps, CatchArm,
    IncDecOp, Receiver, SwitchCase,
};
use heapgraph_ir::{lower_method, HeapgraphError, IrPrinter, MethodSignature, TypeRef};

fn int() -> TypeRef {
    TypeRef::primitive("int")
}

fn boolean() -> TypeRef {
    TypeRef::primitive("boolean")
}

fn object() -> TypeRef {
    TypeRef::object("java.lang.Object")
}

fn fixture(params: Vec<(&str, TypeRef)>, body: Vec<AstStmtKind>) -> AstMethod {
    let params: Vec<(String, TypeRef)> = params
        .into_iter()
        .map(|(n, t)| (n.to_string(), t))
        .collect();
    AstMethod {
        signature: MethodSignature::new(
            "com.example.Fixture",
            "run",
            params.iter().map(|(_, t)| t.clone()).collect(),
            TypeRef::void(),
        ),
        declaring_class: "com.example.Fixture".to_string(),
        is_static: true,
        params,
        body: body.into_iter().map(AstStmt::new).collect(),
    }
}

fn stmts(method: &heapgraph_ir::MethodIr) -> Vec<&IrStmt> {
    method.locations.iter().map(|l| &l.stmt).collect()
}

fn assign_var(name: &str, rhs: RhsExpr) -> IrStmt {
    IrStmt::Assign {
        lhs: LhsExpr::Var(name.to_string()),
        rhs,
    }
}

// ── boundary scenarios ─────────────────────────────────────────────────

#[test]
fn scenario_literal_initializer_goes_through_temp() {
    // int i = 1;  =>  int_temp := 1; i := int_temp;
    let m = lower_method(&fixture(
        vec![],
        vec![AstStmtKind::LocalDecl {
            ty: int(),
            name: "i".to_string(),
            init: Some(AstExpr::int(1)),
        }],
    ))
    .unwrap();
    let s = stmts(&m);
    assert_eq!(*s[0], assign_var("int_temp", RhsExpr::Literal(LitValue::Int(1))));
    assert_eq!(*s[1], assign_var("i", RhsExpr::Var("int_temp".to_string())));
    // synthesized void return
    assert!(matches!(
        s[2],
        IrStmt::Return {
            value: None,
            kind: Some(heapgraph_ir::features::ir::domain::ReturnKind::Void)
        }
    ));
    assert_eq!(s.len(), 3);
}

#[test]
fn scenario_new_multi_dim_array() {
    // new int[1][2]  =>  int_temp := 1; int_temp1 := 2;
    //                    int_arr2_temp := new int[int_temp, int_temp1];
    let m = lower_method(&fixture(
        vec![],
        vec![AstStmtKind::Expr(AstExpr::NewArray {
            ty: TypeRef::array("int", 2),
            dims: vec![AstExpr::int(1), AstExpr::int(2)],
        })],
    ))
    .unwrap();
    let s = stmts(&m);
    assert_eq!(*s[0], assign_var("int_temp", RhsExpr::Literal(LitValue::Int(1))));
    assert_eq!(*s[1], assign_var("int_temp1", RhsExpr::Literal(LitValue::Int(2))));
    assert_eq!(
        *s[2],
        assign_var(
            "int_arr2_temp",
            RhsExpr::NewArray {
                ty: TypeRef::array("int", 2),
                dims: vec!["int_temp".to_string(), "int_temp1".to_string()],
            }
        )
    );
}

#[test]
fn scenario_do_while() {
    // do { } while (c)  =>  Do_start_0: ; t := c;
    //                       if t != 0 goto Do_start_0; Do_end_0:
    let m = lower_method(&fixture(
        vec![("c", boolean())],
        vec![AstStmtKind::DoWhile {
            body: Box::new(AstStmt::new(AstStmtKind::Empty)),
            cond: AstExpr::name("c"),
        }],
    ))
    .unwrap();
    let start = m.find_label("Do_start_0").expect("Do_start_0");
    let end = m.find_label("Do_end_0").expect("Do_end_0");
    assert!(start < end);
    let s = stmts(&m);
    assert_eq!(*s[start + 1], assign_var("boolean_temp", RhsExpr::Var("c".to_string())));
    assert_eq!(
        *s[start + 2],
        IrStmt::If {
            left: "boolean_temp".to_string(),
            op: CmpOp::Ne,
            right: CondOperand::Int(0),
            target: "Do_start_0".to_string(),
        }
    );
}

#[test]
fn scenario_binary_operands_load_into_temps() {
    // int c = a + b  =>  t1 := a; t2 := b; t3 := t1 + t2; c := t3;
    let m = lower_method(&fixture(
        vec![("a", int()), ("b", int())],
        vec![AstStmtKind::LocalDecl {
            ty: int(),
            name: "c".to_string(),
            init: Some(AstExpr::Binary {
                op: AstBinOp::Arith(BinOp::Add),
                left: Box::new(AstExpr::name("a")),
                right: Box::new(AstExpr::name("b")),
            }),
        }],
    ))
    .unwrap();
    let s = stmts(&m);
    assert_eq!(*s[0], assign_var("int_temp", RhsExpr::Var("a".to_string())));
    assert_eq!(*s[1], assign_var("int_temp1", RhsExpr::Var("b".to_string())));
    assert_eq!(
        *s[2],
        assign_var(
            "int_temp2",
            RhsExpr::Binary {
                op: BinOp::Add,
                left: "int_temp".to_string(),
                right: "int_temp1".to_string(),
            }
        )
    );
    assert_eq!(*s[3], assign_var("c", RhsExpr::Var("int_temp2".to_string())));
}

#[test]
fn scenario_comparison_expands_to_diamond() {
    // a == b  =>  t1 := a; t2 := b; if t1 == t2 goto L0;
    //             t3 := 0; goto L1; L0: t3 := 1; L1:
    let m = lower_method(&fixture(
        vec![("a", int()), ("b", int())],
        vec![AstStmtKind::LocalDecl {
            ty: boolean(),
            name: "r".to_string(),
            init: Some(AstExpr::Binary {
                op: AstBinOp::Cmp(CmpOp::Eq),
                left: Box::new(AstExpr::name("a")),
                right: Box::new(AstExpr::name("b")),
            }),
        }],
    ))
    .unwrap();
    let s = stmts(&m);
    assert_eq!(*s[0], assign_var("int_temp", RhsExpr::Var("a".to_string())));
    assert_eq!(*s[1], assign_var("int_temp1", RhsExpr::Var("b".to_string())));
    assert_eq!(
        *s[2],
        IrStmt::If {
            left: "int_temp".to_string(),
            op: CmpOp::Eq,
            right: CondOperand::Var("int_temp1".to_string()),
            target: "Label0".to_string(),
        }
    );
    assert_eq!(*s[3], assign_var("boolean_temp", RhsExpr::Literal(LitValue::Int(0))));
    assert_eq!(
        *s[4],
        IrStmt::Goto {
            target: "Label1".to_string()
        }
    );
    assert_eq!(m.locations[5].label, Label::Named("Label0".to_string()));
    assert_eq!(*s[6], assign_var("boolean_temp", RhsExpr::Literal(LitValue::Int(1))));
    assert_eq!(m.locations[7].label, Label::Named("Label1".to_string()));
    assert_eq!(*s[8], assign_var("r", RhsExpr::Var("boolean_temp".to_string())));
}

#[test]
fn scenario_logical_not() {
    // !b  =>  t := b; if t != 0 goto L0; t := 1; goto L1; L0: t := 0; L1:
    let m = lower_method(&fixture(
        vec![("b", boolean())],
        vec![AstStmtKind::LocalDecl {
            ty: boolean(),
            name: "r".to_string(),
            init: Some(AstExpr::Unary {
                op: AstUnOp::Not,
                operand: Box::new(AstExpr::name("b")),
            }),
        }],
    ))
    .unwrap();
    let s = stmts(&m);
    assert_eq!(*s[0], assign_var("boolean_temp", RhsExpr::Var("b".to_string())));
    assert_eq!(
        *s[1],
        IrStmt::If {
            left: "boolean_temp".to_string(),
            op: CmpOp::Ne,
            right: CondOperand::Int(0),
            target: "Label0".to_string(),
        }
    );
    assert_eq!(*s[2], assign_var("boolean_temp", RhsExpr::Literal(LitValue::Int(1))));
    assert_eq!(*s[4], assign_var("boolean_temp", RhsExpr::Literal(LitValue::Int(0))));
}

// ── control flow and labels ────────────────────────────────────────────

#[test]
fn test_if_else_diamond() {
    let m = lower_method(&fixture(
        vec![("c", boolean())],
        vec![AstStmtKind::If {
            cond: AstExpr::name("c"),
            then_branch: Box::new(AstStmt::new(AstStmtKind::Empty)),
            else_branch: Some(Box::new(AstStmt::new(AstStmtKind::Empty))),
        }],
    ))
    .unwrap();
    let s = stmts(&m);
    // t := c; if t == 0 goto Label0; goto Label1; Label0: ; Label1: ; return
    assert_eq!(
        *s[1],
        IrStmt::If {
            left: "boolean_temp".to_string(),
            op: CmpOp::Eq,
            right: CondOperand::Int(0),
            target: "Label0".to_string(),
        }
    );
    assert!(m.find_label("Label0").is_some());
    assert!(m.find_label("Label1").is_some());
}

#[test]
fn test_while_break_continue_consume_innermost() {
    let m = lower_method(&fixture(
        vec![("c", boolean())],
        vec![AstStmtKind::While {
            cond: AstExpr::name("c"),
            body: Box::new(AstStmt::new(AstStmtKind::Block(vec![
                AstStmt::new(AstStmtKind::Continue { label: None }),
                AstStmt::new(AstStmtKind::Break { label: None }),
            ]))),
        }],
    ))
    .unwrap();
    let gotos: Vec<&str> = m
        .locations
        .iter()
        .filter_map(|l| match &l.stmt {
            IrStmt::Goto { target } => Some(target.as_str()),
            _ => None,
        })
        .collect();
    assert!(gotos.contains(&"While_start_0"));
    assert!(gotos.contains(&"While_end_0"));
}

#[test]
fn test_labeled_loop_break_and_continue() {
    let m = lower_method(&fixture(
        vec![("c", boolean())],
        vec![AstStmtKind::Labeled {
            label: "outer".to_string(),
            body: Box::new(AstStmt::new(AstStmtKind::While {
                cond: AstExpr::name("c"),
                body: Box::new(AstStmt::new(AstStmtKind::Block(vec![
                    AstStmt::new(AstStmtKind::Continue {
                        label: Some("outer".to_string()),
                    }),
                    AstStmt::new(AstStmtKind::Break {
                        label: Some("outer".to_string()),
                    }),
                ]))),
            })),
        }],
    ))
    .unwrap();
    assert!(m.find_label("outer").is_some());
    let gotos: Vec<&str> = m
        .locations
        .iter()
        .filter_map(|l| match &l.stmt {
            IrStmt::Goto { target } => Some(target.as_str()),
            _ => None,
        })
        .collect();
    // continue outer re-enters at the loop head, break outer at the end;
    // the user label is never a jump target
    assert!(gotos.contains(&"While_start_0"));
    assert!(gotos.contains(&"While_end_0"));
    assert!(!gotos.contains(&"outer"));
}

#[test]
fn test_labeled_for_continue_targets_update_section() {
    // continue outer must re-enter at For_start_0 (the update section);
    // jumping to the user label would re-run the initializer
    let m = lower_method(&fixture(
        vec![("c", boolean())],
        vec![AstStmtKind::Labeled {
            label: "outer".to_string(),
            body: Box::new(AstStmt::new(AstStmtKind::For {
                init: Some(Box::new(AstStmt::new(AstStmtKind::LocalDecl {
                    ty: int(),
                    name: "i".to_string(),
                    init: Some(AstExpr::int(0)),
                }))),
                cond: Some(AstExpr::name("c")),
                update: Some(AstExpr::IncDec {
                    target: Box::new(AstExpr::name("i")),
                    op: IncDecOp::PostInc,
                }),
                body: Box::new(AstStmt::new(AstStmtKind::Block(vec![AstStmt::new(
                    AstStmtKind::Continue {
                        label: Some("outer".to_string()),
                    },
                )]))),
            })),
        }],
    ))
    .unwrap();
    assert!(m.find_label("outer").is_some());
    let start = m.find_label("For_start_0").expect("For_start_0");
    // the user label sits before the initializer, the start label after it
    assert!(m.find_label("outer").unwrap() < start);
    let gotos: Vec<&str> = m
        .locations
        .iter()
        .filter_map(|l| match &l.stmt {
            IrStmt::Goto { target } => Some(target.as_str()),
            _ => None,
        })
        .collect();
    // labeled continue plus the loop-back edge, both at the update label
    assert_eq!(gotos.iter().filter(|t| **t == "For_start_0").count(), 2);
    assert!(!gotos.contains(&"outer"));
}

#[test]
fn test_reserved_keyword_label_escaped() {
    let m = lower_method(&fixture(
        vec![],
        vec![AstStmtKind::Labeled {
            label: "while".to_string(),
            body: Box::new(AstStmt::new(AstStmtKind::Empty)),
        }],
    ))
    .unwrap();
    assert!(m.find_label("while_label").is_some());
}

#[test]
fn test_switch_dispatch_and_break() {
    let m = lower_method(&fixture(
        vec![("x", int())],
        vec![AstStmtKind::Switch {
            scrutinee: AstExpr::name("x"),
            cases: vec![
                SwitchCase {
                    value: 1,
                    body: vec![AstStmt::new(AstStmtKind::Break { label: None })],
                },
                SwitchCase {
                    value: 2,
                    body: vec![],
                },
            ],
            default: Some(vec![]),
        }],
    ))
    .unwrap();
    assert!(m.find_label("Switch_start_0").is_some());
    assert!(m.find_label("Switch_end_0").is_some());
    let case_tests = m
        .locations
        .iter()
        .filter(|l| {
            matches!(
                &l.stmt,
                IrStmt::If {
                    right: CondOperand::Int(v),
                    ..
                } if *v == 1 || *v == 2
            )
        })
        .count();
    assert_eq!(case_tests, 2);
    let breaks = m
        .locations
        .iter()
        .filter(|l| matches!(&l.stmt, IrStmt::Goto { target } if target == "Switch_end_0"))
        .count();
    assert!(breaks >= 1);
}

#[test]
fn test_break_outside_loop_is_invariant_violation() {
    let err = lower_method(&fixture(
        vec![],
        vec![AstStmtKind::Break { label: None }],
    ))
    .unwrap_err();
    assert!(matches!(err, HeapgraphError::Invariant(_)));
}

#[test]
fn test_unresolved_name_aborts_method() {
    let err = lower_method(&fixture(
        vec![],
        vec![AstStmtKind::Expr(AstExpr::name("ghost"))],
    ))
    .unwrap_err();
    assert!(matches!(err, HeapgraphError::Lowering { .. }));
    assert!(err.to_string().contains("ghost"));
}

// ── statements with richer shapes ──────────────────────────────────────

#[test]
fn test_assert_expands_to_throw() {
    let m = lower_method(&fixture(
        vec![("c", boolean())],
        vec![AstStmtKind::Assert {
            cond: AstExpr::name("c"),
            message: None,
        }],
    ))
    .unwrap();
    let s = stmts(&m);
    assert!(matches!(
        s[1],
        IrStmt::If {
            op: CmpOp::Ne,
            right: CondOperand::Int(0),
            ..
        }
    ));
    assert!(s.iter().any(|st| matches!(
        st,
        IrStmt::Assign {
            rhs: RhsExpr::New { ty },
            ..
        } if ty.name == "java.lang.AssertionError"
    )));
    assert!(s.iter().any(|st| matches!(
        st,
        IrStmt::Call {
            signature,
            kind: CallKind::Direct,
            ..
        } if signature.is_constructor()
    )));
    assert!(s.iter().any(|st| matches!(st, IrStmt::Throw { .. })));
}

#[test]
fn test_try_catch_records_clause_and_binds_exception() {
    let exc = TypeRef::object("java.lang.Exception");
    let m = lower_method(&fixture(
        vec![],
        vec![AstStmtKind::Try {
            body: vec![AstStmt::new(AstStmtKind::Empty)],
            catches: vec![CatchArm {
                exception: exc.clone(),
                var: "e".to_string(),
                body: vec![],
            }],
            finally: None,
        }],
    ))
    .unwrap();
    assert_eq!(m.catches.len(), 1);
    let clause = &m.catches[0];
    assert_eq!(clause.exception, exc);
    assert!(m.find_label(&clause.handler_label).is_some());
    assert!(m.locations.iter().any(|l| matches!(
        &l.stmt,
        IrStmt::Assign {
            lhs: LhsExpr::Var(v),
            rhs: RhsExpr::CaughtException { .. }
        } if v == "e"
    )));
}

#[test]
fn test_call_kinds() {
    let virtual_sig = MethodSignature::new("com.example.Box", "poke", vec![], TypeRef::void());
    let static_sig = MethodSignature::new("com.example.Util", "help", vec![], TypeRef::void());
    let iface_sig = MethodSignature::new("java.lang.Runnable", "run", vec![], TypeRef::void());
    let m = lower_method(&fixture(
        vec![
            ("b", TypeRef::object("com.example.Box")),
            ("r", TypeRef::object("java.lang.Runnable")),
        ],
        vec![
            AstStmtKind::Expr(AstExpr::Call {
                receiver: Receiver::Expr(Box::new(AstExpr::name("b"))),
                signature: virtual_sig,
                args: vec![],
                props: CallProps::default(),
            }),
            AstStmtKind::Expr(AstExpr::Call {
                receiver: Receiver::None,
                signature: static_sig,
                args: vec![],
                props: CallProps::default(),
            }),
            AstStmtKind::Expr(AstExpr::Call {
                receiver: Receiver::Expr(Box::new(AstExpr::name("r"))),
                signature: iface_sig,
                args: vec![],
                props: CallProps {
                    is_interface: true,
                    is_private: false,
                },
            }),
        ],
    ))
    .unwrap();
    let kinds: Vec<CallKind> = m
        .locations
        .iter()
        .filter_map(|l| match &l.stmt {
            IrStmt::Call { kind, .. } => Some(*kind),
            _ => None,
        })
        .collect();
    assert_eq!(kinds, vec![CallKind::Virtual, CallKind::Static, CallKind::Interface]);
}

#[test]
fn test_shadowed_declaration_of_other_type_is_renamed() {
    let m = lower_method(&fixture(
        vec![],
        vec![
            AstStmtKind::LocalDecl {
                ty: int(),
                name: "x".to_string(),
                init: None,
            },
            AstStmtKind::Block(vec![AstStmt::new(AstStmtKind::LocalDecl {
                ty: object(),
                name: "x".to_string(),
                init: Some(AstExpr::Literal(AstLit::Null)),
            })]),
        ],
    ))
    .unwrap();
    assert!(m.locals.contains_key("x"));
    assert!(m.locals.contains_key("x_1"));
    assert_eq!(m.locals["x_1"], object());
}

// ── printer conventions ────────────────────────────────────────────────

#[test]
fn test_printer_conventions() {
    let callee = MethodSignature::new("com.example.Util", "help", vec![], TypeRef::void());
    let m = lower_method(&fixture(
        vec![],
        vec![AstStmtKind::Expr(AstExpr::Call {
            receiver: Receiver::None,
            signature: callee,
            args: vec![],
            props: CallProps::default(),
        })],
    ))
    .unwrap();
    let text = IrPrinter::for_method(&m).print_method(&m);
    // zero-padded generated labels
    assert!(text.contains("#L0"), "text was: {}", text);
    // mandatory call annotations with a backticked signature
    assert!(text.contains("@signature `com.example.Util.help():void`"));
    assert!(text.contains("@kind static"));
    // synthesized void return annotation
    assert!(text.contains("return @kind void;"));
}

#[test]
fn test_printer_is_stable_under_reprint() {
    let m = lower_method(&fixture(
        vec![("a", int()), ("b", int())],
        vec![AstStmtKind::LocalDecl {
            ty: boolean(),
            name: "r".to_string(),
            init: Some(AstExpr::Binary {
                op: AstBinOp::Cmp(CmpOp::Lt),
                left: Box::new(AstExpr::name("a")),
                right: Box::new(AstExpr::name("b")),
            }),
        }],
    ))
    .unwrap();
    let printer = IrPrinter::for_method(&m);
    let once = printer.print_method(&m);
    let twice = printer.print_method(&m);
    assert_eq!(once, twice);
}
