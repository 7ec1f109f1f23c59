//! AST → three-address IR translation
//!
//! A recursive translator threading explicit per-method context (variable
//! table, label allocator, output buffer) and returning the temporary that
//! holds each expression's value. Evaluation order of side effects is
//! preserved; every non-trivial subexpression lands in a fresh temporary;
//! every branch target is an explicit label.
//!
//! Control-flow expansions:
//! - `if (c) A else B` → `t := c; if t == 0 goto Lelse; A; goto Lend;
//!   Lelse: B; Lend:`
//! - `do { B } while (c)` → `Do_start_N: B; t := c; if t != 0 goto
//!   Do_start_N; Do_end_N:`
//! - comparisons, `!`, `&&`, `||`, and ternaries expand to conditional
//!   flow producing a final temporary
//! - `assert c` → `t := c; if t != 0 goto LabelN; e := new AssertionError;
//!   call <init>; throw e; LabelN:`

use crate::errors::{HeapgraphError, Result};
use crate::features::ir::domain::{
    CallKind, CatchClause, CmpOp, CondOperand, IrStmt, Label, LhsExpr, LitValue, Location,
    MethodIr, ReturnKind, RhsExpr,
};
use crate::features::lowering::domain::ast::{
    AstBinOp, AstExpr, AstLit, AstMethod, AstStmt, AstStmtKind, AstUnOp, CallProps, CatchArm,
    IncDecOp, Receiver, SwitchCase,
};
use crate::features::lowering::infrastructure::labels::{LabelAllocator, LoopKind};
use crate::features::lowering::infrastructure::locals::VarTable;
use crate::shared::models::{MethodSignature, Span, TypeRef};

/// Lower one method; structural failures abort the whole method and no
/// partial IR is returned
pub fn lower_method(ast: &AstMethod) -> Result<MethodIr> {
    MethodTranslator::new(ast).run()
}

/// Assignment target with its base/index evaluated exactly once
enum TargetRef {
    Var(String),
    Field {
        base: String,
        field: String,
        ty: TypeRef,
    },
    Static {
        fqn: String,
        ty: TypeRef,
    },
    Index {
        base: String,
        index: String,
        ty: TypeRef,
    },
}

impl TargetRef {
    fn ty<'a>(&'a self, vars: &'a VarTable) -> Option<&'a TypeRef> {
        match self {
            TargetRef::Var(v) => vars.type_of(v),
            TargetRef::Field { ty, .. } | TargetRef::Static { ty, .. } | TargetRef::Index { ty, .. } => {
                Some(ty)
            }
        }
    }
}

struct MethodTranslator<'a> {
    ast: &'a AstMethod,
    vars: VarTable,
    labels: LabelAllocator,
    out: Vec<Location>,
    catches: Vec<CatchClause>,
    current_span: Option<Span>,
}

impl<'a> MethodTranslator<'a> {
    fn new(ast: &'a AstMethod) -> Self {
        let this_ty = TypeRef::object(ast.declaring_class.clone());
        let vars = if ast.is_static {
            VarTable::new(None, None, &ast.params)
        } else {
            VarTable::new(Some("this"), Some(&this_ty), &ast.params)
        };
        Self {
            ast,
            vars,
            labels: LabelAllocator::new(),
            out: Vec::new(),
            catches: Vec::new(),
            current_span: None,
        }
    }

    fn run(mut self) -> Result<MethodIr> {
        for stmt in &self.ast.body {
            self.lower_stmt(stmt)?;
        }

        // Void methods not ending in return/throw get a synthesized return
        let needs_return = self.ast.signature.return_type.is_void()
            && !matches!(
                self.out.last().map(|l| &l.stmt),
                Some(IrStmt::Return { .. }) | Some(IrStmt::Throw { .. })
            );
        if needs_return {
            self.emit(IrStmt::Return {
                value: None,
                kind: Some(ReturnKind::Void),
            });
        }

        self.labels.verify_balanced()?;

        let mut exclude: Vec<&str> = self.ast.params.iter().map(|(n, _)| n.as_str()).collect();
        if !self.ast.is_static {
            exclude.push("this");
        }
        let locals = self.vars.into_locals(&exclude);

        Ok(MethodIr {
            signature: self.ast.signature.clone(),
            declaring_class: self.ast.declaring_class.clone(),
            is_static: self.ast.is_static,
            this_name: if self.ast.is_static {
                None
            } else {
                Some("this".to_string())
            },
            params: self.ast.params.clone(),
            locals,
            locations: self.out,
            catches: self.catches,
        })
    }

    // ── emission ───────────────────────────────────────────────────────

    fn emit(&mut self, stmt: IrStmt) {
        let display = self.labels.next_line();
        self.out.push(Location {
            index: self.out.len(),
            label: Label::Std(display),
            stmt,
        });
    }

    fn emit_label(&mut self, name: String) {
        self.labels.next_named();
        self.out.push(Location {
            index: self.out.len(),
            label: Label::Named(name),
            stmt: IrStmt::Skip,
        });
    }

    fn err(&self, message: impl Into<String>) -> HeapgraphError {
        HeapgraphError::lowering(
            self.ast.signature.to_string(),
            message,
            self.current_span,
        )
    }

    // ── statements ─────────────────────────────────────────────────────

    fn lower_stmt(&mut self, stmt: &AstStmt) -> Result<()> {
        if stmt.span.is_some() {
            self.current_span = stmt.span;
        }
        match &stmt.kind {
            AstStmtKind::Block(stmts) => {
                self.vars.push_scope();
                for s in stmts {
                    self.lower_stmt(s)?;
                }
                self.vars.pop_scope();
                Ok(())
            }
            AstStmtKind::LocalDecl { ty, name, init } => {
                let out_name = self.vars.declare(name, ty);
                if let Some(e) = init {
                    let v = self.lower_value(e)?;
                    self.emit(IrStmt::Assign {
                        lhs: LhsExpr::Var(out_name),
                        rhs: RhsExpr::Var(v),
                    });
                }
                Ok(())
            }
            AstStmtKind::Expr(e) => self.lower_expr_stmt(e),
            AstStmtKind::If {
                cond,
                then_branch,
                else_branch,
            } => self.lower_if(cond, then_branch, else_branch.as_deref()),
            AstStmtKind::While { cond, body } => self.lower_while(cond, body, None),
            AstStmtKind::DoWhile { body, cond } => self.lower_do_while(body, cond, None),
            AstStmtKind::For {
                init,
                cond,
                update,
                body,
            } => self.lower_for(init.as_deref(), cond.as_ref(), update.as_ref(), body, None),
            AstStmtKind::Switch {
                scrutinee,
                cases,
                default,
            } => self.lower_switch(scrutinee, cases, default.as_deref(), None),
            AstStmtKind::Break { label } => {
                let target = self.labels.break_target(label.as_deref())?;
                self.emit(IrStmt::Goto { target });
                Ok(())
            }
            AstStmtKind::Continue { label } => {
                let target = self.labels.continue_target(label.as_deref())?;
                self.emit(IrStmt::Goto { target });
                Ok(())
            }
            AstStmtKind::Return(value) => {
                match value {
                    Some(e) => {
                        let v = self.lower_value(e)?;
                        let kind = if self.ast.signature.return_type.is_object() {
                            Some(ReturnKind::Object)
                        } else {
                            None
                        };
                        self.emit(IrStmt::Return {
                            value: Some(v),
                            kind,
                        });
                    }
                    None => {
                        self.emit(IrStmt::Return {
                            value: None,
                            kind: Some(ReturnKind::Void),
                        });
                    }
                }
                Ok(())
            }
            AstStmtKind::Throw(e) => {
                let v = self.lower_value(e)?;
                self.emit(IrStmt::Throw { var: v });
                Ok(())
            }
            AstStmtKind::Labeled { label, body } => self.lower_labeled(label, body),
            AstStmtKind::Try {
                body,
                catches,
                finally,
            } => self.lower_try(body, catches, finally.as_deref()),
            AstStmtKind::Assert { cond, message } => self.lower_assert(cond, message.as_ref()),
            AstStmtKind::Empty => Ok(()),
        }
    }

    fn lower_expr_stmt(&mut self, e: &AstExpr) -> Result<()> {
        match e {
            AstExpr::Call {
                receiver,
                signature,
                args,
                props,
            } => {
                self.lower_call(receiver, signature, args, *props, false)?;
                Ok(())
            }
            _ => {
                self.lower_value(e)?;
                Ok(())
            }
        }
    }

    fn lower_if(
        &mut self,
        cond: &AstExpr,
        then_branch: &AstStmt,
        else_branch: Option<&AstStmt>,
    ) -> Result<()> {
        let c = self.lower_cond(cond)?;
        match else_branch {
            Some(else_stmt) => {
                let else_lbl = self.labels.fresh_branch();
                let end_lbl = self.labels.fresh_branch();
                self.emit(IrStmt::If {
                    left: c,
                    op: CmpOp::Eq,
                    right: CondOperand::Int(0),
                    target: else_lbl.clone(),
                });
                self.lower_stmt(then_branch)?;
                self.emit(IrStmt::Goto {
                    target: end_lbl.clone(),
                });
                self.emit_label(else_lbl);
                self.lower_stmt(else_stmt)?;
                self.emit_label(end_lbl);
            }
            None => {
                let end_lbl = self.labels.fresh_branch();
                self.emit(IrStmt::If {
                    left: c,
                    op: CmpOp::Eq,
                    right: CondOperand::Int(0),
                    target: end_lbl.clone(),
                });
                self.lower_stmt(then_branch)?;
                self.emit_label(end_lbl);
            }
        }
        Ok(())
    }

    fn lower_while(
        &mut self,
        cond: &AstExpr,
        body: &AstStmt,
        user_label: Option<String>,
    ) -> Result<()> {
        let (start, end) = self.labels.loop_labels(LoopKind::While);
        if let Some(u) = user_label {
            self.labels.register_labeled(&u, Some(&start), &end);
        }
        self.emit_label(start.clone());
        let c = self.lower_cond(cond)?;
        self.emit(IrStmt::If {
            left: c,
            op: CmpOp::Eq,
            right: CondOperand::Int(0),
            target: end.clone(),
        });
        self.labels.push_loop(&start, &end);
        self.lower_stmt(body)?;
        self.labels.pop_loop()?;
        self.emit(IrStmt::Goto { target: start });
        self.emit_label(end);
        Ok(())
    }

    fn lower_do_while(
        &mut self,
        body: &AstStmt,
        cond: &AstExpr,
        user_label: Option<String>,
    ) -> Result<()> {
        let (start, end) = self.labels.loop_labels(LoopKind::Do);
        if let Some(u) = user_label {
            self.labels.register_labeled(&u, Some(&start), &end);
        }
        self.emit_label(start.clone());
        self.labels.push_loop(&start, &end);
        self.lower_stmt(body)?;
        self.labels.pop_loop()?;
        let c = self.lower_cond(cond)?;
        self.emit(IrStmt::If {
            left: c,
            op: CmpOp::Ne,
            right: CondOperand::Int(0),
            target: start,
        });
        self.emit_label(end);
        Ok(())
    }

    fn lower_for(
        &mut self,
        init: Option<&AstStmt>,
        cond: Option<&AstExpr>,
        update: Option<&AstExpr>,
        body: &AstStmt,
        user_label: Option<String>,
    ) -> Result<()> {
        self.vars.push_scope();
        if let Some(s) = init {
            self.lower_stmt(s)?;
        }
        let (start, end) = self.labels.loop_labels(LoopKind::For);
        if let Some(u) = user_label {
            self.labels.register_labeled(&u, Some(&start), &end);
        }
        // The start label fronts the update section so `continue` runs the
        // update; the first iteration jumps straight to the condition.
        let cond_lbl = self.labels.fresh_branch();
        self.emit(IrStmt::Goto {
            target: cond_lbl.clone(),
        });
        self.emit_label(start.clone());
        if let Some(u) = update {
            self.lower_value(u)?;
        }
        self.emit_label(cond_lbl);
        if let Some(c) = cond {
            let cv = self.lower_cond(c)?;
            self.emit(IrStmt::If {
                left: cv,
                op: CmpOp::Eq,
                right: CondOperand::Int(0),
                target: end.clone(),
            });
        }
        self.labels.push_loop(&start, &end);
        self.lower_stmt(body)?;
        self.labels.pop_loop()?;
        self.emit(IrStmt::Goto { target: start });
        self.emit_label(end);
        self.vars.pop_scope();
        Ok(())
    }

    fn lower_switch(
        &mut self,
        scrutinee: &AstExpr,
        cases: &[SwitchCase],
        default: Option<&[AstStmt]>,
        user_label: Option<String>,
    ) -> Result<()> {
        let t = self.lower_operand(scrutinee)?;
        let (start, end) = self.labels.switch_labels();
        if let Some(u) = user_label {
            self.labels.register_labeled(&u, None, &end);
        }
        self.emit_label(start);
        let case_labels: Vec<String> = cases.iter().map(|_| self.labels.fresh_branch()).collect();
        let default_label = default.map(|_| self.labels.fresh_branch());
        for (case, lbl) in cases.iter().zip(&case_labels) {
            self.emit(IrStmt::If {
                left: t.clone(),
                op: CmpOp::Eq,
                right: CondOperand::Int(case.value),
                target: lbl.clone(),
            });
        }
        self.emit(IrStmt::Goto {
            target: default_label.clone().unwrap_or_else(|| end.clone()),
        });
        self.labels.push_switch(&end);
        for (case, lbl) in cases.iter().zip(case_labels) {
            self.emit_label(lbl);
            self.vars.push_scope();
            for s in &case.body {
                self.lower_stmt(s)?;
            }
            self.vars.pop_scope();
            // fall through into the next case
        }
        if let (Some(stmts), Some(lbl)) = (default, default_label) {
            self.emit_label(lbl);
            self.vars.push_scope();
            for s in stmts {
                self.lower_stmt(s)?;
            }
            self.vars.pop_scope();
        }
        self.labels.pop_switch()?;
        self.emit_label(end);
        Ok(())
    }

    fn lower_labeled(&mut self, label: &str, body: &AstStmt) -> Result<()> {
        let escaped = self.labels.escape_user_label(label);
        self.emit_label(escaped.clone());
        match &body.kind {
            AstStmtKind::While { cond, body } => self.lower_while(cond, body, Some(escaped)),
            AstStmtKind::DoWhile { body, cond } => self.lower_do_while(body, cond, Some(escaped)),
            AstStmtKind::For {
                init,
                cond,
                update,
                body,
            } => self.lower_for(
                init.as_deref(),
                cond.as_ref(),
                update.as_ref(),
                body,
                Some(escaped),
            ),
            AstStmtKind::Switch {
                scrutinee,
                cases,
                default,
            } => self.lower_switch(scrutinee, cases, default.as_deref(), Some(escaped)),
            _ => {
                let end = self.labels.fresh_branch();
                self.labels.register_labeled(&escaped, None, &end);
                self.lower_stmt(body)?;
                self.emit_label(end);
                Ok(())
            }
        }
    }

    fn lower_try(
        &mut self,
        body: &[AstStmt],
        catches: &[CatchArm],
        finally: Option<&[AstStmt]>,
    ) -> Result<()> {
        let try_start = self.labels.fresh_branch();
        let try_end = self.labels.fresh_branch();
        let after = self.labels.fresh_branch();
        self.emit_label(try_start.clone());
        self.vars.push_scope();
        for s in body {
            self.lower_stmt(s)?;
        }
        self.vars.pop_scope();
        self.emit_label(try_end.clone());
        if let Some(fin) = finally {
            self.lower_finally(fin)?;
        }
        self.emit(IrStmt::Goto {
            target: after.clone(),
        });
        for arm in catches {
            let handler = self.labels.fresh_branch();
            self.catches.push(CatchClause {
                exception: arm.exception.clone(),
                from_label: try_start.clone(),
                to_label: try_end.clone(),
                handler_label: handler.clone(),
            });
            self.emit_label(handler);
            self.vars.push_scope();
            let var = self.vars.declare(&arm.var, &arm.exception);
            self.emit(IrStmt::Assign {
                lhs: LhsExpr::Var(var),
                rhs: RhsExpr::CaughtException {
                    ty: arm.exception.clone(),
                },
            });
            for s in &arm.body {
                self.lower_stmt(s)?;
            }
            self.vars.pop_scope();
            if let Some(fin) = finally {
                self.lower_finally(fin)?;
            }
            self.emit(IrStmt::Goto {
                target: after.clone(),
            });
        }
        self.emit_label(after);
        Ok(())
    }

    /// Finally blocks are replicated on each exit path
    fn lower_finally(&mut self, stmts: &[AstStmt]) -> Result<()> {
        self.vars.push_scope();
        for s in stmts {
            self.lower_stmt(s)?;
        }
        self.vars.pop_scope();
        Ok(())
    }

    fn lower_assert(&mut self, cond: &AstExpr, message: Option<&AstExpr>) -> Result<()> {
        let c = self.lower_cond(cond)?;
        let skip = self.labels.fresh_branch();
        self.emit(IrStmt::If {
            left: c,
            op: CmpOp::Ne,
            right: CondOperand::Int(0),
            target: skip.clone(),
        });
        let err_ty = TypeRef::object("java.lang.AssertionError");
        let err = self.vars.fresh_temp(&err_ty);
        self.emit(IrStmt::Assign {
            lhs: LhsExpr::Var(err.clone()),
            rhs: RhsExpr::New { ty: err_ty.clone() },
        });
        let (ctor_params, ctor_args) = match message {
            Some(m) => {
                let mv = self.lower_value(m)?;
                (vec![self.type_of(m)?], vec![mv])
            }
            None => (vec![], vec![]),
        };
        let ctor = MethodSignature::new(err_ty.name.clone(), "<init>", ctor_params, TypeRef::void());
        self.emit(IrStmt::Call {
            lhs: None,
            signature: ctor,
            recv: Some(err.clone()),
            args: ctor_args,
            kind: CallKind::Direct,
        });
        self.emit(IrStmt::Throw { var: err });
        self.emit_label(skip);
        Ok(())
    }

    // ── expressions ────────────────────────────────────────────────────

    /// Lower to a variable holding the value. Plain names resolve to their
    /// output name without a copy; everything else lands in a temporary.
    fn lower_value(&mut self, e: &AstExpr) -> Result<String> {
        match e {
            AstExpr::Literal(lit) => {
                let ty = lit_type(lit);
                let t = self.vars.fresh_temp(&ty);
                self.emit(IrStmt::Assign {
                    lhs: LhsExpr::Var(t.clone()),
                    rhs: RhsExpr::Literal(lower_lit(lit)),
                });
                Ok(t)
            }
            AstExpr::Name(n) => self
                .vars
                .resolve(n)
                .map(|s| s.to_string())
                .ok_or_else(|| self.err(format!("unresolved name `{}`", n))),
            AstExpr::This => {
                if self.ast.is_static {
                    Err(self.err("`this` in static method"))
                } else {
                    Ok("this".to_string())
                }
            }
            AstExpr::Field { base, field, ty } => {
                let b = self.lower_value(base)?;
                let t = self.vars.fresh_temp(ty);
                self.emit(IrStmt::Assign {
                    lhs: LhsExpr::Var(t.clone()),
                    rhs: RhsExpr::FieldLoad {
                        base: b,
                        field: field.clone(),
                        ty: ty.clone(),
                    },
                });
                Ok(t)
            }
            AstExpr::StaticField { fqn, ty } => {
                let t = self.vars.fresh_temp(ty);
                self.emit(IrStmt::Assign {
                    lhs: LhsExpr::Var(t.clone()),
                    rhs: RhsExpr::StaticLoad {
                        fqn: fqn.clone(),
                        ty: ty.clone(),
                    },
                });
                Ok(t)
            }
            AstExpr::Index { base, index } => {
                let elem = self
                    .type_of(base)?
                    .elem_type()
                    .ok_or_else(|| self.err("indexing into a non-array"))?;
                let b = self.lower_value(base)?;
                let i = self.lower_value(index)?;
                let t = self.vars.fresh_temp(&elem);
                self.emit(IrStmt::Assign {
                    lhs: LhsExpr::Var(t.clone()),
                    rhs: RhsExpr::ArrayLoad {
                        base: b,
                        index: i,
                        ty: elem,
                    },
                });
                Ok(t)
            }
            AstExpr::Call {
                receiver,
                signature,
                args,
                props,
            } => self
                .lower_call(receiver, signature, args, *props, true)?
                .ok_or_else(|| self.err("void call used as a value")),
            AstExpr::New { ctor, args } => {
                let ty = TypeRef::object(ctor.owner.clone());
                let t = self.vars.fresh_temp(&ty);
                self.emit(IrStmt::Assign {
                    lhs: LhsExpr::Var(t.clone()),
                    rhs: RhsExpr::New { ty },
                });
                let arg_vars = self.lower_args(args)?;
                self.emit(IrStmt::Call {
                    lhs: None,
                    signature: ctor.clone(),
                    recv: Some(t.clone()),
                    args: arg_vars,
                    kind: CallKind::Direct,
                });
                Ok(t)
            }
            AstExpr::NewArray { ty, dims } => {
                let mut dim_vars = Vec::with_capacity(dims.len());
                for d in dims {
                    dim_vars.push(self.lower_value(d)?);
                }
                let t = self.vars.fresh_temp(ty);
                self.emit(IrStmt::Assign {
                    lhs: LhsExpr::Var(t.clone()),
                    rhs: RhsExpr::NewArray {
                        ty: ty.clone(),
                        dims: dim_vars,
                    },
                });
                Ok(t)
            }
            AstExpr::Binary { op, left, right } => self.lower_binary(*op, left, right),
            AstExpr::Unary { op, operand } => self.lower_unary(*op, operand),
            AstExpr::Assign { target, op, value } => self.lower_assign(target, *op, value),
            AstExpr::IncDec { target, op } => self.lower_inc_dec(target, *op),
            AstExpr::Ternary {
                cond,
                then_val,
                else_val,
            } => self.lower_ternary(cond, then_val, else_val),
            AstExpr::Cast { ty, expr } => {
                let v = self.lower_value(expr)?;
                let t = self.vars.fresh_temp(ty);
                self.emit(IrStmt::Assign {
                    lhs: LhsExpr::Var(t.clone()),
                    rhs: RhsExpr::Cast {
                        ty: ty.clone(),
                        operand: v,
                    },
                });
                Ok(t)
            }
            AstExpr::InstanceOf { expr, ty } => {
                let v = self.lower_value(expr)?;
                let t = self.vars.fresh_temp(&TypeRef::primitive("boolean"));
                self.emit(IrStmt::Assign {
                    lhs: LhsExpr::Var(t.clone()),
                    rhs: RhsExpr::InstanceOf {
                        operand: v,
                        ty: ty.clone(),
                    },
                });
                Ok(t)
            }
        }
    }

    /// Branch conditions always read through a temporary
    fn lower_cond(&mut self, e: &AstExpr) -> Result<String> {
        self.lower_operand(e)
    }

    /// Binary/unary operands always read through a temporary
    fn lower_operand(&mut self, e: &AstExpr) -> Result<String> {
        let v = self.lower_value(e)?;
        match e {
            AstExpr::Name(_) | AstExpr::This => {
                let ty = self
                    .vars
                    .type_of(&v)
                    .cloned()
                    .ok_or_else(|| self.err(format!("untyped operand `{}`", v)))?;
                let t = self.vars.fresh_temp(&ty);
                self.emit(IrStmt::Assign {
                    lhs: LhsExpr::Var(t.clone()),
                    rhs: RhsExpr::Var(v),
                });
                Ok(t)
            }
            _ => Ok(v),
        }
    }

    fn lower_args(&mut self, args: &[AstExpr]) -> Result<Vec<String>> {
        let mut out = Vec::with_capacity(args.len());
        for a in args {
            out.push(self.lower_value(a)?);
        }
        Ok(out)
    }

    fn lower_call(
        &mut self,
        receiver: &Receiver,
        signature: &MethodSignature,
        args: &[AstExpr],
        props: CallProps,
        as_value: bool,
    ) -> Result<Option<String>> {
        let recv = match receiver {
            Receiver::None => None,
            Receiver::Super => {
                if self.ast.is_static {
                    return Err(self.err("`super` in static method"));
                }
                Some("this".to_string())
            }
            Receiver::Expr(e) => Some(self.lower_value(e)?),
        };
        let arg_vars = self.lower_args(args)?;
        let kind = match receiver {
            Receiver::None => CallKind::Static,
            Receiver::Super => CallKind::Super,
            Receiver::Expr(_) => {
                if props.is_private || signature.is_constructor() {
                    CallKind::Direct
                } else if props.is_interface {
                    CallKind::Interface
                } else {
                    CallKind::Virtual
                }
            }
        };
        let lhs = if signature.return_type.is_void() {
            None
        } else {
            Some(self.vars.fresh_temp(&signature.return_type))
        };
        if as_value && lhs.is_none() {
            return Err(self.err(format!("void call `{}` used as a value", signature)));
        }
        self.emit(IrStmt::Call {
            lhs: lhs.clone(),
            signature: signature.clone(),
            recv,
            args: arg_vars,
            kind,
        });
        Ok(lhs)
    }

    fn lower_binary(&mut self, op: AstBinOp, left: &AstExpr, right: &AstExpr) -> Result<String> {
        match op {
            AstBinOp::Arith(bin) => {
                let ty = self.type_of(left)?;
                let l = self.lower_operand(left)?;
                let r = self.lower_operand(right)?;
                let t = self.vars.fresh_temp(&ty);
                self.emit(IrStmt::Assign {
                    lhs: LhsExpr::Var(t.clone()),
                    rhs: RhsExpr::Binary {
                        op: bin,
                        left: l,
                        right: r,
                    },
                });
                Ok(t)
            }
            AstBinOp::Cmp(cmp) => {
                let l = self.lower_operand(left)?;
                let r = self.lower_operand(right)?;
                let t = self.vars.fresh_temp(&TypeRef::primitive("boolean"));
                let true_lbl = self.labels.fresh_branch();
                let end_lbl = self.labels.fresh_branch();
                self.emit(IrStmt::If {
                    left: l,
                    op: cmp,
                    right: CondOperand::Var(r),
                    target: true_lbl.clone(),
                });
                self.emit(IrStmt::Assign {
                    lhs: LhsExpr::Var(t.clone()),
                    rhs: RhsExpr::Literal(LitValue::Int(0)),
                });
                self.emit(IrStmt::Goto {
                    target: end_lbl.clone(),
                });
                self.emit_label(true_lbl);
                self.emit(IrStmt::Assign {
                    lhs: LhsExpr::Var(t.clone()),
                    rhs: RhsExpr::Literal(LitValue::Int(1)),
                });
                self.emit_label(end_lbl);
                Ok(t)
            }
            AstBinOp::And => {
                let t = self.vars.fresh_temp(&TypeRef::primitive("boolean"));
                let false_lbl = self.labels.fresh_branch();
                let end_lbl = self.labels.fresh_branch();
                let l = self.lower_cond(left)?;
                self.emit(IrStmt::If {
                    left: l,
                    op: CmpOp::Eq,
                    right: CondOperand::Int(0),
                    target: false_lbl.clone(),
                });
                let r = self.lower_cond(right)?;
                self.emit(IrStmt::If {
                    left: r,
                    op: CmpOp::Eq,
                    right: CondOperand::Int(0),
                    target: false_lbl.clone(),
                });
                self.emit(IrStmt::Assign {
                    lhs: LhsExpr::Var(t.clone()),
                    rhs: RhsExpr::Literal(LitValue::Int(1)),
                });
                self.emit(IrStmt::Goto {
                    target: end_lbl.clone(),
                });
                self.emit_label(false_lbl);
                self.emit(IrStmt::Assign {
                    lhs: LhsExpr::Var(t.clone()),
                    rhs: RhsExpr::Literal(LitValue::Int(0)),
                });
                self.emit_label(end_lbl);
                Ok(t)
            }
            AstBinOp::Or => {
                let t = self.vars.fresh_temp(&TypeRef::primitive("boolean"));
                let true_lbl = self.labels.fresh_branch();
                let end_lbl = self.labels.fresh_branch();
                let l = self.lower_cond(left)?;
                self.emit(IrStmt::If {
                    left: l,
                    op: CmpOp::Ne,
                    right: CondOperand::Int(0),
                    target: true_lbl.clone(),
                });
                let r = self.lower_cond(right)?;
                self.emit(IrStmt::If {
                    left: r,
                    op: CmpOp::Ne,
                    right: CondOperand::Int(0),
                    target: true_lbl.clone(),
                });
                self.emit(IrStmt::Assign {
                    lhs: LhsExpr::Var(t.clone()),
                    rhs: RhsExpr::Literal(LitValue::Int(0)),
                });
                self.emit(IrStmt::Goto {
                    target: end_lbl.clone(),
                });
                self.emit_label(true_lbl);
                self.emit(IrStmt::Assign {
                    lhs: LhsExpr::Var(t.clone()),
                    rhs: RhsExpr::Literal(LitValue::Int(1)),
                });
                self.emit_label(end_lbl);
                Ok(t)
            }
        }
    }

    fn lower_unary(&mut self, op: AstUnOp, operand: &AstExpr) -> Result<String> {
        match op {
            AstUnOp::Not => {
                let v = self.lower_value(operand)?;
                let t = self.vars.fresh_temp(&TypeRef::primitive("boolean"));
                let zero_lbl = self.labels.fresh_branch();
                let end_lbl = self.labels.fresh_branch();
                self.emit(IrStmt::Assign {
                    lhs: LhsExpr::Var(t.clone()),
                    rhs: RhsExpr::Var(v),
                });
                self.emit(IrStmt::If {
                    left: t.clone(),
                    op: CmpOp::Ne,
                    right: CondOperand::Int(0),
                    target: zero_lbl.clone(),
                });
                self.emit(IrStmt::Assign {
                    lhs: LhsExpr::Var(t.clone()),
                    rhs: RhsExpr::Literal(LitValue::Int(1)),
                });
                self.emit(IrStmt::Goto {
                    target: end_lbl.clone(),
                });
                self.emit_label(zero_lbl);
                self.emit(IrStmt::Assign {
                    lhs: LhsExpr::Var(t.clone()),
                    rhs: RhsExpr::Literal(LitValue::Int(0)),
                });
                self.emit_label(end_lbl);
                Ok(t)
            }
            AstUnOp::Neg | AstUnOp::BitNot => {
                let ty = self.type_of(operand)?;
                let v = self.lower_operand(operand)?;
                let t = self.vars.fresh_temp(&ty);
                let ir_op = match op {
                    AstUnOp::Neg => crate::features::ir::domain::UnOp::Neg,
                    _ => crate::features::ir::domain::UnOp::BitNot,
                };
                self.emit(IrStmt::Assign {
                    lhs: LhsExpr::Var(t.clone()),
                    rhs: RhsExpr::Unary {
                        op: ir_op,
                        operand: v,
                    },
                });
                Ok(t)
            }
        }
    }

    fn lower_ternary(
        &mut self,
        cond: &AstExpr,
        then_val: &AstExpr,
        else_val: &AstExpr,
    ) -> Result<String> {
        let ty = self.type_of(then_val)?;
        let t = self.vars.fresh_temp(&ty);
        let else_lbl = self.labels.fresh_branch();
        let end_lbl = self.labels.fresh_branch();
        let c = self.lower_cond(cond)?;
        self.emit(IrStmt::If {
            left: c,
            op: CmpOp::Eq,
            right: CondOperand::Int(0),
            target: else_lbl.clone(),
        });
        let tv = self.lower_value(then_val)?;
        self.emit(IrStmt::Assign {
            lhs: LhsExpr::Var(t.clone()),
            rhs: RhsExpr::Var(tv),
        });
        self.emit(IrStmt::Goto {
            target: end_lbl.clone(),
        });
        self.emit_label(else_lbl);
        let ev = self.lower_value(else_val)?;
        self.emit(IrStmt::Assign {
            lhs: LhsExpr::Var(t.clone()),
            rhs: RhsExpr::Var(ev),
        });
        self.emit_label(end_lbl);
        Ok(t)
    }

    fn lower_assign(
        &mut self,
        target: &AstExpr,
        op: Option<crate::features::ir::domain::BinOp>,
        value: &AstExpr,
    ) -> Result<String> {
        match op {
            None => {
                let v = self.lower_value(value)?;
                let t = self.resolve_target(target)?;
                self.store_target(&t, &v);
                Ok(v)
            }
            Some(bin) => {
                let t = self.resolve_target(target)?;
                let ty = t
                    .ty(&self.vars)
                    .cloned()
                    .ok_or_else(|| self.err("untyped assignment target"))?;
                let cur = self.load_target(&t, &ty);
                let r = self.lower_operand(value)?;
                let res = self.vars.fresh_temp(&ty);
                self.emit(IrStmt::Assign {
                    lhs: LhsExpr::Var(res.clone()),
                    rhs: RhsExpr::Binary {
                        op: bin,
                        left: cur,
                        right: r,
                    },
                });
                self.store_target(&t, &res);
                Ok(res)
            }
        }
    }

    fn lower_inc_dec(&mut self, target: &AstExpr, op: IncDecOp) -> Result<String> {
        let t = self.resolve_target(target)?;
        let ty = t
            .ty(&self.vars)
            .cloned()
            .ok_or_else(|| self.err("untyped increment target"))?;
        let cur = self.load_target(&t, &ty);
        let one = self.vars.fresh_temp(&ty);
        self.emit(IrStmt::Assign {
            lhs: LhsExpr::Var(one.clone()),
            rhs: RhsExpr::Literal(LitValue::Int(1)),
        });
        let bin = match op {
            IncDecOp::PreInc | IncDecOp::PostInc => crate::features::ir::domain::BinOp::Add,
            IncDecOp::PreDec | IncDecOp::PostDec => crate::features::ir::domain::BinOp::Sub,
        };
        let next = self.vars.fresh_temp(&ty);
        self.emit(IrStmt::Assign {
            lhs: LhsExpr::Var(next.clone()),
            rhs: RhsExpr::Binary {
                op: bin,
                left: cur.clone(),
                right: one,
            },
        });
        self.store_target(&t, &next);
        match op {
            IncDecOp::PostInc | IncDecOp::PostDec => Ok(cur),
            IncDecOp::PreInc | IncDecOp::PreDec => Ok(next),
        }
    }

    // ── assignment targets ─────────────────────────────────────────────

    fn resolve_target(&mut self, target: &AstExpr) -> Result<TargetRef> {
        match target {
            AstExpr::Name(n) => {
                let out = self
                    .vars
                    .resolve(n)
                    .map(|s| s.to_string())
                    .ok_or_else(|| self.err(format!("unresolved name `{}`", n)))?;
                Ok(TargetRef::Var(out))
            }
            AstExpr::Field { base, field, ty } => {
                let b = self.lower_value(base)?;
                Ok(TargetRef::Field {
                    base: b,
                    field: field.clone(),
                    ty: ty.clone(),
                })
            }
            AstExpr::StaticField { fqn, ty } => Ok(TargetRef::Static {
                fqn: fqn.clone(),
                ty: ty.clone(),
            }),
            AstExpr::Index { base, index } => {
                let elem = self
                    .type_of(base)?
                    .elem_type()
                    .ok_or_else(|| self.err("indexing into a non-array"))?;
                let b = self.lower_value(base)?;
                let i = self.lower_value(index)?;
                Ok(TargetRef::Index {
                    base: b,
                    index: i,
                    ty: elem,
                })
            }
            _ => Err(self.err("invalid assignment target")),
        }
    }

    fn load_target(&mut self, target: &TargetRef, ty: &TypeRef) -> String {
        let t = self.vars.fresh_temp(ty);
        let rhs = match target {
            TargetRef::Var(v) => RhsExpr::Var(v.clone()),
            TargetRef::Field { base, field, ty } => RhsExpr::FieldLoad {
                base: base.clone(),
                field: field.clone(),
                ty: ty.clone(),
            },
            TargetRef::Static { fqn, ty } => RhsExpr::StaticLoad {
                fqn: fqn.clone(),
                ty: ty.clone(),
            },
            TargetRef::Index { base, index, ty } => RhsExpr::ArrayLoad {
                base: base.clone(),
                index: index.clone(),
                ty: ty.clone(),
            },
        };
        self.emit(IrStmt::Assign {
            lhs: LhsExpr::Var(t.clone()),
            rhs,
        });
        t
    }

    fn store_target(&mut self, target: &TargetRef, value: &str) {
        let lhs = match target {
            TargetRef::Var(v) => LhsExpr::Var(v.clone()),
            TargetRef::Field { base, field, .. } => LhsExpr::FieldStore {
                base: base.clone(),
                field: field.clone(),
            },
            TargetRef::Static { fqn, .. } => LhsExpr::StaticStore { fqn: fqn.clone() },
            TargetRef::Index { base, index, .. } => LhsExpr::ArrayStore {
                base: base.clone(),
                index: index.clone(),
            },
        };
        self.emit(IrStmt::Assign {
            lhs,
            rhs: RhsExpr::Var(value.to_string()),
        });
    }

    // ── type inference ─────────────────────────────────────────────────

    fn type_of(&self, e: &AstExpr) -> Result<TypeRef> {
        match e {
            AstExpr::Literal(lit) => Ok(lit_type(lit)),
            AstExpr::Name(n) => {
                let out = self
                    .vars
                    .resolve(n)
                    .ok_or_else(|| self.err(format!("unresolved name `{}`", n)))?;
                self.vars
                    .type_of(out)
                    .cloned()
                    .ok_or_else(|| self.err(format!("untyped name `{}`", n)))
            }
            AstExpr::This => Ok(TypeRef::object(self.ast.declaring_class.clone())),
            AstExpr::Field { ty, .. } | AstExpr::StaticField { ty, .. } => Ok(ty.clone()),
            AstExpr::Index { base, .. } => self
                .type_of(base)?
                .elem_type()
                .ok_or_else(|| self.err("indexing into a non-array")),
            AstExpr::Call { signature, .. } => Ok(signature.return_type.clone()),
            AstExpr::New { ctor, .. } => Ok(TypeRef::object(ctor.owner.clone())),
            AstExpr::NewArray { ty, .. } => Ok(ty.clone()),
            AstExpr::Binary { op, left, .. } => match op {
                AstBinOp::Arith(_) => self.type_of(left),
                AstBinOp::Cmp(_) | AstBinOp::And | AstBinOp::Or => {
                    Ok(TypeRef::primitive("boolean"))
                }
            },
            AstExpr::Unary { op, operand } => match op {
                AstUnOp::Not => Ok(TypeRef::primitive("boolean")),
                AstUnOp::Neg | AstUnOp::BitNot => self.type_of(operand),
            },
            AstExpr::Assign { target, .. } => self.type_of(target),
            AstExpr::IncDec { target, .. } => self.type_of(target),
            AstExpr::Ternary { then_val, .. } => self.type_of(then_val),
            AstExpr::Cast { ty, .. } => Ok(ty.clone()),
            AstExpr::InstanceOf { .. } => Ok(TypeRef::primitive("boolean")),
        }
    }
}

fn lit_type(lit: &AstLit) -> TypeRef {
    match lit {
        AstLit::Int(_) => TypeRef::primitive("int"),
        AstLit::Long(_) => TypeRef::primitive("long"),
        AstLit::Float(_) => TypeRef::primitive("double"),
        AstLit::Bool(_) => TypeRef::primitive("boolean"),
        AstLit::Char(_) => TypeRef::primitive("char"),
        AstLit::Str(_) => TypeRef::object("java.lang.String"),
        AstLit::Null => TypeRef::object("java.lang.Object"),
    }
}

/// Booleans and chars lower to their int encoding
fn lower_lit(lit: &AstLit) -> LitValue {
    match lit {
        AstLit::Int(v) => LitValue::Int(*v),
        AstLit::Long(v) => LitValue::Long(*v),
        AstLit::Float(v) => LitValue::Float(*v),
        AstLit::Bool(b) => LitValue::Int(if *b { 1 } else { 0 }),
        AstLit::Char(c) => LitValue::Int(*c as i64),
        AstLit::Str(s) => LitValue::Str(s.clone()),
        AstLit::Null => LitValue::Null,
    }
}
