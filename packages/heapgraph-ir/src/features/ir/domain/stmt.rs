//! Three-address IR statements
//!
//! Every expression of the source program is evaluated through a temporary
//! and every branch target is an explicit label; the summary engine's
//! transfer functions rely on both guarantees. Statements and expressions
//! are closed sum types so each use site can match exhaustively.

use crate::shared::models::{MethodSignature, TypeRef};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Location label: generated statement index or a named target
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Label {
    /// Generated `#L<NNN>.` label; the payload is the displayed index
    /// (statement counter + label counter at emission time)
    Std(usize),
    /// User or construct label (`Do_start_0`, `While_end_1`, user labels)
    Named(String),
}

impl Label {
    /// Stable textual key, independent of printer zero-padding
    pub fn key(&self) -> String {
        match self {
            Label::Std(n) => format!("L{}", n),
            Label::Named(name) => name.clone(),
        }
    }
}

/// Literal operand of an assignment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LitValue {
    Int(i64),
    Long(i64),
    Float(f64),
    Str(String),
    Null,
}

impl LitValue {
    pub fn type_ref(&self) -> TypeRef {
        match self {
            LitValue::Int(_) => TypeRef::primitive("int"),
            LitValue::Long(_) => TypeRef::primitive("long"),
            LitValue::Float(_) => TypeRef::primitive("double"),
            LitValue::Str(_) => TypeRef::object("java.lang.String"),
            LitValue::Null => TypeRef::object("java.lang.Object"),
        }
    }
}

/// Arithmetic / bitwise operators surviving into the IR
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    BitAnd,
    BitOr,
    BitXor,
    Shl,
    Shr,
    Ushr,
}

impl BinOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Rem => "%",
            BinOp::BitAnd => "&",
            BinOp::BitOr => "|",
            BinOp::BitXor => "^",
            BinOp::Shl => "<<",
            BinOp::Shr => ">>",
            BinOp::Ushr => ">>>",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnOp {
    Neg,
    BitNot,
}

impl UnOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnOp::Neg => "-",
            UnOp::BitNot => "~",
        }
    }
}

/// Comparison operator of a conditional branch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CmpOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl CmpOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            CmpOp::Eq => "==",
            CmpOp::Ne => "!=",
            CmpOp::Lt => "<",
            CmpOp::Le => "<=",
            CmpOp::Gt => ">",
            CmpOp::Ge => ">=",
        }
    }

    pub fn negate(&self) -> CmpOp {
        match self {
            CmpOp::Eq => CmpOp::Ne,
            CmpOp::Ne => CmpOp::Eq,
            CmpOp::Lt => CmpOp::Ge,
            CmpOp::Le => CmpOp::Gt,
            CmpOp::Gt => CmpOp::Le,
            CmpOp::Ge => CmpOp::Lt,
        }
    }
}

/// Right operand of a conditional branch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CondOperand {
    Var(String),
    Int(i64),
    Null,
}

/// Three-address right-hand sides
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RhsExpr {
    Literal(LitValue),
    Var(String),
    /// `ty` is the declared field type (drives unknown synthesis)
    FieldLoad {
        base: String,
        field: String,
        ty: TypeRef,
    },
    StaticLoad {
        fqn: String,
        ty: TypeRef,
    },
    /// `ty` is the element type
    ArrayLoad {
        base: String,
        index: String,
        ty: TypeRef,
    },
    New {
        ty: TypeRef,
    },
    NewArray {
        ty: TypeRef,
        dims: Vec<String>,
    },
    Binary {
        op: BinOp,
        left: String,
        right: String,
    },
    Unary {
        op: UnOp,
        operand: String,
    },
    Cast {
        ty: TypeRef,
        operand: String,
    },
    InstanceOf {
        operand: String,
        ty: TypeRef,
    },
    /// The in-flight exception at a handler entry
    CaughtException {
        ty: TypeRef,
    },
}

/// Three-address left-hand sides
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LhsExpr {
    Var(String),
    FieldStore { base: String, field: String },
    StaticStore { fqn: String },
    ArrayStore { base: String, index: String },
}

/// Call dispatch kind; mandatory annotation on every call statement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CallKind {
    Virtual,
    Interface,
    Direct,
    Super,
    Static,
}

impl CallKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CallKind::Virtual => "virtual",
            CallKind::Interface => "interface",
            CallKind::Direct => "direct",
            CallKind::Super => "super",
            CallKind::Static => "static",
        }
    }
}

/// Return annotation: object returns and synthesized void returns carry a
/// kind; primitive returns carry none
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReturnKind {
    Object,
    Void,
}

impl ReturnKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReturnKind::Object => "object",
            ReturnKind::Void => "void",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum IrStmt {
    Assign {
        lhs: LhsExpr,
        rhs: RhsExpr,
    },
    Call {
        lhs: Option<String>,
        signature: MethodSignature,
        recv: Option<String>,
        args: Vec<String>,
        kind: CallKind,
    },
    If {
        left: String,
        op: CmpOp,
        right: CondOperand,
        target: String,
    },
    Goto {
        target: String,
    },
    Return {
        value: Option<String>,
        kind: Option<ReturnKind>,
    },
    Throw {
        var: String,
    },
    /// Placeholder statement under a named label
    Skip,
}

impl IrStmt {
    /// Branch target, if this statement has one
    pub fn target(&self) -> Option<&str> {
        match self {
            IrStmt::If { target, .. } | IrStmt::Goto { target } => Some(target),
            _ => None,
        }
    }

    /// Does control fall through to the next location?
    pub fn falls_through(&self) -> bool {
        !matches!(
            self,
            IrStmt::Goto { .. } | IrStmt::Return { .. } | IrStmt::Throw { .. }
        )
    }
}

/// One program point: a labeled statement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    /// Ordinal position in the method body
    pub index: usize,
    pub label: Label,
    pub stmt: IrStmt,
}

impl Location {
    /// Context locus of this program point
    pub fn locus(&self) -> String {
        self.label.key()
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}. {:?}", self.label.key(), self.stmt)
    }
}
