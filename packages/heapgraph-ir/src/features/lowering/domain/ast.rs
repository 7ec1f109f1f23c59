//! Structured source AST consumed by the lowering
//!
//! Names, field accesses, and calls arrive fully resolved (types and
//! signatures attached by the upstream front end); the lowering itself
//! never consults a classpath. Lambda expressions and method references
//! are not part of this model.

use crate::features::ir::domain::stmt::{BinOp, CmpOp};
use crate::shared::models::{MethodSignature, Span, TypeRef};
use serde::{Deserialize, Serialize};

/// A method ready for lowering
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AstMethod {
    pub signature: MethodSignature,
    pub declaring_class: String,
    pub is_static: bool,
    /// Ordered `(name, type)` parameters
    pub params: Vec<(String, TypeRef)>,
    pub body: Vec<AstStmt>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AstStmt {
    pub span: Option<Span>,
    pub kind: AstStmtKind,
}

impl AstStmt {
    pub fn new(kind: AstStmtKind) -> Self {
        Self { span: None, kind }
    }

    pub fn with_span(kind: AstStmtKind, span: Span) -> Self {
        Self {
            span: Some(span),
            kind,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AstStmtKind {
    Block(Vec<AstStmt>),
    LocalDecl {
        ty: TypeRef,
        name: String,
        init: Option<AstExpr>,
    },
    Expr(AstExpr),
    If {
        cond: AstExpr,
        then_branch: Box<AstStmt>,
        else_branch: Option<Box<AstStmt>>,
    },
    While {
        cond: AstExpr,
        body: Box<AstStmt>,
    },
    DoWhile {
        body: Box<AstStmt>,
        cond: AstExpr,
    },
    For {
        init: Option<Box<AstStmt>>,
        cond: Option<AstExpr>,
        update: Option<AstExpr>,
        body: Box<AstStmt>,
    },
    Switch {
        scrutinee: AstExpr,
        cases: Vec<SwitchCase>,
        default: Option<Vec<AstStmt>>,
    },
    Break {
        label: Option<String>,
    },
    Continue {
        label: Option<String>,
    },
    Return(Option<AstExpr>),
    Throw(AstExpr),
    Labeled {
        label: String,
        body: Box<AstStmt>,
    },
    Try {
        body: Vec<AstStmt>,
        catches: Vec<CatchArm>,
        finally: Option<Vec<AstStmt>>,
    },
    Assert {
        cond: AstExpr,
        message: Option<AstExpr>,
    },
    Empty,
}

/// One switch case; execution falls through into the next case unless the
/// body breaks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwitchCase {
    pub value: i64,
    pub body: Vec<AstStmt>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatchArm {
    pub exception: TypeRef,
    pub var: String,
    pub body: Vec<AstStmt>,
}

/// Call receiver form; together with the callee properties it determines
/// the emitted `@kind`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Receiver {
    /// No receiver: a static call
    None,
    Super,
    Expr(Box<AstExpr>),
}

/// Resolved callee properties relevant to dispatch-kind selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CallProps {
    pub is_interface: bool,
    pub is_private: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AstLit {
    Int(i64),
    Long(i64),
    Float(f64),
    Bool(bool),
    Char(char),
    Str(String),
    Null,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AstBinOp {
    Arith(BinOp),
    Cmp(CmpOp),
    /// Short-circuit `&&`
    And,
    /// Short-circuit `||`
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AstUnOp {
    Neg,
    Not,
    BitNot,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IncDecOp {
    PreInc,
    PreDec,
    PostInc,
    PostDec,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AstExpr {
    Literal(AstLit),
    Name(String),
    This,
    Field {
        base: Box<AstExpr>,
        field: String,
        /// Declared field type
        ty: TypeRef,
    },
    StaticField {
        fqn: String,
        ty: TypeRef,
    },
    Index {
        base: Box<AstExpr>,
        index: Box<AstExpr>,
    },
    Call {
        receiver: Receiver,
        signature: MethodSignature,
        args: Vec<AstExpr>,
        props: CallProps,
    },
    New {
        ctor: MethodSignature,
        args: Vec<AstExpr>,
    },
    NewArray {
        ty: TypeRef,
        dims: Vec<AstExpr>,
    },
    Binary {
        op: AstBinOp,
        left: Box<AstExpr>,
        right: Box<AstExpr>,
    },
    Unary {
        op: AstUnOp,
        operand: Box<AstExpr>,
    },
    /// Plain assignment when `op` is `None`, compound otherwise
    Assign {
        target: Box<AstExpr>,
        op: Option<BinOp>,
        value: Box<AstExpr>,
    },
    IncDec {
        target: Box<AstExpr>,
        op: IncDecOp,
    },
    Ternary {
        cond: Box<AstExpr>,
        then_val: Box<AstExpr>,
        else_val: Box<AstExpr>,
    },
    Cast {
        ty: TypeRef,
        expr: Box<AstExpr>,
    },
    InstanceOf {
        expr: Box<AstExpr>,
        ty: TypeRef,
    },
}

impl AstExpr {
    pub fn name(n: impl Into<String>) -> Self {
        AstExpr::Name(n.into())
    }

    pub fn int(v: i64) -> Self {
        AstExpr::Literal(AstLit::Int(v))
    }
}
