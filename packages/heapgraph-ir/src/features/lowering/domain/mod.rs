pub mod ast;

pub use ast::{
    AstBinOp, AstExpr, AstLit, AstMethod, AstStmt, AstStmtKind, AstUnOp, CallProps, CatchArm,
    IncDecOp, Receiver, SwitchCase,
};
