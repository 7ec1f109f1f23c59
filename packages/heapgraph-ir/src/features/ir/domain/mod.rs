pub mod method;
pub mod stmt;

pub use method::{CatchClause, MethodIr};
pub use stmt::{
    BinOp, CallKind, CmpOp, CondOperand, IrStmt, Label, LhsExpr, LitValue, Location, ReturnKind,
    RhsExpr, UnOp,
};
