//! Textual IR serialization
//!
//! The conventions here are bit-preserving for downstream consumers:
//! generated location labels render as `#L<NNN>.` with `NNN` zero-padded to
//! `ceil(log10(lineCount)) + 1` digits, named labels as `#<label>.`, every
//! call carries `@signature` and `@kind`, object and void returns carry
//! `@kind`, and identifiers containing non-identifier characters are
//! wrapped in backticks.

use crate::features::ir::domain::{
    CondOperand, IrStmt, Label, LhsExpr, LitValue, Location, MethodIr, RhsExpr,
};
use std::fmt::Write as _;

/// Wrap in backticks when the text is not a plain identifier
fn ident(s: &str) -> String {
    let plain = !s.is_empty()
        && s.chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
        && !s.chars().next().unwrap().is_ascii_digit();
    if plain {
        s.to_string()
    } else {
        format!("`{}`", s)
    }
}

/// Zero-pad width for generated labels: `ceil(log10(line_count)) + 1`
fn label_width(line_count: usize) -> usize {
    let mut pow = 1usize;
    let mut ceil_log = 0usize;
    while pow < line_count.max(1) {
        pow = pow.saturating_mul(10);
        ceil_log += 1;
    }
    ceil_log + 1
}

pub struct IrPrinter {
    width: usize,
}

impl IrPrinter {
    /// A printer sized for `method`'s generated-label count
    pub fn for_method(method: &MethodIr) -> Self {
        let line_count = method
            .locations
            .iter()
            .filter(|l| matches!(l.label, Label::Std(_)))
            .count();
        Self {
            width: label_width(line_count),
        }
    }

    pub fn print_method(&self, method: &MethodIr) -> String {
        let mut out = String::new();
        let _ = write!(out, "procedure {} (", ident(&method.signature.to_string()));
        let mut first = true;
        if let Some(this) = &method.this_name {
            let _ = write!(out, "{} {}", ident(&method.declaring_class), this);
            first = false;
        }
        for (name, ty) in &method.params {
            if !first {
                out.push_str(", ");
            }
            let _ = write!(out, "{} {}", ident(&ty.to_string()), name);
            first = false;
        }
        out.push_str(") {\n");
        for loc in &method.locations {
            out.push_str("  ");
            out.push_str(&self.print_location(loc));
            out.push('\n');
        }
        for c in &method.catches {
            let _ = write!(
                out,
                "  catch {} @[{}..{}] goto {};\n",
                ident(&c.exception.to_string()),
                c.from_label,
                c.to_label,
                c.handler_label
            );
        }
        out.push_str("}\n");
        out
    }

    pub fn print_location(&self, loc: &Location) -> String {
        let label = match &loc.label {
            Label::Std(n) => format!("#L{:0width$}.", n, width = self.width),
            Label::Named(name) => format!("#{}.", name),
        };
        format!("{} {}", label, self.print_stmt(&loc.stmt))
    }

    pub fn print_stmt(&self, stmt: &IrStmt) -> String {
        match stmt {
            IrStmt::Assign { lhs, rhs } => {
                format!("{} := {};", self.print_lhs(lhs), self.print_rhs(rhs))
            }
            IrStmt::Call {
                lhs,
                signature,
                recv,
                args,
                kind,
            } => {
                let mut s = String::from("call ");
                if let Some(l) = lhs {
                    let _ = write!(s, "{} := ", l);
                }
                let _ = write!(s, "{}(", ident(&signature.name));
                let mut first = true;
                for a in recv.iter().chain(args.iter()) {
                    if !first {
                        s.push_str(", ");
                    }
                    s.push_str(a);
                    first = false;
                }
                let _ = write!(
                    s,
                    ") @signature `{}` @kind {};",
                    signature,
                    kind.as_str()
                );
                s
            }
            IrStmt::If {
                left,
                op,
                right,
                target,
            } => {
                let rhs = match right {
                    CondOperand::Var(v) => v.clone(),
                    CondOperand::Int(i) => i.to_string(),
                    CondOperand::Null => "null".to_string(),
                };
                format!("if {} {} {} then goto {};", left, op.as_str(), rhs, target)
            }
            IrStmt::Goto { target } => format!("goto {};", target),
            IrStmt::Return { value, kind } => {
                let mut s = String::from("return");
                if let Some(v) = value {
                    let _ = write!(s, " {}", v);
                }
                if let Some(k) = kind {
                    let _ = write!(s, " @kind {}", k.as_str());
                }
                s.push(';');
                s
            }
            IrStmt::Throw { var } => format!("throw {};", var),
            IrStmt::Skip => ";".to_string(),
        }
    }

    fn print_lhs(&self, lhs: &LhsExpr) -> String {
        match lhs {
            LhsExpr::Var(v) => v.clone(),
            LhsExpr::FieldStore { base, field } => format!("{}.{}", base, ident(field)),
            LhsExpr::StaticStore { fqn } => format!("@@{}", ident(fqn)),
            LhsExpr::ArrayStore { base, index } => format!("{}[{}]", base, index),
        }
    }

    fn print_rhs(&self, rhs: &RhsExpr) -> String {
        match rhs {
            RhsExpr::Literal(lit) => match lit {
                LitValue::Int(i) => i.to_string(),
                LitValue::Long(l) => format!("{}L", l),
                LitValue::Float(x) => format!("{:?}", x),
                LitValue::Str(s) => format!("\"{}\"", s.escape_default()),
                LitValue::Null => "null".to_string(),
            },
            RhsExpr::Var(v) => v.clone(),
            RhsExpr::FieldLoad { base, field, .. } => format!("{}.{}", base, ident(field)),
            RhsExpr::StaticLoad { fqn, .. } => format!("@@{}", ident(fqn)),
            RhsExpr::ArrayLoad { base, index, .. } => format!("{}[{}]", base, index),
            RhsExpr::New { ty } => format!("new {}", ident(&ty.to_string())),
            RhsExpr::NewArray { ty, dims } => {
                format!("new {}[{}]", ident(&ty.name), dims.join(", "))
            }
            RhsExpr::Binary { op, left, right } => {
                format!("{} {} {}", left, op.as_str(), right)
            }
            RhsExpr::Unary { op, operand } => format!("{}{}", op.as_str(), operand),
            RhsExpr::Cast { ty, operand } => format!("({}) {}", ident(&ty.to_string()), operand),
            RhsExpr::InstanceOf { operand, ty } => {
                format!("{} instanceof {}", operand, ident(&ty.to_string()))
            }
            RhsExpr::CaughtException { ty } => {
                format!("@caughtexception @type {}", ident(&ty.to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_width() {
        assert_eq!(label_width(0), 1);
        assert_eq!(label_width(1), 1);
        assert_eq!(label_width(9), 2);
        assert_eq!(label_width(10), 2);
        assert_eq!(label_width(11), 3);
        assert_eq!(label_width(100), 3);
        assert_eq!(label_width(101), 4);
    }

    #[test]
    fn test_ident_backticks() {
        assert_eq!(ident("foo_1"), "foo_1");
        assert_eq!(ident("com.example.A"), "`com.example.A`");
        assert_eq!(ident("int[]"), "`int[]`");
    }
}
