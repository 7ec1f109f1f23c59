//! Label allocation and the break/continue label stacks
//!
//! Two counters advance independently: `line_count` (statement index) and
//! `label_count` (label index); a location's displayed index is their sum.
//! Construct labels (`Do_start_N`, `While_end_N`, ...) and generic branch
//! labels (`LabelN`) are globally unique per method. Unlabeled `break`
//! consumes the head of the end-label stack, unlabeled `continue` the head
//! of the start-label stack; consuming from an empty stack is a lowering
//! bug and is reported as an invariant violation.

use crate::errors::{HeapgraphError, Result};
use rustc_hash::{FxHashMap, FxHashSet};

/// IR keywords that cannot double as user labels
const RESERVED: &[&str] = &[
    "if", "else", "goto", "return", "throw", "call", "new", "catch", "procedure", "switch",
    "while", "do", "for", "break", "continue", "true", "false", "null", "instanceof",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopKind {
    Do,
    While,
    For,
}

impl LoopKind {
    fn prefix(&self) -> &'static str {
        match self {
            LoopKind::Do => "Do",
            LoopKind::While => "While",
            LoopKind::For => "For",
        }
    }
}

/// Target registered for a user-labeled statement
#[derive(Debug, Clone)]
struct LabeledTarget {
    /// Loop start label; `None` for non-loop constructs
    start_label: Option<String>,
    end_label: String,
}

pub struct LabelAllocator {
    line_count: usize,
    label_count: usize,
    branch_count: usize,
    loop_counts: FxHashMap<&'static str, usize>,
    switch_count: usize,
    start_labels: Vec<String>,
    end_labels: Vec<String>,
    labeled: FxHashMap<String, LabeledTarget>,
    used: FxHashSet<String>,
}

impl LabelAllocator {
    pub fn new() -> Self {
        Self {
            line_count: 0,
            label_count: 0,
            branch_count: 0,
            loop_counts: FxHashMap::default(),
            switch_count: 0,
            start_labels: Vec::new(),
            end_labels: Vec::new(),
            labeled: FxHashMap::default(),
            used: FxHashSet::default(),
        }
    }

    /// Displayed index for the next generated-label location
    pub fn next_line(&mut self) -> usize {
        let index = self.line_count + self.label_count;
        self.line_count += 1;
        index
    }

    /// Account one named-label location
    pub fn next_named(&mut self) {
        self.label_count += 1;
    }

    pub fn line_count(&self) -> usize {
        self.line_count
    }

    /// Fresh generic branch label `LabelN`
    pub fn fresh_branch(&mut self) -> String {
        let name = format!("Label{}", self.branch_count);
        self.branch_count += 1;
        self.used.insert(name.clone());
        name
    }

    /// Fresh `<Kind>_start_N` / `<Kind>_end_N` pair
    pub fn loop_labels(&mut self, kind: LoopKind) -> (String, String) {
        let counter = self.loop_counts.entry(kind.prefix()).or_insert(0);
        let n = *counter;
        *counter += 1;
        let start = format!("{}_start_{}", kind.prefix(), n);
        let end = format!("{}_end_{}", kind.prefix(), n);
        self.used.insert(start.clone());
        self.used.insert(end.clone());
        (start, end)
    }

    /// Fresh `Switch_start_N` / `Switch_end_N` pair
    pub fn switch_labels(&mut self) -> (String, String) {
        let n = self.switch_count;
        self.switch_count += 1;
        let start = format!("Switch_start_{}", n);
        let end = format!("Switch_end_{}", n);
        self.used.insert(start.clone());
        self.used.insert(end.clone());
        (start, end)
    }

    /// Translate a user label; reserved keywords are suffixed `_label`,
    /// collisions get a monotonic suffix
    pub fn escape_user_label(&mut self, name: &str) -> String {
        let mut candidate = if RESERVED.contains(&name) {
            format!("{}_label", name)
        } else {
            name.to_string()
        };
        let mut n = 1;
        while self.used.contains(&candidate) {
            candidate = format!("{}_{}", name, n);
            n += 1;
        }
        self.used.insert(candidate.clone());
        candidate
    }

    // ── label-stack state machine ──────────────────────────────────────

    pub fn push_loop(&mut self, start: &str, end: &str) {
        self.start_labels.push(start.to_string());
        self.end_labels.push(end.to_string());
    }

    pub fn pop_loop(&mut self) -> Result<()> {
        let start = self.start_labels.pop();
        let end = self.end_labels.pop();
        if start.is_none() || end.is_none() {
            return Err(HeapgraphError::invariant("unmatched loop label pop"));
        }
        Ok(())
    }

    /// A switch pushes only an end label; `continue` passes through it
    pub fn push_switch(&mut self, end: &str) {
        self.end_labels.push(end.to_string());
    }

    pub fn pop_switch(&mut self) -> Result<()> {
        self.end_labels
            .pop()
            .map(|_| ())
            .ok_or_else(|| HeapgraphError::invariant("unmatched switch label pop"))
    }

    pub fn break_target(&self, label: Option<&str>) -> Result<String> {
        match label {
            Some(user) => self
                .labeled
                .get(user)
                .map(|t| t.end_label.clone())
                .ok_or_else(|| {
                    HeapgraphError::invariant(format!("break to undeclared label `{}`", user))
                }),
            None => self.end_labels.last().cloned().ok_or_else(|| {
                HeapgraphError::invariant("break outside of loop or switch: empty label stack")
            }),
        }
    }

    pub fn continue_target(&self, label: Option<&str>) -> Result<String> {
        match label {
            Some(user) => {
                let target = self.labeled.get(user).ok_or_else(|| {
                    HeapgraphError::invariant(format!("continue to undeclared label `{}`", user))
                })?;
                // A labeled continue re-enters at the loop head, not at the
                // user label in front of the construct; for-loops keep
                // their initializer out of the continue path that way
                target.start_label.clone().ok_or_else(|| {
                    HeapgraphError::invariant(format!("continue to non-loop label `{}`", user))
                })
            }
            None => self.start_labels.last().cloned().ok_or_else(|| {
                HeapgraphError::invariant("continue outside of loop: empty label stack")
            }),
        }
    }

    /// Register a user label covering a statement; loops pass their start
    /// label, other constructs pass `None`
    pub fn register_labeled(&mut self, escaped: &str, start_label: Option<&str>, end_label: &str) {
        self.labeled.insert(
            escaped.to_string(),
            LabeledTarget {
                start_label: start_label.map(|s| s.to_string()),
                end_label: end_label.to_string(),
            },
        );
    }

    /// Terminal check: both stacks must be empty at method end
    pub fn verify_balanced(&self) -> Result<()> {
        if self.start_labels.is_empty() && self.end_labels.is_empty() {
            Ok(())
        } else {
            Err(HeapgraphError::invariant(format!(
                "label stacks not empty at method end ({} starts, {} ends)",
                self.start_labels.len(),
                self.end_labels.len()
            )))
        }
    }
}

impl Default for LabelAllocator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_index_sums_counters() {
        let mut l = LabelAllocator::new();
        assert_eq!(l.next_line(), 0);
        assert_eq!(l.next_line(), 1);
        l.next_named();
        assert_eq!(l.next_line(), 3);
    }

    #[test]
    fn test_loop_labels_unique() {
        let mut l = LabelAllocator::new();
        assert_eq!(l.loop_labels(LoopKind::Do), ("Do_start_0".into(), "Do_end_0".into()));
        assert_eq!(l.loop_labels(LoopKind::Do), ("Do_start_1".into(), "Do_end_1".into()));
        assert_eq!(
            l.loop_labels(LoopKind::While),
            ("While_start_0".into(), "While_end_0".into())
        );
    }

    #[test]
    fn test_break_consumes_innermost() {
        let mut l = LabelAllocator::new();
        let (s0, e0) = l.loop_labels(LoopKind::While);
        l.push_loop(&s0, &e0);
        let (s1, e1) = l.loop_labels(LoopKind::For);
        l.push_loop(&s1, &e1);
        assert_eq!(l.break_target(None).unwrap(), e1);
        assert_eq!(l.continue_target(None).unwrap(), s1);
        l.pop_loop().unwrap();
        assert_eq!(l.break_target(None).unwrap(), e0);
        l.pop_loop().unwrap();
        assert!(l.break_target(None).is_err());
        assert!(l.verify_balanced().is_ok());
    }

    #[test]
    fn test_switch_pushes_end_only() {
        let mut l = LabelAllocator::new();
        let (s, e) = l.loop_labels(LoopKind::While);
        l.push_loop(&s, &e);
        let (_, se) = l.switch_labels();
        l.push_switch(&se);
        // break hits the switch, continue passes through to the loop
        assert_eq!(l.break_target(None).unwrap(), se);
        assert_eq!(l.continue_target(None).unwrap(), s);
        l.pop_switch().unwrap();
        l.pop_loop().unwrap();
    }

    #[test]
    fn test_labeled_continue_targets_loop_start() {
        let mut l = LabelAllocator::new();
        let user = l.escape_user_label("outer");
        let (start, end) = l.loop_labels(LoopKind::For);
        l.register_labeled(&user, Some(&start), &end);
        assert_eq!(l.continue_target(Some("outer")).unwrap(), start);
        assert_eq!(l.break_target(Some("outer")).unwrap(), end);

        // continue to a labeled switch is a lowering bug
        let (_, switch_end) = l.switch_labels();
        l.register_labeled("sw", None, &switch_end);
        assert!(l.continue_target(Some("sw")).is_err());
        assert_eq!(l.break_target(Some("sw")).unwrap(), switch_end);
    }

    #[test]
    fn test_reserved_user_label_escaped() {
        let mut l = LabelAllocator::new();
        assert_eq!(l.escape_user_label("while"), "while_label");
        assert_eq!(l.escape_user_label("outer"), "outer");
        assert_eq!(l.escape_user_label("outer"), "outer_1");
    }
}
