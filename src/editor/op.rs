//! Reversible operations as plain data.
//!
//! Forward operations wrap an [`EditCommand`]; the engine's executor
//! returns the exact inverse of everything it runs, using the
//! inverse-only variants below. Ops are cloneable so they can sit on
//! the op stack and be re-run by `apply`.

use std::fmt;

use crate::command::EditCommand;

#[derive(Debug, Clone, PartialEq)]
pub enum Op {
    /// Marker for "nothing to undo". Never pushed onto either stack.
    NoOp,
    /// A forward command primitive.
    Cmd(EditCommand),
    /// Runs each member in order; rolls the already-run prefix back if
    /// a member fails.
    Combined(Vec<Op>),
    /// Inverse primitive: restore a selection.
    SetSelection { start: usize, end: usize },
    /// Inverse primitive: delete `delete_before` chars left of the
    /// cursor, optionally re-commit text, optionally restore a
    /// selection.
    RestoreText {
        delete_before: usize,
        restore: Option<String>,
        selection: Option<(usize, usize)>,
    },
}

impl Op {
    pub fn is_no_op(&self) -> bool {
        matches!(self, Op::NoOp)
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Op::NoOp => write!(f, "noop"),
            Op::Cmd(cmd) => write!(f, "{cmd:?}"),
            Op::Combined(ops) => {
                write!(f, "combined[")?;
                for (i, op) in ops.iter().enumerate() {
                    if i > 0 {
                        write!(f, "; ")?;
                    }
                    write!(f, "{op}")?;
                }
                write!(f, "]")
            }
            Op::SetSelection { start, end } => write!(f, "setSelection({start}, {end})"),
            Op::RestoreText {
                delete_before,
                restore,
                selection,
            } => write!(
                f,
                "restoreText(-{delete_before}, {:?}, {selection:?})",
                restore
            ),
        }
    }
}
