//! Voice-command text editor core.
//!
//! Transcribed utterances come in; each one is either dictation
//! (typed into the buffer with smart spacing and capitalization) or an
//! editing command (matched by user-defined rewrite rules and executed
//! as a reversible operation). Everything that changes the buffer can
//! be undone exactly.

pub mod command;
pub mod config;
pub mod context;
pub mod editor;
pub mod rewriter;
pub mod rules;

pub use command::{EditCommand, EditorAction, SelEdge};
pub use context::EditorContext;
pub use editor::buffer::{MemBuffer, TextBuffer};
pub use editor::engine::{ActivityLauncher, CommandEditor, EditOutcome, UrlFetcher};
pub use editor::op::Op;
pub use rewriter::{Rewrite, RuleSet};
pub use rules::{Rule, RuleSyntaxError};
