//! The operation engine.
//!
//! `CommandEditor` executes reversible ops against a [`TextBuffer`],
//! keeps the op and undo stacks, commits dictation with spacing and
//! capitalization, and drives the multi-utterance command window.

use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

use crate::command::{EditCommand, SelEdge};
use crate::editor::buffer::{self, ArrowKey, ContextAction, TextBuffer};
use crate::editor::functions;
use crate::editor::op::Op;
use crate::editor::text;
use crate::rewriter::{Rewrite, RuleSet};
use crate::rules;

/// How many past utterances can participate in one command.
pub const MAX_UTTERANCES_IN_COMMAND: usize = 3;

/// How much left context is consulted for spacing and word deletion.
pub const MAX_DELETABLE_CONTEXT: usize = 100;

static WHITESPACE_AND_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*\w+").expect("valid pattern"));

/// Seam for the `getUrl` command. The call happens inline; an async
/// front-end substitutes its own implementation here.
pub trait UrlFetcher {
    fn fetch(&self, url: &str) -> Result<String, Box<dyn std::error::Error + Send + Sync>>;
}

/// Seam for the `activity` command.
pub trait ActivityLauncher {
    fn launch(&self, spec: &str) -> bool;
}

/// Outcome of committing one final recognition result.
#[derive(Debug, Clone)]
pub struct EditOutcome {
    success: bool,
    rewrite: Rewrite,
}

impl EditOutcome {
    pub fn success(&self) -> bool {
        self.success
    }

    pub fn is_command(&self) -> bool {
        self.rewrite.is_command()
    }

    pub fn rewrite(&self) -> &Rewrite {
        &self.rewrite
    }
}

impl fmt::Display for EditOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", if self.success { '+' } else { '-' }, self.rewrite)
    }
}

pub struct CommandEditor<B: TextBuffer> {
    buf: B,
    rewriters: Vec<RuleSet>,
    /// Recent non-command utterances, oldest first, that may still
    /// turn out to be the prefix of a longer command.
    pending: Vec<String>,
    /// Successfully run forward ops, for `combine` and `apply`.
    op_stack: Vec<Op>,
    /// Inverses of everything undoable, most recent last.
    undo_stack: Vec<Op>,
    /// The last committed partial result.
    prev_text: String,
    /// Chars added by the current utterance, glue included.
    added_length: usize,
    clips: HashMap<String, String>,
    fetcher: Option<Box<dyn UrlFetcher>>,
    launcher: Option<Box<dyn ActivityLauncher>>,
    verbose: bool,
}

impl<B: TextBuffer> CommandEditor<B> {
    pub fn new(buf: B) -> Self {
        CommandEditor {
            buf,
            rewriters: Vec::new(),
            pending: Vec::new(),
            op_stack: Vec::new(),
            undo_stack: Vec::new(),
            prev_text: String::new(),
            added_length: 0,
            clips: HashMap::new(),
            fetcher: None,
            launcher: None,
            verbose: false,
        }
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn set_rewriters(&mut self, rewriters: Vec<RuleSet>) {
        self.rewriters = rewriters;
        self.reset();
    }

    pub fn set_fetcher(&mut self, fetcher: Box<dyn UrlFetcher>) {
        self.fetcher = Some(fetcher);
    }

    pub fn set_launcher(&mut self, launcher: Box<dyn ActivityLauncher>) {
        self.launcher = Some(launcher);
    }

    pub fn buffer(&self) -> &B {
        &self.buf
    }

    pub fn buffer_mut(&mut self) -> &mut B {
        &mut self.buf
    }

    pub fn text(&self) -> String {
        self.buf.text()
    }

    pub fn undo_depth(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn op_depth(&self) -> usize {
        self.op_stack.len()
    }

    pub fn clip(&self, key: &str) -> Option<&str> {
        self.clips.get(key).map(|v| v.as_str())
    }

    /// Forgets the pending utterances and the partial-result state.
    pub fn reset(&mut self) {
        self.pending.clear();
        self.prev_text.clear();
        self.added_length = 0;
    }

    /// Runs one command through the op machinery.
    pub fn run_command(&mut self, cmd: &EditCommand) -> bool {
        match cmd {
            // Deliberately not undoable.
            EditCommand::CutAll => self.run_op_with(
                Op::Combined(vec![
                    Op::Cmd(EditCommand::SelectAll),
                    Op::Cmd(EditCommand::Cut),
                ]),
                false,
            ),
            EditCommand::CopyAll => self.run_op_with(
                Op::Combined(vec![
                    Op::Cmd(EditCommand::SelectAll),
                    Op::Cmd(EditCommand::Copy),
                ]),
                false,
            ),
            _ => self.run_op(Op::Cmd(cmd.clone())),
        }
    }

    pub fn run_op(&mut self, op: Op) -> bool {
        self.run_op_with(op, true)
    }

    /// Executes an op. On success the forward op goes onto the op
    /// stack and its inverse onto the undo stack, unless the inverse is
    /// a no-op or `undoable` is off.
    pub fn run_op_with(&mut self, op: Op, undoable: bool) -> bool {
        self.reset();
        match self.exec(&op) {
            None => {
                if self.verbose {
                    eprintln!("[EDITOR] failed: {op}");
                }
                false
            }
            Some(inverse) => {
                if undoable && !inverse.is_no_op() {
                    if self.verbose {
                        eprintln!("[EDITOR] ran: {op}");
                    }
                    self.op_stack.push(op);
                    self.push_undo(inverse);
                }
                true
            }
        }
    }

    /// Commits a final recognition result: classifies it (together
    /// with the pending window), executes a command or commits
    /// dictation, and makes the step undoable.
    pub fn commit_final_result(&mut self, text: &str) -> EditOutcome {
        if self.rewriters.is_empty() {
            self.commit_with_overwrite(text);
            self.prev_text.clear();
            self.added_length = 0;
            return EditOutcome {
                success: false,
                rewrite: Rewrite::plain(text),
            };
        }

        let old_sel = self.buf.selection();
        let old_sel_text = self.buf.selected_text();
        let rewrite = self.apply_command(text);
        let text_rewritten = rewrite.text.clone();
        let added = self.commit_with_overwrite(&text_rewritten);
        if added > 0 {
            let (restore, selection) = if old_sel_text.is_empty() {
                (None, None)
            } else {
                (Some(old_sel_text), Some(old_sel))
            };
            self.push_undo(Op::RestoreText {
                delete_before: added,
                restore,
                selection,
            });
        }

        let mut success = false;
        if let Some(id) = rewrite.command_id.as_deref() {
            match EditCommand::parse(id, &rewrite.args) {
                Some(cmd) => {
                    success = self.run_command(&cmd);
                    if !success && added > 0 {
                        // Roll back the provisional commit of the
                        // triggering utterance.
                        if let Some(inverse) = self.undo_stack.pop() {
                            let _ = self.exec(&inverse);
                        }
                    }
                }
                None => {
                    if self.verbose {
                        eprintln!("[EDITOR] no such command: {id}");
                    }
                }
            }
        } else {
            self.pending.push(text_rewritten);
            if self.pending.len() > MAX_UTTERANCES_IN_COMMAND {
                let excess = self.pending.len() - MAX_UTTERANCES_IN_COMMAND;
                self.pending.drain(..excess);
            }
        }

        self.prev_text.clear();
        self.added_length = 0;
        EditOutcome { success, rewrite }
    }

    /// Commits a partial recognition result, retyping only the suffix
    /// that differs from the previous partial. Refused while a
    /// selection exists.
    pub fn commit_partial_result(&mut self, text: &str) -> bool {
        if !self.buf.selected_text().is_empty() {
            return false;
        }
        let mut current = text.to_string();
        for ruleset in &self.rewriters {
            let rewrite = ruleset.rewrite(&current);
            current = rewrite.text.clone();
            if rewrite.is_command() {
                // Commands run only on final results.
                break;
            }
        }
        self.commit_with_overwrite(&current);
        self.prev_text = current;
        true
    }

    /// Classifies one utterance against the pending window, longest
    /// concatenation first. A windowed match retroactively undoes the
    /// already-committed window entries.
    fn apply_command(&mut self, text: &str) -> Rewrite {
        let len = self.pending.len();
        let mut matched: Option<(usize, Rewrite)> = None;
        'window: for i in (1..=MAX_UTTERANCES_IN_COMMAND.min(len)).rev() {
            let mut candidate = self.pending[len - i..].join(" ");
            candidate.push(' ');
            candidate.push_str(text);
            for ruleset in &self.rewriters {
                let rewrite = ruleset.rewrite(&candidate);
                if rewrite.is_command() {
                    matched = Some((i, rewrite));
                    break 'window;
                }
            }
        }
        if let Some((i, rewrite)) = matched {
            if self.verbose {
                eprintln!("[EDITOR] command spans {i} pending utterance(s)");
            }
            let _ = self.exec(&Op::Cmd(EditCommand::Undo(i)));
            return rewrite;
        }

        let mut current = text.to_string();
        for ruleset in &self.rewriters {
            let rewrite = ruleset.rewrite(&current);
            if rewrite.is_command() {
                return rewrite;
            }
            current = rewrite.text;
        }
        Rewrite::plain(current)
    }

    /// Commits `text` against the previous partial result: deletes the
    /// stale suffix, then types the new one with glue and
    /// capitalization. Returns the total chars added by the current
    /// utterance.
    fn commit_with_overwrite(&mut self, text: &str) -> usize {
        let common = text::greatest_common_prefix(&self.prev_text, text);
        let common_len = common.chars().count();
        let prev_len = self.prev_text.chars().count();
        let text_len = text.chars().count();
        let deletable = prev_len - common_len;

        self.buf.begin_batch_edit();
        if deletable > 0 {
            self.buf.delete_surrounding(deletable, 0);
        }
        if text.is_empty() || common_len == text_len {
            self.added_length = self.added_length.saturating_sub(deletable);
        } else if common_len == 0 {
            let left_context = self.buf.text_before_cursor(MAX_DELETABLE_CONTEXT);
            let glue = text::glue(text, &left_context);
            let capitalized = text::capitalize_if_needed(text, &left_context);
            self.added_length = glue.chars().count() + text_len;
            self.buf.commit_text(&format!("{glue}{capitalized}"));
        } else {
            let to_add: String = text.chars().skip(common_len).collect();
            let capitalized = text::capitalize_if_needed(&to_add, &common);
            self.added_length =
                self.added_length.saturating_sub(deletable) + to_add.chars().count();
            self.buf.commit_text(&capitalized);
        }
        self.buf.end_batch_edit();
        self.added_length
    }

    /// Executes an op and returns its exact inverse; `None` means the
    /// op failed and the buffer is unchanged.
    fn exec(&mut self, op: &Op) -> Option<Op> {
        match op {
            Op::NoOp => Some(Op::NoOp),
            Op::Cmd(cmd) => self.exec_cmd(cmd),
            Op::Combined(ops) => self.batch(|ed| {
                let mut inverses: Vec<Op> = Vec::new();
                for member in ops {
                    match ed.exec(member) {
                        Some(inv) => {
                            if !inv.is_no_op() {
                                inverses.push(inv);
                            }
                        }
                        None => {
                            // Roll the already-run prefix back.
                            for inv in inverses.iter().rev() {
                                let _ = ed.exec(inv);
                            }
                            return None;
                        }
                    }
                }
                if inverses.is_empty() {
                    return Some(Op::NoOp);
                }
                inverses.reverse();
                Some(Op::Combined(inverses))
            }),
            Op::SetSelection { start, end } => self.set_selection(*start, *end),
            Op::RestoreText {
                delete_before,
                restore,
                selection,
            } => self.batch(|ed| {
                let removed = if *delete_before > 0 {
                    ed.buf.text_before_cursor(*delete_before)
                } else {
                    String::new()
                };
                if !ed.buf.delete_surrounding(*delete_before, 0) {
                    return None;
                }
                if let Some(text) = restore {
                    if !ed.buf.commit_text(text) {
                        ed.buf.commit_text(&removed);
                        return None;
                    }
                }
                if let Some((start, end)) = selection {
                    if !ed.buf.set_selection(*start, *end) {
                        if let Some(text) = restore {
                            ed.buf.delete_surrounding(text.chars().count(), 0);
                        }
                        ed.buf.commit_text(&removed);
                        return None;
                    }
                }
                Some(Op::NoOp)
            }),
        }
    }

    fn exec_cmd(&mut self, cmd: &EditCommand) -> Option<Op> {
        use EditCommand as C;
        match cmd {
            C::KeyUp => self
                .buf
                .send_key(ArrowKey::Up)
                .then(|| Op::Cmd(C::KeyDown)),
            C::KeyDown => self
                .buf
                .send_key(ArrowKey::Down)
                .then(|| Op::Cmd(C::KeyUp)),
            C::KeyLeft => self
                .buf
                .send_key(ArrowKey::Left)
                .then(|| Op::Cmd(C::KeyRight)),
            C::KeyRight => self
                .buf
                .send_key(ArrowKey::Right)
                .then(|| Op::Cmd(C::KeyLeft)),
            C::PreviousField => self
                .buf
                .editor_action(crate::command::EditorAction::Previous)
                .then(|| Op::NoOp),
            C::NextField => self
                .buf
                .editor_action(crate::command::EditorAction::Next)
                .then(|| Op::NoOp),
            C::GoToEnd => self.move_abs(-1),
            C::MoveAbs(pos) => self.move_abs(*pos),
            C::MoveRel(n) => self.move_rel(*n, SelEdge::Both),
            C::MoveRelSel(n, edge) => self.move_rel(*n, *edge),
            C::Select(query) => self.batch(|ed| {
                let query = functions::expand_sel(query, &ed.buf.selected_text());
                let (sel_start, _) = ed.buf.selection();
                let before: String = ed.buf.text().chars().take(sel_start).collect();
                let (idx, matched) = text::last_index_of(&query, &before)?;
                ed.set_selection(idx, idx + matched.chars().count())
            }),
            C::SelectAll => {
                let len = self.buf.len();
                self.set_selection(0, len)
            }
            C::SelectReBefore(pattern) => self.batch(|ed| {
                let re = Regex::new(pattern).ok()?;
                let (sel_start, _) = ed.buf.selection();
                let before: String = ed.buf.text().chars().take(sel_start).collect();
                let (start, end) = text::match_nth(&re, &before, 0)?;
                ed.set_selection(start, end)
            }),
            C::SelectReAfter(pattern, n) => self.batch(|ed| {
                let re = Regex::new(pattern).ok()?;
                let (_, sel_end) = ed.buf.selection();
                let after: String = ed.buf.text().chars().skip(sel_end).collect();
                let (start, end) = text::match_nth(&re, &after, *n)?;
                ed.set_selection(sel_end + start, sel_end + end)
            }),
            C::SelectRe(pattern, apply_to_selection) => self.batch(|ed| {
                let (start, end) = ed.buf.selection();
                if !apply_to_selection && start != end {
                    return None;
                }
                let re = Regex::new(pattern).ok()?;
                let full = ed.buf.text();
                let (s, e) = text::match_at_pos(&re, &full, start, end)?;
                ed.set_selection(s, e)
            }),
            C::Delete(query) => self.replace(query, ""),
            C::Replace(query, replacement) => self.replace(query, replacement),
            C::ReplaceSel(template) => self.batch(|ed| {
                let old = ed.buf.selected_text();
                let full = ed.buf.text();
                let new = functions::expand_all(template, &old, &full);
                ed.commit_over_selection(&old, &new)
            }),
            C::ReplaceSelRe(pattern, template) => self.batch(|ed| {
                let re = Regex::new(pattern).ok()?;
                let old = ed.buf.selected_text();
                let new = re
                    .replace_all(&old, rules::brace_group_refs(template).as_str())
                    .into_owned();
                ed.commit_over_selection(&old, &new)
            }),
            C::UcSel => self.batch(|ed| {
                let old = ed.buf.selected_text();
                let new = old.to_uppercase();
                ed.commit_over_selection(&old, &new)
            }),
            C::LcSel => self.batch(|ed| {
                let old = ed.buf.selected_text();
                let new = old.to_lowercase();
                ed.commit_over_selection(&old, &new)
            }),
            C::IncSel => self.batch(|ed| {
                let old = ed.buf.selected_text();
                let n: i64 = old.parse().ok()?;
                let n = n.checked_add(1)?;
                ed.commit_over_selection(&old, &n.to_string())
            }),
            C::DeleteLeftWord => self.batch(|ed| {
                let selected = ed.buf.selected_text();
                if !selected.is_empty() {
                    return ed.commit_over_selection(&selected, "");
                }
                let before = ed.buf.text_before_cursor(MAX_DELETABLE_CONTEXT);
                // Word right at the cursor: delete it with its leading
                // whitespace. Non-word tail after the last word: delete
                // only the tail. No word at all: delete everything.
                let mut start = 0;
                for m in WHITESPACE_AND_TOKEN.find_iter(&before) {
                    start = if m.end() == before.len() {
                        m.start()
                    } else {
                        m.end()
                    };
                }
                let deleted = before[start..].to_string();
                if deleted.is_empty() {
                    return None;
                }
                if !ed.buf.delete_surrounding(deleted.chars().count(), 0) {
                    return None;
                }
                Some(Op::RestoreText {
                    delete_before: 0,
                    restore: Some(deleted),
                    selection: None,
                })
            }),
            C::DeleteLeftChars(n) => self.batch(|ed| {
                let selected = ed.buf.selected_text();
                if !selected.is_empty() {
                    return ed.commit_over_selection(&selected, "");
                }
                let before = ed.buf.text_before_cursor(*n);
                if before.is_empty() {
                    return None;
                }
                if !ed.buf.delete_surrounding(before.chars().count(), 0) {
                    return None;
                }
                Some(Op::RestoreText {
                    delete_before: 0,
                    restore: Some(before),
                    selection: None,
                })
            }),
            C::AddSpace => self.batch(|ed| {
                let old = ed.buf.selected_text();
                ed.commit_over_selection(&old, " ")
            }),
            C::AddNewline => self.batch(|ed| {
                let old = ed.buf.selected_text();
                ed.commit_over_selection(&old, "\n")
            }),
            C::Cut => self
                .buf
                .context_menu_action(ContextAction::Cut)
                .then(|| Op::NoOp),
            C::Copy => self
                .buf
                .context_menu_action(ContextAction::Copy)
                .then(|| Op::NoOp),
            C::Paste => self
                .buf
                .context_menu_action(ContextAction::Paste)
                .then(|| Op::NoOp),
            C::CutAll => self.exec(&Op::Combined(vec![
                Op::Cmd(C::SelectAll),
                Op::Cmd(C::Cut),
            ])),
            C::CopyAll => self.exec(&Op::Combined(vec![
                Op::Cmd(C::SelectAll),
                Op::Cmd(C::Copy),
            ])),
            C::DeleteAll => self.batch(|ed| {
                let (old_start, old_end) = ed.buf.selection();
                let len = ed.buf.len();
                if !ed.buf.set_selection(0, len) {
                    return None;
                }
                if !ed.buf.commit_text("") {
                    ed.buf.set_selection(old_start, old_end);
                    return None;
                }
                // Deliberately not undoable.
                Some(Op::NoOp)
            }),
            C::Undo(steps) => self.batch(|ed| {
                for _ in 0..*steps {
                    let inverse = ed.undo_stack.pop()?;
                    if ed.verbose {
                        eprintln!("[EDITOR] undo: {inverse}");
                    }
                    ed.exec(&inverse)?;
                }
                Some(Op::NoOp)
            }),
            C::Combine(n) => {
                if self.op_stack.len() < *n {
                    return None;
                }
                let at = self.op_stack.len() - n;
                let ops = self.op_stack.split_off(at);
                if self.verbose {
                    eprintln!("[EDITOR] combined {n} op(s)");
                }
                self.op_stack.push(Op::Combined(ops));
                Some(Op::NoOp)
            }
            C::Apply(steps) => {
                let op = self.op_stack.last().cloned()?;
                self.batch(|ed| {
                    let mut ran = 0usize;
                    let mut inverses: Vec<Op> = Vec::new();
                    for _ in 0..*steps {
                        match ed.exec(&op) {
                            Some(inv) => {
                                ran += 1;
                                if !inv.is_no_op() {
                                    inverses.push(inv);
                                }
                            }
                            None => break,
                        }
                    }
                    if ran == 0 {
                        return None;
                    }
                    if inverses.is_empty() {
                        return Some(Op::NoOp);
                    }
                    inverses.reverse();
                    Some(Op::Combined(inverses))
                })
            }
            C::KeyCode(code) => self.buf.send_key_code(*code).then(|| Op::NoOp),
            C::KeyCodeStr(name) => {
                let code = buffer::key_code_from_str(name)?;
                self.buf.send_key_code(code).then(|| Op::NoOp)
            }
            C::ImeAction(action) => self.buf.editor_action(*action).then(|| Op::NoOp),
            C::SaveClip(key, value) => {
                let value = functions::expand_sel(value, &self.buf.selected_text());
                self.clips.insert(key.clone(), value);
                Some(Op::NoOp)
            }
            C::LoadClip(key) => {
                let value = self.clips.get(key).cloned()?;
                self.batch(|ed| {
                    let old = ed.buf.selected_text();
                    ed.commit_over_selection(&old, &value)
                })
            }
            C::ShowClipboard => {
                if self.clips.is_empty() {
                    return None;
                }
                let mut keys: Vec<&String> = self.clips.keys().collect();
                keys.sort();
                let listing: String = keys
                    .iter()
                    .map(|k| format!("<{k}|{}>\n", self.clips[*k]))
                    .collect();
                self.batch(|ed| {
                    let old = ed.buf.selected_text();
                    ed.commit_over_selection(&old, &listing)
                })
            }
            C::ClearClipboard => {
                self.clips.clear();
                Some(Op::NoOp)
            }
            C::GetUrl(url) => {
                let body = match self.fetcher.as_ref() {
                    None => return None,
                    Some(fetcher) => match fetcher.fetch(url) {
                        Ok(body) => body,
                        Err(e) => format!("[ERROR: Unable to retrieve {url}: {e}]"),
                    },
                };
                // The body lands through the normal undoable path.
                self.run_op(Op::Cmd(C::ReplaceSel(body)));
                Some(Op::NoOp)
            }
            C::Activity(spec) => {
                let spec = functions::expand_sel(spec, &self.buf.selected_text());
                match self.launcher.as_ref() {
                    None => None,
                    Some(launcher) => launcher.launch(&spec).then(|| Op::NoOp),
                }
            }
        }
    }

    fn batch(&mut self, f: impl FnOnce(&mut Self) -> Option<Op>) -> Option<Op> {
        self.buf.begin_batch_edit();
        let out = f(self);
        self.buf.end_batch_edit();
        out
    }

    fn set_selection(&mut self, start: usize, end: usize) -> Option<Op> {
        let (old_start, old_end) = self.buf.selection();
        if self.buf.set_selection(start, end) {
            Some(Op::SetSelection {
                start: old_start,
                end: old_end,
            })
        } else {
            None
        }
    }

    fn move_abs(&mut self, pos: i64) -> Option<Op> {
        let len = self.buf.len() as i64;
        let target = if pos < 0 { len + pos + 1 } else { pos };
        if target < 0 || target > len {
            return None;
        }
        self.set_selection(target as usize, target as usize)
    }

    fn move_rel(&mut self, n: i64, edge: SelEdge) -> Option<Op> {
        let (start, end) = self.buf.selection();
        let (new_start, new_end) = match edge {
            SelEdge::Start => (start as i64 + n, end as i64),
            SelEdge::End => (start as i64, end as i64 + n),
            SelEdge::Both => {
                let cursor = if n < 0 { start as i64 + n } else { end as i64 + n };
                (cursor, cursor)
            }
        };
        if new_start < 0 || new_end < 0 || new_start > new_end {
            return None;
        }
        self.set_selection(new_start as usize, new_end as usize)
    }

    /// Replaces the last occurrence of `query` before the cursor. The
    /// query is taken literally; `@sel()` expands only in `select`.
    fn replace(&mut self, query: &str, replacement: &str) -> Option<Op> {
        self.batch(|ed| {
            let old_sel = ed.buf.selection();
            let before: String = ed.buf.text().chars().take(old_sel.0).collect();
            let (idx, matched) = text::last_index_of(query, &before)?;
            let match_len = matched.chars().count();
            if !ed.buf.set_selection(idx + match_len, idx + match_len) {
                return None;
            }
            if !ed.buf.delete_surrounding(match_len, 0) {
                ed.buf.set_selection(old_sel.0, old_sel.1);
                return None;
            }
            let delete_before = if replacement.is_empty() {
                0
            } else {
                if !ed.buf.commit_text(replacement) {
                    ed.buf.commit_text(&matched);
                    ed.buf.set_selection(old_sel.0, old_sel.1);
                    return None;
                }
                replacement.chars().count()
            };
            Some(Op::RestoreText {
                delete_before,
                restore: Some(matched),
                selection: Some(old_sel),
            })
        })
    }

    /// Commits `new` over the selection; the inverse restores `old`
    /// and the original selection.
    fn commit_over_selection(&mut self, old: &str, new: &str) -> Option<Op> {
        let old_sel = self.buf.selection();
        if !self.buf.commit_text(new) {
            return None;
        }
        Some(Op::RestoreText {
            delete_before: new.chars().count(),
            restore: Some(old.to_string()),
            selection: Some(old_sel),
        })
    }

    fn push_undo(&mut self, op: Op) {
        if self.verbose {
            eprintln!("[EDITOR] push undo: {op}");
        }
        self.undo_stack.push(op);
    }
}
