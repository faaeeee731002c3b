//! Ordered rule sets: utterance classification and the tab-separated
//! on-disk format.
//!
//! A rule set scans its rules in order. Plain rules rewrite the text
//! and the scan continues with the rewritten form; command rules fire
//! only when their trigger matches the whole utterance, and the first
//! one that fires wins.

use std::fmt;

use crate::context::EditorContext;
use crate::rules::{self, Rule, RuleSyntaxError};

pub const HEADER_COMMENT: &str = "Comment";
pub const HEADER_LOCALE: &str = "Locale";
pub const HEADER_SERVICE: &str = "Service";
pub const HEADER_APP: &str = "App";
pub const HEADER_UTTERANCE: &str = "Utterance";
pub const HEADER_REPLACEMENT: &str = "Replacement";
pub const HEADER_COMMAND: &str = "Command";
pub const HEADER_ARG1: &str = "Arg1";
pub const HEADER_ARG2: &str = "Arg2";

const COLUMNS: [&str; 9] = [
    HEADER_COMMENT,
    HEADER_LOCALE,
    HEADER_SERVICE,
    HEADER_APP,
    HEADER_UTTERANCE,
    HEADER_REPLACEMENT,
    HEADER_COMMAND,
    HEADER_ARG1,
    HEADER_ARG2,
];

/// The outcome of classifying one utterance.
#[derive(Debug, Clone, PartialEq)]
pub struct Rewrite {
    pub text: String,
    pub command_id: Option<String>,
    pub args: Vec<String>,
}

impl Rewrite {
    pub fn plain(text: impl Into<String>) -> Self {
        Rewrite {
            text: text.into(),
            command_id: None,
            args: Vec::new(),
        }
    }

    pub fn is_command(&self) -> bool {
        self.command_id.is_some()
    }
}

impl fmt::Display for Rewrite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.command_id {
            Some(id) => write!(f, "{}({})", id, self.args.join(", ")),
            None => write!(f, "dictation({})", self.text),
        }
    }
}

/// An ordered list of rules plus the header they serialize under.
#[derive(Debug, Clone)]
pub struct RuleSet {
    header: Vec<String>,
    rules: Vec<Rule>,
}

/// Sentinel error rules are load-time diagnostics, not content: two
/// rule sets are equal when their real rules are.
impl PartialEq for RuleSet {
    fn eq(&self, other: &Self) -> bool {
        self.header == other.header
            && self
                .rules
                .iter()
                .filter(|r| !r.is_error())
                .eq(other.rules.iter().filter(|r| !r.is_error()))
    }
}

impl RuleSet {
    /// Builds a rule set programmatically; serializes with the full
    /// column set.
    pub fn new(rules: Vec<Rule>) -> Self {
        RuleSet {
            header: COLUMNS.iter().map(|c| c.to_string()).collect(),
            rules,
        }
    }

    /// Parses a TSV document: first line is the header, every further
    /// line a rule row. Rows that fail to compile become inert sentinel
    /// rules prepended to the list.
    pub fn load(tsv: &str) -> Self {
        Self::load_with_context(tsv, None)
    }

    /// Like [`RuleSet::load`], but drops rules whose Locale/Service/App
    /// filters reject the given context.
    pub fn load_with_context(tsv: &str, context: Option<&EditorContext>) -> Self {
        let mut lines = tsv.lines();
        let header: Vec<String> = match lines.next() {
            Some(line) => line
                .split('\t')
                .filter(|c| COLUMNS.contains(c))
                .map(|c| c.to_string())
                .collect(),
            None => Vec::new(),
        };
        let mut rules = Vec::new();
        let mut errors = Vec::new();
        for (idx, line) in lines.enumerate() {
            match compile_row(&header, line, context) {
                Ok(Some(rule)) => rules.push(rule),
                Ok(None) => {}
                // Header line is line 1, first row line 2.
                Err(message) => errors.push(RuleSyntaxError {
                    line: idx + 2,
                    message,
                }),
            }
        }
        let mut all: Vec<Rule> = errors
            .iter()
            .map(|e| Rule::error(e.line, &e.message))
            .collect();
        all.extend(rules);
        RuleSet { header, rules: all }
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Comments of the sentinel rules, in order ("line N: message").
    pub fn errors(&self) -> Vec<String> {
        self.rules
            .iter()
            .filter(|r| r.is_error())
            .map(|r| r.comment().to_string())
            .collect()
    }

    /// Classifies one utterance: scans the rules in order, chaining
    /// plain rewrites; the first command rule that matches the whole
    /// (rewritten) utterance terminates the scan.
    pub fn rewrite(&self, utterance: &str) -> Rewrite {
        let mut text = utterance.to_string();
        for rule in &self.rules {
            if rule.is_error() {
                continue;
            }
            let (rewritten, full_match) = rule.apply(&text);
            match rule.command_id() {
                None => text = rewritten,
                Some(id) => {
                    if let Some(args) = full_match {
                        return Rewrite {
                            text: rewritten,
                            command_id: Some(id.to_string()),
                            args,
                        };
                    }
                }
            }
        }
        Rewrite::plain(text)
    }

    /// Rewritten text of one utterance, commands included (their text
    /// is the evaluated replacement).
    pub fn rewrite_text(&self, utterance: &str) -> String {
        self.rewrite(utterance).text
    }

    /// Rewrites each hypothesis of an n-best list.
    pub fn rewrite_all(&self, utterances: &[String]) -> Vec<String> {
        utterances.iter().map(|u| self.rewrite_text(u)).collect()
    }

    /// Serializes back to TSV under the loaded header. Sentinel error
    /// rules are omitted, so loading the output yields an equal set
    /// with the bad rows gone. Unescapable content (a replacement
    /// ending in a tab) does not round-trip; everything written by
    /// [`RuleSet::to_tsv`] itself does.
    pub fn to_tsv(&self) -> String {
        let mut out = self.header.join("\t");
        for rule in self.rules.iter().filter(|r| !r.is_error()) {
            out.push('\n');
            let mut first = true;
            for column in &self.header {
                if !first {
                    out.push('\t');
                }
                first = false;
                out.push_str(&rules::escape(&field_for(rule, column)));
            }
        }
        out
    }
}

fn field_for(rule: &Rule, column: &str) -> String {
    match column {
        HEADER_COMMENT => rule.comment().to_string(),
        HEADER_LOCALE => rule.locale_pattern().unwrap_or("").to_string(),
        HEADER_SERVICE => rule.service_pattern().unwrap_or("").to_string(),
        HEADER_APP => rule.app_pattern().unwrap_or("").to_string(),
        HEADER_UTTERANCE => rule.trigger_pattern().to_string(),
        HEADER_REPLACEMENT => rule.replacement().to_string(),
        HEADER_COMMAND => rule.command_id().unwrap_or("").to_string(),
        HEADER_ARG1 => rule.args().first().cloned().unwrap_or_default(),
        HEADER_ARG2 => rule.args().get(1).cloned().unwrap_or_default(),
        _ => String::new(),
    }
}

/// Compiles one TSV row. `Ok(None)` means the row is skippable (blank,
/// comment, too short, or rejected by the context); `Err` carries the
/// message for a sentinel rule.
fn compile_row(
    header: &[String],
    line: &str,
    context: Option<&EditorContext>,
) -> Result<Option<Rule>, String> {
    // A trailing empty field is indistinguishable from padding, so
    // trailing tabs are stripped before splitting.
    let line = line.trim_end_matches('\t');
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }
    let fields: Vec<&str> = line.split('\t').collect();
    if fields.len() < 2 {
        return Ok(None);
    }

    let mut comment = String::new();
    let mut locale = None;
    let mut service = None;
    let mut app = None;
    let mut trigger: Option<String> = None;
    let mut replacement = String::new();
    let mut command_id: Option<String> = None;
    let mut arg1: Option<String> = None;
    let mut arg2: Option<String> = None;

    for (column, field) in header.iter().zip(fields.iter()) {
        match column.as_str() {
            HEADER_COMMENT => comment = field.trim().to_string(),
            HEADER_LOCALE => {
                locale = compile_filter_field(field, "Locale")?;
            }
            HEADER_SERVICE => {
                service = compile_filter_field(field, "Service")?;
            }
            HEADER_APP => {
                app = compile_filter_field(field, "App")?;
            }
            HEADER_UTTERANCE => trigger = Some(field.trim().to_string()),
            HEADER_REPLACEMENT => replacement = rules::unescape(field),
            HEADER_COMMAND => {
                let id = rules::unescape(field.trim());
                if !id.is_empty() {
                    command_id = Some(id);
                }
            }
            HEADER_ARG1 => arg1 = Some(rules::unescape(field)),
            HEADER_ARG2 => arg2 = Some(rules::unescape(field)),
            _ => {}
        }
    }

    let trigger = match trigger {
        Some(t) if !t.is_empty() => t,
        _ => return Err("empty Utterance".to_string()),
    };

    if let Some(ctx) = context {
        if !ctx.admits(locale.as_ref(), service.as_ref(), app.as_ref()) {
            return Ok(None);
        }
    }

    let args = match (arg1, arg2) {
        (None, _) => Vec::new(),
        (Some(a), None) => vec![a],
        (Some(a), Some(b)) => vec![a, b],
    };

    Rule::build(
        comment,
        locale,
        service,
        app,
        &trigger,
        &replacement,
        command_id,
        args,
    )
    .map(Some)
    .map_err(|e| e.to_string())
}

/// An empty filter field means "no filter".
fn compile_filter_field(
    field: &str,
    column: &str,
) -> Result<Option<regex::Regex>, String> {
    let field = field.trim();
    if field.is_empty() {
        return Ok(None);
    }
    rules::compile_filter(field)
        .map(Some)
        .map_err(|e| format!("bad {column} pattern: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "Comment\tLocale\tService\tApp\tUtterance\tReplacement\tCommand\tArg1\tArg2";

    #[test]
    fn test_chained_plain_rewrites() {
        let tsv = "Utterance\tReplacement\nold_word\tnew_word\nnew_word\tnewer_word";
        let rs = RuleSet::load(tsv);
        assert_eq!(rs.rewrite_text("say old_word"), "say newer_word");
    }

    #[test]
    fn test_command_terminates_scan_on_full_match_only() {
        let tsv = format!(
            "{HEADER}\n\t\t\t\tdelete (.*)\t\tdelete\t$1\t\n\t\t\t\tI (.*)\tyou $1\t\t\t"
        );
        let rs = RuleSet::load(&tsv);

        let rw = rs.rewrite("delete some words");
        assert!(rw.is_command());
        assert_eq!(rw.command_id.as_deref(), Some("delete"));
        assert_eq!(rw.args, vec!["some words".to_string()]);

        // Partial command match falls through to the plain rules.
        let rw = rs.rewrite("I will delete some words");
        assert!(!rw.is_command());
        assert_eq!(rw.text, "you will delete some words");
    }

    #[test]
    fn test_replacement_and_args_share_captures() {
        let tsv = format!("{HEADER}\n\t\t\t\ts/(.*)/(.*)/\tX\treplace\t$1\t$2");
        let rs = RuleSet::load(&tsv);
        let rw = rs.rewrite("s/re/ri/");
        assert_eq!(rw.text, "X");
        assert_eq!(rw.command_id.as_deref(), Some("replace"));
        assert_eq!(rw.args, vec!["re".to_string(), "ri".to_string()]);
    }

    #[test]
    fn test_comment_and_short_rows_skipped() {
        let tsv = "Utterance\tReplacement\n# a comment line\nonly_one_field\nfoo\tbar";
        let rs = RuleSet::load(tsv);
        assert_eq!(rs.rules().len(), 1);
        assert_eq!(rs.rewrite_text("foo"), "bar");
    }

    #[test]
    fn test_bad_regex_becomes_prepended_sentinel() {
        let tsv = "Utterance\tReplacement\nok\tfine\n([unclosed\toops";
        let rs = RuleSet::load(tsv);
        assert_eq!(rs.rules().len(), 2);
        assert!(rs.rules()[0].is_error());
        assert!(rs.rules()[0].comment().starts_with("line 3:"));
        assert_eq!(rs.errors().len(), 1);
        // The sentinel never fires; the good rule still works.
        assert_eq!(rs.rewrite_text("ok"), "fine");
    }

    #[test]
    fn test_context_filtering_drops_rejected_rules() {
        let tsv = format!(
            "{HEADER}\n\ten.*\t\t\tcolour\tcolor\t\t\t\n\tet.*\t\t\ttere\thello\t\t\t"
        );
        let ctx = EditorContext::new(Some("en-US".to_string()), None, None);
        let rs = RuleSet::load_with_context(&tsv, Some(&ctx));
        assert_eq!(rs.rules().len(), 1);
        assert_eq!(rs.rewrite_text("colour"), "color");
        assert_eq!(rs.rewrite_text("tere"), "tere");
    }

    #[test]
    fn test_tsv_round_trip_is_stable_after_one_pass() {
        let tsv = format!(
            "{HEADER}\nnote\t\t\t\ts/(.*)/(.*)/\tX\treplace\t$1\t$2\n\t\t\t\tnew line\t\\n\t\t\t"
        );
        let rs = RuleSet::load(&tsv);
        let once = rs.to_tsv();
        let again = RuleSet::load(&once);
        assert_eq!(rs, again);
        assert_eq!(once, again.to_tsv());
    }

    #[test]
    fn test_round_trip_with_a_bad_row_preserves_equality() {
        let tsv = "Utterance\tReplacement\nok\tfine\n([unclosed\toops";
        let rs = RuleSet::load(tsv);
        assert_eq!(rs.errors().len(), 1);
        let again = RuleSet::load(&rs.to_tsv());
        // The sentinel is not serialized; the sets are still equal.
        assert_eq!(rs, again);
        assert!(again.errors().is_empty());
        assert_eq!(RuleSet::load(&again.to_tsv()), again);
    }

    #[test]
    fn test_rewrite_all_maps_each_hypothesis() {
        let rs = RuleSet::load("Utterance\tReplacement\nold\tnew");
        let out = rs.rewrite_all(&["old one".to_string(), "two old".to_string()]);
        assert_eq!(out, vec!["new one".to_string(), "two new".to_string()]);
    }
}
