//! Rewrite rule model: a trigger pattern plus either a plain text
//! replacement or a named command with argument templates.

use std::fmt;

use regex::{Regex, RegexBuilder};

/// Trigger that can never match any input. Used for sentinel rules that
/// stand in for rows which failed to compile.
pub const NEVER_MATCH: &str = r"[^\s\S]";

/// A rule row that could not be compiled. Carries the 1-based line
/// number of the offending row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleSyntaxError {
    pub line: usize,
    pub message: String,
}

impl fmt::Display for RuleSyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {}", self.line, self.message)
    }
}

impl std::error::Error for RuleSyntaxError {}

/// A single rewrite rule.
///
/// The trigger is compiled twice: once as written, for chained plain
/// rewrites (`replace_all`), and once wrapped in `\A(?: .. )\z` for
/// whole-utterance command matching. Both forms are case-insensitive,
/// multi-line, and dot-matches-newline; the wrapper is needed because
/// `^`/`$` anchor at line boundaries under multi-line mode.
#[derive(Debug, Clone)]
pub struct Rule {
    comment: String,
    locale: Option<Regex>,
    service: Option<Regex>,
    app: Option<Regex>,
    trigger: Regex,
    trigger_full: Regex,
    trigger_src: String,
    replacement: String,
    replacement_tpl: String,
    command_id: Option<String>,
    args: Vec<String>,
    args_tpl: Vec<String>,
    is_error: bool,
}

impl Rule {
    /// Plain rewrite rule: trigger pattern and replacement template.
    pub fn new(trigger: &str, replacement: &str) -> Result<Self, regex::Error> {
        Self::build(
            String::new(),
            None,
            None,
            None,
            trigger,
            replacement,
            None,
            Vec::new(),
        )
    }

    /// Command rule: fires only on a whole-utterance match.
    pub fn command(
        trigger: &str,
        replacement: &str,
        id: &str,
        args: &[&str],
    ) -> Result<Self, regex::Error> {
        Self::build(
            String::new(),
            None,
            None,
            None,
            trigger,
            replacement,
            Some(id.to_string()),
            args.iter().map(|a| a.to_string()).collect(),
        )
    }

    #[allow(clippy::too_many_arguments)]
    pub(crate) fn build(
        comment: String,
        locale: Option<Regex>,
        service: Option<Regex>,
        app: Option<Regex>,
        trigger: &str,
        replacement: &str,
        command_id: Option<String>,
        args: Vec<String>,
    ) -> Result<Self, regex::Error> {
        let (plain, full) = compile_trigger(trigger)?;
        let args_tpl = args.iter().map(|a| brace_group_refs(a)).collect();
        Ok(Rule {
            comment,
            locale,
            service,
            app,
            trigger: plain,
            trigger_full: full,
            trigger_src: trigger.to_string(),
            replacement_tpl: brace_group_refs(replacement),
            replacement: replacement.to_string(),
            command_id,
            args,
            args_tpl,
            is_error: false,
        })
    }

    /// Sentinel rule recording a row that failed to compile. Its
    /// trigger never matches, so it is inert during classification but
    /// survives serialization.
    pub fn error(line: usize, message: &str) -> Self {
        let err = RuleSyntaxError {
            line,
            message: message.to_string(),
        };
        let (plain, full) = compile_trigger(NEVER_MATCH).expect("sentinel pattern compiles");
        Rule {
            comment: err.to_string(),
            locale: None,
            service: None,
            app: None,
            trigger: plain,
            trigger_full: full,
            trigger_src: NEVER_MATCH.to_string(),
            replacement: String::new(),
            replacement_tpl: String::new(),
            command_id: None,
            args: Vec::new(),
            args_tpl: Vec::new(),
            is_error: true,
        }
    }

    pub fn comment(&self) -> &str {
        &self.comment
    }

    pub fn trigger_pattern(&self) -> &str {
        &self.trigger_src
    }

    pub fn replacement(&self) -> &str {
        &self.replacement
    }

    pub fn command_id(&self) -> Option<&str> {
        self.command_id.as_deref()
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    pub fn is_command(&self) -> bool {
        self.command_id.is_some()
    }

    pub fn is_error(&self) -> bool {
        self.is_error
    }

    pub(crate) fn locale_pattern(&self) -> Option<&str> {
        self.locale.as_ref().map(filter_source)
    }

    pub(crate) fn service_pattern(&self) -> Option<&str> {
        self.service.as_ref().map(filter_source)
    }

    pub(crate) fn app_pattern(&self) -> Option<&str> {
        self.app.as_ref().map(filter_source)
    }

    /// Applies the rule to one utterance. Returns the rewritten text
    /// and, when the trigger matched the whole utterance, the evaluated
    /// argument templates.
    pub(crate) fn apply(&self, utterance: &str) -> (String, Option<Vec<String>>) {
        if let Some(caps) = self.trigger_full.captures(utterance) {
            let mut text = String::new();
            caps.expand(&self.replacement_tpl, &mut text);
            let args = self
                .args_tpl
                .iter()
                .map(|tpl| {
                    let mut arg = String::new();
                    caps.expand(tpl, &mut arg);
                    arg
                })
                .collect();
            (text, Some(args))
        } else if self.command_id.is_some() {
            // Command rules are all-or-nothing: a partial match leaves
            // the utterance alone.
            (utterance.to_string(), None)
        } else {
            let text = self
                .trigger
                .replace_all(utterance, self.replacement_tpl.as_str())
                .into_owned();
            (text, None)
        }
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.command_id {
            Some(id) => write!(
                f,
                "{} -> {}({})",
                self.trigger_src,
                id,
                self.args.join(", ")
            ),
            None => write!(f, "{} -> {}", self.trigger_src, self.replacement),
        }
    }
}

impl PartialEq for Rule {
    fn eq(&self, other: &Self) -> bool {
        self.comment == other.comment
            && self.locale_pattern() == other.locale_pattern()
            && self.service_pattern() == other.service_pattern()
            && self.app_pattern() == other.app_pattern()
            && self.trigger_src == other.trigger_src
            && self.replacement == other.replacement
            && self.command_id == other.command_id
            && self.args == other.args
            && self.is_error == other.is_error
    }
}

fn filter_source(re: &Regex) -> &str {
    // Filters are stored wrapped in \A(?:..)\z; strip the wrapper back off.
    let src = re.as_str();
    &src[5..src.len() - 3]
}

fn compile_trigger(pattern: &str) -> Result<(Regex, Regex), regex::Error> {
    let plain = RegexBuilder::new(pattern)
        .case_insensitive(true)
        .multi_line(true)
        .dot_matches_new_line(true)
        .build()?;
    let full = RegexBuilder::new(&format!(r"\A(?:{pattern})\z"))
        .case_insensitive(true)
        .multi_line(true)
        .dot_matches_new_line(true)
        .build()?;
    Ok((plain, full))
}

/// Compiles a Locale/Service/App filter. Filters require a full match
/// of the context value, with default regex flags.
pub(crate) fn compile_filter(pattern: &str) -> Result<Regex, regex::Error> {
    Regex::new(&format!(r"\A(?:{pattern})\z"))
}

/// Rewrites `$1`-style group references to `${1}` so that a template
/// like `_$1_` reads as group 1 followed by a literal underscore (the
/// replacement syntax would otherwise look up a group named `1_`).
pub(crate) fn brace_group_refs(template: &str) -> String {
    let mut out = String::with_capacity(template.len());
    let mut chars = template.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '$' {
            out.push(c);
            continue;
        }
        match chars.peek() {
            Some('$') => {
                chars.next();
                out.push_str("$$");
            }
            Some(d) if d.is_ascii_digit() => {
                let mut digits = String::new();
                while let Some(d) = chars.peek() {
                    if d.is_ascii_digit() {
                        digits.push(*d);
                        chars.next();
                    } else {
                        break;
                    }
                }
                out.push_str("${");
                out.push_str(&digits);
                out.push('}');
            }
            _ => out.push('$'),
        }
    }
    out
}

/// Turns the literals `\n` and `\t` back into control characters.
pub fn unescape(text: &str) -> String {
    text.replace("\\n", "\n").replace("\\t", "\t")
}

/// Escapes newlines and tabs so a field survives TSV serialization.
pub fn escape(text: &str) -> String {
    text.replace('\n', "\\n").replace('\t', "\\t")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_rewrite_replaces_all_occurrences() {
        let rule = Rule::new("old_word", "new_word").unwrap();
        let (text, args) = rule.apply("say old_word and OLD_WORD");
        assert_eq!(text, "say new_word and new_word");
        assert!(args.is_none());
    }

    #[test]
    fn test_command_rule_requires_full_match() {
        let rule = Rule::command("delete (.*)", "", "delete", &["$1"]).unwrap();
        let (text, args) = rule.apply("delete everything");
        assert_eq!(text, "");
        assert_eq!(args, Some(vec!["everything".to_string()]));

        let (text, args) = rule.apply("please delete everything");
        assert_eq!(text, "please delete everything");
        assert!(args.is_none());
    }

    #[test]
    fn test_full_match_anchors_span_newlines() {
        // Multi-line mode must not let $ anchor mid-string.
        let rule = Rule::command("select (.*)", "", "select", &["$1"]).unwrap();
        let (_, args) = rule.apply("select abc\ndef");
        assert_eq!(args, Some(vec!["abc\ndef".to_string()]));
    }

    #[test]
    fn test_group_reference_followed_by_word_char() {
        let rule = Rule::command("underscore (.*)", "", "replaceSel", &["_$1_"]).unwrap();
        let (_, args) = rule.apply("underscore some");
        assert_eq!(args, Some(vec!["_some_".to_string()]));
    }

    #[test]
    fn test_error_rule_never_matches() {
        let rule = Rule::error(3, "syntax error in regex");
        assert!(rule.is_error());
        assert_eq!(rule.comment(), "line 3: syntax error in regex");
        let (text, args) = rule.apply("anything at all");
        assert_eq!(text, "anything at all");
        assert!(args.is_none());
    }

    #[test]
    fn test_escape_round_trip() {
        let original = "first\tsecond\nthird";
        assert_eq!(unescape(&escape(original)), original);
        assert_eq!(escape(original), "first\\tsecond\\nthird");
    }
}
