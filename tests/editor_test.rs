//! End-to-end classify -> dispatch -> execute -> undo scenarios,
//! driven through recognition results the way a speech front-end
//! would deliver them.

use voxedit::{CommandEditor, EditCommand, MemBuffer, RuleSet, TextBuffer};

const HEADER: &str = "Utterance\tReplacement\tCommand\tArg1\tArg2";

fn rules() -> RuleSet {
    let rows = [
        "old_word\tnew_word\t\t\t",
        "delete left word\t\tdeleteLeftWord\t\t",
        "connect (.*) and (.*)\t\treplace\t$1 $2\t$1-$2",
        "delete (.*)\t\tdelete\t$1\t",
        "select (.*)\t\tselect\t$1\t",
        "selection_replace (.*)\t\treplaceSel\t$1\t",
        "underscore (.*)\t\treplaceSel\t_$1_\t",
        "undo\t\tundo\t\t",
        "increment\t\tincSel\t\t",
        "uppercase\t\tucSel\t\t",
        "go to position (\\d+)\t\tmoveAbs\t$1\t",
        "maximum position\t\tmoveAbs\t-1\t",
        "cut all\t\tcutAll\t\t",
        "paste\t\tpaste\t\t",
        "bogus command\t\tfrobnicate\t\t",
    ];
    let tsv = format!("{HEADER}\n{}", rows.join("\n"));
    let ruleset = RuleSet::load(&tsv);
    assert!(ruleset.errors().is_empty(), "fixture rules must compile");
    ruleset
}

fn editor() -> CommandEditor<MemBuffer> {
    let mut ed = CommandEditor::new(MemBuffer::new());
    ed.set_rewriters(vec![rules()]);
    ed
}

#[test]
fn test_dictation_capitalizes_and_glues() {
    let mut ed = editor();
    assert!(!ed.commit_final_result("this is a text").is_command());
    assert!(!ed.commit_final_result("and more").is_command());
    assert_eq!(ed.text(), "This is a text and more");
}

#[test]
fn test_plain_rewrite_applies_to_dictation() {
    let mut ed = editor();
    ed.commit_final_result("old_word");
    assert_eq!(ed.text(), "New_word");
}

#[test]
fn test_command_replace_then_undo() {
    let mut ed = editor();
    ed.commit_final_result("test word1 word2");
    let outcome = ed.commit_final_result("connect word1 and word2");
    assert!(outcome.success());
    assert!(outcome.is_command());
    assert_eq!(ed.text(), "Test word1-word2");

    let outcome = ed.commit_final_result("undo");
    assert!(outcome.success());
    assert_eq!(ed.text(), "Test word1 word2");
}

#[test]
fn test_command_spanning_three_utterances() {
    let mut ed = editor();
    ed.commit_final_result("test word1 word2");
    // Committed as interim dictation...
    ed.commit_final_result("connect word1");
    ed.commit_final_result("and");
    assert_eq!(ed.text(), "Test word1 word2 connect word1 and");
    // ...until the last piece completes the command; the interim
    // commits are retroactively undone.
    let outcome = ed.commit_final_result("word2");
    assert!(outcome.success());
    assert_eq!(ed.text(), "Test word1-word2");
}

#[test]
fn test_successful_command_clears_the_pending_window() {
    let mut ed = editor();
    ed.commit_final_result("connect word1");
    assert!(ed.commit_final_result("go to position 0").success());
    // With the window intact this would complete the spanning
    // command; after a command it is plain dictation again.
    let outcome = ed.commit_final_result("and word2");
    assert!(!outcome.is_command());
}

#[test]
fn test_select_and_replace_selection() {
    let mut ed = editor();
    ed.commit_final_result("this is a text");
    assert!(ed.commit_final_result("select is a").success());
    assert_eq!(ed.buffer().selection(), (5, 9));
    assert_eq!(ed.buffer().selected_text(), "is a");

    assert!(ed.commit_final_result("selection_replace is not a").success());
    assert_eq!(ed.text(), "This is not a text");

    assert!(ed.commit_final_result("undo").success());
    assert_eq!(ed.text(), "This is a text");
    assert_eq!(ed.buffer().selection(), (5, 9));
}

#[test]
fn test_underscore_replacement_is_verbatim() {
    let mut ed = editor();
    ed.commit_final_result("this is some text");
    ed.commit_final_result("select some");
    assert!(ed.commit_final_result("underscore some").success());
    assert_eq!(ed.text(), "This is _some_ text");
}

#[test]
fn test_increment_selected_number() {
    let mut ed = editor();
    ed.commit_final_result("order 23");
    ed.commit_final_result("select 23");
    assert!(ed.commit_final_result("increment").success());
    assert_eq!(ed.text(), "Order 24");

    // Incrementing a non-number fails and changes nothing.
    ed.commit_final_result("select Order");
    let before = ed.text();
    let outcome = ed.commit_final_result("increment");
    assert!(!outcome.success());
    assert_eq!(ed.text(), before);
}

#[test]
fn test_uppercase_selection() {
    let mut ed = editor();
    ed.commit_final_result("this is some text");
    ed.commit_final_result("select some");
    assert!(ed.commit_final_result("uppercase").success());
    assert_eq!(ed.text(), "This is SOME text");
}

#[test]
fn test_delete_finds_last_occurrence_before_cursor() {
    let mut ed = editor();
    ed.commit_final_result("I will delete something");
    assert_eq!(ed.text(), "I will delete something");
    assert!(ed.commit_final_result("delete something").success());
    assert_eq!(ed.text(), "I will delete ");
}

#[test]
fn test_delete_left_word() {
    let mut ed = editor();
    ed.commit_final_result("Start12345");
    ed.commit_final_result("67890");
    assert_eq!(ed.text(), "Start12345 67890");
    assert!(ed.commit_final_result("delete left word").success());
    assert_eq!(ed.text(), "Start12345");
    assert!(ed.commit_final_result("delete left word").success());
    assert_eq!(ed.text(), "");
    assert!(ed.commit_final_result("undo").success());
    assert_eq!(ed.text(), "Start12345");
}

#[test]
fn test_undo_dictation_removes_glue_too() {
    let mut ed = editor();
    ed.commit_final_result("hello there");
    ed.commit_final_result("friend");
    assert_eq!(ed.text(), "Hello there friend");
    assert!(ed.commit_final_result("undo").success());
    assert_eq!(ed.text(), "Hello there");
    assert!(ed.commit_final_result("undo").success());
    assert_eq!(ed.text(), "");
}

#[test]
fn test_cut_all_and_paste() {
    let mut ed = editor();
    ed.commit_final_result("word1 word2");
    assert!(ed.commit_final_result("cut all").success());
    assert_eq!(ed.text(), "");
    assert!(ed.commit_final_result("paste").success());
    assert_eq!(ed.text(), "Word1 word2");
    assert!(ed.commit_final_result("paste").success());
    assert_eq!(ed.text(), "Word1 word2Word1 word2");
}

#[test]
fn test_cut_all_is_not_undoable() {
    let mut ed = editor();
    ed.commit_final_result("word1 word2");
    assert!(ed.commit_final_result("cut all").success());
    // Only the dictation commit is on the undo stack.
    assert!(ed.commit_final_result("undo").success());
    assert_eq!(ed.text(), "");
    assert!(!ed.commit_final_result("undo").success());
}

#[test]
fn test_move_abs_commands() {
    let mut ed = editor();
    ed.commit_final_result("abcdefgh");
    assert!(ed.commit_final_result("go to position 4").success());
    assert_eq!(ed.buffer().selection(), (4, 4));
    assert!(ed.commit_final_result("maximum position").success());
    assert_eq!(ed.buffer().selection(), (8, 8));
}

#[test]
fn test_partial_results_retype_only_the_changed_suffix() {
    let mut ed = editor();
    assert!(ed.commit_partial_result("...123"));
    assert!(ed.commit_partial_result("...124"));
    assert_eq!(ed.text(), "...124");
    ed.commit_final_result("...1245");
    assert_eq!(ed.text(), "...1245");
    assert!(ed.run_command(&EditCommand::MoveAbs(4)));
    assert_eq!(ed.buffer().text_before_cursor(10), "...1");
}

#[test]
fn test_partial_results_refused_over_a_selection() {
    let mut ed = editor();
    ed.commit_final_result("some text");
    ed.commit_final_result("select text");
    assert!(!ed.commit_partial_result("more"));
    assert_eq!(ed.text(), "Some text");
}

#[test]
fn test_final_after_partials_is_one_undo_step() {
    let mut ed = editor();
    ed.commit_partial_result("hello");
    ed.commit_partial_result("hello wor");
    ed.commit_final_result("hello world");
    assert_eq!(ed.text(), "Hello world");
    assert!(ed.commit_final_result("undo").success());
    assert_eq!(ed.text(), "");
}

#[test]
fn test_unknown_command_id_changes_nothing() {
    let mut ed = editor();
    ed.commit_final_result("keep this");
    let outcome = ed.commit_final_result("bogus command");
    assert!(outcome.is_command());
    assert!(!outcome.success());
    assert_eq!(ed.text(), "Keep this");
}

#[test]
fn test_failed_command_rolls_back_its_own_commit() {
    // A command whose rewrite commits text but whose op fails must
    // leave the buffer exactly as it was.
    let tsv = format!("{HEADER}\nincrement\tINC\tincSel\t\t");
    let mut ed = CommandEditor::new(MemBuffer::new());
    ed.set_rewriters(vec![RuleSet::load(&tsv)]);
    ed.commit_final_result("not a number");
    let before = ed.text();
    let outcome = ed.commit_final_result("increment");
    assert!(!outcome.success());
    assert_eq!(ed.text(), before);
}

#[test]
fn test_bad_rule_row_is_inert_but_reported() {
    let tsv = format!("{HEADER}\n([unclosed\toops\t\t\t\nold_word\tnew_word\t\t\t");
    let ruleset = RuleSet::load(&tsv);
    assert_eq!(ruleset.errors().len(), 1);
    let mut ed = CommandEditor::new(MemBuffer::new());
    ed.set_rewriters(vec![ruleset]);
    ed.commit_final_result("old_word here");
    assert_eq!(ed.text(), "New_word here");
}

#[test]
fn test_rule_set_round_trips_through_tsv() {
    let ruleset = rules();
    let reloaded = RuleSet::load(&ruleset.to_tsv());
    assert_eq!(ruleset, reloaded);
    let mut ed = CommandEditor::new(MemBuffer::new());
    ed.set_rewriters(vec![reloaded]);
    ed.commit_final_result("test word1 word2");
    assert!(ed.commit_final_result("connect word1 and word2").success());
    assert_eq!(ed.text(), "Test word1-word2");
}
