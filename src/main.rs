use std::fs;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use voxedit::config::Config;
use voxedit::{CommandEditor, EditorContext, MemBuffer, RuleSet, TextBuffer};

#[derive(Parser)]
#[command(name = "voxedit", about = "Voice-command text editor core", version)]
struct Cli {
    /// Rule file (tab-separated); may be given more than once.
    /// Overrides the config file.
    #[arg(long)]
    rules: Vec<PathBuf>,

    /// Engine diagnostics on stderr
    #[arg(long)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Validate a rule file: report bad rows, print the normalized TSV
    Check { file: PathBuf },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Some(Command::Check { file }) = &cli.command {
        return run_check(file);
    }

    let config = Config::load();
    let verbose = cli.verbose || config.verbose;

    let context = EditorContext::new(
        config.context.locale.clone(),
        config.context.service.clone(),
        config.context.app.clone(),
    );

    let paths: Vec<PathBuf> = if cli.rules.is_empty() {
        config.rules.iter().map(PathBuf::from).collect()
    } else {
        cli.rules.clone()
    };

    let mut rewriters = Vec::new();
    for path in &paths {
        if !path.exists() {
            // A missing default rule file just means plain dictation.
            if verbose {
                eprintln!("[REPL] no rule file at {}", path.display());
            }
            continue;
        }
        let tsv = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let ruleset = RuleSet::load_with_context(&tsv, Some(&context));
        for error in ruleset.errors() {
            eprintln!("{}: {error}", path.display());
        }
        rewriters.push(ruleset);
    }

    run_repl(rewriters, &config, verbose)
}

fn run_check(file: &PathBuf) -> Result<()> {
    let tsv = fs::read_to_string(file)
        .with_context(|| format!("failed to read {}", file.display()))?;
    let ruleset = RuleSet::load(&tsv);
    let errors = ruleset.errors();
    for error in &errors {
        eprintln!("{}: {error}", file.display());
    }
    println!("{}", ruleset.to_tsv());
    if !errors.is_empty() {
        anyhow::bail!("{} bad row(s)", errors.len());
    }
    Ok(())
}

/// Reads utterances from stdin, one per line, and shows the buffer
/// after each. Lines starting with `..` are treated as partial
/// results.
fn run_repl(rewriters: Vec<RuleSet>, config: &Config, verbose: bool) -> Result<()> {
    let buf = MemBuffer::with_text(&config.repl.initial_text);
    let mut editor = CommandEditor::new(buf).with_verbose(verbose);
    editor.set_rewriters(rewriters);

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    loop {
        write!(stdout, "{}", config.repl.prompt)?;
        stdout.flush()?;
        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let line = line.trim_end_matches(['\n', '\r']);
        if let Some(partial) = line.strip_prefix("..") {
            editor.commit_partial_result(partial.trim_start());
        } else {
            let outcome = editor.commit_final_result(line);
            println!("{outcome}");
        }
        println!("{}", render(editor.buffer()));
    }
    Ok(())
}

/// Buffer with the selection marked: `|` for a cursor, `[..]` for a
/// range.
fn render(buf: &MemBuffer) -> String {
    let text = buf.text();
    let (start, end) = buf.selection();
    let chars: Vec<char> = text.chars().collect();
    let before: String = chars[..start].iter().collect();
    let after: String = chars[end..].iter().collect();
    if start == end {
        format!("{before}|{after}")
    } else {
        let selected: String = chars[start..end].iter().collect();
        format!("{before}[{selected}]{after}")
    }
}
