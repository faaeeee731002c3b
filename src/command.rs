//! The editing command vocabulary.
//!
//! String identifiers exist only at the rule-set boundary; everything
//! past [`EditCommand::parse`] dispatches on this closed enum.

/// Which edge(s) of the selection a relative move applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelEdge {
    Start,
    End,
    /// Collapse the selection and move the cursor.
    Both,
}

/// Editor actions forwarded to the host surface (the IME action row).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorAction {
    Done,
    Go,
    Search,
    Send,
    Next,
    Previous,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EditCommand {
    KeyUp,
    KeyDown,
    KeyLeft,
    KeyRight,
    PreviousField,
    NextField,
    GoToEnd,
    MoveAbs(i64),
    MoveRel(i64),
    MoveRelSel(i64, SelEdge),
    Select(String),
    SelectAll,
    SelectReBefore(String),
    SelectReAfter(String, usize),
    SelectRe(String, bool),
    Delete(String),
    Replace(String, String),
    ReplaceSel(String),
    ReplaceSelRe(String, String),
    UcSel,
    LcSel,
    IncSel,
    DeleteLeftWord,
    DeleteLeftChars(usize),
    AddSpace,
    AddNewline,
    Cut,
    CutAll,
    Copy,
    CopyAll,
    Paste,
    DeleteAll,
    Undo(usize),
    Combine(usize),
    Apply(usize),
    KeyCode(u32),
    KeyCodeStr(String),
    ImeAction(EditorAction),
    SaveClip(String, String),
    LoadClip(String),
    ShowClipboard,
    ClearClipboard,
    GetUrl(String),
    Activity(String),
}

impl EditCommand {
    /// Maps a command id and its evaluated arguments to a command.
    /// Unknown ids and unsatisfiable arities return `None`; numeric
    /// arguments that fail to parse fall back to the documented
    /// defaults.
    pub fn parse(id: &str, args: &[String]) -> Option<EditCommand> {
        use EditCommand::*;
        let cmd = match id {
            "goUp" => KeyUp,
            "goDown" => KeyDown,
            "goLeft" => KeyLeft,
            "goRight" => KeyRight,
            "goToPreviousField" => PreviousField,
            "goToNextField" => NextField,
            "goToEnd" => GoToEnd,
            "moveAbs" | "goToCharacterPosition" => MoveAbs(int_arg(args, 0, 0)),
            "moveRel" | "goForward" => MoveRel(int_arg(args, 0, 1)),
            "goBackward" => MoveRel(-int_arg(args, 0, 1)),
            "moveRelSel" => {
                let edge = match int_arg(args, 1, 2) {
                    0 => SelEdge::Start,
                    1 => SelEdge::End,
                    _ => SelEdge::Both,
                };
                MoveRelSel(int_arg(args, 0, 1), edge)
            }
            "select" => Select(req(args, 0)?),
            "selectAll" => SelectAll,
            "selectReBefore" => SelectReBefore(req(args, 0)?),
            "selectReAfter" => {
                SelectReAfter(req(args, 0)?, int_arg(args, 1, 1).max(0) as usize)
            }
            "selectRe" => {
                let apply_to_sel = args.get(1).map(|a| a == "true").unwrap_or(false);
                SelectRe(req(args, 0)?, apply_to_sel)
            }
            "delete" => Delete(req(args, 0)?),
            "replace" => Replace(req(args, 0)?, req(args, 1)?),
            "replaceSel" => ReplaceSel(req(args, 0)?),
            "replaceSelRe" => ReplaceSelRe(req(args, 0)?, req(args, 1)?),
            "ucSel" => UcSel,
            "lcSel" => LcSel,
            "incSel" => IncSel,
            "deleteLeftWord" => DeleteLeftWord,
            "deleteLeftChars" => DeleteLeftChars(req(args, 0)?.trim().parse().ok()?),
            "addSpace" => AddSpace,
            "addNewline" => AddNewline,
            "cut" => Cut,
            "cutAll" => CutAll,
            "copy" => Copy,
            "copyAll" => CopyAll,
            "paste" => Paste,
            "deleteAll" => DeleteAll,
            "undo" => Undo(int_arg(args, 0, 1).max(0) as usize),
            "combine" => Combine(int_arg(args, 0, 2).max(0) as usize),
            "apply" => Apply(int_arg(args, 0, 1).max(0) as usize),
            "keyCode" => KeyCode(req(args, 0)?.trim().parse().ok()?),
            "keyCodeStr" => KeyCodeStr(req(args, 0)?),
            "imeAction" => ImeAction(editor_action(&req(args, 0)?)?),
            "imeActionDone" => ImeAction(EditorAction::Done),
            "imeActionGo" | "go" => ImeAction(EditorAction::Go),
            "imeActionSearch" => ImeAction(EditorAction::Search),
            "imeActionSend" => ImeAction(EditorAction::Send),
            "imeActionNext" => ImeAction(EditorAction::Next),
            "imeActionPrevious" => ImeAction(EditorAction::Previous),
            "saveClip" => SaveClip(req(args, 0)?, req(args, 1)?),
            "loadClip" => LoadClip(req(args, 0)?),
            "showClipboard" => ShowClipboard,
            "clearClipboard" => ClearClipboard,
            "getUrl" => GetUrl(req(args, 0)?),
            "activity" => Activity(req(args, 0)?),
            _ => return None,
        };
        Some(cmd)
    }
}

fn editor_action(name: &str) -> Option<EditorAction> {
    let action = match name {
        "done" => EditorAction::Done,
        "go" => EditorAction::Go,
        "search" => EditorAction::Search,
        "send" => EditorAction::Send,
        "next" => EditorAction::Next,
        "previous" => EditorAction::Previous,
        _ => return None,
    };
    Some(action)
}

fn req(args: &[String], idx: usize) -> Option<String> {
    args.get(idx).cloned()
}

fn int_arg(args: &[String], idx: usize, default: i64) -> i64 {
    args.get(idx)
        .and_then(|a| a.trim().parse().ok())
        .unwrap_or(default)
}
