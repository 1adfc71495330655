//! Interactive restore confirmation

use kvsnap_engine::{Confirmation, RestorePlan};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

const PROMPT: &str = "Overwrite these keys in the store? [y/N] ";

/// Whether an operator's answer means "proceed"
pub fn is_affirmative(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

/// Asks the operator on the terminal
///
/// Anything but `y`/`yes` declines, as do Ctrl-C and end of input.
#[derive(Debug, Default)]
pub struct InteractiveConfirm;

impl Confirmation for InteractiveConfirm {
    fn confirm(&mut self, plan: &RestorePlan) -> bool {
        println!("{plan}");
        let mut editor = match DefaultEditor::new() {
            Ok(editor) => editor,
            Err(e) => {
                eprintln!("(error) cannot read from terminal: {e}");
                return false;
            }
        };
        match editor.readline(PROMPT) {
            Ok(line) => is_affirmative(&line),
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => false,
            Err(e) => {
                eprintln!("(error) {e}");
                false
            }
        }
    }
}
