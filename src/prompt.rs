//! Interactive yes/no confirmation.

use std::io::{BufRead, Write};

/// Asks the operator a question and reports their raw answer.
pub trait Confirm {
    /// Show `question` and return the answer line, without the newline.
    fn ask(&self, question: &str) -> std::io::Result<String>;
}

/// Reads answers from the terminal.
pub struct StdinConfirm;

impl Confirm for StdinConfirm {
    fn ask(&self, question: &str) -> std::io::Result<String> {
        let mut stdout = std::io::stdout();
        write!(stdout, "{question} ")?;
        stdout.flush()?;

        let mut line = String::new();
        std::io::stdin().lock().read_line(&mut line)?;
        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    }
}

/// Strict confirmation for destructive actions: only `yes`.
pub fn is_explicit_yes(answer: &str) -> bool {
    answer.trim().eq_ignore_ascii_case("yes")
}

/// Lenient confirmation: `y` or `yes`.
pub fn is_yes(answer: &str) -> bool {
    let answer = answer.trim();
    answer.eq_ignore_ascii_case("y") || answer.eq_ignore_ascii_case("yes")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_yes_only_accepts_full_word() {
        assert!(is_explicit_yes("yes"));
        assert!(is_explicit_yes("  YES \n"));
        assert!(!is_explicit_yes("y"));
        assert!(!is_explicit_yes(""));
        assert!(!is_explicit_yes("no"));
        assert!(!is_explicit_yes("yess"));
    }

    #[test]
    fn lenient_yes() {
        assert!(is_yes("y"));
        assert!(is_yes("Yes"));
        assert!(!is_yes(""));
        assert!(!is_yes("n"));
    }
}
