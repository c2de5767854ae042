//! Line-buffered REPL session: accumulates input until brackets/strings
//! balance, then parses and runs exactly the first top-level item.

use std::collections::HashSet;

use crate::interpreter::Interpreter;
use crate::io::PrintWriter;
use crate::parser::parse;
use crate::resource::NoLimitTracker;

/// Tracks whether accumulated source has balanced brackets and closed
/// string literals, the same way the reference REPL decides whether to
/// keep reading lines (`... `) before attempting to parse (`>>> `).
///
/// Mismatched or premature closing brackets also count as "awaiting more
/// input" rather than an immediate error, matching the reference
/// implementation — the mismatch surfaces as a parse error once the line
/// is finally submitted without the matching opener.
#[derive(Debug, Default)]
pub struct BlockTracker;

impl BlockTracker {
    pub fn new() -> Self {
        Self
    }

    /// `true` when `code` is not yet a complete, balanced submission.
    pub fn check_string(&self, code: &str) -> bool {
        let pairs: HashSet<(char, char)> = [('{', '}'), ('(', ')'), ('[', ']')].into_iter().collect();
        let opening: HashSet<char> = pairs.iter().map(|(o, _)| *o).collect();
        let closing: HashSet<char> = pairs.iter().map(|(_, c)| *c).collect();

        let mut stack: Vec<char> = Vec::new();
        let mut in_string = false;
        let mut escape = false;

        for ch in code.chars() {
            if ch == '"' && !escape {
                in_string = !in_string;
            } else if opening.contains(&ch) && !in_string {
                stack.push(ch);
            } else if closing.contains(&ch) && !in_string {
                let matches = stack.last().is_some_and(|open| pairs.get(&(*open, ch)).is_some());
                if !matches {
                    return true;
                }
                stack.pop();
            }
            escape = ch == '\\' && !escape;
        }

        !stack.is_empty() || in_string
    }
}

/// Drives an interactive read-eval-print loop over `lines`, writing prompts
/// and output through `print`. `lines` yields `None` on EOF/interrupt,
/// mirroring Python's `input()` raising `EOFError`/`KeyboardInterrupt`.
pub struct Repl {
    interpreter: Interpreter<NoLimitTracker>,
    tracker: BlockTracker,
}

impl Repl {
    pub fn new() -> Self {
        Self { interpreter: Interpreter::new(), tracker: BlockTracker::new() }
    }

    /// Runs the loop to completion. `read_line(prompt)` should print
    /// `prompt` and return the next line of input, or `None` at EOF/^C.
    pub fn run(&mut self, print: &mut dyn PrintWriter, mut read_line: impl FnMut(&str) -> Option<String>) {
        print.write_line("Dust 0.1.0 REPL (type 'exit()' to quit)\n");
        let mut code = String::new();
        let mut awaiting_more_input = false;

        loop {
            let prompt = if awaiting_more_input { "... " } else { ">>> " };
            let Some(line) = read_line(prompt) else {
                self.shutdown(print);
                return;
            };
            if line.trim().eq_ignore_ascii_case("exit()") {
                self.shutdown(print);
                return;
            }

            code.push_str(&line);
            code.push('\n');
            awaiting_more_input = self.tracker.check_string(&code);

            if awaiting_more_input {
                continue;
            }
            self.evaluate(&code, print);
            code.clear();
        }
    }

    fn evaluate(&mut self, code: &str, print: &mut dyn PrintWriter) {
        if code.trim().is_empty() {
            return;
        }
        let (program, errors) = parse(code);
        if let Some(first) = errors.into_iter().next() {
            print.write_line(&format!("{first}\n"));
            return;
        }
        let Some(item) = program.items.first() else {
            return;
        };
        match self.interpreter.run_item(item, print) {
            Ok(Some(value)) => print.write_line(&format!("{value}\n")),
            Ok(None) => {}
            Err(e) => print.write_line(&format!("{e}\n")),
        }
    }

    fn shutdown(&self, print: &mut dyn PrintWriter) {
        print.write_line("Exiting Dust REPL...\n");
    }
}

impl Default for Repl {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::CollectStringPrint;

    #[test]
    fn balanced_braces_need_no_more_input() {
        let tracker = BlockTracker::new();
        assert!(!tracker.check_string("let x = 1;\n"));
        assert!(!tracker.check_string("fn f() { return 1; }\n"));
    }

    #[test]
    fn open_brace_awaits_more_input() {
        let tracker = BlockTracker::new();
        assert!(tracker.check_string("fn f() {\n"));
    }

    #[test]
    fn unterminated_string_awaits_more_input() {
        let tracker = BlockTracker::new();
        assert!(tracker.check_string("let s = \"abc\n"));
    }

    #[test]
    fn mismatched_closing_bracket_awaits_more_input() {
        let tracker = BlockTracker::new();
        assert!(tracker.check_string("let x = (1 + 2];\n"));
    }

    #[test]
    fn repl_echoes_expression_statements_and_exits_on_exit_call() {
        let mut repl = Repl::new();
        let mut out = CollectStringPrint::default();
        let mut lines = vec!["let x = 1 + 2;".to_string(), "x;".to_string(), "exit()".to_string()].into_iter();
        repl.run(&mut out, |_prompt| lines.next());
        assert!(out.buffer.contains("Dust 0.1.0 REPL"));
        assert!(out.buffer.contains('3'));
        assert!(out.buffer.contains("Exiting Dust REPL..."));
    }

    #[test]
    fn repl_does_not_echo_null_results() {
        let mut repl = Repl::new();
        let mut out = CollectStringPrint::default();
        let mut lines = vec!["print(3);".to_string(), "null;".to_string(), "exit()".to_string()].into_iter();
        repl.run(&mut out, |_prompt| lines.next());
        assert_eq!(out.buffer.matches('3').count(), 1);
        assert!(!out.buffer.contains("null"));
    }

    #[test]
    fn repl_shuts_down_on_eof() {
        let mut repl = Repl::new();
        let mut out = CollectStringPrint::default();
        repl.run(&mut out, |_prompt| None);
        assert!(out.buffer.contains("Exiting Dust REPL..."));
    }
}
