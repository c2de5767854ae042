//! Implementation of the `print()` builtin.

use crate::error::RunError;
use crate::io::PrintWriter;
use crate::value::Value;

/// Joins every argument's `Display` form with a single space and writes one
/// line (newline appended) to `print`. Always succeeds, and always returns
/// `null`.
pub fn call(args: &[Value], print: &mut dyn PrintWriter) -> Result<Value, RunError> {
    let mut line = String::new();
    for (i, arg) in args.iter().enumerate() {
        if i > 0 {
            line.push(' ');
        }
        line.push_str(&arg.to_string());
    }
    line.push('\n');
    print.write_line(&line);
    Ok(Value::Null)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::CollectStringPrint;

    #[test]
    fn joins_multiple_args_with_space() {
        let mut out = CollectStringPrint::default();
        call(&[Value::Int(1), Value::Bool(true), Value::Str("x".into())], &mut out).unwrap();
        assert_eq!(out.buffer, "1 true x\n");
    }

    #[test]
    fn zero_args_prints_just_a_newline() {
        let mut out = CollectStringPrint::default();
        call(&[], &mut out).unwrap();
        assert_eq!(out.buffer, "\n");
    }
}
