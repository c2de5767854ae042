//! Implementation of the `type()` builtin.

use crate::error::{RunError, RunErrorKind};
use crate::value::Value;

/// `type(x)`: the value's [`crate::value::Kind`] tag, rendered as a string
/// (e.g. `"int"`, `"array"`, `"function"`).
pub fn call(args: &[Value], line: Option<u32>) -> Result<Value, RunError> {
    let [arg] = args else {
        return Err(RunError::new(RunErrorKind::Arity, format!("type() takes exactly 1 argument ({} given)", args.len()), line));
    };
    Ok(Value::Str(arg.kind().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reports_kind_name() {
        assert_eq!(call(&[Value::Int(1)], None).unwrap().to_string(), "int");
        assert_eq!(call(&[Value::Null], None).unwrap().to_string(), "null");
        let arr = Value::array(vec![]);
        assert_eq!(call(&[arr], None).unwrap().to_string(), "array");
    }

    #[test]
    fn rejects_wrong_arity() {
        let err = call(&[Value::Int(1), Value::Int(2)], None).unwrap_err();
        assert_eq!(err.kind, RunErrorKind::Arity);
    }
}
