//! Implementation of the `len()` builtin.

use crate::error::{RunError, RunErrorKind};
use crate::value::Value;

/// `len(x)`: the element count of a string (Unicode scalar values, matching
/// the reference interpreter's `len(str)` and this crate's own char-indexed
/// string indexing) or an array. Any other kind, or an argument count other
/// than one, is a [`RunErrorKind::TypeError`] / [`RunErrorKind::Arity`]
/// failure.
pub fn call(args: &[Value], line: Option<u32>) -> Result<Value, RunError> {
    let [arg] = args else {
        return Err(RunError::new(RunErrorKind::Arity, format!("len() takes exactly 1 argument ({} given)", args.len()), line));
    };
    match arg {
        Value::Str(s) => Ok(Value::Int(s.chars().count() as i64)),
        Value::Array(elements) => Ok(Value::Int(elements.borrow().len() as i64)),
        other => Err(RunError::new(RunErrorKind::TypeError, format!("object of kind '{}' has no len()", other.kind()), line)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn len_of_string_counts_chars_not_bytes() {
        assert!(matches!(call(&[Value::Str("abc".into())], None).unwrap(), Value::Int(3)));
        assert!(matches!(call(&[Value::Str("héllo".into())], None).unwrap(), Value::Int(5)));
    }

    #[test]
    fn len_of_array() {
        let arr = Value::array(vec![Value::Int(1), Value::Int(2)]);
        assert!(matches!(call(&[arr], None).unwrap(), Value::Int(2)));
    }

    #[test]
    fn len_rejects_wrong_arity() {
        let err = call(&[], None).unwrap_err();
        assert_eq!(err.kind, RunErrorKind::Arity);
    }

    #[test]
    fn len_rejects_unsupported_kind() {
        let err = call(&[Value::Int(1)], None).unwrap_err();
        assert_eq!(err.kind, RunErrorKind::TypeError);
    }
}
