//! Runtime value model: [`Value`], the `kind` tag, and the [`Symbol`]
//! binding cell described in the data model.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::ast::Block;
use crate::environment::EnvRef;

/// Host-provided callables pre-bound into the root environment.
///
/// Enumerated rather than stored as trait objects: there are exactly three,
/// none captures interpreter state, and dispatch is a single `match` in the
/// evaluator (mirrors how the reference interpreter's builtin table is a
/// closed, enumerable set rather than an open plugin registry).
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display, strum::EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum Builtin {
    Print,
    Len,
    Type,
}

impl Builtin {
    pub const ALL: [Builtin; 3] = [Builtin::Print, Builtin::Len, Builtin::Type];
}

/// A user-defined function: parameter names, body, and the environment
/// captured at the point of declaration (the closure).
#[derive(Debug)]
pub struct FunctionValue {
    pub name: String,
    pub params: Vec<String>,
    pub body: Rc<Block>,
    pub closure: EnvRef,
}

/// A struct instance: an ordered field map plus its declared type name.
///
/// Fields preserve declaration order (via `IndexMap`) so `print` renders
/// them the way they were declared, matching `TypeName { field: value, ... }`.
#[derive(Debug, Clone, PartialEq)]
pub struct StructInstance {
    pub type_name: String,
    pub fields: IndexMap<String, Value>,
}

pub type ArrayRef = Rc<RefCell<Vec<Value>>>;
pub type StructRef = Rc<RefCell<StructInstance>>;

/// A runtime value: exactly the shapes named in the data model.
///
/// Arrays and structs are `Rc<RefCell<_>>`-backed so that binding a
/// container into a new name (e.g. passing it as a function argument) shares
/// the same storage — mutations via member/index assignment are visible to
/// every holder, as the spec requires.
#[derive(Debug, Clone)]
pub enum Value {
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(String),
    Null,
    Array(ArrayRef),
    Struct(StructRef),
    Function(Rc<FunctionValue>),
    Builtin(Builtin),
}

impl Value {
    pub fn array(elements: Vec<Value>) -> Self {
        Value::Array(Rc::new(RefCell::new(elements)))
    }

    pub fn struct_instance(type_name: String, fields: IndexMap<String, Value>) -> Self {
        Value::Struct(Rc::new(RefCell::new(StructInstance { type_name, fields })))
    }

    /// The `kind` tag, used by `type()` and error messages.
    pub fn kind(&self) -> Kind {
        match self {
            Value::Int(_) => Kind::Int,
            Value::Float(_) => Kind::Float,
            Value::Bool(_) => Kind::Bool,
            Value::Str(_) => Kind::String,
            Value::Null => Kind::Null,
            Value::Array(_) => Kind::Array,
            Value::Struct(_) => Kind::Struct,
            Value::Function(_) | Value::Builtin(_) => Kind::Function,
        }
    }

    /// Truthiness per the glossary: `false`, `null`, `0`, `0.0`, `""`, `[]`
    /// are falsy; everything else is truthy. Structs are always truthy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Bool(b) => *b,
            Value::Null => false,
            Value::Int(n) => *n != 0,
            Value::Float(n) => *n != 0.0,
            Value::Str(s) => !s.is_empty(),
            Value::Array(a) => !a.borrow().is_empty(),
            Value::Struct(_) | Value::Function(_) | Value::Builtin(_) => true,
        }
    }

    pub fn is_callable(&self) -> bool {
        matches!(self, Value::Function(_) | Value::Builtin(_))
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(n) => write!(f, "{n}"),
            Value::Float(n) => write!(f, "{n}"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Str(s) => write!(f, "{s}"),
            Value::Null => write!(f, "null"),
            Value::Array(elements) => {
                write!(f, "[")?;
                for (i, el) in elements.borrow().iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{el}")?;
                }
                write!(f, "]")
            }
            Value::Struct(inst) => {
                let inst = inst.borrow();
                write!(f, "{} {{ ", inst.type_name)?;
                for (i, (name, value)) in inst.fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{name}: {value}")?;
                }
                write!(f, " }}")
            }
            Value::Function(func) => write!(f, "<fn {}>", func.name),
            Value::Builtin(b) => write!(f, "<builtin {b}>"),
        }
    }
}

/// Classifies a value's runtime shape, plus the two tags
/// ([`Kind::StructType`], [`Kind::Unknown`]) that describe symbols rather
/// than values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum Kind {
    Int,
    Float,
    Bool,
    String,
    Null,
    Array,
    Struct,
    StructType,
    Function,
    Unknown,
}

/// A binding cell: a value plus the metadata that governs reassignment.
///
/// Invariant: `kind == Kind::Null` implies `value` is [`Value::Null`] and
/// `is_mutable` is `false`.
#[derive(Debug, Clone)]
pub struct Symbol {
    pub value: Value,
    pub kind: Kind,
    pub is_mutable: bool,
}

impl Symbol {
    /// Builds a mutable symbol, inferring `kind` structurally from the value.
    pub fn new(value: Value) -> Self {
        let kind = value.kind();
        Self { value, kind, is_mutable: true }
    }

    /// Builds an immutable symbol with an explicit kind (used for functions,
    /// struct types, and the null sentinel).
    pub fn immutable(value: Value, kind: Kind) -> Self {
        Self { value, kind, is_mutable: false }
    }

    /// The process-wide `null` sentinel returned by `ref()` for unbound
    /// names: immutable, kind `null`, value `Value::Null`.
    pub fn null_sentinel() -> Self {
        Self { value: Value::Null, kind: Kind::Null, is_mutable: false }
    }
}
