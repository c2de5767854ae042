//! The tree-walking evaluator: `Program`/`Item`/`Stmt`/`Expr` to [`Value`].
//!
//! Holds a single "current environment" cursor, swapped on entering blocks,
//! function calls, and `for` loops via [`ScopeGuard`] — a small RAII guard
//! (teacher idiom: compare the reference interpreter's `HeapGuard`) that
//! restores the previous scope on drop, including when a `?` unwinds through
//! it. A non-local return is modeled as [`Flow::Return`] rather than an
//! exception; it propagates through statement dispatch until a function
//! call boundary catches it.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::ast::{AssignTarget, BinOp, Expr, FunctionDecl, Item, LiteralValue, Program, Stmt, StructDecl, UnOp};
use crate::builtins;
use crate::environment::{EnvRef, Environment};
use crate::error::{DustError, RunError, RunErrorKind};
use crate::io::PrintWriter;
use crate::resource::{NoLimitTracker, ResourceTracker};
use crate::value::{FunctionValue, Kind, Symbol, Value};

/// The result of executing a statement: either it ran to completion, or it
/// carries a `return` value that must unwind to the nearest call boundary.
enum Flow {
    Normal(Value),
    Return(Value),
}

/// Restores the previous scope when dropped. Borrows the interpreter's
/// scope cell rather than the interpreter itself, so recursive `eval_*`
/// calls remain free to borrow it again while the guard is alive.
struct ScopeGuard<'a> {
    current: &'a RefCell<EnvRef>,
    previous: EnvRef,
}

impl<'a> ScopeGuard<'a> {
    fn enter(current: &'a RefCell<EnvRef>) -> Self {
        let previous = current.borrow().clone();
        let child = Environment::child(&previous);
        *current.borrow_mut() = child;
        Self { current, previous }
    }
}

impl Drop for ScopeGuard<'_> {
    fn drop(&mut self) {
        *self.current.borrow_mut() = self.previous.clone();
    }
}

/// Decrements the call-depth counter when dropped, mirroring [`ScopeGuard`]
/// for the one other piece of state a call frame must unwind.
struct DepthGuard<'a> {
    depth: &'a Cell<usize>,
}

impl Drop for DepthGuard<'_> {
    fn drop(&mut self) {
        self.depth.set(self.depth.get() - 1);
    }
}

/// Evaluates a parsed [`Program`] against an environment, with a pluggable
/// [`ResourceTracker`] for call-depth/time limits. The CLI and REPL use
/// [`NoLimitTracker`]; embedders that sandbox untrusted scripts can supply
/// [`crate::resource::LimitedTracker`] instead.
pub struct Interpreter<T: ResourceTracker = NoLimitTracker> {
    current: RefCell<EnvRef>,
    tracker: RefCell<T>,
    depth: Cell<usize>,
}

impl Interpreter<NoLimitTracker> {
    pub fn new() -> Self {
        Self::with_tracker(NoLimitTracker)
    }
}

impl Default for Interpreter<NoLimitTracker> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ResourceTracker> Interpreter<T> {
    pub fn with_tracker(tracker: T) -> Self {
        Self { current: RefCell::new(Environment::root()), tracker: RefCell::new(tracker), depth: Cell::new(0) }
    }

    /// Runs every top-level item in order. A `return` at top level (no
    /// enclosing function frame to catch it) ends the program, matching how
    /// the non-local-return signal "escapes blocks, loops, and ifs
    /// transparently" with nothing left to catch it here.
    pub fn run_program(&self, program: &Program, print: &mut dyn PrintWriter) -> Result<(), DustError> {
        for item in &program.items {
            if let Flow::Return(_) = self.exec_item(item, print)? {
                return Ok(());
            }
        }
        Ok(())
    }

    /// Evaluates a single top-level item and returns its value when it is an
    /// expression statement (what the REPL echoes); any other item kind
    /// (declarations, control flow, `let`) yields `None`, matching the
    /// reference REPL's `display_result` which only prints a non-`None`
    /// result.
    /// Runs one top-level item, returning the value to echo for a REPL
    /// session. Only an expression-statement's value is ever echoed, and
    /// only when it isn't `null` — matching the reference REPL's
    /// `display_result`, which skips a `None` result.
    pub fn run_item(&self, item: &Item, print: &mut dyn PrintWriter) -> Result<Option<Value>, DustError> {
        let is_expr_stmt = matches!(item, Item::Statement(Stmt::ExprStmt { .. }));
        match self.exec_item(item, print)? {
            Flow::Normal(v) | Flow::Return(v) if is_expr_stmt && !matches!(v, Value::Null) => Ok(Some(v)),
            _ => Ok(None),
        }
    }

    fn exec_item(&self, item: &Item, print: &mut dyn PrintWriter) -> Result<Flow, DustError> {
        match item {
            Item::Import { path, .. } => {
                log::debug!("skipping import directive for '{path}' (no module system)");
                Ok(Flow::Normal(Value::Null))
            }
            Item::Function(decl) => self.declare_function(decl),
            Item::Struct(decl) => self.declare_struct(decl),
            Item::Statement(stmt) => self.exec_stmt(stmt, print),
        }
    }

    fn declare_function(&self, decl: &FunctionDecl) -> Result<Flow, DustError> {
        let closure = self.current.borrow().clone();
        let func = FunctionValue { name: decl.name.clone(), params: decl.params.clone(), body: Rc::new(decl.body.clone()), closure };
        let symbol = Symbol::immutable(Value::Function(Rc::new(func)), Kind::Function);
        self.current.borrow_mut().borrow_mut().define(&decl.name, symbol, false, Some(decl.line))?;
        Ok(Flow::Normal(Value::Null))
    }

    fn declare_struct(&self, decl: &StructDecl) -> Result<Flow, DustError> {
        let field_names = Value::array(decl.fields.iter().cloned().map(Value::Str).collect());
        let symbol = Symbol::immutable(field_names, Kind::StructType);
        self.current.borrow_mut().borrow_mut().define(&decl.name, symbol, false, Some(decl.line))?;
        Ok(Flow::Normal(Value::Null))
    }

    // ---- statements ----

    fn exec_stmt(&self, stmt: &Stmt, print: &mut dyn PrintWriter) -> Result<Flow, DustError> {
        self.tracker.borrow_mut().check_time()?;
        match stmt {
            Stmt::VariableDecl { name, value, line } => {
                let value = self.eval_expr(value, print)?;
                self.current.borrow().borrow_mut().define(name, Symbol::new(value), true, Some(*line))?;
                Ok(Flow::Normal(Value::Null))
            }
            Stmt::Assignment { target, value, .. } => {
                let value = self.eval_expr(value, print)?;
                self.exec_assignment(target, value, print)?;
                Ok(Flow::Normal(Value::Null))
            }
            Stmt::If { branches, else_branch, .. } => {
                for (condition, body) in branches {
                    if self.eval_expr(condition, print)?.is_truthy() {
                        return self.exec_block(body, print);
                    }
                }
                match else_branch {
                    Some(body) => self.exec_block(body, print),
                    None => Ok(Flow::Normal(Value::Null)),
                }
            }
            Stmt::While { condition, body, .. } => {
                while self.eval_expr(condition, print)?.is_truthy() {
                    if let Flow::Return(v) = self.exec_block(body, print)? {
                        return Ok(Flow::Return(v));
                    }
                }
                Ok(Flow::Normal(Value::Null))
            }
            Stmt::For { var_name, iterable, body, line } => self.exec_for(var_name, iterable, body, *line, print),
            Stmt::Return { value, line: _ } => {
                let value = match value {
                    Some(expr) => self.eval_expr(expr, print)?,
                    None => Value::Null,
                };
                Ok(Flow::Return(value))
            }
            Stmt::ExprStmt { expr, .. } => Ok(Flow::Normal(self.eval_expr(expr, print)?)),
            Stmt::Block(block) => self.exec_block(block, print),
        }
    }

    fn exec_block(&self, block: &[Stmt], print: &mut dyn PrintWriter) -> Result<Flow, DustError> {
        let _guard = ScopeGuard::enter(&self.current);
        for stmt in block {
            match self.exec_stmt(stmt, print)? {
                Flow::Normal(_) => {}
                Flow::Return(v) => return Ok(Flow::Return(v)),
            }
        }
        Ok(Flow::Normal(Value::Null))
    }

    fn exec_for(&self, var_name: &str, iterable: &Expr, body: &[Stmt], line: u32, print: &mut dyn PrintWriter) -> Result<Flow, DustError> {
        let iterable_value = self.eval_expr(iterable, print)?;
        let elements: Vec<Value> = match &iterable_value {
            Value::Array(elements) => elements.borrow().clone(),
            Value::Str(s) => s.chars().map(|c| Value::Str(c.to_string())).collect(),
            other => {
                return Err(RunError::new(RunErrorKind::TypeError, format!("cannot iterate over a {}", other.kind()), Some(line)).into());
            }
        };

        let _guard = ScopeGuard::enter(&self.current);
        for (i, element) in elements.into_iter().enumerate() {
            if i == 0 {
                self.current.borrow().borrow_mut().define(var_name, Symbol::new(element), true, Some(line))?;
            } else {
                Environment::assign(&self.current.borrow(), var_name, element, Some(line))?;
            }
            match self.exec_block(body, print)? {
                Flow::Normal(_) => {}
                Flow::Return(v) => return Ok(Flow::Return(v)),
            }
        }
        Ok(Flow::Normal(Value::Null))
    }

    fn exec_assignment(&self, target: &AssignTarget, value: Value, print: &mut dyn PrintWriter) -> Result<(), DustError> {
        match target {
            AssignTarget::Identifier { name, line } => Ok(Environment::assign(&self.current.borrow(), name, value, Some(*line))?),
            AssignTarget::Member { object, field, line } => {
                self.check_root_mutable(object, *line)?;
                let obj_value = self.eval_expr(object, print)?;
                let result: Result<(), RunError> = match obj_value {
                    Value::Struct(inst) => {
                        let mut inst = inst.borrow_mut();
                        if !inst.fields.contains_key(field) {
                            return Err(RunError::new(
                                RunErrorKind::NoSuchField,
                                format!("'{}' has no field '{field}'", inst.type_name),
                                Some(*line),
                            )
                            .into());
                        }
                        inst.fields.insert(field.clone(), value);
                        Ok(())
                    }
                    other => Err(RunError::new(RunErrorKind::TypeError, format!("cannot assign a field on a {}", other.kind()), Some(*line))),
                };
                Ok(result?)
            }
            AssignTarget::Index { object, index, line } => {
                self.check_root_mutable(object, *line)?;
                let obj_value = self.eval_expr(object, print)?;
                let index_value = self.eval_expr(index, print)?;
                let result: Result<(), RunError> = match obj_value {
                    Value::Array(elements) => {
                        let i = as_index(&index_value, *line)?;
                        let mut elements = elements.borrow_mut();
                        if i >= elements.len() {
                            return Err(RunError::new(RunErrorKind::IndexOutOfRange, format!("index {i} out of range"), Some(*line)).into());
                        }
                        elements[i] = value;
                        Ok(())
                    }
                    other => Err(RunError::new(RunErrorKind::TypeError, format!("cannot index-assign a {}", other.kind()), Some(*line))),
                };
                Ok(result?)
            }
        }
    }

    /// Walks to the base identifier of a place expression (`a` in `a.b[c]`)
    /// and fails *Immutable*/*Undefined* against its binding before the
    /// mutation itself is attempted.
    fn check_root_mutable(&self, expr: &Expr, line: u32) -> Result<(), RunError> {
        let Some((name, name_line)) = root_identifier(expr) else {
            return Ok(());
        };
        match Environment::lookup(&self.current.borrow(), name) {
            Some(symbol) => {
                if symbol.borrow().is_mutable {
                    Ok(())
                } else {
                    Err(RunError::new(RunErrorKind::Immutable, format!("'{name}' is immutable"), Some(line)))
                }
            }
            None => Err(RunError::new(RunErrorKind::Undefined, format!("undefined variable '{name}'"), Some(name_line))),
        }
    }

    // ---- expressions ----

    fn eval_expr(&self, expr: &Expr, print: &mut dyn PrintWriter) -> Result<Value, DustError> {
        match expr {
            Expr::Literal { value, .. } => Ok(literal_value(value)),
            Expr::Identifier { name, line } => Ok(Environment::get(&self.current.borrow(), name, Some(*line))?),
            Expr::Binary { op, left, right, line } => {
                let left = self.eval_expr(left, print)?;
                let right = self.eval_expr(right, print)?;
                Ok(eval_binary(*op, &left, &right, *line)?)
            }
            Expr::Unary { op, expr, line } => {
                let operand = self.eval_expr(expr, print)?;
                Ok(eval_unary(*op, &operand, *line)?)
            }
            Expr::Call { callee, args, line } => self.eval_call(callee, args, *line, print),
            Expr::Member { object, field, line } => {
                let obj_value = self.eval_expr(object, print)?;
                let result: Result<Value, RunError> = match obj_value {
                    Value::Struct(inst) => {
                        let inst = inst.borrow();
                        inst.fields.get(field).cloned().ok_or_else(|| {
                            RunError::new(RunErrorKind::NoSuchField, format!("'{}' has no field '{field}'", inst.type_name), Some(*line))
                        })
                    }
                    other => Err(RunError::new(RunErrorKind::TypeError, format!("cannot access a field on a {}", other.kind()), Some(*line))),
                };
                Ok(result?)
            }
            Expr::Index { object, index, line } => {
                let obj_value = self.eval_expr(object, print)?;
                let index_value = self.eval_expr(index, print)?;
                let result: Result<Value, RunError> = match obj_value {
                    Value::Array(elements) => {
                        let i = as_index(&index_value, *line)?;
                        elements
                            .borrow()
                            .get(i)
                            .cloned()
                            .ok_or_else(|| RunError::new(RunErrorKind::IndexOutOfRange, format!("index {i} out of range"), Some(*line)))
                    }
                    Value::Str(s) => {
                        let i = as_index(&index_value, *line)?;
                        s.chars()
                            .nth(i)
                            .map(|c| Value::Str(c.to_string()))
                            .ok_or_else(|| RunError::new(RunErrorKind::IndexOutOfRange, format!("index {i} out of range"), Some(*line)))
                    }
                    other => Err(RunError::new(RunErrorKind::TypeError, format!("cannot index a {}", other.kind()), Some(*line))),
                };
                Ok(result?)
            }
            Expr::Array { elements, .. } => {
                let mut values = Vec::with_capacity(elements.len());
                for element in elements {
                    values.push(self.eval_expr(element, print)?);
                }
                Ok(Value::array(values))
            }
            Expr::Struct { type_name, fields, line } => self.eval_struct_literal(type_name, fields, *line, print),
        }
    }

    fn eval_struct_literal(&self, type_name: &str, fields: &[crate::ast::FieldInit], line: u32, print: &mut dyn PrintWriter) -> Result<Value, DustError> {
        // `resolve` ("ref") returns the null sentinel rather than `None` for
        // an unbound name, matching the reference interpreter's
        // `eval_StructLiteral`, which checks `struct_symbol is null`.
        let type_symbol = Environment::resolve(&self.current.borrow(), type_name);
        let type_symbol = type_symbol.borrow();
        if type_symbol.kind != Kind::StructType {
            return Err(RunError::new(RunErrorKind::UnknownStructType, format!("'{type_name}' is not a struct type"), Some(line)).into());
        }
        let declared: Vec<String> = match &type_symbol.value {
            Value::Array(names) => names
                .borrow()
                .iter()
                .map(|v| match v {
                    Value::Str(s) => s.clone(),
                    _ => unreachable!("struct type field lists only ever hold strings"),
                })
                .collect(),
            _ => unreachable!("struct type symbols always carry an array value"),
        };
        drop(type_symbol);

        let mut assigned = indexmap::IndexMap::new();
        for field in fields {
            if !declared.contains(&field.name) {
                return Err(RunError::new(RunErrorKind::NoSuchField, format!("'{type_name}' has no field '{}'", field.name), Some(line)).into());
            }
            if assigned.contains_key(&field.name) {
                return Err(RunError::new(RunErrorKind::DuplicateField, format!("duplicate assignment to field '{}'", field.name), Some(line)).into());
            }
            let value = self.eval_expr(&field.value, print)?;
            assigned.insert(field.name.clone(), value);
        }
        if assigned.len() != declared.len() {
            let missing: Vec<&str> = declared.iter().filter(|f| !assigned.contains_key(f.as_str())).map(String::as_str).collect();
            return Err(RunError::new(
                RunErrorKind::MissingField,
                format!("missing fields for struct type '{type_name}': {}", missing.join(", ")),
                Some(line),
            )
            .into());
        }
        // Re-order into declaration order regardless of literal order.
        let ordered: indexmap::IndexMap<String, Value> =
            declared.into_iter().map(|name| { let v = assigned.swap_remove(&name).expect("validated above"); (name, v) }).collect();
        Ok(Value::struct_instance(type_name.to_string(), ordered))
    }

    fn eval_call(&self, callee: &Expr, args: &[Expr], line: u32, print: &mut dyn PrintWriter) -> Result<Value, DustError> {
        let callee_value = self.eval_expr(callee, print)?;
        let mut arg_values = Vec::with_capacity(args.len());
        for arg in args {
            arg_values.push(self.eval_expr(arg, print)?);
        }
        match callee_value {
            Value::Builtin(builtin) => Ok(builtins::call(builtin, &arg_values, print, Some(line))?),
            Value::Function(func) => self.call_function(&func, arg_values, line, print),
            other => Err(RunError::new(RunErrorKind::NotCallable, format!("a {} is not callable", other.kind()), Some(line)).into()),
        }
    }

    fn call_function(&self, func: &FunctionValue, args: Vec<Value>, line: u32, print: &mut dyn PrintWriter) -> Result<Value, DustError> {
        if args.len() != func.params.len() {
            return Err(RunError::new(
                RunErrorKind::Arity,
                format!("'{}' takes {} argument(s) ({} given)", func.name, func.params.len(), args.len()),
                Some(line),
            )
            .into());
        }

        let new_depth = self.depth.get() + 1;
        self.tracker.borrow_mut().enter_call(new_depth)?;
        self.depth.set(new_depth);
        let _depth_guard = DepthGuard { depth: &self.depth };

        let previous = self.current.borrow().clone();
        *self.current.borrow_mut() = Environment::child(&func.closure);
        let result = (|| {
            for (param, value) in func.params.iter().zip(args) {
                self.current.borrow().borrow_mut().define(param, Symbol::new(value), true, Some(line))?;
            }
            log::trace!("entering call to '{}' at depth {new_depth}", func.name);
            self.exec_block(&func.body, print)
        })();
        *self.current.borrow_mut() = previous;

        match result? {
            Flow::Return(v) => Ok(v),
            Flow::Normal(_) => Ok(Value::Null),
        }
    }
}

fn root_identifier(expr: &Expr) -> Option<(&str, u32)> {
    match expr {
        Expr::Identifier { name, line } => Some((name.as_str(), *line)),
        Expr::Member { object, .. } | Expr::Index { object, .. } => root_identifier(object),
        Expr::Call { callee, .. } => root_identifier(callee),
        _ => None,
    }
}

fn literal_value(value: &LiteralValue) -> Value {
    match value {
        LiteralValue::Int(n) => Value::Int(*n),
        LiteralValue::Float(n) => Value::Float(*n),
        LiteralValue::Str(s) => Value::Str(s.clone()),
        LiteralValue::Bool(b) => Value::Bool(*b),
        LiteralValue::Null => Value::Null,
    }
}

fn as_index(value: &Value, line: u32) -> Result<usize, RunError> {
    match value {
        Value::Int(n) if *n >= 0 => Ok(*n as usize),
        Value::Int(n) => Err(RunError::new(RunErrorKind::IndexOutOfRange, format!("negative index {n}"), Some(line))),
        other => Err(RunError::new(RunErrorKind::TypeError, format!("index must be an int, not a {}", other.kind()), Some(line))),
    }
}

/// An operand's numeric value, with `Int`/`Float` kept distinct so `+ - * /
/// % **` can promote only when one side is genuinely a float.
#[derive(Clone, Copy)]
enum Number {
    Int(i64),
    Float(f64),
}

fn as_number(value: &Value) -> Option<Number> {
    match value {
        Value::Int(n) => Some(Number::Int(*n)),
        Value::Float(n) => Some(Number::Float(*n)),
        _ => None,
    }
}

fn number_to_value(n: Number) -> Value {
    match n {
        Number::Int(n) => Value::Int(n),
        Number::Float(n) => Value::Float(n),
    }
}

fn as_f64(n: Number) -> f64 {
    match n {
        Number::Int(n) => n as f64,
        Number::Float(n) => n,
    }
}

fn eval_binary(op: BinOp, left: &Value, right: &Value, line: u32) -> Result<Value, RunError> {
    match op {
        BinOp::Add => {
            if let (Value::Str(l), Value::Str(r)) = (left, right) {
                return Ok(Value::Str(format!("{l}{r}")));
            }
            numeric_binary(left, right, line, |l, r| match (l, r) {
                (Number::Int(l), Number::Int(r)) => Ok(Number::Int(l.wrapping_add(r))),
                _ => Ok(Number::Float(as_f64(l) + as_f64(r))),
            })
        }
        BinOp::Sub => numeric_binary(left, right, line, |l, r| match (l, r) {
            (Number::Int(l), Number::Int(r)) => Ok(Number::Int(l.wrapping_sub(r))),
            _ => Ok(Number::Float(as_f64(l) - as_f64(r))),
        }),
        BinOp::Mul => numeric_binary(left, right, line, |l, r| match (l, r) {
            (Number::Int(l), Number::Int(r)) => Ok(Number::Int(l.wrapping_mul(r))),
            _ => Ok(Number::Float(as_f64(l) * as_f64(r))),
        }),
        // `/` is always true division, even `int / int`; there is no separate
        // floor-division operator.
        BinOp::Div => numeric_binary(left, right, line, |l, r| {
            if as_f64(r) == 0.0 {
                return Err(RunError::new(RunErrorKind::DivisionByZero, "division by zero", Some(line)));
            }
            Ok(Number::Float(as_f64(l) / as_f64(r)))
        }),
        BinOp::Mod => numeric_binary(left, right, line, |l, r| {
            if as_f64(r) == 0.0 {
                return Err(RunError::new(RunErrorKind::DivisionByZero, "modulo by zero", Some(line)));
            }
            match (l, r) {
                (Number::Int(l), Number::Int(r)) => Ok(Number::Int(l.rem_euclid(r))),
                _ => Ok(Number::Float(as_f64(l).rem_euclid(as_f64(r)))),
            }
        }),
        BinOp::Pow => numeric_binary(left, right, line, |l, r| match (l, r) {
            (Number::Int(l), Number::Int(r)) if r >= 0 => match l.checked_pow(r as u32) {
                Some(n) => Ok(Number::Int(n)),
                None => Ok(Number::Float((l as f64).powf(r as f64))),
            },
            _ => Ok(Number::Float(as_f64(l).powf(as_f64(r)))),
        }),
        BinOp::Eq => Ok(Value::Bool(values_equal(left, right))),
        BinOp::Ne => Ok(Value::Bool(!values_equal(left, right))),
        BinOp::Lt => ordering_compare(left, right, line, |o| o == std::cmp::Ordering::Less),
        BinOp::Le => ordering_compare(left, right, line, |o| o != std::cmp::Ordering::Greater),
        BinOp::Gt => ordering_compare(left, right, line, |o| o == std::cmp::Ordering::Greater),
        BinOp::Ge => ordering_compare(left, right, line, |o| o != std::cmp::Ordering::Less),
        BinOp::And => Ok(Value::Bool(left.is_truthy() && right.is_truthy())),
        BinOp::Or => Ok(Value::Bool(left.is_truthy() || right.is_truthy())),
    }
}

fn numeric_binary(left: &Value, right: &Value, line: u32, f: impl FnOnce(Number, Number) -> Result<Number, RunError>) -> Result<Value, RunError> {
    match (as_number(left), as_number(right)) {
        (Some(l), Some(r)) => f(l, r).map(number_to_value),
        _ => Err(RunError::new(RunErrorKind::TypeError, format!("unsupported operand types: {} and {}", left.kind(), right.kind()), Some(line))),
    }
}

fn ordering_compare(left: &Value, right: &Value, line: u32, f: impl FnOnce(std::cmp::Ordering) -> bool) -> Result<Value, RunError> {
    if let (Value::Str(l), Value::Str(r)) = (left, right) {
        return Ok(Value::Bool(f(l.cmp(r))));
    }
    match (as_number(left), as_number(right)) {
        (Some(l), Some(r)) => {
            let ordering = as_f64(l).partial_cmp(&as_f64(r)).ok_or_else(|| {
                RunError::new(RunErrorKind::TypeError, "cannot compare NaN", Some(line))
            })?;
            Ok(Value::Bool(f(ordering)))
        }
        _ => Err(RunError::new(RunErrorKind::TypeError, format!("unsupported comparison between {} and {}", left.kind(), right.kind()), Some(line))),
    }
}

fn values_equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Int(l), Value::Int(r)) => l == r,
        (Value::Float(l), Value::Float(r)) => l == r,
        (Value::Int(l), Value::Float(r)) | (Value::Float(r), Value::Int(l)) => *l as f64 == *r,
        (Value::Bool(l), Value::Bool(r)) => l == r,
        (Value::Str(l), Value::Str(r)) => l == r,
        (Value::Null, Value::Null) => true,
        (Value::Array(l), Value::Array(r)) => {
            let l = l.borrow();
            let r = r.borrow();
            l.len() == r.len() && l.iter().zip(r.iter()).all(|(a, b)| values_equal(a, b))
        }
        (Value::Struct(l), Value::Struct(r)) => {
            let l = l.borrow();
            let r = r.borrow();
            l.type_name == r.type_name && l.fields.len() == r.fields.len() && l.fields.iter().all(|(k, v)| r.fields.get(k).is_some_and(|rv| values_equal(v, rv)))
        }
        (Value::Function(l), Value::Function(r)) => Rc::ptr_eq(l, r),
        (Value::Builtin(l), Value::Builtin(r)) => l == r,
        _ => false,
    }
}

fn eval_unary(op: UnOp, operand: &Value, line: u32) -> Result<Value, RunError> {
    match op {
        UnOp::Not => Ok(Value::Bool(!operand.is_truthy())),
        UnOp::Neg => match operand {
            Value::Int(n) => Ok(Value::Int(-n)),
            Value::Float(n) => Ok(Value::Float(-n)),
            other => Err(RunError::new(RunErrorKind::TypeError, format!("unsupported operand type for '-': {}", other.kind()), Some(line))),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::CollectStringPrint;
    use crate::parser::parse;

    fn run(src: &str) -> String {
        let (program, errors) = parse(src);
        assert!(errors.is_empty(), "parse errors: {errors:?}");
        let interpreter = Interpreter::new();
        let mut out = CollectStringPrint::default();
        interpreter.run_program(&program, &mut out).expect("program should run without error");
        out.buffer
    }

    fn run_err(src: &str) -> RunError {
        let (program, errors) = parse(src);
        assert!(errors.is_empty(), "parse errors: {errors:?}");
        let interpreter = Interpreter::new();
        let mut out = CollectStringPrint::default();
        match interpreter.run_program(&program, &mut out) {
            Err(DustError::Run(e)) => e,
            other => panic!("expected a RunError, got {other:?}"),
        }
    }

    #[test]
    fn arithmetic_precedence_scenario() {
        assert_eq!(run("let x = 1 + 2 * 3 ** 2; print(x);"), "19\n");
    }

    #[test]
    fn closure_scenario() {
        assert_eq!(
            run("fn make(a) { fn inner(b) { return a + b; } return inner; } let f = make(10); print(f(5));"),
            "15\n"
        );
    }

    #[test]
    fn struct_field_scenario() {
        assert_eq!(run("struct P { x, y, }; let p = P{x: 1, y: 2}; p.x = 7; print(p.x + p.y);"), "9\n");
    }

    #[test]
    fn array_for_loop_scenario() {
        assert_eq!(run("let xs = [1,2,3]; let s = 0; for e in xs { s = s + e; } print(s);"), "6\n");
    }

    #[test]
    fn missing_field_scenario_reports_kind_and_name() {
        let err = run_err("struct R { a, b, }; let r = R{a: 1};");
        assert_eq!(err.kind, RunErrorKind::MissingField);
        assert!(err.message.contains('b'));
    }

    #[test]
    fn reassigning_immutable_function_scenario() {
        let err = run_err("fn g() {} g = 1;");
        assert_eq!(err.kind, RunErrorKind::Immutable);
    }

    #[test]
    fn division_by_zero_never_produces_infinity() {
        let err = run_err("let x = 1 / 0;");
        assert_eq!(err.kind, RunErrorKind::DivisionByZero);
    }

    #[test]
    fn division_always_yields_float_even_when_exact() {
        assert_eq!(run("print(type(6 / 2));"), "float\n");
        assert_eq!(run("print(7 / 2);"), "3.5\n");
    }

    #[test]
    fn array_index_bounds_checked() {
        let err = run_err("let xs = [1,2]; let y = xs[5];");
        assert_eq!(err.kind, RunErrorKind::IndexOutOfRange);
    }

    #[test]
    fn scope_cursor_restored_after_block_error() {
        let interpreter = Interpreter::new();
        let mut out = CollectStringPrint::default();
        let (program, errors) = parse("let x = 1; if true { let y = 2 / 0; }");
        assert!(errors.is_empty());
        let before = interpreter.current.borrow().clone();
        let _ = interpreter.run_program(&program, &mut out);
        assert!(Rc::ptr_eq(&before, &interpreter.current.borrow()));
    }

    #[test]
    fn recursive_function_sums_to_limit() {
        assert_eq!(
            run("fn sum(n) { if n <= 0 { return 0; } return n + sum(n - 1); } print(sum(5));"),
            "15\n"
        );
    }

    #[test]
    fn for_loop_over_string_yields_chars() {
        assert_eq!(run(r#"let count = 0; for c in "abc" { count = count + 1; } print(count);"#), "3\n");
    }

    #[test]
    fn not_callable_error_on_calling_a_non_function() {
        let err = run_err("let x = 1; x();");
        assert_eq!(err.kind, RunErrorKind::NotCallable);
    }

    #[test]
    fn arity_mismatch_is_reported() {
        let err = run_err("fn f(a, b) { return a; } f(1);");
        assert_eq!(err.kind, RunErrorKind::Arity);
    }

    #[test]
    fn unknown_struct_type_is_reported() {
        let err = run_err("let p = Missing{x: 1};");
        assert_eq!(err.kind, RunErrorKind::UnknownStructType);
    }

    #[test]
    fn duplicate_field_in_literal_is_reported() {
        let err = run_err("struct P { x, y, }; let p = P{x: 1, x: 2, y: 3};");
        assert_eq!(err.kind, RunErrorKind::DuplicateField);
    }
}
