//! Tagged-variant AST produced by the parser and walked by the evaluator.
//!
//! Every node carries the source line it started on, so runtime errors can
//! point back at a location even though there is no separate span table.

#[derive(Debug, Clone, PartialEq, Copy, strum::Display)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
}

#[derive(Debug, Clone, PartialEq, Copy, strum::Display)]
pub enum UnOp {
    Neg,
    Not,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LiteralValue {
    Int(i64),
    Float(f64),
    Str(String),
    Bool(bool),
    Null,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldInit {
    pub name: String,
    pub value: Expr,
}

/// An expression node.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal { value: LiteralValue, line: u32 },
    Identifier { name: String, line: u32 },
    Binary { op: BinOp, left: Box<Expr>, right: Box<Expr>, line: u32 },
    Unary { op: UnOp, expr: Box<Expr>, line: u32 },
    Call { callee: Box<Expr>, args: Vec<Expr>, line: u32 },
    Member { object: Box<Expr>, field: String, line: u32 },
    Index { object: Box<Expr>, index: Box<Expr>, line: u32 },
    Array { elements: Vec<Expr>, line: u32 },
    Struct { type_name: String, fields: Vec<FieldInit>, line: u32 },
}

impl Expr {
    pub fn line(&self) -> u32 {
        match self {
            Expr::Literal { line, .. }
            | Expr::Identifier { line, .. }
            | Expr::Binary { line, .. }
            | Expr::Unary { line, .. }
            | Expr::Call { line, .. }
            | Expr::Member { line, .. }
            | Expr::Index { line, .. }
            | Expr::Array { line, .. }
            | Expr::Struct { line, .. } => *line,
        }
    }
}

/// A place expression: the left-hand side of an assignment.
#[derive(Debug, Clone, PartialEq)]
pub enum AssignTarget {
    Identifier { name: String, line: u32 },
    Member { object: Expr, field: String, line: u32 },
    Index { object: Expr, index: Expr, line: u32 },
}

/// A statement node.
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    VariableDecl { name: String, value: Expr, line: u32 },
    Assignment { target: AssignTarget, value: Expr, line: u32 },
    If { branches: Vec<(Expr, Block)>, else_branch: Option<Block>, line: u32 },
    While { condition: Expr, body: Block, line: u32 },
    For { var_name: String, iterable: Expr, body: Block, line: u32 },
    Return { value: Option<Expr>, line: u32 },
    ExprStmt { expr: Expr, line: u32 },
    Block(Block),
}

/// A brace-delimited sequence of statements; also the body of functions,
/// `if`/`elif`/`else` branches, `while`, and `for`.
pub type Block = Vec<Stmt>;

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDecl {
    pub name: String,
    pub params: Vec<String>,
    pub body: Block,
    pub line: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StructDecl {
    pub name: String,
    pub fields: Vec<String>,
    pub line: u32,
}

/// A top-level item: one of an import directive, a declaration, or a
/// statement appearing directly in a program.
#[derive(Debug, Clone, PartialEq)]
pub enum Item {
    Import { path: String, line: u32 },
    Function(FunctionDecl),
    Struct(StructDecl),
    Statement(Stmt),
}

/// An ordered sequence of top-level items: the root of a parsed source file.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Program {
    pub items: Vec<Item>,
}
