//! Tokens → [`Program`]: a hand-written recursive-descent / precedence-
//! climbing parser.
//!
//! Precedence, low to high: `||`, `&&`, `== !=`, `< <= > >=`, `+ -`,
//! `* / %`, unary `! -`, right-associative `**`, postfix chains. Unary sits
//! *below* `**` so `-2 ** 2` parses as `-(2 ** 2)`.
//!
//! Struct literals (`ID { field: expr, ... }`) are ambiguous with the block
//! that follows an `if`/`while` condition or a `for` iterable — `if p { }`
//! could be a struct literal `p{}` or an empty-bodied `if`. Following the
//! usual fix for this class of grammar (as in languages whose composite
//! literals clash with block-opening braces), the parser tracks a
//! `struct_literals_allowed` flag that is cleared only for the direct
//! top-level expression in those three positions, and restored to `true` the
//! moment it descends into any parenthesized, bracketed, or call-argument
//! sub-expression.

use crate::ast::{AssignTarget, BinOp, Block, Expr, FieldInit, FunctionDecl, Item, LiteralValue, Program, Stmt, StructDecl, UnOp};
use crate::error::ParseError;
use crate::token::{Literal, Token, TokenKind};

pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    errors: Vec<ParseError>,
    struct_literals_allowed: bool,
}

type PResult<T> = Result<T, ()>;

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, pos: 0, errors: Vec::new(), struct_literals_allowed: true }
    }

    /// Parses the whole token stream into a [`Program`], recovering at
    /// statement/declaration boundaries so one bad item doesn't abort the
    /// rest of the file. Returns every diagnostic collected along the way;
    /// a non-empty list means the program should not be executed.
    pub fn parse_program(mut self) -> (Program, Vec<ParseError>) {
        let mut items = Vec::new();
        while !self.is_at_end() {
            match self.parse_item() {
                Ok(item) => items.push(item),
                Err(()) => self.synchronize(),
            }
        }
        (Program { items }, self.errors)
    }

    // ---- token stream helpers ----

    fn peek(&self) -> &Token {
        &self.tokens[self.pos]
    }

    fn peek_kind(&self) -> TokenKind {
        self.peek().kind
    }

    fn is_at_end(&self) -> bool {
        self.peek_kind() == TokenKind::Eof
    }

    fn previous(&self) -> &Token {
        &self.tokens[self.pos - 1]
    }

    fn advance(&mut self) -> &Token {
        if !self.is_at_end() {
            self.pos += 1;
        }
        self.previous()
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.peek_kind() == kind
    }

    fn match_kind(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn error_here(&mut self, message: impl Into<String>) {
        self.errors.push(ParseError::new(message, self.peek().line));
    }

    fn expect(&mut self, kind: TokenKind, context: &str) -> PResult<&Token> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            let found = self.peek().clone();
            self.error_here(format!("expected {kind} {context}, found {found}"));
            Err(())
        }
    }

    fn expect_ident(&mut self, context: &str) -> PResult<String> {
        if self.check(TokenKind::Ident) {
            let tok = self.advance();
            Ok(tok.text().expect("ident token carries text").to_string())
        } else {
            let found = self.peek().clone();
            self.error_here(format!("expected identifier {context}, found {found}"));
            Err(())
        }
    }

    /// Skips tokens until the next statement/declaration boundary: just
    /// past a `;`, just before a `}` or a keyword that starts a new item,
    /// or end of input.
    fn synchronize(&mut self) {
        while !self.is_at_end() {
            if self.previous().kind == TokenKind::Semicolon {
                return;
            }
            match self.peek_kind() {
                TokenKind::RBrace
                | TokenKind::Fn
                | TokenKind::Struct
                | TokenKind::Let
                | TokenKind::If
                | TokenKind::While
                | TokenKind::For
                | TokenKind::Return
                | TokenKind::Import => return,
                _ => {
                    self.advance();
                }
            }
        }
    }

    fn with_struct_literals_allowed<T>(&mut self, allowed: bool, f: impl FnOnce(&mut Self) -> PResult<T>) -> PResult<T> {
        let saved = self.struct_literals_allowed;
        self.struct_literals_allowed = allowed;
        let result = f(self);
        self.struct_literals_allowed = saved;
        result
    }

    // ---- top-level items ----

    fn parse_item(&mut self) -> PResult<Item> {
        match self.peek_kind() {
            TokenKind::Import => self.parse_import(),
            TokenKind::Fn => self.parse_function_decl(),
            TokenKind::Struct => self.parse_struct_decl(),
            _ => Ok(Item::Statement(self.parse_statement()?)),
        }
    }

    fn parse_import(&mut self) -> PResult<Item> {
        let line = self.advance().line; // 'import'
        let path_tok = self.expect(TokenKind::Str, "after 'import'")?.clone();
        self.expect(TokenKind::Semicolon, "after import path")?;
        let path = match path_tok.literal {
            Literal::Str(s) => s,
            _ => unreachable!("Str token always carries a string literal"),
        };
        log::debug!("parsed import directive for '{path}' (no-op)");
        Ok(Item::Import { path, line })
    }

    fn parse_function_decl(&mut self) -> PResult<Item> {
        let line = self.advance().line; // 'fn'
        let name = self.expect_ident("after 'fn'")?;
        self.expect(TokenKind::LParen, "after function name")?;
        let mut params = Vec::new();
        if !self.check(TokenKind::RParen) {
            loop {
                params.push(self.expect_ident("in parameter list")?);
                if !self.match_kind(TokenKind::Comma) {
                    break;
                }
                if self.check(TokenKind::RParen) {
                    break; // trailing comma
                }
            }
        }
        self.expect(TokenKind::RParen, "after parameter list")?;
        let body = self.parse_block()?;
        Ok(Item::Function(FunctionDecl { name, params, body, line }))
    }

    fn parse_struct_decl(&mut self) -> PResult<Item> {
        let line = self.advance().line; // 'struct'
        let name = self.expect_ident("after 'struct'")?;
        self.expect(TokenKind::LBrace, "after struct name")?;
        let mut fields = Vec::new();
        while !self.check(TokenKind::RBrace) && !self.is_at_end() {
            fields.push(self.expect_ident("in field list")?);
            if !self.match_kind(TokenKind::Comma) {
                break;
            }
        }
        self.expect(TokenKind::RBrace, "after field list")?;
        self.expect(TokenKind::Semicolon, "after struct declaration")?;
        Ok(Item::Struct(StructDecl { name, fields, line }))
    }

    // ---- statements ----

    fn parse_statement(&mut self) -> PResult<Stmt> {
        match self.peek_kind() {
            TokenKind::Let => self.parse_variable_decl(),
            TokenKind::If => self.parse_if(),
            TokenKind::While => self.parse_while(),
            TokenKind::For => self.parse_for(),
            TokenKind::Return => self.parse_return(),
            TokenKind::LBrace => Ok(Stmt::Block(self.parse_block()?)),
            _ => self.parse_assignment_or_expr_stmt(),
        }
    }

    fn parse_block(&mut self) -> PResult<Block> {
        self.expect(TokenKind::LBrace, "to start a block")?;
        let mut stmts = Vec::new();
        while !self.check(TokenKind::RBrace) && !self.is_at_end() {
            match self.parse_statement() {
                Ok(stmt) => stmts.push(stmt),
                Err(()) => self.synchronize(),
            }
        }
        self.expect(TokenKind::RBrace, "to close a block")?;
        Ok(stmts)
    }

    fn parse_variable_decl(&mut self) -> PResult<Stmt> {
        let line = self.advance().line; // 'let'
        let name = self.expect_ident("after 'let'")?;
        self.expect(TokenKind::Assign, "in variable declaration")?;
        let value = self.parse_expr()?;
        self.expect(TokenKind::Semicolon, "after variable declaration")?;
        Ok(Stmt::VariableDecl { name, value, line })
    }

    fn parse_if(&mut self) -> PResult<Stmt> {
        let line = self.advance().line; // 'if'
        let mut branches = Vec::new();
        let condition = self.with_struct_literals_allowed(false, Self::parse_expr)?;
        let body = self.parse_block()?;
        branches.push((condition, body));
        while self.match_kind(TokenKind::Elif) {
            let condition = self.with_struct_literals_allowed(false, Self::parse_expr)?;
            let body = self.parse_block()?;
            branches.push((condition, body));
        }
        let else_branch = if self.match_kind(TokenKind::Else) { Some(self.parse_block()?) } else { None };
        Ok(Stmt::If { branches, else_branch, line })
    }

    fn parse_while(&mut self) -> PResult<Stmt> {
        let line = self.advance().line; // 'while'
        let condition = self.with_struct_literals_allowed(false, Self::parse_expr)?;
        let body = self.parse_block()?;
        Ok(Stmt::While { condition, body, line })
    }

    fn parse_for(&mut self) -> PResult<Stmt> {
        let line = self.advance().line; // 'for'
        let var_name = self.expect_ident("after 'for'")?;
        self.expect(TokenKind::In, "after for-loop variable")?;
        let iterable = self.with_struct_literals_allowed(false, Self::parse_expr)?;
        let body = self.parse_block()?;
        Ok(Stmt::For { var_name, iterable, body, line })
    }

    fn parse_return(&mut self) -> PResult<Stmt> {
        let line = self.advance().line; // 'return'
        let value = if self.check(TokenKind::Semicolon) { None } else { Some(self.parse_expr()?) };
        self.expect(TokenKind::Semicolon, "after return statement")?;
        Ok(Stmt::Return { value, line })
    }

    fn parse_assignment_or_expr_stmt(&mut self) -> PResult<Stmt> {
        let line = self.peek().line;
        let expr = self.parse_expr()?;
        if self.match_kind(TokenKind::Assign) {
            let target = self.expr_to_assign_target(expr)?;
            let value = self.parse_expr()?;
            self.expect(TokenKind::Semicolon, "after assignment")?;
            Ok(Stmt::Assignment { target, value, line })
        } else {
            self.expect(TokenKind::Semicolon, "after expression statement")?;
            Ok(Stmt::ExprStmt { expr, line })
        }
    }

    fn expr_to_assign_target(&mut self, expr: Expr) -> PResult<AssignTarget> {
        match expr {
            Expr::Identifier { name, line } => Ok(AssignTarget::Identifier { name, line }),
            Expr::Member { object, field, line } => Ok(AssignTarget::Member { object: *object, field, line }),
            Expr::Index { object, index, line } => Ok(AssignTarget::Index { object: *object, index: *index, line }),
            other => {
                self.errors.push(ParseError::new("invalid assignment target", other.line()));
                Err(())
            }
        }
    }

    // ---- expressions, precedence climbing low to high ----

    fn parse_expr(&mut self) -> PResult<Expr> {
        self.parse_or()
    }

    fn parse_or(&mut self) -> PResult<Expr> {
        let mut left = self.parse_and()?;
        while self.check(TokenKind::OrOr) {
            let line = self.advance().line;
            let right = self.parse_and()?;
            left = Expr::Binary { op: BinOp::Or, left: Box::new(left), right: Box::new(right), line };
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> PResult<Expr> {
        let mut left = self.parse_equality()?;
        while self.check(TokenKind::AndAnd) {
            let line = self.advance().line;
            let right = self.parse_equality()?;
            left = Expr::Binary { op: BinOp::And, left: Box::new(left), right: Box::new(right), line };
        }
        Ok(left)
    }

    fn parse_equality(&mut self) -> PResult<Expr> {
        let mut left = self.parse_comparison()?;
        loop {
            let op = match self.peek_kind() {
                TokenKind::Eq => BinOp::Eq,
                TokenKind::Ne => BinOp::Ne,
                _ => break,
            };
            let line = self.advance().line;
            let right = self.parse_comparison()?;
            left = Expr::Binary { op, left: Box::new(left), right: Box::new(right), line };
        }
        Ok(left)
    }

    fn parse_comparison(&mut self) -> PResult<Expr> {
        let mut left = self.parse_term()?;
        loop {
            let op = match self.peek_kind() {
                TokenKind::Lt => BinOp::Lt,
                TokenKind::Le => BinOp::Le,
                TokenKind::Gt => BinOp::Gt,
                TokenKind::Ge => BinOp::Ge,
                _ => break,
            };
            let line = self.advance().line;
            let right = self.parse_term()?;
            left = Expr::Binary { op, left: Box::new(left), right: Box::new(right), line };
        }
        Ok(left)
    }

    fn parse_term(&mut self) -> PResult<Expr> {
        let mut left = self.parse_factor()?;
        loop {
            let op = match self.peek_kind() {
                TokenKind::Plus => BinOp::Add,
                TokenKind::Minus => BinOp::Sub,
                _ => break,
            };
            let line = self.advance().line;
            let right = self.parse_factor()?;
            left = Expr::Binary { op, left: Box::new(left), right: Box::new(right), line };
        }
        Ok(left)
    }

    fn parse_factor(&mut self) -> PResult<Expr> {
        let mut left = self.parse_unary()?;
        loop {
            let op = match self.peek_kind() {
                TokenKind::Star => BinOp::Mul,
                TokenKind::Slash => BinOp::Div,
                TokenKind::Percent => BinOp::Mod,
                _ => break,
            };
            let line = self.advance().line;
            let right = self.parse_unary()?;
            left = Expr::Binary { op, left: Box::new(left), right: Box::new(right), line };
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> PResult<Expr> {
        let op = match self.peek_kind() {
            TokenKind::Bang => UnOp::Not,
            TokenKind::Minus => UnOp::Neg,
            _ => return self.parse_power(),
        };
        let line = self.advance().line;
        let expr = self.parse_unary()?;
        Ok(Expr::Unary { op, expr: Box::new(expr), line })
    }

    fn parse_power(&mut self) -> PResult<Expr> {
        let base = self.parse_postfix()?;
        if self.check(TokenKind::StarStar) {
            let line = self.advance().line;
            let exponent = self.parse_unary()?; // right-associative, allows unary on the rhs
            Ok(Expr::Binary { op: BinOp::Pow, left: Box::new(base), right: Box::new(exponent), line })
        } else {
            Ok(base)
        }
    }

    fn parse_postfix(&mut self) -> PResult<Expr> {
        let mut expr = self.parse_primary()?;
        loop {
            expr = match self.peek_kind() {
                TokenKind::LParen => {
                    let line = self.advance().line;
                    let args = self.with_struct_literals_allowed(true, Self::parse_call_args)?;
                    self.expect(TokenKind::RParen, "after call arguments")?;
                    Expr::Call { callee: Box::new(expr), args, line }
                }
                TokenKind::Dot => {
                    let line = self.advance().line;
                    let field = self.expect_ident("after '.'")?;
                    Expr::Member { object: Box::new(expr), field, line }
                }
                TokenKind::LBracket => {
                    let line = self.advance().line;
                    let index = self.with_struct_literals_allowed(true, Self::parse_expr)?;
                    self.expect(TokenKind::RBracket, "after index expression")?;
                    Expr::Index { object: Box::new(expr), index: Box::new(index), line }
                }
                _ => break,
            };
        }
        Ok(expr)
    }

    fn parse_call_args(&mut self) -> PResult<Vec<Expr>> {
        let mut args = Vec::new();
        if !self.check(TokenKind::RParen) {
            loop {
                args.push(self.parse_expr()?);
                if !self.match_kind(TokenKind::Comma) {
                    break;
                }
                if self.check(TokenKind::RParen) {
                    break; // trailing comma
                }
            }
        }
        Ok(args)
    }

    fn parse_primary(&mut self) -> PResult<Expr> {
        let line = self.peek().line;
        match self.peek_kind() {
            TokenKind::Int => {
                let Literal::Int(n) = self.advance().literal.clone() else { unreachable!() };
                Ok(Expr::Literal { value: LiteralValue::Int(n), line })
            }
            TokenKind::Float => {
                let Literal::Float(n) = self.advance().literal.clone() else { unreachable!() };
                Ok(Expr::Literal { value: LiteralValue::Float(n), line })
            }
            TokenKind::Str => {
                let Literal::Str(s) = self.advance().literal.clone() else { unreachable!() };
                Ok(Expr::Literal { value: LiteralValue::Str(s), line })
            }
            TokenKind::True => {
                self.advance();
                Ok(Expr::Literal { value: LiteralValue::Bool(true), line })
            }
            TokenKind::False => {
                self.advance();
                Ok(Expr::Literal { value: LiteralValue::Bool(false), line })
            }
            TokenKind::Null => {
                self.advance();
                Ok(Expr::Literal { value: LiteralValue::Null, line })
            }
            TokenKind::LParen => {
                self.advance();
                let expr = self.with_struct_literals_allowed(true, Self::parse_expr)?;
                self.expect(TokenKind::RParen, "to close parenthesized expression")?;
                Ok(expr)
            }
            TokenKind::LBracket => self.parse_array_literal(),
            TokenKind::Ident => {
                let name = self.advance().text().expect("ident token carries text").to_string();
                if self.struct_literals_allowed && self.check(TokenKind::LBrace) {
                    self.parse_struct_literal(name, line)
                } else {
                    Ok(Expr::Identifier { name, line })
                }
            }
            _ => {
                let found = self.peek().clone();
                self.error_here(format!("expected an expression, found {found}"));
                Err(())
            }
        }
    }

    fn parse_array_literal(&mut self) -> PResult<Expr> {
        let line = self.advance().line; // '['
        let mut elements = Vec::new();
        self.with_struct_literals_allowed(true, |p| {
            if !p.check(TokenKind::RBracket) {
                loop {
                    elements.push(p.parse_expr()?);
                    if !p.match_kind(TokenKind::Comma) {
                        break;
                    }
                    if p.check(TokenKind::RBracket) {
                        break; // trailing comma
                    }
                }
            }
            Ok(())
        })?;
        self.expect(TokenKind::RBracket, "after array literal")?;
        Ok(Expr::Array { elements, line })
    }

    fn parse_struct_literal(&mut self, type_name: String, line: u32) -> PResult<Expr> {
        self.advance(); // '{'
        let mut fields = Vec::new();
        self.with_struct_literals_allowed(true, |p| {
            if !p.check(TokenKind::RBrace) {
                loop {
                    let name = p.expect_ident("in struct literal")?;
                    p.expect(TokenKind::Colon, "after field name")?;
                    let value = p.parse_expr()?;
                    fields.push(FieldInit { name, value });
                    if !p.match_kind(TokenKind::Comma) {
                        break;
                    }
                    if p.check(TokenKind::RBrace) {
                        break; // trailing comma
                    }
                }
            }
            Ok(())
        })?;
        self.expect(TokenKind::RBrace, "after struct literal")?;
        Ok(Expr::Struct { type_name, fields, line })
    }
}

/// Convenience entry point: lexes and parses `source` in one call.
///
/// Any lex errors are folded into the returned parse diagnostics (as
/// `ParseError`s at the same line) so a driver only has to check one list.
pub fn parse(source: &str) -> (Program, Vec<ParseError>) {
    let (tokens, lex_errors) = crate::lexer::Lexer::new(source).tokenize();
    let (program, mut parse_errors) = Parser::new(tokens).parse_program();
    let mut errors: Vec<ParseError> =
        lex_errors.into_iter().map(|e| ParseError::new(e.to_string(), line_of(&e))).collect();
    errors.append(&mut parse_errors);
    errors.sort_by_key(|e| e.line);
    (program, errors)
}

fn line_of(err: &crate::error::LexError) -> u32 {
    match err {
        crate::error::LexError::UnexpectedChar { line, .. }
        | crate::error::LexError::UnterminatedString { line }
        | crate::error::LexError::UnterminatedBlockComment { line }
        | crate::error::LexError::IntOverflow { line, .. } => *line,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_ok(src: &str) -> Program {
        let (program, errors) = parse(src);
        assert!(errors.is_empty(), "unexpected parse errors: {errors:?}");
        program
    }

    #[test]
    fn precedence_matches_arithmetic_scenario() {
        let program = parse_ok("let x = 1 + 2 * 3 ** 2;");
        let Item::Statement(Stmt::VariableDecl { value, .. }) = &program.items[0] else {
            panic!("expected a variable decl");
        };
        // 1 + (2 * (3 ** 2))
        let Expr::Binary { op: BinOp::Add, left, right, .. } = value else { panic!("expected Add at top") };
        assert!(matches!(**left, Expr::Literal { value: LiteralValue::Int(1), .. }));
        let Expr::Binary { op: BinOp::Mul, left: mul_left, right: mul_right, .. } = right.as_ref() else {
            panic!("expected Mul")
        };
        assert!(matches!(**mul_left, Expr::Literal { value: LiteralValue::Int(2), .. }));
        assert!(matches!(**mul_right, Expr::Binary { op: BinOp::Pow, .. }));
    }

    #[test]
    fn unary_binds_looser_than_power() {
        let program = parse_ok("let x = -2 ** 2;");
        let Item::Statement(Stmt::VariableDecl { value, .. }) = &program.items[0] else { panic!() };
        // -(2 ** 2)
        let Expr::Unary { op: UnOp::Neg, expr, .. } = value else { panic!("expected unary negation at top") };
        assert!(matches!(**expr, Expr::Binary { op: BinOp::Pow, .. }));
    }

    #[test]
    fn postfix_chain_is_left_associative() {
        // a.b[c](d).e
        let program = parse_ok("a.b[c](d).e;");
        let Item::Statement(Stmt::ExprStmt { expr, .. }) = &program.items[0] else { panic!() };
        let Expr::Member { object, field, .. } = expr else { panic!("expected outer Member") };
        assert_eq!(field, "e");
        let Expr::Call { callee, args, .. } = object.as_ref() else { panic!("expected Call") };
        assert_eq!(args.len(), 1);
        let Expr::Index { object, .. } = callee.as_ref() else { panic!("expected Index") };
        let Expr::Member { field, .. } = object.as_ref() else { panic!("expected inner Member") };
        assert_eq!(field, "b");
    }

    #[test]
    fn struct_literal_and_field_access() {
        let program = parse_ok("struct P { x, y, };\nlet p = P{x: 1, y: 2};");
        assert!(matches!(program.items[0], Item::Struct(_)));
    }

    #[test]
    fn if_condition_identifier_does_not_swallow_block_as_struct_literal() {
        let program = parse_ok("if flag { let y = 1; }");
        let Item::Statement(Stmt::If { branches, .. }) = &program.items[0] else { panic!("expected if") };
        assert!(matches!(branches[0].0, Expr::Identifier { .. }));
        assert_eq!(branches[0].1.len(), 1);
    }

    #[test]
    fn struct_literal_allowed_inside_parens_in_condition() {
        let program = parse_ok("if (P{x: 1, y: 2}).x > 0 { }");
        let Item::Statement(Stmt::If { branches, .. }) = &program.items[0] else { panic!("expected if") };
        assert!(matches!(branches[0].0, Expr::Binary { op: BinOp::Gt, .. }));
    }

    #[test]
    fn missing_semicolon_is_reported_with_line() {
        let (_, errors) = parse("let x = 1\nlet y = 2;");
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].line, 2);
    }

    #[test]
    fn recovers_after_syntax_error_to_parse_later_items() {
        let (program, errors) = parse("let x = ;\nfn f() { return 1; }");
        assert!(!errors.is_empty());
        assert!(program.items.iter().any(|i| matches!(i, Item::Function(_))));
    }

    #[test]
    fn elif_and_else_chain() {
        let program = parse_ok("if a { } elif b { } else { }");
        let Item::Statement(Stmt::If { branches, else_branch, .. }) = &program.items[0] else { panic!() };
        assert_eq!(branches.len(), 2);
        assert!(else_branch.is_some());
    }

    #[test]
    fn for_loop_over_array_literal() {
        let program = parse_ok("for e in [1,2,3] { }");
        assert!(matches!(&program.items[0], Item::Statement(Stmt::For { .. })));
    }

    #[test]
    fn assignment_to_index_target() {
        let program = parse_ok("xs[0] = 1;");
        let Item::Statement(Stmt::Assignment { target, .. }) = &program.items[0] else { panic!() };
        assert!(matches!(target, AssignTarget::Index { .. }));
    }
}
