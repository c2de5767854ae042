//! Source text to token stream.
//!
//! Whitespace (space, tab, carriage return) is skipped; newlines are counted
//! but never emitted as tokens. `//` runs to end of line; `/* */` may span
//! lines and does not nest. An unrecognized character is recorded as a
//! [`LexError`] and skipped so lexing can keep going and surface more than
//! one diagnostic per pass.

use crate::error::LexError;
use crate::token::{Literal, Token, TokenKind};

pub struct Lexer<'src> {
    chars: std::iter::Peekable<std::str::Chars<'src>>,
    line: u32,
    errors: Vec<LexError>,
}

impl<'src> Lexer<'src> {
    pub fn new(source: &'src str) -> Self {
        Self { chars: source.chars().peekable(), line: 1, errors: Vec::new() }
    }

    /// Lexes the entire source, returning the token stream (terminated by
    /// `Eof`) and any diagnostics collected along the way.
    pub fn tokenize(mut self) -> (Vec<Token>, Vec<LexError>) {
        let mut tokens = Vec::new();
        loop {
            self.skip_whitespace_and_comments();
            let line = self.line;
            let Some(ch) = self.chars.next() else {
                tokens.push(Token::new(TokenKind::Eof, Literal::None, line));
                break;
            };
            if let Some(tok) = self.lex_one(ch, line) {
                tokens.push(tok);
            }
        }
        (tokens, self.errors)
    }

    fn skip_whitespace_and_comments(&mut self) {
        loop {
            match self.chars.peek() {
                Some(' ' | '\t' | '\r') => {
                    self.chars.next();
                }
                Some('\n') => {
                    self.line += 1;
                    self.chars.next();
                }
                Some('/') => {
                    let mut lookahead = self.chars.clone();
                    lookahead.next();
                    match lookahead.peek() {
                        Some('/') => {
                            self.chars.next();
                            self.chars.next();
                            for c in self.chars.by_ref() {
                                if c == '\n' {
                                    self.line += 1;
                                    break;
                                }
                            }
                        }
                        Some('*') => {
                            self.chars.next();
                            self.chars.next();
                            let start_line = self.line;
                            let mut closed = false;
                            while let Some(c) = self.chars.next() {
                                if c == '\n' {
                                    self.line += 1;
                                } else if c == '*' && self.chars.peek() == Some(&'/') {
                                    self.chars.next();
                                    closed = true;
                                    break;
                                }
                            }
                            if !closed {
                                self.errors.push(LexError::UnterminatedBlockComment { line: start_line });
                            }
                        }
                        _ => return,
                    }
                }
                _ => return,
            }
        }
    }

    fn lex_one(&mut self, ch: char, line: u32) -> Option<Token> {
        let kind = match ch {
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            '{' => TokenKind::LBrace,
            '}' => TokenKind::RBrace,
            '[' => TokenKind::LBracket,
            ']' => TokenKind::RBracket,
            ',' => TokenKind::Comma,
            '.' => TokenKind::Dot,
            ':' => TokenKind::Colon,
            ';' => TokenKind::Semicolon,
            '+' => TokenKind::Plus,
            '-' => TokenKind::Minus,
            '%' => TokenKind::Percent,
            '*' => return Some(self.two_char('*', TokenKind::StarStar, TokenKind::Star, line)),
            '=' => return Some(self.two_char('=', TokenKind::Eq, TokenKind::Assign, line)),
            '!' => return Some(self.two_char('=', TokenKind::Ne, TokenKind::Bang, line)),
            '<' => return Some(self.two_char('=', TokenKind::Le, TokenKind::Lt, line)),
            '>' => return Some(self.two_char('=', TokenKind::Ge, TokenKind::Gt, line)),
            '/' => TokenKind::Slash,
            '&' => {
                if self.chars.peek() == Some(&'&') {
                    self.chars.next();
                    TokenKind::AndAnd
                } else {
                    self.errors.push(LexError::UnexpectedChar { ch: '&', line });
                    return None;
                }
            }
            '|' => {
                if self.chars.peek() == Some(&'|') {
                    self.chars.next();
                    TokenKind::OrOr
                } else {
                    self.errors.push(LexError::UnexpectedChar { ch: '|', line });
                    return None;
                }
            }
            '"' => return self.lex_string(line),
            c if c.is_ascii_digit() => return Some(self.lex_number(c, line)),
            c if c.is_ascii_alphabetic() || c == '_' => return Some(self.lex_ident(c, line)),
            other => {
                self.errors.push(LexError::UnexpectedChar { ch: other, line });
                return None;
            }
        };
        Some(Token::new(kind, Literal::None, line))
    }

    /// Lexes a two-character operator if `next` follows, else the one-char fallback.
    fn two_char(&mut self, next: char, two: TokenKind, one: TokenKind, line: u32) -> Token {
        if self.chars.peek() == Some(&next) {
            self.chars.next();
            Token::new(two, Literal::None, line)
        } else {
            Token::new(one, Literal::None, line)
        }
    }

    fn lex_number(&mut self, first: char, line: u32) -> Token {
        let mut text = String::new();
        text.push(first);
        while let Some(&c) = self.chars.peek() {
            if c.is_ascii_digit() {
                text.push(c);
                self.chars.next();
            } else {
                break;
            }
        }
        if self.chars.peek() == Some(&'.') {
            let mut lookahead = self.chars.clone();
            lookahead.next();
            if lookahead.peek().is_some_and(char::is_ascii_digit) {
                text.push('.');
                self.chars.next();
                while let Some(&c) = self.chars.peek() {
                    if c.is_ascii_digit() {
                        text.push(c);
                        self.chars.next();
                    } else {
                        break;
                    }
                }
                let value: f64 = text.parse().expect("validated float lexeme");
                return Token::new(TokenKind::Float, Literal::Float(value), line);
            }
        }
        match text.parse::<i64>() {
            Ok(value) => Token::new(TokenKind::Int, Literal::Int(value), line),
            Err(_) => {
                self.errors.push(LexError::IntOverflow { text: text.clone(), line });
                Token::new(TokenKind::Int, Literal::Int(0), line)
            }
        }
    }

    fn lex_string(&mut self, line: u32) -> Option<Token> {
        let mut value = String::new();
        loop {
            match self.chars.next() {
                Some('"') => return Some(Token::new(TokenKind::Str, Literal::Str(value), line)),
                Some('\\') => match self.chars.next() {
                    Some('n') => value.push('\n'),
                    Some('t') => value.push('\t'),
                    Some('r') => value.push('\r'),
                    Some('\\') => value.push('\\'),
                    Some('"') => value.push('"'),
                    Some(other) => {
                        value.push('\\');
                        value.push(other);
                    }
                    None => {
                        self.errors.push(LexError::UnterminatedString { line });
                        return None;
                    }
                },
                Some('\n') => {
                    self.line += 1;
                    value.push('\n');
                }
                Some(c) => value.push(c),
                None => {
                    self.errors.push(LexError::UnterminatedString { line });
                    return None;
                }
            }
        }
    }

    fn lex_ident(&mut self, first: char, line: u32) -> Token {
        let mut text = String::new();
        text.push(first);
        while let Some(&c) = self.chars.peek() {
            if c.is_ascii_alphanumeric() || c == '_' {
                text.push(c);
                self.chars.next();
            } else {
                break;
            }
        }
        if let Some(kind) = TokenKind::keyword(&text) {
            Token::new(kind, Literal::None, line)
        } else {
            Token::new(TokenKind::Ident, Literal::Str(text), line)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        let (tokens, errors) = Lexer::new(src).tokenize();
        assert!(errors.is_empty(), "unexpected lex errors: {errors:?}");
        tokens.into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn lexes_arithmetic_with_precedence_operators() {
        let kinds = kinds("1 + 2 * 3 ** 2");
        assert_eq!(
            kinds,
            vec![
                TokenKind::Int,
                TokenKind::Plus,
                TokenKind::Int,
                TokenKind::Star,
                TokenKind::Int,
                TokenKind::StarStar,
                TokenKind::Int,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn two_char_operators_take_precedence_over_prefixes() {
        assert_eq!(
            kinds("== != <= >= && ||"),
            vec![
                TokenKind::Eq,
                TokenKind::Ne,
                TokenKind::Le,
                TokenKind::Ge,
                TokenKind::AndAnd,
                TokenKind::OrOr,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn keywords_short_circuit_identifiers() {
        let (tokens, _) = Lexer::new("let iffy if").tokenize();
        assert_eq!(tokens[0].kind, TokenKind::Let);
        assert_eq!(tokens[1].kind, TokenKind::Ident);
        assert_eq!(tokens[1].text(), Some("iffy"));
        assert_eq!(tokens[2].kind, TokenKind::If);
    }

    #[test]
    fn decodes_string_escapes() {
        let (tokens, errors) = Lexer::new(r#""a\nb\t\"c\"\\""#).tokenize();
        assert!(errors.is_empty());
        assert_eq!(tokens[0].literal, Literal::Str("a\nb\t\"c\"\\".to_string()));
    }

    #[test]
    fn line_and_block_comments_are_skipped() {
        let kinds = kinds("1 // trailing comment\n+ /* block\ncomment */ 2");
        assert_eq!(kinds, vec![TokenKind::Int, TokenKind::Plus, TokenKind::Int, TokenKind::Eof]);
    }

    #[test]
    fn block_comments_do_not_nest() {
        let (tokens, errors) = Lexer::new("/* outer /* inner */ still_code */").tokenize();
        assert!(errors.is_empty());
        // the first `*/` closes the comment; `still_code */` is lexed as code.
        assert_eq!(tokens[0].kind, TokenKind::Ident);
    }

    #[test]
    fn unterminated_block_comment_is_reported() {
        let (_, errors) = Lexer::new("/* never closes").tokenize();
        assert_eq!(errors, vec![LexError::UnterminatedBlockComment { line: 1 }]);
    }

    #[test]
    fn unknown_character_is_reported_and_skipped() {
        let (tokens, errors) = Lexer::new("1 @ 2").tokenize();
        assert_eq!(errors, vec![LexError::UnexpectedChar { ch: '@', line: 1 }]);
        assert_eq!(kinds_of(&tokens), vec![TokenKind::Int, TokenKind::Int, TokenKind::Eof]);
    }

    fn kinds_of(tokens: &[Token]) -> Vec<TokenKind> {
        tokens.iter().map(|t| t.kind).collect()
    }

    #[test]
    fn tracks_line_numbers_across_newlines() {
        let (tokens, _) = Lexer::new("1\n2\n3").tokenize();
        let lines: Vec<u32> = tokens.iter().map(|t| t.line).collect();
        assert_eq!(lines, vec![1, 2, 3, 3]);
    }
}
