//! Recursive-descent parser producing the program AST.

use super::lexer::{tokenize, Spanned, Token};
use super::{SyntaxError, Value};

/// One executable statement.
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    /// Invocation of a capability operation with literal arguments.
    Call {
        name: String,
        args: Vec<Value>,
        line: u32,
    },
    /// Fixed-count loop over a statement block.
    Repeat {
        count: u32,
        body: Vec<Stmt>,
        line: u32,
    },
}

/// A parsed user program.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub stmts: Vec<Stmt>,
}

/// Parses a full program from source text.
pub fn parse(source: &str) -> Result<Program, SyntaxError> {
    let tokens = tokenize(source)?;
    let mut parser = Parser { tokens, pos: 0 };
    let stmts = parser.block(None)?;
    Ok(Program { stmts })
}

struct Parser {
    tokens: Vec<Spanned>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Spanned> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Spanned> {
        let spanned = self.tokens.get(self.pos).cloned();
        if spanned.is_some() {
            self.pos += 1;
        }
        spanned
    }

    /// Line of the current token, or of the last token once input ran out.
    fn line(&self) -> u32 {
        self.peek()
            .or_else(|| self.tokens.last())
            .map_or(1, |s| s.line)
    }

    /// Parses statements until end of input, or until the closing brace of
    /// an enclosing `repeat` block when `until_brace` is set.
    fn block(&mut self, until_brace: Option<u32>) -> Result<Vec<Stmt>, SyntaxError> {
        let mut stmts = Vec::new();
        loop {
            match self.peek() {
                None => {
                    if let Some(open_line) = until_brace {
                        return Err(SyntaxError::new(
                            open_line,
                            "unclosed '{' in repeat block",
                        ));
                    }
                    return Ok(stmts);
                }
                Some(spanned) if spanned.token == Token::RBrace => {
                    if until_brace.is_some() {
                        self.next();
                        return Ok(stmts);
                    }
                    return Err(SyntaxError::new(spanned.line, "unmatched '}'"));
                }
                Some(spanned) if spanned.token == Token::Semicolon => {
                    self.next();
                }
                Some(_) => stmts.push(self.statement()?),
            }
        }
    }

    fn statement(&mut self) -> Result<Stmt, SyntaxError> {
        let spanned = self
            .next()
            .ok_or_else(|| SyntaxError::new(self.line(), "expected a statement"))?;
        match spanned.token {
            Token::Repeat => self.repeat(spanned.line),
            Token::Ident(name) => self.call(name, spanned.line),
            other => Err(SyntaxError::new(
                spanned.line,
                format!("expected a statement, found {other:?}"),
            )),
        }
    }

    fn repeat(&mut self, line: u32) -> Result<Stmt, SyntaxError> {
        let count = match self.next() {
            Some(Spanned {
                token: Token::Number(n),
                ..
            }) => {
                if n < 0.0 || n.fract() != 0.0 || n > u32::MAX as f64 {
                    return Err(SyntaxError::new(
                        line,
                        format!("repeat count must be a non-negative integer, got {n}"),
                    ));
                }
                n as u32
            }
            _ => {
                return Err(SyntaxError::new(line, "expected a count after 'repeat'"));
            }
        };

        match self.next() {
            Some(Spanned {
                token: Token::LBrace,
                ..
            }) => {}
            _ => return Err(SyntaxError::new(line, "expected '{' after repeat count")),
        }

        let body = self.block(Some(line))?;
        Ok(Stmt::Repeat { count, body, line })
    }

    fn call(&mut self, name: String, line: u32) -> Result<Stmt, SyntaxError> {
        match self.next() {
            Some(Spanned {
                token: Token::LParen,
                ..
            }) => {}
            _ => {
                return Err(SyntaxError::new(
                    line,
                    format!("expected '(' after '{name}'"),
                ));
            }
        }

        let mut args = Vec::new();
        // Empty argument list closes immediately.
        if let Some(spanned) = self.peek() {
            if spanned.token == Token::RParen {
                self.next();
                return Ok(Stmt::Call { name, args, line });
            }
        }

        loop {
            let spanned = self
                .next()
                .ok_or_else(|| SyntaxError::new(line, "unclosed argument list"))?;
            match spanned.token {
                Token::Number(n) => args.push(Value::Number(n)),
                Token::Str(s) => args.push(Value::Text(s)),
                other => {
                    return Err(SyntaxError::new(
                        spanned.line,
                        format!("expected a number or string argument, found {other:?}"),
                    ));
                }
            }

            match self.next() {
                Some(Spanned {
                    token: Token::Comma,
                    ..
                }) => {}
                Some(Spanned {
                    token: Token::RParen,
                    ..
                }) => return Ok(Stmt::Call { name, args, line }),
                _ => {
                    return Err(SyntaxError::new(
                        line,
                        "expected ',' or ')' in argument list",
                    ));
                }
            }
        }
    }
}
