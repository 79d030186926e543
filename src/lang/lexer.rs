//! Tokenizer for the restricted language.

use super::SyntaxError;

/// One lexical token of user source.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Ident(String),
    Number(f64),
    Str(String),
    LParen,
    RParen,
    LBrace,
    RBrace,
    Comma,
    Semicolon,
    /// The `repeat` keyword.
    Repeat,
}

/// A token together with the 1-based source line it starts on.
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned {
    pub token: Token,
    pub line: u32,
}

/// Tokenizes a full program, skipping whitespace and `//` comments.
pub fn tokenize(source: &str) -> Result<Vec<Spanned>, SyntaxError> {
    let mut tokens = Vec::new();
    let mut chars = source.chars().peekable();
    let mut line: u32 = 1;

    while let Some(&c) = chars.peek() {
        match c {
            '\n' => {
                line += 1;
                chars.next();
            }
            c if c.is_whitespace() => {
                chars.next();
            }
            '/' => {
                chars.next();
                if chars.peek() == Some(&'/') {
                    // Comment runs to end of line; the newline itself is
                    // consumed by the whitespace arm next iteration.
                    while let Some(&n) = chars.peek() {
                        if n == '\n' {
                            break;
                        }
                        chars.next();
                    }
                } else {
                    return Err(SyntaxError::new(line, "unexpected character '/'"));
                }
            }
            '(' => {
                chars.next();
                tokens.push(Spanned { token: Token::LParen, line });
            }
            ')' => {
                chars.next();
                tokens.push(Spanned { token: Token::RParen, line });
            }
            '{' => {
                chars.next();
                tokens.push(Spanned { token: Token::LBrace, line });
            }
            '}' => {
                chars.next();
                tokens.push(Spanned { token: Token::RBrace, line });
            }
            ',' => {
                chars.next();
                tokens.push(Spanned { token: Token::Comma, line });
            }
            ';' => {
                chars.next();
                tokens.push(Spanned { token: Token::Semicolon, line });
            }
            '"' => {
                chars.next();
                let text = lex_string(&mut chars, line)?;
                tokens.push(Spanned { token: Token::Str(text), line });
            }
            c if c.is_ascii_digit() || c == '-' => {
                let number = lex_number(&mut chars, line)?;
                tokens.push(Spanned { token: Token::Number(number), line });
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let word = lex_ident(&mut chars);
                let token = if word == "repeat" {
                    Token::Repeat
                } else {
                    Token::Ident(word)
                };
                tokens.push(Spanned { token, line });
            }
            other => {
                return Err(SyntaxError::new(
                    line,
                    format!("unexpected character '{other}'"),
                ));
            }
        }
    }

    Ok(tokens)
}

fn lex_string(
    chars: &mut std::iter::Peekable<std::str::Chars<'_>>,
    line: u32,
) -> Result<String, SyntaxError> {
    let mut text = String::new();
    loop {
        match chars.next() {
            Some('"') => return Ok(text),
            Some('\\') => match chars.next() {
                Some('"') => text.push('"'),
                Some('\\') => text.push('\\'),
                Some('n') => text.push('\n'),
                Some('t') => text.push('\t'),
                Some(other) => {
                    return Err(SyntaxError::new(
                        line,
                        format!("unsupported escape '\\{other}'"),
                    ));
                }
                None => return Err(SyntaxError::new(line, "unterminated string")),
            },
            Some('\n') | None => return Err(SyntaxError::new(line, "unterminated string")),
            Some(other) => text.push(other),
        }
    }
}

fn lex_number(
    chars: &mut std::iter::Peekable<std::str::Chars<'_>>,
    line: u32,
) -> Result<f64, SyntaxError> {
    let mut text = String::new();
    if chars.peek() == Some(&'-') {
        text.push('-');
        chars.next();
    }
    let mut seen_dot = false;
    while let Some(&c) = chars.peek() {
        if c.is_ascii_digit() {
            text.push(c);
            chars.next();
        } else if c == '.' && !seen_dot {
            seen_dot = true;
            text.push(c);
            chars.next();
        } else {
            break;
        }
    }
    text.parse::<f64>()
        .map_err(|_| SyntaxError::new(line, format!("invalid number '{text}'")))
}

fn lex_ident(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> String {
    let mut word = String::new();
    while let Some(&c) = chars.peek() {
        if c.is_ascii_alphanumeric() || c == '_' {
            word.push(c);
            chars.next();
        } else {
            break;
        }
    }
    word
}
