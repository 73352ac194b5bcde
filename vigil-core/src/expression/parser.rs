use std::fmt;

use super::AccessExpression;

/// An access expression that could not be parsed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExpressionError {
    /// The rejected input.
    pub expression: String,
    /// Byte offset where parsing failed.
    pub offset: usize,
    pub message: String,
}

impl fmt::Display for ExpressionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Invalid access expression \"{}\" at offset {}: {}",
            self.expression, self.offset, self.message
        )
    }
}

impl std::error::Error for ExpressionError {}

#[derive(Clone, Debug, PartialEq)]
enum TokenKind {
    Ident(String),
    Str(String),
    LParen,
    RParen,
    Comma,
    And,
    Or,
    Not,
}

#[derive(Clone, Debug)]
struct Token {
    kind: TokenKind,
    offset: usize,
}

fn tokenize(input: &str) -> Result<Vec<Token>, (usize, String)> {
    let bytes = input.as_bytes();
    let mut tokens = Vec::new();
    let mut pos = 0;

    while pos < bytes.len() {
        let c = bytes[pos];
        let start = pos;
        match c {
            b' ' | b'\t' | b'\n' | b'\r' => {
                pos += 1;
                continue;
            }
            b'(' => {
                tokens.push(Token { kind: TokenKind::LParen, offset: start });
                pos += 1;
            }
            b')' => {
                tokens.push(Token { kind: TokenKind::RParen, offset: start });
                pos += 1;
            }
            b',' => {
                tokens.push(Token { kind: TokenKind::Comma, offset: start });
                pos += 1;
            }
            b'!' => {
                tokens.push(Token { kind: TokenKind::Not, offset: start });
                pos += 1;
            }
            b'&' | b'|' => {
                if bytes.get(pos + 1) != Some(&c) {
                    return Err((start, format!("expected '{0}{0}'", c as char)));
                }
                let kind = if c == b'&' { TokenKind::And } else { TokenKind::Or };
                tokens.push(Token { kind, offset: start });
                pos += 2;
            }
            b'\'' | b'"' => {
                let content_start = pos + 1;
                let end = input[content_start..]
                    .find(c as char)
                    .map(|i| content_start + i)
                    .ok_or_else(|| (start, "unterminated string literal".to_string()))?;
                tokens.push(Token {
                    kind: TokenKind::Str(input[content_start..end].to_string()),
                    offset: start,
                });
                pos = end + 1;
            }
            c if c.is_ascii_alphabetic() || c == b'_' => {
                while pos < bytes.len() && (bytes[pos].is_ascii_alphanumeric() || bytes[pos] == b'_')
                {
                    pos += 1;
                }
                let word = &input[start..pos];
                let kind = match word.to_ascii_lowercase().as_str() {
                    "and" => TokenKind::And,
                    "or" => TokenKind::Or,
                    "not" => TokenKind::Not,
                    _ => TokenKind::Ident(word.to_string()),
                };
                tokens.push(Token { kind, offset: start });
            }
            _ => {
                let ch = input[start..].chars().next().unwrap_or('?');
                return Err((start, format!("unexpected character '{ch}'")));
            }
        }
    }

    Ok(tokens)
}

struct Parser<'a> {
    input: &'a str,
    tokens: Vec<Token>,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn error(&self, offset: usize, message: impl Into<String>) -> ExpressionError {
        ExpressionError {
            expression: self.input.to_string(),
            offset,
            message: message.into(),
        }
    }

    fn peek(&self) -> Option<&TokenKind> {
        self.tokens.get(self.pos).map(|t| &t.kind)
    }

    /// Offset of the current token, or the end of input.
    fn offset(&self) -> usize {
        self.tokens
            .get(self.pos)
            .map(|t| t.offset)
            .unwrap_or(self.input.len())
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn expect(&mut self, kind: TokenKind, what: &str) -> Result<(), ExpressionError> {
        let offset = self.offset();
        match self.next() {
            Some(token) if token.kind == kind => Ok(()),
            _ => Err(self.error(offset, format!("expected {what}"))),
        }
    }

    fn parse_or(&mut self) -> Result<AccessExpression, ExpressionError> {
        let mut items = vec![self.parse_and()?];
        while self.peek() == Some(&TokenKind::Or) {
            self.pos += 1;
            items.push(self.parse_and()?);
        }
        Ok(if items.len() == 1 {
            items.remove(0)
        } else {
            AccessExpression::Any(items)
        })
    }

    fn parse_and(&mut self) -> Result<AccessExpression, ExpressionError> {
        let mut items = vec![self.parse_unary()?];
        while self.peek() == Some(&TokenKind::And) {
            self.pos += 1;
            items.push(self.parse_unary()?);
        }
        Ok(if items.len() == 1 {
            items.remove(0)
        } else {
            AccessExpression::All(items)
        })
    }

    fn parse_unary(&mut self) -> Result<AccessExpression, ExpressionError> {
        if self.peek() == Some(&TokenKind::Not) {
            self.pos += 1;
            return Ok(AccessExpression::Not(Box::new(self.parse_unary()?)));
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Result<AccessExpression, ExpressionError> {
        let offset = self.offset();
        match self.next() {
            Some(Token { kind: TokenKind::LParen, .. }) => {
                let inner = self.parse_or()?;
                self.expect(TokenKind::RParen, "')'")?;
                Ok(inner)
            }
            Some(Token { kind: TokenKind::Ident(name), .. }) => self.parse_call(&name, offset),
            Some(_) => Err(self.error(offset, "expected an expression")),
            None => Err(self.error(offset, "unexpected end of expression")),
        }
    }

    /// Optional `( 'arg', ... )` after a function name.
    fn parse_args(&mut self) -> Result<Option<Vec<String>>, ExpressionError> {
        if self.peek() != Some(&TokenKind::LParen) {
            return Ok(None);
        }
        self.pos += 1;

        let mut args = Vec::new();
        if self.peek() == Some(&TokenKind::RParen) {
            self.pos += 1;
            return Ok(Some(args));
        }
        loop {
            let offset = self.offset();
            match self.next() {
                Some(Token { kind: TokenKind::Str(value), .. }) => args.push(value),
                _ => return Err(self.error(offset, "expected a quoted string argument")),
            }
            let offset = self.offset();
            match self.next() {
                Some(Token { kind: TokenKind::Comma, .. }) => continue,
                Some(Token { kind: TokenKind::RParen, .. }) => break,
                _ => return Err(self.error(offset, "expected ',' or ')'")),
            }
        }
        Ok(Some(args))
    }

    fn parse_call(&mut self, name: &str, offset: usize) -> Result<AccessExpression, ExpressionError> {
        let args = self.parse_args()?;

        let no_args = |expr: AccessExpression| match &args {
            None => Ok(expr),
            Some(a) if a.is_empty() => Ok(expr),
            Some(_) => Err(self.error(offset, format!("{name} takes no arguments"))),
        };

        match name {
            "permitAll" => no_args(AccessExpression::PermitAll),
            "denyAll" => no_args(AccessExpression::DenyAll),
            "isAuthenticated" => no_args(AccessExpression::Authenticated),
            "isAnonymous" => no_args(AccessExpression::Anonymous),
            "hasRole" | "hasAuthority" => match args {
                Some(mut a) if a.len() == 1 => {
                    let value = a.remove(0);
                    Ok(if name == "hasRole" {
                        AccessExpression::Role(value)
                    } else {
                        AccessExpression::Authority(value)
                    })
                }
                _ => Err(self.error(offset, format!("{name} takes exactly one argument"))),
            },
            "hasAnyRole" | "hasAnyAuthority" => match args {
                Some(a) if !a.is_empty() => Ok(if name == "hasAnyRole" {
                    AccessExpression::AnyRole(a)
                } else {
                    AccessExpression::AnyAuthority(a)
                }),
                _ => Err(self.error(offset, format!("{name} takes at least one argument"))),
            },
            other => Err(self.error(offset, format!("unknown function '{other}'"))),
        }
    }
}

pub(super) fn parse(input: &str) -> Result<AccessExpression, ExpressionError> {
    let tokens = tokenize(input).map_err(|(offset, message)| ExpressionError {
        expression: input.to_string(),
        offset,
        message,
    })?;

    let mut parser = Parser {
        input,
        tokens,
        pos: 0,
    };

    if parser.tokens.is_empty() {
        return Err(parser.error(0, "empty expression"));
    }

    let expr = parser.parse_or()?;
    if parser.pos < parser.tokens.len() {
        let offset = parser.offset();
        return Err(parser.error(offset, "unexpected trailing input"));
    }
    Ok(expr)
}
