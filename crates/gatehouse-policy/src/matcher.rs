//! Matcher expression parser and evaluator.
//!
//! Supported syntax:
//! - Comparisons: `==`, `!=`
//! - Boolean operators: `&&`, `||`, `!`
//! - Field access: `r.sub`, `p.obj`
//! - Function calls: role membership `g(r.sub, p.sub)` and `keyMatch(r.obj, p.obj)`
//! - Literals: `"strings"`, `true`, `false`
//! - Parentheses for grouping
//!
//! Field names are resolved against the model definitions while parsing, so a
//! compiled [`Expr`] never refers to a field that does not exist.

use std::collections::HashMap;

use crate::error::PolicyError;
use crate::role::RoleGraph;

// ─── AST ────────────────────────────────────────────────────────────────

/// A compiled matcher expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// A literal value.
    Literal(Literal),
    /// A request or rule field, resolved to its position.
    Field {
        /// Which tuple the field belongs to.
        scope: Scope,
        /// Position in the tuple.
        index: usize,
    },
    /// A binary operation.
    BinOp {
        /// The operator.
        op: BinOp,
        /// Left operand.
        left: Box<Expr>,
        /// Right operand.
        right: Box<Expr>,
    },
    /// Boolean negation.
    Not(Box<Expr>),
    /// A built-in function call.
    Call {
        /// The function.
        function: Function,
        /// Its arguments.
        args: Vec<Expr>,
    },
}

/// Tuple a field reference reads from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// The `r` tuple being decided.
    Request,
    /// The `p` rule being matched.
    Policy,
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Eq,
    Ne,
    And,
    Or,
}

/// Literal values.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Str(String),
    Bool(bool),
}

/// Built-in functions callable from a matcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Function {
    /// Transitive role membership through the named role definition.
    HasRole(String),
    /// Path match where a `*` in the pattern matches any suffix.
    KeyMatch,
}

/// Names a matcher may reference.
#[derive(Debug, Clone, Copy)]
pub struct Definitions<'a> {
    /// Request field names (`r = sub, obj, act`).
    pub request: &'a [String],
    /// Rule field names (`p = sub, obj, act`).
    pub policy: &'a [String],
    /// Role definition keys (`g`, `g2`, ...).
    pub roles: &'a [String],
}

// ─── Parser ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Ident(String),
    Str(String),
    True,
    False,
    Dot,
    Comma,
    LParen,
    RParen,
    Eq,  // ==
    Ne,  // !=
    And, // &&
    Or,  // ||
    Not, // !
}

fn tokenize(input: &str) -> Result<Vec<Token>, PolicyError> {
    let mut tokens = Vec::new();
    let chars: Vec<char> = input.chars().collect();
    let mut i = 0;

    while i < chars.len() {
        let next = chars.get(i + 1).copied();
        match chars[i] {
            ' ' | '\t' | '\n' | '\r' => {
                i += 1;
            }
            '.' => {
                tokens.push(Token::Dot);
                i += 1;
            }
            ',' => {
                tokens.push(Token::Comma);
                i += 1;
            }
            '(' => {
                tokens.push(Token::LParen);
                i += 1;
            }
            ')' => {
                tokens.push(Token::RParen);
                i += 1;
            }
            '=' if next == Some('=') => {
                tokens.push(Token::Eq);
                i += 2;
            }
            '!' if next == Some('=') => {
                tokens.push(Token::Ne);
                i += 2;
            }
            '!' => {
                tokens.push(Token::Not);
                i += 1;
            }
            '&' if next == Some('&') => {
                tokens.push(Token::And);
                i += 2;
            }
            '|' if next == Some('|') => {
                tokens.push(Token::Or);
                i += 2;
            }
            '"' => {
                i += 1;
                let mut literal = String::new();
                while i < chars.len() && chars[i] != '"' {
                    if chars[i] == '\\' && i + 1 < chars.len() {
                        i += 1;
                    }
                    literal.push(chars[i]);
                    i += 1;
                }
                if i >= chars.len() {
                    return Err(PolicyError::InvalidMatcher(
                        "unterminated string literal".into(),
                    ));
                }
                tokens.push(Token::Str(literal));
                i += 1;
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == '_') {
                    i += 1;
                }
                let word: String = chars[start..i].iter().collect();
                match word.as_str() {
                    "true" => tokens.push(Token::True),
                    "false" => tokens.push(Token::False),
                    _ => tokens.push(Token::Ident(word)),
                }
            }
            c => {
                return Err(PolicyError::InvalidMatcher(format!(
                    "unexpected character `{c}`"
                )));
            }
        }
    }
    Ok(tokens)
}

struct Parser<'a> {
    tokens: Vec<Token>,
    pos: usize,
    defs: Definitions<'a>,
}

impl<'a> Parser<'a> {
    fn new(tokens: Vec<Token>, defs: Definitions<'a>) -> Self {
        Self {
            tokens,
            pos: 0,
            defs,
        }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<Token> {
        let tok = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        tok
    }

    fn expect(&mut self, expected: Token, what: &str) -> Result<(), PolicyError> {
        if self.advance() != Some(expected) {
            return Err(PolicyError::InvalidMatcher(format!("expected {what}")));
        }
        Ok(())
    }

    /// or_expr = and_expr ("||" and_expr)*
    fn parse_or(&mut self) -> Result<Expr, PolicyError> {
        let mut left = self.parse_and()?;
        while self.peek() == Some(&Token::Or) {
            self.advance();
            let right = self.parse_and()?;
            left = Expr::BinOp {
                op: BinOp::Or,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    /// and_expr = comparison ("&&" comparison)*
    fn parse_and(&mut self) -> Result<Expr, PolicyError> {
        let mut left = self.parse_comparison()?;
        while self.peek() == Some(&Token::And) {
            self.advance();
            let right = self.parse_comparison()?;
            left = Expr::BinOp {
                op: BinOp::And,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    /// comparison = unary (("==" | "!=") unary)?
    fn parse_comparison(&mut self) -> Result<Expr, PolicyError> {
        let left = self.parse_unary()?;
        let op = match self.peek() {
            Some(Token::Eq) => BinOp::Eq,
            Some(Token::Ne) => BinOp::Ne,
            _ => return Ok(left),
        };
        self.advance();
        let right = self.parse_unary()?;
        Ok(Expr::BinOp {
            op,
            left: Box::new(left),
            right: Box::new(right),
        })
    }

    /// unary = "!" unary | primary
    fn parse_unary(&mut self) -> Result<Expr, PolicyError> {
        if self.peek() == Some(&Token::Not) {
            self.advance();
            let expr = self.parse_unary()?;
            return Ok(Expr::Not(Box::new(expr)));
        }
        self.parse_primary()
    }

    /// primary = literal | field | call | "(" expr ")"
    fn parse_primary(&mut self) -> Result<Expr, PolicyError> {
        match self.advance() {
            Some(Token::Str(s)) => Ok(Expr::Literal(Literal::Str(s))),
            Some(Token::True) => Ok(Expr::Literal(Literal::Bool(true))),
            Some(Token::False) => Ok(Expr::Literal(Literal::Bool(false))),
            Some(Token::LParen) => {
                let expr = self.parse_or()?;
                self.expect(Token::RParen, "closing parenthesis `)`")?;
                Ok(expr)
            }
            Some(Token::Ident(name)) => match self.peek() {
                Some(Token::Dot) => {
                    self.advance();
                    self.parse_field(&name)
                }
                Some(Token::LParen) => {
                    self.advance();
                    self.parse_call(&name)
                }
                _ => Err(PolicyError::InvalidMatcher(format!(
                    "bare identifier `{name}`"
                ))),
            },
            other => Err(PolicyError::InvalidMatcher(format!(
                "unexpected token: {other:?}"
            ))),
        }
    }

    fn parse_field(&mut self, tuple: &str) -> Result<Expr, PolicyError> {
        let field = match self.advance() {
            Some(Token::Ident(field)) => field,
            _ => {
                return Err(PolicyError::InvalidMatcher(format!(
                    "expected field name after `{tuple}.`"
                )));
            }
        };

        let (scope, names) = match tuple {
            "r" => (Scope::Request, self.defs.request),
            "p" => (Scope::Policy, self.defs.policy),
            other => {
                return Err(PolicyError::InvalidMatcher(format!(
                    "unknown tuple `{other}`, expected `r` or `p`"
                )));
            }
        };

        let index = names.iter().position(|n| *n == field).ok_or_else(|| {
            PolicyError::InvalidMatcher(format!("`{tuple}.{field}` is not defined by the model"))
        })?;

        Ok(Expr::Field { scope, index })
    }

    fn parse_call(&mut self, name: &str) -> Result<Expr, PolicyError> {
        let function = if name == "keyMatch" {
            Function::KeyMatch
        } else if self.defs.roles.iter().any(|r| r == name) {
            Function::HasRole(name.to_string())
        } else {
            return Err(PolicyError::InvalidMatcher(format!(
                "unknown function `{name}`"
            )));
        };

        let mut args = Vec::new();
        if self.peek() != Some(&Token::RParen) {
            loop {
                args.push(self.parse_or()?);
                if self.peek() == Some(&Token::Comma) {
                    self.advance();
                } else {
                    break;
                }
            }
        }
        self.expect(Token::RParen, "closing parenthesis `)` after arguments")?;

        if args.len() != 2 {
            return Err(PolicyError::InvalidMatcher(format!(
                "`{name}` takes 2 arguments, got {}",
                args.len()
            )));
        }

        Ok(Expr::Call { function, args })
    }
}

/// Parse a matcher expression, resolving names against `defs`.
pub fn parse_matcher(input: &str, defs: Definitions<'_>) -> Result<Expr, PolicyError> {
    let tokens = tokenize(input)?;
    if tokens.is_empty() {
        return Err(PolicyError::InvalidMatcher("empty expression".into()));
    }
    let mut parser = Parser::new(tokens, defs);
    let expr = parser.parse_or()?;
    if parser.pos < parser.tokens.len() {
        return Err(PolicyError::InvalidMatcher(format!(
            "unexpected trailing token: {:?}",
            parser.tokens[parser.pos]
        )));
    }
    Ok(expr)
}

// ─── Evaluator ──────────────────────────────────────────────────────────

/// Inputs for evaluating a matcher against one rule.
#[derive(Debug, Clone, Copy)]
pub struct EvalContext<'a> {
    /// The request tuple.
    pub request: &'a [&'a str],
    /// The rule being matched. Missing trailing values read as `""`.
    pub rule: &'a [String],
    /// Role graphs keyed by role definition.
    pub roles: &'a HashMap<String, RoleGraph>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Value<'a> {
    Str(&'a str),
    Bool(bool),
}

/// Evaluate a compiled matcher. Returns `true` if the rule matches.
pub fn evaluate<'a>(expr: &'a Expr, ctx: &EvalContext<'a>) -> Result<bool, PolicyError> {
    match eval_value(expr, ctx)? {
        Value::Bool(b) => Ok(b),
        Value::Str(s) => Err(PolicyError::Evaluation(format!(
            "matcher must evaluate to a boolean, got string \"{s}\""
        ))),
    }
}

fn eval_bool<'a>(expr: &'a Expr, ctx: &EvalContext<'a>, op: &str) -> Result<bool, PolicyError> {
    match eval_value(expr, ctx)? {
        Value::Bool(b) => Ok(b),
        Value::Str(_) => Err(PolicyError::Evaluation(format!(
            "`{op}` requires boolean operands"
        ))),
    }
}

fn eval_str<'a>(expr: &'a Expr, ctx: &EvalContext<'a>, op: &str) -> Result<&'a str, PolicyError> {
    match eval_value(expr, ctx)? {
        Value::Str(s) => Ok(s),
        Value::Bool(_) => Err(PolicyError::Evaluation(format!(
            "`{op}` requires string arguments"
        ))),
    }
}

fn eval_value<'a>(expr: &'a Expr, ctx: &EvalContext<'a>) -> Result<Value<'a>, PolicyError> {
    match expr {
        Expr::Literal(Literal::Str(s)) => Ok(Value::Str(s.as_str())),
        Expr::Literal(Literal::Bool(b)) => Ok(Value::Bool(*b)),
        Expr::Field {
            scope: Scope::Request,
            index,
        } => Ok(Value::Str(ctx.request.get(*index).copied().unwrap_or(""))),
        Expr::Field {
            scope: Scope::Policy,
            index,
        } => Ok(Value::Str(
            ctx.rule.get(*index).map(String::as_str).unwrap_or(""),
        )),
        Expr::Not(inner) => Ok(Value::Bool(!eval_bool(inner, ctx, "!")?)),
        Expr::BinOp { op, left, right } => match op {
            // && and || short-circuit so role lookups only run when needed.
            BinOp::And => Ok(Value::Bool(
                eval_bool(left, ctx, "&&")? && eval_bool(right, ctx, "&&")?,
            )),
            BinOp::Or => Ok(Value::Bool(
                eval_bool(left, ctx, "||")? || eval_bool(right, ctx, "||")?,
            )),
            BinOp::Eq | BinOp::Ne => {
                let l = eval_value(left, ctx)?;
                let r = eval_value(right, ctx)?;
                if std::mem::discriminant(&l) != std::mem::discriminant(&r) {
                    return Err(PolicyError::Evaluation(
                        "cannot compare a string with a boolean".into(),
                    ));
                }
                let equal = l == r;
                Ok(Value::Bool(if *op == BinOp::Eq { equal } else { !equal }))
            }
        },
        Expr::Call { function, args } => {
            let (a, b) = match args.as_slice() {
                [a, b] => (a, b),
                _ => {
                    return Err(PolicyError::Evaluation(
                        "function called with wrong arity".into(),
                    ));
                }
            };
            match function {
                Function::HasRole(key) => {
                    let member = eval_str(a, ctx, key)?;
                    let role = eval_str(b, ctx, key)?;
                    let linked = match ctx.roles.get(key) {
                        Some(graph) => graph.has_link(member, role),
                        None => member == role,
                    };
                    Ok(Value::Bool(linked))
                }
                Function::KeyMatch => {
                    let key = eval_str(a, ctx, "keyMatch")?;
                    let pattern = eval_str(b, ctx, "keyMatch")?;
                    Ok(Value::Bool(key_match(key, pattern)))
                }
            }
        }
    }
}

/// Match `key` against `pattern`, where everything from the first `*` in
/// `pattern` onward matches any suffix.
pub fn key_match(key: &str, pattern: &str) -> bool {
    match pattern.find('*') {
        Some(star) => key.starts_with(&pattern[..star]),
        None => key == pattern,
    }
}
