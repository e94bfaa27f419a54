//! A small boolean expression language for triage rules.
//!
//! ```text
//! is_pull_request && me in reviewers && passed && !approved
//! state == "closed" or "wontfix" in labels
//! title matches "^\\[WIP\\]" && len(assignees) == 0
//! ```
//!
//! Grammar, loosest binding first:
//!
//! | Level | Operators |
//! |---|---|
//! | 1 | `\|\|` `or` |
//! | 2 | `&&` `and` |
//! | 3 | `==` `!=` `<` `<=` `>` `>=` `in` `not in` `contains` `startsWith` `endsWith` `matches` |
//! | 4 | unary `!` `not` `-` |
//!
//! Primaries are `true`/`false`, integers, single- or double-quoted strings,
//! list literals `[a, b]`, variables, `len(x)` and parenthesised
//! expressions. Variables are resolved through [`Lookup`].

use regex::Regex;
use thiserror::Error;

// ---------------------------------------------------------------------------
// Values
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Str(String),
    List(Vec<Value>),
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Str(_) => "string",
            Value::List(_) => "list",
        }
    }
}

/// Variable environment for evaluation.
pub trait Lookup {
    fn lookup(&self, name: &str) -> Option<Value>;
}

#[cfg(test)]
impl Lookup for std::collections::HashMap<String, Value> {
    fn lookup(&self, name: &str) -> Option<Value> {
        self.get(name).cloned()
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExprError {
    #[error("syntax error at offset {position}: {message}")]
    Parse { position: usize, message: String },

    #[error("unknown variable '{0}'")]
    UnknownVariable(String),

    #[error("type error: {0}")]
    Type(String),

    #[error("invalid regex '{pattern}': {message}")]
    Regex { pattern: String, message: String },

    #[error("expression evaluated to {0}, expected bool")]
    NotBoolean(&'static str),
}

fn parse_err(position: usize, message: impl Into<String>) -> ExprError {
    ExprError::Parse {
        position,
        message: message.into(),
    }
}

// ---------------------------------------------------------------------------
// Lexer
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
enum Tok {
    Ident(String),
    Int(i64),
    Str(String),
    True,
    False,
    LParen,
    RParen,
    LBracket,
    RBracket,
    Comma,
    Not,
    And,
    Or,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Minus,
    In,
    Contains,
    StartsWith,
    EndsWith,
    Matches,
    Eof,
}

fn keyword(word: &str) -> Option<Tok> {
    let tok = match word {
        "true" => Tok::True,
        "false" => Tok::False,
        "and" => Tok::And,
        "or" => Tok::Or,
        "not" => Tok::Not,
        "in" => Tok::In,
        "contains" => Tok::Contains,
        "startsWith" => Tok::StartsWith,
        "endsWith" => Tok::EndsWith,
        "matches" => Tok::Matches,
        _ => return None,
    };
    Some(tok)
}

fn tokenize(src: &str) -> Result<Vec<(usize, Tok)>, ExprError> {
    let chars: Vec<(usize, char)> = src.char_indices().collect();
    let mut out = Vec::new();
    let mut i = 0;

    let peek = |i: usize| chars.get(i).map(|&(_, c)| c);

    while i < chars.len() {
        let (pos, c) = chars[i];
        if c.is_whitespace() {
            i += 1;
            continue;
        }

        // Two-character operators first.
        let two = match (c, peek(i + 1)) {
            ('&', Some('&')) => Some(Tok::And),
            ('|', Some('|')) => Some(Tok::Or),
            ('=', Some('=')) => Some(Tok::Eq),
            ('!', Some('=')) => Some(Tok::Ne),
            ('<', Some('=')) => Some(Tok::Le),
            ('>', Some('=')) => Some(Tok::Ge),
            _ => None,
        };
        if let Some(tok) = two {
            out.push((pos, tok));
            i += 2;
            continue;
        }

        let single = match c {
            '(' => Some(Tok::LParen),
            ')' => Some(Tok::RParen),
            '[' => Some(Tok::LBracket),
            ']' => Some(Tok::RBracket),
            ',' => Some(Tok::Comma),
            '!' => Some(Tok::Not),
            '<' => Some(Tok::Lt),
            '>' => Some(Tok::Gt),
            '-' => Some(Tok::Minus),
            _ => None,
        };
        if let Some(tok) = single {
            out.push((pos, tok));
            i += 1;
            continue;
        }

        if c.is_ascii_digit() {
            let start = i;
            while peek(i).is_some_and(|c| c.is_ascii_digit()) {
                i += 1;
            }
            let text: String = chars[start..i].iter().map(|&(_, c)| c).collect();
            let n = text
                .parse::<i64>()
                .map_err(|_| parse_err(pos, format!("integer literal {text} out of range")))?;
            out.push((pos, Tok::Int(n)));
            continue;
        }

        if c.is_alphabetic() || c == '_' {
            let start = i;
            while peek(i).is_some_and(|c| c.is_alphanumeric() || c == '_') {
                i += 1;
            }
            let word: String = chars[start..i].iter().map(|&(_, c)| c).collect();
            out.push((pos, keyword(&word).unwrap_or(Tok::Ident(word))));
            continue;
        }

        if c == '"' || c == '\'' {
            let quote = c;
            let mut s = String::new();
            i += 1;
            loop {
                match peek(i) {
                    None => return Err(parse_err(pos, "unterminated string literal")),
                    Some(ch) if ch == quote => {
                        i += 1;
                        break;
                    }
                    Some('\\') => {
                        let escaped = match peek(i + 1) {
                            Some('n') => '\n',
                            Some('t') => '\t',
                            Some('r') => '\r',
                            Some(other) => other,
                            None => return Err(parse_err(pos, "unterminated string literal")),
                        };
                        s.push(escaped);
                        i += 2;
                    }
                    Some(ch) => {
                        s.push(ch);
                        i += 1;
                    }
                }
            }
            out.push((pos, Tok::Str(s)));
            continue;
        }

        return Err(parse_err(pos, format!("unexpected character '{c}'")));
    }

    out.push((src.len(), Tok::Eof));
    Ok(out)
}

// ---------------------------------------------------------------------------
// AST + parser
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
enum BinOp {
    Or,
    And,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    In,
    NotIn,
    Contains,
    StartsWith,
    EndsWith,
    Matches,
}

impl BinOp {
    fn precedence(self) -> u8 {
        match self {
            BinOp::Or => 1,
            BinOp::And => 2,
            _ => 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Expr {
    Lit(Value),
    Var(String),
    List(Vec<Expr>),
    Not(Box<Expr>),
    Neg(Box<Expr>),
    Len(Box<Expr>),
    Binary(BinOp, Box<Expr>, Box<Expr>),
}

/// Deepest expression tree a rule may build. Parsing, evaluation and drop
/// all recurse along the tree.
const MAX_DEPTH: usize = 128;

/// An expression and the depth of its tree.
type Parsed = (Expr, usize);

struct Parser {
    toks: Vec<(usize, Tok)>,
    pos: usize,
    level: usize,
}

impl Parser {
    fn peek(&self) -> &Tok {
        &self.toks[self.pos].1
    }

    fn peek_at(&self, offset: usize) -> &Tok {
        let idx = (self.pos + offset).min(self.toks.len() - 1);
        &self.toks[idx].1
    }

    fn offset(&self) -> usize {
        self.toks[self.pos].0
    }

    fn advance(&mut self) -> Tok {
        let tok = self.toks[self.pos].1.clone();
        if self.pos < self.toks.len() - 1 {
            self.pos += 1;
        }
        tok
    }

    fn expect(&mut self, want: Tok, what: &str) -> Result<(), ExprError> {
        if *self.peek() == want {
            self.advance();
            Ok(())
        } else {
            Err(parse_err(
                self.offset(),
                format!("expected {what}, found {:?}", self.peek()),
            ))
        }
    }

    /// The binary operator at the cursor and how many tokens it spans.
    fn infix(&self) -> Option<(BinOp, usize)> {
        let op = match self.peek() {
            Tok::Or => BinOp::Or,
            Tok::And => BinOp::And,
            Tok::Eq => BinOp::Eq,
            Tok::Ne => BinOp::Ne,
            Tok::Lt => BinOp::Lt,
            Tok::Le => BinOp::Le,
            Tok::Gt => BinOp::Gt,
            Tok::Ge => BinOp::Ge,
            Tok::In => BinOp::In,
            Tok::Contains => BinOp::Contains,
            Tok::StartsWith => BinOp::StartsWith,
            Tok::EndsWith => BinOp::EndsWith,
            Tok::Matches => BinOp::Matches,
            Tok::Not if *self.peek_at(1) == Tok::In => return Some((BinOp::NotIn, 2)),
            _ => return None,
        };
        Some((op, 1))
    }

    /// Count one level of parser recursion.
    fn enter(&mut self) -> Result<(), ExprError> {
        self.level += 1;
        if self.level > MAX_DEPTH {
            return Err(parse_err(self.offset(), "expression nested too deeply"));
        }
        Ok(())
    }

    fn leave(&mut self) {
        self.level -= 1;
    }

    fn bounded(&self, at: usize, depth: usize) -> Result<usize, ExprError> {
        if depth > MAX_DEPTH {
            return Err(parse_err(at, "expression nested too deeply"));
        }
        Ok(depth)
    }

    fn expr(&mut self, min_prec: u8) -> Result<Parsed, ExprError> {
        self.enter()?;
        let parsed = self.binary_chain(min_prec);
        self.leave();
        parsed
    }

    fn binary_chain(&mut self, min_prec: u8) -> Result<Parsed, ExprError> {
        let (mut lhs, mut depth) = self.unary()?;
        while let Some((op, width)) = self.infix() {
            let prec = op.precedence();
            if prec < min_prec {
                break;
            }
            let at = self.offset();
            for _ in 0..width {
                self.advance();
            }
            let (rhs, rhs_depth) = self.expr(prec + 1)?;
            depth = self.bounded(at, 1 + depth.max(rhs_depth))?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
        Ok((lhs, depth))
    }

    fn unary(&mut self) -> Result<Parsed, ExprError> {
        let at = self.offset();
        let wrap: fn(Box<Expr>) -> Expr = match self.peek() {
            Tok::Not => Expr::Not,
            Tok::Minus => Expr::Neg,
            _ => return self.primary(),
        };
        self.advance();
        self.enter()?;
        let inner = self.unary();
        self.leave();
        let (inner, depth) = inner?;
        Ok((wrap(Box::new(inner)), self.bounded(at, depth + 1)?))
    }

    fn primary(&mut self) -> Result<Parsed, ExprError> {
        let at = self.offset();
        match self.advance() {
            Tok::True => Ok((Expr::Lit(Value::Bool(true)), 1)),
            Tok::False => Ok((Expr::Lit(Value::Bool(false)), 1)),
            Tok::Int(n) => Ok((Expr::Lit(Value::Int(n)), 1)),
            Tok::Str(s) => Ok((Expr::Lit(Value::Str(s)), 1)),
            Tok::LParen => {
                let inner = self.expr(0)?;
                self.expect(Tok::RParen, "')'")?;
                Ok(inner)
            }
            Tok::LBracket => {
                let mut items = Vec::new();
                let mut depth = 0;
                if *self.peek() != Tok::RBracket {
                    loop {
                        let (item, item_depth) = self.expr(0)?;
                        items.push(item);
                        depth = depth.max(item_depth);
                        if *self.peek() == Tok::Comma {
                            self.advance();
                            continue;
                        }
                        break;
                    }
                }
                self.expect(Tok::RBracket, "']'")?;
                Ok((Expr::List(items), self.bounded(at, depth + 1)?))
            }
            Tok::Ident(name) if *self.peek() == Tok::LParen => {
                if name != "len" {
                    return Err(parse_err(at, format!("unknown function '{name}'")));
                }
                self.advance();
                let (arg, depth) = self.expr(0)?;
                self.expect(Tok::RParen, "')' after len argument")?;
                Ok((Expr::Len(Box::new(arg)), self.bounded(at, depth + 1)?))
            }
            Tok::Ident(name) => Ok((Expr::Var(name), 1)),
            Tok::Eof => Err(parse_err(at, "unexpected end of expression")),
            other => Err(parse_err(at, format!("unexpected token {other:?}"))),
        }
    }
}

// ---------------------------------------------------------------------------
// Evaluation
// ---------------------------------------------------------------------------

fn as_bool(v: Value, ctx: &str) -> Result<bool, ExprError> {
    match v {
        Value::Bool(b) => Ok(b),
        other => Err(ExprError::Type(format!(
            "{ctx} expects bool, got {}",
            other.type_name()
        ))),
    }
}

fn as_strs(l: Value, r: Value, op: &str) -> Result<(String, String), ExprError> {
    match (l, r) {
        (Value::Str(a), Value::Str(b)) => Ok((a, b)),
        (a, b) => Err(ExprError::Type(format!(
            "'{op}' expects string operands, got {} and {}",
            a.type_name(),
            b.type_name()
        ))),
    }
}

impl Expr {
    fn eval(&self, env: &dyn Lookup) -> Result<Value, ExprError> {
        match self {
            Expr::Lit(v) => Ok(v.clone()),
            Expr::Var(name) => env
                .lookup(name)
                .ok_or_else(|| ExprError::UnknownVariable(name.clone())),
            Expr::List(items) => Ok(Value::List(
                items
                    .iter()
                    .map(|e| e.eval(env))
                    .collect::<Result<_, _>>()?,
            )),
            Expr::Not(inner) => Ok(Value::Bool(!as_bool(inner.eval(env)?, "'!'")?)),
            Expr::Neg(inner) => match inner.eval(env)? {
                Value::Int(n) => n
                    .checked_neg()
                    .map(Value::Int)
                    .ok_or_else(|| ExprError::Type("integer overflow".into())),
                other => Err(ExprError::Type(format!(
                    "'-' expects int, got {}",
                    other.type_name()
                ))),
            },
            Expr::Len(inner) => match inner.eval(env)? {
                Value::Str(s) => Ok(Value::Int(s.chars().count() as i64)),
                Value::List(l) => Ok(Value::Int(l.len() as i64)),
                other => Err(ExprError::Type(format!(
                    "len() expects string or list, got {}",
                    other.type_name()
                ))),
            },
            Expr::Binary(BinOp::Or, l, r) => {
                if as_bool(l.eval(env)?, "'||'")? {
                    return Ok(Value::Bool(true));
                }
                Ok(Value::Bool(as_bool(r.eval(env)?, "'||'")?))
            }
            Expr::Binary(BinOp::And, l, r) => {
                if !as_bool(l.eval(env)?, "'&&'")? {
                    return Ok(Value::Bool(false));
                }
                Ok(Value::Bool(as_bool(r.eval(env)?, "'&&'")?))
            }
            Expr::Binary(op, l, r) => binary(*op, l.eval(env)?, r.eval(env)?),
        }
    }
}

fn binary(op: BinOp, l: Value, r: Value) -> Result<Value, ExprError> {
    let b = match op {
        BinOp::Eq => l == r,
        BinOp::Ne => l != r,
        BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge => {
            let ord = match (&l, &r) {
                (Value::Int(a), Value::Int(b)) => a.cmp(b),
                (Value::Str(a), Value::Str(b)) => a.cmp(b),
                _ => {
                    return Err(ExprError::Type(format!(
                        "cannot compare {} with {}",
                        l.type_name(),
                        r.type_name()
                    )))
                }
            };
            match op {
                BinOp::Lt => ord.is_lt(),
                BinOp::Le => ord.is_le(),
                BinOp::Gt => ord.is_gt(),
                _ => ord.is_ge(),
            }
        }
        BinOp::In | BinOp::NotIn => {
            let found = match &r {
                Value::List(items) => items.contains(&l),
                other => {
                    return Err(ExprError::Type(format!(
                        "'in' expects a list on the right, got {}",
                        other.type_name()
                    )))
                }
            };
            if op == BinOp::In {
                found
            } else {
                !found
            }
        }
        BinOp::Contains => {
            let (a, b) = as_strs(l, r, "contains")?;
            a.contains(&b)
        }
        BinOp::StartsWith => {
            let (a, b) = as_strs(l, r, "startsWith")?;
            a.starts_with(&b)
        }
        BinOp::EndsWith => {
            let (a, b) = as_strs(l, r, "endsWith")?;
            a.ends_with(&b)
        }
        BinOp::Matches => {
            let (text, pattern) = as_strs(l, r, "matches")?;
            let re = Regex::new(&pattern).map_err(|e| ExprError::Regex {
                pattern: pattern.clone(),
                message: e.to_string(),
            })?;
            re.is_match(&text)
        }
        BinOp::Or | BinOp::And => unreachable!("logical operators short-circuit in Expr::eval"),
    };
    Ok(Value::Bool(b))
}

// ---------------------------------------------------------------------------
// Program
// ---------------------------------------------------------------------------

/// A compiled expression, reusable across many evaluations.
#[derive(Debug, Clone)]
pub struct Program {
    source: String,
    root: Expr,
}

impl Program {
    pub fn compile(source: &str) -> Result<Self, ExprError> {
        let toks = tokenize(source)?;
        let mut parser = Parser {
            toks,
            pos: 0,
            level: 0,
        };
        let (root, _) = parser.expr(0)?;
        if *parser.peek() != Tok::Eof {
            return Err(parse_err(
                parser.offset(),
                format!("unexpected trailing {:?}", parser.peek()),
            ));
        }
        Ok(Self {
            source: source.to_string(),
            root,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn eval(&self, env: &dyn Lookup) -> Result<Value, ExprError> {
        self.root.eval(env)
    }
}
