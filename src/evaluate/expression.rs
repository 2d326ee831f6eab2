//! Sandboxed expression language
//!
//! Expressions are tokenized, parsed into an [`Expr`] tree by a precedence
//! climbing parser and interpreted against a [`Scope`]. Only the functions in
//! the built-in registry can touch the filesystem; there is no way to run
//! arbitrary code.
//!
//! Precedence, lowest first: `?:`, `||`, `&&`, `== !=`, `< <= > >=`, `+ -`,
//! `* / %`, unary `! -`, then member access, indexing and calls.

use log::trace;
use path_clean::PathClean;
use regex::Regex;
use serde_json::{Number, Value};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::merge::{KeyPath, PathSegment};
use crate::resolver::path::{absolutize, is_directory, is_file, resolve_path};

/// Root identifier addressing the configuration tree under evaluation.
pub const SELF_IDENTIFIER: &str = "self";

/// Namespaces of the built-in function registry.
const NAMESPACES: &[&str] = &["path", "fs", "string", "array"];

/// Built-in functions callable from expressions.
pub const FUNCTIONS: &[&str] = &[
    "path.resolve",
    "path.join",
    "path.dirname",
    "path.basename",
    "fs.isFile",
    "fs.isDirectory",
    "fs.read",
    "require",
    "string.replace",
    "array.includes",
];

/// Variables and tree access available to an expression
pub trait Scope {
    /// Value of a context variable.
    fn variable(&self, name: &str) -> Option<Value>;

    /// Value of the configuration node at `path`, fully evaluated.
    fn resolve_self(&mut self, path: &KeyPath) -> Result<Value>;

    /// Directory relative filesystem paths are resolved against.
    fn current_path(&self) -> PathBuf;
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    Str(String),
    Identifier(String),
    Punct(&'static str),
}

const PUNCTUATION: &[&str] = &[
    "===", "!==", "==", "!=", "<=", ">=", "&&", "||", "(", ")", "[", "]", ",", ".", "?", ":",
    "!", "+", "-", "*", "/", "%", "<", ">",
];

fn tokenize(source: &str) -> std::result::Result<Vec<Token>, String> {
    let chars: Vec<char> = source.chars().collect();
    let mut tokens = Vec::new();
    let mut position = 0;

    while position < chars.len() {
        let ch = chars[position];
        if ch.is_whitespace() {
            position += 1;
        } else if ch.is_ascii_digit() {
            let start = position;
            while position < chars.len() && (chars[position].is_ascii_digit() || chars[position] == '.')
            {
                position += 1;
            }
            let literal: String = chars[start..position].iter().collect();
            let number = literal
                .parse::<f64>()
                .map_err(|_| format!("invalid number literal '{}'", literal))?;
            tokens.push(Token::Number(number));
        } else if ch == '\'' || ch == '"' {
            let quote = ch;
            position += 1;
            let mut literal = String::new();
            loop {
                let Some(&current) = chars.get(position) else {
                    return Err("unterminated string literal".to_string());
                };
                position += 1;
                match current {
                    '\\' => {
                        let escaped = chars
                            .get(position)
                            .ok_or_else(|| "unterminated escape sequence".to_string())?;
                        position += 1;
                        literal.push(match escaped {
                            'n' => '\n',
                            't' => '\t',
                            'r' => '\r',
                            other => *other,
                        });
                    }
                    current if current == quote => break,
                    current => literal.push(current),
                }
            }
            tokens.push(Token::Str(literal));
        } else if ch.is_alphabetic() || ch == '_' || ch == '$' {
            let start = position;
            while position < chars.len()
                && (chars[position].is_alphanumeric() || chars[position] == '_' || chars[position] == '$')
            {
                position += 1;
            }
            tokens.push(Token::Identifier(chars[start..position].iter().collect()));
        } else {
            let rest: String = chars[position..].iter().take(3).collect();
            let punct = PUNCTUATION
                .iter()
                .find(|punct| rest.starts_with(**punct))
                .ok_or_else(|| format!("unexpected character '{}'", ch))?;
            position += punct.chars().count();
            tokens.push(Token::Punct(*punct));
        }
    }
    Ok(tokens)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
    Negate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Remainder,
    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    And,
    Or,
}

/// Parsed expression
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Value),
    Identifier(String),
    Array(Vec<Expr>),
    Member(Box<Expr>, String),
    Index(Box<Expr>, Box<Expr>),
    Call(Box<Expr>, Vec<Expr>),
    Unary(UnaryOp, Box<Expr>),
    Binary(BinaryOp, Box<Expr>, Box<Expr>),
    Conditional(Box<Expr>, Box<Expr>, Box<Expr>),
}

/// Deepest nesting of sub-expressions the parser accepts.
pub const MAX_NESTING_DEPTH: usize = 128;

struct Parser {
    tokens: Vec<Token>,
    position: usize,
    depth: usize,
}

impl Parser {
    fn nested<T>(
        &mut self,
        parse: impl FnOnce(&mut Self) -> std::result::Result<T, String>,
    ) -> std::result::Result<T, String> {
        if self.depth >= MAX_NESTING_DEPTH {
            return Err(format!(
                "expression nests deeper than {} levels",
                MAX_NESTING_DEPTH
            ));
        }
        self.depth += 1;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.position)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.position).cloned();
        self.position += 1;
        token
    }

    fn eat(&mut self, punct: &str) -> bool {
        if matches!(self.peek(), Some(Token::Punct(current)) if *current == punct) {
            self.position += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, punct: &str) -> std::result::Result<(), String> {
        if self.eat(punct) {
            Ok(())
        } else {
            Err(format!("expected '{}', found {}", punct, describe(self.peek())))
        }
    }

    fn conditional(&mut self) -> std::result::Result<Expr, String> {
        self.nested(Self::conditional_inner)
    }

    fn conditional_inner(&mut self) -> std::result::Result<Expr, String> {
        let condition = self.binary(0)?;
        if !self.eat("?") {
            return Ok(condition);
        }
        let consequent = self.conditional()?;
        self.expect(":")?;
        let alternative = self.conditional()?;
        Ok(Expr::Conditional(
            Box::new(condition),
            Box::new(consequent),
            Box::new(alternative),
        ))
    }

    fn binary(&mut self, minimum_precedence: u8) -> std::result::Result<Expr, String> {
        let mut left = self.unary()?;
        while let Some(Token::Punct(punct)) = self.peek() {
            let Some((operator, precedence)) = binary_operator(punct) else {
                break;
            };
            if precedence < minimum_precedence {
                break;
            }
            self.position += 1;
            let right = self.binary(precedence + 1)?;
            left = Expr::Binary(operator, Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn unary(&mut self) -> std::result::Result<Expr, String> {
        if self.eat("!") {
            let operand = self.nested(Self::unary)?;
            return Ok(Expr::Unary(UnaryOp::Not, Box::new(operand)));
        }
        if self.eat("-") {
            let operand = self.nested(Self::unary)?;
            return Ok(Expr::Unary(UnaryOp::Negate, Box::new(operand)));
        }
        self.postfix()
    }

    fn postfix(&mut self) -> std::result::Result<Expr, String> {
        let mut expression = self.primary()?;
        loop {
            if self.eat(".") {
                match self.next() {
                    Some(Token::Identifier(name)) => {
                        expression = Expr::Member(Box::new(expression), name)
                    }
                    other => {
                        return Err(format!(
                            "expected property name, found {}",
                            describe(other.as_ref())
                        ))
                    }
                }
            } else if self.eat("[") {
                let index = self.conditional()?;
                self.expect("]")?;
                expression = Expr::Index(Box::new(expression), Box::new(index));
            } else if self.eat("(") {
                let arguments = self.list(")")?;
                expression = Expr::Call(Box::new(expression), arguments);
            } else {
                return Ok(expression);
            }
        }
    }

    fn list(&mut self, closing: &str) -> std::result::Result<Vec<Expr>, String> {
        let mut items = Vec::new();
        if self.eat(closing) {
            return Ok(items);
        }
        loop {
            items.push(self.conditional()?);
            if self.eat(closing) {
                return Ok(items);
            }
            self.expect(",")?;
        }
    }

    fn primary(&mut self) -> std::result::Result<Expr, String> {
        match self.next() {
            Some(Token::Number(number)) => Ok(Expr::Literal(number_value(number))),
            Some(Token::Str(literal)) => Ok(Expr::Literal(Value::String(literal))),
            Some(Token::Identifier(name)) => Ok(match name.as_str() {
                "true" => Expr::Literal(Value::Bool(true)),
                "false" => Expr::Literal(Value::Bool(false)),
                "null" | "undefined" => Expr::Literal(Value::Null),
                _ => Expr::Identifier(name),
            }),
            Some(Token::Punct("(")) => {
                let expression = self.conditional()?;
                self.expect(")")?;
                Ok(expression)
            }
            Some(Token::Punct("[")) => Ok(Expr::Array(self.list("]")?)),
            other => Err(format!("unexpected {}", describe(other.as_ref()))),
        }
    }
}

fn binary_operator(punct: &str) -> Option<(BinaryOp, u8)> {
    Some(match punct {
        "||" => (BinaryOp::Or, 1),
        "&&" => (BinaryOp::And, 2),
        "==" | "===" => (BinaryOp::Equal, 3),
        "!=" | "!==" => (BinaryOp::NotEqual, 3),
        "<" => (BinaryOp::Less, 4),
        "<=" => (BinaryOp::LessEqual, 4),
        ">" => (BinaryOp::Greater, 4),
        ">=" => (BinaryOp::GreaterEqual, 4),
        "+" => (BinaryOp::Add, 5),
        "-" => (BinaryOp::Subtract, 5),
        "*" => (BinaryOp::Multiply, 6),
        "/" => (BinaryOp::Divide, 6),
        "%" => (BinaryOp::Remainder, 6),
        _ => return None,
    })
}

fn describe(token: Option<&Token>) -> String {
    match token {
        None => "end of input".to_string(),
        Some(Token::Number(number)) => format!("number {}", number),
        Some(Token::Str(literal)) => format!("string '{}'", literal),
        Some(Token::Identifier(name)) => format!("identifier '{}'", name),
        Some(Token::Punct(punct)) => format!("'{}'", punct),
    }
}

/// Parse an expression.
pub fn parse(source: &str) -> Result<Expr> {
    let error = |message: String| Error::Expression {
        expression: source.to_string(),
        message,
    };
    let tokens = tokenize(source).map_err(error)?;
    let mut parser = Parser {
        tokens,
        position: 0,
        depth: 0,
    };
    let expression = parser.conditional().map_err(error)?;
    if parser.position < parser.tokens.len() {
        return Err(error(format!(
            "unexpected {} after expression",
            describe(parser.peek())
        )));
    }
    Ok(expression)
}

/// Parse and evaluate `source` against `scope`.
pub fn evaluate_expression(source: &str, scope: &mut dyn Scope) -> Result<Value> {
    let expression = parse(source)?;
    let mut interpreter = Interpreter { source, scope };
    let value = interpreter.evaluate(&expression)?;
    interpreter.materialize(value)
}

/// Intermediate result; tree references stay lazy until their value is read.
enum Operand {
    Value(Value),
    SelfReference(KeyPath),
    Namespace(String),
    Function(String),
}

struct Interpreter<'a> {
    source: &'a str,
    scope: &'a mut dyn Scope,
}

impl Interpreter<'_> {
    fn error(&self, message: impl Into<String>) -> Error {
        Error::Expression {
            expression: self.source.to_string(),
            message: message.into(),
        }
    }

    fn materialize(&mut self, operand: Operand) -> Result<Value> {
        match operand {
            Operand::Value(value) => Ok(value),
            Operand::SelfReference(path) => {
                trace!("Expression reads self.{}", path);
                self.scope.resolve_self(&path)
            }
            Operand::Namespace(name) | Operand::Function(name) => {
                Err(self.error(format!("'{}' is not a value", name)))
            }
        }
    }

    fn value(&mut self, expression: &Expr) -> Result<Value> {
        let operand = self.evaluate(expression)?;
        self.materialize(operand)
    }

    fn evaluate(&mut self, expression: &Expr) -> Result<Operand> {
        Ok(match expression {
            Expr::Literal(value) => Operand::Value(value.clone()),
            Expr::Identifier(name) => self.identifier(name)?,
            Expr::Array(items) => Operand::Value(Value::Array(
                items
                    .iter()
                    .map(|item| self.value(item))
                    .collect::<Result<_>>()?,
            )),
            Expr::Member(object, name) => {
                let object = self.evaluate(object)?;
                self.member(object, PathSegment::Key(name.clone()))?
            }
            Expr::Index(object, index) => {
                let object = self.evaluate(object)?;
                let segment = match self.value(index)? {
                    Value::String(key) => PathSegment::Key(key),
                    Value::Number(number) => match number.as_u64() {
                        Some(index) => PathSegment::Index(index as usize),
                        None => return Err(self.error(format!("invalid index {}", number))),
                    },
                    other => return Err(self.error(format!("invalid index {}", other))),
                };
                self.member(object, segment)?
            }
            Expr::Call(callee, arguments) => {
                let name = match self.evaluate(callee)? {
                    Operand::Function(name) => name,
                    _ => return Err(self.error("only built-in functions can be called")),
                };
                let arguments = arguments
                    .iter()
                    .map(|argument| self.value(argument))
                    .collect::<Result<Vec<_>>>()?;
                Operand::Value(self.call(&name, arguments)?)
            }
            Expr::Unary(operator, operand) => {
                let value = self.value(operand)?;
                Operand::Value(match operator {
                    UnaryOp::Not => Value::Bool(!is_truthy(&value)),
                    UnaryOp::Negate => {
                        let number = self.number(&value)?;
                        self.number_result(-number)?
                    }
                })
            }
            Expr::Binary(BinaryOp::And, left, right) => {
                let left = self.value(left)?;
                if is_truthy(&left) {
                    Operand::Value(self.value(right)?)
                } else {
                    Operand::Value(left)
                }
            }
            Expr::Binary(BinaryOp::Or, left, right) => {
                let left = self.value(left)?;
                if is_truthy(&left) {
                    Operand::Value(left)
                } else {
                    Operand::Value(self.value(right)?)
                }
            }
            Expr::Binary(operator, left, right) => {
                let left = self.value(left)?;
                let right = self.value(right)?;
                Operand::Value(self.binary(*operator, &left, &right)?)
            }
            Expr::Conditional(condition, consequent, alternative) => {
                if is_truthy(&self.value(condition)?) {
                    self.evaluate(consequent)?
                } else {
                    self.evaluate(alternative)?
                }
            }
        })
    }

    fn identifier(&self, name: &str) -> Result<Operand> {
        if name == SELF_IDENTIFIER {
            return Ok(Operand::SelfReference(KeyPath::root()));
        }
        if NAMESPACES.contains(&name) {
            return Ok(Operand::Namespace(name.to_string()));
        }
        if FUNCTIONS.contains(&name) {
            return Ok(Operand::Function(name.to_string()));
        }
        self.scope
            .variable(name)
            .map(Operand::Value)
            .ok_or_else(|| self.error(format!("unknown identifier '{}'", name)))
    }

    fn member(&mut self, object: Operand, segment: PathSegment) -> Result<Operand> {
        match object {
            Operand::SelfReference(path) => {
                if matches!(&segment, PathSegment::Key(key) if key == "length") {
                    let value = self.scope.resolve_self(&path)?;
                    if value.is_array() || value.is_string() {
                        return Ok(Operand::Value(self.property(&value, &segment)?));
                    }
                }
                Ok(Operand::SelfReference(path.child(segment)))
            }
            Operand::Namespace(namespace) => match segment {
                PathSegment::Key(name) => {
                    let qualified = format!("{}.{}", namespace, name);
                    if FUNCTIONS.contains(&qualified.as_str()) {
                        Ok(Operand::Function(qualified))
                    } else {
                        Err(self.error(format!("unknown function '{}'", qualified)))
                    }
                }
                PathSegment::Index(_) => Err(self.error(format!("cannot index '{}'", namespace))),
            },
            Operand::Function(name) => Err(self.error(format!("'{}' has no properties", name))),
            Operand::Value(value) => Ok(Operand::Value(self.property(&value, &segment)?)),
        }
    }

    fn property(&self, value: &Value, segment: &PathSegment) -> Result<Value> {
        match (value, segment) {
            (Value::Array(items), PathSegment::Key(key)) if key == "length" => {
                Ok(Value::from(items.len()))
            }
            (Value::String(text), PathSegment::Key(key)) if key == "length" => {
                Ok(Value::from(text.chars().count()))
            }
            (Value::Object(map), PathSegment::Key(key)) => {
                Ok(map.get(key).cloned().unwrap_or(Value::Null))
            }
            (Value::Array(items), PathSegment::Index(index)) => {
                Ok(items.get(*index).cloned().unwrap_or(Value::Null))
            }
            (Value::String(text), PathSegment::Index(index)) => Ok(text
                .chars()
                .nth(*index)
                .map(|ch| Value::String(ch.to_string()))
                .unwrap_or(Value::Null)),
            (Value::Null, _) => Err(self.error(format!(
                "cannot read property '{}' of null",
                segment_name(segment)
            ))),
            _ => Ok(Value::Null),
        }
    }

    fn number(&self, value: &Value) -> Result<f64> {
        value
            .as_f64()
            .ok_or_else(|| self.error(format!("expected a number, found {}", value)))
    }

    fn number_result(&self, number: f64) -> Result<Value> {
        if number.is_finite() {
            Ok(number_value(number))
        } else {
            Err(self.error("arithmetic result is not a finite number"))
        }
    }

    fn binary(&self, operator: BinaryOp, left: &Value, right: &Value) -> Result<Value> {
        Ok(match operator {
            BinaryOp::Add => match (left, right) {
                (Value::String(_), _) | (_, Value::String(_)) => {
                    Value::String(format!("{}{}", display(left), display(right)))
                }
                _ => self.number_result(self.number(left)? + self.number(right)?)?,
            },
            BinaryOp::Subtract => self.number_result(self.number(left)? - self.number(right)?)?,
            BinaryOp::Multiply => self.number_result(self.number(left)? * self.number(right)?)?,
            BinaryOp::Divide => self.number_result(self.number(left)? / self.number(right)?)?,
            BinaryOp::Remainder => self.number_result(self.number(left)? % self.number(right)?)?,
            BinaryOp::Equal => Value::Bool(loosely_equal(left, right)),
            BinaryOp::NotEqual => Value::Bool(!loosely_equal(left, right)),
            BinaryOp::Less | BinaryOp::LessEqual | BinaryOp::Greater | BinaryOp::GreaterEqual => {
                let ordering = match (left, right) {
                    (Value::String(first), Value::String(second)) => first.partial_cmp(second),
                    _ => self.number(left)?.partial_cmp(&self.number(right)?),
                };
                let Some(ordering) = ordering else {
                    return Ok(Value::Bool(false));
                };
                Value::Bool(match operator {
                    BinaryOp::Less => ordering.is_lt(),
                    BinaryOp::LessEqual => ordering.is_le(),
                    BinaryOp::Greater => ordering.is_gt(),
                    _ => ordering.is_ge(),
                })
            }
            BinaryOp::And | BinaryOp::Or => {
                return Err(self.error("logical operators are evaluated lazily"))
            }
        })
    }

    fn call(&self, name: &str, arguments: Vec<Value>) -> Result<Value> {
        let base = self.scope.current_path();
        let strings = |count: usize| -> Result<Vec<String>> {
            if arguments.len() < count {
                return Err(self.error(format!(
                    "{} expects at least {} argument(s), got {}",
                    name,
                    count,
                    arguments.len()
                )));
            }
            arguments
                .iter()
                .map(|argument| match argument {
                    Value::String(text) => Ok(text.clone()),
                    other => Err(self.error(format!("{} expects strings, got {}", name, other))),
                })
                .collect()
        };

        match name {
            "path.resolve" => {
                let resolved = strings(0)?
                    .iter()
                    .fold(absolutize(&base), |resolved, part| resolve_path(&resolved, part));
                Ok(path_value(&resolved))
            }
            "path.join" => {
                let parts = strings(1)?;
                let joined = PathBuf::from(parts.join("/")).clean();
                Ok(path_value(&joined))
            }
            "path.dirname" => {
                let parts = strings(1)?;
                let parent = Path::new(&parts[0])
                    .parent()
                    .map(|parent| {
                        if parent.as_os_str().is_empty() {
                            ".".to_string()
                        } else {
                            parent.to_string_lossy().into_owned()
                        }
                    })
                    .unwrap_or_else(|| parts[0].clone());
                Ok(Value::String(parent))
            }
            "path.basename" => {
                let parts = strings(1)?;
                let base_name = Path::new(&parts[0])
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned())
                    .unwrap_or_default();
                Ok(Value::String(match parts.get(1) {
                    Some(suffix) if base_name != *suffix => base_name
                        .strip_suffix(suffix.as_str())
                        .unwrap_or(&base_name)
                        .to_string(),
                    _ => base_name,
                }))
            }
            "fs.isFile" => {
                let parts = strings(1)?;
                Ok(Value::Bool(is_file(&resolve_path(&base, &parts[0]))))
            }
            "fs.isDirectory" => {
                let parts = strings(1)?;
                Ok(Value::Bool(is_directory(&resolve_path(&base, &parts[0]))))
            }
            "fs.read" => {
                let parts = strings(1)?;
                let file_path = resolve_path(&base, &parts[0]);
                fs::read_to_string(&file_path).map(Value::String).map_err(|error| {
                    self.error(format!("cannot read {}: {}", file_path.display(), error))
                })
            }
            "require" => {
                let parts = strings(1)?;
                let file_path = resolve_path(&base, &parts[0]);
                let content = fs::read_to_string(&file_path).map_err(|error| {
                    self.error(format!("cannot load {}: {}", file_path.display(), error))
                })?;
                serde_json::from_str(&content).map_err(|error| {
                    self.error(format!("cannot parse {}: {}", file_path.display(), error))
                })
            }
            "string.replace" => {
                let parts = strings(3)?;
                let replaced = match parts[1]
                    .strip_prefix('/')
                    .and_then(|pattern| pattern.strip_suffix('/'))
                {
                    Some(pattern) => Regex::new(pattern)?
                        .replace(&parts[0], parts[2].as_str())
                        .into_owned(),
                    None => parts[0].replacen(parts[1].as_str(), &parts[2], 1),
                };
                Ok(Value::String(replaced))
            }
            "array.includes" => match arguments.as_slice() {
                [Value::Array(items), needle] => Ok(Value::Bool(
                    items.iter().any(|item| loosely_equal(item, needle)),
                )),
                [Value::String(text), Value::String(needle)] => {
                    Ok(Value::Bool(text.contains(needle.as_str())))
                }
                _ => Err(self.error("array.includes expects an array and a value")),
            },
            _ => Err(self.error(format!("unknown function '{}'", name))),
        }
    }
}

fn segment_name(segment: &PathSegment) -> String {
    match segment {
        PathSegment::Key(key) => key.clone(),
        PathSegment::Index(index) => index.to_string(),
    }
}

fn path_value(path: &Path) -> Value {
    Value::String(path.to_string_lossy().into_owned())
}

/// Integral results stay integers.
fn number_value(number: f64) -> Value {
    if number.fract() == 0.0 && number.abs() < i64::MAX as f64 {
        Value::from(number as i64)
    } else {
        Number::from_f64(number).map(Value::Number).unwrap_or(Value::Null)
    }
}

/// Truthiness: `null`, `false`, `0`, `""` are false, everything else true.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().map(|n| n != 0.0).unwrap_or(false),
        Value::String(text) => !text.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn loosely_equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Number(first), Value::Number(second)) => first.as_f64() == second.as_f64(),
        _ => left == right,
    }
}

fn display(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Null => "null".to_string(),
        other => other.to_string(),
    }
}
