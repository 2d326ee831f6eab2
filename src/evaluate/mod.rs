//! Dynamic configuration evaluation
//!
//! A configuration node of the form `{"__evaluate__": "<expression>"}` is
//! replaced by the value of its expression (see [`expression`] for the
//! language). Evaluation walks the tree depth-first in document order.
//! Expressions may read other parts of the tree through `self`; a node that
//! is read before its turn is evaluated on demand, and reading a node whose
//! evaluation is still in progress is a cycle.
//!
//! Results are final: a result that itself looks like an expression node is
//! kept as data.

pub mod expression;

use chrono::{DateTime, SecondsFormat, Utc};
use indexmap::IndexMap;
use log::debug;
use serde_json::Value;
use std::path::PathBuf;

use crate::error::{Error, Result};
use crate::merge::{KeyPath, PathSegment};
use expression::{evaluate_expression, Scope};

/// Key marking an expression node.
pub const EVALUATE_KEY: &str = "__evaluate__";

/// Fixed inputs available to every expression
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationContext {
    /// Working directory; relative filesystem paths resolve against it
    pub current_path: PathBuf,
    pub now: DateTime<Utc>,
    pub debug: bool,
    /// Requested task name, empty if none was given
    pub task: String,
    /// Additional named values
    pub variables: IndexMap<String, Value>,
}

impl EvaluationContext {
    pub fn new(current_path: impl Into<PathBuf>, now: DateTime<Utc>) -> Self {
        Self {
            current_path: current_path.into(),
            now,
            debug: false,
            task: String::new(),
            variables: IndexMap::new(),
        }
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn with_task(mut self, task: impl Into<String>) -> Self {
        self.task = task.into();
        self
    }

    pub fn with_variable(mut self, name: impl Into<String>, value: Value) -> Self {
        self.variables.insert(name.into(), value);
        self
    }

    fn variable(&self, name: &str) -> Option<Value> {
        match name {
            "currentPath" => Some(Value::String(
                self.current_path.to_string_lossy().into_owned(),
            )),
            "now" => Some(Value::String(
                self.now.to_rfc3339_opts(SecondsFormat::Millis, true),
            )),
            "nowUTCTimestamp" => Some(Value::from(self.now.timestamp())),
            "debug" => Some(Value::Bool(self.debug)),
            "task" => Some(Value::String(self.task.clone())),
            _ => self.variables.get(name).cloned(),
        }
    }
}

/// Expression source of `value` if it is an expression node.
pub fn expression_source(value: &Value) -> Option<&str> {
    value.as_object()?.get(EVALUATE_KEY)?.as_str()
}

/// Evaluate every expression node of `tree` in place.
pub fn evaluate(tree: &mut Value, context: &EvaluationContext) -> Result<()> {
    let mut pending = Vec::new();
    collect_expression_paths(tree, &mut KeyPath::root(), &mut pending);
    if pending.is_empty() {
        return Ok(());
    }
    debug!("Evaluating {} dynamic configuration node(s)", pending.len());

    let mut evaluator = Evaluator {
        tree,
        context,
        pending,
        done: Vec::new(),
        in_progress: Vec::new(),
    };
    for path in evaluator.pending.clone() {
        evaluator.evaluate_at(&path)?;
    }
    Ok(())
}

/// Evaluate a copy of `tree`.
pub fn evaluate_dynamic_data_structure(tree: &Value, context: &EvaluationContext) -> Result<Value> {
    let mut evaluated = tree.clone();
    evaluate(&mut evaluated, context)?;
    Ok(evaluated)
}

fn collect_expression_paths(value: &Value, path: &mut KeyPath, found: &mut Vec<KeyPath>) {
    if expression_source(value).is_some() {
        found.push(path.clone());
        return;
    }
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                path.push(PathSegment::Key(key.clone()));
                collect_expression_paths(child, path, found);
                path.pop();
            }
        }
        Value::Array(items) => {
            for (index, child) in items.iter().enumerate() {
                path.push(PathSegment::Index(index));
                collect_expression_paths(child, path, found);
                path.pop();
            }
        }
        _ => {}
    }
}

struct Evaluator<'a> {
    tree: &'a mut Value,
    context: &'a EvaluationContext,
    pending: Vec<KeyPath>,
    done: Vec<KeyPath>,
    in_progress: Vec<KeyPath>,
}

impl Evaluator<'_> {
    fn evaluate_at(&mut self, path: &KeyPath) -> Result<()> {
        if self.done.contains(path) {
            return Ok(());
        }
        if self.in_progress.contains(path) {
            let cycle: Vec<String> = self
                .in_progress
                .iter()
                .skip_while(|entry| *entry != path)
                .chain(std::iter::once(path))
                .map(ToString::to_string)
                .collect();
            return Err(Error::CyclicConfiguration {
                cycle: cycle.join(" -> "),
            });
        }

        let Some(source) = path
            .get(self.tree)
            .and_then(expression_source)
            .map(str::to_string)
        else {
            return Ok(());
        };

        self.in_progress.push(path.clone());
        let result = evaluate_expression(&source, self);
        self.in_progress.pop();
        let value = result?;

        if let Some(node) = path.get_mut(self.tree) {
            *node = value;
        }
        self.done.push(path.clone());
        Ok(())
    }
}

impl Scope for Evaluator<'_> {
    fn variable(&self, name: &str) -> Option<Value> {
        self.context.variable(name)
    }

    /// Evaluate pending nodes on the way to `path` and below it, then read it.
    fn resolve_self(&mut self, path: &KeyPath) -> Result<Value> {
        let related: Vec<KeyPath> = self
            .pending
            .iter()
            .filter(|pending| path.starts_with(pending) || pending.starts_with(path))
            .cloned()
            .collect();
        for pending in related {
            self.evaluate_at(&pending)?;
        }
        Ok(path.get(self.tree).cloned().unwrap_or(Value::Null))
    }

    fn current_path(&self) -> PathBuf {
        self.context.current_path.clone()
    }
}
