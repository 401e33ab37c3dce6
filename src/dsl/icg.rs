//! Intermediate code generator: folds the derivation into the program output.
//!
//! Semantic actions fire in the order the parser reaches them. Each one works
//! on a value stack and a symbol table; a failed action records a logical
//! error and pushes nothing back, so later actions see the post-pop stack.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use super::error::ErrorReport;

/// A semantic action named in the grammar as `Action<Name>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Action {
    PrintFinalResult,
    SaveId,
    Assign,
    PushNumber,
    PushString,
    Add,
    Multiply,
    LookupAndPushValue,
    LookupSavedId,
}

impl Action {
    pub fn name(self) -> &'static str {
        match self {
            Action::PrintFinalResult => "PrintFinalResult",
            Action::SaveId => "SaveID",
            Action::Assign => "Assign",
            Action::PushNumber => "PushNumber",
            Action::PushString => "PushString",
            Action::Add => "Add",
            Action::Multiply => "Multiply",
            Action::LookupAndPushValue => "LookupAndPushValue",
            Action::LookupSavedId => "LookupSavedID",
        }
    }
}

impl FromStr for Action {
    type Err = ();

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name {
            "PrintFinalResult" => Ok(Action::PrintFinalResult),
            "SaveID" => Ok(Action::SaveId),
            "Assign" => Ok(Action::Assign),
            "PushNumber" => Ok(Action::PushNumber),
            "PushString" => Ok(Action::PushString),
            "Add" => Ok(Action::Add),
            "Multiply" => Ok(Action::Multiply),
            "LookupAndPushValue" => Ok(Action::LookupAndPushValue),
            "LookupSavedID" => Ok(Action::LookupSavedId),
            _ => Err(()),
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Action{}", self.name())
    }
}

/// A value on the semantic stack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Number(i64),
    Text(String),
    Identifier(String),
}

/// Variables assigned so far in one compilation.
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    values: HashMap<String, Value>,
}

impl SymbolTable {
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Store a value, replacing any earlier assignment.
    fn insert(&mut self, name: String, value: Value) {
        self.values.insert(name, value);
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[derive(Debug, Default)]
pub struct Icg {
    stack: Vec<Value>,
    symbols: SymbolTable,
    output: Option<String>,
}

impl Icg {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run one action. `lexeme` is the current lookahead text, empty at end of input.
    pub fn perform(&mut self, action: Action, lexeme: &str, line: usize, errors: &mut ErrorReport) {
        match action {
            Action::PrintFinalResult => match self.stack.pop() {
                Some(Value::Text(text)) => self.output = Some(text),
                _ => errors.logical("Final statement should be a string.", line),
            },
            Action::SaveId => self.stack.push(Value::Identifier(lexeme.to_string())),
            Action::PushNumber => match lexeme.parse::<i64>() {
                Ok(n) => self.stack.push(Value::Number(n)),
                Err(_) => errors.logical(format!("Invalid number {lexeme}"), line),
            },
            Action::PushString => self.stack.push(Value::Text(unquote(lexeme).to_string())),
            Action::Add => {
                let rhs = self.stack.pop();
                let lhs = self.stack.pop();
                match (lhs, rhs) {
                    (Some(Value::Number(a)), Some(Value::Number(b))) => match a.checked_add(b) {
                        Some(sum) => self.stack.push(Value::Number(sum)),
                        None => errors.logical("Number overflow", line),
                    },
                    (Some(Value::Text(a)), Some(Value::Text(b))) => {
                        if a.len() + b.len() > MAX_TEXT_LEN {
                            errors.logical("Text too long", line);
                        } else {
                            self.stack.push(Value::Text(a + &b));
                        }
                    }
                    _ => errors.logical("Adding unexpected values", line),
                }
            }
            Action::Multiply => {
                // The first pop is the right-hand operand.
                let rhs = self.stack.pop();
                let lhs = self.stack.pop();
                match (lhs, rhs) {
                    (Some(Value::Number(a)), Some(Value::Number(b))) => match a.checked_mul(b) {
                        Some(product) => self.stack.push(Value::Number(product)),
                        None => errors.logical("Number overflow", line),
                    },
                    (Some(Value::Text(text)), Some(Value::Number(count)))
                    | (Some(Value::Number(count)), Some(Value::Text(text))) => {
                        match repeat(&text, count) {
                            Some(repeated) => self.stack.push(Value::Text(repeated)),
                            None => errors.logical("Repetition too large", line),
                        }
                    }
                    _ => errors.logical("Multiplying unexpected values", line),
                }
            }
            Action::LookupAndPushValue => self.lookup(lexeme, line, errors),
            Action::LookupSavedId => match self.stack.pop() {
                Some(Value::Identifier(name)) => self.lookup(&name, line, errors),
                _ => errors.logical("Expected a variable name", line),
            },
            Action::Assign => {
                let value = self.stack.pop();
                let target = self.stack.pop();
                let value = match value {
                    Some(value @ (Value::Number(_) | Value::Text(_))) => value,
                    _ => {
                        errors.logical("Assigning invalid value.", line);
                        return;
                    }
                };
                match target {
                    Some(Value::Identifier(name)) => self.symbols.insert(name, value),
                    _ => errors.logical("Assigning to invalid variable.", line),
                }
            }
        }
    }

    fn lookup(&mut self, name: &str, line: usize, errors: &mut ErrorReport) {
        match self.symbols.get(name) {
            Some(value) => self.stack.push(value.clone()),
            None => errors.logical(format!("Undefined variable {name}."), line),
        }
    }

    /// The value printed by the final statement, if it was a string.
    pub fn output(&self) -> Option<&str> {
        self.output.as_deref()
    }

    pub fn into_output(self) -> Option<String> {
        self.output
    }

    pub fn stack(&self) -> &[Value] {
        &self.stack
    }

    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }
}

fn unquote(lexeme: &str) -> &str {
    lexeme
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(lexeme)
}

/// Upper bound, in bytes, on any text value a program can build.
pub const MAX_TEXT_LEN: usize = 1 << 20;

/// Repeat `text` `count` times, treating negative counts as zero.
/// `None` when the result would exceed [`MAX_TEXT_LEN`].
fn repeat(text: &str, count: i64) -> Option<String> {
    let count = usize::try_from(count.max(0)).ok()?;
    let len = text.len().checked_mul(count)?;
    if len > MAX_TEXT_LEN {
        return None;
    }
    Some(text.repeat(count))
}
