use crate::expr::{ExprError, Lookup, Program, Value};
use crate::profile::Profile;

pub const WILDCARD: &str = "*";

// ---------------------------------------------------------------------------
// Category
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Open,
    Read,
    List,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::Open, Category::Read, Category::List];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Open => "open",
            Category::Read => "read",
            Category::List => "list",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Joining + one-shot evaluation
// ---------------------------------------------------------------------------

/// OR the conditions together. `None` when there are no conditions at all.
///
/// A `*` entry makes the whole disjunction `true`, so the other entries are
/// dropped instead of evaluated; a broken sibling cannot mask the wildcard.
pub fn join(conditions: &[String]) -> Option<String> {
    if conditions.is_empty() {
        return None;
    }
    if conditions.iter().any(|c| c.trim() == WILDCARD) {
        return Some("true".to_string());
    }
    let parts: Vec<String> = conditions.iter().map(|c| format!("({c})")).collect();
    Some(parts.join(" || "))
}

/// Evaluate `conditions` against `env`. An empty list is `Ok(false)`
/// without compiling anything.
pub fn evaluate(conditions: &[String], env: &dyn Lookup) -> Result<bool, ExprError> {
    match join(conditions) {
        None => Ok(false),
        Some(source) => expect_bool(Program::compile(&source)?.eval(env)?),
    }
}

fn expect_bool(v: Value) -> Result<bool, ExprError> {
    match v {
        Value::Bool(b) => Ok(b),
        other => Err(ExprError::NotBoolean(other.type_name())),
    }
}

// ---------------------------------------------------------------------------
// Condition
// ---------------------------------------------------------------------------

/// The conditions of one category, compiled once per run.
#[derive(Debug, Clone)]
pub struct Condition {
    category: Category,
    source: Option<String>,
    program: Option<Result<Program, ExprError>>,
}

impl Condition {
    pub fn compile(category: Category, conditions: &[String]) -> Self {
        let source = join(conditions);
        let program = source.as_deref().map(Program::compile);
        if let Some(Err(e)) = &program {
            tracing::error!(
                category = %category,
                cond = source.as_deref().unwrap_or_default(),
                error = %e,
                "failed to compile condition"
            );
        }
        Self {
            category,
            source,
            program,
        }
    }

    /// Whether the condition holds for `env`. Compile errors, evaluation
    /// errors and non-boolean results are logged and count as no match.
    pub fn matches(&self, env: &dyn Lookup) -> bool {
        let program = match &self.program {
            None => return false,
            Some(Err(_)) => return false,
            Some(Ok(p)) => p,
        };
        match program.eval(env).and_then(expect_bool) {
            Ok(b) => b,
            Err(e) => {
                tracing::error!(
                    category = %self.category,
                    cond = program.source(),
                    error = %e,
                    "failed to evaluate condition"
                );
                false
            }
        }
    }

    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }
}

// ---------------------------------------------------------------------------
// Rules
// ---------------------------------------------------------------------------

/// Compiled open/read/list conditions of a profile.
#[derive(Debug, Clone)]
pub struct Rules {
    pub open: Condition,
    pub read: Condition,
    pub list: Condition,
}

impl Rules {
    pub fn compile(profile: &Profile) -> Self {
        Self {
            open: Condition::compile(Category::Open, &profile.open.conditions),
            read: Condition::compile(Category::Read, &profile.read.conditions),
            list: Condition::compile(Category::List, &profile.list.conditions),
        }
    }

    pub fn get(&self, category: Category) -> &Condition {
        match category {
            Category::Open => &self.open,
            Category::Read => &self.read,
            Category::List => &self.list,
        }
    }
}
