//! # DSL Contract
//!
//! These types pin the interface to the external DSL parser and source
//! loader. They are pure data — no behavior, no vector references, no
//! execution logic. The parser converts `.sys2` text into a `Statement`
//! stream; the session executes streams and never sees raw source.

use serde::{Deserialize, Serialize};

use crate::model::{GoalSpec, Polarity};
use crate::Result;

// ============================================================================
// Location
// ============================================================================

/// Source position attached to statements and boundary errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub line: u32,
    pub col: u32,
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.line, self.col)
    }
}

// ============================================================================
// Expressions
// ============================================================================

/// Right-hand side of a `Bind` statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    /// `$name` — reference to an existing scope binding.
    Ref(String),
    /// Bare identifier — resolved through the vocabulary.
    Ident(String),
    /// Composite call to a known operator, e.g. `___Bundle([...])`.
    Call { op: String, args: Vec<Expr> },
    /// Argument list literal.
    List(Vec<Expr>),
}

impl Expr {
    pub fn ident(name: &str) -> Expr {
        Expr::Ident(name.to_owned())
    }

    pub fn scope_ref(name: &str) -> Expr {
        Expr::Ref(name.to_owned())
    }

    pub fn call(op: &str, args: Vec<Expr>) -> Expr {
        Expr::Call { op: op.to_owned(), args }
    }
}

// ============================================================================
// Statement patterns (parser-facing, string tokens)
// ============================================================================

/// A triple pattern as the parser emits it: `?`-prefixed tokens are
/// variables. Interning happens at execution time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternSpec {
    pub subject: String,
    pub relation: String,
    pub object: String,
    pub negated: bool,
}

impl PatternSpec {
    pub fn new(subject: &str, relation: &str, object: &str) -> Self {
        Self {
            subject: subject.to_owned(),
            relation: relation.to_owned(),
            object: object.to_owned(),
            negated: false,
        }
    }

    pub fn negated(mut self) -> Self {
        self.negated = true;
        self
    }
}

// ============================================================================
// Statements
// ============================================================================

/// One parsed DSL statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Statement {
    Assert {
        subject: String,
        relation: String,
        object: String,
        polarity: Polarity,
        location: Option<Location>,
    },
    Retract {
        subject: String,
        relation: String,
        object: String,
        location: Option<Location>,
    },
    DefineRule {
        name: String,
        head: PatternSpec,
        body: Vec<PatternSpec>,
        priority: i32,
        location: Option<Location>,
    },
    DefineDefault {
        ty: String,
        property: String,
        value: String,
        exceptions: Vec<String>,
        location: Option<Location>,
    },
    Bind {
        name: String,
        expr: Expr,
        /// `@name:persistName` — survives transaction rollback.
        persist: Option<String>,
        location: Option<Location>,
    },
    CallMacro {
        name: String,
        args: Vec<String>,
        location: Option<Location>,
    },
    Load {
        path: String,
        location: Option<Location>,
    },
    QueryGoal {
        goal: GoalSpec,
        max_results: Option<usize>,
        location: Option<Location>,
    },
}

impl Statement {
    pub fn assert(subject: &str, relation: &str, object: &str) -> Statement {
        Statement::Assert {
            subject: subject.to_owned(),
            relation: relation.to_owned(),
            object: object.to_owned(),
            polarity: Polarity::Pos,
            location: None,
        }
    }

    pub fn deny(subject: &str, relation: &str, object: &str) -> Statement {
        Statement::Assert {
            subject: subject.to_owned(),
            relation: relation.to_owned(),
            object: object.to_owned(),
            polarity: Polarity::Neg,
            location: None,
        }
    }

    pub fn retract(subject: &str, relation: &str, object: &str) -> Statement {
        Statement::Retract {
            subject: subject.to_owned(),
            relation: relation.to_owned(),
            object: object.to_owned(),
            location: None,
        }
    }

    pub fn rule(name: &str, head: PatternSpec, body: Vec<PatternSpec>) -> Statement {
        Statement::DefineRule {
            name: name.to_owned(),
            head,
            body,
            priority: 0,
            location: None,
        }
    }

    pub fn rule_with_priority(
        name: &str,
        head: PatternSpec,
        body: Vec<PatternSpec>,
        priority: i32,
    ) -> Statement {
        Statement::DefineRule {
            name: name.to_owned(),
            head,
            body,
            priority,
            location: None,
        }
    }

    pub fn default_rule(ty: &str, property: &str, value: &str, exceptions: &[&str]) -> Statement {
        Statement::DefineDefault {
            ty: ty.to_owned(),
            property: property.to_owned(),
            value: value.to_owned(),
            exceptions: exceptions.iter().map(|s| (*s).to_owned()).collect(),
            location: None,
        }
    }

    pub fn bind(name: &str, expr: Expr) -> Statement {
        Statement::Bind { name: name.to_owned(), expr, persist: None, location: None }
    }

    pub fn bind_persist(name: &str, persist_name: &str, expr: Expr) -> Statement {
        Statement::Bind {
            name: name.to_owned(),
            expr,
            persist: Some(persist_name.to_owned()),
            location: None,
        }
    }

    pub fn call_macro(name: &str, args: &[&str]) -> Statement {
        Statement::CallMacro {
            name: name.to_owned(),
            args: args.iter().map(|s| (*s).to_owned()).collect(),
            location: None,
        }
    }

    pub fn load(path: &str) -> Statement {
        Statement::Load { path: path.to_owned(), location: None }
    }

    pub fn location(&self) -> Option<Location> {
        match self {
            Statement::Assert { location, .. }
            | Statement::Retract { location, .. }
            | Statement::DefineRule { location, .. }
            | Statement::DefineDefault { location, .. }
            | Statement::Bind { location, .. }
            | Statement::CallMacro { location, .. }
            | Statement::Load { location, .. }
            | Statement::QueryGoal { location, .. } => *location,
        }
    }
}

// ============================================================================
// External collaborator traits
// ============================================================================

/// Static-validation strictness for `check_dsl`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CheckMode {
    /// Unknown operators and identifiers are errors.
    Strict,
    /// Unknown identifiers are tolerated and surfaced as warnings.
    Lenient,
}

/// The external DSL parser/validator.
///
/// The engine assumes the parser has validated arity and operator
/// existence in strict mode before emitting statements.
pub trait DslParser: Send + Sync {
    fn parse(&self, text: &str) -> Result<Vec<Statement>>;

    fn check(&self, text: &str, mode: CheckMode) -> Vec<crate::Error>;
}

/// External resolver for `Load` directives (file I/O stays outside).
pub trait SourceResolver: Send + Sync {
    fn resolve(&self, path: &str) -> Result<Vec<Statement>>;
}

// ============================================================================
// Theory packs
// ============================================================================

/// A parsed theory pack: named `.sys2` sub-programs, optionally ordered by
/// an index file of Load directives.
#[derive(Debug, Clone, Default)]
pub struct TheoryPack {
    pub entries: Vec<(String, Vec<Statement>)>,
    /// Load order from the pack's index file; `None` loads entries as given.
    pub order: Option<Vec<String>>,
}

impl TheoryPack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(mut self, name: &str, statements: Vec<Statement>) -> Self {
        self.entries.push((name.to_owned(), statements));
        self
    }

    pub fn with_order(mut self, order: &[&str]) -> Self {
        self.order = Some(order.iter().map(|s| (*s).to_owned()).collect());
        self
    }

    pub fn entry(&self, name: &str) -> Option<&[Statement]> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, stmts)| stmts.as_slice())
    }
}
