//! # sys2 — Hybrid Symbolic / Holographic Reasoning Engine
//!
//! A reasoning kernel that keeps two representations of everything it learns:
//! a classical fact graph (typed triples, horn rules, typed defaults) and a
//! vector-symbolic superposition of the same content (HDC bind/bundle
//! algebra). Queries are answered by chained symbolic inference, by
//! approximate vector decoding, or by both — arbitrated by a priority policy.
//!
//! ## Design Principles
//!
//! 1. **Trait-first**: `Codec` is the contract between the reasoning kernel
//!    and any vector-symbolic strategy
//! 2. **Clean DTOs**: `Fact`, `Rule`, `Goal`, `ProofStep` cross all boundaries
//! 3. **Parser owns nothing**: the DSL parser is an external collaborator;
//!    the session consumes a parsed `Statement` stream
//! 4. **Transactional mutation**: every top-level `learn`/`query`/`prove`
//!    call journals its writes and rolls back atomically on contradiction
//!
//! ## Quick Start
//!
//! ```rust
//! use sys2::{Session, SessionOptions, Statement, Goal};
//!
//! # fn example() -> sys2::Result<()> {
//! let mut session = Session::new(SessionOptions::default())?;
//!
//! // Learn a tiny theory (statement stream normally comes from the parser)
//! let program = vec![
//!     Statement::assert("dog", "isA", "mammal"),
//!     Statement::assert("mammal", "isA", "animal"),
//! ];
//! let outcome = session.learn(&program)?;
//! assert_eq!(outcome.facts_added, 2);
//!
//! // Prove a ground goal
//! let report = session.prove(&Goal::triple("dog", "isA", "mammal"), None)?;
//! assert!(report.valid);
//! # Ok(())
//! # }
//! ```
//!
//! ## Codec Strategies
//!
//! | Strategy | Module | Description |
//! |----------|--------|-------------|
//! | DenseBinary | `hdc::dense` | XOR bind, majority bundle, Hamming similarity |
//! | SparsePolynomial | `hdc::sparse` | Exponent channels over a fixed modulus |
//! | MetricAffine | `hdc::metric` | Byte-channel translation, circular distance |
//! | MetricAffineElastic | `hdc::metric` | Metric-affine with a declared capacity curve |
//! | Exact | `hdc::exact` | Lossless symbolic multisets (test oracle) |

// ============================================================================
// Modules
// ============================================================================

pub mod model;
pub mod hdc;
pub mod graph;
pub mod scope;
pub mod reason;
pub mod dsl;
pub mod session;

// ============================================================================
// Re-exports: Model (the DTOs)
// ============================================================================

pub use model::{
    Atom, Interner, Fact, FactKey, Polarity, Source,
    Rule, DefaultRule, TriplePattern, Term, Goal, GoalSpec,
    Method, ProofStep, Binding, Solution, QueryReport, ProveReport,
    LearnOutcome, ReasoningStats,
};

// ============================================================================
// Re-exports: HDC layer
// ============================================================================

pub use hdc::{
    build_codec, Codec, Strategy, Vector, Thresholds, CodecProperties,
    VectorOps, Vocabulary, SimilarityHit,
};

// ============================================================================
// Re-exports: DSL contract
// ============================================================================

pub use dsl::{
    Statement, Expr, PatternSpec, Location, CheckMode, DslParser, SourceResolver, TheoryPack,
};

// ============================================================================
// Re-exports: Session façade
// ============================================================================

pub use session::{
    Session, SessionOptions, CallOptions, DescribeTarget,
    ReasoningPriority, ReasoningProfile, ExactUnbindMode,
};

// ============================================================================
// Error Types
// ============================================================================

/// Closed error kind set — every boundary error is one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Kind {
    Parse,
    UnknownOperator,
    UnknownConcept,
    StrategyMismatch,
    GeometryMismatch,
    Contradiction,
    DepthExceeded,
    Timeout,
    Io,
    Internal,
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    #[error("parse error{}: {message}", fmt_loc(location))]
    Parse { message: String, location: Option<dsl::Location> },

    #[error("unknown operator '{name}'{}", fmt_loc(location))]
    UnknownOperator { name: String, location: Option<dsl::Location> },

    #[error("unknown concept '{name}'{}", fmt_loc(location))]
    UnknownConcept { name: String, location: Option<dsl::Location> },

    #[error("strategy mismatch: expected {expected}, got {got}")]
    StrategyMismatch { expected: hdc::Strategy, got: hdc::Strategy },

    #[error("geometry mismatch: expected {expected}, got {got}")]
    GeometryMismatch { expected: usize, got: usize },

    #[error("contradiction on ({subject}, {relation}, {object})")]
    Contradiction { subject: String, relation: String, object: String },

    #[error("recursion depth exceeded (limit {limit})")]
    DepthExceeded { limit: usize },

    #[error("deadline exceeded after {elapsed_ms} ms")]
    Timeout { elapsed_ms: u64 },

    #[error("io error: {0}")]
    Io(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// The closed kind of this error.
    pub fn kind(&self) -> Kind {
        match self {
            Error::Parse { .. } => Kind::Parse,
            Error::UnknownOperator { .. } => Kind::UnknownOperator,
            Error::UnknownConcept { .. } => Kind::UnknownConcept,
            Error::StrategyMismatch { .. } => Kind::StrategyMismatch,
            Error::GeometryMismatch { .. } => Kind::GeometryMismatch,
            Error::Contradiction { .. } => Kind::Contradiction,
            Error::DepthExceeded { .. } => Kind::DepthExceeded,
            Error::Timeout { .. } => Kind::Timeout,
            Error::Io(_) => Kind::Io,
            Error::Internal(_) => Kind::Internal,
        }
    }

    /// Source location, when the error originated from a DSL statement.
    pub fn location(&self) -> Option<dsl::Location> {
        match self {
            Error::Parse { location, .. }
            | Error::UnknownOperator { location, .. }
            | Error::UnknownConcept { location, .. } => *location,
            _ => None,
        }
    }

    /// Offending identifier, when one is known.
    pub fn identifier(&self) -> Option<&str> {
        match self {
            Error::UnknownOperator { name, .. } | Error::UnknownConcept { name, .. } => {
                Some(name)
            }
            _ => None,
        }
    }

    /// Process exit code for CLI embeddings.
    ///
    /// Timeout → 2, Contradiction → 3, Parse → 4, everything else → 1.
    /// 0 (success) and 130 (interrupted) belong to the embedding driver.
    pub fn exit_code(&self) -> i32 {
        match self.kind() {
            Kind::Timeout => 2,
            Kind::Contradiction => 3,
            Kind::Parse => 4,
            _ => 1,
        }
    }

    /// True for errors the caller may record and continue past
    /// (everything else aborts the enclosing call and rolls back).
    pub fn is_recoverable(&self, reject_contradictions: bool) -> bool {
        match self.kind() {
            Kind::UnknownConcept => true,
            Kind::Contradiction => !reject_contradictions,
            _ => false,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e.to_string())
    }
}

fn fmt_loc(loc: &Option<dsl::Location>) -> String {
    match loc {
        Some(l) => format!(" at {l}"),
        None => String::new(),
    }
}

pub type Result<T> = std::result::Result<T, Error>;
