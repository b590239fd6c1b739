//! AST types for Newton descriptions.
//!
//! Quantity-expression nodes carry the [`Physics`] inferred for them while
//! parsing, so downstream consumers never re-run dimensional analysis.

use crate::dimension::DimensionId;
use crate::physics::{Physics, PhysicsId};
use crate::scope::ScopeId;

// ──────────────────────────────────────────────
// Provenance
// ──────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Provenance {
    pub file: String,
    pub line: u32,
    pub column: u32,
    pub length: u32,
}

// ──────────────────────────────────────────────
// Operators
// ──────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOp {
    Add,
    Subtract,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MulOp {
    Multiply,
    Divide,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VectorOp {
    Dot,
    Cross,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeOp {
    Derivative,
    Integral,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    /// `@<`, proportional to.
    Proportional,
    /// `~`, equivalent to.
    Equivalent,
}

impl AddOp {
    pub fn apply(self, a: f64, b: f64) -> f64 {
        match self {
            AddOp::Add => a + b,
            AddOp::Subtract => a - b,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AddOp::Add => "+",
            AddOp::Subtract => "-",
        }
    }
}

impl MulOp {
    pub fn apply(self, a: f64, b: f64) -> f64 {
        match self {
            MulOp::Multiply => a * b,
            MulOp::Divide => a / b,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MulOp::Multiply => "*",
            MulOp::Divide => "/",
        }
    }
}

impl VectorOp {
    pub fn as_str(self) -> &'static str {
        match self {
            VectorOp::Dot => "dot",
            VectorOp::Cross => "cross",
        }
    }
}

impl TimeOp {
    pub fn as_str(self) -> &'static str {
        match self {
            TimeOp::Derivative => "derivative",
            TimeOp::Integral => "integral",
        }
    }
}

impl CompareOp {
    pub fn as_str(self) -> &'static str {
        match self {
            CompareOp::Lt => "<",
            CompareOp::Le => "<=",
            CompareOp::Gt => ">",
            CompareOp::Ge => ">=",
            CompareOp::Eq => "==",
            CompareOp::Proportional => "@<",
            CompareOp::Equivalent => "~",
        }
    }

    /// Proportionality relates quantities of different dimensions; every
    /// other comparison needs matching sides.
    pub fn requires_matching_dimensions(self) -> bool {
        !matches!(self, CompareOp::Proportional)
    }
}

// ──────────────────────────────────────────────
// Expressions
// ──────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub physics: Physics,
    /// Known only for compile-time numeric subexpressions.
    pub value: Option<f64>,
    pub prov: Provenance,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    Identifier {
        name: String,
        resolved: PhysicsId,
    },
    Number(f64),
    Negate(Box<Expr>),
    /// A chain of low-precedence operators.
    Sum {
        first: Box<Expr>,
        rest: Vec<(AddOp, Expr)>,
    },
    /// A chain of mid-precedence operators.
    Product {
        first: Box<Expr>,
        rest: Vec<(MulOp, Expr)>,
    },
    Power {
        base: Box<Expr>,
        exponent: Box<Expr>,
    },
    Vector {
        op: VectorOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Time {
        ops: Vec<TimeOp>,
        operand: Box<Expr>,
    },
}

// ──────────────────────────────────────────────
// Declarations
// ──────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    English,
    Spanish,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SignalDecl {
    pub identifier: String,
    pub physics: PhysicsId,
    pub unit_name: String,
    pub language: Option<Language>,
    pub symbol: Option<String>,
    /// `None` for a base signal (`derivation = none`).
    pub derivation: Option<Expr>,
    /// The fresh dimension a base signal introduced.
    pub dimension: Option<DimensionId>,
    pub prov: Provenance,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConstantDecl {
    pub identifier: String,
    pub physics: PhysicsId,
    pub expr: Expr,
    pub prov: Provenance,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VectorScalarPair {
    pub vector: PhysicsId,
    pub scalar: PhysicsId,
    pub prov: Provenance,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    /// The bound name used inside the invariant body.
    pub name: String,
    /// The Physics identifier or unit alias naming the parameter's type.
    pub type_name: String,
    pub physics: PhysicsId,
    pub number: usize,
    pub prov: Provenance,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Constraint {
    pub left: Expr,
    pub op: CompareOp,
    pub right: Expr,
    pub prov: Provenance,
}

/// Index into the compilation's invariant list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InvariantId(pub(crate) usize);

impl InvariantId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Invariant {
    pub name: String,
    /// Product of the parameters' Physics ids.
    pub id: u64,
    pub parameters: Vec<Parameter>,
    pub constraints: Vec<Constraint>,
    pub scope: ScopeId,
    pub prov: Provenance,
}

impl Invariant {
    pub fn parameter(&self, number: usize) -> Option<&Parameter> {
        self.parameters.iter().find(|p| p.number == number)
    }

    /// Type name of the parameter bound as `name`.
    pub fn parameter_type(&self, name: &str) -> Option<&str> {
        self.parameters
            .iter()
            .find(|p| p.name == name)
            .map(|p| p.type_name.as_str())
    }

    /// Bound name of the first parameter whose type is `type_name`.
    pub fn parameter_bound_to(&self, type_name: &str) -> Option<&str> {
        self.parameters
            .iter()
            .find(|p| p.type_name == type_name)
            .map(|p| p.name.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Rule {
    Signal(SignalDecl),
    Constant(ConstantDecl),
    Invariant {
        invariant: InvariantId,
        prov: Provenance,
    },
    VectorScalarPairs {
        pairs: Vec<VectorScalarPair>,
        prov: Provenance,
    },
}

impl Rule {
    pub fn prov(&self) -> &Provenance {
        match self {
            Rule::Signal(s) => &s.prov,
            Rule::Constant(c) => &c.prov,
            Rule::Invariant { prov, .. } | Rule::VectorScalarPairs { prov, .. } => prov,
        }
    }
}

/// Root of the AST for one file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewtonFile {
    pub rules: Vec<Rule>,
}
