#![allow(clippy::result_large_err)]
//! newton-core: front end for the Newton physical-invariant language.
//!
//! Lexes and parses `.nt` sources into typed registries of dimensions and
//! physics, checks dimensional consistency of every expression, and
//! records invariants keyed by the product of their parameter types.
//!
//! # Public API
//!
//! - [`compile_source()`] / [`compile_path()`] -- lex and parse one file
//! - [`CompilationSession`] -- the result: registries, AST, invariants
//! - [`NewtonError`] / [`ErrorKind`] -- located diagnostics
//! - [`SymbolTable`], [`Physics`], [`Dimension`], [`DimensionVector`] --
//!   the prime-product dimension model
//! - [`serialize::to_json()`] -- JSON export of a session
//!
//! The lexer, parser and FIRST/FOLLOW tables are public for tools that
//! need to drive the pipeline a step at a time.

pub mod ast;
pub mod compile;
pub mod dimension;
pub mod error;
pub mod first_follow;
pub mod lexer;
pub mod parser;
pub mod physics;
pub mod scope;
pub mod serialize;
pub mod session;

// ── Convenience re-exports: key types ────────────────────────────────

pub use ast::{
    CompareOp, Constraint, ConstantDecl, Expr, ExprKind, Invariant, InvariantId, NewtonFile,
    Parameter, Provenance, Rule, SignalDecl, VectorScalarPair,
};
pub use dimension::{Dimension, DimensionId, DimensionVector, PRIMES};
pub use error::{ErrorKind, NewtonError};
pub use physics::{Physics, PhysicsId, BIG_NUMBER_OFFSET};
pub use scope::{Scope, ScopeId, SymbolTable};
pub use session::{CompilationSession, CompileOptions, DEFAULT_MAX_ERRORS};

// ── Convenience re-exports: pipeline entry points ────────────────────

pub use compile::{compile_path, compile_source};
pub use lexer::lex;
pub use parser::{parse, parse_recovering};
