//! The state of one compilation: registries, AST, invariant list and
//! diagnostics, plus read-only queries over the finished result.

use crate::ast::{Invariant, InvariantId, NewtonFile, Rule};
use crate::error::NewtonError;
use crate::physics::{Physics, PhysicsId};
use crate::scope::{ScopeId, SymbolTable};
use serde::{Deserialize, Serialize};

/// Default maximum number of errors collected in recovery mode before aborting.
pub const DEFAULT_MAX_ERRORS: usize = 10;

/// Options controlling a single compilation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CompileOptions {
    /// Recover at rule boundaries and keep going after an error.
    pub recover: bool,
    /// Stop recovering after this many errors.
    pub max_errors: usize,
}

impl Default for CompileOptions {
    fn default() -> Self {
        CompileOptions {
            recover: false,
            max_errors: DEFAULT_MAX_ERRORS,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CompilationSession {
    pub(crate) filename: String,
    pub(crate) symbols: SymbolTable,
    pub(crate) ast: NewtonFile,
    pub(crate) invariants: Vec<Invariant>,
    pub(crate) diagnostics: Vec<NewtonError>,
}

impl CompilationSession {
    pub fn new(filename: &str) -> Self {
        CompilationSession {
            filename: filename.to_owned(),
            symbols: SymbolTable::new(),
            ast: NewtonFile::default(),
            invariants: Vec::new(),
            diagnostics: Vec::new(),
        }
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    pub fn root_scope(&self) -> ScopeId {
        self.symbols.root()
    }

    pub fn ast(&self) -> &NewtonFile {
        &self.ast
    }

    /// Invariants in declaration order.
    pub fn invariants(&self) -> &[Invariant] {
        &self.invariants
    }

    /// Errors recorded while recovering. Empty unless recovery was enabled.
    pub fn diagnostics(&self) -> &[NewtonError] {
        &self.diagnostics
    }

    pub fn has_errors(&self) -> bool {
        !self.diagnostics.is_empty()
    }

    pub(crate) fn push_rule(&mut self, rule: Rule) {
        self.ast.rules.push(rule);
    }

    pub(crate) fn register_invariant(&mut self, invariant: Invariant) -> InvariantId {
        let id = InvariantId(self.invariants.len());
        tracing::debug!(name = %invariant.name, id = invariant.id, "registered invariant");
        self.invariants.push(invariant);
        id
    }

    // -- Queries ------------------------------------------------

    /// Resolve a name from the file scope, by identifier and then by unit alias.
    pub fn physics_id_by_name(&self, name: &str) -> Option<PhysicsId> {
        let root = self.symbols.root();
        self.symbols
            .lookup_physics(root, name)
            .or_else(|| self.symbols.lookup_physics_by_dimension_alias(root, name))
    }

    pub fn physics_by_name(&self, name: &str) -> Option<&Physics> {
        self.physics_id_by_name(name)
            .map(|id| self.symbols.physics(id))
    }

    pub fn invariant(&self, name: &str) -> Option<&Invariant> {
        self.invariants.iter().find(|i| i.name == name)
    }

    pub fn invariant_at(&self, id: InvariantId) -> &Invariant {
        &self.invariants[id.0]
    }

    /// Find the invariant whose parameters have exactly these types, in any
    /// order. Matching is by the product of the types' Physics ids.
    pub fn invariant_by_parameters(&self, type_names: &[&str]) -> Option<&Invariant> {
        let id = type_names.iter().try_fold(1u64, |acc, name| {
            self.physics_by_name(name)
                .map(|physics| acc.wrapping_mul(physics.id))
        })?;
        self.invariants
            .iter()
            .find(|i| i.id == id && i.parameters.len() == type_names.len())
    }
}
