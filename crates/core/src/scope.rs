//! Scope tree and the Dimension/Physics registries.
//!
//! All records live in arenas owned by [`SymbolTable`] and are addressed by
//! index. Scopes hold the ids of what was declared in them; lookup walks from
//! a scope outward to the root. Nothing is removed during a compilation.

use crate::ast::{Parameter, Provenance};
use crate::dimension::{Dimension, DimensionId, PRIMES};
use crate::error::ErrorKind;
use crate::physics::{Physics, PhysicsId};

/// Index of a [`Scope`] in the symbol table arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScopeId(pub(crate) usize);

impl ScopeId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone)]
pub struct Scope {
    pub id: ScopeId,
    /// `None` only for the root (file) scope.
    pub parent: Option<ScopeId>,
    pub children: Vec<ScopeId>,
    pub dimensions: Vec<DimensionId>,
    pub physics: Vec<PhysicsId>,
    /// Set only on invariant body scopes.
    pub invariant_parameters: Option<Vec<Parameter>>,
    pub begin: Option<Provenance>,
    pub end: Option<Provenance>,
}

impl Scope {
    fn new(id: ScopeId, parent: Option<ScopeId>, begin: Option<Provenance>) -> Self {
        Scope {
            id,
            parent,
            children: Vec::new(),
            dimensions: Vec::new(),
            physics: Vec::new(),
            invariant_parameters: None,
            begin,
            end: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SymbolTable {
    scopes: Vec<Scope>,
    dimensions: Vec<Dimension>,
    physics: Vec<Physics>,
    /// Next index into [`PRIMES`]; shared by dimensions and dimensionless ids.
    next_prime: usize,
}

impl Default for SymbolTable {
    fn default() -> Self {
        SymbolTable::new()
    }
}

impl SymbolTable {
    pub fn new() -> Self {
        SymbolTable {
            scopes: vec![Scope::new(ScopeId(0), None, None)],
            dimensions: Vec::new(),
            physics: Vec::new(),
            next_prime: 0,
        }
    }

    pub fn root(&self) -> ScopeId {
        ScopeId(0)
    }

    // -- Scopes -------------------------------------------------

    pub fn open_scope(&mut self, parent: ScopeId, begin: Provenance) -> ScopeId {
        let id = ScopeId(self.scopes.len());
        self.scopes.push(Scope::new(id, Some(parent), Some(begin)));
        self.scopes[parent.0].children.push(id);
        tracing::debug!(scope = id.0, parent = parent.0, "opened scope");
        id
    }

    pub fn close_scope(&mut self, scope: ScopeId, end: Provenance) {
        tracing::debug!(scope = scope.0, "closed scope");
        self.scopes[scope.0].end = Some(end);
    }

    pub fn set_invariant_parameters(&mut self, scope: ScopeId, parameters: Vec<Parameter>) {
        self.scopes[scope.0].invariant_parameters = Some(parameters);
    }

    pub fn scope(&self, id: ScopeId) -> &Scope {
        &self.scopes[id.0]
    }

    pub fn scopes(&self) -> &[Scope] {
        &self.scopes
    }

    /// `scope`, its parent, and so on up to the root.
    pub fn ancestors(&self, scope: ScopeId) -> impl Iterator<Item = &Scope> + '_ {
        std::iter::successors(Some(&self.scopes[scope.0]), move |s| {
            s.parent.map(|p| &self.scopes[p.0])
        })
    }

    /// The parameter list of the innermost enclosing invariant body, if any.
    pub fn invariant_parameters(&self, scope: ScopeId) -> Option<&[Parameter]> {
        self.ancestors(scope)
            .find_map(|s| s.invariant_parameters.as_deref())
    }

    // -- Primes -------------------------------------------------

    /// Hand out the next prime from the table.
    pub fn allocate_prime(&mut self) -> Result<u64, ErrorKind> {
        let prime = PRIMES
            .get(self.next_prime)
            .copied()
            .ok_or(ErrorKind::PrimeTableExhausted(PRIMES.len()))?;
        self.next_prime += 1;
        Ok(prime)
    }

    pub fn primes_allocated(&self) -> usize {
        self.next_prime
    }

    // -- Dimensions ---------------------------------------------

    pub fn add_dimension(
        &mut self,
        scope: ScopeId,
        identifier: &str,
        name: &str,
        abbreviation: &str,
        prov: Provenance,
    ) -> Result<DimensionId, ErrorKind> {
        let prime = self.allocate_prime()?;
        let id = DimensionId(self.dimensions.len());
        tracing::debug!(identifier, abbreviation, prime, "allocated dimension");
        self.dimensions.push(Dimension {
            id,
            identifier: identifier.to_owned(),
            name: name.to_owned(),
            abbreviation: abbreviation.to_owned(),
            prime,
            scope,
            prov,
        });
        self.scopes[scope.0].dimensions.push(id);
        Ok(id)
    }

    pub fn dimension(&self, id: DimensionId) -> &Dimension {
        &self.dimensions[id.0]
    }

    pub fn dimensions(&self) -> &[Dimension] {
        &self.dimensions
    }

    pub fn lookup_dimension(&self, scope: ScopeId, identifier: &str) -> Option<DimensionId> {
        self.find_dimension(scope, |d| d.identifier == identifier)
    }

    /// Find a dimension by identifier, unit name or unit symbol.
    pub fn lookup_dimension_by_unit(&self, scope: ScopeId, unit: &str) -> Option<DimensionId> {
        self.find_dimension(scope, |d| d.is_named(unit))
    }

    fn find_dimension(
        &self,
        scope: ScopeId,
        pred: impl Fn(&Dimension) -> bool,
    ) -> Option<DimensionId> {
        self.ancestors(scope).find_map(|s| {
            s.dimensions
                .iter()
                .rev()
                .copied()
                .find(|id| pred(&self.dimensions[id.0]))
        })
    }

    // -- Physics ------------------------------------------------

    /// Register an empty Physics for `identifier` in `scope`. Its
    /// `definition` points at any earlier Physics of the same name visible
    /// from `scope`.
    pub fn add_physics(&mut self, scope: ScopeId, identifier: &str, prov: Provenance) -> PhysicsId {
        let definition = self.lookup_physics(scope, identifier);
        if definition.is_some() {
            tracing::warn!(identifier, line = prov.line, "redefinition of physics");
        }
        let id = PhysicsId(self.physics.len());
        let mut physics = Physics::named(identifier, scope, prov);
        physics.definition = definition;
        self.physics.push(physics);
        self.scopes[scope.0].physics.push(id);
        id
    }

    /// Assign the numeric id of a registered Physics once its dimensions are
    /// final. Dimensionless Physics consume the next prime.
    pub fn assign_physics_id(&mut self, id: PhysicsId) -> Result<u64, ErrorKind> {
        let numeric = match self.physics[id.0].dimensioned_id()? {
            Some(n) => n,
            None => self.allocate_prime()?,
        };
        self.physics[id.0].id = numeric;
        Ok(numeric)
    }

    pub fn physics(&self, id: PhysicsId) -> &Physics {
        &self.physics[id.0]
    }

    pub fn physics_mut(&mut self, id: PhysicsId) -> &mut Physics {
        &mut self.physics[id.0]
    }

    pub fn all_physics(&self) -> &[Physics] {
        &self.physics
    }

    pub fn lookup_physics(&self, scope: ScopeId, identifier: &str) -> Option<PhysicsId> {
        self.find_physics(scope, |p| p.identifier.as_deref() == Some(identifier))
    }

    pub fn lookup_physics_by_dimension_alias(&self, scope: ScopeId, alias: &str) -> Option<PhysicsId> {
        self.find_physics(scope, |p| p.dimension_alias.as_deref() == Some(alias))
    }

    /// Within one scope the most recent declaration wins.
    fn find_physics(&self, scope: ScopeId, pred: impl Fn(&Physics) -> bool) -> Option<PhysicsId> {
        self.ancestors(scope).find_map(|s| {
            s.physics
                .iter()
                .rev()
                .copied()
                .find(|id| pred(&self.physics[id.0]))
        })
    }
}
