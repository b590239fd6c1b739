//! Physics: the dimensional type of a signal, constant, parameter or
//! expression result.

use crate::ast::Provenance;
use crate::dimension::{Dimension, DimensionVector};
use crate::error::ErrorKind;
use crate::scope::ScopeId;

/// Added to the numerator product, scaled by the denominator product, to
/// form a dimensioned Physics id.
pub const BIG_NUMBER_OFFSET: u64 = 10_000;

/// Index of a registered [`Physics`] in the symbol table arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PhysicsId(pub(crate) usize);

impl PhysicsId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Physics {
    /// `None` for anonymous expression results.
    pub identifier: Option<String>,
    pub scope: Option<ScopeId>,
    pub prov: Option<Provenance>,
    pub is_vector: bool,
    pub is_constant: bool,
    /// Compile-time value, known only for numeric constants.
    pub value: Option<f64>,
    pub vector_counterpart: Option<PhysicsId>,
    pub scalar_counterpart: Option<PhysicsId>,
    /// Unit name of a signal, e.g. "meter".
    pub dimension_alias: Option<String>,
    /// Unit symbol of a signal, e.g. "m".
    pub dimension_alias_abbreviation: Option<String>,
    /// Earlier Physics with the same identifier visible at declaration time.
    pub definition: Option<PhysicsId>,
    pub id: u64,
    numerator: DimensionVector,
    denominator: DimensionVector,
}

impl Default for Physics {
    fn default() -> Self {
        Physics::anonymous()
    }
}

impl Physics {
    /// A dimensionless, unnamed Physics. Both prime products are 1.
    pub fn anonymous() -> Self {
        Physics {
            identifier: None,
            scope: None,
            prov: None,
            is_vector: false,
            is_constant: false,
            value: None,
            vector_counterpart: None,
            scalar_counterpart: None,
            dimension_alias: None,
            dimension_alias_abbreviation: None,
            definition: None,
            id: 0,
            numerator: DimensionVector::new(),
            denominator: DimensionVector::new(),
        }
    }

    pub fn named(identifier: &str, scope: ScopeId, prov: Provenance) -> Self {
        Physics {
            identifier: Some(identifier.to_owned()),
            scope: Some(scope),
            prov: Some(prov),
            ..Physics::anonymous()
        }
    }

    pub fn numerator(&self) -> &DimensionVector {
        &self.numerator
    }

    pub fn denominator(&self) -> &DimensionVector {
        &self.denominator
    }

    pub fn numerator_prime_product(&self) -> u64 {
        self.numerator.product()
    }

    pub fn denominator_prime_product(&self) -> u64 {
        self.denominator.product()
    }

    pub fn number_of_numerators(&self) -> usize {
        self.numerator.len()
    }

    pub fn number_of_denominators(&self) -> usize {
        self.denominator.len()
    }

    // -- Copy-and-multiply operations ---------------------------

    pub fn copy_numerator(&mut self, source: &Physics) -> Result<(), ErrorKind> {
        self.numerator = self.numerator.combine(&source.numerator)?;
        Ok(())
    }

    pub fn copy_denominator(&mut self, source: &Physics) -> Result<(), ErrorKind> {
        self.denominator = self.denominator.combine(&source.denominator)?;
        Ok(())
    }

    pub fn copy_numerator_to_denominator(&mut self, source: &Physics) -> Result<(), ErrorKind> {
        self.denominator = self.denominator.combine(&source.numerator)?;
        Ok(())
    }

    pub fn copy_denominator_to_numerator(&mut self, source: &Physics) -> Result<(), ErrorKind> {
        self.numerator = self.numerator.combine(&source.denominator)?;
        Ok(())
    }

    /// Multiply in both of `source`'s vectors.
    pub fn copy_dimensions(&mut self, source: &Physics) -> Result<(), ErrorKind> {
        self.copy_numerator(source)?;
        self.copy_denominator(source)
    }

    /// Divide by `source`: its numerator feeds our denominator and vice versa.
    pub fn divide_by(&mut self, source: &Physics) -> Result<(), ErrorKind> {
        self.copy_numerator_to_denominator(source)?;
        self.copy_denominator_to_numerator(source)
    }

    pub fn add_numerator_dimension(&mut self, dimension: &Dimension) -> Result<(), ErrorKind> {
        self.numerator = self.numerator.with_dimension(dimension)?;
        Ok(())
    }

    pub fn add_denominator_dimension(&mut self, dimension: &Dimension) -> Result<(), ErrorKind> {
        self.denominator = self.denominator.with_dimension(dimension)?;
        Ok(())
    }

    /// Cancel dimensions shared between numerator and denominator.
    pub fn cancel_common_dimensions(&mut self) {
        let (numerator, denominator) =
            DimensionVector::cancel_common(&self.numerator, &self.denominator);
        self.numerator = numerator;
        self.denominator = denominator;
    }

    /// Anonymous Physics of `self ** exponent` for an integer exponent.
    ///
    /// A negative exponent swaps numerator and denominator; zero yields a
    /// dimensionless result.
    pub fn raised_to(&self, exponent: i64) -> Result<Physics, ErrorKind> {
        let mut result = Physics::anonymous();
        if self.is_dimensionless() {
            return Ok(result);
        }
        for _ in 0..exponent.unsigned_abs() {
            if exponent > 0 {
                result.copy_dimensions(self)?;
            } else {
                result.divide_by(self)?;
            }
        }
        result.is_vector = self.is_vector && exponent == 1;
        Ok(result)
    }

    // -- Queries ------------------------------------------------

    pub fn is_dimensionless(&self) -> bool {
        self.numerator.product() == 1 && self.denominator.product() == 1
    }

    /// Dimensional equality: both prime products match.
    pub fn same_dimensions(&self, other: &Physics) -> bool {
        self.numerator.product() == other.numerator.product()
            && self.denominator.product() == other.denominator.product()
    }

    /// The numeric id of a dimensioned Physics, or `None` when it is
    /// dimensionless and needs a fresh prime instead.
    ///
    /// An empty side contributes 0, so a base signal's id is its bare prime
    /// and the offset only appears once a denominator exists.
    pub fn dimensioned_id(&self) -> Result<Option<u64>, ErrorKind> {
        if self.is_dimensionless() {
            return Ok(None);
        }
        let side = |v: &DimensionVector| if v.is_empty() { 0 } else { v.product() };
        side(&self.denominator)
            .checked_mul(BIG_NUMBER_OFFSET)
            .and_then(|d| d.checked_add(side(&self.numerator)))
            .map(Some)
            .ok_or(ErrorKind::PrimeProductOverflow)
    }

    pub fn is_consistent(&self) -> bool {
        self.numerator.is_consistent() && self.denominator.is_consistent()
    }

    /// Unit string such as `kg*m/s*s`, `1/s`, or `1` when dimensionless.
    pub fn unit_string(&self) -> String {
        let num = if self.numerator.is_empty() {
            "1".to_owned()
        } else {
            self.numerator.unit_string()
        };
        if self.denominator.is_empty() {
            num
        } else {
            format!("{}/{}", num, self.denominator.unit_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scope::SymbolTable;

    fn base(table: &mut SymbolTable, ident: &str, symbol: &str) -> Physics {
        let root = table.root();
        let id = table
            .add_dimension(root, ident, ident, symbol, Provenance::default())
            .unwrap();
        let mut p = Physics::named(ident, root, Provenance::default());
        p.add_numerator_dimension(table.dimension(id)).unwrap();
        p
    }

    #[test]
    fn anonymous_is_dimensionless() {
        let p = Physics::anonymous();
        assert!(p.is_dimensionless());
        assert_eq!(p.unit_string(), "1");
        assert_eq!(p.dimensioned_id(), Ok(None));
    }

    #[test]
    fn multiply_then_divide_tracks_both_products() {
        let mut table = SymbolTable::new();
        let mass = base(&mut table, "mass", "kg");
        let length = base(&mut table, "length", "m");
        let time = base(&mut table, "time", "s");

        let mut p = Physics::anonymous();
        p.copy_dimensions(&mass).unwrap();
        p.copy_dimensions(&length).unwrap();
        p.divide_by(&time).unwrap();
        p.divide_by(&time).unwrap();

        assert_eq!(p.numerator_prime_product(), 6);
        assert_eq!(p.denominator_prime_product(), 25);
        assert_eq!(p.number_of_numerators(), 2);
        assert_eq!(p.number_of_denominators(), 2);
        assert_eq!(p.unit_string(), "kg*m/s*s");
        assert_eq!(p.dimensioned_id(), Ok(Some(6 + 25 * BIG_NUMBER_OFFSET)));
        assert!(p.is_consistent());
    }

    #[test]
    fn empty_sides_contribute_zero_to_the_id() {
        let mut table = SymbolTable::new();
        let distance = base(&mut table, "distance", "m");
        let time = base(&mut table, "time", "s");
        assert_eq!(distance.dimensioned_id(), Ok(Some(2)));

        let mut frequency = Physics::anonymous();
        frequency.divide_by(&time).unwrap();
        assert_eq!(frequency.dimensioned_id(), Ok(Some(3 * BIG_NUMBER_OFFSET)));

        let mut speed = Physics::anonymous();
        speed.copy_dimensions(&distance).unwrap();
        speed.divide_by(&time).unwrap();
        assert_eq!(speed.dimensioned_id(), Ok(Some(2 + 3 * BIG_NUMBER_OFFSET)));
        assert_eq!(Physics::anonymous().dimensioned_id(), Ok(None));
    }

    #[test]
    fn dividing_equal_dimensions_cancels_to_dimensionless() {
        let mut table = SymbolTable::new();
        let mass = base(&mut table, "mass", "kg");
        let mut p = Physics::anonymous();
        p.copy_dimensions(&mass).unwrap();
        p.divide_by(&mass).unwrap();
        assert!(!p.is_dimensionless());
        p.cancel_common_dimensions();
        assert!(p.is_dimensionless());
        assert!(p.is_consistent());
    }

    #[test]
    fn negative_power_inverts() {
        let mut table = SymbolTable::new();
        let time = base(&mut table, "time", "s");
        let p = time.raised_to(-2).unwrap();
        assert_eq!(p.numerator_prime_product(), 1);
        assert_eq!(p.denominator_prime_product(), 4);
        assert_eq!(p.unit_string(), "1/s*s");
        assert!(time.raised_to(0).unwrap().is_dimensionless());
    }
}
