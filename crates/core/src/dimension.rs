//! Base dimensions and the prime-product dimension vector.
//!
//! Every base [`Dimension`] is tagged with a distinct prime taken in order
//! from [`PRIMES`]. A [`DimensionVector`] is a multiset of dimensions kept
//! twice: as an ordered list (for display and structural copies) and as the
//! product of the primes of its entries. By unique factorization two vectors
//! hold the same multiset exactly when their products are equal, so
//! dimensional equality is a single integer comparison.
//!
//! The list and the product are private and only change together, through
//! [`DimensionVector::combine`], [`DimensionVector::with_dimension`] and
//! [`DimensionVector::cancel_common`].

use crate::ast::Provenance;
use crate::error::ErrorKind;
use crate::scope::ScopeId;

/// The first 168 primes (all primes below 1000). One per base dimension.
#[rustfmt::skip]
pub const PRIMES: [u64; 168] = [
    2, 3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37,
    41, 43, 47, 53, 59, 61, 67, 71, 73, 79, 83, 89,
    97, 101, 103, 107, 109, 113, 127, 131, 137, 139, 149, 151,
    157, 163, 167, 173, 179, 181, 191, 193, 197, 199, 211, 223,
    227, 229, 233, 239, 241, 251, 257, 263, 269, 271, 277, 281,
    283, 293, 307, 311, 313, 317, 331, 337, 347, 349, 353, 359,
    367, 373, 379, 383, 389, 397, 401, 409, 419, 421, 431, 433,
    439, 443, 449, 457, 461, 463, 467, 479, 487, 491, 499, 503,
    509, 521, 523, 541, 547, 557, 563, 569, 571, 577, 587, 593,
    599, 601, 607, 613, 617, 619, 631, 641, 643, 647, 653, 659,
    661, 673, 677, 683, 691, 701, 709, 719, 727, 733, 739, 743,
    751, 757, 761, 769, 773, 787, 797, 809, 811, 821, 823, 827,
    829, 839, 853, 857, 859, 863, 877, 881, 883, 887, 907, 911,
    919, 929, 937, 941, 947, 953, 967, 971, 977, 983, 991, 997,
];

/// Index of a [`Dimension`] in the symbol table arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DimensionId(pub(crate) usize);

impl DimensionId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// A named base physical unit, e.g. `distance` measured in meters (`m`).
#[derive(Debug, Clone, PartialEq)]
pub struct Dimension {
    pub id: DimensionId,
    /// Identifier of the base signal that introduced the dimension.
    pub identifier: String,
    /// Unit name, e.g. "meter".
    pub name: String,
    /// Unit symbol, e.g. "m".
    pub abbreviation: String,
    pub prime: u64,
    pub scope: ScopeId,
    pub prov: Provenance,
}

impl Dimension {
    /// True when `unit` names this dimension by identifier, unit name or symbol.
    pub fn is_named(&self, unit: &str) -> bool {
        self.identifier == unit || self.name == unit || self.abbreviation == unit
    }
}

/// An ordered multiset of dimensions together with the product of their primes.
#[derive(Debug, Clone, PartialEq)]
pub struct DimensionVector {
    entries: Vec<Dimension>,
    product: u64,
}

impl Default for DimensionVector {
    fn default() -> Self {
        DimensionVector::new()
    }
}

impl DimensionVector {
    /// The empty vector. Its product is the multiplicative identity.
    pub fn new() -> Self {
        DimensionVector {
            entries: Vec::new(),
            product: 1,
        }
    }

    pub fn entries(&self) -> &[Dimension] {
        &self.entries
    }

    pub fn product(&self) -> u64 {
        self.product
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn primes(&self) -> impl Iterator<Item = u64> + '_ {
        self.entries.iter().map(|d| d.prime)
    }

    /// Append copies of `other`'s entries and multiply in its product.
    pub fn combine(&self, other: &DimensionVector) -> Result<DimensionVector, ErrorKind> {
        let product = self
            .product
            .checked_mul(other.product)
            .ok_or(ErrorKind::PrimeProductOverflow)?;
        let mut entries = Vec::with_capacity(self.entries.len() + other.entries.len());
        entries.extend_from_slice(&self.entries);
        entries.extend_from_slice(&other.entries);
        Ok(DimensionVector { entries, product })
    }

    /// Append one dimension.
    pub fn with_dimension(&self, dimension: &Dimension) -> Result<DimensionVector, ErrorKind> {
        let product = self
            .product
            .checked_mul(dimension.prime)
            .ok_or(ErrorKind::PrimeProductOverflow)?;
        let mut entries = self.entries.clone();
        entries.push(dimension.clone());
        Ok(DimensionVector { entries, product })
    }

    /// Remove dimensions present in both vectors, one occurrence at a time.
    /// Each removal divides both products by the shared prime.
    pub fn cancel_common(
        numerator: &DimensionVector,
        denominator: &DimensionVector,
    ) -> (DimensionVector, DimensionVector) {
        let mut kept = Vec::with_capacity(numerator.entries.len());
        let mut remaining = denominator.entries.clone();
        let mut num_product = numerator.product;
        let mut den_product = denominator.product;

        for dim in &numerator.entries {
            match remaining.iter().position(|d| d.prime == dim.prime) {
                Some(i) => {
                    remaining.remove(i);
                    num_product /= dim.prime;
                    den_product /= dim.prime;
                }
                None => kept.push(dim.clone()),
            }
        }

        (
            DimensionVector {
                entries: kept,
                product: num_product,
            },
            DimensionVector {
                entries: remaining,
                product: den_product,
            },
        )
    }

    /// Whether the stored product equals the product over the entry list.
    pub fn is_consistent(&self) -> bool {
        self.primes()
            .try_fold(1u64, |acc, p| acc.checked_mul(p))
            .is_some_and(|p| p == self.product)
    }

    /// Unit symbols joined by `*`, e.g. `kg*m`. Empty for the empty vector.
    pub fn unit_string(&self) -> String {
        self.entries
            .iter()
            .map(|d| d.abbreviation.as_str())
            .collect::<Vec<_>>()
            .join("*")
    }
}
