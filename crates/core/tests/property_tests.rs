//! Property-based tests for the prime-product dimension model.

use newton_core::{
    compile_source, CompileOptions, Dimension, DimensionVector, Provenance, SymbolTable, PRIMES,
};
use quickcheck::{QuickCheck, TestResult};

const BASE_NAMES: [&str; 5] = ["mass", "length", "time", "current", "temperature"];

fn table_with_dimensions(n: usize) -> (SymbolTable, Vec<Dimension>) {
    let mut table = SymbolTable::new();
    let root = table.root();
    let dims = (0..n)
        .map(|i| {
            let name = format!("d{}", i);
            let id = table
                .add_dimension(root, &name, &name, &name, Provenance::default())
                .unwrap();
            table.dimension(id).clone()
        })
        .collect();
    (table, dims)
}

fn vector_of(dims: &[Dimension], picks: &[u8]) -> DimensionVector {
    picks.iter().fold(DimensionVector::new(), |v, i| {
        v.with_dimension(&dims[*i as usize % dims.len()]).unwrap()
    })
}

fn is_prime(n: u64) -> bool {
    n >= 2 && (2..).take_while(|d| d * d <= n).all(|d| n % d != 0)
}

fn base_program() -> String {
    let mut src = String::new();
    for name in BASE_NAMES {
        src.push_str(&format!(
            "{} : signal = {{ name = \"{}_unit\" English; symbol = \"{}\"; derivation = none; }}\n",
            name,
            name,
            &name[..2]
        ));
    }
    src.push_str("velocity : signal = { name = \"velocity\"; symbol = \"vel\"; derivation = length / time; }\n");
    src.push_str("vectorScalarPairs = { velocity : length; }\n");
    src
}

fn product_expression(picks: &[u8]) -> String {
    picks
        .iter()
        .map(|i| BASE_NAMES[*i as usize % BASE_NAMES.len()])
        .collect::<Vec<_>>()
        .join(" * ")
}

/// Property: primes come out of the table strictly increasing and prime
#[test]
fn prop_prime_allocation_is_strictly_increasing() {
    fn prop(n: u8) -> TestResult {
        let mut table = SymbolTable::new();
        let mut previous = 1;
        for _ in 0..n.min(PRIMES.len() as u8) {
            let p = table.allocate_prime().unwrap();
            if p <= previous || !is_prime(p) {
                return TestResult::failed();
            }
            previous = p;
        }
        TestResult::from_bool(table.primes_allocated() == (n as usize).min(PRIMES.len()))
    }

    QuickCheck::new()
        .tests(100)
        .quickcheck(prop as fn(u8) -> TestResult);
}

/// Property: the product always equals the product of the listed primes
#[test]
fn prop_product_matches_entries() {
    fn prop(mut picks: Vec<u8>) -> TestResult {
        picks.truncate(10);
        let (_, dims) = table_with_dimensions(8);
        let v = vector_of(&dims, &picks);
        let expected: u64 = v.entries().iter().map(|d| d.prime).product();
        TestResult::from_bool(
            v.product() == expected && v.len() == picks.len() && v.is_consistent(),
        )
    }

    QuickCheck::new()
        .tests(100)
        .quickcheck(prop as fn(Vec<u8>) -> TestResult);
}

/// Property: equal products exactly when the dimension multisets are equal
#[test]
fn prop_product_equality_matches_multiset_equality() {
    fn prop(mut a: Vec<u8>, mut b: Vec<u8>) -> TestResult {
        a.truncate(8);
        b.truncate(8);
        let (_, dims) = table_with_dimensions(6);
        let va = vector_of(&dims, &a);
        let vb = vector_of(&dims, &b);
        let mut pa: Vec<u64> = va.primes().collect();
        let mut pb: Vec<u64> = vb.primes().collect();
        pa.sort_unstable();
        pb.sort_unstable();
        TestResult::from_bool((va.product() == vb.product()) == (pa == pb))
    }

    QuickCheck::new()
        .tests(100)
        .quickcheck(prop as fn(Vec<u8>, Vec<u8>) -> TestResult);
}

/// Property: cancellation keeps the ratio and leaves no shared prime
#[test]
fn prop_cancellation_preserves_ratio() {
    fn prop(mut num: Vec<u8>, mut den: Vec<u8>) -> TestResult {
        num.truncate(8);
        den.truncate(8);
        let (_, dims) = table_with_dimensions(4);
        let n = vector_of(&dims, &num);
        let d = vector_of(&dims, &den);
        let (n2, d2) = DimensionVector::cancel_common(&n, &d);
        let ratio_kept = n2.product() as u128 * d.product() as u128
            == d2.product() as u128 * n.product() as u128;
        let disjoint = n2.primes().all(|p| !d2.primes().any(|q| q == p));
        TestResult::from_bool(ratio_kept && disjoint && n2.is_consistent() && d2.is_consistent())
    }

    QuickCheck::new()
        .tests(100)
        .quickcheck(prop as fn(Vec<u8>, Vec<u8>) -> TestResult);
}

/// Property: the innermost declaration of a name shadows outer ones
#[test]
fn prop_inner_scopes_shadow_outer_names() {
    fn prop(depth: u8) -> TestResult {
        let depth = (depth % 16) as usize;
        let mut table = SymbolTable::new();
        let mut scope = table.root();
        let mut declared = vec![table.add_physics(scope, "x", Provenance::default())];
        let mut scopes = vec![scope];
        for _ in 0..depth {
            scope = table.open_scope(scope, Provenance::default());
            declared.push(table.add_physics(scope, "x", Provenance::default()));
            scopes.push(scope);
        }
        let all_visible = scopes
            .iter()
            .zip(&declared)
            .all(|(s, id)| table.lookup_physics(*s, "x") == Some(*id));
        TestResult::from_bool(all_visible)
    }

    QuickCheck::new()
        .tests(100)
        .quickcheck(prop as fn(u8) -> TestResult);
}

/// Property: multiplication of base signals is commutative
#[test]
fn prop_products_commute() {
    fn prop(mut picks: Vec<u8>) -> TestResult {
        picks.truncate(10);
        if picks.is_empty() {
            return TestResult::discard();
        }
        let mut reversed = picks.clone();
        reversed.reverse();
        let src = format!(
            "{}a : constant = {};\nb : constant = {};\n",
            base_program(),
            product_expression(&picks),
            product_expression(&reversed)
        );
        let session = compile_source(&src, "prop.nt", &CompileOptions::default()).unwrap();
        let a = session.physics_by_name("a").unwrap();
        let b = session.physics_by_name("b").unwrap();
        TestResult::from_bool(a.same_dimensions(b) && a.id == b.id)
    }

    QuickCheck::new()
        .tests(100)
        .quickcheck(prop as fn(Vec<u8>) -> TestResult);
}

/// Property: a vector times any number of scalars is still a vector
#[test]
fn prop_vector_times_scalars_is_a_vector() {
    fn prop(mut picks: Vec<u8>, vector_first: bool) -> TestResult {
        picks.truncate(8);
        let expr = match (picks.is_empty(), vector_first) {
            (true, _) => "velocity".to_owned(),
            (false, true) => format!("velocity * {}", product_expression(&picks)),
            (false, false) => format!("{} * velocity", product_expression(&picks)),
        };
        let src = format!("{}p : constant = {};\n", base_program(), expr);
        let session = compile_source(&src, "prop.nt", &CompileOptions::default()).unwrap();
        TestResult::from_bool(session.physics_by_name("p").unwrap().is_vector)
    }

    QuickCheck::new()
        .tests(100)
        .quickcheck(prop as fn(Vec<u8>, bool) -> TestResult);
}

/// Property: a derived signal carries exactly its derivation's dimensions
#[test]
fn prop_derived_signal_matches_its_derivation() {
    fn prop(mut num: Vec<u8>, mut den: Vec<u8>) -> TestResult {
        num.truncate(6);
        den.truncate(6);
        if num.is_empty() {
            return TestResult::discard();
        }
        let mut expr = product_expression(&num);
        for i in &den {
            expr.push_str(" / ");
            expr.push_str(BASE_NAMES[*i as usize % BASE_NAMES.len()]);
        }
        let src = format!(
            "{}derived : signal = {{ name = \"derived_unit\"; symbol = \"du\"; derivation = {}; }}\nreference : constant = {};\n",
            base_program(),
            expr,
            expr
        );
        let session = compile_source(&src, "prop.nt", &CompileOptions::default()).unwrap();
        let derived = session.physics_by_name("derived").unwrap();
        let reference = session.physics_by_name("reference").unwrap();
        TestResult::from_bool(
            derived.numerator_prime_product() == reference.numerator_prime_product()
                && derived.denominator_prime_product() == reference.denominator_prime_product()
                && derived.is_consistent(),
        )
    }

    QuickCheck::new()
        .tests(100)
        .quickcheck(prop as fn(Vec<u8>, Vec<u8>) -> TestResult);
}
