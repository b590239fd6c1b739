//! JSON export of a finished compilation: dimensions, physics, invariants
//! and scopes, in a deterministic order for downstream consumers.

use crate::ast::{Constraint, Invariant, Parameter};
use crate::dimension::{Dimension, DimensionVector};
use crate::physics::{Physics, PhysicsId};
use crate::scope::{Scope, SymbolTable};
use crate::session::CompilationSession;
use serde_json::{json, Value};

pub fn to_json(session: &CompilationSession) -> Value {
    let symbols = session.symbols();

    let mut dimensions: Vec<&Dimension> = symbols.dimensions().iter().collect();
    dimensions.sort_by_key(|d| d.prime);

    // Stable sort: redefinitions keep their declaration order.
    let mut physics: Vec<&Physics> = symbols.all_physics().iter().collect();
    physics.sort_by(|a, b| a.identifier.cmp(&b.identifier));

    json!({
        "file": session.filename(),
        "dimensions": dimensions.iter().map(|d| serialize_dimension(d)).collect::<Vec<_>>(),
        "physics": physics.iter().map(|p| serialize_physics(symbols, p)).collect::<Vec<_>>(),
        "invariants": session
            .invariants()
            .iter()
            .map(|i| serialize_invariant(symbols, i))
            .collect::<Vec<_>>(),
        "scopes": symbols.scopes().iter().map(serialize_scope).collect::<Vec<_>>(),
    })
}

fn serialize_dimension(d: &Dimension) -> Value {
    json!({
        "abbreviation": d.abbreviation,
        "identifier":   d.identifier,
        "line":         d.prov.line,
        "name":         d.name,
        "prime":        d.prime,
        "scope":        d.scope.index(),
    })
}

fn serialize_vector(v: &DimensionVector) -> Value {
    json!({
        "count":      v.len(),
        "dimensions": v.entries().iter().map(|d| d.abbreviation.as_str()).collect::<Vec<_>>(),
        "product":    v.product(),
    })
}

fn counterpart_name(symbols: &SymbolTable, id: Option<PhysicsId>) -> Value {
    id.and_then(|id| symbols.physics(id).identifier.clone())
        .map(Value::String)
        .unwrap_or(Value::Null)
}

pub fn serialize_physics(symbols: &SymbolTable, p: &Physics) -> Value {
    json!({
        "denominator":        serialize_vector(p.denominator()),
        "dimension_alias":    p.dimension_alias,
        "dimension_alias_abbreviation": p.dimension_alias_abbreviation,
        "id":                 p.id,
        "identifier":         p.identifier,
        "is_constant":        p.is_constant,
        "is_vector":          p.is_vector,
        "line":               p.prov.as_ref().map(|prov| prov.line),
        "numerator":          serialize_vector(p.numerator()),
        "scalar_counterpart": counterpart_name(symbols, p.scalar_counterpart),
        "unit":               p.unit_string(),
        "value":              p.value,
        "vector_counterpart": counterpart_name(symbols, p.vector_counterpart),
    })
}

fn serialize_parameter(symbols: &SymbolTable, p: &Parameter) -> Value {
    json!({
        "name":   p.name,
        "number": p.number,
        "type":   p.type_name,
        "unit":   symbols.physics(p.physics).unit_string(),
    })
}

fn serialize_constraint(c: &Constraint) -> Value {
    json!({
        "left":  c.left.physics.unit_string(),
        "line":  c.prov.line,
        "op":    c.op.as_str(),
        "right": c.right.physics.unit_string(),
    })
}

fn serialize_invariant(symbols: &SymbolTable, i: &Invariant) -> Value {
    json!({
        "constraints": i.constraints.iter().map(serialize_constraint).collect::<Vec<_>>(),
        "id":          i.id,
        "line":        i.prov.line,
        "name":        i.name,
        "parameters":  i.parameters.iter().map(|p| serialize_parameter(symbols, p)).collect::<Vec<_>>(),
    })
}

fn serialize_scope(s: &Scope) -> Value {
    json!({
        "begin":      s.begin.as_ref().map(|p| p.line),
        "children":   s.children.iter().map(|c| c.index()).collect::<Vec<_>>(),
        "dimensions": s.dimensions.len(),
        "end":        s.end.as_ref().map(|p| p.line),
        "id":         s.id.index(),
        "parent":     s.parent.map(|p| p.index()),
        "physics":    s.physics.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compile::compile_source;
    use crate::session::CompileOptions;

    const SRC: &str = r#"
time : signal = { name = "second" English; symbol = "s"; derivation = none; }
distance : signal = { name = "meter" English; symbol = "m"; derivation = none; }
speed : signal = { name = "speed"; symbol = "mps"; derivation = distance / time; }
same : invariant (d : distance, t : time, v : speed) = { v == d / t }
"#;

    #[test]
    fn exports_every_table() {
        let session = compile_source(SRC, "k.nt", &CompileOptions::default()).unwrap();
        let v = to_json(&session);
        assert_eq!(v["file"], "k.nt");
        assert_eq!(v["dimensions"].as_array().map(Vec::len), Some(2));
        assert_eq!(v["physics"].as_array().map(Vec::len), Some(3));
        assert_eq!(v["invariants"][0]["name"], "same");
        assert_eq!(v["invariants"][0]["constraints"][0]["op"], "==");
        assert_eq!(v["invariants"][0]["constraints"][0]["left"], "m/s");
        assert_eq!(v["scopes"].as_array().map(Vec::len), Some(2));
        assert_eq!(v["scopes"][1]["parent"], 0);
    }

    #[test]
    fn physics_are_sorted_by_identifier() {
        let session = compile_source(SRC, "k.nt", &CompileOptions::default()).unwrap();
        let v = to_json(&session);
        let names: Vec<_> = v["physics"]
            .as_array()
            .unwrap()
            .iter()
            .map(|p| p["identifier"].as_str().unwrap().to_owned())
            .collect();
        assert_eq!(names, vec!["distance", "speed", "time"]);
        assert_eq!(v["physics"][1]["numerator"]["product"], 3);
        assert_eq!(v["physics"][1]["denominator"]["dimensions"][0], "s");
    }
}
