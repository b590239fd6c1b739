use super::Parser;
use crate::ast::{
    Constraint, ConstantDecl, Invariant, Language, Parameter, Provenance, Rule, SignalDecl,
    VectorScalarPair,
};
use crate::error::{ErrorKind, Locate, NewtonError};
use crate::first_follow::Production;
use crate::lexer::TokenKind;
use crate::physics::PhysicsId;
use crate::scope::ScopeId;

impl<'a> Parser<'a> {
    /// `IDENT ':' 'signal' '=' '{' name symbol? derivation '}'`
    ///
    /// A base signal (`derivation = none`) allocates a fresh Dimension and
    /// puts it in its own numerator. A derived signal copies the dimension
    /// vectors of its derivation expression.
    pub(super) fn parse_signal(&mut self, scope: ScopeId) -> Result<Rule, NewtonError> {
        let (identifier, prov) = self.take_identifier(Production::SignalDecl)?;
        self.expect(TokenKind::Colon, Production::SignalDecl)?;
        self.expect(TokenKind::Signal, Production::SignalDecl)?;
        self.expect(TokenKind::Equals, Production::SignalDecl)?;
        self.expect(TokenKind::LBrace, Production::SignalDecl)?;

        self.expect(TokenKind::Name, Production::SignalDecl)?;
        self.expect(TokenKind::Equals, Production::SignalDecl)?;
        let unit_name = self.take_string(Production::SignalDecl)?;
        let language = match self.kind(1) {
            TokenKind::English => Some(Language::English),
            TokenKind::Spanish => Some(Language::Spanish),
            _ => None,
        };
        if language.is_some() {
            self.get();
        }
        let mut symbol = None;
        if self.kind(1) == TokenKind::Equals {
            self.get();
            symbol = Some(self.take_string(Production::SignalDecl)?);
        }
        self.skip_separator();

        if self.kind(1) == TokenKind::Symbol {
            self.get();
            self.expect(TokenKind::Equals, Production::SignalDecl)?;
            symbol = Some(self.take_string(Production::SignalDecl)?);
            self.skip_separator();
        }

        self.expect(TokenKind::Derivation, Production::SignalDecl)?;
        self.expect(TokenKind::Equals, Production::SignalDecl)?;
        let derivation = if self.kind(1) == TokenKind::None {
            self.get();
            None
        } else {
            Some(self.parse_quantity_expression(scope)?)
        };
        self.skip_separator();
        self.expect(TokenKind::RBrace, Production::SignalDecl)?;
        if self.kind(1) == TokenKind::Semicolon {
            self.get();
        }

        tracing::debug!(%identifier, line = prov.line, base = derivation.is_none(), "signal");
        let symbols = &mut self.session.symbols;
        let physics = symbols.add_physics(scope, &identifier, prov.clone());
        let mut dimension = None;
        match &derivation {
            None => {
                let abbreviation = symbol.as_deref().unwrap_or(&identifier);
                let dim_id = symbols
                    .add_dimension(scope, &identifier, &unit_name, abbreviation, prov.clone())
                    .located(&prov)?;
                let dim = symbols.dimension(dim_id).clone();
                symbols
                    .physics_mut(physics)
                    .add_numerator_dimension(&dim)
                    .located(&prov)?;
                dimension = Some(dim_id);
            }
            Some(expr) => {
                let p = symbols.physics_mut(physics);
                p.copy_dimensions(&expr.physics).located(&expr.prov)?;
                p.is_vector = expr.physics.is_vector;
            }
        }
        let p = symbols.physics_mut(physics);
        p.dimension_alias = Some(unit_name.clone());
        p.dimension_alias_abbreviation = symbol.clone();
        symbols.assign_physics_id(physics).located(&prov)?;

        Ok(Rule::Signal(SignalDecl {
            identifier,
            physics,
            unit_name,
            language,
            symbol,
            derivation,
            dimension,
            prov,
        }))
    }

    /// `IDENT ':' 'constant' '=' quantityExpression ';'`
    pub(super) fn parse_constant(&mut self, scope: ScopeId) -> Result<Rule, NewtonError> {
        let (identifier, prov) = self.take_identifier(Production::ConstantDecl)?;
        self.expect(TokenKind::Colon, Production::ConstantDecl)?;
        self.expect(TokenKind::Constant, Production::ConstantDecl)?;
        self.expect(TokenKind::Equals, Production::ConstantDecl)?;
        let expr = self.parse_quantity_expression(scope)?;
        self.expect(TokenKind::Semicolon, Production::ConstantDecl)?;

        let symbols = &mut self.session.symbols;
        if let Some(previous) = symbols.lookup_physics(scope, &identifier) {
            if symbols.physics(previous).is_vector && !expr.physics.is_vector {
                return Err(NewtonError::at(
                    ErrorKind::NonVectorOperand {
                        operator: format!("vector constant '{}'", identifier),
                    },
                    &expr.prov,
                ));
            }
        }

        tracing::debug!(%identifier, line = prov.line, value = ?expr.value, "constant");
        let physics = symbols.add_physics(scope, &identifier, prov.clone());
        let p = symbols.physics_mut(physics);
        p.copy_dimensions(&expr.physics).located(&expr.prov)?;
        p.is_vector = expr.physics.is_vector;
        p.value = expr.value;
        p.is_constant = true;
        symbols.assign_physics_id(physics).located(&prov)?;

        Ok(Rule::Constant(ConstantDecl {
            identifier,
            physics,
            expr,
            prov,
        }))
    }

    /// `IDENT ':' 'invariant' parameterTuple '=' '{' constraint (',' constraint)* '}'`
    ///
    /// The body is parsed in its own scope carrying the parameter list, so
    /// constraints may refer to parameters by their bound names.
    pub(super) fn parse_invariant(&mut self, scope: ScopeId) -> Result<Rule, NewtonError> {
        let (name, prov) = self.take_identifier(Production::InvariantDecl)?;
        self.expect(TokenKind::Colon, Production::InvariantDecl)?;
        self.expect(TokenKind::Invariant, Production::InvariantDecl)?;
        let parameters = self.parse_parameter_tuple(scope)?;
        self.expect(TokenKind::Equals, Production::InvariantDecl)?;
        let open = self.expect(TokenKind::LBrace, Production::InvariantDecl)?;

        let begin = self.prov_of(&open);
        let body = self.session.symbols.open_scope(scope, begin);
        self.session
            .symbols
            .set_invariant_parameters(body, parameters.clone());

        let mut constraints = vec![self.parse_constraint(body)?];
        while self.kind(1) == TokenKind::Comma {
            self.get();
            if self.kind(1) == TokenKind::RBrace {
                break;
            }
            constraints.push(self.parse_constraint(body)?);
        }
        let close = self.expect(TokenKind::RBrace, Production::InvariantDecl)?;
        if self.kind(1) == TokenKind::Semicolon {
            self.get();
        }
        let end = self.prov_of(&close);
        self.session.symbols.close_scope(body, end);

        // Wraps on overflow: the id identifies a parameter-type combination
        // and is only ever compared for equality.
        let id = parameters.iter().fold(1u64, |acc, p| {
            acc.wrapping_mul(self.session.symbols.physics(p.physics).id)
        });

        let invariant = self.session.register_invariant(Invariant {
            name,
            id,
            parameters,
            constraints,
            scope: body,
            prov: prov.clone(),
        });
        Ok(Rule::Invariant { invariant, prov })
    }

    /// `'(' parameter (',' parameter)* ')'`
    fn parse_parameter_tuple(&mut self, scope: ScopeId) -> Result<Vec<Parameter>, NewtonError> {
        self.expect(TokenKind::LParen, Production::ParameterTuple)?;
        let mut parameters = vec![self.parse_parameter(scope, 0)?];
        while self.kind(1) == TokenKind::Comma {
            self.get();
            let number = parameters.len();
            parameters.push(self.parse_parameter(scope, number)?);
        }
        self.expect(TokenKind::RParen, Production::ParameterTuple)?;
        Ok(parameters)
    }

    /// `IDENT ':' IDENT`, binding a name to a Physics type.
    fn parse_parameter(&mut self, scope: ScopeId, number: usize) -> Result<Parameter, NewtonError> {
        let (name, prov) = self.take_identifier(Production::Parameter)?;
        self.expect(TokenKind::Colon, Production::Parameter)?;
        let (type_name, type_prov) = self.take_identifier(Production::Parameter)?;
        let physics = self.resolve_type_name(scope, &type_name, &type_prov)?;
        Ok(Parameter {
            name,
            type_name,
            physics,
            number,
            prov,
        })
    }

    fn resolve_type_name(
        &self,
        scope: ScopeId,
        type_name: &str,
        prov: &Provenance,
    ) -> Result<PhysicsId, NewtonError> {
        let symbols = &self.session.symbols;
        symbols
            .lookup_physics(scope, type_name)
            .or_else(|| symbols.lookup_physics_by_dimension_alias(scope, type_name))
            .ok_or_else(|| {
                NewtonError::at(ErrorKind::UseBeforeDefinition(type_name.to_owned()), prov)
            })
    }

    /// `quantityExpression compareOp quantityExpression`. Both sides must
    /// agree dimensionally unless the operator is proportionality.
    fn parse_constraint(&mut self, scope: ScopeId) -> Result<Constraint, NewtonError> {
        let prov = self.prov();
        if !self.in_first(Production::Constraint) {
            return Err(self.syntax_error(Production::Constraint));
        }
        let left = self.parse_quantity_expression(scope)?;
        let op = self.parse_compare_op()?;
        let right = self.parse_quantity_expression(scope)?;

        if op.requires_matching_dimensions() && !left.physics.same_dimensions(&right.physics) {
            return Err(NewtonError::at(
                ErrorKind::DimensionMismatch {
                    expected: left.physics.unit_string(),
                    found: right.physics.unit_string(),
                },
                &right.prov,
            ));
        }
        Ok(Constraint {
            left,
            op,
            right,
            prov,
        })
    }

    /// `'vectorScalarPairs' '=' '{' (IDENT ':' IDENT ';')* '}'`
    ///
    /// Marks each left-hand Physics as a vector and links it with its
    /// scalar counterpart.
    pub(super) fn parse_vector_scalar_pairs(&mut self, scope: ScopeId) -> Result<Rule, NewtonError> {
        let prov = self.prov();
        self.expect(TokenKind::VectorScalarPairs, Production::VectorScalarPairs)?;
        self.expect(TokenKind::Equals, Production::VectorScalarPairs)?;
        self.expect(TokenKind::LBrace, Production::VectorScalarPairs)?;

        let mut pairs = Vec::new();
        while self.kind(1) == TokenKind::Identifier {
            let (vector_name, pair_prov) = self.take_identifier(Production::VectorScalarPairs)?;
            self.expect(TokenKind::Colon, Production::VectorScalarPairs)?;
            let (scalar_name, scalar_prov) = self.take_identifier(Production::VectorScalarPairs)?;
            self.skip_separator();

            let vector = self.resolve_type_name(scope, &vector_name, &pair_prov)?;
            let scalar = self.resolve_type_name(scope, &scalar_name, &scalar_prov)?;
            let symbols = &mut self.session.symbols;
            let v = symbols.physics_mut(vector);
            v.is_vector = true;
            v.scalar_counterpart = Some(scalar);
            symbols.physics_mut(scalar).vector_counterpart = Some(vector);
            pairs.push(VectorScalarPair {
                vector,
                scalar,
                prov: pair_prov,
            });
        }
        self.expect(TokenKind::RBrace, Production::VectorScalarPairs)?;
        if self.kind(1) == TokenKind::Semicolon {
            self.get();
        }
        Ok(Rule::VectorScalarPairs { pairs, prov })
    }
}

#[cfg(test)]
mod tests {
    use crate::error::ErrorKind;
    use crate::lexer;
    use crate::parser::parse;
    use crate::physics::BIG_NUMBER_OFFSET;
    use crate::session::CompilationSession;

    fn compile(src: &str) -> Result<CompilationSession, crate::error::NewtonError> {
        let tokens = lexer::lex(src, "decl.nt")?;
        let mut session = CompilationSession::new("decl.nt");
        parse(&tokens, &mut session)?;
        Ok(session)
    }

    const KINEMATICS: &str = r#"
distance : signal = {
    name = "meter" English;
    symbol = "m";
    derivation = none;
}
time : signal = {
    name = "second" English;
    symbol = "s";
    derivation = none;
}
speed : signal = {
    name = "speed" English;
    symbol = "mps";
    derivation = distance / time;
}
"#;

    #[test]
    fn base_signal_records_unit_alias_and_dimension() {
        let s = compile(KINEMATICS).unwrap();
        let distance = s.physics_by_name("distance").unwrap();
        assert_eq!(distance.dimension_alias.as_deref(), Some("meter"));
        assert_eq!(distance.dimension_alias_abbreviation.as_deref(), Some("m"));
        assert_eq!(distance.numerator_prime_product(), 2);
        assert_eq!(distance.id, 2);
        assert_eq!(s.symbols().dimensions().len(), 2);
        assert_eq!(s.symbols().dimensions()[1].name, "second");
    }

    #[test]
    fn derived_signal_copies_its_derivation() {
        let s = compile(KINEMATICS).unwrap();
        let speed = s.physics_by_name("speed").unwrap();
        assert_eq!(speed.numerator_prime_product(), 2);
        assert_eq!(speed.denominator_prime_product(), 3);
        assert_eq!(speed.unit_string(), "m/s");
        assert_eq!(speed.id, 2 + 3 * BIG_NUMBER_OFFSET);
        // found by its unit alias as well as its identifier
        assert_eq!(
            s.physics_by_name("meter").map(|p| p.id),
            Some(2)
        );
    }

    #[test]
    fn ids_use_zero_for_an_empty_side() {
        let src = format!(
            "{}\nfrequency : signal = {{ name = \"hertz\" English; symbol = \"Hz\"; derivation = 1 / time; }}\n",
            KINEMATICS
        );
        let s = compile(&src).unwrap();
        let id_of = |name: &str| s.physics_by_name(name).unwrap().id;
        assert_eq!(id_of("distance"), 2);
        assert_eq!(id_of("time"), 3);
        assert_eq!(id_of("frequency"), 3 * BIG_NUMBER_OFFSET);
        assert_eq!(id_of("speed"), 2 + 3 * BIG_NUMBER_OFFSET);
    }

    #[test]
    fn name_shorthand_sets_the_symbol() {
        let s = compile(r#"mass : signal = { name = "kilogram" = "kg"; derivation = none; }"#)
            .unwrap();
        let mass = s.physics_by_name("mass").unwrap();
        assert_eq!(mass.dimension_alias_abbreviation.as_deref(), Some("kg"));
        assert_eq!(s.symbols().dimensions()[0].abbreviation, "kg");
    }

    #[test]
    fn constant_keeps_value_and_dimensions() {
        let src = format!("{}\ng : constant = 9.81 * distance / time ** 2;\ntwo : constant = 2;\n", KINEMATICS);
        let s = compile(&src).unwrap();
        let g = s.physics_by_name("g").unwrap();
        assert!(g.is_constant);
        assert_eq!(g.unit_string(), "m/s*s");
        assert_eq!(g.value, Some(9.81));
        let two = s.physics_by_name("two").unwrap();
        assert_eq!(two.value, Some(2.0));
        assert!(two.is_dimensionless());
        // dimensionless ids come from the prime sequence after distance(2) and time(3)
        assert_eq!(two.id, 5);
    }

    #[test]
    fn invariant_parameters_resolve_by_bound_name() {
        let src = format!(
            "{}\nmotion : invariant (d : distance, t : time, v : speed) = {{ v == d / t, d ~ v * t }}\n",
            KINEMATICS
        );
        let s = compile(&src).unwrap();
        let inv = s.invariant("motion").unwrap();
        assert_eq!(inv.constraints.len(), 2);
        assert_eq!(inv.parameters.iter().map(|p| p.number).collect::<Vec<_>>(), vec![0, 1, 2]);
        assert_eq!(inv.parameter_type("t"), Some("time"));
        assert_eq!(inv.parameter_bound_to("speed"), Some("v"));
        let id_of = |name: &str| s.physics_by_name(name).unwrap().id;
        assert_eq!(inv.id, id_of("distance") * id_of("time") * id_of("speed"));
        assert_eq!(
            s.invariant_by_parameters(&["speed", "distance", "time"]).map(|i| i.name.as_str()),
            Some("motion")
        );
        let body = s.symbols().scope(inv.scope);
        assert_eq!(body.parent, Some(s.root_scope()));
        assert!(body.end.is_some());
    }

    #[test]
    fn invariants_keep_declaration_order() {
        let src = format!(
            "{}\nfirst : invariant (d : distance) = {{ d == d }}\nsecond : invariant (t : time) = {{ t == t }}\n",
            KINEMATICS
        );
        let s = compile(&src).unwrap();
        let names: Vec<_> = s.invariants().iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["first", "second"]);
    }

    #[test]
    fn proportionality_allows_different_dimensions() {
        let src = format!("{}\np : invariant (d : distance, t : time) = {{ d @< t }}\n", KINEMATICS);
        assert!(compile(&src).is_ok());
        let src = format!("{}\np : invariant (d : distance, t : time) = {{ d < t }}\n", KINEMATICS);
        let err = compile(&src).unwrap_err();
        assert!(err.is_dimensional());
    }

    #[test]
    fn unknown_parameter_type_is_use_before_definition() {
        let src = format!("{}\np : invariant (x : mass) = {{ x == x }}\n", KINEMATICS);
        let err = compile(&src).unwrap_err();
        assert_eq!(err.kind, ErrorKind::UseBeforeDefinition("mass".into()));
    }

    #[test]
    fn vector_scalar_pairs_link_counterparts() {
        let src = format!(
            "{}\nvelocity : signal = {{ name = \"velocity\"; symbol = \"v\"; derivation = distance / time; }}\nvectorScalarPairs = {{ velocity : speed; }}\n",
            KINEMATICS
        );
        let s = compile(&src).unwrap();
        let velocity_id = s.physics_id_by_name("velocity").unwrap();
        let speed_id = s.physics_id_by_name("speed").unwrap();
        let velocity = s.symbols().physics(velocity_id);
        assert!(velocity.is_vector);
        assert_eq!(velocity.scalar_counterpart, Some(speed_id));
        assert_eq!(s.symbols().physics(speed_id).vector_counterpart, Some(velocity_id));
    }

    #[test]
    fn scalar_constant_cannot_redefine_a_vector() {
        let src = format!(
            "{}\nvectorScalarPairs = {{ speed : distance; }}\nspeed : constant = distance / time;\n",
            KINEMATICS
        );
        let err = compile(&src).unwrap_err();
        assert!(matches!(err.kind, ErrorKind::NonVectorOperand { .. }));
    }
}
