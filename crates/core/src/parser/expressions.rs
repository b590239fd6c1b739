use super::Parser;
use crate::ast::{AddOp, CompareOp, Expr, ExprKind, MulOp, Provenance, TimeOp, VectorOp};
use crate::error::{ErrorKind, Locate, NewtonError};
use crate::first_follow::Production;
use crate::lexer::{Token, TokenKind};
use crate::physics::Physics;
use crate::scope::ScopeId;

/// Unit names under which the angular dimension of a cross product is found.
const RADIAN_UNITS: [&str; 2] = ["radian", "rad"];

fn combine_values(a: Option<f64>, b: Option<f64>, f: impl Fn(f64, f64) -> f64) -> Option<f64> {
    match (a, b) {
        (Some(a), Some(b)) => Some(f(a, b)),
        _ => None,
    }
}

/// Terms fold only the factors that carry a value; signal factors with no
/// value are skipped. A term with no known factor has no value.
fn fold_term_value(acc: Option<f64>, right: Option<f64>, op: MulOp) -> Option<f64> {
    match (acc, right) {
        (Some(a), Some(b)) => Some(op.apply(a, b)),
        (Some(a), None) => Some(a),
        (None, Some(b)) => Some(op.apply(1.0, b)),
        (None, None) => None,
    }
}

impl<'a> Parser<'a> {
    // -- Quantity expressions -----------------------------------

    /// `quantityTerm (lowOp quantityTerm)*`. Both sides of `+`/`-` must have
    /// equal numerator and denominator prime products.
    pub(super) fn parse_quantity_expression(&mut self, scope: ScopeId) -> Result<Expr, NewtonError> {
        let prov = self.prov();
        let first = self.parse_quantity_term(scope)?;
        if !self.in_first(Production::LowPrecedenceBinaryOp) {
            return Ok(first);
        }

        let mut physics = Physics::anonymous();
        physics.copy_dimensions(&first.physics).located(&prov)?;
        physics.is_vector = first.physics.is_vector;
        let mut value = first.value;
        let mut rest = Vec::new();

        while self.in_first(Production::LowPrecedenceBinaryOp) {
            let op = match self.get().token {
                Token::Plus => AddOp::Add,
                _ => AddOp::Subtract,
            };
            let right = self.parse_quantity_term(scope)?;
            if !physics.same_dimensions(&right.physics) {
                return Err(NewtonError::at(
                    ErrorKind::DimensionMismatch {
                        expected: physics.unit_string(),
                        found: right.physics.unit_string(),
                    },
                    &right.prov,
                ));
            }
            physics.is_vector |= right.physics.is_vector;
            value = combine_values(value, right.value, |a, b| op.apply(a, b));
            rest.push((op, right));
        }

        Ok(Expr {
            kind: ExprKind::Sum {
                first: Box::new(first),
                rest,
            },
            physics,
            value,
            prov,
        })
    }

    /// `'-'? quantityFactor (midOp quantityFactor)*`.
    ///
    /// A term is a vector iff exactly one of its factors is. Shared
    /// dimensions cancel after each multiplication or division.
    fn parse_quantity_term(&mut self, scope: ScopeId) -> Result<Expr, NewtonError> {
        let prov = self.prov();
        let negated = self.in_first(Production::UnaryOp);
        if negated {
            self.get();
        }
        let mut first = self.parse_quantity_factor(scope)?;
        if negated {
            first = negate(first, prov.clone());
        }
        if !self.in_first(Production::MidPrecedenceBinaryOp) {
            return Ok(first);
        }

        let mut physics = Physics::anonymous();
        physics.copy_dimensions(&first.physics).located(&prov)?;
        let mut vector_count = usize::from(first.physics.is_vector);
        let mut value = first.value;
        let mut rest = Vec::new();

        while self.in_first(Production::MidPrecedenceBinaryOp) {
            let op = match self.get().token {
                Token::Star => MulOp::Multiply,
                _ => MulOp::Divide,
            };
            let right = self.parse_quantity_factor(scope)?;
            if right.physics.is_vector {
                vector_count += 1;
                if vector_count >= 2 {
                    return Err(NewtonError::at(ErrorKind::IllegalVectorVectorOp, &right.prov));
                }
            }
            let combined = match op {
                MulOp::Multiply => physics.copy_dimensions(&right.physics),
                MulOp::Divide => physics.divide_by(&right.physics),
            };
            combined.located(&right.prov)?;
            physics.cancel_common_dimensions();
            value = fold_term_value(value, right.value, op);
            rest.push((op, right));
        }
        physics.is_vector = vector_count == 1;

        Ok(Expr {
            kind: ExprKind::Product {
                first: Box::new(first),
                rest,
            },
            physics,
            value,
            prov,
        })
    }

    /// An identifier, number, parenthesized expression, time operator or
    /// vector operator, optionally raised to an exponent.
    fn parse_quantity_factor(&mut self, scope: ScopeId) -> Result<Expr, NewtonError> {
        let base = match self.kind(1) {
            TokenKind::Identifier => self.parse_identifier_usage(scope)?,
            TokenKind::Number => self.parse_number()?,
            TokenKind::LParen => {
                self.get();
                let inner = self.parse_quantity_expression(scope)?;
                self.expect(TokenKind::RParen, Production::QuantityFactor)?;
                inner
            }
            TokenKind::Derivative | TokenKind::Integral => self.parse_time_op(scope)?,
            TokenKind::Dot | TokenKind::Cross => self.parse_vector_op(scope)?,
            _ => return Err(self.syntax_error(Production::QuantityFactor)),
        };
        self.parse_optional_exponent(base, scope)
    }

    fn parse_identifier_usage(&mut self, scope: ScopeId) -> Result<Expr, NewtonError> {
        let (name, prov) = self.take_identifier(Production::QuantityFactor)?;
        let resolved = self.resolve_identifier(scope, &name, &prov)?;
        let physics = self.session.symbols.physics(resolved).clone();
        Ok(Expr {
            value: physics.value,
            kind: ExprKind::Identifier { name, resolved },
            physics,
            prov,
        })
    }

    fn parse_number(&mut self) -> Result<Expr, NewtonError> {
        let prov = self.prov();
        let Some(n) = self.peek(1).number() else {
            return Err(self.syntax_error_expecting(
                Production::QuantityFactor,
                &[TokenKind::Number],
                1,
            ));
        };
        self.get();
        Ok(Expr {
            kind: ExprKind::Number(n),
            physics: Physics::anonymous(),
            value: Some(n),
            prov,
        })
    }

    /// `('derivative' | 'integral')+ quantityFactor`. The operand's Physics
    /// passes through unchanged.
    fn parse_time_op(&mut self, scope: ScopeId) -> Result<Expr, NewtonError> {
        let prov = self.prov();
        let mut ops = Vec::new();
        while self.in_first(Production::TimeOp) {
            ops.push(match self.get().token {
                Token::Derivative => TimeOp::Derivative,
                _ => TimeOp::Integral,
            });
        }
        let operand = self.parse_quantity_factor(scope)?;
        let mut physics = Physics::anonymous();
        physics.copy_dimensions(&operand.physics).located(&prov)?;
        physics.is_vector = operand.physics.is_vector;
        Ok(Expr {
            kind: ExprKind::Time {
                ops,
                operand: Box::new(operand),
            },
            physics,
            value: None,
            prov,
        })
    }

    /// `('dot' | 'cross') '(' quantityExpression ',' quantityExpression ')'`.
    ///
    /// Both operands must be vectors. The result carries both operands'
    /// dimensions; a cross product is a vector with an extra radian in the
    /// denominator, a dot product is a scalar.
    fn parse_vector_op(&mut self, scope: ScopeId) -> Result<Expr, NewtonError> {
        let prov = self.prov();
        let op = match self.get().token {
            Token::Dot => VectorOp::Dot,
            _ => VectorOp::Cross,
        };
        self.expect(TokenKind::LParen, Production::VectorOp)?;
        let left = self.parse_quantity_expression(scope)?;
        self.expect(TokenKind::Comma, Production::VectorOp)?;
        let right = self.parse_quantity_expression(scope)?;
        self.expect(TokenKind::RParen, Production::VectorOp)?;

        for operand in [&left, &right] {
            if !operand.physics.is_vector {
                return Err(NewtonError::at(
                    ErrorKind::NonVectorOperand {
                        operator: op.as_str().to_owned(),
                    },
                    &operand.prov,
                ));
            }
        }

        let mut physics = Physics::anonymous();
        physics.copy_dimensions(&left.physics).located(&prov)?;
        physics.copy_dimensions(&right.physics).located(&prov)?;
        if op == VectorOp::Cross {
            let radian = RADIAN_UNITS
                .iter()
                .find_map(|unit| self.session.symbols.lookup_dimension_by_unit(scope, unit))
                .ok_or_else(|| {
                    NewtonError::at(ErrorKind::UnknownDimension("radian".to_owned()), &prov)
                })?;
            let radian = self.session.symbols.dimension(radian).clone();
            physics.add_denominator_dimension(&radian).located(&prov)?;
            physics.is_vector = true;
        }

        Ok(Expr {
            kind: ExprKind::Vector {
                op,
                left: Box::new(left),
                right: Box::new(right),
            },
            physics,
            value: None,
            prov,
        })
    }

    // -- Exponents ----------------------------------------------

    fn parse_optional_exponent(&mut self, base: Expr, scope: ScopeId) -> Result<Expr, NewtonError> {
        if !self.in_first(Production::HighPrecedenceBinaryOp) {
            return Ok(base);
        }
        self.get();
        let exponent = self.parse_exponent(scope)?;
        raise(base, exponent)
    }

    /// `'-'? NUMBER | '(' numericExpression ')'`.
    fn parse_exponent(&mut self, scope: ScopeId) -> Result<Expr, NewtonError> {
        match self.kind(1) {
            TokenKind::LParen => self.parse_numeric_factor(scope),
            TokenKind::Minus | TokenKind::Number => self.parse_integer(),
            _ => Err(self.syntax_error(Production::Exponent)),
        }
    }

    fn parse_integer(&mut self) -> Result<Expr, NewtonError> {
        let prov = self.prov();
        let negated = self.kind(1) == TokenKind::Minus;
        if negated {
            self.get();
        }
        if self.kind(1) != TokenKind::Number {
            return Err(self.syntax_error(Production::Integer));
        }
        let number = self.parse_number()?;
        Ok(if negated { negate(number, prov) } else { number })
    }

    // -- Numeric expressions ------------------------------------

    /// The dimensionless path used for exponents: every node has a value.
    pub(super) fn parse_numeric_expression(&mut self, scope: ScopeId) -> Result<Expr, NewtonError> {
        let prov = self.prov();
        let first = self.parse_numeric_term(scope)?;
        if !self.in_first(Production::LowPrecedenceBinaryOp) {
            return Ok(first);
        }
        let mut value = first.value;
        let mut rest = Vec::new();
        while self.in_first(Production::LowPrecedenceBinaryOp) {
            let op = match self.get().token {
                Token::Plus => AddOp::Add,
                _ => AddOp::Subtract,
            };
            let right = self.parse_numeric_term(scope)?;
            value = combine_values(value, right.value, |a, b| op.apply(a, b));
            rest.push((op, right));
        }
        Ok(Expr {
            kind: ExprKind::Sum {
                first: Box::new(first),
                rest,
            },
            physics: Physics::anonymous(),
            value,
            prov,
        })
    }

    fn parse_numeric_term(&mut self, scope: ScopeId) -> Result<Expr, NewtonError> {
        let prov = self.prov();
        let negated = self.in_first(Production::UnaryOp);
        if negated {
            self.get();
        }
        let mut first = self.parse_numeric_factor(scope)?;
        if negated {
            first = negate(first, prov.clone());
        }
        if !self.in_first(Production::MidPrecedenceBinaryOp) {
            return Ok(first);
        }
        let mut value = first.value;
        let mut rest = Vec::new();
        while self.in_first(Production::MidPrecedenceBinaryOp) {
            let op = match self.get().token {
                Token::Star => MulOp::Multiply,
                _ => MulOp::Divide,
            };
            let right = self.parse_numeric_factor(scope)?;
            value = combine_values(value, right.value, |a, b| op.apply(a, b));
            rest.push((op, right));
        }
        Ok(Expr {
            kind: ExprKind::Product {
                first: Box::new(first),
                rest,
            },
            physics: Physics::anonymous(),
            value,
            prov,
        })
    }

    fn parse_numeric_factor(&mut self, scope: ScopeId) -> Result<Expr, NewtonError> {
        let base = match self.kind(1) {
            TokenKind::Identifier => {
                let (name, prov) = self.take_identifier(Production::NumericFactor)?;
                let resolved = self.resolve_identifier(scope, &name, &prov)?;
                let constant = self.session.symbols.physics(resolved);
                let value = match constant.value {
                    Some(v) if constant.is_constant => v,
                    _ => {
                        return Err(NewtonError::at(
                            ErrorKind::NotCompileTimeConstant(name),
                            &prov,
                        ))
                    }
                };
                Expr {
                    kind: ExprKind::Identifier { name, resolved },
                    physics: Physics::anonymous(),
                    value: Some(value),
                    prov,
                }
            }
            TokenKind::Number => self.parse_number()?,
            TokenKind::LParen => {
                self.get();
                let inner = self.parse_numeric_expression(scope)?;
                self.expect(TokenKind::RParen, Production::NumericFactor)?;
                inner
            }
            _ => return Err(self.syntax_error(Production::NumericFactor)),
        };
        self.parse_optional_exponent(base, scope)
    }

    // -- Comparisons --------------------------------------------

    pub(super) fn parse_compare_op(&mut self) -> Result<CompareOp, NewtonError> {
        let op = match self.kind(1) {
            TokenKind::Lt => CompareOp::Lt,
            TokenKind::Le => CompareOp::Le,
            TokenKind::Gt => CompareOp::Gt,
            TokenKind::Ge => CompareOp::Ge,
            TokenKind::EqualEqual => CompareOp::Eq,
            TokenKind::Proportional => CompareOp::Proportional,
            TokenKind::Equivalent => CompareOp::Equivalent,
            _ => return Err(self.syntax_error(Production::CompareOp)),
        };
        self.get();
        Ok(op)
    }
}

fn negate(operand: Expr, prov: Provenance) -> Expr {
    Expr {
        physics: operand.physics.clone(),
        value: operand.value.map(|v| -v),
        kind: ExprKind::Negate(Box::new(operand)),
        prov,
    }
}

/// Apply a parsed exponent to `base`.
///
/// The exponent always has a value (it comes from the numeric path). A
/// dimensioned base needs an integer exponent; `0 ** 0` is rejected.
fn raise(base: Expr, exponent: Expr) -> Result<Expr, NewtonError> {
    let prov = base.prov.clone();
    let Some(power) = exponent.value else {
        return Err(NewtonError::at(
            ErrorKind::NotCompileTimeConstant("exponent".to_owned()),
            &exponent.prov,
        ));
    };
    if base.value == Some(0.0) && power == 0.0 {
        return Err(NewtonError::at(ErrorKind::IndeterminateExponent, &prov));
    }

    let physics = if base.physics.is_dimensionless() {
        Physics::anonymous()
    } else {
        if !power.is_finite() || power.fract() != 0.0 {
            return Err(NewtonError::at(
                ErrorKind::NonIntegerExponent(power),
                &exponent.prov,
            ));
        }
        base.physics.raised_to(power as i64).located(&prov)?
    };
    let value = if power == 0.0 {
        Some(1.0)
    } else {
        base.value.map(|v| v.powf(power))
    };

    Ok(Expr {
        kind: ExprKind::Power {
            base: Box::new(base),
            exponent: Box::new(exponent),
        },
        physics,
        value,
        prov,
    })
}
