//! FIRST and FOLLOW sets of the Newton grammar.
//!
//! The parser is predictive: every choice between alternatives is made by
//! testing the next token against a FIRST set, and rule boundaries during
//! error recovery are recognised with FOLLOW(rule).

use crate::lexer::TokenKind;
use crate::lexer::TokenKind as T;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Production {
    Rule,
    SignalDecl,
    ConstantDecl,
    InvariantDecl,
    VectorScalarPairs,
    ParameterTuple,
    Parameter,
    Constraint,
    QuantityExpression,
    QuantityTerm,
    QuantityFactor,
    NumericExpression,
    NumericTerm,
    NumericFactor,
    Exponent,
    Integer,
    UnaryOp,
    LowPrecedenceBinaryOp,
    MidPrecedenceBinaryOp,
    HighPrecedenceBinaryOp,
    CompareOp,
    TimeOp,
    VectorOp,
}

impl Production {
    pub fn name(self) -> &'static str {
        match self {
            Production::Rule => "rule",
            Production::SignalDecl => "signal declaration",
            Production::ConstantDecl => "constant declaration",
            Production::InvariantDecl => "invariant declaration",
            Production::VectorScalarPairs => "vectorScalarPairs",
            Production::ParameterTuple => "parameter tuple",
            Production::Parameter => "parameter",
            Production::Constraint => "constraint",
            Production::QuantityExpression => "quantity expression",
            Production::QuantityTerm => "quantity term",
            Production::QuantityFactor => "quantity factor",
            Production::NumericExpression => "numeric expression",
            Production::NumericTerm => "numeric term",
            Production::NumericFactor => "numeric factor",
            Production::Exponent => "exponent",
            Production::Integer => "integer",
            Production::UnaryOp => "unary operator",
            Production::LowPrecedenceBinaryOp => "low-precedence operator",
            Production::MidPrecedenceBinaryOp => "mid-precedence operator",
            Production::HighPrecedenceBinaryOp => "high-precedence operator",
            Production::CompareOp => "comparison operator",
            Production::TimeOp => "time operator",
            Production::VectorOp => "vector operator",
        }
    }
}

impl fmt::Display for Production {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

const RULE_FIRST: &[TokenKind] = &[T::Identifier, T::VectorScalarPairs];
const FACTOR_FIRST: &[TokenKind] = &[
    T::Identifier,
    T::Number,
    T::LParen,
    T::Derivative,
    T::Integral,
    T::Dot,
    T::Cross,
];
const EXPRESSION_FIRST: &[TokenKind] = &[
    T::Minus,
    T::Identifier,
    T::Number,
    T::LParen,
    T::Derivative,
    T::Integral,
    T::Dot,
    T::Cross,
];
const NUMERIC_FACTOR_FIRST: &[TokenKind] = &[T::Identifier, T::Number, T::LParen];
const NUMERIC_EXPRESSION_FIRST: &[TokenKind] = &[T::Minus, T::Identifier, T::Number, T::LParen];
const COMPARE_FIRST: &[TokenKind] = &[
    T::Lt,
    T::Le,
    T::Gt,
    T::Ge,
    T::EqualEqual,
    T::Proportional,
    T::Equivalent,
];

pub fn first(production: Production) -> &'static [TokenKind] {
    match production {
        Production::Rule => RULE_FIRST,
        Production::SignalDecl | Production::ConstantDecl | Production::InvariantDecl => {
            &[T::Identifier]
        }
        Production::VectorScalarPairs => &[T::VectorScalarPairs],
        Production::ParameterTuple => &[T::LParen],
        Production::Parameter => &[T::Identifier],
        Production::Constraint | Production::QuantityExpression | Production::QuantityTerm => {
            EXPRESSION_FIRST
        }
        Production::QuantityFactor => FACTOR_FIRST,
        Production::NumericExpression | Production::NumericTerm => NUMERIC_EXPRESSION_FIRST,
        Production::NumericFactor => NUMERIC_FACTOR_FIRST,
        Production::Exponent => &[T::Minus, T::Number, T::LParen],
        Production::Integer => &[T::Minus, T::Number],
        Production::UnaryOp => &[T::Minus],
        Production::LowPrecedenceBinaryOp => &[T::Plus, T::Minus],
        Production::MidPrecedenceBinaryOp => &[T::Star, T::Slash],
        Production::HighPrecedenceBinaryOp => &[T::StarStar],
        Production::CompareOp => COMPARE_FIRST,
        Production::TimeOp => &[T::Derivative, T::Integral],
        Production::VectorOp => &[T::Dot, T::Cross],
    }
}

const RULE_FOLLOW: &[TokenKind] = &[T::Identifier, T::VectorScalarPairs, T::Eof];
const EXPRESSION_FOLLOW: &[TokenKind] = &[
    T::Semicolon,
    T::Comma,
    T::RParen,
    T::RBrace,
    T::Lt,
    T::Le,
    T::Gt,
    T::Ge,
    T::EqualEqual,
    T::Proportional,
    T::Equivalent,
];
const TERM_FOLLOW: &[TokenKind] = &[
    T::Plus,
    T::Minus,
    T::Semicolon,
    T::Comma,
    T::RParen,
    T::RBrace,
    T::Lt,
    T::Le,
    T::Gt,
    T::Ge,
    T::EqualEqual,
    T::Proportional,
    T::Equivalent,
];
const FACTOR_FOLLOW: &[TokenKind] = &[
    T::Star,
    T::Slash,
    T::Plus,
    T::Minus,
    T::Semicolon,
    T::Comma,
    T::RParen,
    T::RBrace,
    T::Lt,
    T::Le,
    T::Gt,
    T::Ge,
    T::EqualEqual,
    T::Proportional,
    T::Equivalent,
];

pub fn follow(production: Production) -> &'static [TokenKind] {
    match production {
        Production::Rule
        | Production::SignalDecl
        | Production::ConstantDecl
        | Production::InvariantDecl
        | Production::VectorScalarPairs => RULE_FOLLOW,
        Production::ParameterTuple => &[T::Equals],
        Production::Parameter => &[T::Comma, T::RParen],
        Production::Constraint => &[T::Comma, T::RBrace],
        Production::QuantityExpression | Production::NumericExpression => EXPRESSION_FOLLOW,
        Production::QuantityTerm | Production::NumericTerm => TERM_FOLLOW,
        Production::QuantityFactor
        | Production::NumericFactor
        | Production::Exponent
        | Production::Integer => FACTOR_FOLLOW,
        Production::UnaryOp => FACTOR_FIRST,
        Production::LowPrecedenceBinaryOp => EXPRESSION_FIRST,
        Production::MidPrecedenceBinaryOp => FACTOR_FIRST,
        Production::HighPrecedenceBinaryOp => &[T::Minus, T::Number, T::LParen],
        Production::CompareOp => EXPRESSION_FIRST,
        Production::TimeOp => FACTOR_FIRST,
        Production::VectorOp => &[T::LParen],
    }
}

pub fn in_first(production: Production, kind: TokenKind) -> bool {
    first(production).contains(&kind)
}

pub fn in_follow(production: Production, kind: TokenKind) -> bool {
    follow(production).contains(&kind)
}

/// `'a', 'b' or 'c'`, for syntax error messages.
pub fn describe_set(kinds: &[TokenKind]) -> String {
    match kinds {
        [] => "nothing".to_owned(),
        [only] => only.describe().to_owned(),
        [init @ .., last] => format!(
            "{} or {}",
            init.iter()
                .map(|k| k.describe())
                .collect::<Vec<_>>()
                .join(", "),
            last.describe()
        ),
    }
}
