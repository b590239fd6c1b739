//! Predictive recursive-descent parser for Newton descriptions.
//! Every quantity-producing production computes its node's Physics as it
//! returns; declarations register Dimensions, Physics and Invariants in the
//! session while parsing.

use crate::ast::{Provenance, Rule};
use crate::error::{ErrorKind, NewtonError};
use crate::first_follow::{self, Production};
use crate::lexer::{Spanned, Token, TokenKind};
use crate::physics::PhysicsId;
use crate::scope::ScopeId;
use crate::session::CompilationSession;

mod declarations;
mod expressions;

// ──────────────────────────────────────────────
// Parser
// ──────────────────────────────────────────────

struct Parser<'a> {
    tokens: &'a [Spanned],
    pos: usize,
    filename: String,
    session: &'a mut CompilationSession,
}

impl<'a> Parser<'a> {
    fn new(tokens: &'a [Spanned], session: &'a mut CompilationSession) -> Self {
        Parser {
            tokens,
            pos: 0,
            filename: session.filename.clone(),
            session,
        }
    }

    /// The `k`-th token ahead, 1-based. Never runs past the final `Eof`.
    fn peek_spanned(&self, k: usize) -> &Spanned {
        let last = self.tokens.len() - 1;
        &self.tokens[(self.pos + k.max(1) - 1).min(last)]
    }

    fn peek(&self, k: usize) -> &Token {
        &self.peek_spanned(k).token
    }

    fn kind(&self, k: usize) -> TokenKind {
        self.peek(k).kind()
    }

    /// Consume the current token. The `Eof` token is never consumed.
    fn get(&mut self) -> Spanned {
        let t = self.peek_spanned(1).clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        tracing::trace!(token = %t.token, line = t.line, "consumed");
        t
    }

    fn prov_of(&self, s: &Spanned) -> Provenance {
        Provenance {
            file: self.filename.clone(),
            line: s.line,
            column: s.column,
            length: s.length,
        }
    }

    fn prov(&self) -> Provenance {
        self.prov_of(self.peek_spanned(1))
    }

    fn in_first(&self, production: Production) -> bool {
        first_follow::in_first(production, self.kind(1))
    }

    fn syntax_error(&self, production: Production) -> NewtonError {
        self.syntax_error_expecting(production, first_follow::first(production), 1)
    }

    /// Syntax error against the `k`-th token ahead.
    fn syntax_error_expecting(
        &self,
        production: Production,
        expected: &[TokenKind],
        k: usize,
    ) -> NewtonError {
        let found = self.peek_spanned(k);
        NewtonError::at(
            ErrorKind::Syntax {
                production: production.name().to_owned(),
                expected: first_follow::describe_set(expected),
                found: found.token.to_string(),
            },
            &self.prov_of(found),
        )
    }

    fn expect(&mut self, kind: TokenKind, production: Production) -> Result<Spanned, NewtonError> {
        if self.kind(1) == kind {
            Ok(self.get())
        } else {
            Err(self.syntax_error_expecting(production, &[kind], 1))
        }
    }

    fn take_identifier(
        &mut self,
        production: Production,
    ) -> Result<(String, Provenance), NewtonError> {
        let prov = self.prov();
        if let Token::Identifier(name) = self.peek(1).clone() {
            self.get();
            Ok((name, prov))
        } else {
            Err(self.syntax_error_expecting(production, &[TokenKind::Identifier], 1))
        }
    }

    fn take_string(&mut self, production: Production) -> Result<String, NewtonError> {
        if let Token::Str(s) = self.peek(1).clone() {
            self.get();
            Ok(s)
        } else {
            Err(self.syntax_error_expecting(production, &[TokenKind::Str], 1))
        }
    }

    /// Consume an optional `;` or `,` field separator.
    fn skip_separator(&mut self) {
        if matches!(self.kind(1), TokenKind::Semicolon | TokenKind::Comma) {
            self.get();
        }
    }

    // -- Identifier resolution ----------------------------------

    /// Resolve an identifier usage to a registered Physics: by identifier,
    /// then by unit alias, then through the enclosing invariant's parameter
    /// list (bound name to declared type name).
    fn resolve_identifier(
        &self,
        scope: ScopeId,
        name: &str,
        prov: &Provenance,
    ) -> Result<PhysicsId, NewtonError> {
        let symbols = &self.session.symbols;
        let direct = |n: &str| {
            symbols
                .lookup_physics(scope, n)
                .or_else(|| symbols.lookup_physics_by_dimension_alias(scope, n))
        };
        if let Some(id) = direct(name) {
            return Ok(id);
        }
        let via_parameter = symbols
            .invariant_parameters(scope)
            .and_then(|params| params.iter().find(|p| p.name == name))
            .and_then(|p| direct(&p.type_name));
        via_parameter
            .ok_or_else(|| NewtonError::at(ErrorKind::UseBeforeDefinition(name.to_owned()), prov))
    }

    // -- Top level ----------------------------------------------

    fn parse_file(&mut self) -> Result<(), NewtonError> {
        while self.kind(1) != TokenKind::Eof {
            let rule = self.parse_rule()?;
            self.session.push_rule(rule);
        }
        Ok(())
    }

    fn parse_rule(&mut self) -> Result<Rule, NewtonError> {
        let scope = self.session.symbols.root();
        if !self.in_first(Production::Rule) {
            return Err(self.syntax_error(Production::Rule));
        }
        if self.kind(1) == TokenKind::VectorScalarPairs {
            return self.parse_vector_scalar_pairs(scope);
        }
        if self.kind(2) != TokenKind::Colon {
            return Err(self.syntax_error_expecting(Production::Rule, &[TokenKind::Colon], 2));
        }
        match self.kind(3) {
            TokenKind::Signal => self.parse_signal(scope),
            TokenKind::Constant => self.parse_constant(scope),
            TokenKind::Invariant => self.parse_invariant(scope),
            _ => Err(self.syntax_error_expecting(
                Production::Rule,
                &[TokenKind::Signal, TokenKind::Constant, TokenKind::Invariant],
                3,
            )),
        }
    }
}

/// Parse a whole file into `session`, stopping at the first error.
pub fn parse(tokens: &[Spanned], session: &mut CompilationSession) -> Result<(), NewtonError> {
    if tokens.is_empty() {
        return Ok(());
    }
    let mut p = Parser::new(tokens, session);
    p.parse_file()
}

/// Parse in multi-error recovery mode.
///
/// Errors are recorded in the session's diagnostics. After an error the
/// parser skips to the next rule boundary and resumes, until `max_errors`
/// have been collected. Registry entries made by a broken rule are kept.
pub fn parse_recovering(tokens: &[Spanned], session: &mut CompilationSession, max_errors: usize) {
    if tokens.is_empty() {
        return;
    }
    let mut p = Parser::new(tokens, session);
    p.parse_file_recovering(max_errors);
}

impl<'a> Parser<'a> {
    /// A token in FOLLOW(rule) that begins a new rule.
    fn at_rule_start(&self) -> bool {
        if !first_follow::in_follow(Production::Rule, self.kind(1)) {
            return false;
        }
        match self.kind(1) {
            TokenKind::VectorScalarPairs => true,
            TokenKind::Identifier => {
                self.kind(2) == TokenKind::Colon
                    && matches!(
                        self.kind(3),
                        TokenKind::Signal | TokenKind::Constant | TokenKind::Invariant
                    )
            }
            _ => false,
        }
    }

    /// Skip tokens until the closing `}` of the broken rule, or the start of
    /// another rule at nesting level 0.
    fn recover_to_next_rule(&mut self, rule_start: usize) {
        let mut depth: i32 = 0;
        loop {
            match self.kind(1) {
                TokenKind::Eof => break,
                TokenKind::LBrace => depth += 1,
                TokenKind::RBrace => {
                    if depth <= 0 {
                        self.get();
                        if self.kind(1) == TokenKind::Semicolon {
                            self.get();
                        }
                        break;
                    }
                    depth -= 1;
                }
                _ => {
                    if depth == 0 && self.pos > rule_start && self.at_rule_start() {
                        break;
                    }
                }
            }
            self.get();
        }
    }

    fn parse_file_recovering(&mut self, max_errors: usize) {
        while self.kind(1) != TokenKind::Eof {
            let rule_start = self.pos;
            match self.parse_rule() {
                Ok(rule) => self.session.push_rule(rule),
                Err(e) => {
                    tracing::debug!(error = %e, "recovering from error");
                    self.session.diagnostics.push(e);
                    if self.session.diagnostics.len() >= max_errors {
                        break;
                    }
                    self.recover_to_next_rule(rule_start);
                }
            }
        }
    }
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer;
    use crate::session::DEFAULT_MAX_ERRORS;

    fn parse_src(src: &str) -> Result<CompilationSession, NewtonError> {
        let tokens = lexer::lex(src, "test.nt")?;
        let mut session = CompilationSession::new("test.nt");
        parse(&tokens, &mut session)?;
        Ok(session)
    }

    fn parse_src_recovering(src: &str) -> CompilationSession {
        let tokens = lexer::lex(src, "test.nt").expect("lexes");
        let mut session = CompilationSession::new("test.nt");
        parse_recovering(&tokens, &mut session, DEFAULT_MAX_ERRORS);
        session
    }

    const BASE: &str = r#"
mass : signal = { name = "kilogram" English; symbol = "kg"; derivation = none; }
length : signal = { name = "meter" English; symbol = "m"; derivation = none; }
"#;

    #[test]
    fn peek_is_one_based_and_clamps_at_eof() {
        let tokens = lexer::lex("a : b", "test.nt").unwrap();
        let mut session = CompilationSession::new("test.nt");
        let mut p = Parser::new(&tokens, &mut session);
        assert_eq!(p.kind(1), TokenKind::Identifier);
        assert_eq!(p.kind(2), TokenKind::Colon);
        assert_eq!(p.kind(10), TokenKind::Eof);
        for _ in 0..5 {
            p.get();
        }
        assert_eq!(p.kind(1), TokenKind::Eof);
    }

    #[test]
    fn rule_dispatch_reports_the_third_token() {
        let err = parse_src("x : widget = 3;").unwrap_err();
        assert!(err.is_syntax());
        assert_eq!(err.column, 5);
        assert!(err.message().contains("'signal', 'constant' or 'invariant'"));
    }

    #[test]
    fn use_before_definition_is_reported() {
        let err = parse_src("x : constant = mass * 2;").unwrap_err();
        assert_eq!(err.kind, ErrorKind::UseBeforeDefinition("mass".into()));
        assert_eq!(err.category(), "resolution");
    }

    #[test]
    fn multi_error_reports_both_broken_rules() {
        let src = format!(
            "{}\nbad1 : constant = mass + ;\nbad2 : constant = mass + length;\nok : constant = mass * length;\n",
            BASE
        );
        let session = parse_src_recovering(&src);
        assert_eq!(session.diagnostics().len(), 2, "{:?}", session.diagnostics());
        assert!(session.diagnostics()[0].is_syntax());
        assert!(session.diagnostics()[1].is_dimensional());
        assert!(session.physics_by_name("ok").is_some());
        assert_eq!(session.ast().rules.len(), 3);
    }

    #[test]
    fn recovery_skips_a_broken_invariant_body() {
        let src = format!(
            "{}\nbroken : invariant (m : mass) = {{ m + length == m }}\nfine : invariant (m : mass) = {{ m == m }}\n",
            BASE
        );
        let session = parse_src_recovering(&src);
        assert_eq!(session.diagnostics().len(), 1);
        assert_eq!(session.invariants().len(), 1);
        assert_eq!(session.invariants()[0].name, "fine");
    }

    #[test]
    fn recovery_stops_at_max_errors() {
        let src = "a : constant = ;\nb : constant = ;\nc : constant = ;\n";
        let tokens = lexer::lex(src, "test.nt").unwrap();
        let mut session = CompilationSession::new("test.nt");
        parse_recovering(&tokens, &mut session, 2);
        assert_eq!(session.diagnostics().len(), 2);
    }

    #[test]
    fn missing_semicolon_does_not_swallow_the_next_rule() {
        let src = format!(
            "{}\nx : constant = mass\ny : constant = length * 2;\n",
            BASE
        );
        let session = parse_src_recovering(&src);
        assert_eq!(session.diagnostics().len(), 1);
        assert!(session.physics_by_name("y").is_some());
    }

    #[test]
    fn empty_input_parses_to_nothing() {
        let session = parse_src("# only a comment\n").unwrap();
        assert!(session.ast().rules.is_empty());
    }
}
