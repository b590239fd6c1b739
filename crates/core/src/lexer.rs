use crate::error::NewtonError;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Identifier(String),
    /// Quoted string literal (content without quotes, escapes resolved)
    Str(String),
    Int(i64),
    Real(f64),
    // Punctuation
    LBrace,
    RBrace,
    LParen,
    RParen,
    Colon,
    Semicolon,
    Comma,
    Equals,
    // Arithmetic operators
    Plus,
    Minus,
    Star,
    StarStar,
    Slash,
    // Comparison operators
    EqualEqual,
    Lt,
    Le,
    Gt,
    Ge,
    Proportional, // @<
    Equivalent,   // ~
    // Keywords
    Signal,
    Constant,
    Invariant,
    Derivation,
    Symbol,
    Name,
    None,
    English,
    Spanish,
    Dot,
    Cross,
    Derivative,
    Integral,
    VectorScalarPairs,
    // End of input
    Eof,
}

/// Payload-free token classification, used by the FIRST/FOLLOW tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Identifier,
    Str,
    Number,
    LBrace,
    RBrace,
    LParen,
    RParen,
    Colon,
    Semicolon,
    Comma,
    Equals,
    Plus,
    Minus,
    Star,
    StarStar,
    Slash,
    EqualEqual,
    Lt,
    Le,
    Gt,
    Ge,
    Proportional,
    Equivalent,
    Signal,
    Constant,
    Invariant,
    Derivation,
    Symbol,
    Name,
    None,
    English,
    Spanish,
    Dot,
    Cross,
    Derivative,
    Integral,
    VectorScalarPairs,
    Eof,
}

impl Token {
    pub fn kind(&self) -> TokenKind {
        match self {
            Token::Identifier(_) => TokenKind::Identifier,
            Token::Str(_) => TokenKind::Str,
            Token::Int(_) | Token::Real(_) => TokenKind::Number,
            Token::LBrace => TokenKind::LBrace,
            Token::RBrace => TokenKind::RBrace,
            Token::LParen => TokenKind::LParen,
            Token::RParen => TokenKind::RParen,
            Token::Colon => TokenKind::Colon,
            Token::Semicolon => TokenKind::Semicolon,
            Token::Comma => TokenKind::Comma,
            Token::Equals => TokenKind::Equals,
            Token::Plus => TokenKind::Plus,
            Token::Minus => TokenKind::Minus,
            Token::Star => TokenKind::Star,
            Token::StarStar => TokenKind::StarStar,
            Token::Slash => TokenKind::Slash,
            Token::EqualEqual => TokenKind::EqualEqual,
            Token::Lt => TokenKind::Lt,
            Token::Le => TokenKind::Le,
            Token::Gt => TokenKind::Gt,
            Token::Ge => TokenKind::Ge,
            Token::Proportional => TokenKind::Proportional,
            Token::Equivalent => TokenKind::Equivalent,
            Token::Signal => TokenKind::Signal,
            Token::Constant => TokenKind::Constant,
            Token::Invariant => TokenKind::Invariant,
            Token::Derivation => TokenKind::Derivation,
            Token::Symbol => TokenKind::Symbol,
            Token::Name => TokenKind::Name,
            Token::None => TokenKind::None,
            Token::English => TokenKind::English,
            Token::Spanish => TokenKind::Spanish,
            Token::Dot => TokenKind::Dot,
            Token::Cross => TokenKind::Cross,
            Token::Derivative => TokenKind::Derivative,
            Token::Integral => TokenKind::Integral,
            Token::VectorScalarPairs => TokenKind::VectorScalarPairs,
            Token::Eof => TokenKind::Eof,
        }
    }

    /// Numeric payload of an `Int` or `Real` token.
    pub fn number(&self) -> Option<f64> {
        match self {
            Token::Int(n) => Some(*n as f64),
            Token::Real(r) => Some(*r),
            _ => None,
        }
    }
}

impl TokenKind {
    /// Human-readable spelling used in syntax errors.
    pub fn describe(self) -> &'static str {
        match self {
            TokenKind::Identifier => "identifier",
            TokenKind::Str => "string literal",
            TokenKind::Number => "number",
            TokenKind::LBrace => "'{'",
            TokenKind::RBrace => "'}'",
            TokenKind::LParen => "'('",
            TokenKind::RParen => "')'",
            TokenKind::Colon => "':'",
            TokenKind::Semicolon => "';'",
            TokenKind::Comma => "','",
            TokenKind::Equals => "'='",
            TokenKind::Plus => "'+'",
            TokenKind::Minus => "'-'",
            TokenKind::Star => "'*'",
            TokenKind::StarStar => "'**'",
            TokenKind::Slash => "'/'",
            TokenKind::EqualEqual => "'=='",
            TokenKind::Lt => "'<'",
            TokenKind::Le => "'<='",
            TokenKind::Gt => "'>'",
            TokenKind::Ge => "'>='",
            TokenKind::Proportional => "'@<'",
            TokenKind::Equivalent => "'~'",
            TokenKind::Signal => "'signal'",
            TokenKind::Constant => "'constant'",
            TokenKind::Invariant => "'invariant'",
            TokenKind::Derivation => "'derivation'",
            TokenKind::Symbol => "'symbol'",
            TokenKind::Name => "'name'",
            TokenKind::None => "'none'",
            TokenKind::English => "'English'",
            TokenKind::Spanish => "'Spanish'",
            TokenKind::Dot => "'dot'",
            TokenKind::Cross => "'cross'",
            TokenKind::Derivative => "'derivative'",
            TokenKind::Integral => "'integral'",
            TokenKind::VectorScalarPairs => "'vectorScalarPairs'",
            TokenKind::Eof => "end of file",
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Identifier(s) => write!(f, "identifier '{}'", s),
            Token::Str(s) => write!(f, "string \"{}\"", s),
            Token::Int(n) => write!(f, "number {}", n),
            Token::Real(r) => write!(f, "number {}", r),
            other => f.write_str(other.kind().describe()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Spanned {
    pub token: Token,
    pub line: u32,
    pub column: u32,
    pub length: u32,
}

fn keyword(word: &str) -> Option<Token> {
    Some(match word {
        "signal" => Token::Signal,
        "constant" => Token::Constant,
        "invariant" => Token::Invariant,
        "derivation" => Token::Derivation,
        "symbol" => Token::Symbol,
        "name" => Token::Name,
        "none" => Token::None,
        "English" => Token::English,
        "Spanish" => Token::Spanish,
        "dot" => Token::Dot,
        "cross" => Token::Cross,
        "derivative" => Token::Derivative,
        "integral" => Token::Integral,
        "vectorScalarPairs" => Token::VectorScalarPairs,
        _ => return None,
    })
}

pub fn lex(src: &str, filename: &str) -> Result<Vec<Spanned>, NewtonError> {
    let mut tokens = Vec::new();
    let chars: Vec<char> = src.chars().collect();
    let mut pos = 0usize;
    let mut line: u32 = 1;
    let mut line_start = 0usize;

    let push = |tokens: &mut Vec<Spanned>, token, line, column, length: usize| {
        tokens.push(Spanned {
            token,
            line,
            column,
            length: length as u32,
        })
    };

    while pos < chars.len() {
        let c = chars[pos];

        // Line comment
        if c == '#' {
            while pos < chars.len() && chars[pos] != '\n' {
                pos += 1;
            }
            continue;
        }

        // Whitespace
        if c.is_whitespace() {
            if c == '\n' {
                line += 1;
                line_start = pos + 1;
            }
            pos += 1;
            continue;
        }

        let start = pos;
        let column = (pos - line_start + 1) as u32;

        // String literal
        if c == '"' {
            pos += 1;
            let mut s = String::new();
            loop {
                if pos >= chars.len() || chars[pos] == '\n' {
                    return Err(NewtonError::lex(
                        filename,
                        line,
                        column,
                        "unterminated string literal",
                    ));
                }
                let sc = chars[pos];
                if sc == '"' {
                    pos += 1;
                    break;
                }
                if sc == '\\' && pos + 1 < chars.len() {
                    pos += 1;
                    match chars[pos] {
                        '"' => s.push('"'),
                        '\\' => s.push('\\'),
                        'n' => s.push('\n'),
                        't' => s.push('\t'),
                        other => {
                            s.push('\\');
                            s.push(other);
                        }
                    }
                    pos += 1;
                    continue;
                }
                s.push(sc);
                pos += 1;
            }
            push(&mut tokens, Token::Str(s), line, column, pos - start);
            continue;
        }

        // Number: digits, optional fraction, optional exponent
        if c.is_ascii_digit() {
            let mut real = false;
            while pos < chars.len() && chars[pos].is_ascii_digit() {
                pos += 1;
            }
            if pos + 1 < chars.len() && chars[pos] == '.' && chars[pos + 1].is_ascii_digit() {
                real = true;
                pos += 1;
                while pos < chars.len() && chars[pos].is_ascii_digit() {
                    pos += 1;
                }
            }
            if pos < chars.len() && (chars[pos] == 'e' || chars[pos] == 'E') {
                let mut look = pos + 1;
                if look < chars.len() && (chars[look] == '+' || chars[look] == '-') {
                    look += 1;
                }
                if look < chars.len() && chars[look].is_ascii_digit() {
                    real = true;
                    pos = look;
                    while pos < chars.len() && chars[pos].is_ascii_digit() {
                        pos += 1;
                    }
                }
            }
            let text: String = chars[start..pos].iter().collect();
            // Integers too wide for i64 lex as reals.
            let token = match text.parse::<i64>() {
                Ok(n) if !real => Token::Int(n),
                _ => Token::Real(text.parse().map_err(|_| {
                    NewtonError::lex(filename, line, column, format!("invalid number '{}'", text))
                })?),
            };
            push(&mut tokens, token, line, column, pos - start);
            continue;
        }

        // Identifier or keyword
        if c.is_alphabetic() || c == '_' {
            while pos < chars.len() && (chars[pos].is_alphanumeric() || chars[pos] == '_') {
                pos += 1;
            }
            let word: String = chars[start..pos].iter().collect();
            let token = keyword(&word).unwrap_or(Token::Identifier(word));
            push(&mut tokens, token, line, column, pos - start);
            continue;
        }

        let next = chars.get(pos + 1).copied();
        let (token, width) = match (c, next) {
            ('*', Some('*')) => (Token::StarStar, 2),
            ('=', Some('=')) => (Token::EqualEqual, 2),
            ('<', Some('=')) => (Token::Le, 2),
            ('>', Some('=')) => (Token::Ge, 2),
            ('@', Some('<')) => (Token::Proportional, 2),
            ('{', _) => (Token::LBrace, 1),
            ('}', _) => (Token::RBrace, 1),
            ('(', _) => (Token::LParen, 1),
            (')', _) => (Token::RParen, 1),
            (':', _) => (Token::Colon, 1),
            (';', _) => (Token::Semicolon, 1),
            (',', _) => (Token::Comma, 1),
            ('=', _) => (Token::Equals, 1),
            ('+', _) => (Token::Plus, 1),
            ('-', _) => (Token::Minus, 1),
            ('*', _) => (Token::Star, 1),
            ('/', _) => (Token::Slash, 1),
            ('<', _) => (Token::Lt, 1),
            ('>', _) => (Token::Gt, 1),
            ('~', _) => (Token::Equivalent, 1),
            (other, _) => {
                return Err(NewtonError::lex(
                    filename,
                    line,
                    column,
                    format!("unexpected character '{}'", other),
                ));
            }
        };
        pos += width;
        push(&mut tokens, token, line, column, width);
    }

    let column = (pos - line_start + 1) as u32;
    push(&mut tokens, Token::Eof, line, column, 0);
    Ok(tokens)
}
