//! The lexer: source text to a stream of positioned tokens.
//!
//! Tokens are produced one at a time through [`Lexer::next_token`]; the
//! parser drives the lexer lazily and may also peek at the current raw
//! character to disambiguate calls from assignments.

use pask_util::{ErrorCode, Span};
use thiserror::Error;

use crate::cursor::Cursor;
use crate::token::{keyword_from_str, Token, TokenKind, TokenValue};

/// A lexical error: an unexpected character or an unterminated comment.
#[derive(Clone, Debug, Error, PartialEq)]
#[error("LexerError: {code} -> '{lexeme}' position={line}:{column}")]
pub struct LexerError {
    pub code: ErrorCode,
    pub lexeme: String,
    pub line: u32,
    pub column: u32,
}

/// The lexer for Pask source code.
///
/// # Example
///
/// ```
/// use pask_lex::{Lexer, TokenKind};
///
/// let mut lexer = Lexer::new("BEGIN END.");
/// assert_eq!(lexer.next_token().unwrap().kind, TokenKind::Begin);
/// assert_eq!(lexer.next_token().unwrap().kind, TokenKind::End);
/// assert_eq!(lexer.next_token().unwrap().kind, TokenKind::Dot);
/// assert_eq!(lexer.next_token().unwrap().kind, TokenKind::Eof);
/// ```
pub struct Lexer<'a> {
    /// Character cursor over the source.
    cursor: Cursor<'a>,

    /// Start byte position of the token being lexed.
    token_start: usize,

    /// Start line of the token being lexed.
    token_start_line: u32,

    /// Start column of the token being lexed.
    token_start_column: u32,
}

impl<'a> Lexer<'a> {
    /// Creates a new lexer over the given source text.
    pub fn new(source: &'a str) -> Self {
        Self {
            cursor: Cursor::new(source),
            token_start: 0,
            token_start_line: 1,
            token_start_column: 1,
        }
    }

    /// The raw character under the cursor.
    ///
    /// The parser uses this single-character lookahead to tell a call
    /// statement `foo(` apart from an assignment `foo :=` while the
    /// identifier token is already current.
    pub fn current_char(&self) -> char {
        self.cursor.current_char()
    }

    /// Returns the next token from the source.
    ///
    /// Skips whitespace and `{ ... }` comments, then dispatches on the
    /// first character of the token. At end of input an `EOF` token is
    /// returned (repeatedly, if called again).
    pub fn next_token(&mut self) -> Result<Token, LexerError> {
        loop {
            self.cursor.skip_whitespace();
            if self.cursor.current_char() == '{' {
                self.skip_comment()?;
                continue;
            }
            break;
        }

        self.token_start = self.cursor.position();
        self.token_start_line = self.cursor.line();
        self.token_start_column = self.cursor.column();

        if self.cursor.is_at_end() {
            return Ok(Token::new(TokenKind::Eof, TokenValue::None, self.span()));
        }

        match self.cursor.current_char() {
            c if c.is_ascii_digit() => self.lex_number(),

            c if c.is_ascii_alphabetic() || c == '_' => Ok(self.lex_identifier()),

            '/' => {
                self.cursor.advance();
                if self.cursor.match_char('/') {
                    Ok(self.fixed_token(TokenKind::IntegerDiv))
                } else {
                    Ok(self.fixed_token(TokenKind::FloatDiv))
                }
            }

            ':' => {
                self.cursor.advance();
                if self.cursor.match_char('=') {
                    Ok(self.fixed_token(TokenKind::Assign))
                } else {
                    Ok(self.fixed_token(TokenKind::Colon))
                }
            }

            '<' => {
                self.cursor.advance();
                if self.cursor.match_char('=') {
                    Ok(self.fixed_token(TokenKind::LessEquals))
                } else if self.cursor.match_char('>') {
                    Ok(self.fixed_token(TokenKind::NotEquals))
                } else {
                    Ok(self.fixed_token(TokenKind::Less))
                }
            }

            '>' => {
                self.cursor.advance();
                if self.cursor.match_char('=') {
                    Ok(self.fixed_token(TokenKind::GreaterEquals))
                } else {
                    Ok(self.fixed_token(TokenKind::Greater))
                }
            }

            '(' => Ok(self.single_char_token(TokenKind::LParen)),
            ')' => Ok(self.single_char_token(TokenKind::RParen)),
            ';' => Ok(self.single_char_token(TokenKind::Semi)),
            '.' => Ok(self.single_char_token(TokenKind::Dot)),
            ',' => Ok(self.single_char_token(TokenKind::Comma)),
            '+' => Ok(self.single_char_token(TokenKind::Plus)),
            '-' => Ok(self.single_char_token(TokenKind::Minus)),
            '*' => Ok(self.single_char_token(TokenKind::Mul)),
            '%' => Ok(self.single_char_token(TokenKind::Mod)),
            '=' => Ok(self.single_char_token(TokenKind::Equals)),

            c => Err(self.error(ErrorCode::UnexpectedCharacter, c.to_string())),
        }
    }

    /// Skip a `{ ... }` comment. Comments do not nest.
    fn skip_comment(&mut self) -> Result<(), LexerError> {
        let line = self.cursor.line();
        let column = self.cursor.column();
        self.cursor.advance(); // consume '{'

        while self.cursor.current_char() != '}' {
            if self.cursor.is_at_end() {
                return Err(LexerError {
                    code: ErrorCode::UnterminatedComment,
                    lexeme: "{".to_string(),
                    line,
                    column,
                });
            }
            self.cursor.advance();
        }
        self.cursor.advance(); // consume '}'
        Ok(())
    }

    /// Lex an integer or real constant.
    fn lex_number(&mut self) -> Result<Token, LexerError> {
        while self.cursor.current_char().is_ascii_digit() {
            self.cursor.advance();
        }

        if self.cursor.current_char() == '.' {
            self.cursor.advance();
            while self.cursor.current_char().is_ascii_digit() {
                self.cursor.advance();
            }

            let text = self.cursor.slice_from(self.token_start);
            let value: f64 = text
                .parse()
                .map_err(|_| self.error(ErrorCode::UnexpectedCharacter, text.to_string()))?;
            return Ok(Token::new(
                TokenKind::RealConst,
                TokenValue::Real(value),
                self.span(),
            ));
        }

        let text = self.cursor.slice_from(self.token_start);
        let value: i64 = text
            .parse()
            .map_err(|_| self.error(ErrorCode::UnexpectedCharacter, text.to_string()))?;
        Ok(Token::new(
            TokenKind::IntegerConst,
            TokenValue::Int(value),
            self.span(),
        ))
    }

    /// Lex an identifier or reserved word.
    ///
    /// Keywords are case-insensitive and carry their canonical uppercase
    /// lexeme; identifiers keep their original spelling.
    fn lex_identifier(&mut self) -> Token {
        while self.cursor.current_char().is_ascii_alphanumeric()
            || self.cursor.current_char() == '_'
        {
            self.cursor.advance();
        }

        let text = self.cursor.slice_from(self.token_start);
        let upper = text.to_uppercase();
        match keyword_from_str(&upper) {
            Some(kind) => Token::new(kind, TokenValue::Str(upper), self.span()),
            None => Token::new(TokenKind::Id, TokenValue::Str(text.to_string()), self.span()),
        }
    }

    /// Consume the current character and build its single-character token.
    fn single_char_token(&mut self, kind: TokenKind) -> Token {
        self.cursor.advance();
        self.fixed_token(kind)
    }

    /// Build a token whose lexeme is fixed by its kind.
    fn fixed_token(&self, kind: TokenKind) -> Token {
        let text = kind.lexeme().unwrap_or_default();
        Token::new(kind, TokenValue::Str(text.to_string()), self.span())
    }

    /// Span from the start of the current token to the cursor.
    fn span(&self) -> Span {
        Span::new(
            self.token_start,
            self.cursor.position(),
            self.token_start_line,
            self.token_start_column,
        )
    }

    /// Build a lexical error at the start of the current token.
    fn error(&self, code: ErrorCode, lexeme: String) -> LexerError {
        LexerError {
            code,
            lexeme,
            line: self.token_start_line,
            column: self.token_start_column,
        }
    }
}

/// Lex an entire source string into a token vector, `EOF` included.
pub fn tokenize(source: &str) -> Result<Vec<Token>, LexerError> {
    let mut lexer = Lexer::new(source);
    let mut tokens = Vec::new();
    loop {
        let token = lexer.next_token()?;
        let is_eof = token.kind == TokenKind::Eof;
        tokens.push(token);
        if is_eof {
            break;
        }
    }
    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokenize(source)
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    // =========================================================================
    // BASIC TOKENS
    // =========================================================================

    #[test]
    fn test_lex_integer_const() {
        let tokens = tokenize("1337").unwrap();
        assert_eq!(tokens[0].kind, TokenKind::IntegerConst);
        assert_eq!(tokens[0].value, TokenValue::Int(1337));
    }

    #[test]
    fn test_lex_real_const() {
        let tokens = tokenize("3.14").unwrap();
        assert_eq!(tokens[0].kind, TokenKind::RealConst);
        assert_eq!(tokens[0].value, TokenValue::Real(3.14));
    }

    #[test]
    fn test_lex_real_with_trailing_dot_digits_empty() {
        // "3." is a real constant; the dot is consumed by the number rule
        let tokens = tokenize("3.").unwrap();
        assert_eq!(tokens[0].kind, TokenKind::RealConst);
        assert_eq!(tokens[0].value, TokenValue::Real(3.0));
    }

    #[test]
    fn test_lex_identifier_keeps_case() {
        let tokens = tokenize("myVar _count").unwrap();
        assert_eq!(tokens[0].value, TokenValue::Str("myVar".to_string()));
        assert_eq!(tokens[1].value, TokenValue::Str("_count".to_string()));
    }

    #[test]
    fn test_lex_keywords_case_insensitive() {
        for source in ["begin", "BEGIN", "Begin", "bEgIn"] {
            let tokens = tokenize(source).unwrap();
            assert_eq!(tokens[0].kind, TokenKind::Begin);
            assert_eq!(tokens[0].value, TokenValue::Str("BEGIN".to_string()));
        }
    }

    #[test]
    fn test_lex_two_char_operators() {
        assert_eq!(
            kinds(":= // <> <= >="),
            vec![
                TokenKind::Assign,
                TokenKind::IntegerDiv,
                TokenKind::NotEquals,
                TokenKind::LessEquals,
                TokenKind::GreaterEquals,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_lex_single_char_fallbacks() {
        assert_eq!(
            kinds(": / < >"),
            vec![
                TokenKind::Colon,
                TokenKind::FloatDiv,
                TokenKind::Less,
                TokenKind::Greater,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_lex_statement() {
        assert_eq!(
            kinds("a := 2 + 3 * 4;"),
            vec![
                TokenKind::Id,
                TokenKind::Assign,
                TokenKind::IntegerConst,
                TokenKind::Plus,
                TokenKind::IntegerConst,
                TokenKind::Mul,
                TokenKind::IntegerConst,
                TokenKind::Semi,
                TokenKind::Eof,
            ]
        );
    }

    // =========================================================================
    // COMMENTS AND WHITESPACE
    // =========================================================================

    #[test]
    fn test_comment_skipped() {
        assert_eq!(
            kinds("a { this is ignored } := 1"),
            vec![
                TokenKind::Id,
                TokenKind::Assign,
                TokenKind::IntegerConst,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_comment_spanning_lines() {
        let tokens = tokenize("{ first\nsecond }\nx").unwrap();
        assert_eq!(tokens[0].kind, TokenKind::Id);
        assert_eq!(tokens[0].line(), 3);
        assert_eq!(tokens[0].column(), 1);
    }

    #[test]
    fn test_unterminated_comment() {
        let err = tokenize("a := 1; { no close").unwrap_err();
        assert_eq!(err.code, ErrorCode::UnterminatedComment);
        assert_eq!(err.line, 1);
        assert_eq!(err.column, 9);
    }

    // =========================================================================
    // POSITIONS
    // =========================================================================

    #[test]
    fn test_token_positions() {
        let tokens = tokenize("a := 1;\nbb := 2;").unwrap();
        // 'a' at 1:1, ':=' at 1:3, '1' at 1:6
        assert_eq!((tokens[0].line(), tokens[0].column()), (1, 1));
        assert_eq!((tokens[1].line(), tokens[1].column()), (1, 3));
        assert_eq!((tokens[2].line(), tokens[2].column()), (1, 6));
        // 'bb' at 2:1
        assert_eq!((tokens[4].line(), tokens[4].column()), (2, 1));
    }

    #[test]
    fn test_eof_token_terminates() {
        let tokens = tokenize("").unwrap();
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].kind, TokenKind::Eof);
    }

    // =========================================================================
    // ERRORS
    // =========================================================================

    #[test]
    fn test_invalid_character() {
        let err = tokenize("a := @;").unwrap_err();
        assert_eq!(err.code, ErrorCode::UnexpectedCharacter);
        assert_eq!(err.lexeme, "@");
        assert_eq!((err.line, err.column), (1, 6));
    }

    #[test]
    fn test_error_display() {
        let err = tokenize("?").unwrap_err();
        assert_eq!(
            err.to_string(),
            "LexerError: Invalid character -> '?' position=1:1"
        );
    }

    // =========================================================================
    // ROUND-TRIP PROPERTY
    // =========================================================================

    /// Kinds with a fixed lexeme, used by the round-trip generator.
    const FIXED_KINDS: &[TokenKind] = &[
        TokenKind::LParen,
        TokenKind::RParen,
        TokenKind::Semi,
        TokenKind::Dot,
        TokenKind::Colon,
        TokenKind::Comma,
        TokenKind::Plus,
        TokenKind::Minus,
        TokenKind::Mul,
        TokenKind::FloatDiv,
        TokenKind::IntegerDiv,
        TokenKind::Mod,
        TokenKind::Equals,
        TokenKind::NotEquals,
        TokenKind::Less,
        TokenKind::LessEquals,
        TokenKind::Greater,
        TokenKind::GreaterEquals,
        TokenKind::Assign,
        TokenKind::Program,
        TokenKind::Var,
        TokenKind::Procedure,
        TokenKind::Function,
        TokenKind::While,
        TokenKind::Do,
        TokenKind::If,
        TokenKind::Then,
        TokenKind::Else,
        TokenKind::Begin,
        TokenKind::End,
        TokenKind::True,
        TokenKind::False,
        TokenKind::And,
        TokenKind::Or,
        TokenKind::Not,
    ];

    /// One generated token: its expected kind/value and its rendering.
    fn arb_token() -> impl Strategy<Value = (TokenKind, TokenValue, String)> {
        prop_oneof![
            // identifiers (filtered against the keyword table)
            "[a-z_][a-z0-9_]{0,8}"
                .prop_filter("identifier must not be a keyword", |s| {
                    keyword_from_str(&s.to_uppercase()).is_none()
                })
                .prop_map(|s| {
                    (TokenKind::Id, TokenValue::Str(s.clone()), s)
                }),
            // integer constants
            any::<u32>().prop_map(|n| {
                let text = n.to_string();
                (TokenKind::IntegerConst, TokenValue::Int(n as i64), text)
            }),
            // real constants rendered as digits '.' digits
            (0u32..10_000, 0u32..10_000).prop_map(|(whole, frac)| {
                let text = format!("{whole}.{frac}");
                let value: f64 = text.parse().unwrap();
                (TokenKind::RealConst, TokenValue::Real(value), text)
            }),
            // operators, punctuation, and keywords
            (0..FIXED_KINDS.len()).prop_map(|i| {
                let kind = FIXED_KINDS[i];
                let text = kind.lexeme().unwrap().to_string();
                (kind, TokenValue::Str(text.clone()), text)
            }),
        ]
    }

    proptest! {
        /// Rendering token lexemes separated by single spaces and lexing
        /// the result reproduces the same kind/value sequence.
        #[test]
        fn round_trip_lexemes(tokens in proptest::collection::vec(arb_token(), 0..40)) {
            let source = tokens
                .iter()
                .map(|(_, _, text)| text.as_str())
                .collect::<Vec<_>>()
                .join(" ");

            let relexed = tokenize(&source).unwrap();
            prop_assert_eq!(relexed.len(), tokens.len() + 1);
            for ((kind, value, _), token) in tokens.iter().zip(&relexed) {
                prop_assert_eq!(*kind, token.kind);
                prop_assert_eq!(value, &token.value);
            }
            prop_assert_eq!(relexed.last().unwrap().kind, TokenKind::Eof);
        }
    }
}
