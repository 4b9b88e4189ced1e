use anyhow::Result;
use thiserror::Error;

use crate::source::{SourceFile, SourceSpan};

#[derive(Debug, Clone)]
pub struct Token {
    pub kind: TokenKind,
    pub lexeme: String,
    pub line: usize,
    pub column: usize,
    /// Set on tokens the parser fabricates in place of missing input.
    pub injected: bool,
}

impl Token {
    fn new(kind: TokenKind, lexeme: String, line: usize, column: usize) -> Self {
        Self {
            kind,
            lexeme,
            line,
            column,
            injected: false,
        }
    }

    pub fn injected(kind: TokenKind, line: usize, column: usize) -> Self {
        Self {
            kind,
            lexeme: String::new(),
            line,
            column,
            injected: true,
        }
    }

    pub fn span(&self) -> SourceSpan {
        let len = self.lexeme.chars().count().max(1);
        SourceSpan::new(
            self.line,
            self.column,
            self.line,
            self.column + len.saturating_sub(1),
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Identifier,
    IntegerLiteral,
    DecimalLiteral,
    StringLiteral(String),
    BooleanLiteral(bool),
    Keyword(Keyword),
    Underscore,
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Comma,
    Dot,
    Colon,
    Semicolon,
    Equal,
    DoubleEqual,
    Bang,
    BangEqual,
    Greater,
    GreaterEqual,
    Less,
    LessEqual,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Arrow, // ->
    AmpersandAmpersand,
    PipePipe,
    Eof,
}

impl TokenKind {
    /// How the kind reads in "Expected ..." messages.
    pub fn describe(&self) -> &'static str {
        match self {
            TokenKind::Identifier => "identifier",
            TokenKind::IntegerLiteral => "integer",
            TokenKind::DecimalLiteral => "decimal",
            TokenKind::StringLiteral(_) => "string",
            TokenKind::BooleanLiteral(true) => "true",
            TokenKind::BooleanLiteral(false) => "false",
            TokenKind::Keyword(keyword) => keyword.as_str(),
            TokenKind::Underscore => "_",
            TokenKind::LParen => "(",
            TokenKind::RParen => ")",
            TokenKind::LBrace => "{",
            TokenKind::RBrace => "}",
            TokenKind::LBracket => "[",
            TokenKind::RBracket => "]",
            TokenKind::Comma => ",",
            TokenKind::Dot => ".",
            TokenKind::Colon => ":",
            TokenKind::Semicolon => ";",
            TokenKind::Equal => "=",
            TokenKind::DoubleEqual => "==",
            TokenKind::Bang => "!",
            TokenKind::BangEqual => "!=",
            TokenKind::Greater => ">",
            TokenKind::GreaterEqual => ">=",
            TokenKind::Less => "<",
            TokenKind::LessEqual => "<=",
            TokenKind::Plus => "+",
            TokenKind::Minus => "-",
            TokenKind::Star => "*",
            TokenKind::Slash => "/",
            TokenKind::Percent => "%",
            TokenKind::Arrow => "->",
            TokenKind::AmpersandAmpersand => "&&",
            TokenKind::PipePipe => "||",
            TokenKind::Eof => "end of file",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    Def,
    Mut,
    Return,
    While,
    Break,
    Continue,
    If,
    Else,
    Record,
    Enum,
}

impl Keyword {
    pub fn as_str(self) -> &'static str {
        match self {
            Keyword::Def => "def",
            Keyword::Mut => "mut",
            Keyword::Return => "return",
            Keyword::While => "while",
            Keyword::Break => "break",
            Keyword::Continue => "continue",
            Keyword::If => "if",
            Keyword::Else => "else",
            Keyword::Record => "record",
            Keyword::Enum => "enum",
        }
    }
}

#[derive(Debug, Error)]
pub enum LexerError {
    #[error("Invalid character `{character}`")]
    InvalidCharacter {
        character: char,
        line: usize,
        column: usize,
    },
    #[error("Unterminated string")]
    UnterminatedString { line: usize, column: usize },
    #[error("Invalid escaping \\{character}")]
    InvalidEscape {
        character: char,
        line: usize,
        column: usize,
    },
    #[error("Expected an escaping sequence")]
    MalformedUnicodeEscape { line: usize, column: usize },
    #[error("Unclosed comment")]
    UnclosedComment { line: usize, column: usize },
}

impl LexerError {
    pub fn line(&self) -> usize {
        match self {
            LexerError::InvalidCharacter { line, .. }
            | LexerError::UnterminatedString { line, .. }
            | LexerError::InvalidEscape { line, .. }
            | LexerError::MalformedUnicodeEscape { line, .. }
            | LexerError::UnclosedComment { line, .. } => *line,
        }
    }

    pub fn column(&self) -> usize {
        match self {
            LexerError::InvalidCharacter { column, .. }
            | LexerError::UnterminatedString { column, .. }
            | LexerError::InvalidEscape { column, .. }
            | LexerError::MalformedUnicodeEscape { column, .. }
            | LexerError::UnclosedComment { column, .. } => *column,
        }
    }
}

pub struct Lexer<'a> {
    input: &'a str,
    position: usize,
    line: usize,
    column: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a SourceFile) -> Self {
        Self {
            input: &source.contents,
            position: 0,
            line: 1,
            column: 1,
        }
    }

    pub fn tokenize(&mut self) -> Result<Vec<Token>> {
        let mut tokens = Vec::new();

        while let Some(ch) = self.peek_char() {
            match ch {
                ' ' | '\t' | '\r' | '\n' => {
                    self.advance_char();
                }
                '/' if self.peek_next_char() == Some('/') => self.skip_line_comment(),
                '/' if self.peek_next_char() == Some('*') => self.skip_block_comment()?,
                '"' => {
                    let token = self.lex_string()?;
                    tokens.push(token);
                }
                '0'..='9' => tokens.push(self.lex_number()),
                'a'..='z' | 'A'..='Z' | '_' => tokens.push(self.lex_identifier_or_keyword()),
                '(' => tokens.push(self.simple_token(TokenKind::LParen)),
                ')' => tokens.push(self.simple_token(TokenKind::RParen)),
                '{' => tokens.push(self.simple_token(TokenKind::LBrace)),
                '}' => tokens.push(self.simple_token(TokenKind::RBrace)),
                '[' => tokens.push(self.simple_token(TokenKind::LBracket)),
                ']' => tokens.push(self.simple_token(TokenKind::RBracket)),
                ',' => tokens.push(self.simple_token(TokenKind::Comma)),
                '.' => tokens.push(self.simple_token(TokenKind::Dot)),
                ':' => tokens.push(self.simple_token(TokenKind::Colon)),
                ';' => tokens.push(self.simple_token(TokenKind::Semicolon)),
                '+' => tokens.push(self.simple_token(TokenKind::Plus)),
                '*' => tokens.push(self.simple_token(TokenKind::Star)),
                '/' => tokens.push(self.simple_token(TokenKind::Slash)),
                '%' => tokens.push(self.simple_token(TokenKind::Percent)),
                '-' => tokens.push(self.either('>', TokenKind::Arrow, TokenKind::Minus)),
                '=' => tokens.push(self.either('=', TokenKind::DoubleEqual, TokenKind::Equal)),
                '!' => tokens.push(self.either('=', TokenKind::BangEqual, TokenKind::Bang)),
                '>' => tokens.push(self.either('=', TokenKind::GreaterEqual, TokenKind::Greater)),
                '<' => tokens.push(self.either('=', TokenKind::LessEqual, TokenKind::Less)),
                '&' if self.peek_next_char() == Some('&') => {
                    tokens.push(self.pair_token(TokenKind::AmpersandAmpersand))
                }
                '|' if self.peek_next_char() == Some('|') => {
                    tokens.push(self.pair_token(TokenKind::PipePipe))
                }
                other => {
                    return Err(LexerError::InvalidCharacter {
                        character: other,
                        line: self.line,
                        column: self.column,
                    }
                    .into());
                }
            }
        }

        tokens.push(Token::new(
            TokenKind::Eof,
            String::new(),
            self.line,
            self.column,
        ));

        Ok(tokens)
    }

    fn skip_line_comment(&mut self) {
        while let Some(ch) = self.peek_char() {
            if ch == '\n' {
                break;
            }
            self.advance_char();
        }
    }

    fn skip_block_comment(&mut self) -> Result<(), LexerError> {
        let (line, column) = (self.line, self.column);
        self.advance_char();
        self.advance_char();

        let mut depth = 1usize;
        while depth > 0 {
            match (self.peek_char(), self.peek_next_char()) {
                (Some('/'), Some('*')) => {
                    self.advance_char();
                    self.advance_char();
                    depth += 1;
                }
                (Some('*'), Some('/')) => {
                    self.advance_char();
                    self.advance_char();
                    depth -= 1;
                }
                (Some(_), _) => {
                    self.advance_char();
                }
                (None, _) => return Err(LexerError::UnclosedComment { line, column }),
            }
        }
        Ok(())
    }

    fn lex_string(&mut self) -> Result<Token, LexerError> {
        let start = self.position;
        let start_line = self.line;
        let start_column = self.column;
        self.advance_char(); // consume opening quote

        let mut value = String::new();
        while let Some(ch) = self.peek_char() {
            match ch {
                '"' => {
                    self.advance_char(); // consume closing quote
                    let lexeme = self.slice(start, self.position);
                    return Ok(Token::new(
                        TokenKind::StringLiteral(value),
                        lexeme.to_string(),
                        start_line,
                        start_column,
                    ));
                }
                '\\' => {
                    let (line, column) = (self.line, self.column);
                    self.advance_char();
                    let escaped = match self.peek_char() {
                        Some('\\') => '\\',
                        Some('"') => '"',
                        Some('n') => '\n',
                        Some('r') => '\r',
                        Some('t') => '\t',
                        Some('b') => '\u{8}',
                        Some('u') => {
                            self.advance_char();
                            value.push(self.lex_unicode_escape(line, column)?);
                            continue;
                        }
                        Some('\n') | None => {
                            return Err(LexerError::UnterminatedString {
                                line: start_line,
                                column: start_column,
                            })
                        }
                        Some(other) => {
                            return Err(LexerError::InvalidEscape {
                                character: other,
                                line,
                                column,
                            })
                        }
                    };
                    value.push(escaped);
                    self.advance_char();
                }
                '\n' => break,
                _ => {
                    value.push(ch);
                    self.advance_char();
                }
            }
        }

        Err(LexerError::UnterminatedString {
            line: start_line,
            column: start_column,
        })
    }

    fn lex_unicode_escape(&mut self, line: usize, column: usize) -> Result<char, LexerError> {
        let mut code = 0u32;
        for _ in 0..4 {
            let digit = self
                .peek_char()
                .and_then(|ch| ch.to_digit(16))
                .ok_or(LexerError::MalformedUnicodeEscape { line, column })?;
            code = code * 16 + digit;
            self.advance_char();
        }
        char::from_u32(code).ok_or(LexerError::MalformedUnicodeEscape { line, column })
    }

    fn lex_number(&mut self) -> Token {
        let start = self.position;
        let start_line = self.line;
        let start_column = self.column;

        self.consume_digits();
        let kind = if self.peek_char() == Some('.')
            && self.peek_next_char().is_some_and(|ch| ch.is_ascii_digit())
        {
            self.advance_char(); // consume '.'
            self.consume_digits();
            TokenKind::DecimalLiteral
        } else {
            TokenKind::IntegerLiteral
        };

        Token::new(
            kind,
            self.slice(start, self.position).to_string(),
            start_line,
            start_column,
        )
    }

    fn consume_digits(&mut self) {
        while self.peek_char().is_some_and(|ch| ch.is_ascii_digit()) {
            self.advance_char();
        }
    }

    fn lex_identifier_or_keyword(&mut self) -> Token {
        let start = self.position;
        let start_line = self.line;
        let start_column = self.column;
        self.advance_char();

        while let Some(ch) = self.peek_char() {
            if ch.is_ascii_alphanumeric() || ch == '_' {
                self.advance_char();
            } else {
                break;
            }
        }

        let lexeme = self.slice(start, self.position).to_string();
        let kind = match lexeme.as_str() {
            "_" => TokenKind::Underscore,
            "true" => TokenKind::BooleanLiteral(true),
            "false" => TokenKind::BooleanLiteral(false),
            other => keyword_from_lexeme(other)
                .map(TokenKind::Keyword)
                .unwrap_or(TokenKind::Identifier),
        };
        Token::new(kind, lexeme, start_line, start_column)
    }

    /// Lexes `first` alone, or `first` followed by `second` as `paired`.
    fn either(&mut self, second: char, paired: TokenKind, single: TokenKind) -> Token {
        if self.peek_next_char() == Some(second) {
            self.pair_token(paired)
        } else {
            self.simple_token(single)
        }
    }

    fn pair_token(&mut self, kind: TokenKind) -> Token {
        let (line, column, start) = (self.line, self.column, self.position);
        self.advance_char();
        self.advance_char();
        Token::new(kind, self.slice(start, self.position).to_string(), line, column)
    }

    fn simple_token(&mut self, kind: TokenKind) -> Token {
        let (line, column, start) = (self.line, self.column, self.position);
        self.advance_char();
        Token::new(kind, self.slice(start, self.position).to_string(), line, column)
    }

    fn peek_char(&self) -> Option<char> {
        self.input[self.position..].chars().next()
    }

    fn peek_next_char(&self) -> Option<char> {
        let mut iter = self.input[self.position..].chars();
        iter.next()?;
        iter.next()
    }

    fn advance_char(&mut self) -> Option<char> {
        let ch = self.peek_char()?;
        self.position += ch.len_utf8();
        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(ch)
    }

    fn slice(&self, start: usize, end: usize) -> &str {
        &self.input[start..end]
    }
}

fn keyword_from_lexeme(lexeme: &str) -> Option<Keyword> {
    match lexeme {
        "def" => Some(Keyword::Def),
        "mut" => Some(Keyword::Mut),
        "return" => Some(Keyword::Return),
        "while" => Some(Keyword::While),
        "break" => Some(Keyword::Break),
        "continue" => Some(Keyword::Continue),
        "if" => Some(Keyword::If),
        "else" => Some(Keyword::Else),
        "record" => Some(Keyword::Record),
        "enum" => Some(Keyword::Enum),
        _ => None,
    }
}
