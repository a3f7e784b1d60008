//! Tokenizer for expression source text.
//!
//! The lexer yields [`Spanned`] tokens carrying their byte offset. String
//! literals are decoded here, so later passes never see quote characters;
//! the identifier extractor relies on this to ignore names inside strings.

use crate::error::{ExprError, Result};

/// Punctuation and operator tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Punct {
    LParen,
    RParen,
    LBracket,
    RBracket,
    Comma,
    Dot,
    QuestionDot,
    Question,
    Colon,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Bang,
    EqEq,
    NotEq,
    EqEqEq,
    NotEqEq,
    Lt,
    Lte,
    Gt,
    Gte,
    AndAnd,
    OrOr,
    Coalesce,
}

/// Token types produced by the lexer.
#[derive(Debug, Clone, PartialEq)]
pub enum Token<'a> {
    /// Numeric literal.
    Number(f64),
    /// String literal, already unescaped.
    Str(String),
    /// Identifier or keyword (`true`, `null`, ...).
    Ident(&'a str),
    /// Compiled-program slot reference: `$0`, `$1`, ...
    Slot(usize),
    /// Operator or punctuation.
    Punct(Punct),
}

/// A token together with the byte offset where it starts.
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned<'a> {
    pub token: Token<'a>,
    pub offset: usize,
}

/// Lexer over expression source text.
///
/// Iteration stops after the first error.
pub struct Lexer<'a> {
    input: &'a str,
    pos: usize,
    failed: bool,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            pos: 0,
            failed: false,
        }
    }

    /// Tokenizes the whole input.
    pub fn tokenize(input: &'a str) -> Result<Vec<Spanned<'a>>> {
        Lexer::new(input).collect()
    }

    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn peek_char(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn skip_whitespace(&mut self) {
        let trimmed = self.rest().trim_start();
        self.pos = self.input.len() - trimmed.len();
    }

    fn lex_identifier(&mut self) -> Token<'a> {
        let start = self.pos;
        let rest = self.rest();
        let len = rest
            .char_indices()
            .find(|&(i, c)| !(is_ident_continue(c) || (i == 0 && is_ident_start(c))))
            .map(|(i, _)| i)
            .unwrap_or(rest.len());
        self.pos += len;
        let word = &self.input[start..self.pos];

        // `$` followed only by digits is a slot reference
        if let Some(digits) = word.strip_prefix('$') {
            if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
                if let Ok(index) = digits.parse() {
                    return Token::Slot(index);
                }
            }
        }
        Token::Ident(word)
    }

    fn lex_number(&mut self) -> Result<Token<'a>> {
        let start = self.pos;
        let rest = self.rest();

        if rest.starts_with("0x") || rest.starts_with("0X") {
            let digits: &str = &rest[2..];
            let len = digits
                .find(|c: char| !c.is_ascii_hexdigit())
                .unwrap_or(digits.len());
            if len == 0 {
                return Err(ExprError::syntax("malformed hexadecimal literal", start));
            }
            let value = u64::from_str_radix(&digits[..len], 16)
                .map_err(|_| ExprError::syntax("hexadecimal literal out of range", start))?;
            self.pos += 2 + len;
            self.reject_trailing_ident(start)?;
            return Ok(Token::Number(value as f64));
        }

        let bytes = rest.as_bytes();
        let mut i = 0;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        if i < bytes.len() && bytes[i] == b'.' {
            i += 1;
            while i < bytes.len() && bytes[i].is_ascii_digit() {
                i += 1;
            }
        }
        if i < bytes.len() && (bytes[i] == b'e' || bytes[i] == b'E') {
            let mut j = i + 1;
            if j < bytes.len() && (bytes[j] == b'+' || bytes[j] == b'-') {
                j += 1;
            }
            if j < bytes.len() && bytes[j].is_ascii_digit() {
                while j < bytes.len() && bytes[j].is_ascii_digit() {
                    j += 1;
                }
                i = j;
            }
        }

        let text = &rest[..i];
        let value: f64 = text
            .parse()
            .map_err(|_| ExprError::syntax(format!("malformed number '{}'", text), start))?;
        self.pos += i;
        self.reject_trailing_ident(start)?;
        Ok(Token::Number(value))
    }

    fn reject_trailing_ident(&self, start: usize) -> Result<()> {
        match self.peek_char() {
            Some(c) if is_ident_continue(c) => Err(ExprError::syntax(
                "identifier starts immediately after numeric literal",
                start,
            )),
            _ => Ok(()),
        }
    }

    fn lex_string(&mut self, quote: char) -> Result<Token<'a>> {
        let start = self.pos;
        let mut out = String::new();
        let mut chars = self.input[start + 1..].char_indices();

        while let Some((i, c)) = chars.next() {
            if c == quote {
                self.pos = start + 1 + i + c.len_utf8();
                return Ok(Token::Str(out));
            }
            if c != '\\' {
                out.push(c);
                continue;
            }
            let Some((_, esc)) = chars.next() else {
                break;
            };
            match esc {
                'n' => out.push('\n'),
                'r' => out.push('\r'),
                't' => out.push('\t'),
                '0' => out.push('\0'),
                'b' => out.push('\u{8}'),
                'f' => out.push('\u{c}'),
                'v' => out.push('\u{b}'),
                'x' => {
                    let hex: String = chars.by_ref().take(2).map(|(_, c)| c).collect();
                    out.push(decode_hex_escape(&hex, start)?);
                }
                'u' => {
                    let code = if chars.clone().next().map(|(_, c)| c) == Some('{') {
                        chars.next();
                        let mut hex = String::new();
                        for (_, c) in chars.by_ref() {
                            if c == '}' {
                                break;
                            }
                            hex.push(c);
                        }
                        hex
                    } else {
                        chars.by_ref().take(4).map(|(_, c)| c).collect()
                    };
                    out.push(decode_hex_escape(&code, start)?);
                }
                // \\, \', \" and any unknown escape yield the character itself
                other => out.push(other),
            }
        }

        Err(ExprError::syntax("unterminated string literal", start))
    }

    fn lex_punct(&mut self) -> Result<Token<'a>> {
        const PUNCTS: &[(&str, Punct)] = &[
            ("===", Punct::EqEqEq),
            ("!==", Punct::NotEqEq),
            ("==", Punct::EqEq),
            ("!=", Punct::NotEq),
            ("<=", Punct::Lte),
            (">=", Punct::Gte),
            ("&&", Punct::AndAnd),
            ("||", Punct::OrOr),
            ("??", Punct::Coalesce),
            ("?.", Punct::QuestionDot),
            ("(", Punct::LParen),
            (")", Punct::RParen),
            ("[", Punct::LBracket),
            ("]", Punct::RBracket),
            (",", Punct::Comma),
            (".", Punct::Dot),
            ("?", Punct::Question),
            (":", Punct::Colon),
            ("+", Punct::Plus),
            ("-", Punct::Minus),
            ("*", Punct::Star),
            ("/", Punct::Slash),
            ("%", Punct::Percent),
            ("!", Punct::Bang),
            ("<", Punct::Lt),
            (">", Punct::Gt),
        ];

        let rest = self.rest();
        for (text, punct) in PUNCTS {
            if rest.starts_with(text) {
                // `a?.5:1` is a conditional, not optional chaining
                if *punct == Punct::QuestionDot
                    && rest[2..].starts_with(|c: char| c.is_ascii_digit())
                {
                    continue;
                }
                self.pos += text.len();
                return Ok(Token::Punct(*punct));
            }
        }

        let c = self.peek_char().unwrap_or_default();
        Err(ExprError::syntax(
            format!("unexpected character '{}'", c),
            self.pos,
        ))
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Result<Spanned<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        self.skip_whitespace();
        let offset = self.pos;
        let c = self.peek_char()?;

        let token = if is_ident_start(c) {
            Ok(self.lex_identifier())
        } else if c.is_ascii_digit()
            || (c == '.' && self.rest()[1..].starts_with(|d: char| d.is_ascii_digit()))
        {
            self.lex_number()
        } else if c == '\'' || c == '"' {
            self.lex_string(c)
        } else {
            self.lex_punct()
        };

        match token {
            Ok(token) => Some(Ok(Spanned { token, offset })),
            Err(err) => {
                self.failed = true;
                Some(Err(err))
            }
        }
    }
}

/// Characters that may start an identifier: letters, `_` and `$`.
pub fn is_ident_start(c: char) -> bool {
    c == '$' || c == '_' || c.is_alphabetic()
}

/// Characters that may continue an identifier.
pub fn is_ident_continue(c: char) -> bool {
    is_ident_start(c) || c.is_alphanumeric()
}

fn decode_hex_escape(hex: &str, offset: usize) -> Result<char> {
    u32::from_str_radix(hex, 16)
        .ok()
        .filter(|_| !hex.is_empty())
        .and_then(char::from_u32)
        .ok_or_else(|| ExprError::syntax(format!("invalid escape sequence '{}'", hex), offset))
}
