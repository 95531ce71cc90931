//! Module `scanner` implements a one‑pass, streaming lexer for the slug language.
//!
//! It transforms a source string into a sequence of `Token<'a>`s, skipping
//! whitespace and emitting exactly one `EOF` token at the end. Comments are
//! *not* skipped: they become `COMMENT` tokens so the stream stays lossless.
//! Designed as a `FusedIterator`, it can be chained safely with other
//! iterator adapters.
//!
//! # Public API
//!
//! - `scan(source: &str) -> Result<Vec<Token>>`
//!   Scan the whole input, stopping at the first lexical error.
//!
//! - `Scanner::new(source: &'a str) -> Scanner<'a>`
//!   Create a lexer over the input.
//!
//! - `impl Iterator for Scanner<'a>`
//!   Yields `Result<Token<'a>, SlugError>` on each `.next()`. After an error
//!   the scanner resumes with the next character, so callers that want *every*
//!   diagnostic (the `tokenize` command) can keep pulling.
//!
//! # Token Recognition (`scan_token`)
//!
//! - Single‑character tokens: `(`, `)`, `{`, `}`, `,`, `.`, `-`, `+`, `;`, `*`, `/`.
//! - One‑or‑two character operators: `!`, `!=`, `=`, `==`, `<`, `<=`, `>`, `>=`.
//! - Comments: `#` to end of line, `## … ##` across lines. An unclosed block
//!   comment runs to the end of input without an error.
//! - String literals: `'…'` or `"…"`, multi‑line, no escapes. Unterminated
//!   strings are reported at the line where they *opened*.
//! - Numeric literals: digits with `_` separators and an optional fraction.
//!   A `.` in the text makes it a `FLOAT`, otherwise an `INTEGER`.
//! - Identifiers/keywords: letter‑leading alphanumeric/`_` sequences,
//!   resolved via a perfect‑hash `KEYWORDS` map.
//!
//! Every token is stamped with the line of its *first* character.

use crate::error::{Result, SlugError};
use crate::token::{Token, TokenType};
use log::{debug, info};
use memchr::{memchr, memchr_iter, memmem};
use phf::phf_map;
use std::iter::FusedIterator;

// ─────────────────────────────────────────────────────────────────────────────
// Static keyword map (compile‑time perfect hash)
// ─────────────────────────────────────────────────────────────────────────────

static KEYWORDS: phf::Map<&'static [u8], TokenType> = phf_map! {
    b"and"    => TokenType::AND,
    b"not"    => TokenType::NOT,
    b"struct" => TokenType::STRUCT,
    b"class"  => TokenType::CLASS,
    b"else"   => TokenType::ELSE,
    b"False"  => TokenType::FALSE,
    b"fun"    => TokenType::FUN,
    b"for"    => TokenType::FOR,
    b"if"     => TokenType::IF,
    b"nil"    => TokenType::NIL,
    b"None"   => TokenType::NONE,
    b"or"     => TokenType::OR,
    b"print"  => TokenType::PRINT,
    b"return" => TokenType::RETURN,
    b"super"  => TokenType::SUPER,
    b"this"   => TokenType::THIS,
    b"True"   => TokenType::TRUE,
    b"var"    => TokenType::VAR,
    b"while"  => TokenType::WHILE,
};

/// Scan `source` completely.
///
/// Returns every token up to and including the single trailing `EOF`, or the
/// first lexical error. Never returns a partial sequence.
pub fn scan(source: &str) -> Result<Vec<Token<'_>>> {
    let tokens: Vec<Token<'_>> = Scanner::new(source).collect::<Result<_>>()?;

    info!("Scanned {} tokens", tokens.len());

    Ok(tokens)
}

/// A single pass **scanner / lexer** that converts source text into a
/// sequence of [`Token`]s.  The lifetime `'a` ties every emitted token’s
/// `lexeme` slice back to the original source buffer.
pub struct Scanner<'a> {
    source: &'a str,            // entire source text
    src: &'a [u8],              // same text, byte view for the hot loop
    start: usize,               // index of the *first* byte of the current lexeme
    curr: usize,                // index *one past* the last byte examined
    line: usize,                // 1‑based line counter (\n increments)
    start_line: usize,          // line on which the current lexeme began
    pending: Option<TokenType>, // recognised token kind waiting to be emitted
}

impl<'a> Scanner<'a> {
    /// Create a new lexer over `source`.
    #[inline]
    pub fn new(source: &'a str) -> Self {
        info!("Scanner created over {} bytes", source.len());

        Self {
            source,
            src: source.as_bytes(),
            start: 0,
            curr: 0,
            line: 1,
            start_line: 1,
            pending: None,
        }
    }

    /// Current line counter.  After the stream is exhausted this is the
    /// number of the last line of input.
    pub fn line(&self) -> usize {
        self.line
    }

    // ───────────────────────────── primitive helpers ────────────────────────

    #[inline(always)]
    const fn len(&self) -> usize {
        self.src.len()
    }

    #[inline(always)]
    fn is_at_end(&self) -> bool {
        self.curr >= self.len()
    }

    /// Advance one byte and return it.  *Panics* if called at EOF – higher‑level
    /// code always guards with [`is_at_end`].
    #[inline(always)]
    fn advance(&mut self) -> u8 {
        let b = self.src[self.curr];
        self.curr += 1;
        b
    }

    /// Peek at the current byte without consuming it.  Returns `0` if past EOF
    /// to avoid branching at call‑site.
    #[inline(always)]
    fn peek(&self) -> u8 {
        if self.is_at_end() {
            0
        } else {
            self.src[self.curr]
        }
    }

    /// Peek one byte beyond [`peek`].  Safe at EOF.
    #[inline(always)]
    fn peek_next(&self) -> u8 {
        if self.curr + 1 >= self.len() {
            0
        } else {
            self.src[self.curr + 1]
        }
    }

    /// Conditionally consume a byte **iff** it matches `expected`.
    #[inline(always)]
    fn match_byte(&mut self, expected: u8) -> bool {
        if !self.is_at_end() && self.peek() == expected {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Pick the one‑ or two‑byte form of an operator.
    #[inline(always)]
    fn either(&mut self, next: u8, two: TokenType, one: TokenType) -> TokenType {
        if self.match_byte(next) {
            two
        } else {
            one
        }
    }

    // ───────────────────────────── core lexing ─────────────────────────────

    /// Scan a *single* token starting at `self.curr`.  If the lexeme produces an
    /// actual token the kind is stored in `self.pending`.  Whitespace is
    /// skipped by returning `Ok(())` with `pending = None`.
    fn scan_token(&mut self) -> Result<()> {
        let b = self.advance();

        let tt = match b {
            // ── single‑character punctuators ──────────────────────────────
            b'(' => TokenType::LEFT_PAREN,
            b')' => TokenType::RIGHT_PAREN,
            b'{' => TokenType::LEFT_BRACE,
            b'}' => TokenType::RIGHT_BRACE,
            b',' => TokenType::COMMA,
            b'.' => TokenType::DOT,
            b'-' => TokenType::MINUS,
            b'+' => TokenType::PLUS,
            b';' => TokenType::SEMICOLON,
            b'*' => TokenType::STAR,
            b'/' => TokenType::SLASH,

            // ── one‑or‑two‑character operators ───────────────────────────
            b'!' => self.either(b'=', TokenType::BANG_EQUAL, TokenType::BANG),
            b'=' => self.either(b'=', TokenType::EQUAL_EQUAL, TokenType::EQUAL),
            b'<' => self.either(b'=', TokenType::LESS_EQUAL, TokenType::LESS),
            b'>' => self.either(b'=', TokenType::GREATER_EQUAL, TokenType::GREATER),

            // ── whitespace / newline ─────────────────────────────────────
            b' ' | b'\r' | b'\t' => return Ok(()),

            b'\n' => {
                self.line += 1;

                return Ok(());
            }

            // ── comments ─────────────────────────────────────────────────
            b'#' => {
                if self.match_byte(b'#') {
                    self.block_comment()
                } else {
                    self.line_comment()
                }
            }

            // ── string literal ───────────────────────────────────────────
            b'"' | b'\'' => self.parse_string(b)?,

            // ── number literal (digit‑leading) ───────────────────────────
            b'0'..=b'9' => self.parse_number()?,

            // ── identifiers / keywords (letter‑leading) ──────────────────
            b'a'..=b'z' | b'A'..=b'Z' => self.parse_identifier(),

            // ── unexpected character ─────────────────────────────────────
            _ => {
                // Report the whole code point and resume after it so the
                // cursor never lands inside a multi‑byte sequence.
                let c: char = self.source[self.start..]
                    .chars()
                    .next()
                    .unwrap_or(char::REPLACEMENT_CHARACTER);
                self.curr = self.start + c.len_utf8();

                return Err(SlugError::lex(
                    self.line,
                    format!("Unexpected character: {}", c),
                ));
            }
        };

        self.pending = Some(tt);

        Ok(())
    }

    /// `# …` up to (not including) the newline.
    fn line_comment(&mut self) -> TokenType {
        // Fast‑forward to next newline using `memchr`.  If none found, skip to EOF.
        match memchr(b'\n', &self.src[self.curr..]) {
            Some(pos) => self.curr += pos,
            None => self.curr = self.len(),
        }

        TokenType::COMMENT(self.source[self.start + 1..self.curr].to_owned())
    }

    /// `## … ##`, possibly spanning lines.  The opener has been consumed.
    fn block_comment(&mut self) -> TokenType {
        let rest: &[u8] = &self.src[self.curr..];

        let (body_len, closed) = match memmem::find(rest, b"##") {
            Some(pos) => (pos, true),
            None => (rest.len(), false),
        };

        self.line += memchr_iter(b'\n', &rest[..body_len]).count();

        let body: String = self.source[self.curr..self.curr + body_len].to_owned();

        self.curr += body_len;

        if closed {
            self.curr += 2;
        } else {
            debug!(
                "Block comment opened on line {} runs to end of input",
                self.start_line
            );
        }

        TokenType::COMMENT(body)
    }

    /// Parse a quoted string literal.  `quote` is the opening delimiter and
    /// only the same byte closes it.
    ///
    /// * `self.start` still points to the opening quote.
    /// * When we return, `self.curr` points **past** the closing quote.
    fn parse_string(&mut self, quote: u8) -> Result<TokenType> {
        while !self.is_at_end() && self.peek() != quote {
            if self.advance() == b'\n' {
                self.line += 1;
            }
        }

        if self.is_at_end() {
            return Err(SlugError::lex(self.start_line, "Unterminated string."));
        }

        self.advance(); // consume closing quote

        // Slice excluding the surrounding quotes.
        let s: &str = &self.source[self.start + 1..self.curr - 1];

        Ok(TokenType::STRING(s.to_owned()))
    }

    #[inline(always)]
    fn consume_digits(&mut self) {
        while self.peek().is_ascii_digit() || self.peek() == b'_' {
            self.advance();
        }
    }

    /// Parse a numeric literal (`123`, `1_000`, `3.14`).  Fractions are optional.
    fn parse_number(&mut self) -> Result<TokenType> {
        self.consume_digits();

        // Optional fractional part.  A dot not followed by a digit is left
        // for the next token (`1.foo`).
        if self.peek() == b'.' && self.peek_next().is_ascii_digit() {
            self.advance(); // consume "."

            self.consume_digits();
        }

        let text: &str = &self.source[self.start..self.curr];

        if !separators_are_embedded(text.as_bytes()) {
            return Err(SlugError::lex(
                self.line,
                format!("Invalid number literal: {}", text),
            ));
        }

        let digits: String = text.chars().filter(|c| *c != '_').collect();

        let tt = if text.contains('.') {
            digits.parse::<f64>().map(TokenType::FLOAT).ok()
        } else {
            digits.parse::<i64>().map(TokenType::INTEGER).ok()
        };

        tt.ok_or_else(|| SlugError::lex(self.line, format!("Invalid number literal: {}", text)))
    }

    /// Parse an identifier and decide if it is a **keyword** or a generic
    /// `IDENTIFIER` token.
    fn parse_identifier(&mut self) -> TokenType {
        while {
            let c: u8 = self.peek();
            c.is_ascii_alphanumeric() || c == b'_'
        } {
            self.advance();
        }

        let slice: &[u8] = &self.src[self.start..self.curr];

        KEYWORDS
            .get(slice)
            .cloned()
            .unwrap_or(TokenType::IDENTIFIER)
    }
}

/// Every `_` must sit between two digits.
fn separators_are_embedded(text: &[u8]) -> bool {
    text.iter().enumerate().all(|(i, b)| {
        *b != b'_'
            || (i > 0
                && text[i - 1].is_ascii_digit()
                && text.get(i + 1).is_some_and(u8::is_ascii_digit))
    })
}

// ───────────────────────── Iterator implementation ─────────────────────────

impl<'a> Iterator for Scanner<'a> {
    type Item = Result<Token<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        // Loop until we either emit a token, hit EOF, or see an error.
        while self.curr <= self.len() {
            // 1. EOF guard – emit exactly one EOF then terminate.
            if self.curr == self.len() {
                self.curr += 1; // ensure fused semantics
                return Some(Ok(Token::new(TokenType::EOF, "", self.line)));
            }

            // 2. Reset per‑token state.
            self.start = self.curr;
            self.start_line = self.line;
            self.pending = None;

            // 3. Attempt to scan a token.
            if let Err(e) = self.scan_token() {
                return Some(Err(e));
            }

            // 4. If a real token was recognised, build and return it.
            if let Some(tt) = self.pending.take() {
                let source: &'a str = self.source;
                let lex: &'a str = &source[self.start..self.curr];
                debug!("Scanned token ({:?}) on line {}", tt, self.start_line);

                return Some(Ok(Token::new(tt, lex, self.start_line)));
            }
            // Otherwise it was whitespace → continue loop.
        }

        None // already yielded EOF
    }
}

impl<'a> FusedIterator for Scanner<'a> {}
