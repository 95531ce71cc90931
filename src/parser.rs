/*!
Recursive‑descent parser for slug **expressions**.

Cost is Θ(n) in the number of tokens: every token is consumed once through
`advance()`, and each production does O(1) work per token it consumes.
Two limits share [`MAX_NESTING`].  Descent depth counts entries into the
recursive `assignment` and `unary` rules, so a `(…)` level spends two.  Tree
height is measured on every node built, which also covers the left‑leaning
trees that the operator and `.name` loops produce without recursing.
Exceeding either one is a parse error.  The recursive rules run under
[`stack::guarded`](crate::stack::guarded), and so do the later tree walks.

### Logging Policy

| Location                 | Level  | Purpose                                   |
|--------------------------|--------|-------------------------------------------|
| `Parser::new`, `parse`   | `info` | Lifecycle milestones.                     |
| `assignment`, `primary`  | `debug`| Descent into grammar branches.            |
| Error paths              | `debug`| Logged by `SlugError::parse`.             |

--------------------------------------------------------------------------------
Grammar (EBNF)
--------------

```text
expression     → assignment ;
assignment     → logic_or ( "=" assignment )? ;
logic_or       → logic_and ( "or" logic_and )* ;
logic_and      → equality  ( "and" equality )* ;
equality       → comparison ( ( "!=" | "==" ) comparison )* ;
comparison     → term ( ( ">" | ">=" | "<" | "<=" ) term )* ;
term           → factor ( ( "-" | "+" ) factor )* ;
factor         → unary ( ( "/" | "*" ) unary )* ;
unary          → ( "!" | "-" | "not" ) unary | call ;
call           → primary ( "." IDENT )* ;
primary        → "False" | "True" | "None" | INTEGER | FLOAT | STRING
               | IDENT | "(" expression ")" ;
```

The assignment target is checked *after* the left side has been parsed:
only `Variable` and `Get` nodes may stand left of `=`.  `COMMENT` tokens are
dropped before parsing starts.  There is no error recovery: the first error
aborts the parse.
*/

use crate::ast::{Expr, ExprId};
use crate::error::{Result, SlugError};
use crate::stack;
use crate::token::{Token, TokenType};
use crate::value::Value;

use log::{debug, info};

/// Upper bound on both the descent depth and the height of a parsed tree.
pub const MAX_NESTING: usize = 1024;

static END_OF_INPUT: Token<'static> = Token {
    token_type: TokenType::EOF,
    lexeme: "",
    line: 0,
};

/// Parse a complete token stream as one expression.
pub fn parse<'a>(tokens: &'a [Token<'a>]) -> Result<Expr<'a>> {
    Parser::new(tokens).parse()
}

/// Expression parser over a borrowed token slice.
pub struct Parser<'a> {
    tokens: Vec<&'a Token<'a>>,
    current: usize,
    next_id: u32,
    depth: usize,
    /// Height of the subtree finished last.
    height: usize,
}

impl<'a> Parser<'a> {
    /// Construct a new parser.  Comment tokens are filtered out here.
    pub fn new(tokens: &'a [Token<'a>]) -> Self {
        let tokens: Vec<&'a Token<'a>> = tokens
            .iter()
            .filter(|t| !matches!(t.token_type, TokenType::COMMENT(_)))
            .collect();

        info!("Parser created with {} tokens", tokens.len());

        Self {
            tokens,
            current: 0,
            next_id: 0,
            depth: 0,
            height: 0,
        }
    }

    // ───────────────────────── public API ─────────────────────────

    /// Parse the whole stream as a single expression followed by `EOF`.
    pub fn parse(&mut self) -> Result<Expr<'a>> {
        info!("Beginning parse phase");

        let expr: Expr<'a> = self.expression()?;

        if !self.is_at_end() {
            return Err(error_at(self.peek(), "Expect end of expression."));
        }

        info!("Parsed expression with {} variable node(s)", self.next_id);

        Ok(expr)
    }

    /// Parse one expression starting at the current token, leaving any
    /// remaining tokens unconsumed.  Each call starts with a full nesting
    /// budget, also after a failed call.
    pub fn expression(&mut self) -> Result<Expr<'a>> {
        self.depth = 0;

        self.assignment()
    }

    // ─────────────────────── expression rules ─────────────────────

    fn assignment(&mut self) -> Result<Expr<'a>> {
        stack::guarded(|| self.assignment_rule())
    }

    fn assignment_rule(&mut self) -> Result<Expr<'a>> {
        let base: usize = self.depth;
        self.enter()?;

        let expr: Expr<'a> = self.logical_or()?;

        let expr = if self.matches(TokenType::EQUAL) {
            let equals: &'a Token<'a> = self.previous();
            let target_height: usize = self.height;
            let value: Expr<'a> = self.assignment()?;

            debug!("Assignment at line {}", equals.line);

            let expr = match expr {
                Expr::Variable { id, name } => Expr::Assign {
                    id,
                    name,
                    value: Box::new(value),
                },

                Expr::Get { object, name } => Expr::Set {
                    object,
                    name,
                    value: Box::new(value),
                },

                _ => return Err(error_at(equals, "Invalid assignment target.")),
            };

            self.join(target_height, equals)?;

            expr
        } else {
            expr
        };

        self.depth = base;

        Ok(expr)
    }

    fn logical_or(&mut self) -> Result<Expr<'a>> {
        let mut expr: Expr<'a> = self.logical_and()?;

        while self.matches(TokenType::OR) {
            let operator: &'a Token<'a> = self.previous();
            let left_height: usize = self.height;
            let right: Expr<'a> = self.logical_and()?;

            self.join(left_height, operator)?;

            expr = Expr::Logical {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            };
        }

        Ok(expr)
    }

    fn logical_and(&mut self) -> Result<Expr<'a>> {
        let mut expr: Expr<'a> = self.equality()?;

        while self.matches(TokenType::AND) {
            let operator: &'a Token<'a> = self.previous();
            let left_height: usize = self.height;
            let right: Expr<'a> = self.equality()?;

            self.join(left_height, operator)?;

            expr = Expr::Logical {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            };
        }

        Ok(expr)
    }

    fn equality(&mut self) -> Result<Expr<'a>> {
        let mut expr: Expr<'a> = self.comparison()?;

        while self.matches(TokenType::BANG_EQUAL) || self.matches(TokenType::EQUAL_EQUAL) {
            let operator: &'a Token<'a> = self.previous();
            let left_height: usize = self.height;
            let right: Expr<'a> = self.comparison()?;

            self.join(left_height, operator)?;
            expr = binary(expr, operator, right);
        }

        Ok(expr)
    }

    fn comparison(&mut self) -> Result<Expr<'a>> {
        let mut expr: Expr<'a> = self.term()?;

        while self.matches(TokenType::GREATER)
            || self.matches(TokenType::GREATER_EQUAL)
            || self.matches(TokenType::LESS)
            || self.matches(TokenType::LESS_EQUAL)
        {
            let operator: &'a Token<'a> = self.previous();
            let left_height: usize = self.height;
            let right: Expr<'a> = self.term()?;

            self.join(left_height, operator)?;
            expr = binary(expr, operator, right);
        }

        Ok(expr)
    }

    fn term(&mut self) -> Result<Expr<'a>> {
        let mut expr: Expr<'a> = self.factor()?;

        while self.matches(TokenType::MINUS) || self.matches(TokenType::PLUS) {
            let operator: &'a Token<'a> = self.previous();
            let left_height: usize = self.height;
            let right: Expr<'a> = self.factor()?;

            self.join(left_height, operator)?;
            expr = binary(expr, operator, right);
        }

        Ok(expr)
    }

    fn factor(&mut self) -> Result<Expr<'a>> {
        let mut expr: Expr<'a> = self.unary()?;

        while self.matches(TokenType::STAR) || self.matches(TokenType::SLASH) {
            let operator: &'a Token<'a> = self.previous();
            let left_height: usize = self.height;
            let right: Expr<'a> = self.unary()?;

            self.join(left_height, operator)?;
            expr = binary(expr, operator, right);
        }

        Ok(expr)
    }

    fn unary(&mut self) -> Result<Expr<'a>> {
        stack::guarded(|| self.unary_rule())
    }

    fn unary_rule(&mut self) -> Result<Expr<'a>> {
        let base: usize = self.depth;
        self.enter()?;

        let expr = if self.matches(TokenType::BANG)
            || self.matches(TokenType::MINUS)
            || self.matches(TokenType::NOT)
        {
            let operator: &'a Token<'a> = self.previous();
            let right: Expr<'a> = self.unary()?;

            self.join(0, operator)?;

            Expr::Unary {
                operator,
                right: Box::new(right),
            }
        } else {
            self.call()?
        };

        self.depth = base;

        Ok(expr)
    }

    fn call(&mut self) -> Result<Expr<'a>> {
        let mut expr: Expr<'a> = self.primary()?;

        while self.matches(TokenType::DOT) {
            let name: &'a Token<'a> =
                self.consume(TokenType::IDENTIFIER, "Expect property name after '.'.")?;

            self.join(0, name)?;

            expr = Expr::Get {
                object: Box::new(expr),
                name,
            };
        }

        Ok(expr)
    }

    fn primary(&mut self) -> Result<Expr<'a>> {
        let token: &'a Token<'a> = self.peek();

        debug!("primary at {}", token);

        let literal: Option<Value> = match &token.token_type {
            TokenType::FALSE => Some(Value::Bool(false)),
            TokenType::TRUE => Some(Value::Bool(true)),
            TokenType::NONE => Some(Value::None),
            TokenType::INTEGER(n) => Some(Value::Integer(*n)),
            TokenType::FLOAT(n) => Some(Value::Float(*n)),
            TokenType::STRING(s) => Some(Value::String(s.clone())),
            _ => None,
        };

        if let Some(value) = literal {
            self.advance();
            self.height = 1;

            return Ok(Expr::Literal(value));
        }

        if self.matches(TokenType::IDENTIFIER) {
            self.height = 1;

            return Ok(Expr::Variable {
                id: self.fresh_id(),
                name: self.previous(),
            });
        }

        if self.matches(TokenType::LEFT_PAREN) {
            let expr: Expr<'a> = self.assignment()?;

            self.consume(TokenType::RIGHT_PAREN, "Expect ')' after expression.")?;
            self.join(0, token)?;

            return Ok(Expr::Grouping(Box::new(expr)));
        }

        Err(error_at(token, "Expect expression."))
    }

    // ────────────────────── utility helpers ───────────────────────

    fn fresh_id(&mut self) -> ExprId {
        let id = ExprId(self.next_id);
        self.next_id += 1;
        id
    }

    fn enter(&mut self) -> Result<()> {
        self.depth += 1;

        if self.depth > MAX_NESTING {
            return Err(error_at(self.peek(), "Expression nested too deeply."));
        }

        Ok(())
    }

    /// Account for a node whose children have heights `other` and
    /// `self.height`.
    fn join(&mut self, other: usize, at: &Token<'_>) -> Result<()> {
        self.height = self.height.max(other) + 1;

        if self.height > MAX_NESTING {
            return Err(error_at(at, "Expression nested too deeply."));
        }

        Ok(())
    }

    #[inline(always)]
    fn matches(&mut self, ttype: TokenType) -> bool {
        if self.check(ttype) {
            self.advance();

            return true;
        }

        false
    }

    #[inline(always)]
    fn consume(&mut self, ttype: TokenType, message: &str) -> Result<&'a Token<'a>> {
        if self.check(ttype) {
            return Ok(self.advance());
        }

        Err(error_at(self.peek(), message))
    }

    #[inline(always)]
    fn check(&self, ttype: TokenType) -> bool {
        if self.is_at_end() {
            return false;
        }

        self.peek().token_type == ttype
    }

    #[inline(always)]
    fn advance(&mut self) -> &'a Token<'a> {
        if !self.is_at_end() {
            self.current += 1;
        }

        self.previous()
    }

    #[inline(always)]
    fn is_at_end(&self) -> bool {
        matches!(self.peek().token_type, TokenType::EOF)
    }

    /// Current token; a stream missing its `EOF` behaves as if it had one.
    #[inline(always)]
    fn peek(&self) -> &'a Token<'a> {
        self.tokens
            .get(self.current)
            .copied()
            .unwrap_or(&END_OF_INPUT)
    }

    #[inline(always)]
    fn previous(&self) -> &'a Token<'a> {
        self.tokens[self.current - 1]
    }
}

fn binary<'a>(left: Expr<'a>, operator: &'a Token<'a>, right: Expr<'a>) -> Expr<'a> {
    Expr::Binary {
        left: Box::new(left),
        operator,
        right: Box::new(right),
    }
}

fn error_at(token: &Token<'_>, message: &str) -> SlugError {
    let lexeme: &str = match token.token_type {
        TokenType::EOF => "end",
        _ => token.lexeme,
    };

    SlugError::parse(lexeme, token.line, message)
}
