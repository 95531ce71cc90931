use std::cell::RefCell;
use std::rc::Rc;

use log::{debug, info};

use crate::ast::{Expr, ExprId};
use crate::environment::{EnvRef, Environment};
use crate::error::{Result, SlugError};
use crate::resolver::Locals;
use crate::stack;
use crate::token::{Token, TokenType};
use crate::value::Value;

/// Tree‑walking evaluator.
///
/// Owns the global environment, the currently active environment and the
/// reference → distance map produced by the [`Resolver`](crate::resolver::Resolver).
/// Resolved references go straight to the scope at their distance; the rest
/// are treated as globals.
pub struct Interpreter {
    globals: EnvRef,
    environment: EnvRef,
    locals: Locals,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new(Locals::new())
    }
}

impl Interpreter {
    /// Creates an interpreter whose active scope is the global scope.
    ///
    /// `locals` must already hold every distance the evaluated trees need.
    pub fn new(locals: Locals) -> Self {
        info!("Initializing Interpreter with {} resolved reference(s)", locals.len());

        let globals: EnvRef = Rc::new(RefCell::new(Environment::new()));

        Self {
            environment: Rc::clone(&globals),
            globals,
            locals,
        }
    }

    pub fn globals(&self) -> EnvRef {
        Rc::clone(&self.globals)
    }

    /// The innermost active scope.
    pub fn environment(&self) -> EnvRef {
        Rc::clone(&self.environment)
    }

    /// Bind `name` in the active scope.
    pub fn define(&mut self, name: &str, value: Value) {
        debug!("Defining '{}' = {}", name, value);

        self.environment.borrow_mut().define(name, value);
    }

    /// Record that the reference `id` binds `depth` scopes out.
    ///
    /// For callers that drive resolution themselves; must happen before
    /// any evaluation that reaches `id`.
    pub fn note_local(&mut self, id: ExprId, depth: usize) {
        debug!("Noting {:?} at depth {}", id, depth);

        self.locals.insert(id, depth);
    }

    /// Enter a block: a fresh scope enclosed by the active one.
    pub fn begin_scope(&mut self) {
        let previous: EnvRef = Rc::clone(&self.environment);

        self.environment = Rc::new(RefCell::new(Environment::with_enclosing(previous)));

        debug!("Entered block scope");
    }

    /// Leave the innermost block, dropping its bindings.
    pub fn end_scope(&mut self) -> Result<()> {
        let enclosing: Option<EnvRef> = self.environment.borrow().enclosing();

        self.environment =
            enclosing.ok_or_else(|| SlugError::internal(None, "no block scope to leave"))?;

        debug!("Exited block scope");

        Ok(())
    }

    /// Evaluates an expression and returns a Value.
    pub fn evaluate(&mut self, expr: &Expr<'_>) -> Result<Value> {
        stack::guarded(|| self.evaluate_node(expr))
    }

    fn evaluate_node(&mut self, expr: &Expr<'_>) -> Result<Value> {
        debug!("Evaluating expression: {:?}", expr);

        let value = match expr {
            Expr::Literal(value) => value.clone(),

            Expr::Grouping(inner) => self.evaluate(inner)?,

            Expr::Variable { id, name } => self.lookup_variable(*id, name)?,

            Expr::Assign { id, name, value } => {
                let val = self.evaluate(value)?;
                self.assign_variable(*id, name, val.clone())?;
                val
            }

            Expr::Get { object, name } => {
                self.evaluate(object)?;
                return Err(SlugError::runtime(
                    name.line,
                    "Only instances have properties.",
                ));
            }

            Expr::Set { object, name, .. } => {
                self.evaluate(object)?;
                return Err(SlugError::runtime(
                    name.line,
                    "Only instances have fields.",
                ));
            }

            Expr::Unary { operator, right } => self.evaluate_unary(operator, right)?,

            Expr::Binary {
                left,
                operator,
                right,
            } => {
                let left_val = self.evaluate(left)?;
                let right_val = self.evaluate(right)?;
                binary(operator, left_val, right_val)?
            }

            Expr::Logical {
                left,
                operator,
                right,
            } => {
                let left_val = self.evaluate(left)?;
                let short_circuit = match operator.token_type {
                    TokenType::OR => left_val.is_truthy(),
                    _ => !left_val.is_truthy(),
                };

                if short_circuit {
                    left_val
                } else {
                    self.evaluate(right)?
                }
            }
        };

        debug!("Expression evaluated to: {}", value);

        Ok(value)
    }

    /// Resolved references read at their distance; unresolved ones read the
    /// globals only.
    fn lookup_variable(&self, id: ExprId, name: &Token<'_>) -> Result<Value> {
        match self.locals.get(&id) {
            Some(&distance) => {
                debug!("Looking up '{}' at distance {}", name.lexeme, distance);
                Environment::get_at(&self.environment, distance, name.lexeme, name.line)
            }
            None => {
                debug!("Looking up '{}' in globals", name.lexeme);
                self.globals.borrow().get(name.lexeme, name.line)
            }
        }
    }

    /// Resolved targets write at their distance; unresolved ones walk the
    /// chain from the active scope.
    fn assign_variable(&mut self, id: ExprId, name: &Token<'_>, value: Value) -> Result<()> {
        match self.locals.get(&id) {
            Some(&distance) => {
                Environment::assign_at(&self.environment, distance, name.lexeme, value, name.line)
            }
            None => {
                self.environment.borrow_mut().assign(name.lexeme, value);
                Ok(())
            }
        }
    }

    fn evaluate_unary(&mut self, op: &Token<'_>, expr: &Expr<'_>) -> Result<Value> {
        let right_val = self.evaluate(expr)?;

        match op.token_type {
            TokenType::MINUS => match right_val {
                Value::Integer(n) => n
                    .checked_neg()
                    .map(Value::Integer)
                    .ok_or_else(|| SlugError::runtime(op.line, "Integer overflow.")),
                Value::Float(n) => Ok(Value::Float(-n)),
                _ => Err(SlugError::runtime(op.line, "Operand must be a number.")),
            },

            TokenType::BANG | TokenType::NOT => Ok(Value::Bool(!right_val.is_truthy())),

            _ => Err(SlugError::internal(
                Some(op.line),
                format!("invalid unary operator '{}'", op.lexeme),
            )),
        }
    }
}

/// Applies an arithmetic, comparison or equality operator.
fn binary(op: &Token<'_>, left: Value, right: Value) -> Result<Value> {
    debug!("Binary {} on {} and {}", op.lexeme, left, right);

    match op.token_type {
        TokenType::EQUAL_EQUAL => return Ok(Value::Bool(left.loosely_equals(&right))),
        TokenType::BANG_EQUAL => return Ok(Value::Bool(!left.loosely_equals(&right))),
        _ => {}
    }

    if let (TokenType::PLUS, Value::String(a), Value::String(b)) = (&op.token_type, &left, &right)
    {
        return Ok(Value::String(format!("{}{}", a, b)));
    }

    if let (Value::Integer(a), Value::Integer(b)) = (&left, &right) {
        if let Some(result) = integer_arithmetic(op, *a, *b)? {
            return Ok(result);
        }
    }

    let (a, b) = match (left.as_f64(), right.as_f64()) {
        (Some(a), Some(b)) => (a, b),
        _ => {
            let msg = match op.token_type {
                TokenType::PLUS => format!(
                    "Operands must be two numbers or two strings, got {} and {}.",
                    left.type_name(),
                    right.type_name()
                ),
                _ => format!(
                    "Operands must be numbers, got {} and {}.",
                    left.type_name(),
                    right.type_name()
                ),
            };
            return Err(SlugError::runtime(op.line, msg));
        }
    };

    let value = match op.token_type {
        TokenType::PLUS => Value::Float(a + b),
        TokenType::MINUS => Value::Float(a - b),
        TokenType::STAR => Value::Float(a * b),
        TokenType::SLASH => {
            if b == 0.0 {
                return Err(SlugError::runtime(op.line, "Division by zero."));
            }
            Value::Float(a / b)
        }
        TokenType::LESS => Value::Bool(a < b),
        TokenType::LESS_EQUAL => Value::Bool(a <= b),
        TokenType::GREATER => Value::Bool(a > b),
        TokenType::GREATER_EQUAL => Value::Bool(a >= b),
        _ => {
            return Err(SlugError::internal(
                Some(op.line),
                format!("invalid binary operator '{}'", op.lexeme),
            ))
        }
    };

    Ok(value)
}

/// `+ - *` on two integers stay integral (checked).  Everything else,
/// including `/`, falls through to float arithmetic.
fn integer_arithmetic(op: &Token<'_>, a: i64, b: i64) -> Result<Option<Value>> {
    let result = match op.token_type {
        TokenType::PLUS => a.checked_add(b),
        TokenType::MINUS => a.checked_sub(b),
        TokenType::STAR => a.checked_mul(b),
        _ => return Ok(None),
    };

    result
        .map(|n| Some(Value::Integer(n)))
        .ok_or_else(|| SlugError::runtime(op.line, "Integer overflow."))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn op(token_type: TokenType, lexeme: &str) -> Token<'_> {
        Token::new(token_type, lexeme, 1)
    }

    #[test]
    fn integer_operands_stay_integral_except_division() {
        let plus = op(TokenType::PLUS, "+");
        let slash = op(TokenType::SLASH, "/");

        assert_eq!(
            binary(&plus, Value::Integer(2), Value::Integer(3)).unwrap(),
            Value::Integer(5)
        );
        assert_eq!(
            binary(&slash, Value::Integer(7), Value::Integer(2)).unwrap(),
            Value::Float(3.5)
        );
    }

    #[test]
    fn overflow_is_a_runtime_error() {
        let star = op(TokenType::STAR, "*");

        let err = binary(&star, Value::Integer(i64::MAX), Value::Integer(2)).unwrap_err();
        assert!(matches!(err, SlugError::Runtime { .. }));
    }

    #[test]
    fn mixed_numbers_compare_numerically() {
        let less = op(TokenType::LESS, "<");
        let eq = op(TokenType::EQUAL_EQUAL, "==");

        assert_eq!(
            binary(&less, Value::Integer(1), Value::Float(1.5)).unwrap(),
            Value::Bool(true)
        );
        assert_eq!(
            binary(&eq, Value::Integer(2), Value::Float(2.0)).unwrap(),
            Value::Bool(true)
        );
    }
}
