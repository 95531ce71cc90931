use crate::ast::Expr;
use crate::stack;

/// Converts an expression to a parenthesised prefix form such as
/// `(Binary + (Literal 1) (Variable x))`.
pub struct AstPrinter;

impl AstPrinter {
    pub fn print(expr: &Expr<'_>) -> String {
        stack::guarded(|| Self::print_node(expr))
    }

    fn print_node(expr: &Expr<'_>) -> String {
        match expr {
            Expr::Literal(value) => format!("(Literal {})", value),

            Expr::Grouping(inner) => format!("(Group {})", Self::print(inner)),

            Expr::Variable { name, .. } => format!("(Variable {})", name.lexeme),

            Expr::Assign { name, value, .. } => {
                format!("(Assign {} {})", name.lexeme, Self::print(value))
            }

            Expr::Get { object, name } => format!("(Get {} {})", Self::print(object), name.lexeme),

            Expr::Set {
                object,
                name,
                value,
            } => format!(
                "(Set {} {} {})",
                Self::print(object),
                name.lexeme,
                Self::print(value)
            ),

            Expr::Unary { operator, right } => {
                format!("(Unary {} {})", operator.lexeme, Self::print(right))
            }

            Expr::Binary {
                left,
                operator,
                right,
            } => format!(
                "(Binary {} {} {})",
                operator.lexeme,
                Self::print(left),
                Self::print(right)
            ),

            Expr::Logical {
                left,
                operator,
                right,
            } => format!(
                "(Logical {} {} {})",
                operator.lexeme,
                Self::print(left),
                Self::print(right)
            ),
        }
    }
}
