use pretty_assertions::assert_eq;
use slug::ast::{Expr, ExprId};
use slug::ast_printer::AstPrinter;
use slug::error::SlugError;
use slug::parser::{parse, Parser, MAX_NESTING};
use slug::scanner::scan;
use slug::value::Value;

fn printed(source: &str) -> String {
    let tokens = scan(source).expect("source should scan");
    let expr = parse(&tokens).expect("source should parse");

    AstPrinter::print(&expr)
}

fn parse_error(source: &str) -> (String, String, usize) {
    let tokens = scan(source).expect("source should scan");

    match parse(&tokens) {
        Err(SlugError::Parse {
            message,
            lexeme,
            line,
        }) => (message, lexeme, line),
        other => panic!("expected a parse error, got {:?}", other),
    }
}

#[test]
fn primaries() {
    assert_eq!(printed("True"), "(Literal True)");
    assert_eq!(printed("False"), "(Literal False)");
    assert_eq!(printed("None"), "(Literal None)");
    assert_eq!(printed("42"), "(Literal 42)");
    assert_eq!(printed("2.5"), "(Literal 2.5)");
    assert_eq!(printed("'hi'"), "(Literal hi)");
    assert_eq!(printed("x"), "(Variable x)");
    assert_eq!(printed("(x)"), "(Group (Variable x))");
}

#[test]
fn precedence_climbs_from_or_to_unary() {
    assert_eq!(
        printed("a or b and not c == 1 + 2 * -3"),
        "(Logical or (Variable a) (Logical and (Variable b) \
         (Binary == (Unary not (Variable c)) (Binary + (Literal 1) \
         (Binary * (Literal 2) (Unary - (Literal 3)))))))"
    );
}

#[test]
fn binary_operators_are_left_associative() {
    assert_eq!(
        printed("1 - 2 - 3"),
        "(Binary - (Binary - (Literal 1) (Literal 2)) (Literal 3))"
    );
}

#[test]
fn assignment_is_right_associative() {
    assert_eq!(
        printed("a = b = 1"),
        "(Assign a (Assign b (Literal 1)))"
    );
}

#[test]
fn property_access_and_set() {
    assert_eq!(printed("a.b.c"), "(Get (Get (Variable a) b) c)");
    assert_eq!(printed("a.b = 1"), "(Set (Variable a) b (Literal 1))");
}

#[test]
fn comments_are_ignored_by_the_parser() {
    assert_eq!(printed("1 # one\n+ ## two ## 2"), "(Binary + (Literal 1) (Literal 2))");
}

#[test]
fn every_reference_gets_its_own_id() {
    let tokens = scan("x = x").unwrap();
    let expr = parse(&tokens).unwrap();

    let Expr::Assign { id, value, .. } = expr else {
        panic!("expected an assignment");
    };
    let Expr::Variable { id: read_id, .. } = *value else {
        panic!("expected a variable on the right");
    };

    assert_ne!(id, read_id);
    assert_eq!(read_id, ExprId(1));
    assert_eq!(id, ExprId(0));
}

#[test]
fn literals_carry_typed_values() {
    let tokens = scan("7").unwrap();

    assert_eq!(parse(&tokens).unwrap(), Expr::Literal(Value::Integer(7)));
}

#[test]
fn grouping_on_the_left_is_an_invalid_assignment_target() {
    let (message, lexeme, line) = parse_error("(1 = 2)");

    assert_eq!(message, "Invalid assignment target.");
    assert_eq!(lexeme, "=");
    assert_eq!(line, 1);
}

#[test]
fn binary_on_the_left_is_rejected_after_parsing() {
    let (message, lexeme, _) = parse_error("a + b = c");

    assert_eq!(message, "Invalid assignment target.");
    assert_eq!(lexeme, "=");
}

#[test]
fn missing_close_paren() {
    let (message, lexeme, line) = parse_error("(1 +\n2");

    assert_eq!(message, "Expect ')' after expression.");
    assert_eq!(lexeme, "end");
    assert_eq!(line, 2);
}

#[test]
fn missing_operand() {
    let (message, lexeme, _) = parse_error("1 + )");

    assert_eq!(message, "Expect expression.");
    assert_eq!(lexeme, ")");
}

#[test]
fn trailing_tokens_are_rejected() {
    let (message, lexeme, _) = parse_error("1 2");

    assert_eq!(message, "Expect end of expression.");
    assert_eq!(lexeme, "2");
}

#[test]
fn expression_leaves_the_rest_of_the_stream() {
    let tokens = scan("1 2").unwrap();
    let mut parser = Parser::new(&tokens);

    assert_eq!(parser.expression().unwrap(), Expr::Literal(Value::Integer(1)));
    assert_eq!(parser.expression().unwrap(), Expr::Literal(Value::Integer(2)));
}

#[test]
fn deep_nesting_fails_instead_of_overflowing() {
    let source = format!("{}1{}", "(".repeat(MAX_NESTING), ")".repeat(MAX_NESTING));
    let (message, _, _) = parse_error(&source);

    assert_eq!(message, "Expression nested too deeply.");
}

#[test]
fn moderate_nesting_is_fine() {
    let source = format!("{}1{}", "(".repeat(300), ")".repeat(300));

    assert!(printed(&source).starts_with("(Group (Group"));
}

#[test]
fn long_operator_chain_fails_instead_of_overflowing() {
    let source = vec!["1"; 10_000].join(" + ");
    let (message, lexeme, _) = parse_error(&source);

    assert_eq!(message, "Expression nested too deeply.");
    assert_eq!(lexeme, "+");
}

#[test]
fn long_property_chain_fails_instead_of_overflowing() {
    let source = format!("a{}", ".b".repeat(10_000));
    let (message, lexeme, _) = parse_error(&source);

    assert_eq!(message, "Expression nested too deeply.");
    assert_eq!(lexeme, "b");
}

#[test]
fn chains_inside_groups_add_up() {
    // Each level wraps the previous one as the first operand of a fresh
    // 40-term chain, so the tree grows by 41 per group.
    let mut source = String::from("1");
    for _ in 0..40 {
        source = format!("({}{})", source, " + 1".repeat(40));
    }

    let (message, _, _) = parse_error(&source);

    assert_eq!(message, "Expression nested too deeply.");
}

#[test]
fn chain_within_the_limit_parses() {
    let source = vec!["x"; MAX_NESTING / 2].join(" or ");

    assert!(printed(&source).starts_with("(Logical or (Logical or"));
}

#[test]
fn failed_expressions_do_not_use_up_the_nesting_limit() {
    // Every `(1` fails at the next `(`, which starts the following attempt.
    let source = format!("{}1", "(1 ".repeat(600));
    let tokens = scan(&source).unwrap();
    let mut parser = Parser::new(&tokens);

    for _ in 0..600 {
        match parser.expression() {
            Err(SlugError::Parse { message, .. }) => {
                assert_eq!(message, "Expect ')' after expression.")
            }
            other => panic!("expected a parse error, got {:?}", other),
        }
    }

    let expr = parser.expression().unwrap();
    assert_eq!(AstPrinter::print(&expr), "(Literal 1)");
}
