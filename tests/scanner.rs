#[cfg(test)]
mod scanner_tests {
    use pretty_assertions::assert_eq;
    use slug::error::SlugError;
    use slug::scanner::*;
    use slug::token::*;

    fn assert_token_sequence(source: &str, expected: &[(TokenType, &str)]) {
        let tokens: Vec<Token<'_>> = scan(source).expect("source should scan");

        assert_eq!(tokens.len(), expected.len());

        for (actual, (expected_type, expected_lexeme)) in tokens.iter().zip(expected.iter()) {
            assert_eq!(actual.token_type, *expected_type);
            assert_eq!(actual.lexeme, *expected_lexeme);
        }
    }

    fn lex_error_line(source: &str) -> usize {
        match scan(source) {
            Err(SlugError::Lex { line, .. }) => line,
            other => panic!("expected a lexical error, got {:?}", other),
        }
    }

    #[test]
    fn test_scanner_01_symbols() {
        assert_token_sequence(
            "({*.,+*})",
            &[
                (TokenType::LEFT_PAREN, "("),
                (TokenType::LEFT_BRACE, "{"),
                (TokenType::STAR, "*"),
                (TokenType::DOT, "."),
                (TokenType::COMMA, ","),
                (TokenType::PLUS, "+"),
                (TokenType::STAR, "*"),
                (TokenType::RIGHT_BRACE, "}"),
                (TokenType::RIGHT_PAREN, ")"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_scanner_02_operators_prefer_two_characters() {
        assert_token_sequence(
            "! != = == > >= < <= / ;",
            &[
                (TokenType::BANG, "!"),
                (TokenType::BANG_EQUAL, "!="),
                (TokenType::EQUAL, "="),
                (TokenType::EQUAL_EQUAL, "=="),
                (TokenType::GREATER, ">"),
                (TokenType::GREATER_EQUAL, ">="),
                (TokenType::LESS, "<"),
                (TokenType::LESS_EQUAL, "<="),
                (TokenType::SLASH, "/"),
                (TokenType::SEMICOLON, ";"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_scanner_03_keywords_and_identifiers() {
        assert_token_sequence(
            "True False None not and or struct class_name var1",
            &[
                (TokenType::TRUE, "True"),
                (TokenType::FALSE, "False"),
                (TokenType::NONE, "None"),
                (TokenType::NOT, "not"),
                (TokenType::AND, "and"),
                (TokenType::OR, "or"),
                (TokenType::STRUCT, "struct"),
                (TokenType::IDENTIFIER, "class_name"),
                (TokenType::IDENTIFIER, "var1"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn empty_input_is_just_eof() {
        let tokens = scan("").unwrap();

        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].token_type, TokenType::EOF);
        assert_eq!(tokens[0].line, 1);
    }

    #[test]
    fn float_and_integer_literals_are_distinct_kinds() {
        let tokens = scan("3.14 42 1_000 2.5_0").unwrap();

        assert!(matches!(tokens[0].token_type, TokenType::FLOAT(n) if n == 3.14));
        assert!(matches!(tokens[1].token_type, TokenType::INTEGER(42)));
        assert!(matches!(tokens[2].token_type, TokenType::INTEGER(1000)));
        assert_eq!(tokens[2].lexeme, "1_000");
        assert!(matches!(tokens[3].token_type, TokenType::FLOAT(n) if n == 2.5));
    }

    #[test]
    fn dot_without_fraction_digit_is_not_consumed() {
        assert_token_sequence(
            "1.abs",
            &[
                (TokenType::INTEGER(0), "1"),
                (TokenType::DOT, "."),
                (TokenType::IDENTIFIER, "abs"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn malformed_underscores_are_rejected() {
        assert_eq!(lex_error_line("1__0"), 1);
        assert_eq!(lex_error_line("\n7_"), 2);
    }

    #[test]
    fn integer_overflow_is_a_lexical_error() {
        assert_eq!(lex_error_line("99999999999999999999"), 1);
    }

    #[test]
    fn lexemes_reassemble_the_source_without_whitespace() {
        let source = "(1 + 2) * 3";
        let rebuilt: String = scan(source)
            .unwrap()
            .iter()
            .map(|t| t.lexeme)
            .collect();
        let expected: String = source.chars().filter(|c| !c.is_whitespace()).collect();

        assert_eq!(rebuilt, expected);
    }

    #[test]
    fn strings_accept_either_quote_and_drop_delimiters() {
        let tokens = scan("'it\"s' \"a'b\"").unwrap();

        assert!(matches!(&tokens[0].token_type, TokenType::STRING(s) if s == "it\"s"));
        assert_eq!(tokens[0].lexeme, "'it\"s'");
        assert!(matches!(&tokens[1].token_type, TokenType::STRING(s) if s == "a'b"));
    }

    #[test]
    fn multiline_string_keeps_its_opening_line() {
        let tokens = scan("'a\nb' x").unwrap();

        assert_eq!(tokens[0].line, 1);
        assert_eq!(tokens[1].line, 2);
    }

    #[test]
    fn unterminated_string_reports_opening_line() {
        assert_eq!(lex_error_line("'abc"), 1);
        assert_eq!(lex_error_line("x\n\"abc\n\ndef"), 2);
    }

    #[test]
    fn block_comment_is_one_token_on_its_opening_line() {
        let mut scanner = Scanner::new("## x\ny ##");
        let tokens: Vec<Token<'_>> = scanner.by_ref().map(Result::unwrap).collect();

        assert_eq!(tokens.len(), 2);
        assert!(matches!(&tokens[0].token_type, TokenType::COMMENT(s) if s == " x\ny "));
        assert_eq!(tokens[0].line, 1);
        assert_eq!(tokens[0].lexeme, "## x\ny ##");
        assert_eq!(tokens[1].token_type, TokenType::EOF);
        assert_eq!(scanner.line(), 2);
    }

    #[test]
    fn unclosed_block_comment_runs_to_end_of_input() {
        let tokens = scan("1 ## never\nclosed").unwrap();

        assert_eq!(tokens.len(), 3);
        assert!(matches!(&tokens[1].token_type, TokenType::COMMENT(s) if s == " never\nclosed"));
        assert_eq!(tokens[2].line, 2);
    }

    #[test]
    fn line_comment_stops_at_newline() {
        assert_token_sequence(
            "a # note\nb",
            &[
                (TokenType::IDENTIFIER, "a"),
                (TokenType::COMMENT(String::new()), "# note"),
                (TokenType::IDENTIFIER, "b"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn scan_stops_at_first_error() {
        match scan("a\n$ @") {
            Err(SlugError::Lex { message, line }) => {
                assert_eq!(line, 2);
                assert!(message.contains("Unexpected character: $"));
            }
            other => panic!("expected a lexical error, got {:?}", other),
        }
    }

    #[test]
    fn test_unexpected_chars_token_sequence() {
        let source = ",.$(_";
        let results: Vec<_> = Scanner::new(source).collect();

        // 0: COMMA ','
        // 1: DOT '.'
        // 2: Error for '$'
        // 3: LEFT_PAREN '('
        // 4: Error for '_'
        // 5: EOF
        assert_eq!(results.len(), 6, "Expected 6 items in result");

        assert_token_matches(&results[0], TokenType::COMMA, ",");
        assert_token_matches(&results[1], TokenType::DOT, ".");
        assert_token_matches(&results[3], TokenType::LEFT_PAREN, "(");
        assert_token_matches(&results[5], TokenType::EOF, "");

        let error_count = results.iter().filter(|r| r.is_err()).count();
        assert_eq!(error_count, 2, "Expected 2 error messages");

        for err in results.iter().filter_map(|r| r.as_ref().err()) {
            assert!(
                err.to_string().contains("Unexpected character"),
                "Error message should contain 'Unexpected character', got: {}",
                err
            );
        }

        fn assert_token_matches(
            result: &Result<Token<'_>, SlugError>,
            expected_type: TokenType,
            expected_lexeme: &str,
        ) {
            match result {
                Ok(token) => {
                    assert_eq!(token.token_type, expected_type);
                    assert_eq!(token.lexeme, expected_lexeme);
                }
                Err(e) => panic!("Expected token but got error: {}", e),
            }
        }
    }
}
