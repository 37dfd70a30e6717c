//! FILENAME: core/parser/src/tests.rs
//! PURPOSE: Consolidated unit tests for the parser crate.

use crate::ast::{
    Formula, InteractionOperator, OptionValue, Predictor, Response, Sign, SignedTerm, Term,
};
use crate::error::ParseError;
use crate::lexer::{tokenize, Lexer};
use crate::parser::{parse, MAX_NESTING_DEPTH};
use crate::token::TokenKind;

fn kinds(input: &str) -> Vec<TokenKind> {
    tokenize(input).unwrap().into_iter().map(|t| t.kind).collect()
}

fn var(name: &str) -> Term {
    Term::Variable(name.to_string())
}

fn plus(term: Term) -> SignedTerm {
    SignedTerm {
        sign: Sign::Plus,
        term,
    }
}

fn minus(term: Term) -> SignedTerm {
    SignedTerm {
        sign: Sign::Minus,
        term,
    }
}

fn predictor(terms: Vec<SignedTerm>) -> Predictor {
    Predictor { terms }
}

// ========================================
// LEXER TESTS
// ========================================

#[test]
fn lexer_tokenizes_three_way_interaction() {
    let tokens = tokenize("y ~ x1*x2*x3").unwrap();
    assert_eq!(tokens.len(), 7);

    let pairs: Vec<(&str, TokenKind)> = tokens.iter().map(|t| (t.lexeme.as_str(), t.kind)).collect();
    assert_eq!(
        pairs,
        vec![
            ("y", TokenKind::ColumnName),
            ("~", TokenKind::Tilde),
            ("x1", TokenKind::ColumnName),
            ("*", TokenKind::InteractionAndEffect),
            ("x2", TokenKind::ColumnName),
            ("*", TokenKind::InteractionAndEffect),
            ("x3", TokenKind::ColumnName),
        ]
    );
}

#[test]
fn lexer_records_byte_positions() {
    let tokens = tokenize("y ~  x1").unwrap();
    assert_eq!(tokens[0].position, 0);
    assert_eq!(tokens[1].position, 2);
    assert_eq!(tokens[2].position, 5);
}

#[test]
fn lexer_distinguishes_functions_from_columns() {
    assert_eq!(
        kinds("s(z) + z"),
        vec![
            TokenKind::Identifier,
            TokenKind::LeftParen,
            TokenKind::ColumnName,
            TokenKind::RightParen,
            TokenKind::Plus,
            TokenKind::ColumnName,
        ]
    );
}

#[test]
fn lexer_requires_paren_directly_after_function_name() {
    assert_eq!(
        kinds("s (z)"),
        vec![
            TokenKind::ColumnName,
            TokenKind::LeftParen,
            TokenKind::ColumnName,
            TokenKind::RightParen,
        ]
    );
}

#[test]
fn lexer_tokenizes_random_effect_operators() {
    assert_eq!(
        kinds("(1 + x | g) + (x || h)"),
        vec![
            TokenKind::LeftParen,
            TokenKind::Number,
            TokenKind::Plus,
            TokenKind::ColumnName,
            TokenKind::Pipe,
            TokenKind::ColumnName,
            TokenKind::RightParen,
            TokenKind::Plus,
            TokenKind::LeftParen,
            TokenKind::ColumnName,
            TokenKind::DoublePipe,
            TokenKind::ColumnName,
            TokenKind::RightParen,
        ]
    );
}

#[test]
fn lexer_tokenizes_options_and_booleans() {
    assert_eq!(
        kinds("nl = TRUE, family = gaussian()"),
        vec![
            TokenKind::ColumnName,
            TokenKind::Equals,
            TokenKind::True,
            TokenKind::Comma,
            TokenKind::ColumnName,
            TokenKind::Equals,
            TokenKind::Identifier,
            TokenKind::LeftParen,
            TokenKind::RightParen,
        ]
    );
    assert_eq!(kinds("FALSE"), vec![TokenKind::False]);
}

#[test]
fn lexer_reads_dotted_names_and_decimals() {
    let tokens = tokenize("Sepal.Length ~ 2.5 ^ x_1").unwrap();
    assert_eq!(tokens[0].lexeme, "Sepal.Length");
    assert_eq!(tokens[2].kind, TokenKind::Number);
    assert_eq!(tokens[2].lexeme, "2.5");
    assert_eq!(tokens[3].kind, TokenKind::Caret);
    assert_eq!(tokens[4].lexeme, "x_1");
}

#[test]
fn lexer_splits_minus_from_number() {
    assert_eq!(
        kinds("x -1"),
        vec![TokenKind::ColumnName, TokenKind::Minus, TokenKind::Number]
    );
}

#[test]
fn lexer_accepts_formulas_the_parser_rejects() {
    assert_eq!(kinds("~ x1"), vec![TokenKind::Tilde, TokenKind::ColumnName]);
    assert!(kinds("").is_empty());
}

#[test]
fn lexer_reports_illegal_character() {
    let err = tokenize("y ~ x1 $ x2").unwrap_err();
    assert_eq!(err.character, '$');
    assert_eq!(err.position, 7);
}

#[test]
fn lexer_emits_eof_repeatedly() {
    let mut lexer = Lexer::new("y");
    assert_eq!(lexer.next_token().unwrap().kind, TokenKind::ColumnName);
    assert_eq!(lexer.next_token().unwrap().kind, TokenKind::Eof);
    assert_eq!(lexer.next_token().unwrap().kind, TokenKind::Eof);
}

// ========================================
// PARSER TESTS - BASIC STRUCTURE
// ========================================

#[test]
fn parser_parses_main_effects() {
    let formula = parse("y ~ x1 + x2").unwrap();
    assert_eq!(
        formula,
        Formula {
            response: Response::Single("y".to_string()),
            predictor: predictor(vec![plus(var("x1")), plus(var("x2"))]),
            nonlinear: vec![],
            options: vec![],
        }
    );
}

#[test]
fn parser_accepts_empty_predictor() {
    let formula = parse("y ~").unwrap();
    assert_eq!(formula.response, Response::Single("y".to_string()));
    assert!(formula.predictor.is_empty());
}

#[test]
fn parser_parses_intercept_removal() {
    let formula = parse("y ~ x1*x2 - 1").unwrap();
    assert_eq!(formula.predictor.terms.len(), 2);
    assert_eq!(formula.predictor.terms[1], minus(Term::Constant(1.0)));

    let leading = parse("y ~ -1 + x").unwrap();
    assert_eq!(leading.predictor.terms[0], minus(Term::Constant(1.0)));
}

#[test]
fn parser_parses_multivariate_response() {
    let formula = parse("mvbind(y1, y2) ~ x").unwrap();
    assert_eq!(
        formula.response,
        Response::Multivariate(vec!["y1".to_string(), "y2".to_string()])
    );
}

// ========================================
// PARSER TESTS - INTERACTIONS
// ========================================

#[test]
fn parser_groups_star_operands() {
    let formula = parse("y ~ x1*x2*x3").unwrap();
    assert_eq!(
        formula.predictor.terms[0].term,
        Term::InteractionGroup {
            operator: InteractionOperator::AllInteractions,
            operands: vec![var("x1"), var("x2"), var("x3")],
        }
    );
}

#[test]
fn parser_binds_colon_tighter_than_star() {
    let formula = parse("y ~ a*b:c").unwrap();
    assert_eq!(
        formula.predictor.terms[0].term,
        Term::InteractionGroup {
            operator: InteractionOperator::AllInteractions,
            operands: vec![
                var("a"),
                Term::InteractionGroup {
                    operator: InteractionOperator::Only,
                    operands: vec![var("b"), var("c")],
                },
            ],
        }
    );
}

#[test]
fn parser_binds_interactions_tighter_than_plus() {
    let formula = parse("y ~ a + b:c + d").unwrap();
    assert_eq!(formula.predictor.terms.len(), 3);
    assert_eq!(formula.predictor.terms[0].term, var("a"));
    assert_eq!(formula.predictor.terms[2].term, var("d"));
}

#[test]
fn parser_parses_power_of_group() {
    let formula = parse("y ~ (a + b + c)^2").unwrap();
    assert_eq!(
        formula.predictor.terms[0].term,
        Term::Power {
            base: Box::new(Term::Group(predictor(vec![
                plus(var("a")),
                plus(var("b")),
                plus(var("c")),
            ]))),
            exponent: Box::new(Term::Constant(2.0)),
        }
    );
}

// ========================================
// PARSER TESTS - CALLS AND RANDOM EFFECTS
// ========================================

#[test]
fn parser_parses_smooth_call() {
    let formula = parse("y ~ x1*x2 + s(z)").unwrap();
    assert_eq!(
        formula.predictor.terms[1].term,
        Term::Transformation {
            function: "s".to_string(),
            argument: "z".to_string(),
        }
    );
}

#[test]
fn parser_parses_random_effect_group() {
    let formula = parse("y ~ x1 + (1 + x1 | group)").unwrap();
    assert_eq!(
        formula.predictor.terms[1].term,
        Term::RandomEffectGroup {
            terms: predictor(vec![plus(Term::Constant(1.0)), plus(var("x1"))]),
            grouping: "group".to_string(),
            correlated: true,
        }
    );
}

#[test]
fn parser_parses_uncorrelated_random_effect_group() {
    let formula = parse("y ~ (x || g)").unwrap();
    match &formula.predictor.terms[0].term {
        Term::RandomEffectGroup { correlated, grouping, .. } => {
            assert!(!correlated);
            assert_eq!(grouping, "g");
        }
        other => panic!("expected random effect group, got {:?}", other),
    }
}

#[test]
fn parser_parses_nonlinear_clauses_and_options() {
    let formula = parse("y ~ a1 - a2^x, a1 ~ 1, a2 ~ x + (x|g), nl = TRUE").unwrap();

    assert_eq!(formula.nonlinear.len(), 2);
    assert_eq!(formula.nonlinear[0].parameter, "a1");
    assert_eq!(formula.nonlinear[1].parameter, "a2");
    assert_eq!(formula.nonlinear[1].predictor.terms.len(), 2);

    assert_eq!(formula.options.len(), 1);
    assert_eq!(formula.options[0].name, "nl");
    assert_eq!(formula.options[0].value, OptionValue::Boolean(true));

    assert_eq!(
        formula.predictor.terms[1],
        minus(Term::Power {
            base: Box::new(var("a2")),
            exponent: Box::new(var("x")),
        })
    );
}

#[test]
fn parser_parses_family_option() {
    let call = parse("y ~ x, family = poisson()").unwrap();
    assert_eq!(call.options[0].value, OptionValue::Name("poisson".to_string()));

    let bare = parse("y ~ x, family = gaussian").unwrap();
    assert_eq!(bare.options[0].value, OptionValue::Name("gaussian".to_string()));
}

// ========================================
// PARSER TESTS - ERRORS
// ========================================

#[test]
fn parser_rejects_missing_tilde() {
    assert_eq!(parse("invalid formula"), Err(ParseError::MissingTilde));
    assert_eq!(parse("y x1*x2"), Err(ParseError::MissingTilde));
    assert_eq!(parse(""), Err(ParseError::MissingTilde));
}

#[test]
fn parser_rejects_missing_response() {
    assert_eq!(parse("~ x1"), Err(ParseError::MissingResponse));
}

#[test]
fn parser_propagates_lex_errors() {
    assert!(matches!(parse("y ~ x1 # x2"), Err(ParseError::Lex(_))));
}

#[test]
fn parser_rejects_unbalanced_parentheses() {
    assert!(matches!(
        parse("y ~ (1 | g"),
        Err(ParseError::UnbalancedParentheses(_))
    ));
    assert!(matches!(
        parse("y ~ x)"),
        Err(ParseError::UnbalancedParentheses(_))
    ));
    assert!(matches!(
        parse("y ~ s(z"),
        Err(ParseError::UnbalancedParentheses(_))
    ));
    assert!(matches!(
        parse("y ~ (1 + x"),
        Err(ParseError::UnbalancedParentheses(_))
    ));
}

#[test]
fn parser_rejects_random_effect_without_pipe() {
    assert!(matches!(
        parse("y ~ (1 + x)"),
        Err(ParseError::MalformedRandomEffect { position: 4, .. })
    ));
}

#[test]
fn parser_rejects_random_effect_without_grouping() {
    assert!(matches!(
        parse("y ~ (1 + x | )"),
        Err(ParseError::MalformedRandomEffect { .. })
    ));
    assert!(matches!(
        parse("y ~ (1 | 2)"),
        Err(ParseError::MalformedRandomEffect { .. })
    ));
}

#[test]
fn parser_rejects_runaway_nesting() {
    let formula = format!("y ~ {}", "(".repeat(200_000));
    assert_eq!(
        parse(&formula),
        Err(ParseError::NestingTooDeep {
            position: 4 + MAX_NESTING_DEPTH,
            limit: MAX_NESTING_DEPTH,
        })
    );
}

#[test]
fn parser_accepts_nested_power_groups() {
    let formula = parse("y ~ ((a + b)^2 + c)^2").unwrap();
    match &formula.predictor.terms[0].term {
        Term::Power { base, .. } => match base.as_ref() {
            Term::Group(inner) => assert_eq!(inner.terms.len(), 2),
            other => panic!("expected group, got {:?}", other),
        },
        other => panic!("expected power, got {:?}", other),
    }
}

#[test]
fn parser_rejects_malformed_calls() {
    assert!(matches!(parse("y ~ s()"), Err(ParseError::MalformedCall { .. })));
    assert!(matches!(parse("y ~ s(a, b)"), Err(ParseError::MalformedCall { .. })));
    assert!(matches!(parse("y ~ s(1)"), Err(ParseError::MalformedCall { .. })));
}

#[test]
fn parser_rejects_second_tilde() {
    assert!(matches!(
        parse("y ~ x ~ z"),
        Err(ParseError::UnexpectedToken { .. })
    ));
}

#[test]
fn parser_rejects_dangling_operator() {
    assert!(matches!(parse("y ~ x +"), Err(ParseError::UnexpectedEof { .. })));
    assert!(matches!(parse("y ~ x *"), Err(ParseError::UnexpectedEof { .. })));
}

#[test]
fn parser_rejects_function_response() {
    assert!(matches!(
        parse("log(y) ~ x"),
        Err(ParseError::UnexpectedToken { .. })
    ));
}

#[test]
fn parser_error_messages_are_readable() {
    assert_eq!(
        parse("y x").unwrap_err().to_string(),
        "Formula is missing the '~' response operator"
    );
    assert_eq!(
        parse("y ~ x ~ z").unwrap_err().to_string(),
        "Unexpected '~' at position 6, expected ',' or end of formula"
    );
}

// ========================================
// DISPLAY
// ========================================

#[test]
fn predictor_display_round_trips_spacing() {
    let formula = parse("y ~ x1*x2 + s(z) - 1 + (1 + x1 | g)").unwrap();
    assert_eq!(
        formula.predictor.to_string(),
        "x1*x2 + s(z) - 1 + (1 + x1 | g)"
    );
}
