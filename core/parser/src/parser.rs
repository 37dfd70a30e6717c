//! FILENAME: core/parser/src/parser.rs
//! PURPOSE: Recursive descent parser that converts a stream of Tokens into an AST.
//! CONTEXT: This is the second stage of the parsing pipeline. It takes tokens
//! from the Lexer and builds a Formula tree for the engine's expander.
//! There is no error recovery: the first violation aborts the parse.
//!
//! GRAMMAR:
//!   formula      --> response "~" predictor? ( "," clause )*
//!   response     --> NAME | "mvbind" "(" NAME ( "," NAME )* ")"
//!   clause       --> NAME "~" predictor?           // nonlinear parameter
//!                  | NAME "=" option_value         // nl = TRUE, family = gaussian()
//!   option_value --> TRUE | FALSE | NAME | FUNC "(" ")"
//!   predictor    --> "-"? term ( ("+" | "-") term )*
//!   term         --> colon_term ( "*" colon_term )*
//!   colon_term   --> power ( ":" power )*
//!   power        --> factor ( "^" factor )?
//!   factor       --> NAME | NUMBER | call | paren
//!   call         --> FUNC "(" NAME ")"
//!   paren        --> "(" predictor ("|" | "||") NAME ")"
//!                  | "(" predictor ")"             // only as the base of "^"

use crate::ast::{
    Formula, FormulaOption, InteractionOperator, NonlinearFormula, OptionValue, Predictor,
    Response, Sign, SignedTerm, Term,
};
use crate::error::{ParseError, ParseResult};
use crate::lexer::Lexer;
use crate::token::{Token, TokenKind};

/// Deepest parenthesis nesting accepted before parsing stops.
pub const MAX_NESTING_DEPTH: usize = 64;

/// The Parser struct holds the scanned tokens and the read position.
pub struct Parser {
    tokens: Vec<Token>,
    position: usize,
    eof: Token,
    /// Open parentheses around the current position.
    depth: usize,
}

impl Parser {
    /// Creates a parser over an already scanned token stream.
    /// `source_len` positions the synthetic end-of-input token.
    pub fn new(tokens: Vec<Token>, source_len: usize) -> Self {
        Parser {
            tokens,
            position: 0,
            eof: Token::new(TokenKind::Eof, "", source_len),
            depth: 0,
        }
    }

    /// Scans `input` and creates a parser over its tokens.
    pub fn from_source(input: &str) -> ParseResult<Self> {
        let tokens = Lexer::new(input).tokenize()?;
        Ok(Parser::new(tokens, input.len()))
    }

    /// Parses the entire token stream and returns the AST.
    pub fn parse(&mut self) -> ParseResult<Formula> {
        if !self.tokens.iter().any(|t| t.is(TokenKind::Tilde)) {
            return Err(ParseError::MissingTilde);
        }
        if self.current().is(TokenKind::Tilde) {
            return Err(ParseError::MissingResponse);
        }

        let response = self.parse_response()?;
        self.expect(TokenKind::Tilde, "'~' after the response")?;
        let predictor = self.parse_optional_predictor()?;

        let mut nonlinear = Vec::new();
        let mut options = Vec::new();
        while self.current().is(TokenKind::Comma) {
            self.advance();
            match self.parse_clause()? {
                Clause::Formula(formula) => nonlinear.push(formula),
                Clause::Option(option) => options.push(option),
            }
        }

        // Ensure we consumed all tokens
        match self.current().kind {
            TokenKind::Eof => {}
            TokenKind::RightParen => {
                return Err(ParseError::UnbalancedParentheses(format!(
                    "unmatched ')' at position {}",
                    self.current().position
                )))
            }
            _ => return Err(self.unexpected("',' or end of formula")),
        }

        log::debug!(
            target: "PARSE",
            "parsed formula: {} predictor terms, {} nonlinear clauses, {} options",
            predictor.terms.len(),
            nonlinear.len(),
            options.len()
        );

        Ok(Formula {
            response,
            predictor,
            nonlinear,
            options,
        })
    }

    fn current(&self) -> &Token {
        self.tokens.get(self.position).unwrap_or(&self.eof)
    }

    /// Advances to the next token.
    fn advance(&mut self) {
        if self.position < self.tokens.len() {
            self.position += 1;
        }
    }

    /// Builds the error for an unexpected current token.
    fn unexpected(&self, expected: &str) -> ParseError {
        let token = self.current();
        if token.is(TokenKind::Eof) {
            ParseError::UnexpectedEof {
                expected: expected.to_string(),
            }
        } else {
            ParseError::UnexpectedToken {
                found: token.to_string(),
                expected: expected.to_string(),
            }
        }
    }

    /// Checks if the current token has the expected kind.
    /// If it matches, advances and returns the token. Otherwise returns an error.
    fn expect(&mut self, kind: TokenKind, expected: &str) -> ParseResult<Token> {
        if self.current().is(kind) {
            let token = self.current().clone();
            self.advance();
            Ok(token)
        } else {
            Err(self.unexpected(expected))
        }
    }

    /// Parses the response side: a single name or mvbind(a, b, ...).
    fn parse_response(&mut self) -> ParseResult<Response> {
        let token = self.current().clone();
        match token.kind {
            TokenKind::ColumnName => {
                self.advance();
                Ok(Response::Single(token.lexeme))
            }
            TokenKind::Identifier if token.lexeme == "mvbind" => {
                self.advance();
                self.expect(TokenKind::LeftParen, "'(' after mvbind")?;

                let mut names = Vec::new();
                let first = self.expect(TokenKind::ColumnName, "response variable in mvbind")?;
                names.push(first.lexeme);
                while self.current().is(TokenKind::Comma) {
                    self.advance();
                    let next = self.expect(TokenKind::ColumnName, "response variable in mvbind")?;
                    names.push(next.lexeme);
                }

                self.expect_close(&token)?;
                Ok(Response::Multivariate(names))
            }
            _ => Err(self.unexpected("response variable or mvbind(...)")),
        }
    }

    /// Expects the ')' that closes the construct opened at `opener`.
    fn expect_close(&mut self, opener: &Token) -> ParseResult<()> {
        match self.current().kind {
            TokenKind::RightParen => {
                self.advance();
                Ok(())
            }
            TokenKind::Eof => Err(ParseError::UnbalancedParentheses(format!(
                "'(' opened by '{}' at position {} is never closed",
                opener.lexeme, opener.position
            ))),
            _ => Err(self.unexpected("')'")),
        }
    }

    /// A predictor that may be absent: `y ~` or `a1 ~ , nl = TRUE`.
    fn parse_optional_predictor(&mut self) -> ParseResult<Predictor> {
        match self.current().kind {
            TokenKind::Eof | TokenKind::Comma => Ok(Predictor::default()),
            _ => self.parse_predictor(),
        }
    }

    /// Parses additive expressions (+ and -).
    fn parse_predictor(&mut self) -> ParseResult<Predictor> {
        let mut terms = Vec::new();

        // A leading '-' applies to the first term: y ~ -1 + x
        let mut sign = Sign::Plus;
        if self.current().is(TokenKind::Minus) {
            self.advance();
            sign = Sign::Minus;
        }
        terms.push(SignedTerm {
            sign,
            term: self.parse_term()?,
        });

        loop {
            let sign = match self.current().kind {
                TokenKind::Plus => Sign::Plus,
                TokenKind::Minus => Sign::Minus,
                _ => break,
            };

            self.advance();
            terms.push(SignedTerm {
                sign,
                term: self.parse_term()?,
            });
        }

        Ok(Predictor { terms })
    }

    /// Parses `*` chains.
    fn parse_term(&mut self) -> ParseResult<Term> {
        self.parse_interaction(
            TokenKind::InteractionAndEffect,
            InteractionOperator::AllInteractions,
            Parser::parse_colon_term,
        )
    }

    /// Parses `:` chains.
    fn parse_colon_term(&mut self) -> ParseResult<Term> {
        self.parse_interaction(
            TokenKind::InteractionOnly,
            InteractionOperator::Only,
            Parser::parse_power,
        )
    }

    fn parse_interaction(
        &mut self,
        kind: TokenKind,
        operator: InteractionOperator,
        operand: fn(&mut Parser) -> ParseResult<Term>,
    ) -> ParseResult<Term> {
        let first = operand(self)?;
        if !self.current().is(kind) {
            return Ok(first);
        }

        let mut operands = vec![first];
        while self.current().is(kind) {
            self.advance();
            operands.push(operand(self)?);
        }

        Ok(Term::InteractionGroup { operator, operands })
    }

    /// Parses power expressions (^).
    fn parse_power(&mut self) -> ParseResult<Term> {
        let open = self.current().clone();
        let base = self.parse_factor()?;

        if self.current().is(TokenKind::Caret) {
            self.advance();
            let exponent = self.parse_factor()?;
            if let Term::Group(_) = exponent {
                return Err(ParseError::UnexpectedToken {
                    found: "parenthesized group".to_string(),
                    expected: "number or variable after '^'".to_string(),
                });
            }
            return Ok(Term::Power {
                base: Box::new(base),
                exponent: Box::new(exponent),
            });
        }

        // A bare parenthesized group must be a random effect.
        if let Term::Group(_) = base {
            return Err(ParseError::MalformedRandomEffect {
                position: open.position,
                reason: "is missing '|' and a grouping variable".to_string(),
            });
        }

        Ok(base)
    }

    /// Parses primary terms (names, numbers, calls, parentheses).
    fn parse_factor(&mut self) -> ParseResult<Term> {
        let token = self.current().clone();
        match token.kind {
            TokenKind::ColumnName => {
                self.advance();
                Ok(Term::Variable(token.lexeme))
            }

            TokenKind::Number => {
                self.advance();
                let value = token.lexeme.parse::<f64>().map_err(|_| ParseError::UnexpectedToken {
                    found: token.to_string(),
                    expected: "number".to_string(),
                })?;
                Ok(Term::Constant(value))
            }

            TokenKind::Identifier => self.parse_call(token),

            TokenKind::LeftParen => self.parse_paren(token),

            TokenKind::RightParen => Err(ParseError::UnbalancedParentheses(format!(
                "unexpected ')' at position {}",
                token.position
            ))),

            _ => Err(self.unexpected("term")),
        }
    }

    /// Parses a one-argument function call like s(z).
    fn parse_call(&mut self, name: Token) -> ParseResult<Term> {
        self.advance();
        self.expect(TokenKind::LeftParen, "'('")?;

        let malformed = |found: &str| ParseError::MalformedCall {
            name: name.lexeme.clone(),
            found: found.to_string(),
        };

        let argument = match self.current().kind {
            TokenKind::ColumnName => {
                let argument = self.current().lexeme.clone();
                self.advance();
                argument
            }
            TokenKind::RightParen => return Err(malformed("no arguments")),
            TokenKind::Eof => {
                return Err(ParseError::UnbalancedParentheses(format!(
                    "'(' opened by '{}' at position {} is never closed",
                    name.lexeme, name.position
                )))
            }
            _ => return Err(malformed(&self.current().to_string())),
        };

        if self.current().is(TokenKind::Comma) {
            return Err(malformed("more than one argument"));
        }
        self.expect_close(&name)?;

        Ok(Term::Transformation {
            function: name.lexeme,
            argument,
        })
    }

    /// Parses `( predictor | grouping )` or a plain parenthesized group.
    fn parse_paren(&mut self, open: Token) -> ParseResult<Term> {
        if self.depth >= MAX_NESTING_DEPTH {
            return Err(ParseError::NestingTooDeep {
                position: open.position,
                limit: MAX_NESTING_DEPTH,
            });
        }

        self.depth += 1;
        let result = self.parse_paren_contents(open);
        self.depth -= 1;
        result
    }

    fn parse_paren_contents(&mut self, open: Token) -> ParseResult<Term> {
        self.advance();
        let terms = self.parse_predictor()?;

        let correlated = match self.current().kind {
            TokenKind::Pipe => true,
            TokenKind::DoublePipe => false,
            TokenKind::RightParen => {
                self.advance();
                return Ok(Term::Group(terms));
            }
            TokenKind::Eof => {
                return Err(ParseError::UnbalancedParentheses(format!(
                    "'(' at position {} is never closed",
                    open.position
                )))
            }
            _ => return Err(self.unexpected("'|', '+' or ')'")),
        };
        self.advance();

        let grouping = match self.current().kind {
            TokenKind::ColumnName => {
                let grouping = self.current().lexeme.clone();
                self.advance();
                grouping
            }
            _ => {
                return Err(ParseError::MalformedRandomEffect {
                    position: open.position,
                    reason: "is missing its grouping variable".to_string(),
                })
            }
        };

        self.expect_close(&open)?;

        Ok(Term::RandomEffectGroup {
            terms,
            grouping,
            correlated,
        })
    }

    /// Parses a trailing clause after ','.
    fn parse_clause(&mut self) -> ParseResult<Clause> {
        let name = self.expect(TokenKind::ColumnName, "parameter or option name")?;

        match self.current().kind {
            TokenKind::Tilde => {
                self.advance();
                let predictor = self.parse_optional_predictor()?;
                Ok(Clause::Formula(NonlinearFormula {
                    parameter: name.lexeme,
                    predictor,
                }))
            }
            TokenKind::Equals => {
                self.advance();
                let value = self.parse_option_value()?;
                Ok(Clause::Option(FormulaOption {
                    name: name.lexeme,
                    value,
                    position: name.position,
                }))
            }
            _ => Err(self.unexpected("'~' or '='")),
        }
    }

    fn parse_option_value(&mut self) -> ParseResult<OptionValue> {
        let token = self.current().clone();
        match token.kind {
            TokenKind::True => {
                self.advance();
                Ok(OptionValue::Boolean(true))
            }
            TokenKind::False => {
                self.advance();
                Ok(OptionValue::Boolean(false))
            }
            TokenKind::ColumnName => {
                self.advance();
                Ok(OptionValue::Name(token.lexeme))
            }
            // family = gaussian()
            TokenKind::Identifier => {
                self.advance();
                self.expect(TokenKind::LeftParen, "'('")?;
                if !self.current().is(TokenKind::RightParen) && !self.current().is(TokenKind::Eof) {
                    return Err(ParseError::MalformedCall {
                        name: token.lexeme,
                        found: "arguments".to_string(),
                    });
                }
                self.expect_close(&token)?;
                Ok(OptionValue::Name(token.lexeme))
            }
            _ => Err(self.unexpected("TRUE, FALSE or a name")),
        }
    }
}

enum Clause {
    Formula(NonlinearFormula),
    Option(FormulaOption),
}

/// Convenience function to parse a formula string directly.
pub fn parse(input: &str) -> ParseResult<Formula> {
    let mut parser = Parser::from_source(input)?;
    parser.parse()
}
