//! Formula tokenizer, validator, and parser
//!
//! A recursive descent parser for chained-calculation formulas with the
//! usual operator precedence. The grammar is small: exact decimal literals,
//! `+ - * / % ^`, parentheses, and `{{id}}` references to other nodes.
//!
//! Characters outside the grammar are skipped by the tokenizer rather than
//! rejected; any formula the tokenizer once accepted keeps tokenizing
//! identically. The one exception is an unterminated `{{`, which is always
//! a syntax error.

use crate::ast::{BinaryOperator, Expr, UnaryOperator};
use crate::error::{FormulaError, FormulaResult};
use bigdecimal::BigDecimal;
use chaincalc_core::NodeId;
use lazy_regex::regex;
use regex::Captures;
use std::collections::{HashMap, HashSet};
use std::str::FromStr;

/// Token types
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// Numeric literal, exact decimal
    Number(BigDecimal),
    /// `{{id}}` reference, inner text trimmed
    Reference(String),

    // Operators
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Caret,

    // Delimiters
    LeftParen,
    RightParen,
}

impl Token {
    /// Whether this token is a binary/unary operator symbol
    pub fn is_operator(&self) -> bool {
        matches!(
            self,
            Token::Plus
                | Token::Minus
                | Token::Star
                | Token::Slash
                | Token::Percent
                | Token::Caret
        )
    }

    fn describe(&self) -> String {
        match self {
            Token::Number(n) => n.to_string(),
            Token::Reference(id) => format!("{{{{{id}}}}}"),
            Token::Plus => "+".into(),
            Token::Minus => "-".into(),
            Token::Star => "*".into(),
            Token::Slash => "/".into(),
            Token::Percent => "%".into(),
            Token::Caret => "^".into(),
            Token::LeftParen => "(".into(),
            Token::RightParen => ")".into(),
        }
    }
}

/// A token together with the byte offset it started at
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned {
    pub token: Token,
    pub offset: usize,
}

/// Tokenize formula text
///
/// Whitespace is skipped, unrecognized characters are dropped. Fails only
/// on an unterminated `{{` or an unparseable numeric literal.
pub fn tokenize(text: &str) -> FormulaResult<Vec<Spanned>> {
    let mut scanner = Scanner::new(text);
    let mut tokens = Vec::new();

    while let Some(c) = scanner.peek_char() {
        let offset = scanner.pos;

        let token = match c {
            c if c.is_whitespace() => {
                scanner.advance();
                continue;
            }
            '+' => {
                scanner.advance();
                Token::Plus
            }
            '-' => {
                scanner.advance();
                Token::Minus
            }
            '*' => {
                scanner.advance();
                Token::Star
            }
            '/' => {
                scanner.advance();
                Token::Slash
            }
            '%' => {
                scanner.advance();
                Token::Percent
            }
            '^' => {
                scanner.advance();
                Token::Caret
            }
            '(' => {
                scanner.advance();
                Token::LeftParen
            }
            ')' => {
                scanner.advance();
                Token::RightParen
            }
            '{' if scanner.peek_char_at(1) == Some('{') => {
                Token::Reference(scanner.scan_reference(offset)?)
            }
            c if c.is_ascii_digit() => {
                let text = scanner.scan_number();
                Token::Number(parse_decimal(&text, offset)?)
            }
            '.' if scanner.peek_char_at(1).map_or(false, |c| c.is_ascii_digit()) => {
                let text = scanner.scan_number();
                Token::Number(parse_decimal(&text, offset)?)
            }
            // Anything else is outside the grammar and skipped
            _ => {
                scanner.advance();
                continue;
            }
        };

        tokens.push(Spanned { token, offset });
    }

    Ok(tokens)
}

fn parse_decimal(text: &str, offset: usize) -> FormulaResult<BigDecimal> {
    BigDecimal::from_str(text)
        .map_err(|_| FormulaError::syntax(offset, format!("invalid number '{}'", text)))
}

/// Character scanner over formula text
struct Scanner<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Scanner<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn peek_char(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn peek_char_at(&self, offset: usize) -> Option<char> {
        self.input[self.pos..].chars().nth(offset)
    }

    fn advance(&mut self) {
        if let Some(c) = self.peek_char() {
            self.pos += c.len_utf8();
        }
    }

    /// Scan `{{id}}`, returning the trimmed inner text
    fn scan_reference(&mut self, start: usize) -> FormulaResult<String> {
        // Skip the opening braces
        self.advance();
        self.advance();

        match self.input[self.pos..].find("}}") {
            Some(end) => {
                let id = self.input[self.pos..self.pos + end].trim().to_string();
                self.pos += end + 2;
                Ok(id)
            }
            None => Err(FormulaError::syntax(start, "unterminated reference")),
        }
    }

    /// Scan a decimal literal: digits, then at most one `.` followed by digits
    fn scan_number(&mut self) -> String {
        let mut text = String::new();

        while self.peek_char().map_or(false, |c| c.is_ascii_digit()) {
            text.push(self.peek_char().unwrap());
            self.advance();
        }

        // A decimal point only counts when digits follow it
        if self.peek_char() == Some('.')
            && self.peek_char_at(1).map_or(false, |c| c.is_ascii_digit())
        {
            if text.is_empty() {
                text.push('0');
            }
            text.push('.');
            self.advance();
            while self.peek_char().map_or(false, |c| c.is_ascii_digit()) {
                text.push(self.peek_char().unwrap());
                self.advance();
            }
        }

        text
    }
}

/// Check formula text without evaluating it
///
/// Fails when the text is blank, tokenizes to nothing, has unbalanced
/// parentheses, or places two operators back to back. A `-` directly after
/// another operator is the unary-minus exception: `5*-3` is legal, `5*/3`
/// is not.
pub fn validate(text: &str) -> FormulaResult<()> {
    if text.trim().is_empty() {
        return Err(FormulaError::syntax(0, "formula is empty"));
    }

    let tokens = tokenize(text)?;
    if tokens.is_empty() {
        return Err(FormulaError::syntax(0, "formula contains no tokens"));
    }

    // Parenthesis balance: depth may never go negative and must end at zero
    let mut open_offsets = Vec::new();
    for spanned in &tokens {
        match spanned.token {
            Token::LeftParen => open_offsets.push(spanned.offset),
            Token::RightParen => {
                if open_offsets.pop().is_none() {
                    return Err(FormulaError::syntax(spanned.offset, "unmatched ')'"));
                }
            }
            _ => {}
        }
    }
    if let Some(offset) = open_offsets.pop() {
        return Err(FormulaError::syntax(offset, "missing closing parenthesis"));
    }

    // Adjacent operators: only a unary minus may follow another operator
    for pair in tokens.windows(2) {
        if pair[0].token.is_operator()
            && pair[1].token.is_operator()
            && pair[1].token != Token::Minus
        {
            return Err(FormulaError::syntax(
                pair[1].offset,
                format!(
                    "operator '{}' cannot directly follow '{}'",
                    pair[1].token.describe(),
                    pair[0].token.describe()
                ),
            ));
        }
    }

    Ok(())
}

/// Extract the referenced node ids from formula text
///
/// Deduplicated, in first-appearance order.
pub fn extract_references(text: &str) -> FormulaResult<Vec<NodeId>> {
    let mut seen = HashSet::new();
    let mut refs = Vec::new();

    for spanned in tokenize(text)? {
        if let Token::Reference(id) = spanned.token {
            if seen.insert(id.clone()) {
                refs.push(NodeId::from(id));
            }
        }
    }

    Ok(refs)
}

/// Replace `{{id}}` references with their parenthesized values
///
/// Every id present in `values` becomes `(value)`, parenthesized so sign
/// and precedence survive substitution. Ids absent from the map are left
/// verbatim; the evaluator then reports them as unknown references rather
/// than silently treating them as zero.
pub fn substitute(text: &str, values: &HashMap<NodeId, BigDecimal>) -> String {
    let re = regex!(r"\{\{([^{}]*)\}\}");
    re.replace_all(text, |caps: &Captures| {
        let id = NodeId::from(caps[1].trim());
        match values.get(&id) {
            Some(value) => format!("({})", value.normalized()),
            None => caps[0].to_string(),
        }
    })
    .into_owned()
}

/// Parse formula text into an expression tree
pub fn parse(text: &str) -> FormulaResult<Expr> {
    let tokens = tokenize(text)?;
    let mut parser = Parser::new(text, tokens);
    let expr = parser.parse_expression()?;

    // Make sure we consumed all input
    if let Some(spanned) = parser.current() {
        return Err(FormulaError::syntax(
            spanned.offset,
            format!("unexpected '{}' after expression", spanned.token.describe()),
        ));
    }

    Ok(expr)
}

/// Formula parser
struct Parser<'a> {
    input: &'a str,
    tokens: Vec<Spanned>,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str, tokens: Vec<Spanned>) -> Self {
        Self {
            input,
            tokens,
            pos: 0,
        }
    }

    fn current(&self) -> Option<&Spanned> {
        self.tokens.get(self.pos)
    }

    fn current_token(&self) -> Option<&Token> {
        self.current().map(|s| &s.token)
    }

    /// Byte offset for error reporting at the current position
    fn offset(&self) -> usize {
        self.current().map_or(self.input.len(), |s| s.offset)
    }

    fn consume(&mut self) -> Option<Spanned> {
        let spanned = self.tokens.get(self.pos).cloned();
        if spanned.is_some() {
            self.pos += 1;
        }
        spanned
    }

    // === Expression parsing with precedence ===
    // Precedence (lowest to highest):
    // 1. Addition/Subtraction: +, -
    // 2. Multiplication/Division/Modulo: *, /, %
    // 3. Exponentiation: ^ (folds left: 2^3^2 = 64)
    // 4. Unary: -, +
    // 5. Primary: literals, references, parentheses

    fn parse_expression(&mut self) -> FormulaResult<Expr> {
        self.parse_additive()
    }

    fn parse_additive(&mut self) -> FormulaResult<Expr> {
        let mut left = self.parse_multiplicative()?;

        loop {
            let op = match self.current_token() {
                Some(Token::Plus) => BinaryOperator::Add,
                Some(Token::Minus) => BinaryOperator::Subtract,
                _ => break,
            };

            self.consume();
            let right = self.parse_multiplicative()?;
            left = Expr::BinaryOp {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }

        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> FormulaResult<Expr> {
        let mut left = self.parse_power()?;

        loop {
            let op = match self.current_token() {
                Some(Token::Star) => BinaryOperator::Multiply,
                Some(Token::Slash) => BinaryOperator::Divide,
                Some(Token::Percent) => BinaryOperator::Modulo,
                _ => break,
            };

            self.consume();
            let right = self.parse_power()?;
            left = Expr::BinaryOp {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }

        Ok(left)
    }

    fn parse_power(&mut self) -> FormulaResult<Expr> {
        let mut left = self.parse_unary()?;

        // Left fold: 2^3^2 is (2^3)^2 = 64
        while matches!(self.current_token(), Some(Token::Caret)) {
            self.consume();
            let right = self.parse_unary()?;
            left = Expr::BinaryOp {
                op: BinaryOperator::Power,
                left: Box::new(left),
                right: Box::new(right),
            };
        }

        Ok(left)
    }

    fn parse_unary(&mut self) -> FormulaResult<Expr> {
        // Prefix unary minus
        if matches!(self.current_token(), Some(Token::Minus)) {
            self.consume();
            let operand = self.parse_unary()?;
            return Ok(Expr::UnaryOp {
                op: UnaryOperator::Negate,
                operand: Box::new(operand),
            });
        }

        // Prefix plus (no-op)
        if matches!(self.current_token(), Some(Token::Plus)) {
            self.consume();
            return self.parse_unary();
        }

        self.parse_primary()
    }

    fn parse_primary(&mut self) -> FormulaResult<Expr> {
        let offset = self.offset();

        match self.consume().map(|s| s.token) {
            Some(Token::Number(n)) => Ok(Expr::Number(n)),

            Some(Token::Reference(id)) => Ok(Expr::Reference(id)),

            Some(Token::LeftParen) => {
                let expr = self.parse_expression()?;
                match self.current_token() {
                    Some(Token::RightParen) => {
                        self.consume();
                        Ok(expr)
                    }
                    _ => Err(FormulaError::syntax(
                        self.offset(),
                        "missing closing parenthesis",
                    )),
                }
            }

            Some(token) => Err(FormulaError::syntax(
                offset,
                format!("unexpected '{}'", token.describe()),
            )),

            None => Err(FormulaError::syntax(offset, "unexpected end of formula")),
        }
    }
}
