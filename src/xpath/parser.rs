//! `XPath` 1.0 expression parser.
//!
//! A recursive descent parser with one token of lookahead. It pulls tokens
//! through a [`TokenStream`] and produces a [`Node`] tree.
//!
//! # Operator Precedence
//!
//! From lowest to highest:
//! 1. `or`
//! 2. `and`
//! 3. `=`, `!=` (equality)
//! 4. `<`, `<=`, `>`, `>=` (relational)
//! 5. `+`, `-` (additive)
//! 6. `*`, `div`, `mod` (multiplicative)
//! 7. `|` (union)
//! 8. Expression members: paths, literals, variables, `( Expr )`
//!
//! Every level folds its operands to the left, except the multiplicative
//! level: it takes at most one operator and parses the right-hand side as a
//! whole multiplicative expression, so `4 div 2 div 2` is
//! `div(4, div(2, 2))`.
//!
//! Two limits keep hostile input from exhausting the stack. `max_depth`
//! bounds how deeply the parser recurses, and `max_tree_depth` bounds the
//! height of the tree it builds. Flat operator chains and predicate runs
//! grow the tree without recursing, so they only hit the second limit.

use tracing::debug;

use super::ast::{Axis, BinaryOp, Node};
use super::lexer::Lexer;
use super::stream::TokenStream;
use super::token::{Token, TokenKind};
use crate::error::XPathError;

/// Default maximum nesting depth.
pub const DEFAULT_MAX_DEPTH: u32 = 128;

/// Default maximum height of a parsed tree.
pub const DEFAULT_MAX_TREE_DEPTH: u32 = 512;

const OR_OPERATORS: &[(TokenKind, BinaryOp)] = &[(TokenKind::Or, BinaryOp::Or)];

const AND_OPERATORS: &[(TokenKind, BinaryOp)] = &[(TokenKind::And, BinaryOp::And)];

const EQUALITY_OPERATORS: &[(TokenKind, BinaryOp)] = &[
    (TokenKind::Eq, BinaryOp::Eq),
    (TokenKind::Neq, BinaryOp::Neq),
];

const RELATIONAL_OPERATORS: &[(TokenKind, BinaryOp)] = &[
    (TokenKind::Lt, BinaryOp::Lt),
    (TokenKind::Gt, BinaryOp::Gt),
    (TokenKind::Lte, BinaryOp::Lte),
    (TokenKind::Gte, BinaryOp::Gte),
];

const ADDITIVE_OPERATORS: &[(TokenKind, BinaryOp)] = &[
    (TokenKind::Add, BinaryOp::Add),
    (TokenKind::Sub, BinaryOp::Sub),
];

const MULTIPLICATIVE_OPERATORS: &[(TokenKind, BinaryOp)] = &[
    (TokenKind::Div, BinaryOp::Div),
    (TokenKind::Mod, BinaryOp::Mod),
    (TokenKind::Mul, BinaryOp::Mul),
];

const UNION_OPERATORS: &[(TokenKind, BinaryOp)] = &[(TokenKind::Pipe, BinaryOp::Pipe)];

/// Options controlling expression parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseOptions {
    /// Maximum nesting of parenthesized expressions, predicates, call
    /// arguments and chained multiplicative operators (default: 128).
    pub max_depth: u32,
    /// Maximum height of the produced tree, counting a leaf as 1
    /// (default: 512).
    pub max_tree_depth: u32,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            max_tree_depth: DEFAULT_MAX_TREE_DEPTH,
        }
    }
}

impl ParseOptions {
    /// Sets the maximum nesting depth.
    #[must_use]
    pub fn max_depth(mut self, max: u32) -> Self {
        self.max_depth = max;
        self
    }

    /// Sets the maximum tree height.
    #[must_use]
    pub fn max_tree_depth(mut self, max: u32) -> Self {
        self.max_tree_depth = max;
        self
    }
}

/// Parses an `XPath` expression string into an AST.
///
/// Returns `Ok(None)` for an empty (or all-whitespace) expression.
///
/// # Errors
///
/// Returns [`XPathError`] if the input does not lex or is not a valid
/// expression.
///
/// # Examples
///
/// ```
/// use xpathoxide::xpath::parser::parse;
///
/// let expr = parse("/html/body/p[1]").unwrap().unwrap();
/// assert_eq!(
///     expr.to_string(),
///     r#"(absolute_path (axis child (test nil "html")) (axis child (test nil "body")) (predicate (axis child (test nil "p")) (int 1)))"#
/// );
/// assert!(parse("").unwrap().is_none());
/// ```
pub fn parse(input: &str) -> Result<Option<Node>, XPathError> {
    parse_with_options(input, &ParseOptions::default())
}

/// Parses an `XPath` expression string with explicit options.
///
/// # Errors
///
/// Returns [`XPathError`] if the input does not lex, is not a valid
/// expression, or nests deeper than `options.max_depth`.
pub fn parse_with_options(input: &str, options: &ParseOptions) -> Result<Option<Node>, XPathError> {
    Parser::with_options(Lexer::new(input), options.clone()).parse()
}

/// A parsed subtree and its height.
struct Subtree {
    node: Node,
    height: u32,
}

impl Subtree {
    fn leaf(node: Node) -> Self {
        Self { node, height: 1 }
    }
}

/// Recursive descent parser over any token source.
///
/// A parser is single-use: [`Parser::parse`] consumes it.
pub struct Parser<I> {
    stream: TokenStream<I>,
    /// The lookahead token.
    current: Token,
    depth: u32,
    options: ParseOptions,
}

impl<I> Parser<I>
where
    I: Iterator<Item = Result<Token, XPathError>>,
{
    /// Creates a parser with default options.
    pub fn new<T>(tokens: T) -> Self
    where
        T: IntoIterator<IntoIter = I>,
    {
        Self::with_options(tokens, ParseOptions::default())
    }

    /// Creates a parser with the given options.
    pub fn with_options<T>(tokens: T, options: ParseOptions) -> Self
    where
        T: IntoIterator<IntoIter = I>,
    {
        Self {
            stream: TokenStream::new(tokens),
            current: Token::end(),
            depth: 0,
            options,
        }
    }

    /// Parses the whole token stream as one expression.
    ///
    /// Returns `Ok(None)` if the stream holds no tokens.
    ///
    /// # Errors
    ///
    /// Returns the first lexer or syntax error. No partial tree is produced.
    pub fn parse(mut self) -> Result<Option<Node>, XPathError> {
        let result = self.parse_root();
        if let Err(err) = &result {
            debug!(line = err.line(), error = %err, "xpath parse failed");
        }
        result
    }

    fn parse_root(&mut self) -> Result<Option<Node>, XPathError> {
        self.current = self.stream.next_token()?;
        if self.peek() == TokenKind::End {
            return Ok(None);
        }

        let expr = self.parse_expression()?;
        if self.peek() != TokenKind::End {
            return Err(self.error(format!("unexpected {} after expression", self.current)));
        }
        Ok(Some(expr.node))
    }

    // -----------------------------------------------------------------------
    // Token access helpers
    // -----------------------------------------------------------------------

    fn peek(&self) -> TokenKind {
        self.current.kind
    }

    /// Consumes the lookahead token and returns it.
    fn advance(&mut self) -> Result<Token, XPathError> {
        let next = self.stream.next_token()?;
        Ok(std::mem::replace(&mut self.current, next))
    }

    /// Consumes the lookahead token and returns its payload.
    fn advance_value(&mut self) -> Result<String, XPathError> {
        Ok(self.advance()?.value.unwrap_or_default())
    }

    /// Consumes the lookahead token if it is of the given kind.
    fn eat(&mut self, kind: TokenKind) -> Result<bool, XPathError> {
        if self.peek() == kind {
            self.advance()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// Consumes a token of the given kind, or fails.
    fn expect(&mut self, kind: TokenKind) -> Result<Token, XPathError> {
        if self.peek() == kind {
            self.advance()
        } else {
            Err(self.unexpected(&format!("expected {kind}")))
        }
    }

    /// Consumes the lookahead token if it is one of `operators`.
    fn eat_operator(
        &mut self,
        operators: &[(TokenKind, BinaryOp)],
    ) -> Result<Option<BinaryOp>, XPathError> {
        let kind = self.peek();
        match operators.iter().find(|(candidate, _)| *candidate == kind) {
            Some(&(_, op)) => {
                self.advance()?;
                Ok(Some(op))
            }
            None => Ok(None),
        }
    }

    fn error(&self, message: String) -> XPathError {
        XPathError::syntax(message, self.stream.line())
    }

    fn unexpected(&self, expected: &str) -> XPathError {
        self.error(format!("{expected}, found {}", self.current))
    }

    /// Runs `f` one nesting level deeper, enforcing `max_depth`.
    fn nested<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<T, XPathError>,
    ) -> Result<T, XPathError> {
        if self.depth >= self.options.max_depth {
            return Err(XPathError::TooDeep {
                limit: self.options.max_depth,
                line: self.stream.line(),
            });
        }
        self.depth += 1;
        let result = f(self);
        self.depth -= 1;
        result
    }

    /// Places `node` one level above its tallest child, enforcing
    /// `max_tree_depth`.
    fn grow(&self, node: Node, child_height: u32) -> Result<Subtree, XPathError> {
        let height = child_height.saturating_add(1);
        if height > self.options.max_tree_depth {
            return Err(XPathError::TooDeep {
                limit: self.options.max_tree_depth,
                line: self.stream.line(),
            });
        }
        Ok(Subtree { node, height })
    }

    /// Builds a node over a list of children with `build`.
    fn grow_over(
        &self,
        build: impl FnOnce(Vec<Node>) -> Node,
        children: Vec<Subtree>,
    ) -> Result<Subtree, XPathError> {
        let height = children.iter().map(|child| child.height).max().unwrap_or(0);
        let nodes = children.into_iter().map(|child| child.node).collect();
        self.grow(build(nodes), height)
    }

    // -----------------------------------------------------------------------
    // Precedence ladder
    // -----------------------------------------------------------------------

    /// ```text
    /// Expr ::= OrExpr
    /// ```
    fn parse_expression(&mut self) -> Result<Subtree, XPathError> {
        self.nested(Self::parse_or_expr)
    }

    /// ```text
    /// OrExpr ::= AndExpr ('or' AndExpr)*
    /// ```
    fn parse_or_expr(&mut self) -> Result<Subtree, XPathError> {
        self.parse_binary_level(OR_OPERATORS, Self::parse_and_expr)
    }

    /// ```text
    /// AndExpr ::= EqualityExpr ('and' EqualityExpr)*
    /// ```
    fn parse_and_expr(&mut self) -> Result<Subtree, XPathError> {
        self.parse_binary_level(AND_OPERATORS, Self::parse_equality_expr)
    }

    /// ```text
    /// EqualityExpr ::= RelationalExpr (('=' | '!=') RelationalExpr)*
    /// ```
    fn parse_equality_expr(&mut self) -> Result<Subtree, XPathError> {
        self.parse_binary_level(EQUALITY_OPERATORS, Self::parse_relational_expr)
    }

    /// ```text
    /// RelationalExpr ::= AdditiveExpr (('<' | '>' | '<=' | '>=') AdditiveExpr)*
    /// ```
    fn parse_relational_expr(&mut self) -> Result<Subtree, XPathError> {
        self.parse_binary_level(RELATIONAL_OPERATORS, Self::parse_additive_expr)
    }

    /// ```text
    /// AdditiveExpr ::= MultiplicativeExpr (('+' | '-') MultiplicativeExpr)*
    /// ```
    fn parse_additive_expr(&mut self) -> Result<Subtree, XPathError> {
        self.parse_binary_level(ADDITIVE_OPERATORS, Self::parse_multiplicative_expr)
    }

    /// ```text
    /// MultiplicativeExpr ::= UnionExpr (('div' | 'mod' | '*') MultiplicativeExpr)?
    /// ```
    ///
    /// Right-associative: the optional right operand is a whole
    /// multiplicative expression.
    fn parse_multiplicative_expr(&mut self) -> Result<Subtree, XPathError> {
        let left = self.parse_union_expr()?;
        match self.eat_operator(MULTIPLICATIVE_OPERATORS)? {
            Some(op) => {
                let right = self.nested(Self::parse_multiplicative_expr)?;
                let height = left.height.max(right.height);
                self.grow(Node::binary(op, left.node, right.node), height)
            }
            None => Ok(left),
        }
    }

    /// ```text
    /// UnionExpr ::= ExpressionMember ('|' ExpressionMember)*
    /// ```
    fn parse_union_expr(&mut self) -> Result<Subtree, XPathError> {
        self.parse_binary_level(UNION_OPERATORS, Self::parse_expression_member)
    }

    /// Parses `operand (operator operand)*`, folding each follow-pair onto
    /// the tree built so far so the result nests to the left.
    fn parse_binary_level(
        &mut self,
        operators: &[(TokenKind, BinaryOp)],
        operand: fn(&mut Self) -> Result<Subtree, XPathError>,
    ) -> Result<Subtree, XPathError> {
        let mut left = operand(self)?;
        while let Some(op) = self.eat_operator(operators)? {
            let right = operand(self)?;
            let height = left.height.max(right.height);
            left = self.grow(Node::binary(op, left.node, right.node), height)?;
        }
        Ok(left)
    }

    // -----------------------------------------------------------------------
    // Expression members
    // -----------------------------------------------------------------------

    /// ```text
    /// ExpressionMember ::= RelativePath
    ///                    | AbsolutePath
    ///                    | String
    ///                    | Number
    ///                    | Variable
    ///                    | '(' Expr ')'
    /// ```
    fn parse_expression_member(&mut self) -> Result<Subtree, XPathError> {
        match self.peek() {
            TokenKind::Ident | TokenKind::TypeTest | TokenKind::Axis => self.parse_relative_path(),
            TokenKind::Slash => self.parse_absolute_path(),
            TokenKind::String => Ok(Subtree::leaf(Node::String(self.advance_value()?))),
            TokenKind::Int => Ok(Subtree::leaf(Node::Int(self.advance_value()?))),
            TokenKind::Float => Ok(Subtree::leaf(Node::Float(self.advance_value()?))),
            TokenKind::Var => Ok(Subtree::leaf(Node::Var(self.advance_value()?))),
            TokenKind::LParen => {
                self.advance()?;
                let expr = self.parse_expression()?;
                self.expect(TokenKind::RParen)?;
                Ok(expr)
            }
            _ => Err(self.unexpected("expected an expression")),
        }
    }

    // -----------------------------------------------------------------------
    // Location paths
    // -----------------------------------------------------------------------

    /// ```text
    /// RelativePath ::= Step ('/' Step)*
    /// ```
    ///
    /// A single step is returned unwrapped.
    fn parse_relative_path(&mut self) -> Result<Subtree, XPathError> {
        let mut steps = vec![self.parse_step()?];
        self.parse_following_steps(&mut steps)?;

        match <[Subtree; 1]>::try_from(steps) {
            Ok([step]) => Ok(step),
            Err(steps) => self.grow_over(Node::Path, steps),
        }
    }

    /// ```text
    /// AbsolutePath ::= '/' (Step ('/' Step)*)?
    /// ```
    fn parse_absolute_path(&mut self) -> Result<Subtree, XPathError> {
        self.expect(TokenKind::Slash)?;

        let mut steps = Vec::new();
        if matches!(
            self.peek(),
            TokenKind::Ident | TokenKind::TypeTest | TokenKind::Axis
        ) {
            steps.push(self.parse_step()?);
            self.parse_following_steps(&mut steps)?;
        }

        self.grow_over(Node::AbsolutePath, steps)
    }

    fn parse_following_steps(&mut self, steps: &mut Vec<Subtree>) -> Result<(), XPathError> {
        while self.eat(TokenKind::Slash)? {
            steps.push(self.parse_step()?);
        }
        Ok(())
    }

    /// ```text
    /// Step ::= Ident '(' Args ')' Predicate*
    ///        | Ident (':' Ident)? Predicate*
    ///        | TypeTest Predicate*
    ///        | Axis AxisValue Predicate*
    /// ```
    fn parse_step(&mut self) -> Result<Subtree, XPathError> {
        let step = match self.peek() {
            TokenKind::Ident => {
                let name = self.advance_value()?;
                if self.eat(TokenKind::LParen)? {
                    let args = self.parse_call_args()?;
                    self.expect(TokenKind::RParen)?;
                    self.grow_over(|args| Node::Call { name, args }, args)?
                } else {
                    let test = self.parse_name_test(name)?;
                    self.grow(Node::child(test), 1)?
                }
            }
            TokenKind::TypeTest => {
                let test = Node::TypeTest(self.advance_value()?);
                self.grow(Node::child(test), 1)?
            }
            TokenKind::Axis => {
                let token = self.advance()?;
                let Some(axis) = Axis::parse(token.text()) else {
                    return Err(self.error(format!("unknown axis '{}'", token.text())));
                };
                let value = self.parse_axis_value()?;
                self.grow(Node::axis(axis, value), 1)?
            }
            _ => return Err(self.unexpected("expected a location step")),
        };

        self.parse_predicates(step)
    }

    /// Parses the node test following an axis.
    fn parse_axis_value(&mut self) -> Result<Node, XPathError> {
        match self.peek() {
            TokenKind::Ident => {
                let name = self.advance_value()?;
                self.parse_name_test(name)
            }
            TokenKind::TypeTest => Ok(Node::TypeTest(self.advance_value()?)),
            _ => Err(self.unexpected("expected a node test after axis")),
        }
    }

    /// Completes a name test whose first identifier has been consumed,
    /// picking up an optional `: local-name` qualifier.
    fn parse_name_test(&mut self, name: String) -> Result<Node, XPathError> {
        if self.eat(TokenKind::Colon)? {
            let local = self.expect(TokenKind::Ident)?.value.unwrap_or_default();
            Ok(Node::Test {
                prefix: Some(name),
                name: local,
            })
        } else {
            Ok(Node::Test { prefix: None, name })
        }
    }

    /// ```text
    /// Args ::= (Expr (',' Expr)*)?
    /// ```
    fn parse_call_args(&mut self) -> Result<Vec<Subtree>, XPathError> {
        let mut args = Vec::new();
        if self.peek() != TokenKind::RParen {
            args.push(self.parse_expression()?);
            while self.eat(TokenKind::Comma)? {
                args.push(self.parse_expression()?);
            }
        }
        Ok(args)
    }

    /// ```text
    /// Predicate ::= '[' Expr ']'
    /// ```
    ///
    /// Each predicate wraps the step built so far.
    fn parse_predicates(&mut self, step: Subtree) -> Result<Subtree, XPathError> {
        let mut step = step;
        while self.eat(TokenKind::LBrack)? {
            let filter = self.parse_expression()?;
            self.expect(TokenKind::RBrack)?;
            let height = step.height.max(filter.height);
            step = self.grow(Node::predicate(step.node, filter.node), height)?;
        }
        Ok(step)
    }
}
