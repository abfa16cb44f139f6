//! Abstract syntax tree types for `XPath` 1.0 expressions.
//!
//! The parser produces a single tree type, [`Node`]. Each variant owns exactly
//! the fields its tag needs: binary operators always have two operands, a
//! `call` has a name and a list of arguments, and so on. Nodes are never
//! mutated after construction; larger trees are built by wrapping existing
//! nodes (for example a [`Node::Predicate`] wrapping a [`Node::Axis`]).
//!
//! Literal nodes carry the raw lexed text. Converting `int`/`float` text to
//! numbers is left to the evaluator.

use std::fmt;

/// A node in a parsed `XPath` expression tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// A binary operation (`a or b`, `x = y`, `1 + 2`, `a | b`, ...).
    Binary {
        /// The operator.
        op: BinaryOp,
        /// The left-hand operand.
        left: Box<Node>,
        /// The right-hand operand.
        right: Box<Node>,
    },

    /// A relative location path with two or more steps (`a/b`).
    ///
    /// A single-step relative path is never wrapped; the step node is used
    /// directly.
    Path(Vec<Node>),

    /// An absolute location path (`/a/b`).
    ///
    /// An empty step list is the bare `/` (the document root).
    AbsolutePath(Vec<Node>),

    /// A step along an axis. `value` is a [`Node::Test`] or [`Node::TypeTest`].
    Axis {
        /// The axis to walk.
        axis: Axis,
        /// The node test applied to each candidate.
        value: Box<Node>,
    },

    /// A step narrowed by a bracketed filter expression (`foo[1]`).
    Predicate {
        /// The filtered step.
        step: Box<Node>,
        /// The filter expression.
        filter: Box<Node>,
    },

    /// A name test, optionally namespace-qualified (`foo`, `ns:foo`, `*`).
    Test {
        /// The namespace prefix, if any.
        prefix: Option<String>,
        /// The local name (or `*`).
        name: String,
    },

    /// A node type test (`node()`, `text()`, `comment()`,
    /// `processing-instruction()`), holding the type name.
    TypeTest(String),

    /// A function call (`count(foo)`).
    Call {
        /// The function name.
        name: String,
        /// The argument expressions, in source order.
        args: Vec<Node>,
    },

    /// A string literal, without its quotes.
    String(String),

    /// An integer literal as lexed.
    Int(String),

    /// A floating point literal as lexed.
    Float(String),

    /// A variable reference, without the leading `$`.
    Var(String),
}

impl Node {
    /// Builds a binary operator node.
    #[must_use]
    pub fn binary(op: BinaryOp, left: Node, right: Node) -> Self {
        Self::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// Builds an axis step.
    #[must_use]
    pub fn axis(axis: Axis, value: Node) -> Self {
        Self::Axis {
            axis,
            value: Box::new(value),
        }
    }

    /// Builds a step on the implicit `child` axis.
    #[must_use]
    pub fn child(value: Node) -> Self {
        Self::axis(Axis::Child, value)
    }

    /// Builds a name test.
    #[must_use]
    pub fn test(prefix: Option<&str>, name: &str) -> Self {
        Self::Test {
            prefix: prefix.map(str::to_string),
            name: name.to_string(),
        }
    }

    /// Wraps `step` in a predicate.
    #[must_use]
    pub fn predicate(step: Node, filter: Node) -> Self {
        Self::Predicate {
            step: Box::new(step),
            filter: Box::new(filter),
        }
    }

    /// Builds a function call node.
    #[must_use]
    pub fn call(name: &str, args: Vec<Node>) -> Self {
        Self::Call {
            name: name.to_string(),
            args,
        }
    }

    /// Returns the tag of this node.
    #[must_use]
    pub fn kind(&self) -> NodeKind {
        match self {
            Self::Binary { op, .. } => NodeKind::Binary(*op),
            Self::Path(_) => NodeKind::Path,
            Self::AbsolutePath(_) => NodeKind::AbsolutePath,
            Self::Axis { .. } => NodeKind::Axis,
            Self::Predicate { .. } => NodeKind::Predicate,
            Self::Test { .. } => NodeKind::Test,
            Self::TypeTest(_) => NodeKind::TypeTest,
            Self::Call { .. } => NodeKind::Call,
            Self::String(_) => NodeKind::String,
            Self::Int(_) => NodeKind::Int,
            Self::Float(_) => NodeKind::Float,
            Self::Var(_) => NodeKind::Var,
        }
    }
}

/// Dropping walks the tree with a heap stack so that arbitrarily deep trees
/// built by hand do not overflow the call stack.
impl Drop for Node {
    fn drop(&mut self) {
        let mut pending = Vec::new();
        self.detach_children(&mut pending);
        while let Some(mut node) = pending.pop() {
            node.detach_children(&mut pending);
        }
    }
}

impl Node {
    /// Moves every child that has children of its own onto `out`.
    fn detach_children(&mut self, out: &mut Vec<Node>) {
        match self {
            Self::Binary { left, right, .. }
            | Self::Predicate {
                step: left,
                filter: right,
            } => {
                detach_boxed(left, out);
                detach_boxed(right, out);
            }
            Self::Axis { value, .. } => detach_boxed(value, out),
            Self::Path(children) | Self::AbsolutePath(children) | Self::Call { args: children, .. } => {
                out.append(children);
            }
            Self::Test { .. }
            | Self::TypeTest(_)
            | Self::String(_)
            | Self::Int(_)
            | Self::Float(_)
            | Self::Var(_) => {}
        }
    }

    fn has_children(&self) -> bool {
        match self {
            Self::Binary { .. } | Self::Axis { .. } | Self::Predicate { .. } => true,
            Self::Path(children) | Self::AbsolutePath(children) | Self::Call { args: children, .. } => {
                !children.is_empty()
            }
            _ => false,
        }
    }
}

fn detach_boxed(slot: &mut Node, out: &mut Vec<Node>) {
    if slot.has_children() {
        out.push(std::mem::replace(slot, Node::Int(String::new())));
    }
}

/// Renders the tree as an S-expression, e.g. `(axis child (test nil "foo"))`.
impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Binary { op, left, right } => write!(f, "({op} {left} {right})"),
            Self::Path(steps) | Self::AbsolutePath(steps) => {
                f.write_str("(")?;
                f.write_str(self.kind().as_str())?;
                for step in steps {
                    write!(f, " {step}")?;
                }
                f.write_str(")")
            }
            Self::Axis { axis, value } => write!(f, "(axis {axis} {value})"),
            Self::Predicate { step, filter } => write!(f, "(predicate {step} {filter})"),
            Self::Test { prefix, name } => match prefix {
                Some(prefix) => write!(f, "(test {prefix:?} {name:?})"),
                None => write!(f, "(test nil {name:?})"),
            },
            Self::TypeTest(text) => write!(f, "(type_test {text:?})"),
            Self::Call { name, args } => {
                write!(f, "(call {name:?}")?;
                for arg in args {
                    write!(f, " {arg}")?;
                }
                f.write_str(")")
            }
            Self::String(text) | Self::Var(text) => {
                write!(f, "({} {text:?})", self.kind().as_str())
            }
            Self::Int(text) | Self::Float(text) => write!(f, "({} {text})", self.kind().as_str()),
        }
    }
}

/// The closed set of node tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// One of the binary operator tags.
    Binary(BinaryOp),
    /// `path`
    Path,
    /// `absolute_path`
    AbsolutePath,
    /// `axis`
    Axis,
    /// `predicate`
    Predicate,
    /// `test`
    Test,
    /// `type_test`
    TypeTest,
    /// `call`
    Call,
    /// `string`
    String,
    /// `int`
    Int,
    /// `float`
    Float,
    /// `var`
    Var,
}

impl NodeKind {
    /// Returns the lowercase tag name (`"add"`, `"absolute_path"`, ...).
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Binary(op) => op.as_str(),
            Self::Path => "path",
            Self::AbsolutePath => "absolute_path",
            Self::Axis => "axis",
            Self::Predicate => "predicate",
            Self::Test => "test",
            Self::TypeTest => "type_test",
            Self::Call => "call",
            Self::String => "string",
            Self::Int => "int",
            Self::Float => "float",
            Self::Var => "var",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A binary operator, named by its node tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    /// `or`
    Or,
    /// `and`
    And,
    /// `=`
    Eq,
    /// `!=`
    Neq,
    /// `<`
    Lt,
    /// `>`
    Gt,
    /// `<=`
    Lte,
    /// `>=`
    Gte,
    /// `+`
    Add,
    /// `-`
    Sub,
    /// `div`
    Div,
    /// `mod`
    Mod,
    /// `*`
    Mul,
    /// `|` (node-set union)
    Pipe,
}

impl BinaryOp {
    /// Returns the node tag for this operator.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Or => "or",
            Self::And => "and",
            Self::Eq => "eq",
            Self::Neq => "neq",
            Self::Lt => "lt",
            Self::Gt => "gt",
            Self::Lte => "lte",
            Self::Gte => "gte",
            Self::Add => "add",
            Self::Sub => "sub",
            Self::Div => "div",
            Self::Mod => "mod",
            Self::Mul => "mul",
            Self::Pipe => "pipe",
        }
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An `XPath` axis, specifying the direction of node selection.
///
/// `XPath` 1.0 defines 13 axes. See `XPath` 1.0 section 2.2.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    /// `child`
    Child,
    /// `descendant`
    Descendant,
    /// `parent`
    Parent,
    /// `ancestor`
    Ancestor,
    /// `following-sibling`
    FollowingSibling,
    /// `preceding-sibling`
    PrecedingSibling,
    /// `following`
    Following,
    /// `preceding`
    Preceding,
    /// `attribute`
    Attribute,
    /// `namespace`
    Namespace,
    /// `self`
    Self_,
    /// `descendant-or-self`
    DescendantOrSelf,
    /// `ancestor-or-self`
    AncestorOrSelf,
}

impl Axis {
    /// Returns the axis name as it appears in `XPath` syntax.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Child => "child",
            Self::Descendant => "descendant",
            Self::Parent => "parent",
            Self::Ancestor => "ancestor",
            Self::FollowingSibling => "following-sibling",
            Self::PrecedingSibling => "preceding-sibling",
            Self::Following => "following",
            Self::Preceding => "preceding",
            Self::Attribute => "attribute",
            Self::Namespace => "namespace",
            Self::Self_ => "self",
            Self::DescendantOrSelf => "descendant-or-self",
            Self::AncestorOrSelf => "ancestor-or-self",
        }
    }

    /// Parses an axis name. Returns `None` for unknown names.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "child" => Some(Self::Child),
            "descendant" => Some(Self::Descendant),
            "parent" => Some(Self::Parent),
            "ancestor" => Some(Self::Ancestor),
            "following-sibling" => Some(Self::FollowingSibling),
            "preceding-sibling" => Some(Self::PrecedingSibling),
            "following" => Some(Self::Following),
            "preceding" => Some(Self::Preceding),
            "attribute" => Some(Self::Attribute),
            "namespace" => Some(Self::Namespace),
            "self" => Some(Self::Self_),
            "descendant-or-self" => Some(Self::DescendantOrSelf),
            "ancestor-or-self" => Some(Self::AncestorOrSelf),
            _ => None,
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_axis_names_parse_back() {
        let axes = [
            Axis::Child,
            Axis::Descendant,
            Axis::Parent,
            Axis::Ancestor,
            Axis::FollowingSibling,
            Axis::PrecedingSibling,
            Axis::Following,
            Axis::Preceding,
            Axis::Attribute,
            Axis::Namespace,
            Axis::Self_,
            Axis::DescendantOrSelf,
            Axis::AncestorOrSelf,
        ];
        for axis in axes {
            let name = axis.as_str();
            assert_eq!(Axis::parse(name), Some(axis), "lookup failed for {name}");
        }
    }

    #[test]
    fn test_axis_parse_invalid() {
        assert_eq!(Axis::parse("invalid"), None);
        assert_eq!(Axis::parse(""), None);
        assert_eq!(Axis::parse("children"), None);
    }

    #[test]
    fn test_display_bare_step() {
        let node = Node::child(Node::test(None, "foo"));
        assert_eq!(node.to_string(), r#"(axis child (test nil "foo"))"#);
    }

    #[test]
    fn test_display_qualified_predicate() {
        let node = Node::predicate(
            Node::child(Node::test(Some("ns"), "foo")),
            Node::Int("1".to_string()),
        );
        assert_eq!(
            node.to_string(),
            r#"(predicate (axis child (test "ns" "foo")) (int 1))"#
        );
    }

    #[test]
    fn test_display_paths_and_calls() {
        assert_eq!(Node::AbsolutePath(vec![]).to_string(), "(absolute_path)");

        let path = Node::Path(vec![
            Node::call("foo", vec![]),
            Node::axis(Axis::Attribute, Node::test(None, "id")),
        ]);
        assert_eq!(
            path.to_string(),
            r#"(path (call "foo") (axis attribute (test nil "id")))"#
        );
    }

    #[test]
    fn test_display_binary_and_literals() {
        let node = Node::binary(
            BinaryOp::Eq,
            Node::Var("x".to_string()),
            Node::String("a b".to_string()),
        );
        assert_eq!(node.to_string(), r#"(eq (var "x") (string "a b"))"#);
        assert_eq!(Node::Float("1.5".to_string()).to_string(), "(float 1.5)");
        assert_eq!(
            Node::TypeTest("text".to_string()).to_string(),
            r#"(type_test "text")"#
        );
    }

    #[test]
    fn test_drop_very_deep_tree() {
        let mut node = Node::Int("0".to_string());
        for _ in 0..200_000 {
            node = Node::binary(BinaryOp::Add, node, Node::Int("1".to_string()));
        }
        for _ in 0..200_000 {
            node = Node::predicate(node, Node::call("last", vec![]));
        }
        node = Node::Path(vec![node, Node::child(Node::test(None, "a"))]);
        drop(node);
    }

    #[test]
    fn test_kind_tags() {
        let add = Node::binary(
            BinaryOp::Add,
            Node::Int("1".to_string()),
            Node::Int("2".to_string()),
        );
        assert_eq!(add.kind(), NodeKind::Binary(BinaryOp::Add));
        assert_eq!(add.kind().as_str(), "add");
        assert_eq!(NodeKind::AbsolutePath.as_str(), "absolute_path");
        assert_eq!(NodeKind::TypeTest.to_string(), "type_test");
        assert_eq!(BinaryOp::Pipe.to_string(), "pipe");
    }
}
