//! The value-expression AST for bulk updates.
//!
//! The caller builds these by hand (or via its own quoting mechanism); the
//! node set is closed, so anything the compiler cannot render is an
//! enumerable fatal case, not a surprise.

use sqlwarden_core::Value;

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    /// Logical NOT.
    Not,
    /// Arithmetic negation.
    Neg,
}

/// Binary arithmetic and bitwise operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    BitAnd,
    BitOr,
    BitXor,
}

impl BinaryOp {
    /// The SQL spelling.
    pub fn sql(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Rem => "%",
            BinaryOp::BitAnd => "&",
            BinaryOp::BitOr => "|",
            BinaryOp::BitXor => "^",
        }
    }
}

/// A value expression on the right-hand side of an update assignment.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// A literal known at build time. Bools, strings, integers and floats
    /// inline; everything else becomes a parameter.
    Constant(Value),
    /// A column of the updated entity, as a member path from the query
    /// parameter. Only single-segment paths are supported.
    Column(Vec<String>),
    /// A unary operation.
    Unary {
        /// The operator.
        op: UnaryOp,
        /// The operand.
        operand: Box<Expr>,
    },
    /// A binary operation.
    Binary {
        /// The operator.
        op: BinaryOp,
        /// Left operand.
        left: Box<Expr>,
        /// Right operand.
        right: Box<Expr>,
    },
    /// String concatenation, rendered per dialect.
    Concat(Vec<Expr>),
    /// A value captured from the caller's environment; always becomes a
    /// fresh named parameter.
    Captured(Value),
}

impl Expr {
    /// A column reference by property name.
    pub fn column(property: impl Into<String>) -> Self {
        Expr::Column(vec![property.into()])
    }

    /// A literal constant.
    pub fn constant(value: impl Into<Value>) -> Self {
        Expr::Constant(value.into())
    }

    /// A captured external value.
    pub fn captured(value: impl Into<Value>) -> Self {
        Expr::Captured(value.into())
    }

    /// Binary helper.
    pub fn binary(op: BinaryOp, left: Expr, right: Expr) -> Self {
        Expr::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// Unary helper.
    pub fn unary(op: UnaryOp, operand: Expr) -> Self {
        Expr::Unary {
            op,
            operand: Box::new(operand),
        }
    }
}

/// An ordered set of simple member assignments for `to_update`.
///
/// Only plain `property = expression` bindings exist; anything fancier is
/// rejected at conversion time, never partially applied.
#[derive(Debug, Clone, Default)]
pub struct UpdateSet {
    assignments: Vec<(String, Expr)>,
}

impl UpdateSet {
    /// An empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an assignment.
    pub fn set(mut self, property: impl Into<String>, value: Expr) -> Self {
        self.assignments.push((property.into(), value));
        self
    }

    /// Whether the set holds no assignments.
    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }

    /// The assignments in insertion order.
    pub fn assignments(&self) -> &[(String, Expr)] {
        &self.assignments
    }
}
