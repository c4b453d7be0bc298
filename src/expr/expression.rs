//! Core expression types.
//!
//! An `Expr` is an immutable tree whose children are shared through `Arc`,
//! so sub-expressions such as the trade vector can be reused by several
//! objective and constraint terms without copying.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use nalgebra::{DMatrix, DVector};

use super::shape::Shape;

/// Unique identifier for decision variables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ExprId(u64);

impl ExprId {
    /// Generate a new unique ID.
    pub fn new() -> Self {
        static NEXT_ID: AtomicU64 = AtomicU64::new(0);
        ExprId(NEXT_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl Default for ExprId {
    fn default() -> Self {
        Self::new()
    }
}

/// Constant data held by an expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Array {
    /// Scalar value.
    Scalar(f64),
    /// Dense column vector.
    Vector(DVector<f64>),
    /// Dense matrix.
    Matrix(DMatrix<f64>),
}

impl Array {
    /// Get the shape of the array.
    pub fn shape(&self) -> Shape {
        match self {
            Array::Scalar(_) => Shape::Scalar,
            Array::Vector(v) => Shape::Vector(v.len()),
            Array::Matrix(m) => Shape::Matrix(m.nrows(), m.ncols()),
        }
    }

    /// Flatten scalars and vectors into a column vector.
    ///
    /// Matrices are not flattened; they only act as linear maps.
    pub fn as_vector(&self) -> Option<DVector<f64>> {
        match self {
            Array::Scalar(v) => Some(DVector::from_element(1, *v)),
            Array::Vector(v) => Some(v.clone()),
            Array::Matrix(_) => None,
        }
    }

    fn values(&self) -> &[f64] {
        match self {
            Array::Scalar(v) => std::slice::from_ref(v),
            Array::Vector(v) => v.as_slice(),
            Array::Matrix(m) => m.as_slice(),
        }
    }

    /// Check if all elements are non-negative.
    pub fn is_nonneg(&self) -> bool {
        self.values().iter().all(|&v| v >= 0.0)
    }

    /// Check if all elements are non-positive.
    pub fn is_nonpos(&self) -> bool {
        self.values().iter().all(|&v| v <= 0.0)
    }
}

impl From<f64> for Array {
    fn from(v: f64) -> Self {
        Array::Scalar(v)
    }
}

impl From<DVector<f64>> for Array {
    fn from(v: DVector<f64>) -> Self {
        Array::Vector(v)
    }
}

impl From<DMatrix<f64>> for Array {
    fn from(m: DMatrix<f64>) -> Self {
        Array::Matrix(m)
    }
}

/// Data for a variable expression.
#[derive(Debug, Clone)]
pub struct VariableData {
    /// Unique identifier.
    pub id: ExprId,
    /// Shape of the variable.
    pub shape: Shape,
    /// Optional name for display.
    pub name: Option<String>,
}

/// An expression over decision variables.
#[derive(Debug, Clone)]
pub enum Expr {
    /// A decision variable.
    Variable(VariableData),
    /// A constant value.
    Constant(Array),

    /// Addition with scalar broadcasting: a + b
    Add(Arc<Expr>, Arc<Expr>),
    /// Negation: -a
    Neg(Arc<Expr>),
    /// Elementwise product; one side must be constant.
    Mul(Arc<Expr>, Arc<Expr>),
    /// Constant matrix (or row vector) times an expression.
    MatMul(Arc<Expr>, Arc<Expr>),
    /// Sum of all elements.
    Sum(Arc<Expr>),
    /// Concatenation of scalars and vectors into one vector.
    VStack(Vec<Arc<Expr>>),

    /// L1 norm: ||x||_1
    Norm1(Arc<Expr>),
    /// L2 norm: ||x||_2
    Norm2(Arc<Expr>),
    /// Absolute value (elementwise).
    Abs(Arc<Expr>),
    /// Positive part: max(x, 0) (elementwise).
    Pos(Arc<Expr>),
    /// Power of the magnitude: |x|^p (elementwise, p >= 1).
    Power(Arc<Expr>, f64),
}

impl Expr {
    /// Get the shape of the expression.
    ///
    /// Ill-formed combinations fall back to the left operand's shape; they
    /// are rejected later by [`crate::canon::canonicalize`].
    pub fn shape(&self) -> Shape {
        match self {
            Expr::Variable(v) => v.shape,
            Expr::Constant(c) => c.shape(),
            Expr::Add(a, b) | Expr::Mul(a, b) => {
                let (sa, sb) = (a.shape(), b.shape());
                sa.broadcast(&sb).unwrap_or(sa)
            }
            Expr::MatMul(a, b) => {
                let (sa, sb) = (a.shape(), b.shape());
                sa.matmul(&sb).unwrap_or(sb)
            }
            Expr::Neg(a) | Expr::Abs(a) | Expr::Pos(a) | Expr::Power(a, _) => a.shape(),
            Expr::Sum(_) | Expr::Norm1(_) | Expr::Norm2(_) => Shape::Scalar,
            Expr::VStack(exprs) => Shape::Vector(exprs.iter().map(|e| e.shape().size()).sum()),
        }
    }

    /// Get the unique ID if this is a variable.
    pub fn variable_id(&self) -> Option<ExprId> {
        match self {
            Expr::Variable(v) => Some(v.id),
            _ => None,
        }
    }

    /// Check if this expression is a constant leaf.
    pub fn is_constant(&self) -> bool {
        matches!(self, Expr::Constant(_))
    }

    /// Get the constant value if this is a constant leaf.
    pub fn constant_value(&self) -> Option<&Array> {
        match self {
            Expr::Constant(c) => Some(c),
            _ => None,
        }
    }

    /// All variables in this expression, ordered by id.
    pub fn variables(&self) -> Vec<(ExprId, Shape)> {
        let mut vars = BTreeMap::new();
        self.collect_variables(&mut vars);
        vars.into_iter().collect()
    }

    pub(crate) fn collect_variables(&self, vars: &mut BTreeMap<ExprId, Shape>) {
        match self {
            Expr::Variable(v) => {
                vars.insert(v.id, v.shape);
            }
            Expr::Constant(_) => {}
            Expr::Add(a, b) | Expr::Mul(a, b) | Expr::MatMul(a, b) => {
                a.collect_variables(vars);
                b.collect_variables(vars);
            }
            Expr::Neg(a)
            | Expr::Sum(a)
            | Expr::Norm1(a)
            | Expr::Norm2(a)
            | Expr::Abs(a)
            | Expr::Pos(a)
            | Expr::Power(a, _) => a.collect_variables(vars),
            Expr::VStack(exprs) => {
                for e in exprs {
                    e.collect_variables(vars);
                }
            }
        }
    }
}

impl From<f64> for Expr {
    fn from(value: f64) -> Self {
        Expr::Constant(Array::Scalar(value))
    }
}

impl From<DVector<f64>> for Expr {
    fn from(value: DVector<f64>) -> Self {
        Expr::Constant(Array::Vector(value))
    }
}

impl From<&DVector<f64>> for Expr {
    fn from(value: &DVector<f64>) -> Self {
        Expr::Constant(Array::Vector(value.clone()))
    }
}

impl From<DMatrix<f64>> for Expr {
    fn from(value: DMatrix<f64>) -> Self {
        Expr::Constant(Array::Matrix(value))
    }
}

impl From<&Expr> for Expr {
    fn from(expr: &Expr) -> Self {
        expr.clone()
    }
}
