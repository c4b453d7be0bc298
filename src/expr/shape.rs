//! Shape representation for expressions.
//!
//! Decision variables are scalars or column vectors. Matrices only appear as
//! constant left operands of a product (factor loadings, Cholesky factors).

use std::fmt;

/// Shape of an expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Shape {
    /// A single number.
    #[default]
    Scalar,
    /// A column vector of length n.
    Vector(usize),
    /// An m x n matrix.
    Matrix(usize, usize),
}

impl Shape {
    /// Create a scalar shape.
    pub fn scalar() -> Self {
        Shape::Scalar
    }

    /// Create a vector shape.
    pub fn vector(n: usize) -> Self {
        Shape::Vector(n)
    }

    /// Create a matrix shape.
    pub fn matrix(m: usize, n: usize) -> Self {
        Shape::Matrix(m, n)
    }

    /// Total number of elements.
    pub fn size(&self) -> usize {
        match *self {
            Shape::Scalar => 1,
            Shape::Vector(n) => n,
            Shape::Matrix(m, n) => m * n,
        }
    }

    /// Number of rows (1 for a scalar).
    pub fn rows(&self) -> usize {
        match *self {
            Shape::Scalar => 1,
            Shape::Vector(n) => n,
            Shape::Matrix(m, _) => m,
        }
    }

    /// Number of columns (1 for scalars and vectors).
    pub fn cols(&self) -> usize {
        match *self {
            Shape::Matrix(_, n) => n,
            _ => 1,
        }
    }

    /// Check if this is a matrix.
    pub fn is_matrix(&self) -> bool {
        matches!(self, Shape::Matrix(_, _))
    }

    /// Result shape of an elementwise operation, if the operands agree.
    ///
    /// Scalars (and length-1 vectors) broadcast against anything.
    pub fn broadcast(&self, other: &Shape) -> Option<Shape> {
        if self == other {
            return Some(*self);
        }
        match (self.size(), other.size()) {
            (1, _) if !self.is_matrix() => Some(*other),
            (_, 1) if !other.is_matrix() => Some(*self),
            (a, b) if a == b && !self.is_matrix() && !other.is_matrix() => {
                Some(Shape::Vector(a))
            }
            _ => None,
        }
    }

    /// Result shape of `self @ other`, if the product is defined.
    ///
    /// A vector on the left is read as a row vector, so `v @ x` is a dot
    /// product.
    pub fn matmul(&self, other: &Shape) -> Option<Shape> {
        match (*self, *other) {
            (Shape::Matrix(m, n), rhs) if !rhs.is_matrix() && rhs.size() == n => {
                Some(Shape::Vector(m))
            }
            (Shape::Vector(n), rhs) if !rhs.is_matrix() && rhs.size() == n => Some(Shape::Scalar),
            (Shape::Scalar, rhs) => Some(rhs),
            _ => None,
        }
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Shape::Scalar => write!(f, "()"),
            Shape::Vector(n) => write!(f, "({},)", n),
            Shape::Matrix(m, n) => write!(f, "({}, {})", m, n),
        }
    }
}

impl From<()> for Shape {
    fn from(_: ()) -> Self {
        Shape::Scalar
    }
}

impl From<usize> for Shape {
    fn from(n: usize) -> Self {
        Shape::Vector(n)
    }
}

impl From<(usize, usize)> for Shape {
    fn from((m, n): (usize, usize)) -> Self {
        Shape::Matrix(m, n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sizes() {
        assert_eq!(Shape::scalar().size(), 1);
        assert_eq!(Shape::vector(5).size(), 5);
        assert_eq!(Shape::matrix(3, 4).size(), 12);
        assert_eq!(Shape::vector(5).rows(), 5);
        assert_eq!(Shape::vector(5).cols(), 1);
    }

    #[test]
    fn test_broadcast() {
        assert_eq!(
            Shape::vector(3).broadcast(&Shape::vector(3)),
            Some(Shape::vector(3))
        );
        assert_eq!(
            Shape::scalar().broadcast(&Shape::vector(4)),
            Some(Shape::vector(4))
        );
        assert_eq!(
            Shape::vector(1).broadcast(&Shape::vector(4)),
            Some(Shape::vector(4))
        );
        assert_eq!(Shape::vector(3).broadcast(&Shape::vector(4)), None);
        assert_eq!(Shape::matrix(3, 1).broadcast(&Shape::vector(3)), None);
    }

    #[test]
    fn test_matmul() {
        assert_eq!(
            Shape::matrix(2, 4).matmul(&Shape::vector(4)),
            Some(Shape::vector(2))
        );
        assert_eq!(
            Shape::vector(4).matmul(&Shape::vector(4)),
            Some(Shape::scalar())
        );
        assert_eq!(Shape::matrix(2, 4).matmul(&Shape::vector(3)), None);
        assert_eq!(Shape::vector(2).matmul(&Shape::matrix(2, 2)), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(Shape::scalar().to_string(), "()");
        assert_eq!(Shape::vector(3).to_string(), "(3,)");
        assert_eq!(Shape::matrix(2, 3).to_string(), "(2, 3)");
    }
}
