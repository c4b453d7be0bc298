//! Variable creation.

use super::expression::{Expr, ExprId, VariableData};
use super::shape::Shape;

/// Builder for decision variables.
#[derive(Debug, Default)]
pub struct VariableBuilder {
    shape: Shape,
    name: Option<String>,
}

impl VariableBuilder {
    /// Create a new variable builder with the given shape.
    pub fn new(shape: impl Into<Shape>) -> Self {
        Self {
            shape: shape.into(),
            name: None,
        }
    }

    /// Set the name of the variable.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Build the variable expression.
    pub fn build(self) -> Expr {
        Expr::Variable(VariableData {
            id: ExprId::new(),
            shape: self.shape,
            name: self.name,
        })
    }
}

/// Create a variable with the given shape.
///
/// ```
/// use robust_rebalance::expr::variable;
///
/// let c = variable(());
/// let w = variable(5);
/// assert_eq!(w.shape().size(), 5);
/// # let _ = c;
/// ```
pub fn variable(shape: impl Into<Shape>) -> Expr {
    VariableBuilder::new(shape).build()
}

/// Create a named variable with the given shape.
pub fn named_variable(name: impl Into<String>, shape: impl Into<Shape>) -> Expr {
    VariableBuilder::new(shape).name(name).build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_named_variable() {
        let w = named_variable("w", 4);
        match &w {
            Expr::Variable(v) => {
                assert_eq!(v.shape, Shape::vector(4));
                assert_eq!(v.name.as_deref(), Some("w"));
            }
            _ => panic!("Expected Variable"),
        }
    }

    #[test]
    fn test_scalar_variable() {
        assert_eq!(variable(()).shape(), Shape::scalar());
    }
}
