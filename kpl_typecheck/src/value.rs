use crate::ty::Type;
use std::fmt::Display;

/// Value of a declared constant. Referencing a constant always hands out
/// a copy of its value, never a view into the declaring object.
#[derive(Debug, Clone, PartialEq)]
pub enum ConstantValue {
    Int(i64),
    Float(f64),
    Char(char),
}

impl ConstantValue {
    pub fn ty(&self) -> Type {
        match self {
            ConstantValue::Int(..) => Type::Int,
            ConstantValue::Float(..) => Type::Float,
            ConstantValue::Char(..) => Type::Char,
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, ConstantValue::Int(..) | ConstantValue::Float(..))
    }

    /// Applies the sign of a signed constant expression. Only numeric
    /// values can carry a sign; the parser never negates a char.
    pub fn negated(self) -> ConstantValue {
        match self {
            ConstantValue::Int(v) => ConstantValue::Int(-v),
            ConstantValue::Float(v) => ConstantValue::Float(-v),
            ConstantValue::Char(c) => ConstantValue::Char(c),
        }
    }
}

impl Display for ConstantValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConstantValue::Int(v) => write!(f, "{v}"),
            ConstantValue::Float(v) => write!(f, "{v}"),
            ConstantValue::Char(c) => write!(f, "'{c}'"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_type() {
        assert_eq!(ConstantValue::Int(1).ty(), Type::Int);
        assert_eq!(ConstantValue::Float(1.5).ty(), Type::Float);
        assert_eq!(ConstantValue::Char('x').ty(), Type::Char);
    }

    #[test]
    fn test_negated() {
        assert_eq!(ConstantValue::Int(42).negated(), ConstantValue::Int(-42));
        assert_eq!(
            ConstantValue::Float(1.5).negated(),
            ConstantValue::Float(-1.5)
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", ConstantValue::Int(7)), "7");
        assert_eq!(format!("{}", ConstantValue::Float(2.5)), "2.5");
        assert_eq!(format!("{}", ConstantValue::Char('q')), "'q'");
    }
}
