use crate::{Fault, FaultResult, Type};
use std::cmp::Ordering;
use std::fmt::{self, Display, Formatter};

/// A scalar runtime value. The same operator semantics back static
/// evaluation in the checker and compiler and execution in the VM.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i64),
    Float(f64),
    Str(String),
    Bool(bool),
}

impl Value {
    pub fn ty(&self) -> Type {
        match self {
            Value::Int(_) => Type::Int,
            Value::Float(_) => Type::Float,
            Value::Str(_) => Type::String,
            Value::Bool(_) => Type::Bool,
        }
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Int(v) => *v != 0,
            Value::Float(v) => *v != 0.0,
            Value::Str(v) => !v.is_empty(),
            Value::Bool(v) => *v,
        }
    }

    /// Bools count as 0 and 1 in arithmetic and comparisons.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            Value::Bool(v) => Some(*v as i64),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(v) => Some(*v),
            _ => self.as_i64().map(|v| v as f64),
        }
    }

    /// Operand text as it appears after the type tag of a `push`.
    pub fn literal(&self) -> String {
        match self {
            Value::Int(v) => v.to_string(),
            Value::Float(v) => format!("{:?}", v),
            Value::Str(v) => format!("\"{}\"", v),
            Value::Bool(v) => v.to_string(),
        }
    }

    /// `itof`. Floats pass through unchanged.
    pub fn widen(self) -> FaultResult<Value> {
        match self {
            Value::Int(v) => Ok(Value::Float(v as f64)),
            Value::Float(v) => Ok(Value::Float(v)),
            Value::Bool(v) => Ok(Value::Float(v as i64 as f64)),
            other => Err(Fault::InvalidOperand {
                operation: "itof",
                operand: other.ty(),
            }),
        }
    }

    /// Converts the value for storage in a variable of type `target`.
    /// Only Int into Float changes anything.
    pub fn coerce_to(self, target: Type) -> Value {
        match (self, target) {
            (Value::Int(v), Type::Float) => Value::Float(v as f64),
            (value, _) => value,
        }
    }

    pub fn negate(self) -> FaultResult<Value> {
        match self {
            Value::Int(v) => v
                .checked_neg()
                .map(Value::Int)
                .ok_or(Fault::IntegerOverflow("uminus")),
            Value::Float(v) => Ok(Value::Float(-v)),
            Value::Bool(v) => Ok(Value::Int(-(v as i64))),
            other => Err(Fault::InvalidOperand {
                operation: "uminus",
                operand: other.ty(),
            }),
        }
    }

    pub fn not(&self) -> Value {
        Value::Bool(!self.is_truthy())
    }

    pub fn add(&self, other: &Value) -> FaultResult<Value> {
        self.numeric(other, "add", i64::checked_add, |l, r| Ok(l + r))
    }

    pub fn sub(&self, other: &Value) -> FaultResult<Value> {
        self.numeric(other, "sub", i64::checked_sub, |l, r| Ok(l - r))
    }

    pub fn mul(&self, other: &Value) -> FaultResult<Value> {
        self.numeric(other, "mul", i64::checked_mul, |l, r| Ok(l * r))
    }

    /// Floor division for two ints, real division otherwise.
    pub fn div(&self, other: &Value) -> FaultResult<Value> {
        self.numeric(other, "div", floor_div, |l, r| {
            if r == 0.0 {
                return Err(Fault::DivisionByZero);
            }
            Ok(l / r)
        })
    }

    /// Floored modulo: the result takes the sign of the divisor.
    pub fn rem(&self, other: &Value) -> FaultResult<Value> {
        self.numeric(other, "mod", floor_mod, |l, r| {
            if r == 0.0 {
                return Err(Fault::DivisionByZero);
            }
            let remainder = l % r;
            if remainder != 0.0 && (remainder < 0.0) != (r < 0.0) {
                Ok(remainder + r)
            } else {
                Ok(remainder)
            }
        })
    }

    pub fn concat(&self, other: &Value) -> FaultResult<Value> {
        match (self, other) {
            (Value::Str(left), Value::Str(right)) => {
                Ok(Value::Str(format!("{}{}", left, right)))
            }
            _ => Err(self.invalid_with(other, "concat")),
        }
    }

    pub fn less_than(&self, other: &Value) -> FaultResult<Value> {
        let ordering = self.ordering(other, "lt")?;
        Ok(Value::Bool(ordering == Some(Ordering::Less)))
    }

    pub fn greater_than(&self, other: &Value) -> FaultResult<Value> {
        let ordering = self.ordering(other, "gt")?;
        Ok(Value::Bool(ordering == Some(Ordering::Greater)))
    }

    /// Numbers and bools compare by value across types; strings only equal
    /// strings.
    pub fn equals(&self, other: &Value) -> bool {
        if self.ty() == other.ty() {
            return self == other;
        }
        match (self.as_i64(), other.as_i64()) {
            (Some(left), Some(right)) => left == right,
            _ => match (self.as_f64(), other.as_f64()) {
                (Some(left), Some(right)) => left == right,
                _ => false,
            },
        }
    }

    pub fn and(self, other: Value) -> Value {
        if self.is_truthy() {
            other
        } else {
            self
        }
    }

    pub fn or(self, other: Value) -> Value {
        if self.is_truthy() {
            self
        } else {
            other
        }
    }

    fn numeric(
        &self,
        other: &Value,
        operation: &'static str,
        int_op: fn(i64, i64) -> Option<i64>,
        float_op: fn(f64, f64) -> FaultResult<f64>,
    ) -> FaultResult<Value> {
        match (self.as_i64(), other.as_i64()) {
            (Some(left), Some(right)) => {
                if right == 0 && matches!(operation, "div" | "mod") {
                    return Err(Fault::DivisionByZero);
                }
                int_op(left, right)
                    .map(Value::Int)
                    .ok_or(Fault::IntegerOverflow(operation))
            }
            _ => match (self.as_f64(), other.as_f64()) {
                (Some(left), Some(right)) => float_op(left, right).map(Value::Float),
                _ => Err(self.invalid_with(other, operation)),
            },
        }
    }

    fn ordering(
        &self,
        other: &Value,
        operation: &'static str,
    ) -> FaultResult<Option<Ordering>> {
        match (self, other) {
            (Value::Int(left), Value::Int(right)) => Ok(Some(left.cmp(right))),
            (Value::Str(left), Value::Str(right)) => Ok(Some(left.cmp(right))),
            (Value::Bool(left), Value::Bool(right)) => Ok(Some(left.cmp(right))),
            _ => match (self.as_f64(), other.as_f64()) {
                (Some(left), Some(right)) => Ok(left.partial_cmp(&right)),
                _ => Err(self.invalid_with(other, operation)),
            },
        }
    }

    fn invalid_with(&self, other: &Value, operation: &'static str) -> Fault {
        Fault::InvalidOperands {
            operation,
            left: self.ty(),
            right: other.ty(),
        }
    }
}

fn floor_div(left: i64, right: i64) -> Option<i64> {
    let quotient = left.checked_div(right)?;
    if left % right != 0 && (left < 0) != (right < 0) {
        quotient.checked_sub(1)
    } else {
        Some(quotient)
    }
}

fn floor_mod(left: i64, right: i64) -> Option<i64> {
    let remainder = left.checked_rem(right)?;
    if remainder != 0 && (remainder < 0) != (right < 0) {
        Some(remainder + right)
    } else {
        Some(remainder)
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Value::Int(v) => write!(f, "{}", v),
            Value::Float(v) => write!(f, "{:?}", v),
            Value::Str(v) => write!(f, "{}", v),
            Value::Bool(v) => write!(f, "{}", v),
        }
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Str(value.to_string())
    }
}
