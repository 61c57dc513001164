use crate::Value;
use std::fmt::Display;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Type {
    Int,
    Float,
    String,
    Bool,
}

impl Type {
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "int" => Some(Type::Int),
            "float" => Some(Type::Float),
            "string" => Some(Type::String),
            "bool" => Some(Type::Bool),
            _ => None,
        }
    }

    /// Single-letter tag used by `push` and `read` in bytecode text.
    pub fn tag(self) -> char {
        match self {
            Type::Int => 'I',
            Type::Float => 'F',
            Type::String => 'S',
            Type::Bool => 'B',
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "I" => Some(Type::Int),
            "F" => Some(Type::Float),
            "S" => Some(Type::String),
            "B" => Some(Type::Bool),
            _ => None,
        }
    }

    pub fn default_value(self) -> Value {
        match self {
            Type::Int => Value::Int(0),
            Type::Float => Value::Float(0.0),
            Type::String => Value::Str(String::new()),
            Type::Bool => Value::Bool(false),
        }
    }

    /// Whether a value of type `actual` may be stored in a variable declared
    /// as `self`. Int widens into Float; nothing narrows.
    pub fn accepts(self, actual: Type) -> bool {
        self == actual || (self == Type::Float && actual == Type::Int)
    }
}

impl Display for Type {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Type::Int => write!(f, "int"),
            Type::Float => write!(f, "float"),
            Type::String => write!(f, "string"),
            Type::Bool => write!(f, "bool"),
        }
    }
}
