use std::fmt;
use std::rc::Rc;

use crate::token::Literal;

use super::{Callable, Class, Function, Instance, Lambda, NativeFunction, NativeObject};

#[derive(Debug, Clone)]
pub enum Value {
    Nil,
    Bool(bool),
    Number(f64),
    String(Rc<str>),
    Function(Rc<Function>),
    Lambda(Rc<Lambda>),
    Class(Rc<Class>),
    Native(Rc<NativeFunction>),
    Instance(Rc<Instance>),
    Handle(Rc<dyn NativeObject>),
}

impl Value {
    pub fn string(value: impl Into<Rc<str>>) -> Self {
        Value::String(value.into())
    }

    /// Only `nil` and `false` are falsy.
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Value::Nil | Value::Bool(false))
    }

    pub fn as_callable(&self) -> Option<&dyn Callable> {
        match self {
            Value::Function(function) => Some(function.as_ref()),
            Value::Lambda(lambda) => Some(lambda.as_ref()),
            Value::Class(class) => Some(class),
            Value::Native(native) => Some(native.as_ref()),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(value) => Some(value),
            _ => None,
        }
    }
}

impl From<Literal> for Value {
    fn from(literal: Literal) -> Self {
        match literal {
            Literal::Nil => Value::Nil,
            Literal::Bool(value) => Value::Bool(value),
            Literal::Number(value) => Value::Number(value),
            Literal::String(value) => Value::String(value),
        }
    }
}

impl PartialEq for Value {
    /// Numbers and strings compare by value; every object compares by identity.
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Nil, Value::Nil) => true,
            (Value::Bool(left), Value::Bool(right)) => left == right,
            (Value::Number(left), Value::Number(right)) => left == right,
            (Value::String(left), Value::String(right)) => left == right,
            (Value::Function(left), Value::Function(right)) => Rc::ptr_eq(left, right),
            (Value::Lambda(left), Value::Lambda(right)) => Rc::ptr_eq(left, right),
            (Value::Class(left), Value::Class(right)) => Rc::ptr_eq(left, right),
            (Value::Native(left), Value::Native(right)) => Rc::ptr_eq(left, right),
            (Value::Instance(left), Value::Instance(right)) => Rc::ptr_eq(left, right),
            (Value::Handle(left), Value::Handle(right)) => Rc::ptr_eq(left, right),
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => write!(f, "nil"),
            Value::Bool(value) => write!(f, "{value}"),
            Value::Number(value) => write!(f, "{value}"),
            Value::String(value) => write!(f, "{value}"),
            Value::Function(function) => write!(f, "<fn {}>", function.name()),
            Value::Lambda(_) => write!(f, "<fn>"),
            Value::Class(class) => write!(f, "{}", class.name()),
            Value::Native(native) => write!(f, "<native fn '{}'>", native.name()),
            Value::Instance(instance) => write!(f, "{} instance", instance.class().name()),
            Value::Handle(handle) => write!(f, "<{}>", handle.type_name()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_nil_and_false_are_falsy() {
        assert!(!Value::Nil.is_truthy());
        assert!(!Value::Bool(false).is_truthy());
        assert!(Value::Bool(true).is_truthy());
        assert!(Value::Number(0.0).is_truthy());
        assert!(Value::string("").is_truthy());
    }

    #[test]
    fn compares_across_types_as_unequal() {
        assert_eq!(Value::Nil, Value::Nil);
        assert_ne!(Value::Nil, Value::Bool(false));
        assert_ne!(Value::Number(1.0), Value::string("1"));
        assert_eq!(Value::string("ab"), Value::string("ab"));
        assert_ne!(Value::Number(f64::NAN), Value::Number(f64::NAN));
    }

    #[test]
    fn formats_numbers_without_trailing_zero() {
        assert_eq!(Value::Number(7.0).to_string(), "7");
        assert_eq!(Value::Number(-0.5).to_string(), "-0.5");
        assert_eq!(Value::Bool(true).to_string(), "true");
        assert_eq!(Value::Nil.to_string(), "nil");
    }
}
