use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use rustc_hash::FxHashMap;
use tracing::trace;

use crate::interpreter::{Interpreter, RuntimeError, RuntimeErrorKind};
use crate::token::Token;

use super::{Callable, Function, Value};

/// A class value. Class methods and fields assigned on the class live in tables
/// of their own; a class is never an `Instance`.
pub struct Class {
    name: String,
    superclass: Option<Rc<Class>>,
    methods: FxHashMap<String, Rc<Function>>,
    class_methods: FxHashMap<String, Rc<Function>>,
    fields: RefCell<FxHashMap<String, Value>>,
}

impl Class {
    pub fn new(
        name: impl Into<String>,
        superclass: Option<Rc<Class>>,
        methods: FxHashMap<String, Rc<Function>>,
        class_methods: FxHashMap<String, Rc<Function>>,
    ) -> Self {
        Self {
            name: name.into(),
            superclass,
            methods,
            class_methods,
            fields: RefCell::new(FxHashMap::default()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Instance method lookup, walking the superclass chain.
    pub fn find_method(&self, name: &str) -> Option<Rc<Function>> {
        if let Some(method) = self.methods.get(name) {
            return Some(Rc::clone(method));
        }
        self.superclass.as_ref()?.find_method(name)
    }

    /// Class method lookup, walking the superclass chain.
    pub fn find_class_method(&self, name: &str) -> Option<Rc<Function>> {
        if let Some(method) = self.class_methods.get(name) {
            return Some(Rc::clone(method));
        }
        self.superclass.as_ref()?.find_class_method(name)
    }

    /// Property read on the class value: class-level fields, then class methods
    /// bound with `this` set to the class.
    pub fn get(self: &Rc<Self>, name: &Token) -> Result<Value, RuntimeError> {
        if name.lexeme == "init" {
            return Err(RuntimeError::new(name, RuntimeErrorKind::InitOnClass));
        }
        if let Some(value) = self.fields.borrow().get(&name.lexeme) {
            return Ok(value.clone());
        }
        match self.find_class_method(&name.lexeme) {
            Some(method) => Ok(Value::Function(Rc::new(
                method.bind(Value::Class(Rc::clone(self))),
            ))),
            None => Err(RuntimeError::new(
                name,
                RuntimeErrorKind::UndefinedProperty {
                    name: name.lexeme.clone(),
                },
            )),
        }
    }

    pub fn set(&self, name: &Token, value: Value) {
        self.fields.borrow_mut().insert(name.lexeme.clone(), value);
    }
}

impl Callable for Rc<Class> {
    fn arity(&self) -> usize {
        self.find_method("init")
            .map_or(0, |initializer| initializer.arity())
    }

    fn call(
        &self,
        interpreter: &mut Interpreter,
        arguments: Vec<Value>,
    ) -> Result<Value, RuntimeError> {
        trace!(class = self.name(), "instantiate");
        let instance = Rc::new(Instance::new(Rc::clone(self)));
        if let Some(initializer) = self.find_method("init") {
            initializer
                .bind(Value::Instance(Rc::clone(&instance)))
                .call(interpreter, arguments)?;
        }
        Ok(Value::Instance(instance))
    }
}

impl fmt::Debug for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Class")
            .field("name", &self.name)
            .field(
                "superclass",
                &self.superclass.as_ref().map(|superclass| superclass.name()),
            )
            .finish()
    }
}

pub struct Instance {
    class: Rc<Class>,
    fields: RefCell<FxHashMap<String, Value>>,
}

impl Instance {
    pub fn new(class: Rc<Class>) -> Self {
        Self {
            class,
            fields: RefCell::new(FxHashMap::default()),
        }
    }

    pub fn class(&self) -> &Rc<Class> {
        &self.class
    }

    /// Fields shadow methods; methods come back bound to this instance.
    pub fn get(self: &Rc<Self>, name: &Token) -> Result<Value, RuntimeError> {
        if let Some(value) = self.fields.borrow().get(&name.lexeme) {
            return Ok(value.clone());
        }
        match self.class.find_method(&name.lexeme) {
            Some(method) => Ok(Value::Function(Rc::new(
                method.bind(Value::Instance(Rc::clone(self))),
            ))),
            None => Err(RuntimeError::new(
                name,
                RuntimeErrorKind::UndefinedProperty {
                    name: name.lexeme.clone(),
                },
            )),
        }
    }

    pub fn set(&self, name: &Token, value: Value) {
        self.fields.borrow_mut().insert(name.lexeme.clone(), value);
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instance")
            .field("class", &self.class.name())
            .finish()
    }
}
