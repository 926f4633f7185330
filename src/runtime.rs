//! Runtime object model shared by the interpreter and the native library.
//!
//! Values, environments, callables, classes and instances all live here; the
//! interpreter only decides when they are created and how they are combined.
pub mod callable;
pub mod class;
pub mod environment;
pub mod object;
pub mod value;

pub use callable::{Callable, Function, Lambda, NativeFunction};
pub use class::{Class, Instance};
pub use environment::{EnvRef, Environment};
pub use object::NativeObject;
pub use value::Value;
