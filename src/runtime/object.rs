use std::any::Any;
use std::fmt;

/// Host object carried through the value domain as an opaque handle.
///
/// Scripts can only pass handles around and hand them back to the native
/// functions that understand them; natives recover the concrete type with
/// `as_any().downcast_ref()`.
pub trait NativeObject: fmt::Debug {
    fn as_any(&self) -> &dyn Any;

    fn type_name(&self) -> &'static str;
}
