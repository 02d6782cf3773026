pub mod compare;
pub mod introspect;
pub mod service;
pub mod sync;
