pub mod classes;
pub mod members;
