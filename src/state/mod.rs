//! Supporting state that doesn't live on `interpreter::types::InterpreterState`
//! directly: command history. The canonical mutable shell state lives in
//! [`crate::interpreter::types::InterpreterState`]; this module only holds
//! pieces that are naturally standalone (history persists to its own file
//! independent of everything else the interpreter tracks).

pub mod history;

pub use history::History;
