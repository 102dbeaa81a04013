pub mod evaluator;
pub mod probe;
pub mod state;
pub mod table;
pub mod transitions;
