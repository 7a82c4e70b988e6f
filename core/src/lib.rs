pub use error::Error;
pub use instruction::Instruction;
pub use machine::Machine;

pub mod constants;
mod error;
mod instruction;
mod machine;
mod operations;
pub mod state;
