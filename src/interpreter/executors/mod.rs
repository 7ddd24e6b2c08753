//! THE CORE dispatch loop lives in [`instruction`].

pub mod instruction;
