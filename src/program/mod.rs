//! Program representation
//!
//! - [`instruction`]: caller-facing [`Instruction`] and [`MacroDef`] types
//! - [`symbols`]: the per-machine name [`Interner`]
//! - [`labels`]: label resolution into executable [`Block`]s
//! - [`library`]: the classic arithmetic macros (goto, zeros, equals, add,
//!   subtract, mul, fact)

pub mod instruction;
pub mod labels;
pub mod library;
pub mod symbols;

pub use instruction::{Instruction, MacroDef};
pub use labels::{resolve_labels, Block, Op};
pub use symbols::{Interner, Symbol};
