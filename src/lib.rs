extern crate num;

pub mod errors;
pub mod aligner;
pub mod execution;
