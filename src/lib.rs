pub mod frames;
pub mod emit;
pub mod convert;
