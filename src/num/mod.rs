pub mod number;

pub use number::{parse_float, parse_integer, write_float, write_integer};
