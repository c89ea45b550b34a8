pub mod string;

pub use string::{escape, unescape};
