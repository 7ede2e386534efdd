pub mod origin;

pub use origin::{origin_gate, OriginPolicy};
