/*
[INPUT]:  Wallet session data shared across auth components
[OUTPUT]: Typed Rust structs with serialization support
[POS]:    Data layer - core value types
[UPDATE]: When account or signature data changes shape
*/

pub mod models;

pub use models::*;
