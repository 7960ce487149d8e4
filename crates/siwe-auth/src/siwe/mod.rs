/*
[INPUT]:  Nonce, account and application origin
[OUTPUT]: EIP-4361 messages and nonce validation
[POS]:    SIWE layer - sign-in message format
[UPDATE]: When the message format or nonce rules change
*/

pub mod message;
pub mod nonce;

pub use message::{DEFAULT_STATEMENT, SIWE_VERSION, SiweMessage, Timestamp, build};
pub use nonce::NoncePolicy;
