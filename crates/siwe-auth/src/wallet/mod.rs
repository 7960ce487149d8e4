/*
[INPUT]:  Wallet implementations and runtime bindings
[OUTPUT]: Connector trait, runtime port and concrete connectors
[POS]:    Wallet layer - boundary to the external wallet runtime
[UPDATE]: When adding connector types or runtime operations
*/

pub mod connector;
pub mod local_key;
pub mod mock;
pub mod runtime;

pub use connector::{Capabilities, Connector};
pub use local_key::{ApprovalRequest, Approver, LocalKeyConnector};
pub use mock::{MOCK_ADDRESS, MockCalls, MockConnector, MockOutcome};
pub use runtime::{ConnectionStatus, InMemoryWalletRuntime, WalletRuntime};
