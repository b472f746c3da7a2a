pub mod accounts;
pub mod context;
pub mod customers;
pub mod movements;
pub mod remote;

pub use accounts::HttpAccountLookup;
pub use context::CallContext;
pub use customers::HttpCustomerLookup;
pub use movements::HttpMovementLookup;
pub use remote::RemoteClient;
