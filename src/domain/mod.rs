pub mod account;
pub mod customer;
pub mod movement;
pub mod report;

pub use account::*;
pub use customer::*;
pub use movement::*;
pub use report::*;
