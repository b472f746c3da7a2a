pub mod customer;
pub mod movements;
pub mod report;

pub use customer::CustomerService;
pub use movements::MovementFetcher;
pub use report::ReportAggregator;
