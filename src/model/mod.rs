pub mod attendance;
pub mod employee;
pub mod policy;
pub mod report;
