// Core services
pub mod assignment;
pub mod employees;
pub mod feedback;
pub mod orders;
