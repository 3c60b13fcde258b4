pub mod checkout;
pub mod employee;
pub mod feedback;
pub mod order_assignment;
