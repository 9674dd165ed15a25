pub mod attendance;
pub mod employee;
pub mod face;
pub mod payroll;
pub mod shift;
