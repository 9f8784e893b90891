pub mod foos;
pub mod health;
