pub mod scheduler;
pub mod services;
