pub mod scenarios;
pub mod sensitivity;
