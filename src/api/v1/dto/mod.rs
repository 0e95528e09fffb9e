pub mod hello;
pub mod token;
