pub mod alpaca;
pub mod error;
