pub mod health;
pub mod portfolios;
