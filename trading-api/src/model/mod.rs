pub mod account;
pub mod contract;
pub mod event;
pub mod market_data;
pub mod order;
pub mod position;
pub mod trade;

#[cfg(test)]
mod tests;
