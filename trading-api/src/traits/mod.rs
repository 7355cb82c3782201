pub mod event_sink;
pub mod gateway;
pub mod stores;
