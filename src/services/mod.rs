pub mod aggregator;
pub mod daily_store;
pub mod fuel_service;
pub mod scheduler;
