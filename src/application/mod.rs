// Application layer - Use cases over the upstream APIs
pub mod aggregator;
pub mod counts_service;
pub mod generator_controller;
pub mod live_feed;
pub mod sensor_api;
