pub mod config;
pub mod dataset;
pub mod errors;
pub mod features;
pub mod inference;
pub mod learners;
pub mod models;
pub mod registry;
pub mod training;
