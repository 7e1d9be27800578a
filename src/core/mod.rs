pub mod booth;
pub mod controller;
pub mod errors;
pub mod event;
pub mod execution;
pub mod generator;
pub mod plaza;
pub mod routing;
pub mod sink;
pub mod types;
pub mod vehicle;

#[cfg(test)]
mod tests;
