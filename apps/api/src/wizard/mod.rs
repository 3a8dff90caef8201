//! The learning-path wizard: details, skill selection, ratings,
//! verification, recommendations.

pub mod handlers;
pub mod models;
pub mod parser;
pub mod session;
pub mod steps;
pub mod validation;
