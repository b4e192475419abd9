//! Command handlers

pub mod detect;
pub mod lang;
pub mod resolve;
pub mod serve;
