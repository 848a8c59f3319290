pub mod agent;
pub mod content;
pub mod conversation;
pub mod errors;
pub mod interview;
pub mod models;
pub mod narrator;
pub mod outcome;
pub mod prompt;
pub mod providers;
