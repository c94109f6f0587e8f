pub mod config;
pub mod error;
pub mod model;
pub mod ops;
pub mod output;
pub mod paths;
pub mod settings;
pub mod templates;
pub mod validate;
