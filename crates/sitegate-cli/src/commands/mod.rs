pub mod config;
pub mod rules;
pub mod run;
pub mod settings;
