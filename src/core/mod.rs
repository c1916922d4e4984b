pub mod auth;
pub mod client;
pub mod engine;
pub mod json;
pub mod markup;
pub mod resources;
pub mod table;
