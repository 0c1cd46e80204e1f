pub mod domain;
pub mod error;
pub mod project;
pub mod protocol;
pub mod text;
