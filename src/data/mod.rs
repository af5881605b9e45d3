pub mod collection;
pub mod crew;
pub mod import;
pub mod player;
pub mod registry;
pub mod validate;
