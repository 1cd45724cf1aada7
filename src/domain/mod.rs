pub mod geo;
pub mod location;
pub mod post;
pub mod user;
