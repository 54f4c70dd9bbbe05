pub mod category;
pub mod keyword;
pub mod lecturer;
pub mod post;
pub mod upload;
