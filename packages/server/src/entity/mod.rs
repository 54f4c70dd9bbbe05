pub mod category;
pub mod keyword;
pub mod lecturer;
pub mod lecturer_keyword;
pub mod post;
