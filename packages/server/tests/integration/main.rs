mod keyword;
mod lecturer;
mod upload;
