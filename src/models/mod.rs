pub mod profile;
pub mod request;
