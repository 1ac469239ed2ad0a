pub mod geo;
pub mod line_parser;
pub mod profile_builder;
pub mod reader;
