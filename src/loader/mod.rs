pub mod csv_input;
pub mod input;
pub mod parser;
