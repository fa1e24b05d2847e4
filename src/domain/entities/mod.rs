pub mod cell;
pub mod headers;
pub mod merge;
pub mod sheet;
pub mod table_name;
