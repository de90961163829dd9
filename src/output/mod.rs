pub mod energy;
pub mod table;
