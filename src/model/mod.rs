pub mod descriptor;
pub mod job;
pub mod result;
pub mod table;
