pub mod scan;
pub mod trash;
