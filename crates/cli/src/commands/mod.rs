pub mod doctor;
pub mod schema;
pub mod serve;
