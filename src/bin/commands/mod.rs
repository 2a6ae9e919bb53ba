pub mod schema;
pub mod status;
pub mod users;
