//! The managed `users` entity
//!
//! - `schema`: the `users` table descriptor and its seed providers
//! - `repository`: row-level access (insert, lookup, custom values)

mod repository;
mod schema;

pub use repository::{NewUser, UserRecord, UserRepository};
pub use schema::{
    new_user_id, NoSeed, PlaceholderAdmin, SeedUser, UserSchema, UserSeed, USERS_TABLE,
    USER_BASE_COLUMNS,
};
