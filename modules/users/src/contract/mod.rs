pub mod client;
pub mod error;
pub mod model;

pub use client::UsersApi;
pub use error::{FieldViolation, UsersError, ViolationKind};
pub use model::{NewUser, User, UserPatch};
