pub mod user;

pub use user::delete as user_delete;
pub use user::update as user_update;
pub use user::whoami;
