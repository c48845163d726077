//! Aimi Point Persistence - Local session store, encryption and catalog cache

pub mod cache;
pub mod encryption;
pub mod sqlite;

pub use encryption::derive_machine_key;
pub use encryption::SessionEncryptor;
pub use sqlite::Database;
