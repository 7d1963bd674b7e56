mod connection_pool;
mod mappers;
mod rows;
mod sqlite_record_store;

pub use connection_pool::ConnectionPool;
pub use sqlite_record_store::SqliteRecordStore;
