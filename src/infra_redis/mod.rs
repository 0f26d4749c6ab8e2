mod key_value_storage_redis;

pub use key_value_storage_redis::*;
