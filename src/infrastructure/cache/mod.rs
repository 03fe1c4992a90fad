pub mod memory_denylist;
pub mod redis_denylist;
