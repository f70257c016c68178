mod memory_queue;
mod redis_queue;

pub use memory_queue::InMemoryJobQueue;
pub use redis_queue::RedisJobQueue;
