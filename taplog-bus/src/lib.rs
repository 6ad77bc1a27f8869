pub mod bus;
pub mod codec;
pub mod memory;

pub use bus::{BusError, MessageBus, MessageProducer, MessageStream};
pub use memory::MemoryBus;
