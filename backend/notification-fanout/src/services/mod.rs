pub mod batching;
pub mod fanout;
pub mod push;
pub mod store;

pub use batching::*;
pub use fanout::*;
pub use push::*;
pub use store::*;
