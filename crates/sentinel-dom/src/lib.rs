pub mod host;
pub mod page;
pub mod snapshot;

pub use host::RenderHost;
pub use page::InMemoryPage;
pub use snapshot::{NodeSpec, PageSnapshot};
