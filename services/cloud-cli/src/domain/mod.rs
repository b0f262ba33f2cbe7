pub mod collection;
pub mod reference;

pub use collection::ResourceCollection;
pub use reference::OperationReference;
