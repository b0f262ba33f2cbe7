pub mod store;

pub use store::MockStore;
pub use store::StoreError;
