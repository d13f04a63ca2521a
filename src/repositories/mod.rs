pub(crate) mod chapters;
pub(crate) mod courses;
pub(crate) mod lessons;
mod store;

pub(crate) use store::{ContentStore, PgContentStore, StoreError};
