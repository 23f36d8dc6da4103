mod models;
mod schema;
mod slug;
mod store;
mod trait_def;

pub use models::*;
pub use schema::CATALOG_VERSIONED_SCHEMAS;
pub use slug::slugify;
pub use store::SqliteCatalogStore;
pub use trait_def::{
    AuthTokenStore, CategoryStore, CourseStore, EnrollmentStore, FullCatalogStore,
    UserCredentialsStore, UserStore,
};
