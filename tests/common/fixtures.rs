//! Seeds a fresh catalog database with the users and categories the tests rely on.

use super::constants::*;
use anyhow::Result;
use course_catalog_server::catalog_store::{FullCatalogStore, NewUser};
use course_catalog_server::UserRole;

fn create_user(
    store: &dyn FullCatalogStore,
    name: &str,
    email: &str,
    password: &str,
    role: UserRole,
) -> Result<usize> {
    store.create_user(
        &NewUser {
            name: name.to_string(),
            email: email.to_string(),
            role,
        },
        password,
    )
}

/// Creates one user per role, a second teacher and two categories.
pub fn seed_test_catalog(store: &dyn FullCatalogStore) -> Result<()> {
    create_user(store, STUDENT_NAME, STUDENT_EMAIL, STUDENT_PASS, UserRole::Student)?;
    create_user(store, TEACHER_NAME, TEACHER_EMAIL, TEACHER_PASS, UserRole::Teacher)?;
    create_user(
        store,
        OTHER_TEACHER_NAME,
        OTHER_TEACHER_EMAIL,
        OTHER_TEACHER_PASS,
        UserRole::Teacher,
    )?;
    create_user(store, ADMIN_NAME, ADMIN_EMAIL, ADMIN_PASS, UserRole::Admin)?;

    store.create_category(PROGRAMMING_CATEGORY)?;
    store.create_category(DESIGN_CATEGORY)?;
    Ok(())
}
