//! Test fixture creation for the user database

use super::constants::*;
use anyhow::Result;
use oversight_notifications::user::{SqliteUserStore, UserManager};
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;

/// Ids of the users created by `create_test_db_with_users`.
pub struct TestUserIds {
    pub test_user_id: String,
    pub other_user_id: String,
}

/// Creates a temporary db directory holding a user database with the
/// regular test user and a second user, both with passwords set.
/// Returns (temp_dir, user_db_path, user ids)
pub fn create_test_db_with_users() -> Result<(TempDir, PathBuf, TestUserIds)> {
    let dir = TempDir::new()?;
    let db_path = dir.path().join("user.db");

    let user_manager = UserManager::new(Arc::new(SqliteUserStore::new(&db_path)?));

    let test_user_id = user_manager.add_user(TEST_USER, TEST_USER_NAME)?;
    user_manager.set_password(TEST_USER, TEST_PASS)?;

    let other_user_id = user_manager.add_user(OTHER_USER, OTHER_USER_NAME)?;
    user_manager.set_password(OTHER_USER, OTHER_PASS)?;

    Ok((
        dir,
        db_path,
        TestUserIds {
            test_user_id,
            other_user_id,
        },
    ))
}
