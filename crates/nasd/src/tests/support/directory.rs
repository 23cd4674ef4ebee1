//! Mock credential directory.

use mockall::mock;

use crate::backend::{BackendError, Directory};

mock! {
    pub Accounts {}
    impl Directory for Accounts {
        fn check_credentials(&self, username: &str, password: &str) -> Result<bool, BackendError>;
        fn allocated_quota(&self, username: &str) -> Result<u64, BackendError>;
        fn register_user(
            &self,
            username: &str,
            password: &str,
            quota: u64,
        ) -> Result<bool, BackendError>;
    }
}

/// Directory accepting `alice`/`secret` and granting every user `quota`
/// bytes.
pub fn accounts(quota: u64) -> MockAccounts {
    let mut directory = MockAccounts::new();
    directory
        .expect_check_credentials()
        .returning(|username, password| Ok(username == "alice" && password == "secret"));
    directory
        .expect_allocated_quota()
        .returning(move |_username| Ok(quota));
    directory
}
