use super::PermissionChecker;
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

/// Answers every check with a fixed decision and records the roles asked for.
#[derive(Clone)]
pub struct MockPermissionChecker {
    allow: bool,
    checked: Arc<Mutex<Vec<String>>>,
}

impl MockPermissionChecker {
    pub fn new() -> Self {
        Self {
            allow: true,
            checked: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn denying() -> Self {
        Self {
            allow: false,
            ..Self::new()
        }
    }

    pub fn get_check_count(&self) -> usize {
        self.checked.lock().unwrap().len()
    }

    pub fn get_checked_roles(&self) -> Vec<String> {
        self.checked.lock().unwrap().clone()
    }
}

impl Default for MockPermissionChecker {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PermissionChecker for MockPermissionChecker {
    async fn can_access(&self, role: &str) -> bool {
        self.checked.lock().unwrap().push(role.to_string());
        self.allow
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_allows_and_records() {
        let checker = MockPermissionChecker::new();

        assert!(checker.can_access("editor").await);
        assert_eq!(checker.get_check_count(), 1);
        assert_eq!(checker.get_checked_roles(), vec!["editor".to_string()]);
    }

    #[tokio::test]
    async fn test_mock_denying() {
        let checker = MockPermissionChecker::denying();
        let probe = checker.clone();

        assert!(!checker.can_access("admin").await);
        assert_eq!(probe.get_check_count(), 1);
    }
}
