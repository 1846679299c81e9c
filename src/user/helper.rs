use std::sync::Arc;

use usergate_error::UserResult;

use super::Group;
use crate::{
    auth::{self, AclService, HashAlgorithm, HashOptions, PasswordPolicy},
    store::GroupStore,
};

/// Справочник пользователей: группы, членство и работа с паролями.
pub struct UserDirectoryHelper {
    groups: Arc<dyn GroupStore>,
    acl: Arc<dyn AclService>,
    policy: PasswordPolicy,
}

impl UserDirectoryHelper {
    pub fn new(
        groups: Arc<dyn GroupStore>,
        acl: Arc<dyn AclService>,
    ) -> Self {
        Self {
            groups,
            acl,
            policy: PasswordPolicy::default(),
        }
    }

    /// Заменяет политику паролей (алгоритм и параметры по умолчанию).
    pub fn with_policy(
        mut self,
        policy: PasswordPolicy,
    ) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> &PasswordPolicy {
        &self.policy
    }

    /// Все группы с их глубиной, по возрастанию `lft`.
    pub fn get_user_groups(&self) -> UserResult<Vec<Group>> {
        let rows = self.groups.load_groups()?;
        Ok(Group::from_rows(rows))
    }

    /// Id групп, в которых состоит пользователь.
    pub fn get_groups_by_user(
        &self,
        user_id: u64,
    ) -> UserResult<Vec<u64>> {
        self.acl.get_groups_by_user(user_id)
    }

    pub fn gen_random_password(
        &self,
        length: usize,
    ) -> String {
        auth::gen_random_password(length)
    }

    /// Хеширует пароль. Без `options` берутся параметры политики.
    pub fn crypt_password(
        &self,
        password: &str,
        algorithm: HashAlgorithm,
        options: Option<&HashOptions>,
    ) -> UserResult<String> {
        auth::crypt_password(
            password,
            algorithm,
            options.unwrap_or(&self.policy.options),
        )
    }

    /// Хеширует пароль алгоритмом политики.
    pub fn crypt_password_default(
        &self,
        password: &str,
    ) -> UserResult<String> {
        self.policy.crypt(password)
    }

    pub fn verify_password(
        &self,
        password: &str,
        hash: &str,
    ) -> bool {
        auth::verify_password(password, hash)
    }

    /// `true`, если хеш стоит пересчитать под текущую политику.
    pub fn needs_rehash(
        &self,
        hash: &str,
    ) -> bool {
        self.policy.needs_rehash(hash)
    }
}

impl std::fmt::Debug for UserDirectoryHelper {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("UserDirectoryHelper")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        auth::MemoryAcl,
        store::{GroupRow, MemoryGroupStore},
    };

    fn helper() -> UserDirectoryHelper {
        let groups = MemoryGroupStore::new(vec![
            GroupRow::new(2, "Registered", 2, 3, 1),
            GroupRow::new(1, "Public", 1, 4, 0),
        ]);
        let acl = MemoryAcl::default();
        acl.add_group(1, 1, 4).unwrap();
        acl.add_group(2, 2, 3).unwrap();
        acl.add_user_to_group(7, 2).unwrap();

        let policy = PasswordPolicy {
            options: HashOptions::bcrypt(4),
            ..PasswordPolicy::default()
        };
        UserDirectoryHelper::new(Arc::new(groups), Arc::new(acl)).with_policy(policy)
    }

    #[test]
    fn test_groups() {
        let helper = helper();
        let groups = helper.get_user_groups().unwrap();
        assert_eq!(groups.iter().map(|g| g.id).collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(groups[1].level, 1);
        assert_eq!(helper.get_groups_by_user(7).unwrap(), vec![2]);
    }

    #[test]
    fn test_default_crypt_uses_policy() {
        let helper = helper();
        let hash = helper.crypt_password_default("secret").unwrap();
        assert!(hash.starts_with("$2y$04$"));
        assert!(helper.verify_password("secret", &hash));
        assert!(!helper.needs_rehash(&hash));

        let explicit = helper
            .crypt_password("secret", HashAlgorithm::Bcrypt, Some(&HashOptions::bcrypt(5)))
            .unwrap();
        assert!(explicit.starts_with("$2y$05$"));
        assert!(helper.needs_rehash(&explicit));
    }

    #[test]
    fn test_random_password_length() {
        assert_eq!(helper().gen_random_password(12).len(), 12);
    }
}
