use std::collections::{BTreeSet, HashMap};

use globset::{Glob, GlobMatcher};
use parking_lot::RwLock;
use usergate_error::{AclError, UserResult};

/// Группа гостей по умолчанию (пользователь с id 0).
pub const DEFAULT_GUEST_GROUP: u64 = 1;

/// Порт сервиса контроля доступа.
///
/// Один экземпляр создаётся на контекст и передаётся и в
/// [`UserAccount`](crate::user::UserAccount), и в
/// [`UserDirectoryHelper`](crate::user::UserDirectoryHelper).
pub trait AclService: Send + Sync {
    /// Разрешено ли пользователю `user_id` действие `action` в секции
    /// `section`.
    fn check_user(
        &self,
        user_id: u64,
        section: &str,
        action: &str,
    ) -> UserResult<bool>;

    /// Идентификаторы групп, в которых непосредственно состоит пользователь.
    fn get_groups_by_user(
        &self,
        user_id: u64,
    ) -> UserResult<Vec<u64>>;
}

/// Разрешить или запретить.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Allow,
    Deny,
}

/// Группа ACL с границами nested-set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AclGroup {
    pub id: u64,
    pub lft: i64,
    pub rgt: i64,
}

/// Одно правило: группа, шаблон секции, шаблон действия.
///
/// Строковая форма `section.action`; без точки действие равно `*`.
/// Обе части являются glob-шаблонами.
#[derive(Debug, Clone)]
pub struct AclRule {
    pub group_id: u64,
    pub access: Access,
    raw: String,
    section: GlobMatcher,
    action: GlobMatcher,
}

/// ACL в памяти: группы, членство пользователей и правила.
#[derive(Debug)]
pub struct MemoryAcl {
    groups: RwLock<HashMap<u64, AclGroup>>,
    memberships: RwLock<HashMap<u64, BTreeSet<u64>>>,
    rules: RwLock<Vec<AclRule>>,
    guest_group: u64,
}

////////////////////////////////////////////////////////////////////////////////
// Собственные методы
////////////////////////////////////////////////////////////////////////////////

impl AclGroup {
    /// `true`, если границы группы строго содержат границы `other`.
    pub fn contains(
        &self,
        other: &AclGroup,
    ) -> bool {
        self.lft < other.lft && other.rgt < self.rgt
    }
}

impl AclRule {
    /// Разбирает правило вида `section.action`.
    pub fn parse(
        group_id: u64,
        rule: &str,
        access: Access,
    ) -> Result<Self, AclError> {
        let (section, action) = rule.split_once('.').unwrap_or((rule, "*"));
        let compile = |pattern: &str| {
            Glob::new(pattern)
                .map(|g| g.compile_matcher())
                .map_err(|e| AclError::InvalidRule {
                    rule: rule.to_string(),
                    reason: e.to_string(),
                })
        };

        Ok(Self {
            group_id,
            access,
            raw: rule.to_string(),
            section: compile(section)?,
            action: compile(action)?,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn matches(
        &self,
        section: &str,
        action: &str,
    ) -> bool {
        self.section.is_match(section) && self.action.is_match(action)
    }
}

impl MemoryAcl {
    pub fn new(guest_group: u64) -> Self {
        Self {
            groups: RwLock::new(HashMap::new()),
            memberships: RwLock::new(HashMap::new()),
            rules: RwLock::new(Vec::new()),
            guest_group,
        }
    }

    pub fn guest_group(&self) -> u64 {
        self.guest_group
    }

    /// Регистрирует группу (или обновляет её границы).
    pub fn add_group(
        &self,
        id: u64,
        lft: i64,
        rgt: i64,
    ) -> Result<(), AclError> {
        if lft >= rgt {
            return Err(AclError::InvalidBounds { id, lft, rgt });
        }
        self.groups.write().insert(id, AclGroup { id, lft, rgt });
        Ok(())
    }

    /// Добавляет пользователя в группу.
    pub fn add_user_to_group(
        &self,
        user_id: u64,
        group_id: u64,
    ) -> Result<(), AclError> {
        if !self.groups.read().contains_key(&group_id) {
            return Err(AclError::UnknownGroup { id: group_id });
        }
        self.memberships
            .write()
            .entry(user_id)
            .or_default()
            .insert(group_id);
        Ok(())
    }

    /// Убирает пользователя из группы. Возвращает `true`, если он там был.
    pub fn remove_user_from_group(
        &self,
        user_id: u64,
        group_id: u64,
    ) -> bool {
        let mut memberships = self.memberships.write();
        let Some(groups) = memberships.get_mut(&user_id) else {
            return false;
        };
        let removed = groups.remove(&group_id);
        if groups.is_empty() {
            memberships.remove(&user_id);
        }
        removed
    }

    pub fn allow(
        &self,
        group_id: u64,
        rule: &str,
    ) -> Result<(), AclError> {
        self.add_rule(group_id, rule, Access::Allow)
    }

    pub fn deny(
        &self,
        group_id: u64,
        rule: &str,
    ) -> Result<(), AclError> {
        self.add_rule(group_id, rule, Access::Deny)
    }

    fn add_rule(
        &self,
        group_id: u64,
        rule: &str,
        access: Access,
    ) -> Result<(), AclError> {
        if !self.groups.read().contains_key(&group_id) {
            return Err(AclError::UnknownGroup { id: group_id });
        }
        let parsed = AclRule::parse(group_id, rule, access)?;
        self.rules.write().push(parsed);
        Ok(())
    }

    /// Прямые группы пользователя плюс все их предки по nested-set.
    pub fn effective_groups(
        &self,
        user_id: u64,
    ) -> BTreeSet<u64> {
        let direct: BTreeSet<u64> = if user_id == 0 {
            BTreeSet::from([self.guest_group])
        } else {
            self.memberships
                .read()
                .get(&user_id)
                .cloned()
                .unwrap_or_default()
        };

        let groups = self.groups.read();
        let mut effective = direct.clone();
        for id in &direct {
            let Some(group) = groups.get(id) else {
                continue;
            };
            effective.extend(
                groups
                    .values()
                    .filter(|candidate| candidate.contains(group))
                    .map(|candidate| candidate.id),
            );
        }
        effective
    }

    /// Решение по правилам для набора групп: запрет важнее разрешения.
    fn decide(
        &self,
        groups: &BTreeSet<u64>,
        section: &str,
        action: &str,
    ) -> bool {
        let rules = self.rules.read();
        let mut allowed = false;

        for rule in rules
            .iter()
            .filter(|r| groups.contains(&r.group_id) && r.matches(section, action))
        {
            match rule.access {
                Access::Deny => return false,
                Access::Allow => allowed = true,
            }
        }

        allowed
    }
}

////////////////////////////////////////////////////////////////////////////////
// Общие реализации трейтов
////////////////////////////////////////////////////////////////////////////////

impl Default for MemoryAcl {
    fn default() -> Self {
        Self::new(DEFAULT_GUEST_GROUP)
    }
}

impl AclService for MemoryAcl {
    fn check_user(
        &self,
        user_id: u64,
        section: &str,
        action: &str,
    ) -> UserResult<bool> {
        let groups = self.effective_groups(user_id);
        let granted = self.decide(&groups, section, action);
        tracing::trace!(user_id, section, action, granted, "ACL check");
        Ok(granted)
    }

    fn get_groups_by_user(
        &self,
        user_id: u64,
    ) -> UserResult<Vec<u64>> {
        Ok(self
            .memberships
            .read()
            .get(&user_id)
            .map(|groups| groups.iter().copied().collect())
            .unwrap_or_default())
    }
}

////////////////////////////////////////////////////////////////////////////////
// Тесты
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;

    /// Public(1) [1,10] > Registered(2) [2,7] > Editor(3) [3,4]; Manager(4) [5,6]; Other(5) [8,9]
    fn sample_acl() -> MemoryAcl {
        let acl = MemoryAcl::default();
        acl.add_group(1, 1, 10).unwrap();
        acl.add_group(2, 2, 7).unwrap();
        acl.add_group(3, 3, 4).unwrap();
        acl.add_group(4, 5, 6).unwrap();
        acl.add_group(5, 8, 9).unwrap();
        acl
    }

    #[test]
    fn test_rule_parse_and_match() {
        let rule = AclRule::parse(1, "content.edit", Access::Allow).unwrap();
        assert!(rule.matches("content", "edit"));
        assert!(!rule.matches("content", "delete"));
        assert_eq!(rule.as_str(), "content.edit");

        let section_only = AclRule::parse(1, "content", Access::Allow).unwrap();
        assert!(section_only.matches("content", ""));
        assert!(section_only.matches("content", "anything"));

        let glob = AclRule::parse(1, "*.view", Access::Allow).unwrap();
        assert!(glob.matches("users", "view"));
        assert!(!glob.matches("users", "edit"));
    }

    #[test]
    fn test_invalid_rule() {
        let err = AclRule::parse(1, "content.[", Access::Allow).unwrap_err();
        assert!(matches!(err, AclError::InvalidRule { .. }));
    }

    #[test]
    fn test_invalid_bounds() {
        let acl = MemoryAcl::default();
        assert!(matches!(
            acl.add_group(1, 5, 5),
            Err(AclError::InvalidBounds { .. })
        ));
    }

    #[test]
    fn test_unknown_group() {
        let acl = sample_acl();
        assert!(matches!(
            acl.add_user_to_group(10, 99),
            Err(AclError::UnknownGroup { id: 99 })
        ));
        assert!(acl.allow(99, "content.edit").is_err());
    }

    #[test]
    fn test_inherits_from_ancestors() {
        let acl = sample_acl();
        acl.allow(2, "content.view").unwrap();
        acl.add_user_to_group(10, 3).unwrap();

        assert_eq!(acl.effective_groups(10), BTreeSet::from([1, 2, 3]));
        assert!(acl.check_user(10, "content", "view").unwrap());
        assert!(!acl.check_user(10, "content", "edit").unwrap());
    }

    #[test]
    fn test_deny_wins() {
        let acl = sample_acl();
        acl.allow(2, "content.*").unwrap();
        acl.deny(3, "content.delete").unwrap();
        acl.add_user_to_group(10, 3).unwrap();
        acl.add_user_to_group(11, 4).unwrap();

        assert!(acl.check_user(10, "content", "edit").unwrap());
        assert!(!acl.check_user(10, "content", "delete").unwrap());
        assert!(acl.check_user(11, "content", "delete").unwrap());
    }

    #[test]
    fn test_sibling_branch_not_inherited() {
        let acl = sample_acl();
        acl.allow(5, "admin").unwrap();
        acl.add_user_to_group(10, 3).unwrap();
        assert!(!acl.check_user(10, "admin", "").unwrap());
    }

    #[test]
    fn test_guest_uses_guest_group() {
        let acl = sample_acl();
        acl.allow(1, "site.view").unwrap();
        assert!(acl.check_user(0, "site", "view").unwrap());
        assert!(!acl.check_user(0, "site", "edit").unwrap());
        // пользователь без групп ничего не может
        assert!(!acl.check_user(42, "site", "view").unwrap());
    }

    #[test]
    fn test_groups_by_user() {
        let acl = sample_acl();
        acl.add_user_to_group(10, 4).unwrap();
        acl.add_user_to_group(10, 2).unwrap();
        assert_eq!(acl.get_groups_by_user(10).unwrap(), vec![2, 4]);
        assert!(acl.get_groups_by_user(11).unwrap().is_empty());

        assert!(acl.remove_user_from_group(10, 2));
        assert!(!acl.remove_user_from_group(10, 2));
        assert_eq!(acl.get_groups_by_user(10).unwrap(), vec![4]);
    }
}
