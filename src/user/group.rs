use serde::{Deserialize, Serialize};

use crate::store::GroupRow;

/// Группа пользователей с вычисленной глубиной в nested-set дереве.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub id: u64,
    pub title: String,
    pub lft: i64,
    pub rgt: i64,
    pub parent_id: u64,
    /// Число групп, строго содержащих эту.
    pub level: usize,
}

impl Group {
    /// Вычисляет уровни и сортирует по возрастанию `lft` (при равенстве по
    /// `id`).
    pub fn from_rows(rows: Vec<GroupRow>) -> Vec<Group> {
        let levels: Vec<usize> = rows
            .iter()
            .map(|a| {
                rows.iter()
                    .filter(|b| b.lft < a.lft && a.rgt < b.rgt)
                    .count()
            })
            .collect();

        let mut groups: Vec<Group> = rows
            .into_iter()
            .zip(levels)
            .map(|(row, level)| Group {
                id: row.id,
                title: row.title,
                lft: row.lft,
                rgt: row.rgt,
                parent_id: row.parent_id,
                level,
            })
            .collect();
        groups.sort_by(|a, b| a.lft.cmp(&b.lft).then(a.id.cmp(&b.id)));
        groups
    }

    pub fn is_root(&self) -> bool {
        self.level == 0
    }
}
