//! Resolution of `excludeOptions` references
//!
//! A reference is matched against the groups visible to an item in this
//! order: a group id, then a `groupId.optionId` pair, then a bare option id.
//! The first rule that matches wins.

use crate::profile::OptionGroup;

/// Ids of one option group and its options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupIndex {
    /// Group id
    pub id: String,
    /// Option ids in the group
    pub option_ids: Vec<String>,
}

impl GroupIndex {
    fn contains(&self, option_id: &str) -> bool {
        self.option_ids.iter().any(|id| id == option_id)
    }
}

impl From<&OptionGroup> for GroupIndex {
    fn from(group: &OptionGroup) -> Self {
        Self {
            id: group.id.clone(),
            option_ids: group.items.iter().map(|o| o.id.clone()).collect(),
        }
    }
}

/// What an `excludeOptions` entry refers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExclusionTarget {
    /// A whole option group
    Group(String),
    /// One option inside one group
    Option {
        /// Group id
        group_id: String,
        /// Option id
        option_id: String,
    },
    /// An option id, in whichever groups contain it
    BareOption(String),
}

impl ExclusionTarget {
    /// Whether this exclusion hides the whole group `group_id`.
    pub fn hides_group(&self, group_id: &str) -> bool {
        matches!(self, ExclusionTarget::Group(id) if id == group_id)
    }

    /// Whether this exclusion hides option `option_id` in group `group_id`.
    pub fn hides_option(&self, group_id: &str, option_id: &str) -> bool {
        match self {
            ExclusionTarget::Group(id) => id == group_id,
            ExclusionTarget::Option {
                group_id: g,
                option_id: o,
            } => g == group_id && o == option_id,
            ExclusionTarget::BareOption(o) => o == option_id,
        }
    }
}

/// Resolve `reference` against `groups`.
///
/// Returns `None` when the reference names nothing visible to the item.
pub fn resolve_exclusion(reference: &str, groups: &[GroupIndex]) -> Option<ExclusionTarget> {
    if groups.iter().any(|g| g.id == reference) {
        return Some(ExclusionTarget::Group(reference.to_string()));
    }

    for (split, _) in reference.match_indices('.') {
        let (group_id, rest) = reference.split_at(split);
        let option_id = rest.strip_prefix('.').unwrap_or(rest);
        if groups
            .iter()
            .any(|g| g.id == group_id && g.contains(option_id))
        {
            return Some(ExclusionTarget::Option {
                group_id: group_id.to_string(),
                option_id: option_id.to_string(),
            });
        }
    }

    if groups.iter().any(|g| g.contains(reference)) {
        return Some(ExclusionTarget::BareOption(reference.to_string()));
    }
    None
}
