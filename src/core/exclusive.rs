//! Purpose: Enforce "exactly one of" parameter groups before a request exists.
//! Exports: `ExclusiveGroup`, the declared group constants, `declared_groups`.
//! Role: Runtime half of the constraint model; typed shapes get it structurally.
//! Invariants: At most one group is declared per module; multi-module queries check each.
//! Invariants: A member counts only when it is sent (a `false` flag is absent).
//! Invariants: Zero or several present members is an `InvalidRequest` error.
use super::error::Error;
use super::params::{ParamValue, Params};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ExclusiveGroup {
    /// Module the group belongs to (`move`, `usercontribs`, ...).
    pub name: &'static str,
    pub keys: &'static [&'static str],
}

pub const MOVE_SOURCE: ExclusiveGroup = ExclusiveGroup {
    name: "move",
    keys: &["from", "fromid"],
};

pub const DELETE_TARGET: ExclusiveGroup = ExclusiveGroup {
    name: "delete",
    keys: &["title", "pageid"],
};

pub const EDIT_TARGET: ExclusiveGroup = ExclusiveGroup {
    name: "edit",
    keys: &["title", "pageid"],
};

pub const PROTECT_TARGET: ExclusiveGroup = ExclusiveGroup {
    name: "protect",
    keys: &["title", "pageid"],
};

pub const PURGE_TARGETS: ExclusiveGroup = ExclusiveGroup {
    name: "purge",
    keys: &["pageids", "revids", "titles"],
};

pub const UPLOAD_SOURCE: ExclusiveGroup = ExclusiveGroup {
    name: "upload",
    keys: &["file", "url"],
};

pub const USERCONTRIBS_TARGET: ExclusiveGroup = ExclusiveGroup {
    name: "usercontribs",
    keys: &["ucuser", "ucuserids", "ucuserprefix"],
};

pub const USERS_TARGET: ExclusiveGroup = ExclusiveGroup {
    name: "users",
    keys: &["ususers", "ususerids"],
};

pub const CATEGORYMEMBERS_TARGET: ExclusiveGroup = ExclusiveGroup {
    name: "categorymembers",
    keys: &["cmtitle", "cmpageid"],
};

const ACTION_GROUPS: [ExclusiveGroup; 6] = [
    MOVE_SOURCE,
    DELETE_TARGET,
    EDIT_TARGET,
    PROTECT_TARGET,
    PURGE_TARGETS,
    UPLOAD_SOURCE,
];

const LIST_GROUPS: [ExclusiveGroup; 3] =
    [USERCONTRIBS_TARGET, USERS_TARGET, CATEGORYMEMBERS_TARGET];

pub const ALL_GROUPS: [ExclusiveGroup; 9] = [
    MOVE_SOURCE,
    DELETE_TARGET,
    EDIT_TARGET,
    PROTECT_TARGET,
    PURGE_TARGETS,
    UPLOAD_SOURCE,
    USERCONTRIBS_TARGET,
    USERS_TARGET,
    CATEGORYMEMBERS_TARGET,
];

impl ExclusiveGroup {
    /// The single member present in `params`, or an `InvalidRequest` error.
    pub fn check(&self, params: &Params) -> Result<&'static str, Error> {
        let present: Vec<&'static str> = self
            .keys
            .iter()
            .copied()
            .filter(|key| params.is_sent(key))
            .collect();
        match present.as_slice() {
            [only] => Ok(*only),
            [] => Err(Error::invalid_request(format!(
                "{} requires exactly one of {}",
                self.name,
                self.describe()
            ))
            .with_hint("supply one of the listed parameters")),
            several => Err(Error::invalid_request(format!(
                "{} accepts only one of {}, got {}",
                self.name,
                self.describe(),
                several.join(", ")
            ))
            .with_hint("remove all but one of the listed parameters")),
        }
    }

    fn describe(&self) -> String {
        self.keys.join("/")
    }
}

/// Groups declared for the request `params` describe.
///
/// Action modules are keyed by `action`; query submodules by `list`, which may
/// name several modules at once (`a|b` text or a list value).
pub fn declared_groups(params: &Params) -> Vec<ExclusiveGroup> {
    let Some(action) = params.text("action") else {
        return Vec::new();
    };
    if action != "query" {
        return ACTION_GROUPS
            .into_iter()
            .filter(|group| group.name == action)
            .collect();
    }
    let modules: Vec<&str> = match params.get("list") {
        Some(ParamValue::Text(text)) => text.split('|').collect(),
        Some(ParamValue::List(items)) => items.iter().map(String::as_str).collect(),
        _ => Vec::new(),
    };
    LIST_GROUPS
        .into_iter()
        .filter(|group| modules.contains(&group.name))
        .collect()
}

/// Runs every declared group check for `params`.
pub fn validate(params: &Params) -> Result<(), Error> {
    for group in declared_groups(params) {
        group.check(params)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{
        ALL_GROUPS, DELETE_TARGET, ExclusiveGroup, USERCONTRIBS_TARGET, USERS_TARGET,
        declared_groups, validate,
    };
    use crate::core::error::ErrorKind;
    use crate::core::params::{ParamValue, Params};

    fn base_params(group: &ExclusiveGroup) -> Params {
        if ["usercontribs", "users", "categorymembers"].contains(&group.name) {
            Params::new().with("action", "query").with("list", group.name)
        } else {
            Params::new().with("action", group.name)
        }
    }

    #[test]
    fn every_group_is_declared_for_its_module() {
        for group in ALL_GROUPS {
            assert_eq!(declared_groups(&base_params(&group)), vec![group]);
        }
    }

    #[test]
    fn zero_members_are_rejected() {
        for group in ALL_GROUPS {
            let err = validate(&base_params(&group)).expect_err("empty group");
            assert_eq!(err.kind(), ErrorKind::InvalidRequest, "{}", group.name);
        }
    }

    #[test]
    fn all_members_are_rejected() {
        for group in ALL_GROUPS {
            let mut params = base_params(&group);
            for key in group.keys {
                params.insert(*key, "x");
            }
            let err = validate(&params).expect_err("full group");
            assert_eq!(err.kind(), ErrorKind::InvalidRequest, "{}", group.name);
        }
    }

    #[test]
    fn any_two_members_are_rejected() {
        for group in ALL_GROUPS {
            for (i, first) in group.keys.iter().enumerate() {
                for second in &group.keys[i + 1..] {
                    let params = base_params(&group).with(*first, "x").with(*second, "y");
                    assert!(validate(&params).is_err(), "{} {first}+{second}", group.name);
                }
            }
        }
    }

    #[test]
    fn exactly_one_member_is_accepted() {
        for group in ALL_GROUPS {
            for key in group.keys {
                let params = base_params(&group).with(*key, "x");
                assert_eq!(group.check(&params).expect("one member"), *key);
                validate(&params).expect("valid");
            }
        }
    }

    #[test]
    fn undeclared_modules_pass_through() {
        let params = Params::new()
            .with("action", "query")
            .with("list", "allpages")
            .with("title", "a")
            .with("pageid", 1u64);
        assert!(declared_groups(&params).is_empty());
        validate(&params).expect("no group");
    }

    #[test]
    fn error_message_names_the_group() {
        let params = Params::new()
            .with("action", "delete")
            .with("title", "A")
            .with("pageid", 3u64);
        let err = DELETE_TARGET.check(&params).expect_err("two members");
        assert_eq!(
            err.message(),
            Some("delete accepts only one of title/pageid, got title, pageid")
        );
    }

    #[test]
    fn multi_module_list_checks_every_group() {
        let params = Params::new()
            .with("action", "query")
            .with("list", "usercontribs|users")
            .with("ucuser", "A")
            .with("ucuserids", 1u64)
            .with("ucuserprefix", "B");
        assert_eq!(
            declared_groups(&params),
            vec![USERCONTRIBS_TARGET, USERS_TARGET]
        );
        let err = validate(&params).expect_err("several usercontribs members");
        assert_eq!(err.kind(), ErrorKind::InvalidRequest);

        let users_missing = Params::new()
            .with("action", "query")
            .with("list", "usercontribs|users")
            .with("ucuser", "A");
        assert!(validate(&users_missing).is_err());
    }

    #[test]
    fn list_value_for_list_is_checked() {
        let params = Params::new()
            .with("action", "query")
            .with("list", ParamValue::List(vec!["usercontribs".to_string()]));
        assert_eq!(declared_groups(&params), vec![USERCONTRIBS_TARGET]);
        let err = validate(&params).expect_err("no members");
        assert_eq!(err.kind(), ErrorKind::InvalidRequest);
    }

    #[test]
    fn false_flag_member_counts_as_absent() {
        let params = Params::new().with("action", "delete").with("title", false);
        let err = validate(&params).expect_err("flag false is never sent");
        assert_eq!(err.kind(), ErrorKind::InvalidRequest);

        let with_id = params.with("pageid", 7u64);
        assert_eq!(DELETE_TARGET.check(&with_id).expect("one member"), "pageid");
    }
}
