/*!
 * # Permissions Module
 *
 * Permission strings are `resource:action`. A grant of `resource:*` covers
 * every action on that resource and a bare `*` covers everything.
 */

/// Permission actions
pub struct Actions;

impl Actions {
    pub const READ: &'static str = "read";
    pub const ADJUST: &'static str = "adjust";
    pub const TRANSFER: &'static str = "transfer";
    pub const ALL: &'static str = "*";
}

/// Resource types
pub struct Resources;

impl Resources {
    pub const INVENTORY: &'static str = "inventory";
}

/// Common permission string constants for compile-time safety
pub mod consts {
    pub const INVENTORY_READ: &str = "inventory:read";
    pub const INVENTORY_ADJUST: &str = "inventory:adjust";
    pub const INVENTORY_TRANSFER: &str = "inventory:transfer";
}

/// Formats a permission string from a resource and action.
pub fn format_permission(resource: &str, action: &str) -> String {
    format!("{}:{}", resource, action)
}

/// Whether `granted` satisfies `required`, honouring `*` wildcards.
pub fn permission_matches(granted: &str, required: &str) -> bool {
    if granted == required || granted == Actions::ALL {
        return true;
    }
    match (granted.split_once(':'), required.split_once(':')) {
        (Some((g_res, g_act)), Some((r_res, _))) => g_act == Actions::ALL && g_res == r_res,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn consts_follow_resource_action_format() {
        assert_eq!(
            consts::INVENTORY_READ,
            format_permission(Resources::INVENTORY, Actions::READ)
        );
        assert_eq!(
            consts::INVENTORY_ADJUST,
            format_permission(Resources::INVENTORY, Actions::ADJUST)
        );
        assert_eq!(
            consts::INVENTORY_TRANSFER,
            format_permission(Resources::INVENTORY, Actions::TRANSFER)
        );
    }

    #[rstest]
    #[case("inventory:read", "inventory:read", true)]
    #[case("inventory:*", "inventory:transfer", true)]
    #[case("*", "inventory:adjust", true)]
    #[case("inventory:read", "inventory:adjust", false)]
    #[case("orders:*", "inventory:read", false)]
    #[case("inventory", "inventory:read", false)]
    fn wildcard_matching(#[case] granted: &str, #[case] required: &str, #[case] expected: bool) {
        assert_eq!(permission_matches(granted, required), expected);
    }
}
