use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::order::Principal;

// ============================================================================
// Permissions
// ============================================================================
//
// Permission values are "<app_label>.<codename>" strings. Grants may be
// restricted to a set of channels; an unrestricted grant covers all of them.
//
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderPermissions {
    #[serde(rename = "order.manage_orders")]
    ManageOrders,
    #[serde(rename = "checkout.manage_checkouts")]
    ManageCheckouts,
}

impl OrderPermissions {
    pub fn value(&self) -> &'static str {
        match self {
            OrderPermissions::ManageOrders => "order.manage_orders",
            OrderPermissions::ManageCheckouts => "checkout.manage_checkouts",
        }
    }

    pub fn app_label(&self) -> &'static str {
        self.value().split_once('.').map(|(label, _)| label).unwrap_or_default()
    }

    pub fn codename(&self) -> &'static str {
        self.value().split_once('.').map(|(_, codename)| codename).unwrap_or_default()
    }

    /// Enum-style name, e.g. `MANAGE_ORDERS`
    pub fn name(&self) -> &'static str {
        match self {
            OrderPermissions::ManageOrders => "MANAGE_ORDERS",
            OrderPermissions::ManageCheckouts => "MANAGE_CHECKOUTS",
        }
    }
}

impl fmt::Display for OrderPermissions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.value())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown permission: {0}")]
pub struct UnknownPermission(pub String);

impl FromStr for OrderPermissions {
    type Err = UnknownPermission;

    /// Accepts the full value, the enum-style name, or the bare codename
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [OrderPermissions::ManageOrders, OrderPermissions::ManageCheckouts]
            .into_iter()
            .find(|p| s == p.value() || s == p.name() || s == p.codename())
            .ok_or_else(|| UnknownPermission(s.to_string()))
    }
}

// ============================================================================
// Channel-scoped permission checks
// ============================================================================

/// Answers whether a principal holds a permission for a given channel
pub trait PermissionChecker: Send + Sync {
    fn has_channel_permission(
        &self,
        principal: &Principal,
        permission: OrderPermissions,
        channel_id: Uuid,
    ) -> bool;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChannelScope {
    All,
    Only(Vec<Uuid>),
}

impl ChannelScope {
    pub fn covers(&self, channel_id: Uuid) -> bool {
        match self {
            ChannelScope::All => true,
            ChannelScope::Only(channels) => channels.contains(&channel_id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionGrant {
    pub permission: OrderPermissions,
    pub scope: ChannelScope,
}

/// Static table of grants per principal
#[derive(Debug, Clone, Default)]
pub struct ChannelPermissionTable {
    grants: HashMap<Principal, Vec<PermissionGrant>>,
}

impl ChannelPermissionTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn grant(mut self, principal: Principal, permission: OrderPermissions, scope: ChannelScope) -> Self {
        self.grants
            .entry(principal)
            .or_default()
            .push(PermissionGrant { permission, scope });
        self
    }
}

impl PermissionChecker for ChannelPermissionTable {
    fn has_channel_permission(
        &self,
        principal: &Principal,
        permission: OrderPermissions,
        channel_id: Uuid,
    ) -> bool {
        self.grants
            .get(principal)
            .map(|grants| {
                grants
                    .iter()
                    .any(|g| g.permission == permission && g.scope.covers(channel_id))
            })
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_and_codename() {
        assert_eq!(OrderPermissions::ManageOrders.value(), "order.manage_orders");
        assert_eq!(OrderPermissions::ManageOrders.codename(), "manage_orders");
        assert_eq!(OrderPermissions::ManageOrders.app_label(), "order");
        assert_eq!(OrderPermissions::ManageCheckouts.codename(), "manage_checkouts");
        assert_eq!(OrderPermissions::ManageCheckouts.app_label(), "checkout");
    }

    #[test]
    fn test_parse_permission() {
        assert_eq!("order.manage_orders".parse::<OrderPermissions>(), Ok(OrderPermissions::ManageOrders));
        assert_eq!("MANAGE_CHECKOUTS".parse::<OrderPermissions>(), Ok(OrderPermissions::ManageCheckouts));
        assert_eq!("manage_orders".parse::<OrderPermissions>(), Ok(OrderPermissions::ManageOrders));
        assert_eq!(
            "order.delete_orders".parse::<OrderPermissions>(),
            Err(UnknownPermission("order.delete_orders".to_string()))
        );
    }

    #[test]
    fn test_permission_serialization() {
        let json = serde_json::to_string(&OrderPermissions::ManageOrders).unwrap();
        assert_eq!(json, "\"order.manage_orders\"");
        assert_eq!(OrderPermissions::ManageOrders.to_string(), "order.manage_orders");
    }

    #[test]
    fn test_unrestricted_grant_covers_any_channel() {
        let staff = Principal::User(Uuid::new_v4());
        let table = ChannelPermissionTable::new()
            .grant(staff, OrderPermissions::ManageOrders, ChannelScope::All);

        assert!(table.has_channel_permission(&staff, OrderPermissions::ManageOrders, Uuid::new_v4()));
        assert!(!table.has_channel_permission(&staff, OrderPermissions::ManageCheckouts, Uuid::new_v4()));
    }

    #[test]
    fn test_restricted_grant_only_covers_listed_channels() {
        let channel = Uuid::new_v4();
        let app = Principal::App(Uuid::new_v4());
        let table = ChannelPermissionTable::new()
            .grant(app, OrderPermissions::ManageOrders, ChannelScope::Only(vec![channel]));

        assert!(table.has_channel_permission(&app, OrderPermissions::ManageOrders, channel));
        assert!(!table.has_channel_permission(&app, OrderPermissions::ManageOrders, Uuid::new_v4()));
    }

    #[test]
    fn test_unknown_principal_has_nothing() {
        let table = ChannelPermissionTable::new();
        let nobody = Principal::User(Uuid::new_v4());

        assert!(!table.has_channel_permission(&nobody, OrderPermissions::ManageOrders, Uuid::new_v4()));
    }
}
