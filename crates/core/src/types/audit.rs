//! Audit log action and module codes.
//!
//! Both are stored as plain text in the `logs` table, so the string forms
//! below are part of the persisted format.

use serde::{Deserialize, Serialize};

/// Business action recorded in the audit log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    CreateOrder,
    UpdateOrder,
    CompleteOrder,
    CancelOrder,
    CreateProduct,
    UpdateProduct,
    DeleteProduct,
    CreateIngredient,
    UpdateIngredient,
    DeleteIngredient,
    AdjustStock,
    CreateShift,
    UpdateShift,
    DeleteShift,
}

impl AuditAction {
    /// Persisted action code.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CreateOrder => "CREATE_ORDER",
            Self::UpdateOrder => "UPDATE_ORDER",
            Self::CompleteOrder => "COMPLETE_ORDER",
            Self::CancelOrder => "CANCEL_ORDER",
            Self::CreateProduct => "CREATE_PRODUCT",
            Self::UpdateProduct => "UPDATE_PRODUCT",
            Self::DeleteProduct => "DELETE_PRODUCT",
            Self::CreateIngredient => "CREATE_INGREDIENT",
            Self::UpdateIngredient => "UPDATE_INGREDIENT",
            Self::DeleteIngredient => "DELETE_INGREDIENT",
            Self::AdjustStock => "ADJUST_STOCK",
            Self::CreateShift => "CREATE_SHIFT",
            Self::UpdateShift => "UPDATE_SHIFT",
            Self::DeleteShift => "DELETE_SHIFT",
        }
    }

    /// Module the action is grouped under.
    #[must_use]
    pub const fn module(self) -> AuditModule {
        match self {
            Self::CreateOrder | Self::UpdateOrder | Self::CompleteOrder | Self::CancelOrder => {
                AuditModule::Orders
            }
            Self::CreateProduct | Self::UpdateProduct | Self::DeleteProduct => AuditModule::Menu,
            Self::CreateIngredient
            | Self::UpdateIngredient
            | Self::DeleteIngredient
            | Self::AdjustStock => AuditModule::Warehouse,
            Self::CreateShift | Self::UpdateShift | Self::DeleteShift => AuditModule::Schedule,
        }
    }
}

impl std::fmt::Display for AuditAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Free-form grouping label shown next to each log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AuditModule {
    Orders,
    Menu,
    Warehouse,
    Schedule,
}

impl AuditModule {
    /// Persisted module label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Orders => "Orders",
            Self::Menu => "Menu",
            Self::Warehouse => "Warehouse",
            Self::Schedule => "Schedule",
        }
    }
}

impl std::fmt::Display for AuditModule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_actions_belong_to_orders_module() {
        assert_eq!(AuditAction::CompleteOrder.as_str(), "COMPLETE_ORDER");
        assert_eq!(AuditAction::CompleteOrder.module(), AuditModule::Orders);
        assert_eq!(AuditAction::CreateOrder.module().as_str(), "Orders");
    }

    #[test]
    fn test_serde_matches_persisted_code() {
        let json = serde_json::to_string(&AuditAction::AdjustStock).unwrap_or_default();
        assert_eq!(json, format!("\"{}\"", AuditAction::AdjustStock.as_str()));
    }
}
