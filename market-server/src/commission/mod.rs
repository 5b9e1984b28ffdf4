//! Commission Resolver
//!
//! [`resolver::resolve`] is the pure split. [`RuleIndex`] turns the stored
//! rules into the per-line [`FeeHierarchy`] snapshot, so an order loads the
//! rules once and resolves every line from memory.

pub mod resolver;

pub use resolver::resolve;

use shared::models::{
    CommissionRule, CommissionScope, FeeHierarchy, FeeRule, OrganizationType, VariantSnapshot,
};
use std::collections::HashMap;

#[derive(Debug, Clone, Default)]
pub struct RuleIndex {
    product: HashMap<i64, FeeRule>,
    category: HashMap<i64, FeeRule>,
    vendor: HashMap<i64, FeeRule>,
    organization_type: HashMap<OrganizationType, FeeRule>,
}

impl RuleIndex {
    /// Build from active rules; for duplicate targets the first rule wins,
    /// so callers pass rules ordered by id.
    pub fn new(rules: impl IntoIterator<Item = CommissionRule>) -> Self {
        let mut index = Self::default();
        for rule in rules.into_iter().filter(|r| r.is_active) {
            let fee = FeeRule {
                fee_type: rule.fee_type,
                rate: rule.rate,
            };
            match (rule.scope, rule.target_id, rule.organization_type) {
                (CommissionScope::Product, Some(id), _) => {
                    index.product.entry(id).or_insert(fee);
                }
                (CommissionScope::Category, Some(id), _) => {
                    index.category.entry(id).or_insert(fee);
                }
                (CommissionScope::Vendor, Some(id), _) => {
                    index.vendor.entry(id).or_insert(fee);
                }
                (CommissionScope::OrganizationType, _, Some(org_type)) => {
                    index.organization_type.entry(org_type).or_insert(fee);
                }
                _ => {
                    tracing::warn!(rule_id = rule.id, "Commission rule without a target ignored");
                }
            }
        }
        index
    }

    /// Hierarchy snapshot for one variant (primary category only)
    pub fn hierarchy_for(&self, variant: &VariantSnapshot) -> FeeHierarchy {
        FeeHierarchy {
            product: self.product.get(&variant.product_id).copied(),
            category: variant
                .primary_category_id
                .and_then(|id| self.category.get(&id).copied()),
            vendor: self.vendor.get(&variant.organization_id).copied(),
            organization_type: self.organization_type.get(&variant.organization_type).copied(),
        }
    }
}
