//! Commission resolution
//!
//! Pure: a line total and a hierarchy snapshot in, a platform/vendor
//! split out. Invoked once per line at order creation and frozen onto the
//! line.

use crate::utils::money::round_money;
use rust_decimal::Decimal;
use shared::models::{CommissionSource, CommissionSplit, FeeHierarchy, FeeRule, FeeType};

/// First match wins: product → category → vendor → organization type → none.
pub fn select(hierarchy: &FeeHierarchy) -> Option<(FeeRule, CommissionSource)> {
    [
        (hierarchy.product, CommissionSource::Product),
        (hierarchy.category, CommissionSource::Category),
        (hierarchy.vendor, CommissionSource::Vendor),
        (hierarchy.organization_type, CommissionSource::OrganizationType),
    ]
    .into_iter()
    .find_map(|(rule, source)| rule.map(|r| (r, source)))
}

/// Split `line_total` between platform and vendor.
///
/// The fee is clamped to `[0, line_total]` and rounded to 2 dp;
/// `organization_amount` is derived from it so the two always add up to
/// `line_total` exactly.
pub fn resolve(line_total: Decimal, hierarchy: &FeeHierarchy) -> CommissionSplit {
    let (rule, source) = select(hierarchy).unwrap_or((
        FeeRule::percentage(Decimal::ZERO),
        CommissionSource::None,
    ));

    if line_total <= Decimal::ZERO {
        return CommissionSplit {
            fee_type: rule.fee_type,
            fee_rate: rule.rate,
            platform_fee_amount: Decimal::ZERO,
            organization_amount: line_total,
            source,
        };
    }

    let raw_fee = match rule.fee_type {
        FeeType::Percentage => line_total * rule.rate / Decimal::ONE_HUNDRED,
        FeeType::Fixed => rule.rate,
    };
    let platform_fee_amount = round_money(raw_fee.clamp(Decimal::ZERO, line_total));

    CommissionSplit {
        fee_type: rule.fee_type,
        fee_rate: rule.rate,
        platform_fee_amount,
        organization_amount: line_total - platform_fee_amount,
        source,
    }
}
