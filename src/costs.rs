//! Move-in cost estimate for a rental listing.

use crate::models::{InitialCostBreakdown, InitialCostItem, PropertyRecord};

pub struct CostRates {
    /// Brokerage fee as a multiple of rent (tax included)
    pub brokerage_fee_rate: f64,
    /// Guarantor company fee as a multiple of rent
    pub guarantee_fee_rate: f64,
    /// Two-year fire insurance (yen)
    pub fire_insurance: i64,
    pub key_exchange: i64,
}

pub const DEFAULT_COSTS: CostRates = CostRates {
    brokerage_fee_rate: 1.1,
    guarantee_fee_rate: 0.5,
    fire_insurance: 18_000,
    key_exchange: 16_500,
};

fn item(label: &str, amount: i64, is_estimate: bool, note: Option<&str>) -> InitialCostItem {
    InitialCostItem {
        label: label.to_string(),
        amount,
        is_estimate,
        note: note.map(str::to_string),
    }
}

fn none_note(amount: i64) -> Option<&'static str> {
    (amount == 0).then_some("なし")
}

pub fn calculate_initial_costs(property: &PropertyRecord) -> InitialCostBreakdown {
    let rates = &DEFAULT_COSTS;
    let rent = property.rent;
    let mut items = vec![item("前家賃（1ヶ月分）", rent, false, None)];

    if property.management_fee > 0 {
        items.push(item(
            "前管理費・共益費（1ヶ月分）",
            property.management_fee,
            false,
            None,
        ));
    }

    items.push(item("敷金", property.deposit, false, none_note(property.deposit)));
    items.push(item("礼金", property.key_money, false, none_note(property.key_money)));
    items.push(item(
        "仲介手数料",
        (rent as f64 * rates.brokerage_fee_rate).round() as i64,
        true,
        Some("家賃×1.1（税込）"),
    ));
    items.push(item(
        "保証会社利用料",
        (rent as f64 * rates.guarantee_fee_rate).round() as i64,
        true,
        Some("家賃×0.5"),
    ));
    items.push(item("火災保険料（2年）", rates.fire_insurance, true, None));
    items.push(item("鍵交換費用", rates.key_exchange, true, None));

    let total = items.iter().map(|i| i.amount).sum();
    let estimated_total = items.iter().filter(|i| i.is_estimate).map(|i| i.amount).sum();

    InitialCostBreakdown {
        items,
        total,
        estimated_total,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn breakdown_for_typical_listing() {
        let property = PropertyRecord {
            rent: 85_000,
            management_fee: 5_000,
            deposit: 85_000,
            key_money: 0,
            ..Default::default()
        };
        let costs = calculate_initial_costs(&property);

        assert_eq!(costs.items.len(), 8);
        assert_eq!(costs.items[3].note.as_deref(), Some("なし"));
        assert_eq!(costs.items[4].amount, 93_500);
        assert_eq!(costs.items[5].amount, 42_500);
        assert_eq!(costs.estimated_total, 93_500 + 42_500 + 18_000 + 16_500);
        assert_eq!(costs.total, 85_000 + 5_000 + 85_000 + costs.estimated_total);
    }

    #[test]
    fn management_fee_line_only_when_charged() {
        let costs = calculate_initial_costs(&PropertyRecord {
            rent: 50_000,
            ..Default::default()
        });
        assert_eq!(costs.items.len(), 7);
        assert!(costs.items.iter().all(|i| !i.label.starts_with("前管理費")));
    }
}
