// src/shops/registry.rs
//! Built-in shop set, in the order results are reported.

use std::sync::Arc;
use std::time::Duration;

use super::descriptor::{DescriptorShop, FieldSpec, ShopDescriptor, Side};
use super::ShopSource;

const BAR_965: &str = "gold_bar_965";
const ORNAMENT_965: &str = "ornament_965";

fn shop(name: &str, url: &str, ready_css: &str, fields: Vec<FieldSpec>) -> ShopDescriptor {
    ShopDescriptor {
        name: name.to_string(),
        url: url.to_string(),
        ready_css: ready_css.to_string(),
        settle_ms: 0,
        nav_timeout_ms: 60_000,
        ready_timeout_ms: 10_000,
        fields,
    }
}

pub fn default_descriptors() -> Vec<ShopDescriptor> {
    vec![
        shop(
            "Aurora",
            "https://www.aurora.co.th/price/gold_pricelist/ราคาทองวันนี้",
            ".goldden_out h3.g-price",
            vec![
                FieldSpec::required(BAR_965, Side::Sell, ".goldden_out h3.g-price"),
                FieldSpec::required(BAR_965, Side::Buy, ".goldden_in h3.g-price"),
            ],
        ),
        shop(
            "MTS Gold",
            "https://www.mtsgold.co.th/mts-price-sm/",
            "#buy965mts",
            vec![
                FieldSpec::required(BAR_965, Side::Buy, "#buy965mts"),
                FieldSpec::required(BAR_965, Side::Sell, "#sell965mts"),
                FieldSpec::optional(ORNAMENT_965, Side::Sell, "#sell965gold"),
            ],
        ),
        shop(
            "Hua Seng Heng",
            "https://www.huasengheng.com",
            "#bid965",
            vec![
                FieldSpec::required(BAR_965, Side::Buy, "#bid965"),
                FieldSpec::required(BAR_965, Side::Sell, "#ask965"),
            ],
        ),
        shop(
            "Chin Hua Heng",
            "https://chinhuaheng.com/gold",
            "#gpb-chh-offer",
            vec![
                FieldSpec::required(BAR_965, Side::Sell, "#gpb-chh-offer"),
                FieldSpec::required(BAR_965, Side::Buy, "#gpb-chh-bid"),
            ],
        ),
        ShopDescriptor {
            // prices arrive via a slow client-side feed
            settle_ms: 10_000,
            ready_timeout_ms: 20_000,
            ..shop(
                "Ausiris",
                "https://www.ausiris.co.th/content/index/goldprice.html",
                "#G965B_bid",
                vec![
                    FieldSpec::required(BAR_965, Side::Buy, "#G965B_bid"),
                    FieldSpec::required(BAR_965, Side::Sell, "#G965B_offer"),
                ],
            )
        },
    ]
}

pub fn sources(descriptors: &[ShopDescriptor], poll: Duration) -> Vec<Arc<dyn ShopSource>> {
    descriptors
        .iter()
        .cloned()
        .map(|d| Arc::new(DescriptorShop::new(d, poll)) as Arc<dyn ShopSource>)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn five_shops_in_fixed_order_with_unique_names() {
        let names: Vec<_> = default_descriptors().into_iter().map(|d| d.name).collect();
        assert_eq!(
            names,
            ["Aurora", "MTS Gold", "Hua Seng Heng", "Chin Hua Heng", "Ausiris"]
        );
    }

    #[test]
    fn ausiris_waits_for_client_side_prices() {
        let d = default_descriptors().pop().unwrap();
        assert_eq!(d.settle_ms, 10_000);
        assert_eq!(d.ready_timeout_ms, 20_000);
    }
}
