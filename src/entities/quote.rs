use serde::{Deserialize, Serialize};

use crate::entities::{Corridor, ServiceType};
use crate::pricing::round2;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PricingMethod {
    DistanceBased,
    RouteBased,
    Hourly,
}

/// One row of a cumulative tier breakdown: the kilometres that fell inside
/// the band and what they cost.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TierCost {
    pub from_km: f64,
    pub to_km: Option<f64>,
    pub rate_per_km: f64,
    pub distance_km: f64,
    pub cost: f64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Quote {
    pub service: ServiceType,
    pub method: PricingMethod,
    pub total_price: f64,
    pub deposit_amount: f64,
    pub remaining_amount: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance_km: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub corridor: Option<Corridor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tier_breakdown: Option<Vec<TierCost>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtotal: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gst: Option<f64>,
}

impl Quote {
    fn new(service: ServiceType, method: PricingMethod, total: f64, deposit_rate: f64) -> Self {
        let total_price = round2(total);
        let deposit_amount = round2(total_price * deposit_rate);
        let remaining_amount = round2(total_price - deposit_amount);

        Self {
            service,
            method,
            total_price,
            deposit_amount,
            remaining_amount,
            distance_km: None,
            corridor: None,
            tier_breakdown: None,
            subtotal: None,
            gst: None,
        }
    }

    pub fn distance_based(
        service: ServiceType,
        distance_km: f64,
        tier_breakdown: Vec<TierCost>,
        total: f64,
        deposit_rate: f64,
    ) -> Self {
        let mut quote = Self::new(service, PricingMethod::DistanceBased, total, deposit_rate);
        quote.distance_km = Some(round2(distance_km));
        quote.tier_breakdown = Some(tier_breakdown);
        quote
    }

    pub fn route_based(
        service: ServiceType,
        corridor: Corridor,
        total: f64,
        deposit_rate: f64,
    ) -> Self {
        let mut quote = Self::new(service, PricingMethod::RouteBased, total, deposit_rate);
        quote.corridor = Some(corridor);
        quote
    }

    pub fn hourly(
        service: ServiceType,
        subtotal: f64,
        gst: f64,
        total: f64,
        deposit_rate: f64,
    ) -> Self {
        let mut quote = Self::new(service, PricingMethod::Hourly, total, deposit_rate);
        quote.subtotal = Some(round2(subtotal));
        quote.gst = Some(round2(gst));
        quote
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deposit_splits_the_total_and_stays_strictly_inside_it() {
        let quote = Quote::route_based(
            ServiceType::AirportTransfer,
            Corridor::YycToCanmore,
            518.44,
            0.35,
        );

        assert!(quote.deposit_amount > 0.0);
        assert!(quote.deposit_amount < quote.total_price);
        assert_eq!(quote.deposit_amount, 181.45);
        assert_eq!(quote.remaining_amount, 336.99);
        assert_eq!(
            round2(quote.deposit_amount + quote.remaining_amount),
            quote.total_price
        );
    }

    #[test]
    fn hourly_quote_carries_subtotal_and_gst() {
        let quote = Quote::hourly(ServiceType::Engagement, 650.0, 32.5, 682.5, 0.5);

        assert_eq!(quote.method, PricingMethod::Hourly);
        assert_eq!(quote.subtotal, Some(650.0));
        assert_eq!(quote.gst, Some(32.5));
        assert_eq!(quote.total_price, 682.5);
        assert_eq!(quote.deposit_amount, 341.25);
    }
}
