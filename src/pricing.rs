use crate::entities::{AddOnRequest, AddOnService, Corridor, ServiceType, TierCost, VehicleClass};
use crate::error::{invalid_distance_error, invalid_input_error, Error};

pub const GST_RATE: f64 = 0.05;

pub const WEDDING_BASE_PRICE: f64 = 850.0;
pub const WEDDING_BASE_HOURS: u32 = 4;

/// Cumulative distance bands, priced per kilometre driven inside each band.
/// The final band is open ended.
const DISTANCE_TIERS: [Tier; 4] = [
    Tier {
        from_km: 0.0,
        to_km: Some(50.0),
        rate_per_km: 6.50,
    },
    Tier {
        from_km: 50.0,
        to_km: Some(100.0),
        rate_per_km: 4.80,
    },
    Tier {
        from_km: 100.0,
        to_km: Some(150.0),
        rate_per_km: 4.50,
    },
    Tier {
        from_km: 150.0,
        to_km: None,
        rate_per_km: 4.20,
    },
];

struct Tier {
    from_km: f64,
    to_km: Option<f64>,
    rate_per_km: f64,
}

/// Minimums for the shorter event services. Whichever is larger wins: the
/// hourly charge for the booked block, or the service floor price.
pub struct EventService {
    pub min_price: f64,
    pub min_hours: u32,
}

pub const ENGAGEMENT_SERVICE: EventService = EventService {
    min_price: 650.0,
    min_hours: 3,
};

pub const CEREMONY_SERVICE: EventService = EventService {
    min_price: 450.0,
    min_hours: 2,
};

/// Deposit rates by service type, as a fraction of the quoted total.
#[derive(Clone, Debug)]
pub struct DepositSchedule {
    pub airport_transfer: f64,
    pub wedding_shuttle: f64,
    pub engagement: f64,
    pub ceremony: f64,
}

impl Default for DepositSchedule {
    fn default() -> Self {
        Self {
            airport_transfer: 0.35,
            wedding_shuttle: 0.50,
            engagement: 0.50,
            ceremony: 0.50,
        }
    }
}

impl DepositSchedule {
    pub fn rate_for(&self, service: ServiceType) -> f64 {
        match service {
            ServiceType::AirportTransfer => self.airport_transfer,
            ServiceType::WeddingShuttle => self.wedding_shuttle,
            ServiceType::Engagement => self.engagement,
            ServiceType::Ceremony => self.ceremony,
        }
    }
}

#[derive(Clone, Debug)]
pub struct DistancePricing {
    pub distance_km: f64,
    pub base_price: f64,
    pub vehicle_multiplier: f64,
    pub total: f64,
    pub tier_breakdown: Vec<TierCost>,
}

#[derive(Clone, Debug)]
pub struct WeddingPricing {
    pub base_price: f64,
    pub hourly_rate: f64,
    pub additional_hours: u32,
    pub additional_hours_cost: f64,
    pub add_on_cost: f64,
    pub subtotal: f64,
    pub gst: f64,
    pub total: f64,
}

#[derive(Clone, Debug)]
pub struct EventPricing {
    pub hourly_rate: f64,
    pub hours_billed: u32,
    pub subtotal: f64,
    pub gst: f64,
    pub total: f64,
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub fn vehicle_multiplier(vehicle: VehicleClass) -> f64 {
    match vehicle {
        VehicleClass::LuxurySuv => 1.0,
        VehicleClass::TransitVan => 1.32,
    }
}

pub fn hourly_rate(vehicle: VehicleClass) -> f64 {
    match vehicle {
        VehicleClass::LuxurySuv => 163.0,
        VehicleClass::TransitVan => 213.0,
    }
}

/// Flat fares for the known airport corridors. Both directions of a corridor
/// cost the same.
pub fn airport_corridor_price(corridor: Corridor, vehicle: VehicleClass) -> f64 {
    match (corridor, vehicle) {
        (Corridor::YycToCanmore | Corridor::CanmoreToYyc, VehicleClass::LuxurySuv) => 518.44,
        (Corridor::YycToCanmore | Corridor::CanmoreToYyc, VehicleClass::TransitVan) => 685.13,
        (Corridor::YycToBanff | Corridor::BanffToYyc, VehicleClass::LuxurySuv) => 681.45,
        (Corridor::YycToBanff | Corridor::BanffToYyc, VehicleClass::TransitVan) => 897.00,
    }
}

/// Walks the tier table, charging each kilometre at the rate of the band it
/// falls in, then applies the vehicle multiplier.
pub fn distance_based_price(
    distance_km: f64,
    vehicle: VehicleClass,
    max_distance_km: f64,
) -> Result<DistancePricing, Error> {
    if !distance_km.is_finite() || distance_km <= 0.0 {
        return Err(invalid_input_error("distance must be a positive number"));
    }

    if distance_km > max_distance_km {
        return Err(invalid_distance_error(distance_km, max_distance_km));
    }

    let mut tier_breakdown = Vec::new();
    let mut base_price = 0.0;

    for tier in &DISTANCE_TIERS {
        if distance_km <= tier.from_km {
            break;
        }

        let upper = tier.to_km.unwrap_or(f64::INFINITY);
        let span = distance_km.min(upper) - tier.from_km;
        let cost = span * tier.rate_per_km;

        base_price += cost;
        tier_breakdown.push(TierCost {
            from_km: tier.from_km,
            to_km: tier.to_km,
            rate_per_km: tier.rate_per_km,
            distance_km: round2(span),
            cost: round2(cost),
        });
    }

    let multiplier = vehicle_multiplier(vehicle);

    Ok(DistancePricing {
        distance_km,
        base_price: round2(base_price),
        vehicle_multiplier: multiplier,
        total: round2(base_price * multiplier),
        tier_breakdown,
    })
}

/// Wedding shuttle: flat base covering the first four hours, hourly beyond
/// that, plus any add-ons, with GST on the lot.
pub fn wedding_shuttle_price(
    vehicle: VehicleClass,
    additional_hours: u32,
    add_ons: &[AddOnRequest],
) -> WeddingPricing {
    let rate = hourly_rate(vehicle);
    let additional_hours_cost = rate * f64::from(additional_hours);

    // each catalog add-on is charged at most once
    let mut counted: Vec<AddOnService> = Vec::new();
    let mut add_on_cost = 0.0;
    for add_on in add_ons {
        if !counted.contains(&add_on.service) {
            counted.push(add_on.service);
            add_on_cost += add_on.service.flat_charge();
        }
    }

    let subtotal = WEDDING_BASE_PRICE + additional_hours_cost + add_on_cost;
    let gst = subtotal * GST_RATE;

    WeddingPricing {
        base_price: WEDDING_BASE_PRICE,
        hourly_rate: rate,
        additional_hours,
        additional_hours_cost: round2(additional_hours_cost),
        add_on_cost: round2(add_on_cost),
        subtotal: round2(subtotal),
        gst: round2(gst),
        total: round2(subtotal + gst),
    }
}

pub fn hourly_event_price(
    service: &EventService,
    vehicle: VehicleClass,
    hours: u32,
) -> EventPricing {
    let rate = hourly_rate(vehicle);
    let hours_billed = hours.max(service.min_hours);
    let subtotal = (rate * f64::from(hours_billed)).max(service.min_price);
    let gst = subtotal * GST_RATE;

    EventPricing {
        hourly_rate: rate,
        hours_billed,
        subtotal: round2(subtotal),
        gst: round2(gst),
        total: round2(subtotal + gst),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn add_on_request() -> AddOnRequest {
        AddOnRequest {
            service: AddOnService::CeremonyPickupDropoff,
            duration_hours: Some(2),
            location: None,
            notes: None,
        }
    }

    #[test]
    fn prices_a_trip_spanning_three_tiers() {
        // 108 km: 50 at 6.50, 50 at 4.80, 8 at 4.50
        let pricing = distance_based_price(108.0, VehicleClass::LuxurySuv, 500.0).unwrap();

        assert_eq!(pricing.base_price, 601.0);
        assert_eq!(pricing.total, 601.0);

        let breakdown = &pricing.tier_breakdown;
        assert_eq!(breakdown.len(), 3);
        assert_eq!(breakdown[0].distance_km, 50.0);
        assert_eq!(breakdown[0].cost, 325.0);
        assert_eq!(breakdown[1].distance_km, 50.0);
        assert_eq!(breakdown[1].cost, 240.0);
        assert_eq!(breakdown[2].from_km, 100.0);
        assert_eq!(breakdown[2].distance_km, 8.0);
        assert_eq!(breakdown[2].cost, 36.0);
    }

    #[test]
    fn van_multiplier_scales_the_tiered_price() {
        let pricing = distance_based_price(108.0, VehicleClass::TransitVan, 500.0).unwrap();

        assert_eq!(pricing.base_price, 601.0);
        assert_eq!(pricing.vehicle_multiplier, 1.32);
        assert_eq!(pricing.total, 793.32);
    }

    #[test]
    fn short_trips_stay_inside_the_first_tier() {
        let pricing = distance_based_price(10.0, VehicleClass::LuxurySuv, 500.0).unwrap();

        assert_eq!(pricing.total, 65.0);
        assert_eq!(pricing.tier_breakdown.len(), 1);
    }

    #[test]
    fn tier_boundaries_do_not_open_an_empty_band() {
        let at_fifty = distance_based_price(50.0, VehicleClass::LuxurySuv, 500.0).unwrap();
        assert_eq!(at_fifty.total, 325.0);
        assert_eq!(at_fifty.tier_breakdown.len(), 1);

        let at_hundred_fifty = distance_based_price(150.0, VehicleClass::LuxurySuv, 500.0).unwrap();
        assert_eq!(at_hundred_fifty.total, 790.0);
        assert_eq!(at_hundred_fifty.tier_breakdown.len(), 3);
    }

    #[test]
    fn price_grows_with_distance_across_a_boundary() {
        let below = distance_based_price(49.9, VehicleClass::LuxurySuv, 500.0).unwrap();
        let above = distance_based_price(50.1, VehicleClass::LuxurySuv, 500.0).unwrap();

        assert!(above.total > below.total);
        assert_eq!(below.total, 324.35);
        assert_eq!(above.total, 325.48);
    }

    #[test]
    fn open_ended_tier_prices_long_trips() {
        let pricing = distance_based_price(200.0, VehicleClass::LuxurySuv, 500.0).unwrap();

        assert_eq!(pricing.total, 1000.0);
        assert_eq!(pricing.tier_breakdown[3].to_km, None);
        assert_eq!(pricing.tier_breakdown[3].cost, 210.0);
    }

    #[test]
    fn breakdown_costs_sum_to_the_base_price() {
        let pricing = distance_based_price(137.3, VehicleClass::TransitVan, 500.0).unwrap();

        let summed: f64 = pricing.tier_breakdown.iter().map(|tier| tier.cost).sum();
        assert!((summed - pricing.base_price).abs() < 0.02);
    }

    #[test]
    fn rejects_non_positive_and_non_finite_distances() {
        assert!(distance_based_price(0.0, VehicleClass::LuxurySuv, 500.0).is_err());
        assert!(distance_based_price(-12.0, VehicleClass::LuxurySuv, 500.0).is_err());
        assert!(distance_based_price(f64::NAN, VehicleClass::LuxurySuv, 500.0).is_err());
        assert!(distance_based_price(f64::INFINITY, VehicleClass::LuxurySuv, 500.0).is_err());
    }

    #[test]
    fn enforces_the_distance_ceiling() {
        let at_ceiling = distance_based_price(500.0, VehicleClass::LuxurySuv, 500.0);
        assert!(at_ceiling.is_ok());

        let over = distance_based_price(500.1, VehicleClass::LuxurySuv, 500.0).unwrap_err();
        assert_eq!(over.code, crate::error::INVALID_DISTANCE);
    }

    #[test]
    fn corridor_fares_are_symmetric() {
        for corridor in [Corridor::YycToCanmore, Corridor::YycToBanff] {
            for vehicle in VehicleClass::ALL {
                assert_eq!(
                    airport_corridor_price(corridor, vehicle),
                    airport_corridor_price(corridor.reverse(), vehicle),
                );
            }
        }

        assert_eq!(
            airport_corridor_price(Corridor::YycToCanmore, VehicleClass::LuxurySuv),
            518.44
        );
        assert_eq!(
            airport_corridor_price(Corridor::CanmoreToYyc, VehicleClass::TransitVan),
            685.13
        );
        assert_eq!(
            airport_corridor_price(Corridor::YycToBanff, VehicleClass::LuxurySuv),
            681.45
        );
        assert_eq!(
            airport_corridor_price(Corridor::BanffToYyc, VehicleClass::TransitVan),
            897.00
        );
    }

    #[test]
    fn wedding_base_covers_four_hours() {
        let pricing = wedding_shuttle_price(VehicleClass::LuxurySuv, 0, &[]);

        assert_eq!(pricing.subtotal, 850.0);
        assert_eq!(pricing.gst, 42.5);
        assert_eq!(pricing.total, 892.5);
    }

    #[test]
    fn wedding_charges_additional_hours_at_the_vehicle_rate() {
        let suv = wedding_shuttle_price(VehicleClass::LuxurySuv, 2, &[]);
        assert_eq!(suv.additional_hours_cost, 326.0);
        assert_eq!(suv.subtotal, 1176.0);
        assert_eq!(suv.total, 1234.8);

        let van = wedding_shuttle_price(VehicleClass::TransitVan, 2, &[]);
        assert_eq!(van.additional_hours_cost, 426.0);
        assert_eq!(van.total, 1339.8);
    }

    #[test]
    fn wedding_add_on_is_flat_and_charged_once() {
        let single = wedding_shuttle_price(VehicleClass::LuxurySuv, 2, &[add_on_request()]);
        assert_eq!(single.add_on_cost, 750.0);
        assert_eq!(single.subtotal, 1926.0);
        assert_eq!(single.gst, 96.3);
        assert_eq!(single.total, 2022.3);

        let doubled = wedding_shuttle_price(
            VehicleClass::LuxurySuv,
            2,
            &[add_on_request(), add_on_request()],
        );
        assert_eq!(doubled.add_on_cost, 750.0);
    }

    #[test]
    fn engagement_enforces_minimum_hours_and_price() {
        let floored = hourly_event_price(&ENGAGEMENT_SERVICE, VehicleClass::LuxurySuv, 0);
        assert_eq!(floored.hours_billed, 3);
        assert_eq!(floored.subtotal, 650.0);
        assert_eq!(floored.total, 682.5);

        // 3 hours in the van is 639, still under the 650 floor
        let van = hourly_event_price(&ENGAGEMENT_SERVICE, VehicleClass::TransitVan, 3);
        assert_eq!(van.subtotal, 650.0);

        let longer = hourly_event_price(&ENGAGEMENT_SERVICE, VehicleClass::LuxurySuv, 5);
        assert_eq!(longer.subtotal, 815.0);
        assert_eq!(longer.total, 855.75);
    }

    #[test]
    fn ceremony_enforces_minimum_hours_and_price() {
        let floored = hourly_event_price(&CEREMONY_SERVICE, VehicleClass::LuxurySuv, 2);
        assert_eq!(floored.subtotal, 450.0);
        assert_eq!(floored.total, 472.5);

        let van = hourly_event_price(&CEREMONY_SERVICE, VehicleClass::TransitVan, 3);
        assert_eq!(van.subtotal, 639.0);
        assert_eq!(van.total, 670.95);
    }

    #[test]
    fn deposit_schedule_defaults_by_service() {
        let schedule = DepositSchedule::default();

        assert_eq!(schedule.rate_for(ServiceType::AirportTransfer), 0.35);
        assert_eq!(schedule.rate_for(ServiceType::WeddingShuttle), 0.50);
        assert_eq!(schedule.rate_for(ServiceType::Engagement), 0.50);
        assert_eq!(schedule.rate_for(ServiceType::Ceremony), 0.50);
    }
}
