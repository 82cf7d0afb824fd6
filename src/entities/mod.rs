mod booking;
mod location;
mod quote;
mod route;
mod vehicle;

pub use booking::{
    AddOn, AddOnRequest, AddOnService, Booking, EventDetails, ServiceType, Status, WebhookOutcome,
};
pub use location::{Coordinates, Location};
pub use quote::{PricingMethod, Quote, TierCost};
pub use route::Corridor;
pub use vehicle::VehicleClass;
