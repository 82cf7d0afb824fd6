use oso::{Oso, PolarClass};

use crate::auth::{Platform, User};
use crate::entities::{Booking, Status};

pub fn new() -> Oso {
    let mut o = Oso::new();

    o.register_class(Platform::get_polar_class()).unwrap();
    o.register_class(User::get_polar_class()).unwrap();
    o.register_class(Booking::get_polar_class()).unwrap();
    o.register_class(Status::get_polar_class()).unwrap();

    o.load_str(include_str!("rules.polar")).unwrap();

    o
}

#[cfg(test)]
fn booking_owned_by(customer_id: uuid::Uuid) -> Booking {
    use crate::entities::{Corridor, Location, Quote, ServiceType, VehicleClass};

    let quote = Quote::route_based(
        ServiceType::AirportTransfer,
        Corridor::YycToCanmore,
        518.44,
        0.35,
    );

    Booking::new(
        customer_id,
        ServiceType::AirportTransfer,
        VehicleClass::LuxurySuv,
        Location::new("Calgary Airport (YYC)", None),
        Location::new("Canmore", None),
        chrono::Utc::now(),
        None,
        Vec::new(),
        &quote,
    )
}

#[test]
fn platform_roles_carry_over_to_bookings_test() {
    use uuid::Uuid;

    let authorizor = new();

    let admin = User {
        id: Uuid::new_v4(),
        roles: vec!["admin".into()],
    };

    let booking = booking_owned_by(Uuid::new_v4());

    let result = authorizor.query_rule("has_role", (admin.clone(), "admin", booking.clone()));
    assert!(result.unwrap().next().unwrap().is_ok());
}

#[test]
fn platform_role_test() {
    use uuid::Uuid;

    let authorizor = new();

    let system = User {
        id: Uuid::new_v4(),
        roles: vec!["system".into()],
    };

    let result = authorizor.query_rule("has_role", (system.clone(), "system", Platform::default()));
    assert!(result.unwrap().next().unwrap().is_ok());
}

#[test]
fn platform_permission_test() {
    use uuid::Uuid;

    let authorizor = new();

    let customer = User::new_customer(Uuid::new_v4());
    let admin = User {
        id: Uuid::new_v4(),
        roles: vec!["admin".into()],
    };
    let anonymous = User {
        id: Uuid::new_v4(),
        roles: vec![],
    };

    let result = authorizor.is_allowed(customer.clone(), "create_booking", Platform::default());
    assert_eq!(result.unwrap(), true);

    let result = authorizor.is_allowed(customer.clone(), "estimate_price", Platform::default());
    assert_eq!(result.unwrap(), true);

    let result = authorizor.is_allowed(customer.clone(), "read_own_bookings", Platform::default());
    assert_eq!(result.unwrap(), true);

    let result = authorizor.is_allowed(customer.clone(), "list_bookings", Platform::default());
    assert_eq!(result.unwrap(), false);

    // admins inherit the customer permissions

    let result = authorizor.is_allowed(admin.clone(), "create_booking", Platform::default());
    assert_eq!(result.unwrap(), true);

    let result = authorizor.is_allowed(admin.clone(), "list_bookings", Platform::default());
    assert_eq!(result.unwrap(), true);

    let result = authorizor.is_allowed(anonymous.clone(), "create_booking", Platform::default());
    assert_eq!(result.unwrap(), false);
}

#[test]
fn booking_owner_role_test() {
    use uuid::Uuid;

    let authorizor = new();

    let owner = User::new_customer(Uuid::new_v4());
    let stranger = User::new_customer(Uuid::new_v4());

    let booking = booking_owned_by(owner.id);

    let result = authorizor.query_rule("has_role", (owner.clone(), "owner", booking.clone()));
    assert!(result.unwrap().next().unwrap().is_ok());

    let result = authorizor.query_rule("has_role", (stranger.clone(), "owner", booking.clone()));
    assert!(result.unwrap().next().is_none());

    let result = authorizor.is_allowed(owner.clone(), "read", booking.clone());
    assert_eq!(result.unwrap(), true);

    let result = authorizor.is_allowed(owner.clone(), "cancel", booking.clone());
    assert_eq!(result.unwrap(), true);

    let result = authorizor.is_allowed(owner.clone(), "continue_payment", booking.clone());
    assert_eq!(result.unwrap(), true);

    let result = authorizor.is_allowed(owner.clone(), "request_final_payment", booking.clone());
    assert_eq!(result.unwrap(), false);

    let result = authorizor.is_allowed(stranger.clone(), "read", booking.clone());
    assert_eq!(result.unwrap(), false);

    let result = authorizor.is_allowed(stranger.clone(), "cancel", booking.clone());
    assert_eq!(result.unwrap(), false);

    let result = authorizor.is_allowed(stranger.clone(), "continue_payment", booking.clone());
    assert_eq!(result.unwrap(), false);
}

#[test]
fn booking_admin_role_test() {
    use uuid::Uuid;

    let authorizor = new();

    let admin = User {
        id: Uuid::new_v4(),
        roles: vec!["admin".into()],
    };

    let booking = booking_owned_by(Uuid::new_v4());

    let result = authorizor.is_allowed(admin.clone(), "read", booking.clone());
    assert_eq!(result.unwrap(), true);

    let result = authorizor.is_allowed(admin.clone(), "request_final_payment", booking.clone());
    assert_eq!(result.unwrap(), true);

    // cancellation and payment stay with the owner

    let result = authorizor.is_allowed(admin.clone(), "cancel", booking.clone());
    assert_eq!(result.unwrap(), false);

    let result = authorizor.is_allowed(admin.clone(), "continue_payment", booking.clone());
    assert_eq!(result.unwrap(), false);
}

#[test]
fn booking_system_role_test() {
    use uuid::Uuid;

    let authorizor = new();

    let system = User::new_system_user();

    let booking = booking_owned_by(Uuid::new_v4());

    let result = authorizor.query_rule("has_role", (system.clone(), "system", booking.clone()));
    assert!(result.unwrap().next().unwrap().is_ok());

    let result = authorizor.is_allowed(system.clone(), "read", booking.clone());
    assert_eq!(result.unwrap(), true);

    let result = authorizor.is_allowed(system.clone(), "request_final_payment", booking.clone());
    assert_eq!(result.unwrap(), true);

    let result = authorizor.is_allowed(system.clone(), "list_bookings", Platform::default());
    assert_eq!(result.unwrap(), true);
}
