use crate::entities::Corridor;

/// Maps a pair of free-text addresses onto a known airport corridor.
/// Implementations must be deterministic and side effect free.
pub trait RouteResolver: Send + Sync {
    fn resolve(&self, pickup: &str, dropoff: &str) -> Option<Corridor>;
}

/// Keyword matcher over lowercased addresses, backed by a list of partner
/// venues whose names do not mention their town.
#[derive(Clone, Copy, Debug, Default)]
pub struct HeuristicRouteResolver;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Town {
    Canmore,
    Banff,
}

const CANMORE_VENUES: [&str; 20] = [
    "solara",
    "super 8",
    "world mark",
    "worldmark canmore",
    "silvertip resort",
    "malcom hotel",
    "lodges of canmore",
    "wind tower",
    "northwinds",
    "blackstone mountain lodge",
    "rocky mountain ski lodge",
    "pocaterra inn & waterslide",
    "coast canmore hotel & conference centre",
    "chateau canmore",
    "falcon crest lodge",
    "grande rockies resort - bellstar hotels & resorts",
    "stoneridge mountain resort",
    "silver creek lodge",
    "mystic springs chalets",
    "copperstone resort hotel",
];

const BANFF_VENUES: [&str; 4] = [
    "banff boundary lodge",
    "rundle chalet",
    "skyridge 401",
    "banff woods lodge",
];

fn is_airport(value: &str) -> bool {
    value.contains("yyc")
        || value.contains("calgary airport")
        || value.contains("calgary international")
        || value == "airport"
}

fn town_of(value: &str) -> Option<Town> {
    if value.contains("canmore") {
        return Some(Town::Canmore);
    }

    if value.contains("banff") {
        return Some(Town::Banff);
    }

    if CANMORE_VENUES.contains(&value) {
        return Some(Town::Canmore);
    }

    if BANFF_VENUES.contains(&value) {
        return Some(Town::Banff);
    }

    None
}

impl RouteResolver for HeuristicRouteResolver {
    fn resolve(&self, pickup: &str, dropoff: &str) -> Option<Corridor> {
        let pickup = pickup.trim().to_lowercase();
        let dropoff = dropoff.trim().to_lowercase();

        let pickup_airport = is_airport(&pickup);
        let dropoff_airport = is_airport(&dropoff);
        let pickup_town = town_of(&pickup);
        let dropoff_town = town_of(&dropoff);

        if pickup_airport && dropoff_town == Some(Town::Canmore) {
            return Some(Corridor::YycToCanmore);
        }

        if pickup_airport && dropoff_town == Some(Town::Banff) {
            return Some(Corridor::YycToBanff);
        }

        if pickup_town == Some(Town::Canmore) && dropoff_airport {
            return Some(Corridor::CanmoreToYyc);
        }

        if pickup_town == Some(Town::Banff) && dropoff_airport {
            return Some(Corridor::BanffToYyc);
        }

        None
    }
}
