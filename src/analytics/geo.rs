//! Geolocation counts.

use std::collections::{BTreeMap, HashMap};

use uuid::Uuid;

use crate::model::GeoInfo;

/// Players per country, using each player's most recent location.
///
/// On equal dates the country seen last in `infos` wins.
pub fn geolocation_counts(infos: &[GeoInfo]) -> BTreeMap<String, u64> {
    let mut latest: HashMap<Uuid, &GeoInfo> = HashMap::new();
    for info in infos {
        match latest.get(&info.player) {
            Some(current) if current.date > info.date => {}
            _ => {
                latest.insert(info.player, info);
            }
        }
    }

    let mut counts = BTreeMap::new();
    for info in latest.values() {
        *counts.entry(info.country.clone()).or_insert(0) += 1;
    }
    counts
}
