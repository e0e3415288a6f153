mod common;

use rail_dss::domain::topology::segment::TrackClass;
use rail_dss::error::Error;

use common::{corridor_graph, graph_with_isolated_station};

#[test]
fn test_corridor_grouping_and_capacity() {
    let graph = corridor_graph();

    assert_eq!(graph.corridor_count(), 3, "Should have grouped 5 tracks into 3 corridors");
    assert_eq!(graph.station_count(), 4);

    let corridor = graph.corridor("SBC-KGI").expect("corridor SBC-KGI must exist");

    assert_eq!(corridor.primary_track, "SBC-KGI main", "Primary must be the main-class track");
    assert_eq!(corridor.track_names[0], "SBC-KGI main", "Primary track must be listed first");
    assert_eq!(corridor.aggregate_capacity, 3, "Aggregate capacity should sum main (2) and siding (1)");
}

#[test]
fn test_corridor_endpoints_resolve_to_nearest_stations() {
    let graph = corridor_graph();

    let corridor = graph.corridor("KGI-MYA").unwrap();
    let endpoints = [corridor.endpoints.0.as_str(), corridor.endpoints.1.as_str()];

    assert!(endpoints.contains(&"KGI"));
    assert!(endpoints.contains(&"MYA"));
    assert!(corridor.contains_station("KGI"));
    assert!(corridor.contains_station("MYA"));
    assert!(!corridor.contains_station("MYS"), "MYS is far from the KGI-MYA polyline");
}

#[test]
fn test_alternatives_are_sidings_and_secondaries_only() {
    let graph = corridor_graph();

    let siding: Vec<&str> = graph.alternatives("SBC-KGI").iter().map(|t| t.name.as_str()).collect();
    assert_eq!(siding, vec!["KGI loop siding"]);

    let bypass = graph.alternatives("KGI-MYA");
    assert_eq!(bypass.len(), 1);
    assert_eq!(bypass[0].class, TrackClass::Secondary);
    assert!(!bypass[0].class.preserves_stops(), "Secondary bypass must not preserve stops");

    assert!(graph.alternatives("MYA-MYS").is_empty());
}

#[test]
fn test_route_resolution_spans_corridors_in_order() {
    let graph = corridor_graph();

    let route = graph.resolve_route(&["SBC".to_string(), "MYS".to_string()]).expect("SBC to MYS must resolve");

    assert_eq!(route, vec!["SBC-KGI", "KGI-MYA", "MYA-MYS"]);

    // Intermediate stops must not duplicate corridors.
    let with_stops = graph.resolve_route(&["SBC".to_string(), "KGI".to_string(), "MYS".to_string()]).unwrap();
    assert_eq!(with_stops, route);
}

#[test]
fn test_unknown_station_fails_route_resolution() {
    let graph = corridor_graph();

    let result = graph.resolve_route(&["SBC".to_string(), "XXX".to_string()]);

    assert!(matches!(result, Err(Error::UnknownStation(code)) if code == "XXX"));
}

#[test]
fn test_isolated_station_yields_unresolved_route() {
    let graph = graph_with_isolated_station();

    let result = graph.resolve_route(&["SBC".to_string(), "ISO".to_string()]);

    assert!(matches!(result, Err(Error::UnresolvedRoute { .. })), "A station attached to no corridor cannot be routed to");
}

#[test]
fn test_oriented_route_chains_entry_and_exit() {
    let graph = corridor_graph();

    let route = graph.resolve_route(&["SBC".to_string(), "MYS".to_string()]).unwrap();
    let legs = graph.orient_route(&route, "SBC").unwrap();

    assert_eq!(legs.len(), 3);
    assert_eq!(legs[0].entry, "SBC");
    assert_eq!(legs[0].exit, "KGI");
    assert_eq!(legs[1].entry, "KGI");
    assert_eq!(legs[2].exit, "MYS");

    for pair in legs.windows(2) {
        assert_eq!(pair[0].exit, pair[1].entry, "Consecutive legs must chain at a shared station");
    }
}

#[test]
fn test_major_flag_derives_from_platform_count() {
    let graph = corridor_graph();

    assert!(graph.station("SBC").unwrap().major);
    assert!(!graph.station("KGI").unwrap().major, "3 platforms is below the major threshold");
    assert!(graph.station("MYA").unwrap().major, "4 platforms meets the major threshold");

    assert!(graph.station("KGI").unwrap().dwell_minutes < graph.station("SBC").unwrap().dwell_minutes);
}
