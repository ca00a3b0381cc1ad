use noesis_core::{
    invoke_tool, read_resource, TickContext, Vec3, VecEventSink, WorldEntity, WorldQuery,
};
use noesis_mind::config::PerceptionConfig;
use noesis_mind::perception::PerceptionComponent;
use serde_json::{json, Map};

#[derive(Default)]
struct StaticWorld {
    entities: Vec<WorldEntity>,
}

impl StaticWorld {
    fn with(entities: Vec<WorldEntity>) -> Self {
        Self { entities }
    }
}

impl WorldQuery for StaticWorld {
    fn entities_within(&self, center: Vec3, radius: f32) -> Vec<WorldEntity> {
        self.entities
            .iter()
            .filter(|e| e.position.distance(center) <= radius)
            .cloned()
            .collect()
    }
}

fn entity(name: &str, categories: &[&str], position: Vec3, velocity: Vec3) -> WorldEntity {
    WorldEntity {
        id: None,
        name: name.to_string(),
        categories: categories.iter().map(|c| c.to_string()).collect(),
        position,
        velocity,
        properties: Map::new(),
    }
}

#[test]
fn zero_entities_yield_zero_summaries_not_errors() {
    let mut perception = PerceptionComponent::new("agent", PerceptionConfig::default());
    let world = StaticWorld::default();
    let mut sink = VecEventSink::default();

    perception.scan(0, &world, Vec3::ZERO);

    let result = invoke_tool(
        &mut perception,
        "get_nearby_objects",
        &json!({}),
        0,
        &mut sink,
    )
    .unwrap();
    assert_eq!(result["summary"]["total"], json!(0));
    assert_eq!(result["summary"]["moving"], json!(0));
    assert_eq!(result["summary"]["closest_distance"], json!(null));

    let analysis = invoke_tool(
        &mut perception,
        "get_spatial_analysis",
        &json!({}),
        0,
        &mut sink,
    )
    .unwrap();
    assert_eq!(analysis["total"], json!(0));
    assert_eq!(analysis["by_distance"]["medium"], json!(0));
}

#[test]
fn moving_npc_at_medium_range_is_bucketed() {
    // Vision radius 80, one moving npc at distance 40: medium band is
    // [24, 56) and the movement split counts it as moving.
    let mut perception = PerceptionComponent::new("agent", PerceptionConfig::default());
    let world = StaticWorld::with(vec![entity(
        "Villager Anna",
        &["npc"],
        Vec3::new(40.0, 0.0, 0.0),
        Vec3::new(1.0, 0.0, 0.0),
    )]);
    let mut sink = VecEventSink::default();

    perception.scan(0, &world, Vec3::ZERO);

    let result = invoke_tool(
        &mut perception,
        "get_nearby_objects",
        &json!({}),
        0,
        &mut sink,
    )
    .unwrap();
    assert_eq!(result["summary"]["total"], json!(1));
    assert_eq!(result["summary"]["by_type"]["npc"], json!(1));

    let analysis = invoke_tool(
        &mut perception,
        "get_spatial_analysis",
        &json!({}),
        0,
        &mut sink,
    )
    .unwrap();
    assert_eq!(analysis["by_distance"]["medium"], json!(1));
    assert_eq!(analysis["by_movement"]["moving"], json!(1));
}

#[test]
fn objects_are_sorted_by_distance_with_filters() {
    let mut perception = PerceptionComponent::new("agent", PerceptionConfig::default());
    let world = StaticWorld::with(vec![
        entity("far lamp", &[], Vec3::new(50.0, 0.0, 0.0), Vec3::ZERO),
        entity("guard bob", &["npc"], Vec3::new(10.0, 0.0, 0.0), Vec3::ZERO),
        entity("door", &["door"], Vec3::new(30.0, 0.0, 0.0), Vec3::ZERO),
    ]);
    let mut sink = VecEventSink::default();

    perception.scan(0, &world, Vec3::ZERO);

    let result = invoke_tool(
        &mut perception,
        "get_nearby_objects",
        &json!({}),
        0,
        &mut sink,
    )
    .unwrap();
    let distances: Vec<f64> = result["objects"]
        .as_array()
        .unwrap()
        .iter()
        .map(|o| o["distance"].as_f64().unwrap())
        .collect();
    assert_eq!(distances, vec![10.0, 30.0, 50.0]);

    let filtered = invoke_tool(
        &mut perception,
        "get_nearby_objects",
        &json!({ "type": "npc", "max_distance": 20.0 }),
        0,
        &mut sink,
    )
    .unwrap();
    assert_eq!(filtered["summary"]["total"], json!(1));

    // Name-substring heuristics classify the lamp as a light source.
    let found = invoke_tool(
        &mut perception,
        "find_object",
        &json!({ "type": "light_source" }),
        0,
        &mut sink,
    )
    .unwrap();
    assert_eq!(found["found"], json!(true));
    assert_eq!(found["object"]["id"], json!("far_lamp"));
}

#[test]
fn terrain_and_self_are_excluded() {
    let mut perception = PerceptionComponent::new("villager_anna", PerceptionConfig::default());
    let world = StaticWorld::with(vec![
        entity("ground", &["terrain"], Vec3::new(1.0, 0.0, 0.0), Vec3::ZERO),
        entity("Villager Anna", &["npc"], Vec3::new(0.0, 0.0, 0.0), Vec3::ZERO),
        entity("guard", &["npc"], Vec3::new(5.0, 0.0, 0.0), Vec3::ZERO),
    ]);
    let mut sink = VecEventSink::default();

    perception.scan(0, &world, Vec3::ZERO);
    assert_eq!(perception.objects().len(), 1);
    assert_eq!(perception.objects()[0].id, "guard");
}

#[test]
fn vision_radius_has_a_floor() {
    let config = PerceptionConfig {
        vision_radius: 0.5,
        ..PerceptionConfig::default()
    };
    let mut perception = PerceptionComponent::new("agent", config);
    let world = StaticWorld::with(vec![entity(
        "guard",
        &["npc"],
        Vec3::new(3.0, 0.0, 0.0),
        Vec3::ZERO,
    )]);

    perception.scan(0, &world, Vec3::ZERO);
    assert_eq!(
        perception.objects().len(),
        1,
        "floor keeps nearby entities visible"
    );
}

#[test]
fn scan_interval_accumulates_tick_time() {
    let config = PerceptionConfig {
        scan_interval: 1.0,
        ..PerceptionConfig::default()
    };
    let mut perception = PerceptionComponent::new("agent", config);
    let world = StaticWorld::with(vec![entity(
        "guard",
        &["npc"],
        Vec3::new(5.0, 0.0, 0.0),
        Vec3::ZERO,
    )]);

    perception.tick(&TickContext::new(0, 0.4), &world, Vec3::ZERO);
    assert!(perception.objects().is_empty(), "interval not yet elapsed");

    perception.tick(&TickContext::new(1, 0.4), &world, Vec3::ZERO);
    assert!(perception.objects().is_empty());

    perception.tick(&TickContext::new(2, 0.4), &world, Vec3::ZERO);
    assert_eq!(perception.objects().len(), 1);
}

#[test]
fn environment_synthesis_follows_injected_time() {
    let mut perception = PerceptionComponent::new("agent", PerceptionConfig::default());
    let world = StaticWorld::with(vec![
        entity("street lamp", &["light_source"], Vec3::new(4.0, 0.0, 0.0), Vec3::ZERO),
        entity("guard", &["npc"], Vec3::new(6.0, 0.0, 0.0), Vec3::new(1.0, 0.0, 0.0)),
    ]);
    let mut sink = VecEventSink::default();

    perception.scan(0, &world, Vec3::ZERO);
    perception.notify_time(2, 22, 15);

    let temporal = read_resource(&perception, "temporal", 0, &mut sink).unwrap();
    assert_eq!(temporal["time_of_day"], json!("night"));
    assert_eq!(temporal["day"], json!(2));

    let environment = read_resource(&perception, "environment", 0, &mut sink).unwrap();
    assert_eq!(environment["lighting"], json!("artificial"));
    assert_eq!(environment["noise_level"], json!("moderate"));
    assert_eq!(environment["crowd_density"], json!("sparse"));

    // Daytime without lights is bright.
    perception.notify_time(3, 9, 0);
    let environment = read_resource(&perception, "environment", 0, &mut sink).unwrap();
    assert_eq!(environment["lighting"], json!("bright"));
    assert_eq!(environment["time_of_day"], json!("morning"));
}

#[test]
fn spatial_analysis_clusters_close_objects() {
    let config = PerceptionConfig {
        clustering_radius: 5.0,
        ..PerceptionConfig::default()
    };
    let mut perception = PerceptionComponent::new("agent", config);
    let world = StaticWorld::with(vec![
        entity("a", &["npc"], Vec3::new(10.0, 0.0, 0.0), Vec3::ZERO),
        entity("b", &["npc"], Vec3::new(13.0, 0.0, 0.0), Vec3::ZERO),
        entity("c", &["npc"], Vec3::new(40.0, 0.0, 0.0), Vec3::ZERO),
    ]);
    let mut sink = VecEventSink::default();

    perception.scan(0, &world, Vec3::ZERO);
    let analysis = invoke_tool(
        &mut perception,
        "get_spatial_analysis",
        &json!({}),
        0,
        &mut sink,
    )
    .unwrap();

    let clusters = analysis["clusters"].as_array().unwrap();
    assert_eq!(clusters.len(), 2);
    assert_eq!(clusters[0]["size"], json!(2));
}

#[test]
fn grid_resource_reports_occupied_cells() {
    let mut perception = PerceptionComponent::new("agent", PerceptionConfig::default());
    let world = StaticWorld::with(vec![
        entity("a", &["npc"], Vec3::new(2.0, 0.0, 0.0), Vec3::ZERO),
        entity("b", &["npc"], Vec3::new(3.0, 0.0, 0.0), Vec3::ZERO),
        entity("c", &["npc"], Vec3::new(35.0, 0.0, 0.0), Vec3::ZERO),
    ]);
    let mut sink = VecEventSink::default();

    perception.scan(0, &world, Vec3::ZERO);
    let grid = read_resource(&perception, "spatial_grid", 0, &mut sink).unwrap();
    assert_eq!(grid["occupied_cells"], json!(2));
}
