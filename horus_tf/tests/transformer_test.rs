// Integration tests for the Transformer request API

use approx::assert_relative_eq;
use horus_core::RuntimeParams;
use horus_tf::geodetic::ll_to_utm;
use horus_tf::{
    create_shared_tree, publish_transforms, timestamp_now, Pose, PoseStamped, ReferenceStamped,
    SharedTFTree, Transform, TransformError, TransformRequest, TransformStamped, Transformer,
    TransformerConfig, LATLON_ORIGIN,
};
use std::f64::consts::FRAC_PI_2;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

fn uav1_transformer(tree: &SharedTFTree) -> Transformer {
    Transformer::new(
        TransformerConfig::new("test_node").with_uav_name("uav1"),
        tree.clone(),
    )
    .unwrap()
}

/// uav1/local_origin -> uav1/fcu moving along x at 1 m/s, sampled every second
fn publish_flight(tree: &SharedTFTree) {
    let samples: Vec<_> = (0..5u64)
        .map(|s| {
            TransformStamped::new(
                "uav1/local_origin",
                "uav1/fcu",
                s * 1_000_000_000,
                Transform::from_translation([s as f64, 0.0, 2.0]),
            )
        })
        .collect();
    publish_transforms(tree, &samples, false).unwrap();
}

#[test]
fn test_identity_request() {
    let tree = create_shared_tree();
    let transformer = uav1_transformer(&tree);

    let pose = PoseStamped::new("fcu", 123, Pose::from_position_yaw([1.0, 2.0, 3.0], 0.5));
    let out = transformer.transform_pose(&pose, "uav1/fcu").unwrap();

    assert_eq!(out.header.frame_id, "uav1/fcu");
    assert_eq!(out.header.stamp, 123);
    assert_eq!(out.pose, pose.pose);
}

#[test]
fn test_control_frame_and_namespacing() {
    let tree = create_shared_tree();
    publish_flight(&tree);
    let transformer = uav1_transformer(&tree);
    transformer.set_current_control_frame("uav1/fcu");

    // Empty frame is the control frame, bare target gets the namespace
    let request = TransformRequest::new("", "local_origin", 2_500_000_000, Pose::default());
    let out = transformer.transform(&request).unwrap();

    assert_eq!(out.header.frame_id, "uav1/local_origin");
    assert_eq!(out.header.stamp, 2_500_000_000);
    assert_relative_eq!(out.pose.position[0], 2.5, epsilon = 1e-9);
    assert_relative_eq!(out.pose.position[2], 2.0, epsilon = 1e-9);
}

#[test]
fn test_empty_frame_without_control_frame() {
    let tree = create_shared_tree();
    publish_flight(&tree);
    let transformer = uav1_transformer(&tree);

    let request = TransformRequest::new("", "local_origin", 0, Pose::default());
    assert_eq!(
        transformer.try_transform(&request),
        Err(TransformError::MissingControlFrame)
    );
    assert!(transformer.transform(&request).is_none());
}

#[test]
fn test_other_vehicle_frames_are_kept() {
    let tree = create_shared_tree();
    let transformer = uav1_transformer(&tree);

    assert_eq!(transformer.resolve_frame_name("uav2/fcu"), "uav2/fcu");
    assert_eq!(transformer.resolve_frame_name("gps_origin"), "uav1/gps_origin");
    assert_eq!(
        horus_tf::namespace_prefix(&transformer.resolve_frame_name("gps_origin")),
        "uav1"
    );
}

#[test]
fn test_fallback_is_stamped_with_retrieval_time() {
    let tree = create_shared_tree();
    publish_flight(&tree);
    let transformer = uav1_transformer(&tree);

    let before = timestamp_now();
    // Far past the buffered range: served from the latest sample
    let tf = transformer
        .get_transform("fcu", "local_origin", 60_000_000_000)
        .unwrap();

    assert_eq!(tf.from(), "uav1/fcu");
    assert_eq!(tf.to(), "uav1/local_origin");
    assert_eq!(tf.requested_stamp(), 60_000_000_000);
    assert_eq!(tf.store_stamp(), Some(4_000_000_000));
    assert!(tf.resolved_stamp() >= before);
    assert_relative_eq!(tf.transform().unwrap().translation[0], 4.0, epsilon = 1e-9);
}

#[test]
fn test_cache_timeout_rejects_stale_fallback() {
    let tree = create_shared_tree();
    publish_flight(&tree);
    let transformer = Transformer::new(
        TransformerConfig::new("test_node")
            .with_uav_name("uav1")
            .with_cache_timeout(Duration::from_millis(100)),
        tree.clone(),
    )
    .unwrap();

    assert!(transformer
        .get_transform("fcu", "local_origin", 60_000_000_000)
        .is_none());
    assert!(transformer
        .get_transform("fcu", "local_origin", 1_000_000_000)
        .is_some());
}

#[test]
fn test_missing_utm_zone() {
    let tree = create_shared_tree();
    let transformer = uav1_transformer(&tree);

    let pose = PoseStamped::new("utm_origin", 0, Pose::default());
    let request = TransformRequest::from_pose(&pose, LATLON_ORIGIN);
    assert_eq!(
        transformer.try_transform(&request),
        Err(TransformError::MissingUtmZone)
    );
}

/// utm_origin -> local_origin static at the anchor, local_origin -> fcu known only at 1 s
fn geodetic_tree() -> (SharedTFTree, Transformer) {
    let tree = create_shared_tree();
    let anchor = ll_to_utm(50.0, 14.4);
    {
        let mut tree = tree.write();
        tree.set_static_transform(
            "uav1/utm_origin",
            "uav1/local_origin",
            Transform::from_translation([anchor.easting, anchor.northing, 0.0]),
        )
        .unwrap();
        tree.set_transform(
            "uav1/local_origin",
            "uav1/fcu",
            Transform::from_translation([10.0, 0.0, 0.0]),
            1_000_000_000,
        )
        .unwrap();
    }

    let transformer = uav1_transformer(&tree);
    transformer.set_current_lat_lon(50.0, 14.4);
    (tree, transformer)
}

#[test]
fn test_geodetic_source_to_body_frame() {
    let (_tree, transformer) = geodetic_tree();

    let pose = PoseStamped::new(
        LATLON_ORIGIN,
        7_000_000_000,
        Pose::new([50.0, 14.4, 0.0], [0.0, 0.0, 0.0, 1.0]),
    );
    let out = transformer.transform_pose(&pose, "fcu").unwrap();

    assert_eq!(out.header.frame_id, "uav1/fcu");
    assert_eq!(out.header.stamp, 7_000_000_000);
    assert_relative_eq!(out.pose.position[0], -10.0, epsilon = 1e-6);
    assert_relative_eq!(out.pose.position[1], 0.0, epsilon = 1e-6);
}

#[test]
fn test_geodetic_target_from_body_frame() {
    let (_tree, transformer) = geodetic_tree();

    let pose = PoseStamped::new(
        "fcu",
        1_000_000_000,
        Pose::new([-10.0, 0.0, 3.0], [0.0, 0.0, 0.0, 1.0]),
    );
    let out = transformer.transform_pose(&pose, LATLON_ORIGIN).unwrap();

    assert_eq!(out.header.frame_id, "uav1/latlon_origin");
    assert_relative_eq!(out.pose.position[0], 50.0, epsilon = 1e-6);
    assert_relative_eq!(out.pose.position[1], 14.4, epsilon = 1e-6);
    assert_relative_eq!(out.pose.position[2], 3.0, epsilon = 1e-9);
}

#[test]
fn test_transform_reference_rotates_heading() {
    let tree = create_shared_tree();
    tree.write()
        .set_static_transform(
            "uav1/world",
            "uav1/fcu",
            Transform::from_translation_yaw([1.0, 0.0, 0.0], FRAC_PI_2),
        )
        .unwrap();
    let transformer = uav1_transformer(&tree);

    let reference = ReferenceStamped::new("fcu", 10, [1.0, 0.0, 0.0], 0.0);
    let out = transformer.transform_reference(&reference, "world").unwrap();

    assert_eq!(out.header.frame_id, "uav1/world");
    assert_relative_eq!(out.reference.position[0], 1.0, epsilon = 1e-9);
    assert_relative_eq!(out.reference.position[1], 1.0, epsilon = 1e-9);
    assert_relative_eq!(out.reference.heading, FRAC_PI_2, epsilon = 1e-9);
}

#[test]
fn test_transform_with_prefetched() {
    let tree = create_shared_tree();
    publish_flight(&tree);
    let transformer = uav1_transformer(&tree);

    let tf = transformer
        .get_transform("fcu", "local_origin", 1_000_000_000)
        .unwrap();

    let pose = PoseStamped::new("fcu", 1_000_000_000, Pose::default());
    let out = transformer.transform_with(&tf, &pose).unwrap();
    assert_eq!(out.header.frame_id, "uav1/local_origin");
    assert_relative_eq!(out.pose.position[0], 1.0, epsilon = 1e-9);

    let wrong = PoseStamped::new("uav2/fcu", 1_000_000_000, Pose::default());
    assert!(matches!(
        transformer.try_transform_with(&tf, &wrong),
        Err(TransformError::FrameMismatch { .. })
    ));
}

#[test]
fn test_uninitialized_transformer() {
    let transformer = Transformer::default();
    transformer.set_current_control_frame("uav1/fcu");

    let request = TransformRequest::new("", "uav1/fcu", 0, Pose::default());
    assert_eq!(
        transformer.try_transform(&request),
        Err(TransformError::NotInitialized)
    );
    assert!(transformer.get_transform("a", "b", 0).is_none());
}

#[test]
fn test_config_from_params() {
    let params = RuntimeParams::from_yaml_str("node_name: tracker\nuav_name: uav1\n").unwrap();
    let config = TransformerConfig::from_params(&params).unwrap();

    let tree = create_shared_tree();
    publish_flight(&tree);
    let transformer = Transformer::new(config, tree).unwrap();

    assert_eq!(transformer.config().node_name, "tracker");
    assert!(transformer
        .get_transform("fcu", "local_origin", 0)
        .is_some());
}

#[test]
fn test_transforms_from_json() {
    let json = r#"{
        "header": { "frame_id": "uav1/local_origin", "stamp": 5 },
        "child_frame_id": "uav1/garmin",
        "transform": { "translation": [0.0, 0.0, -0.1], "rotation": [0.0, 0.0, 0.0, 1.0] }
    }"#;
    let msg: TransformStamped = serde_json::from_str(json).unwrap();

    let tree = create_shared_tree();
    publish_transforms(&tree, &[msg], true).unwrap();
    let transformer = uav1_transformer(&tree);

    let pose = PoseStamped::new("garmin", 5, Pose::default());
    let out = transformer.transform_pose(&pose, "local_origin").unwrap();
    assert_relative_eq!(out.pose.position[2], -0.1, epsilon = 1e-12);
}

#[test]
fn test_concurrent_requests() {
    let tree = create_shared_tree();
    publish_flight(&tree);
    let transformer = Arc::new(uav1_transformer(&tree));
    transformer.set_current_control_frame("uav1/fcu");

    let mut handles = Vec::new();

    for _ in 0..4 {
        let transformer = Arc::clone(&transformer);
        handles.push(thread::spawn(move || {
            for i in 0..200u64 {
                let request =
                    TransformRequest::new("", "local_origin", i * 10_000_000, Pose::default());
                assert!(transformer.transform(&request).is_some());
            }
        }));
    }

    {
        let transformer = Arc::clone(&transformer);
        handles.push(thread::spawn(move || {
            for i in 0..200 {
                transformer.set_current_lat_lon(50.0 + i as f64 * 1e-4, 14.4);
                transformer.set_current_control_frame("uav1/fcu");
            }
        }));
    }

    {
        let tree = tree.clone();
        handles.push(thread::spawn(move || {
            for s in 5..50u64 {
                publish_transforms(
                    &tree,
                    &[TransformStamped::new(
                        "uav1/local_origin",
                        "uav1/fcu",
                        s * 1_000_000_000,
                        Transform::from_translation([s as f64, 0.0, 2.0]),
                    )],
                    false,
                )
                .unwrap();
            }
        }));
    }

    for handle in handles {
        handle.join().unwrap();
    }

    let copy = transformer.snapshot();
    assert_eq!(copy.current_control_frame().as_deref(), Some("uav1/fcu"));
    assert!(copy.current_utm_zone().is_some());
}
