#[cfg(test)]
mod bsp_tests {
    use glam::DVec3;
    use math::{BoundingBox, Plane, Polygon, ROUND_EPSILON};
    use pvs::{PvsOptions, RegionGraph, VisibilityMatrix, VisibilityStore, World, compute_pvs};

    use crate::{
        BspError, BspLeaf, BspNode, BspTree, IS_LEAF_MASK, LeafPvs, SuperLeafPolicy,
        create_super_leaves, store_pvs, sub_tree_faces_area,
    };

    fn rect(at: f64, y0: f64, y1: f64, z0: f64, z1: f64, facing: f64) -> Polygon {
        let poly = Polygon::from_vertices(vec![
            DVec3::new(at, y0, z0),
            DVec3::new(at, y1, z0),
            DVec3::new(at, y1, z1),
            DVec3::new(at, y0, z1),
        ]);
        if poly.plane.normal.x * facing < 0.0 {
            poly.mirror()
        } else {
            poly
        }
    }

    fn leaf(x0: f64, x1: f64, faces: Vec<usize>, portals: Vec<Polygon>, is_inner: bool) -> BspLeaf {
        BspLeaf {
            faces,
            portals,
            bb: BoundingBox::from_corners(DVec3::new(x0, 0.0, 0.0), DVec3::new(x1, 256.0, 256.0)),
            is_inner,
        }
    }

    /// Room A (leaf 0) below x = 256, room B (leaf 1) up to x = 512, solid
    /// rock (leaf 2) beyond. A window at x = 256 joins the rooms.
    fn two_rooms_and_rock() -> BspTree {
        let faces = vec![
            rect(512.0, 0.0, 10.0, 0.0, 10.0, -1.0),
            rect(512.0, 0.0, 20.0, 0.0, 20.0, 1.0),
        ];
        let nodes = vec![
            BspNode {
                plane: Plane::new(DVec3::X, 256.0),
                children: [1, IS_LEAF_MASK],
            },
            BspNode {
                plane: Plane::new(DVec3::X, 512.0),
                children: [2 | IS_LEAF_MASK, 1 | IS_LEAF_MASK],
            },
        ];
        let leaves = vec![
            leaf(
                0.0,
                256.0,
                Vec::new(),
                vec![rect(256.0, 64.0, 192.0, 0.0, 128.0, -1.0)],
                true,
            ),
            leaf(
                256.0,
                512.0,
                vec![0, 1],
                vec![rect(256.0, 64.0, 192.0, 0.0, 128.0, 1.0)],
                true,
            ),
            leaf(512.0, 768.0, vec![1], Vec::new(), false),
        ];
        BspTree::new(faces, nodes, leaves).unwrap()
    }

    #[test]
    fn test_what_leaf() {
        let tree = two_rooms_and_rock();
        assert_eq!(tree.what_leaf(DVec3::new(100.0, 50.0, 50.0)), 0);
        assert_eq!(tree.what_leaf(DVec3::new(300.0, 50.0, 50.0)), 1);
        assert_eq!(tree.what_leaf(DVec3::new(600.0, 50.0, 50.0)), 2);
        // On a plane counts as behind it
        assert_eq!(tree.what_leaf(DVec3::new(256.0, 50.0, 50.0)), 0);
    }

    #[test]
    fn test_clip_line_stops_at_solid() {
        let tree = two_rooms_and_rock();
        let start = DVec3::new(100.0, 50.0, 50.0);

        let clip = tree.clip_line(start, DVec3::new(500.0, 0.0, 0.0), 0.0, 1.0);
        assert!((clip - 412.0 / 500.0).abs() < 1e-12);

        let clear = tree.clip_line(start, DVec3::new(300.0, 0.0, 0.0), 0.0, 1.0);
        assert_eq!(clear, 1.0);
        assert_eq!(World::clip_line(&tree, start, DVec3::new(300.0, 0.0, 0.0)), 1.0);

        // Heading away from the rock
        let back = tree.clip_line(DVec3::new(400.0, 0.0, 0.0), DVec3::new(-300.0, 0.0, 0.0), 0.0, 1.0);
        assert_eq!(back, 1.0);

        // Starting inside the rock
        let inside = tree.clip_line(DVec3::new(600.0, 0.0, 0.0), DVec3::new(-300.0, 0.0, 0.0), 0.0, 1.0);
        assert_eq!(inside, 0.0);
    }

    #[test]
    fn test_single_leaf_tree() {
        let tree = BspTree::new(
            Vec::new(),
            Vec::new(),
            vec![leaf(0.0, 256.0, Vec::new(), Vec::new(), true)],
        )
        .unwrap();
        assert_eq!(tree.what_leaf(DVec3::splat(1.0e6)), 0);
        assert_eq!(tree.clip_line(DVec3::ZERO, DVec3::X, 0.0, 1.0), 1.0);

        let regions = create_super_leaves(&tree, &SuperLeafPolicy::default());
        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].leaves, vec![0]);
    }

    #[test]
    fn test_malformed_trees_are_rejected() {
        assert!(matches!(
            BspTree::new(Vec::new(), Vec::new(), Vec::new()),
            Err(BspError::NoLeaves)
        ));

        let one_leaf = || vec![leaf(0.0, 256.0, Vec::new(), Vec::new(), true)];
        let node = |children| BspNode {
            plane: Plane::new(DVec3::X, 0.0),
            children,
        };

        let result = BspTree::new(Vec::new(), vec![node([IS_LEAF_MASK, 1 | IS_LEAF_MASK])], one_leaf());
        assert!(matches!(
            result,
            Err(BspError::IndexOutOfRange {
                node: 0,
                kind: "leaf",
                index: 1,
                count: 1
            })
        ));

        let result = BspTree::new(Vec::new(), vec![node([0, IS_LEAF_MASK])], one_leaf());
        assert!(matches!(result, Err(BspError::NotATree { node: 0, child: 0 })));

        let result = BspTree::new(Vec::new(), vec![node([5, IS_LEAF_MASK])], one_leaf());
        assert!(matches!(
            result,
            Err(BspError::IndexOutOfRange { kind: "node", .. })
        ));

        let mut leaves = one_leaf();
        leaves[0].faces.push(3);
        let result = BspTree::new(Vec::new(), vec![node([IS_LEAF_MASK, IS_LEAF_MASK])], leaves);
        assert!(matches!(
            result,
            Err(BspError::FaceOutOfRange {
                leaf: 0,
                face: 3,
                count: 0
            })
        ));
    }

    #[test]
    fn test_every_leaf_is_a_super_leaf_by_default() {
        let tree = two_rooms_and_rock();
        let regions = create_super_leaves(&tree, &SuperLeafPolicy::default());

        // Front subtrees first
        let leaves: Vec<Vec<usize>> = regions.iter().map(|r| r.leaves.clone()).collect();
        assert_eq!(leaves, vec![vec![2], vec![1], vec![0]]);
        assert_eq!(regions[1].portals.len(), 1);
        assert_eq!(regions[2].bb, tree.leaf(0).bb);
    }

    #[test]
    fn test_deep_subtrees_are_merged() {
        let tree = two_rooms_and_rock();
        let policy = SuperLeafPolicy {
            max_recursion_depth: 0,
            ..SuperLeafPolicy::default()
        };
        let regions = create_super_leaves(&tree, &policy);

        assert_eq!(regions.len(), 2);
        assert_eq!(regions[0].leaves, vec![2, 1]);
        assert_eq!(regions[0].portals.len(), 1);
        assert_eq!(regions[0].bb.min, DVec3::new(256.0, 0.0, 0.0));
        assert_eq!(regions[0].bb.max, DVec3::new(768.0, 256.0, 256.0));
        assert_eq!(regions[1].leaves, vec![0]);
    }

    #[test]
    fn test_small_subtrees_are_merged() {
        let tree = two_rooms_and_rock();
        // Shared faces count once
        assert!((sub_tree_faces_area(&tree, 1) - 500.0).abs() < 1e-9);

        let policy = SuperLeafPolicy {
            min_sub_tree_faces_area: 1000.0,
            ..SuperLeafPolicy::default()
        };
        assert_eq!(create_super_leaves(&tree, &policy).len(), 2);

        let policy = SuperLeafPolicy {
            min_sub_tree_faces_area: 100.0,
            ..SuperLeafPolicy::default()
        };
        assert_eq!(create_super_leaves(&tree, &policy).len(), 3);
    }

    #[test]
    fn test_store_pvs_expands_to_inner_leaves() {
        let tree = two_rooms_and_rock();
        let policy = SuperLeafPolicy {
            max_recursion_depth: 0,
            ..SuperLeafPolicy::default()
        };
        let regions = create_super_leaves(&tree, &policy);

        let mut matrix = VisibilityMatrix::new(regions.len());
        for a in 0..2 {
            for b in 0..2 {
                matrix.flag_visible(a, b);
            }
        }
        let pvs = store_pvs(&tree, &regions, &matrix);
        assert_eq!(pvs.leaf_count(), 3);
        assert_eq!(pvs.words(), &[0b11011]);
        assert_eq!(pvs.checksum(), 27);
        assert_eq!(pvs.size_in_bytes(), 4);
        assert!(!pvs.can_see(2, 2));

        // Seen from one side only does not count
        let mut matrix = VisibilityMatrix::new(regions.len());
        matrix.flag_visible(0, 0);
        matrix.flag_visible(1, 1);
        matrix.flag_visible(0, 1);
        let pvs = store_pvs(&tree, &regions, &matrix);
        assert_eq!(pvs.words(), &[0b10001]);
        assert_eq!(pvs.checksum(), 17);
    }

    #[test]
    fn test_checksum_adds_bytes() {
        let path = std::env::temp_dir().join(format!("bsp_checksum_{}.pvs", std::process::id()));
        let mut data = b"PVS2".to_vec();
        data.extend_from_slice(&6u64.to_le_bytes());
        data.extend_from_slice(&2u64.to_le_bytes());
        data.extend_from_slice(&0x0102_0304u32.to_le_bytes());
        data.extend_from_slice(&0xFF00_0000u32.to_le_bytes());
        std::fs::write(&path, data).unwrap();

        let pvs = LeafPvs::load_from_file(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(pvs.checksum(), 10 + 255);
    }

    #[test]
    fn test_pvs_file_round_trip() {
        let tree = two_rooms_and_rock();
        let regions = create_super_leaves(&tree, &SuperLeafPolicy::default());
        let mut matrix = VisibilityMatrix::new(regions.len());
        matrix.flag_mutual(1, 2);
        matrix.flag_visible(1, 1);
        let pvs = store_pvs(&tree, &regions, &matrix);

        let path = std::env::temp_dir().join(format!("bsp_round_trip_{}.pvs", std::process::id()));
        pvs.save_to_file(&path).unwrap();
        let loaded = LeafPvs::load_from_file(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(loaded, pvs);
        assert!(loaded.can_see(0, 1));
        assert!(loaded.can_see(1, 1));
        assert!(!loaded.can_see(0, 0));
    }

    #[test]
    fn test_broken_pvs_files_are_rejected() {
        let path = std::env::temp_dir().join(format!("bsp_broken_{}.pvs", std::process::id()));

        std::fs::write(&path, b"PVS1\0\0\0\0\0\0\0\0").unwrap();
        assert!(matches!(
            LeafPvs::load_from_file(&path),
            Err(BspError::InvalidFormat)
        ));

        let mut data = b"PVS2".to_vec();
        data.extend_from_slice(&3u64.to_le_bytes());
        data.extend_from_slice(&5u64.to_le_bytes());
        std::fs::write(&path, &data).unwrap();
        assert!(matches!(
            LeafPvs::load_from_file(&path),
            Err(BspError::SizeMismatch {
                leaves: 3,
                words: 5,
                expected: 1
            })
        ));

        let mut data = b"PVS2".to_vec();
        data.extend_from_slice(&3u64.to_le_bytes());
        data.extend_from_slice(&1u64.to_le_bytes());
        data.extend_from_slice(&[0, 0]);
        std::fs::write(&path, &data).unwrap();
        assert!(matches!(
            LeafPvs::load_from_file(&path),
            Err(BspError::Truncated {
                expected: 24,
                found: 22
            })
        ));

        // A huge header over a short file must not be allocated for
        let mut data = b"PVS2".to_vec();
        data.extend_from_slice(&1_000_000u64.to_le_bytes());
        data.extend_from_slice(&31_250_000_000u64.to_le_bytes());
        data.extend_from_slice(&[0; 16]);
        std::fs::write(&path, &data).unwrap();
        assert!(matches!(
            LeafPvs::load_from_file(&path),
            Err(BspError::Truncated {
                expected: 125_000_000_020,
                found: 36
            })
        ));

        let missing = std::env::temp_dir().join(format!("bsp_missing_{}.pvs", std::process::id()));
        assert!(matches!(
            LeafPvs::load_from_file(&missing),
            Err(BspError::Io(_))
        ));

        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_full_build_on_tree() {
        let tree = two_rooms_and_rock();
        let regions = create_super_leaves(&tree, &SuperLeafPolicy::default());
        let graph = RegionGraph::new(regions, ROUND_EPSILON).unwrap();
        assert_eq!(graph.neighbour_edge_count(), 2);

        let (matrix, stats) = compute_pvs(&graph, Some(&tree), &PvsOptions::default());
        assert_eq!(stats.presampled_pairs, 0);
        assert!(matrix.is_visible(1, 2));
        assert!(!matrix.is_visible(0, 1));

        let pvs = store_pvs(&tree, graph.regions(), &matrix);
        assert!(pvs.can_see(0, 1));
        assert!(pvs.can_see(1, 0));
        assert!(pvs.can_see(0, 0));
        assert!(!pvs.can_see(0, 2));
        assert!(!pvs.can_see(2, 2));
    }
}
