//! End-to-end tests for the profiling pipeline.
//!
//! These exercise load -> simplify -> analyse -> compare on synthetic
//! canal-like solids whose volumes and narrowings are known.

mod common;

use std::f64::consts::PI;
use std::io::Write;

use approx::assert_relative_eq;
use canal_profile::profile::percentile;
use canal_profile::{
    AnalysisError, AnalysisParams, AnalysisService, AnalyzeRequest, DecodingMeshSource,
    EarAnalyzer, MeshError, MeshFormat, MeshUpload, PlaneProjection, RequestError, ServiceConfig,
    SimplifyPolicy, SurfaceMeshSource, build_profile, compare, load_mesh, load_mesh_from_bytes,
};
use common::{
    barrel, cube, cylinder, hourglass, init_tracing, polygon_area, spindle, to_ascii_stl, to_obj,
    uv_sphere,
};
use nalgebra::{Isometry3, Rotation3, Translation3, UnitQuaternion, Vector3};
use tempfile::NamedTempFile;

#[test]
fn test_cylinder_volume_approaches_exact() {
    let (r, length, segments) = (3.0, 30.0, 128);
    let mesh = cylinder(r, length, 60, segments);
    let exact = PI * r * r * length;
    let params = AnalysisParams::default();

    let coarse = build_profile(&mesh, &params, 80).unwrap();
    let fine = build_profile(&mesh, &params, 120).unwrap();

    assert_relative_eq!(coarse.canal_length, length, epsilon = 1e-9);
    assert_relative_eq!(coarse.volume_total, exact, max_relative = 0.03);
    assert_relative_eq!(fine.volume_total, exact, max_relative = 0.03);
    // Never above the inscribed polygonal prism
    assert!(fine.volume_total <= polygon_area(r, segments) * length * (1.0 + 1e-9));
}

#[test]
fn test_curved_volume_error_shrinks_with_resolution() {
    let (length, k, segments) = (30.0, 0.3, 64);
    let mesh = spindle(length, k, 120, segments);
    let exact = polygon_area(k, segments) * length.powi(3) / 6.0;
    let params = AnalysisParams::default();

    let coarse = build_profile(&mesh, &params, 80).unwrap();
    let fine = build_profile(&mesh, &params, 120).unwrap();

    let coarse_err = (coarse.volume_total - exact).abs();
    let fine_err = (fine.volume_total - exact).abs();
    assert!(coarse_err / exact < 5e-3, "coarse error {coarse_err}");
    assert!(
        fine_err <= coarse_err,
        "error grew from {coarse_err} to {fine_err}"
    );
    // The trapezoid error scales with the step squared
    assert!(fine_err < 0.75 * coarse_err);
}

#[test]
fn test_barrel_isthmus_inside_window() {
    let mesh = barrel(24.0, 96, 48);
    let profile = build_profile(&mesh, &AnalysisParams::default(), 80).unwrap();

    let positions: Vec<f64> = profile.samples.iter().map(|x| x.s).collect();
    let low = percentile(&positions, 10.0);
    let high = percentile(&positions, 90.0);
    assert!(profile.isthmus_position > low && profile.isthmus_position < high);

    // The ends are narrower but excluded, so the isthmus sits at a window edge
    let norm = profile.isthmus_position_norm;
    assert!(!(0.15..=0.85).contains(&norm), "isthmus at {norm}");
}

#[test]
fn test_hourglass_isthmus_at_waist() {
    init_tracing();
    let mesh = hourglass(24.0, 96, 48);
    let result = EarAnalyzer::default().analyze(&mesh).unwrap();
    assert_relative_eq!(result.isthmus_position_norm, 0.5, epsilon = 0.01);
    assert_relative_eq!(result.canal_length_mm, 24.0, epsilon = 1e-9);
}

#[test]
fn test_split_volumes_sum_to_total() {
    let mesh = hourglass(20.0, 80, 40);
    let n_sections = 80;

    for split in [5.0, 35.0, 50.0, 65.0, 95.0] {
        let params = AnalysisParams::default().with_split_percentile(split);
        let result = EarAnalyzer::new(params).unwrap().analyze(&mesh).unwrap();

        let gap = result.volume_total_mm3 - result.volume_cartilaginous_mm3 - result.volume_bony_mm3;
        let max_area = result.samples.iter().map(|x| x.area).fold(0.0, f64::max);
        let step = result.canal_length_mm / (n_sections - 1) as f64;

        assert!(gap >= -1e-9, "split {split}: negative gap {gap}");
        assert!(gap <= max_area * step * 1.001, "split {split}: gap {gap}");
    }
}

#[test]
fn test_rigid_motion_invariance() {
    let mesh = hourglass(20.0, 60, 40);
    let params = AnalysisParams::default().with_projection(PlaneProjection::AxisFrame);
    let analyzer = EarAnalyzer::new(params).unwrap();
    let before = analyzer.analyze(&mesh).unwrap();

    let iso = Isometry3::from_parts(
        Translation3::new(12.0, -7.0, 3.5),
        UnitQuaternion::from_euler_angles(0.3, 1.1, -0.6),
    );
    let after = analyzer.analyze(&mesh.transformed(&iso)).unwrap();

    // End planes graze the caps, so one run may keep an end section the other drops
    assert_relative_eq!(after.volume_total_mm3, before.volume_total_mm3, max_relative = 0.02);
    assert_relative_eq!(after.canal_length_mm, before.canal_length_mm, max_relative = 1e-9);
    assert!(after.sections_used.abs_diff(before.sections_used) <= 2);
}

#[test]
fn test_coordinate_projection_invariant_about_z() {
    let mesh = hourglass(20.0, 60, 40);
    let analyzer = EarAnalyzer::default();
    let before = analyzer.analyze(&mesh).unwrap();

    let mut moved = mesh.clone();
    moved.rotate(&Rotation3::from_axis_angle(&Vector3::z_axis(), 0.7));
    moved.translate(Vector3::new(-4.0, 9.0, 2.0));
    let after = analyzer.analyze(&moved).unwrap();

    assert_relative_eq!(after.volume_total_mm3, before.volume_total_mm3, max_relative = 0.02);
    assert_relative_eq!(after.canal_length_mm, before.canal_length_mm, max_relative = 1e-9);
}

#[test]
fn test_coarse_sphere_yields_no_result() {
    let mesh = uv_sphere(8.0, 6, 4);
    let err = EarAnalyzer::default().analyze(&mesh).unwrap_err();
    match err {
        AnalysisError::InsufficientSections { found, required } => {
            assert!(found < required);
            assert_eq!(required, 10);
        }
        other => panic!("Expected InsufficientSections, got {other:?}"),
    }
}

#[test]
fn test_cube_yields_no_result() {
    let err = EarAnalyzer::default().analyze(&cube(10.0)).unwrap_err();
    assert!(matches!(err, AnalysisError::InsufficientSections { .. }));
}

#[test]
fn test_fine_sphere_profile() {
    let mesh = uv_sphere(8.0, 48, 64);
    let result = EarAnalyzer::default().analyze(&mesh).unwrap();
    let ball = 4.0 / 3.0 * PI * 512.0;
    assert!(result.volume_total_mm3 < ball);
    assert!(result.volume_total_mm3 > 0.95 * ball);
    assert!(result.a_norm.iter().any(|&a| a == 1.0));
}

#[test]
fn test_identical_uploads_compare_to_zero() {
    init_tracing();
    let stl = to_ascii_stl(&hourglass(20.0, 40, 32));
    let service = AnalysisService::from_config(ServiceConfig::default()).unwrap();
    let request = AnalyzeRequest::new(
        MeshUpload::new("right.stl", stl.clone()),
        MeshUpload::new("left.STL", stl),
    );

    let response = service.handle(&request).unwrap();
    let c = &response.comparison;
    for pct in [
        c.total_volume_diff_percent,
        c.cartilaginous_volume_diff_percent,
        c.bony_volume_diff_percent,
    ] {
        assert_relative_eq!(pct.unwrap(), 0.0, epsilon = 1e-9);
    }
    assert_relative_eq!(c.isthmus_shift_mm, 0.0, epsilon = 1e-9);
    assert_relative_eq!(c.isthmus_shift_norm.unwrap(), 0.0, epsilon = 1e-9);
    assert_relative_eq!(c.canal_length_diff_mm, 0.0, epsilon = 1e-9);

    let json = serde_json::to_value(&response).unwrap();
    for key in ["right", "left", "comparison"] {
        assert!(json.get(key).is_some(), "missing {key}");
    }
    assert!(json["comparison"]["istmo_shift_mm"].is_number());
}

#[test]
fn test_larger_left_ear() {
    let right = to_obj(&cylinder(3.0, 20.0, 20, 48));
    let left = to_obj(&cylinder(3.3, 22.0, 22, 48));
    let service = AnalysisService::from_config(ServiceConfig::default()).unwrap();

    let response = service
        .handle(&AnalyzeRequest::new(
            MeshUpload::new("r.obj", right),
            MeshUpload::new("l.obj", left),
        ))
        .unwrap();

    let expected = 100.0 * (1.1 * 1.1 * 1.1 - 1.0);
    let total = response.comparison.total_volume_diff_percent.unwrap();
    assert!((total - expected).abs() < 4.0, "total diff {total}% vs {expected}%");
    assert_relative_eq!(response.comparison.canal_length_diff_mm, 2.0, epsilon = 1e-4);
}

#[test]
fn test_missing_and_invalid_uploads() {
    let service = AnalysisService::from_config(ServiceConfig::default()).unwrap();

    let err = service.handle(&AnalyzeRequest::default()).unwrap_err();
    assert!(matches!(err, RequestError::MissingUpload));

    let err = service
        .handle(&AnalyzeRequest::new(
            MeshUpload::new("right.stl", b"not a mesh".to_vec()),
            MeshUpload::new("left.stl", to_ascii_stl(&cylinder(3.0, 20.0, 20, 32))),
        ))
        .unwrap_err();
    assert_eq!(err.status_code(), 400);
    assert!(matches!(err, RequestError::InvalidMesh { .. }));
}

#[test]
fn test_insufficient_side_is_client_error() {
    let service = AnalysisService::from_config(ServiceConfig::default()).unwrap();
    let err = service
        .handle(&AnalyzeRequest::new(
            MeshUpload::new("right.stl", to_ascii_stl(&cylinder(3.0, 20.0, 20, 32))),
            MeshUpload::new("left.stl", to_ascii_stl(&cube(10.0))),
        ))
        .unwrap_err();
    assert_eq!(err.status_code(), 400);
    assert_eq!(
        err.body().error,
        "Could not compute profiles (too few valid sections). Try less decimation or different mesh."
    );
}

#[test]
fn test_load_stl_file() {
    let mesh = hourglass(20.0, 40, 32);
    let mut file = NamedTempFile::with_suffix(".stl").unwrap();
    file.write_all(to_ascii_stl(&mesh).as_bytes()).unwrap();

    let loaded = load_mesh(file.path()).unwrap();
    assert_eq!(loaded.face_count(), mesh.face_count());
    assert_eq!(loaded.vertex_count(), mesh.vertex_count());

    let direct = EarAnalyzer::default().analyze(&mesh).unwrap();
    let from_file = EarAnalyzer::default().analyze(&loaded).unwrap();
    assert_relative_eq!(
        from_file.volume_total_mm3,
        direct.volume_total_mm3,
        max_relative = 0.02
    );
}

#[test]
fn test_load_obj_file() {
    let mesh = cylinder(2.0, 10.0, 10, 24);
    let mut file = NamedTempFile::with_suffix(".obj").unwrap();
    file.write_all(to_obj(&mesh).as_bytes()).unwrap();

    let loaded = load_mesh(file.path()).unwrap();
    assert_eq!(loaded.face_count(), mesh.face_count());
    assert_relative_eq!(loaded.enclosed_volume(), mesh.enclosed_volume(), max_relative = 1e-5);
}

#[test]
fn test_unsupported_extension() {
    let file = NamedTempFile::with_suffix(".3mf").unwrap();
    let err = load_mesh(file.path()).unwrap_err();
    assert!(matches!(err, MeshError::UnsupportedFormat { .. }));
    assert_eq!(err.code().as_str(), "CANAL-4001");
}

#[test]
fn test_simplified_mesh_keeps_volume() {
    init_tracing();
    let mesh = hourglass(20.0, 200, 64);
    let bytes = to_obj(&mesh);
    let source = DecodingMeshSource::new(SimplifyPolicy {
        enabled: true,
        ratio: 0.25,
        min_target_faces: 1000,
    });

    let decoded = source.decode(bytes.as_bytes(), MeshFormat::Obj).unwrap();
    let outcome = source.simplify(&decoded);
    assert!(outcome.is_simplified());
    let simplified = outcome.into_mesh(decoded.clone());
    assert!(simplified.face_count() < decoded.face_count());

    let full = EarAnalyzer::default().analyze(&decoded).unwrap();
    let reduced = EarAnalyzer::default().analyze(&simplified).unwrap();
    assert_relative_eq!(
        reduced.volume_total_mm3,
        full.volume_total_mm3,
        max_relative = 0.05
    );
}

#[test]
fn test_default_policy_leaves_small_meshes_alone() {
    let mesh = cylinder(3.0, 20.0, 20, 32);
    let bytes = to_ascii_stl(&mesh);
    let source = DecodingMeshSource::default();
    let loaded = source.load(bytes.as_bytes(), MeshFormat::Stl).unwrap();
    let decoded = load_mesh_from_bytes(bytes.as_bytes(), MeshFormat::Stl).unwrap();
    assert_eq!(loaded, decoded);
}

#[test]
fn test_compare_is_left_relative_to_right() {
    let analyzer = EarAnalyzer::default();
    let right = analyzer.analyze(&cylinder(3.0, 20.0, 20, 48)).unwrap();
    let left = analyzer.analyze(&cylinder(3.0, 30.0, 30, 48)).unwrap();

    let c = compare(&right, &left);
    assert!(c.total_volume_diff_percent.unwrap() > 0.0);
    assert_relative_eq!(c.canal_length_diff_mm, 10.0, epsilon = 1e-9);

    let reversed = compare(&left, &right);
    assert!(reversed.total_volume_diff_percent.unwrap() < 0.0);
    assert_relative_eq!(reversed.canal_length_diff_mm, -10.0, epsilon = 1e-9);
}
