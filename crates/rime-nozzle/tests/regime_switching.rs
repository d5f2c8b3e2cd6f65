//! Regime tracking and initial-condition interpolation over whole walls.

use rime_core::{WallProfile, gradient};
use rime_nozzle::{
    Branch, IsentropicGas, NozzleError, RootConfig, area_mach_residual, solve_profile,
};

/// Two converging-diverging sections, the first throat being the narrowest.
fn double_throat_wall() -> WallProfile {
    let x: Vec<f64> = (0..=100).map(|i| i as f64 * 0.01).collect();
    let y: Vec<f64> = x
        .iter()
        .map(|&v| 0.015 + 0.005 * (4.0 * std::f64::consts::PI * v).cos() + 0.002 * v)
        .collect();
    WallProfile::new(x, y).unwrap()
}

#[test]
fn regime_flips_once_each_way_after_second_contraction() {
    let wall = double_throat_wall();
    let gas = IsentropicGas::default();
    let profile = solve_profile(&wall, &gas, &RootConfig::default()).unwrap();

    let area = wall.area();
    let d_area = gradient(&area, wall.x()).unwrap();
    let throat = profile.throat_index;
    assert!(throat < 50, "global throat should be the first minimum");

    let first_negative = (throat + 1..area.len())
        .find(|&i| d_area[i] < 0.0)
        .expect("second contraction exists");
    let first_positive_after = (first_negative + 1..area.len())
        .find(|&i| d_area[i] > 0.0)
        .expect("second expansion exists");

    assert_eq!(profile.transitions.len(), 2);
    let down = profile.transitions[0];
    assert_eq!(down.index, first_negative);
    assert_eq!((down.from, down.to), (Branch::Supersonic, Branch::Subsonic));
    let up = profile.transitions[1];
    assert_eq!(up.index, first_positive_after);
    assert_eq!((up.from, up.to), (Branch::Subsonic, Branch::Supersonic));

    // The switching point itself is still solved on the old regime.
    assert_eq!(profile.branch[first_negative], Branch::Supersonic);
    assert_eq!(profile.branch[first_negative + 1], Branch::Subsonic);
    assert!(profile.mach[first_negative + 1] < 1.0);
    assert!(profile.mach[first_positive_after + 1] > 1.0);

    for (i, (&m, &ratio)) in profile.mach.iter().zip(&profile.area_ratio).enumerate() {
        let rel = area_mach_residual(m, ratio, gas.gamma()).abs() / ratio;
        assert!(rel < 1e-6, "point {i}: relative residual {rel}");
    }
}

#[test]
fn upstream_of_throat_is_always_subsonic() {
    let profile =
        solve_profile(&double_throat_wall(), &IsentropicGas::default(), &RootConfig::default())
            .unwrap();
    for i in 0..=profile.throat_index {
        assert_eq!(profile.branch[i], Branch::Subsonic);
        assert!(profile.mach[i] <= 1.0);
    }
}

#[test]
fn root_failure_names_point_and_branch() {
    let wall = WallProfile::from_pairs(&[(0.0, 0.02), (0.5, 0.01), (1.0, 0.03)]).unwrap();
    let config = RootConfig {
        max_iterations: 0,
        max_bisection_iters: 0,
        ..RootConfig::default()
    };
    let err = solve_profile(&wall, &IsentropicGas::default(), &config).unwrap_err();
    match err {
        NozzleError::NonConvergence {
            index,
            area_ratio,
            branch,
        } => {
            assert_eq!(index, Some(0));
            assert!((area_ratio - 2.0).abs() < 1e-12);
            assert_eq!(branch, Branch::Subsonic);
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn closed_throat_is_rejected() {
    let wall = WallProfile::from_pairs(&[(0.0, 0.02), (0.5, 0.0), (1.0, 0.03)]).unwrap();
    let err = solve_profile(&wall, &IsentropicGas::default(), &RootConfig::default()).unwrap_err();
    assert!(matches!(err, NozzleError::InvalidInput { .. }));
}

#[test]
fn cell_centres_outside_wall_samples_take_end_values() {
    let wall = WallProfile::from_pairs(&[(0.0, 0.02), (0.5, 0.01), (1.0, 0.02)]).unwrap();
    let profile = solve_profile(&wall, &IsentropicGas::default(), &RootConfig::default()).unwrap();

    let ic = profile.interpolate_onto(&[-0.1, 0.25, 1.2]).unwrap();
    assert_eq!(ic.pressure_pa[0], profile.pressure_pa[0]);
    assert_eq!(ic.mach[2], profile.mach[2]);
    let mid = 0.5 * (profile.temperature_k[0] + profile.temperature_k[1]);
    assert!((ic.temperature_k[1] - mid).abs() < 1e-9);
    assert_eq!(ic.velocity_mps.len(), 3);
}
