use ball2d::{
    BallState, LeesEdwards, PlanarPortal, SimConfig, Simulation, StaticPlane, glam::DVec2,
    logging,
};

pub const EPS: f64 = 1.0e-9;

pub fn calc_vec_err(a: DVec2, b: DVec2) -> f64 {
    a.distance(b)
}

pub fn init_for_test() {
    logging::init_for_tests();
}

/// Two unit balls at `(-2, 0)` and `(2, 0)` closing at unit speed.
pub fn head_on_pair() -> BallState {
    BallState::new(
        vec![DVec2::new(-2.0, 0.0), DVec2::new(2.0, 0.0)],
        vec![DVec2::new(1.0, 0.0), DVec2::new(-1.0, 0.0)],
        vec![1.0; 2],
        vec![1.0; 2],
    )
    .unwrap()
}

/// Periodic in `y` with the identified planes at `y = -5` and `y = 5`.
pub fn vertical_portal(shear_speed: Option<f64>) -> PlanarPortal {
    let bottom = StaticPlane::new(DVec2::new(0.0, -5.0), DVec2::Y).unwrap();
    let top = StaticPlane::new(DVec2::new(0.0, 5.0), DVec2::NEG_Y).unwrap();
    match shear_speed {
        Some(speed) => PlanarPortal::new_lees_edwards(
            bottom,
            top,
            LeesEdwards {
                speed,
                bounds: 0.0,
            },
        )
        .unwrap(),
        None => PlanarPortal::new(bottom, top).unwrap(),
    }
}

pub fn simulation(state: BallState, config: SimConfig) -> Simulation {
    init_for_test();
    Simulation::new_with_config(state, config)
}
