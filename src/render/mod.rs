mod camera;

pub use camera::{
    fit_bounds, fit_camera, CameraState, OrbitController, DEFAULT_DAMPING, FIT_HEADROOM,
    MAX_FIT_DISTANCE, MIN_FIT_DISTANCE,
};
