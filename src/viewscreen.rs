//! The virtual camera: converts a screen pixel into physical initial
//! conditions for a geodesic.
//!
//! The construction uses the asymptotic Kerr conserved quantities of
//! Cunningham & Bardeen (1973): impact parameters (alpha, beta) on the
//! screen map to the Carter constant and azimuthal angular momentum, which
//! fix the covariant photon momentum; the inverse metric at the camera then
//! raises it. Exact only in asymptotically Kerr geometries; elsewhere the
//! initial conditions are sensible but approximate.

use log::warn;

use crate::mesh::Mesh;
use crate::metric::Metric;
use crate::tensor::{LargeCounter, OneIndex, Point, ScreenIndex, ScreenPoint};

/// Kind of geodesic being launched. Only null rays are supported; the other
/// kinds are declared for configuration completeness and coerced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GeodesicType {
    #[default]
    Null,
    Timelike,
    Spacelike,
}

/// The camera plus the mesh that drives its pixel schedule.
pub struct ViewScreen {
    position: Point,
    direction: OneIndex,
    screen_size: ScreenPoint,
    screen_center: ScreenPoint,
    mesh: Mesh,
}

impl ViewScreen {
    /// The only supported direction is radially inward, (0, -1, 0, 0); any
    /// other value is coerced with a warning. Likewise only null geodesics
    /// are integrated.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        position: Point,
        direction: OneIndex,
        screen_size: ScreenPoint,
        screen_center: ScreenPoint,
        geodesic_type: GeodesicType,
        mesh: Mesh,
        metric: &Metric,
    ) -> Self {
        let inward = OneIndex::new([0.0, -1.0, 0.0, 0.0]);
        if direction != inward {
            warn!(
                "only a radially inward-looking camera is supported; direction {direction} replaced by {inward}"
            );
        }
        if geodesic_type != GeodesicType::Null {
            warn!("only null geodesics are supported; integrating null geodesics");
        }

        // The momentum construction raises indices with p_r = 0; if the
        // inverse metric carries g^{r nu} cross terms that is only
        // approximate.
        let g_uu = metric.metric_uu(&position);
        if g_uu[1][0] != 0.0 || g_uu[1][2] != 0.0 || g_uu[1][3] != 0.0 {
            warn!(
                "inverse metric has g^(r a) cross terms at the camera position; initial conditions will not be strictly correct"
            );
        }

        Self {
            position,
            direction: inward,
            screen_size,
            screen_center,
            mesh,
        }
    }

    /// Initial conditions for queue slot `index` of the current iteration.
    /// Read-only; safe to call from worker threads.
    pub fn initial_conditions_for(
        &self,
        index: LargeCounter,
        metric: &Metric,
    ) -> (Point, OneIndex, ScreenIndex) {
        let (unit, screen_index) = self.mesh.next(index);

        // Impact parameters: alpha spans [-S_x/2, S_x/2] plus the center
        // offset, beta likewise.
        let alpha = self.screen_size.x * (unit.x - 0.5) + self.screen_center.x;
        let beta = self.screen_size.y * (unit.y - 0.5) + self.screen_center.y;

        let cos0 = self.position[2].cos();
        let sin0 = self.position[2].sin();

        // Conserved quantities with q = Q/E^2 and lambda = L_z/E; the
        // photon energy scale is irrelevant and set to 1.
        let q = beta * beta + (alpha * alpha - 1.0) * cos0 * cos0;
        let lambda = -alpha * sin0;
        let energy = 1.0;

        let mut p_down = OneIndex::zero();
        p_down[0] = -energy;
        p_down[3] = lambda * energy;
        p_down[2] = sign(beta)
            * energy
            * (q - lambda * lambda * cos0 * cos0 / (sin0 * sin0) + cos0 * cos0).sqrt();

        // Raise with the inverse metric at the camera; p_r = 0 leaves the
        // radial velocity to the null condition, with the sign forcing
        // ingoing rays.
        let g_uu = metric.metric_uu(&self.position);
        let mut vel = OneIndex::zero();
        for i in 0..4 {
            vel[0] += g_uu[0][i] * p_down[i];
            vel[2] += g_uu[2][i] * p_down[i];
            vel[3] += g_uu[3][i] * p_down[i];
        }
        vel[1] = -(-g_uu[1][1] * (vel[0] * p_down[0] + vel[2] * p_down[2] + vel[3] * p_down[3]))
            .sqrt();

        (self.position, vel, screen_index)
    }

    pub fn finished(&self) -> bool {
        self.mesh.finished()
    }

    pub fn current_count(&self) -> LargeCounter {
        self.mesh.current_count()
    }

    pub fn geodesic_finished(&mut self, index: LargeCounter, final_values: Vec<f64>) {
        self.mesh.geodesic_finished(index, final_values);
    }

    pub fn end_current_loop(&mut self) {
        self.mesh.end_current_loop();
    }

    pub fn description(&self) -> String {
        format!(
            "ViewScreen (position: {}, direction: {}, screen size: ({}, {}), screen center: ({}, {})); {}",
            self.position,
            self.direction,
            self.screen_size.x,
            self.screen_size.y,
            self.screen_center.x,
            self.screen_center.y,
            self.mesh.description()
        )
    }

    /// Access to the mesh (test and inspection hook).
    pub fn mesh(&self) -> &Mesh {
        &self.mesh
    }
}

fn sign(x: f64) -> f64 {
    if x > 0.0 {
        1.0
    } else if x < 0.0 {
        -1.0
    } else {
        0.0
    }
}
