//! Per-pair force and exposure terms.
//!
//! Everything here is a pure function of pre-tick state. Degenerate
//! geometry (coincident agents, zero relative displacement) contributes
//! nothing instead of producing non-finite values.

use glam::Vec3;

use crate::agent::Agent;
use crate::params::{InfectionParams, SimParams};

/// Pull towards the desired velocity over the relaxation time.
pub fn driving_force(agent: &Agent, relaxation_time: f32) -> Vec3 {
    (agent.desired_velocity() - agent.velocity) / relaxation_time
}

/// Elliptical social-force repulsion exerted on agent `i` by agent `j`.
pub fn interaction_force(
    position_i: Vec3,
    velocity_i: Vec3,
    position_j: Vec3,
    velocity_j: Vec3,
    dt: f32,
    params: &SimParams,
) -> Vec3 {
    let eps = params.separation_epsilon;
    let r = position_i - position_j;
    let y = (velocity_j - velocity_i) * dt;
    let r_minus_y = r - y;
    let r_len = r.length();
    let r_minus_y_len = r_minus_y.length();
    // Negated comparisons also reject NaN.
    if !(r_len > eps && r_minus_y_len > eps) {
        return Vec3::ZERO;
    }

    let sum = r_len + r_minus_y_len;
    // Non-negative by the triangle inequality, up to rounding.
    let b = 0.5 * (sum * sum - y.length_squared()).max(0.0).sqrt();
    if !(b > eps) {
        return Vec3::ZERO;
    }

    let magnitude = params.interaction_strength * (-b / params.interaction_range).exp() * sum
        / (2.0 * b);
    let force = (r / r_len + r_minus_y / r_minus_y_len) * magnitude;
    if force.is_finite() { force } else { Vec3::ZERO }
}

/// Exposure of agent `i` to a more infectious neighbour `j` at `distance`.
pub fn exposure(
    distance: f32,
    infectivity_i: f32,
    infectivity_j: f32,
    params: &InfectionParams,
    eps: f32,
) -> f32 {
    if !(distance > eps && distance < params.range) {
        return 0.0;
    }
    let gradient = (infectivity_j - infectivity_i).max(0.0);
    if gradient == 0.0 {
        return 0.0;
    }
    (-distance / params.range).exp() * gradient / (distance * distance)
}

/// Time derivatives `(d infectivity, d immunity)` given the summed exposure.
pub fn infection_rates(
    infectivity: f32,
    immunity: f32,
    exposure: f32,
    params: &InfectionParams,
) -> (f32, f32) {
    let sq = infectivity * infectivity;
    let saturation = sq / (1.0 + sq);
    let d_infectivity =
        exposure + infectivity * (1.0 - infectivity) - params.suppression * saturation * immunity;
    let d_immunity =
        params.immunity_gain * saturation * immunity + params.immunity_growth * immunity;
    (d_infectivity, d_immunity)
}

/// Saturate to `[0, 1]`; NaN maps to 0.
pub fn clamp_unit(x: f32) -> f32 {
    if x.is_nan() { 0.0 } else { x.clamp(0.0, 1.0) }
}
