use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Desired direction and speed produced by a behaviour.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Steering {
    pub direction: Vec3,
    pub speed: f32,
}

impl Steering {
    pub const HALT: Steering = Steering {
        direction: Vec3::ZERO,
        speed: 0.0,
    };
}

/// Per-agent steering hook, run by the world before each force pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Behavior {
    /// Steering is set externally and left untouched.
    Manual,
    /// Walk in a fixed direction.
    Constant { direction: Vec3, speed: f32 },
    /// Walk to `goal` and stop within `arrival_radius`.
    SeekGoal {
        goal: Vec3,
        speed: f32,
        arrival_radius: f32,
    },
    /// Visit `waypoints` in a loop; `next` is the current waypoint.
    Patrol {
        waypoints: Vec<Vec3>,
        next: usize,
        speed: f32,
        arrival_radius: f32,
    },
}

impl Behavior {
    /// New steering for an agent at `position`, or `None` to keep the
    /// current one.
    pub fn steer(&mut self, position: Vec3) -> Option<Steering> {
        match self {
            Self::Manual => None,
            Self::Constant { direction, speed } => Some(Steering {
                direction: direction.normalize_or_zero(),
                speed: *speed,
            }),
            Self::SeekGoal {
                goal,
                speed,
                arrival_radius,
            } => Some(seek(position, *goal, *speed, *arrival_radius)),
            Self::Patrol {
                waypoints,
                next,
                speed,
                arrival_radius,
            } => {
                if waypoints.is_empty() {
                    return Some(Steering::HALT);
                }
                *next %= waypoints.len();
                if position.distance(waypoints[*next]) <= *arrival_radius {
                    *next = (*next + 1) % waypoints.len();
                }
                Some(seek(position, waypoints[*next], *speed, 0.0))
            }
        }
    }
}

fn seek(position: Vec3, goal: Vec3, speed: f32, arrival_radius: f32) -> Steering {
    let offset = goal - position;
    if offset.length() <= arrival_radius {
        return Steering::HALT;
    }
    Steering {
        direction: offset.normalize_or_zero(),
        speed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_keeps_external_steering() {
        assert_eq!(Behavior::Manual.steer(Vec3::ZERO), None);
    }

    #[test]
    fn constant_normalizes_direction() {
        let mut b = Behavior::Constant {
            direction: Vec3::new(0.0, 0.0, 4.0),
            speed: 1.5,
        };
        let s = b.steer(Vec3::new(9.0, 9.0, 9.0)).unwrap();
        assert_eq!(s.direction, Vec3::Z);
        assert_eq!(s.speed, 1.5);
    }

    #[test]
    fn seek_heads_to_goal_and_halts_on_arrival() {
        let mut b = Behavior::SeekGoal {
            goal: Vec3::new(10.0, 0.0, 0.0),
            speed: 1.0,
            arrival_radius: 0.5,
        };
        let s = b.steer(Vec3::ZERO).unwrap();
        assert_eq!(s.direction, Vec3::X);
        assert_eq!(s.speed, 1.0);

        assert_eq!(b.steer(Vec3::new(9.8, 0.0, 0.0)), Some(Steering::HALT));
    }

    #[test]
    fn patrol_advances_on_arrival_and_wraps() {
        let mut b = Behavior::Patrol {
            waypoints: vec![Vec3::ZERO, Vec3::new(5.0, 0.0, 0.0)],
            next: 1,
            speed: 2.0,
            arrival_radius: 0.25,
        };
        let s = b.steer(Vec3::ZERO).unwrap();
        assert_eq!(s.direction, Vec3::X);

        // Arrive at waypoint 1; head back to waypoint 0.
        let s = b.steer(Vec3::new(5.0, 0.0, 0.1)).unwrap();
        assert!(s.direction.x < 0.0);
        assert!(matches!(b, Behavior::Patrol { next: 0, .. }));
    }

    #[test]
    fn empty_patrol_halts() {
        let mut b = Behavior::Patrol {
            waypoints: Vec::new(),
            next: 3,
            speed: 1.0,
            arrival_radius: 1.0,
        };
        assert_eq!(b.steer(Vec3::ZERO), Some(Steering::HALT));
    }
}
