use crate::sim::{reflect_inward, Float3, Marble, PhysicsParams};
use crate::track::ColliderSegment;

/// Distance below which a contact direction is considered undefined.
const CONTACT_EPSILON: f32 = 1e-6;

/// Advances marbles by one sub-step against static track geometry.
///
/// Implementations only move racing marbles. Constraint enforcement, speed
/// capping and race status are handled by the caller after each sub-step.
pub trait Stepper {
    fn step(
        &mut self,
        marbles: &mut [Marble],
        colliders: &[ColliderSegment],
        params: &PhysicsParams,
        dt: f32,
    );
}

/// Built-in rigid-sphere integrator.
///
/// Semi-implicit Euler under gravity and linear damping, then sphere-box
/// contacts against the track and sphere-sphere contacts between marbles.
/// All marbles have equal mass.
#[derive(Debug, Clone, Copy, Default)]
pub struct SphereStepper {
    contacts: usize,
}

impl SphereStepper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Contacts resolved during the last call to `step`.
    pub fn contacts(&self) -> usize {
        self.contacts
    }
}

impl Stepper for SphereStepper {
    fn step(
        &mut self,
        marbles: &mut [Marble],
        colliders: &[ColliderSegment],
        params: &PhysicsParams,
        dt: f32,
    ) {
        self.contacts = 0;
        let damping = (1.0 - params.linear_damping * dt).max(0.0);

        for marble in marbles.iter_mut().filter(|m| m.is_racing()) {
            marble.velocity += params.gravity * dt;
            marble.velocity = marble.velocity * damping;
            marble.position += marble.velocity * dt;
            marble.orientation = marble.orientation.integrate(marble.angular_velocity, dt);

            for collider in colliders {
                if resolve_box(marble, collider, params) {
                    self.contacts += 1;
                }
            }
        }

        self.contacts += resolve_marbles(marbles, params.marble_restitution);
    }
}

/// Pushes `marble` out of `collider` and responds to the contact.
fn resolve_box(marble: &mut Marble, collider: &ColliderSegment, params: &PhysicsParams) -> bool {
    let reach = collider.bounding_radius() + marble.radius;
    if marble.position.distance(collider.position) > reach {
        return false;
    }

    let closest = collider.closest_point(marble.position);
    let delta = marble.position - closest;
    let distance = delta.magnitude();
    if distance >= marble.radius {
        return false;
    }

    let (normal, depth) = if distance > CONTACT_EPSILON {
        (delta * (1.0 / distance), marble.radius - distance)
    } else {
        deepest_exit(marble, collider)
    };

    marble.position += normal * depth;
    apply_contact(marble, normal, params);
    true
}

/// Exit direction and depth for a center that is inside the box: the face
/// with the least penetration.
fn deepest_exit(marble: &Marble, collider: &ColliderSegment) -> (Float3, f32) {
    let local = collider.to_local(marble.position);
    let h = collider.half_extents;
    let basis = collider.basis();

    let faces = [
        (h.x - local.x.abs(), basis.c0, local.x),
        (h.y - local.y.abs(), basis.c1, local.y),
        (h.z - local.z.abs(), basis.c2, local.z),
    ];
    let (penetration, axis, coordinate) = faces
        .into_iter()
        .min_by(|a, b| a.0.total_cmp(&b.0))
        .unwrap_or(faces[0]);

    let normal = if coordinate < 0.0 { -axis } else { axis };
    (normal, penetration + marble.radius)
}

/// Restitution on normal velocity, Coulomb friction on tangential velocity,
/// and spin set to match rolling on the contact surface.
fn apply_contact(marble: &mut Marble, normal: Float3, params: &PhysicsParams) {
    let normal_impulse = (-marble.velocity.dot(normal) * (1.0 + params.restitution)).max(0.0);
    marble.velocity = reflect_inward(marble.velocity, normal, params.restitution);

    let tangential = marble.velocity.reject(normal);
    let slip = tangential.magnitude();
    if slip > CONTACT_EPSILON {
        let loss = (params.friction.max(0.0) * normal_impulse).min(slip);
        marble.velocity -= tangential * (loss / slip);
    }

    let rolling = marble.velocity.reject(normal);
    marble.angular_velocity = normal.cross(rolling) * (1.0 / marble.radius);
}

/// Separates overlapping racing marbles and exchanges normal momentum.
fn resolve_marbles(marbles: &mut [Marble], restitution: f32) -> usize {
    let mut contacts = 0;
    for i in 0..marbles.len() {
        let (head, tail) = marbles.split_at_mut(i + 1);
        let a = &mut head[i];
        if !a.is_racing() {
            continue;
        }
        for b in tail.iter_mut().filter(|m| m.is_racing()) {
            let delta = b.position - a.position;
            let distance = delta.magnitude();
            let min_distance = a.radius + b.radius;
            if distance >= min_distance {
                continue;
            }

            // Coincident centres have no contact direction; push apart sideways.
            let normal = if distance < CONTACT_EPSILON {
                Float3::RIGHT
            } else {
                delta * (1.0 / distance)
            };
            let overlap = min_distance - distance;
            a.position -= normal * (overlap * 0.5);
            b.position += normal * (overlap * 0.5);

            let approach = (b.velocity - a.velocity).dot(normal);
            if approach < 0.0 {
                let impulse = normal * (approach * (1.0 + restitution) * 0.5);
                a.velocity += impulse;
                b.velocity -= impulse;
            }
            contacts += 1;
        }
    }
    contacts
}
