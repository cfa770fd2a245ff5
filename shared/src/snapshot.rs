//! Snapshot projector: the per-tick, render-facing view of every live fragment.

use serde::Serialize;

use crate::entity::EntityId;
use crate::physics::PhysicsAdapter;
use crate::store::EntityStore;

/// Pose and payload of one fragment, as handed to the renderer.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FragmentView {
    pub id: EntityId,
    pub text: String,
    pub x: f32,
    pub y: f32,
    pub angle: f32,
    pub width: f32,
}

/// Rebuild `out` from the current body poses, in id order.
///
/// The buffer is reused across ticks; whatever it held before is discarded.
pub fn project<P: PhysicsAdapter>(
    store: &EntityStore<P::Handle>,
    physics: &P,
    out: &mut Vec<FragmentView>,
) {
    out.clear();
    out.extend(store.iter().filter_map(|e| {
        let pose = physics.pose(e.body)?;
        Some(FragmentView {
            id: e.id,
            text: e.text.clone(),
            x: pose.x,
            y: pose.y,
            angle: pose.angle,
            width: e.width,
        })
    }));
}
