/// Globally-unique identifier attached to every physics body the simulation creates
/// (fragments, walls and pins).
///
/// # Why this exists
/// The physics adapter reports collisions by body, and the rapier collider only has a
/// single `u128` of user data. To tell a fragment apart from a wall (and to recover the
/// fragment's entity id) without a side table, the body kind and a per-kind id are packed
/// into that one `u128`.
///
/// # Bit layout
/// This `u128` is a packed value with the following layout (least-significant bit = bit 0):
///
/// - bits 0..=63   : `body_id` (u64); the [`EntityId`](crate::EntityId) for fragments,
///   an index for walls and pins
/// - bits 64..=71  : `BodyKind` tag (u8)
/// - bits 72..=127 : reserved (must be zero)
///
/// # Invariants
/// - Two different `(body_id, kind)` pairs never produce the same `BodyTag`.
/// - A zero tag is never produced (kind tags start at 1), so untagged bodies are
///   distinguishable from tagged ones.
pub type BodyTag = u128;

/// Per-kind identifier packed into a [`BodyTag`].
pub type BodyId = u64;

/// Discriminator for the kind of body referenced by a [`BodyTag`].
///
/// The numeric values are part of the packed format. Do not reorder or reuse values.
#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum BodyKind {
    Fragment = 1,
    Wall = 2,
    Pin = 3,
}

/// Packs a [`BodyKind`] and a per-kind `id` into a [`BodyTag`].
pub fn pack_tag(id: BodyId, kind: BodyKind) -> BodyTag {
    (id as u128) | ((kind as u128) << BodyId::BITS)
}

/// Shorthand for the tag of a fragment body.
#[inline]
pub fn fragment_tag(id: BodyId) -> BodyTag {
    pack_tag(id, BodyKind::Fragment)
}

/// Extracts the [`BodyKind`] from a [`BodyTag`].
///
/// Returns `None` for unknown tags (untagged bodies, reserved bits set, or a
/// kind this build does not know about).
pub fn try_unpack_kind(tag: BodyTag) -> Option<BodyKind> {
    const KIND_MASK: u128 = u8::MAX as u128;
    const RESERVED_MASK: u128 = !0u128 << 72;

    if tag & RESERVED_MASK != 0 {
        return None;
    }

    match ((tag >> BodyId::BITS) & KIND_MASK) as u8 {
        1u8 => Some(BodyKind::Fragment),
        2u8 => Some(BodyKind::Wall),
        3u8 => Some(BodyKind::Pin),
        _ => None,
    }
}

/// Extracts the [`BodyId`] from a [`BodyTag`]. Does not validate the kind.
pub fn unpack_id(tag: BodyTag) -> BodyId {
    const ID_MASK: u128 = u64::MAX as u128;
    (tag & ID_MASK) as BodyId
}

/// The fragment entity id carried by `tag`, or `None` for any other kind of body.
pub fn fragment_id(tag: BodyTag) -> Option<BodyId> {
    match try_unpack_kind(tag)? {
        BodyKind::Fragment => Some(unpack_id(tag)),
        BodyKind::Wall | BodyKind::Pin => None,
    }
}
