//! Records with a stable, typed identity.

/// Anything persisted under its own id.
pub trait Entity {
    type Id: Copy + Eq + core::hash::Hash + core::fmt::Debug;

    fn id(&self) -> &Self::Id;

    /// `(id, record)` pair, the shape keyed stores write.
    fn keyed(&self) -> (Self::Id, Self)
    where
        Self: Clone,
    {
        (*self.id(), self.clone())
    }
}
