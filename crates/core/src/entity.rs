/// Something with its own identity inside an aggregate's boundary, such as
/// an invoice of a plan. Two entities with equal ids are the same row even
/// when their attributes differ.
pub trait Entity {
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    fn id(&self) -> &Self::Id;
}
