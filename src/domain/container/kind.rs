//! Container kinds

use std::fmt::Debug;
use std::hash::Hash;

/// Marker for a kind of container users can be members of
pub trait ContainerKind:
    Debug + Clone + Copy + Default + PartialEq + Eq + Hash + Send + Sync + 'static
{
    /// Singular lowercase name, e.g. `group`
    const NAME: &'static str;

    /// Plural lowercase name, e.g. `groups`
    const PLURAL: &'static str;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct GroupKind;

impl ContainerKind for GroupKind {
    const NAME: &'static str = "group";
    const PLURAL: &'static str = "groups";
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct TeamKind;

impl ContainerKind for TeamKind {
    const NAME: &'static str = "team";
    const PLURAL: &'static str = "teams";
}
