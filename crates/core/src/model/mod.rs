pub mod call_tree;
pub mod profile;

pub use call_tree::{CallTree, CallTreeNode, NodeId, ROOT_NAME};
pub use profile::{Function, Line, Location, Mapping, Profile, ProfileBuilder, Sample, ValueType};
