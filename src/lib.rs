pub mod ap;
pub mod apclass;
pub mod apmap;
pub mod edge;
pub mod graph;
pub mod idgen;
pub mod mutation;
pub mod query;
pub mod ring;
pub mod symmetry;
pub mod template;
pub mod vertex;

pub use ap::Ap;
pub use apclass::{ApClass, ApClassError};
pub use apmap::UniqueApMap;
pub use edge::{BondType, Edge};
pub use graph::{Graph, GraphError};
pub use idgen::{ApId, GraphId, VertexId};
pub use mutation::MutationType;
pub use query::{EdgeQuery, VertexQuery};
pub use ring::{Ring, RingError};
pub use symmetry::{SymmetricAps, SymmetricSet, SymmetricVertexes};
pub use template::ContractLevel;
pub use vertex::{Artifact, BBType, Vertex, VertexKind};
