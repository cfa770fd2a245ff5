pub mod constants;
pub mod entity;
pub mod error;
pub mod lifecycle;
pub mod physics;
pub mod resolver;
pub mod settings;
pub mod simulation;
pub mod snapshot;
pub mod split;
pub mod store;
pub mod tag;

pub use entity::{Category, EntityId, FragmentEntity};
pub use error::SimulationError;
pub use physics::{PhysicsAdapter, RapierWorld};
pub use resolver::{CollisionResolver, PairKey, ResolveReport};
pub use settings::{SimulationSettings, Viewport};
pub use simulation::{Simulation, TickReport};
pub use snapshot::FragmentView;
pub use split::{is_atomic, try_split};
pub use store::EntityStore;
