mod actor_values;
mod memory;
mod shared;

pub use actor_values::{ActorValueTable, CharacterModel};
pub use memory::MemoryGameState;
pub use shared::SharedGameState;
