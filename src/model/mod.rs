//! Pure data structures shared by the actors, the placement engine and the façade.

pub mod ids;
pub mod node;
pub mod player;
pub mod process;
pub mod recipe;
pub mod resource;

pub use ids::*;
pub use node::*;
pub use player::*;
pub use process::*;
pub use recipe::*;
pub use resource::*;
