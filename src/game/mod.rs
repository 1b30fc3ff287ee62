//! Game layer: the platformer scene and the physics-body seam it drives.

pub mod body;
pub mod scene;

pub use body::{PhysicsBody, PointBody};
pub use scene::PlatformScene;
