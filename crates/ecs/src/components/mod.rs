//! Built-in component variants.

mod animation;
mod camera;
mod collider;
mod light;
mod model;
mod rigidbody;
mod script;
mod sprite;

pub use animation::Animation;
pub use camera::Camera;
pub use collider::{BoxCollider, SphereCollider};
pub use light::Light;
pub use model::Model;
pub use rigidbody::Rigidbody;
pub use script::Script;
pub use sprite::Sprite2D;

use stagehand_assets::{AssetServer, AssetState};

/// Outcome of polling an asset a component depends on.
pub(crate) enum Dependency {
    Ready,
    Waiting,
    Missing,
}

/// Poll `name` without blocking. Starts the load on first use.
pub(crate) fn poll_asset(assets: &mut AssetServer, name: &str) -> Dependency {
    match assets.request(name) {
        AssetState::Ready(_) => Dependency::Ready,
        AssetState::Pending => Dependency::Waiting,
        AssetState::Failed(err) => {
            tracing::trace!(asset = name, %err, "dependency unavailable");
            Dependency::Missing
        }
    }
}
