//! fletchkit - arrow configurator core
//!
//! Binds a shopper's option choices (fletch count, vane, nock and wrap
//! colors) onto a loaded GLB scene graph, frames the model with an
//! auto-fitted camera, and produces the cart message for the host page.
//!
//! Typical flow:
//! - [`app::Session::begin_load`], load through [`assets::AssetLoader`],
//!   then [`app::Session::finish_load`] (index, fit, bind)
//! - every control change goes through [`app::Session::apply_option`],
//!   which re-binds the whole configuration
//! - [`app::Session::cart_envelope`] on confirmation

pub mod app;
pub mod assets;
pub mod cart;
pub mod config;
pub mod relay;
pub mod render;
pub mod scene;
pub mod settings;
pub mod ui;
