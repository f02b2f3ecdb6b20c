//! Viewer session: ties the configuration store, the loaded asset and the
//! camera together.
//!
//! Everything runs on one thread. A load is started with [`Session::begin_load`]
//! and completed with [`Session::finish_load`]; only the most recent ticket is
//! honoured, so a slow earlier load can never land on top of a newer one.

mod timing;

pub use timing::FrameTiming;

use crate::assets::{AssetError, LoadedAsset};
use crate::cart::{self, Envelope};
use crate::config::{ConfigOption, ConfigStore, Configuration};
use crate::render::{fit_camera, CameraState, OrbitController};
use crate::scene::binder::{self, BindError, BindReport};
use crate::scene::index::NodeIndex;
use crate::scene::SceneGraph;
use crate::settings::ViewerSettings;

use glam::{Quat, Vec3};
use std::rc::Rc;
use std::time::Instant;

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Asset(#[from] AssetError),
    #[error(transparent)]
    Bind(#[from] BindError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket(u64);

#[derive(Debug, PartialEq, Eq)]
pub enum LoadOutcome {
    Applied(BindReport),
    /// A newer load was started; this result was dropped untouched.
    Discarded,
}

struct LoadedScene {
    name: String,
    graph: SceneGraph,
    index: NodeIndex,
    orbit: OrbitController,
}

pub struct Session {
    settings: ViewerSettings,
    store: ConfigStore,
    scene: Option<LoadedScene>,
    next_ticket: u64,
    pending: Option<LoadTicket>,
    timing: FrameTiming,
    last_report: Option<BindReport>,
}

impl Session {
    pub fn new(settings: ViewerSettings, initial: Configuration) -> Self {
        Self {
            settings,
            store: ConfigStore::new(initial),
            scene: None,
            next_ticket: 0,
            pending: None,
            timing: FrameTiming::new(),
            last_report: None,
        }
    }

    pub fn settings(&self) -> &ViewerSettings {
        &self.settings
    }

    pub fn configuration(&self) -> Rc<Configuration> {
        self.store.current()
    }

    pub fn scene_graph(&self) -> Option<&SceneGraph> {
        self.scene.as_ref().map(|scene| &scene.graph)
    }

    pub fn asset_name(&self) -> Option<&str> {
        self.scene.as_ref().map(|scene| scene.name.as_str())
    }

    pub fn camera(&self) -> Option<CameraState> {
        self.scene.as_ref().map(|scene| scene.orbit.state())
    }

    pub fn orbit_mut(&mut self) -> Option<&mut OrbitController> {
        self.scene.as_mut().map(|scene| &mut scene.orbit)
    }

    pub fn last_report(&self) -> Option<&BindReport> {
        self.last_report.as_ref()
    }

    /// Supersedes any load still in flight.
    pub fn begin_load(&mut self) -> LoadTicket {
        self.next_ticket += 1;
        let ticket = LoadTicket(self.next_ticket);
        if let Some(stale) = self.pending.replace(ticket) {
            log::debug!("Load {stale:?} superseded by {ticket:?}");
        }
        ticket
    }

    pub fn finish_load(
        &mut self,
        ticket: LoadTicket,
        result: Result<LoadedAsset, AssetError>,
    ) -> Result<LoadOutcome, SessionError> {
        if self.pending != Some(ticket) {
            log::warn!("Discarding result of superseded load {ticket:?}");
            return Ok(LoadOutcome::Discarded);
        }
        self.pending = None;

        let LoadedAsset { name, mut graph } = result.map_err(|err| {
            log::error!("Asset load failed: {err}");
            err
        })?;

        let index = NodeIndex::build(&graph);
        let start = CameraState {
            fov_deg: self.settings.fov_deg,
            ..CameraState::default()
        };
        let fitted = fit_camera(&start, &graph);
        let orbit = OrbitController::from_fit(&fitted).with_damping(self.settings.orbit_damping);
        let report = binder::bind(&mut graph, &index, &self.store.current(), &self.settings.node_names)?;
        log::info!(
            "Bound {name}: {} vane, {} nock, {} wrap meshes; camera at {:.2} units",
            report.vane_meshes,
            report.nock_meshes,
            report.wrap_meshes,
            fitted.distance()
        );

        self.scene = Some(LoadedScene {
            name,
            graph,
            index,
            orbit,
        });
        self.last_report = Some(report.clone());
        Ok(LoadOutcome::Applied(report))
    }

    /// Applies one control change and re-binds. The camera is left alone.
    pub fn apply_option(&mut self, option: ConfigOption) -> Result<Option<BindReport>, BindError> {
        self.store.set_option(option);
        self.rebind()
    }

    pub fn replace_configuration(
        &mut self,
        config: Configuration,
    ) -> Result<Option<BindReport>, BindError> {
        self.store.replace(config);
        self.rebind()
    }

    fn rebind(&mut self) -> Result<Option<BindReport>, BindError> {
        let Some(scene) = self.scene.as_mut() else {
            return Ok(None);
        };
        let report = binder::bind(
            &mut scene.graph,
            &scene.index,
            &self.store.current(),
            &self.settings.node_names,
        )?;
        self.last_report = Some(report.clone());
        Ok(Some(report))
    }

    /// Per-frame update: spins the model and advances orbit damping.
    pub fn tick(&mut self, now: Instant) {
        self.timing.update(now);
        let Some(scene) = self.scene.as_mut() else {
            return;
        };
        let angle = self.timing.frame_dt * self.settings.auto_rotate_speed;
        let root = scene.graph.root();
        if let Some(node) = scene.graph.node_mut(root) {
            node.transform.rotation = Quat::from_axis_angle(Vec3::Y, angle) * node.transform.rotation;
        }
        scene.orbit.update();
    }

    pub fn cart_envelope(&self) -> Envelope {
        Envelope::new(
            &self.settings.parent_origin,
            cart::add_to_cart(&self.settings.variant_id, &self.store.current()),
        )
    }

    pub fn resize_envelope(&self, height: u32) -> Envelope {
        Envelope::new(&self.settings.parent_origin, cart::resize(height))
    }
}
