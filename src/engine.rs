//! Engine facade and application event loop.
//!
//! [`run`] owns the winit loop for the lifetime of the visualization. The
//! host steers it through an [`EngineHandle`], a cheap clonable proxy that
//! injects navigation and rotation events from any thread (or from JS glue on
//! the web). GPU setup and texture loading happen asynchronously after the
//! window exists: natively the loop blocks on them, on wasm they run in a
//! `spawn_local` task that posts an [`EngineEvent::Initialized`] back into
//! the loop once the scene is ready.
//!
//! The frame clock is an accumulated `f32` seconds value that simply stops
//! advancing while the window is occluded, so no tween or spin integrates
//! time the viewer never saw.

use std::sync::Arc;

use cgmath::Vector2;
use instant::Instant;
use winit::{
    application::ApplicationHandler,
    event::{ElementState, MouseButton, Touch, TouchPhase, WindowEvent},
    event_loop::{ActiveEventLoop, EventLoop, EventLoopProxy},
    window::{CursorIcon, Window},
};

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

use crate::{
    audio::{AudioReactive, Silence},
    context::Context,
    globe::GlobeState,
    interaction::CursorAffordance,
    resources::{TexturePaths, TextureSet},
    scene::{MarkerConfig, SceneGraph},
};

#[cfg(target_arch = "wasm32")]
const CANVAS_ID: &str = "canvas";

/// Events the host (or the init task) injects into the event loop.
pub enum EngineEvent {
    /// GPU context and scene finished building asynchronously.
    Initialized(Box<EngineState>),
    /// Navigate to a route; the visuals retarget accordingly.
    Navigate(String),
    /// Programmatic rotation nudge in pixel-equivalent units.
    Rotate(f64, f64),
    /// Tear the engine down. Safe to send more than once.
    Shutdown,
}

/// The host's control surface: a clonable proxy into the running loop.
///
/// Every method is fire-and-forget; events arriving after shutdown are
/// silently dropped.
#[derive(Clone)]
pub struct EngineHandle {
    proxy: EventLoopProxy<EngineEvent>,
}

impl EngineHandle {
    pub fn transition_to(&self, route: &str) {
        let _ = self.proxy.send_event(EngineEvent::Navigate(route.to_string()));
    }

    pub fn rotate(&self, dx: f64, dy: f64) {
        let _ = self.proxy.send_event(EngineEvent::Rotate(dx, dy));
    }

    pub fn shutdown(&self) {
        let _ = self.proxy.send_event(EngineEvent::Shutdown);
    }
}

/// Everything configurable before the loop starts.
pub struct EngineConfig {
    pub texture_paths: TexturePaths,
    /// Optional surface marker, in degrees.
    pub marker: Option<MarkerConfig>,
    /// Route applied as soon as the scene exists.
    pub initial_route: Option<String>,
    pub audio: Box<dyn AudioReactive>,
    /// Fired exactly once, after the first frame has been presented.
    pub on_ready: Option<Box<dyn FnOnce(EngineHandle)>>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            texture_paths: TexturePaths::default(),
            marker: None,
            initial_route: None,
            audio: Box::new(Silence),
            on_ready: None,
        }
    }
}

/// GPU context plus the fully built scene, created asynchronously.
pub struct EngineState {
    ctx: Context,
    scene: SceneGraph,
}

pub struct App {
    #[cfg(not(target_arch = "wasm32"))]
    async_runtime: tokio::runtime::Runtime,
    proxy: EventLoopProxy<EngineEvent>,
    state: Option<EngineState>,
    globe: GlobeState,
    audio: Box<dyn AudioReactive>,
    texture_paths: TexturePaths,
    marker: Option<MarkerConfig>,
    // Navigation may arrive before the async init settles; the latest
    // request is applied once the scene exists.
    pending_route: Option<String>,
    on_ready: Option<Box<dyn FnOnce(EngineHandle)>>,
    last_time: Instant,
    clock: f32,
    occluded: bool,
    pointer: (f32, f32),
}

impl App {
    fn new(event_loop: &EventLoop<EngineEvent>, config: EngineConfig) -> anyhow::Result<Self> {
        let proxy = event_loop.create_proxy();
        #[cfg(not(target_arch = "wasm32"))]
        let async_runtime = tokio::runtime::Runtime::new()?;
        Ok(Self {
            #[cfg(not(target_arch = "wasm32"))]
            async_runtime,
            proxy,
            state: None,
            globe: GlobeState::new(),
            audio: config.audio,
            texture_paths: config.texture_paths,
            marker: config.marker,
            pending_route: config.initial_route,
            on_ready: config.on_ready,
            last_time: Instant::now(),
            clock: 0.0,
            occluded: false,
            pointer: (0.0, 0.0),
        })
    }

    /// Whether the pointer ray at the current position hits the planet.
    fn pointer_hits_planet(&self) -> bool {
        self.state
            .as_ref()
            .map(|state| {
                state
                    .ctx
                    .pointer_ray(self.pointer)
                    .intersect_sphere(state.scene.planet_pick_radius())
                    .is_some()
            })
            .unwrap_or(false)
    }

    fn set_cursor(&self, affordance: CursorAffordance) {
        if let Some(state) = &self.state {
            let icon = match affordance {
                CursorAffordance::Grabbing => CursorIcon::Grabbing,
                CursorAffordance::Grab => CursorIcon::Grab,
                CursorAffordance::Default => CursorIcon::Default,
            };
            state.ctx.window().set_cursor(icon);
        }
    }

    fn pointer_down(&mut self) {
        let hit = self.pointer_hits_planet();
        let over_ui = pointer_over_ui(self.pointer);
        let pos = Vector2::new(self.pointer.0, self.pointer.1);
        if self
            .globe
            .interaction
            .pointer_down(pos, &self.globe.visual, hit, over_ui)
        {
            self.set_cursor(CursorAffordance::Grabbing);
        }
    }

    fn pointer_up(&mut self) {
        self.globe.interaction.pointer_up(self.clock);
        let affordance = if self.pointer_hits_planet() && !pointer_over_ui(self.pointer) {
            CursorAffordance::Grab
        } else {
            CursorAffordance::Default
        };
        self.set_cursor(affordance);
    }

    fn pointer_moved(&mut self, x: f32, y: f32) {
        self.pointer = (x, y);
        let hit = self.pointer_hits_planet();
        let pos = Vector2::new(x, y);
        let affordance = self.globe.interaction.pointer_move(pos, &self.globe.visual, hit);
        self.set_cursor(affordance);
    }

    fn navigate(&mut self, route: &str) {
        if self.state.is_none() {
            self.pending_route = Some(route.to_string());
            return;
        }
        self.globe
            .transitions
            .transition_to(route, self.clock, &mut self.globe.visual);
        sync_canvas_pointer_events(self.globe.visual.pointer_enabled);
    }

    fn redraw(&mut self) {
        // A zero dt while occluded freezes every time integration without
        // touching any tween bookkeeping.
        let dt = if self.occluded {
            0.0
        } else {
            self.last_time.elapsed().as_secs_f32()
        };
        self.last_time = Instant::now();
        self.clock += dt;

        let intensity = self.audio.intensity();
        self.globe.advance(self.clock, dt, intensity);

        let Some(state) = &mut self.state else {
            return;
        };
        match state.ctx.render(&state.scene, &self.globe) {
            Ok(()) => {
                if let Some(on_ready) = self.on_ready.take() {
                    on_ready(EngineHandle {
                        proxy: self.proxy.clone(),
                    });
                }
            }
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                let size = state.ctx.window().inner_size();
                state.ctx.resize(size.width, size.height);
            }
            Err(e) => {
                log::error!("unable to render: {e}");
            }
        }
        if let Some(state) = &self.state {
            state.ctx.window().request_redraw();
        }
    }
}

impl ApplicationHandler<EngineEvent> for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        #[allow(unused_mut)]
        let mut window_attributes = Window::default_attributes();

        #[cfg(target_arch = "wasm32")]
        {
            use wasm_bindgen::JsCast;
            use winit::platform::web::WindowAttributesExtWebSys;

            let window = web_sys::window().unwrap_throw();
            let document = window.document().unwrap_throw();
            let canvas = document.get_element_by_id(CANVAS_ID).unwrap_throw();
            let html_canvas_element = canvas.unchecked_into();
            window_attributes = window_attributes.with_canvas(Some(html_canvas_element));
        }

        let window = match event_loop.create_window(window_attributes) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                log::error!("window creation failed: {e}");
                event_loop.exit();
                return;
            }
        };

        let paths = self.texture_paths.clone();
        let marker = self.marker;
        let init_future = async move {
            let ctx = match Context::new(window).await {
                Ok(ctx) => ctx,
                Err(e) => panic!("engine initialization failed: {e}"),
            };
            // Every texture request settles to an image or a placeholder,
            // so the scene always comes up.
            let textures = TextureSet::load(&paths).await;
            let scene = SceneGraph::new(
                &ctx.device,
                &ctx.queue,
                &ctx.pipelines,
                &textures,
                ctx.quality,
                marker,
            );
            EngineState { ctx, scene }
        };

        #[cfg(not(target_arch = "wasm32"))]
        {
            let state = self.async_runtime.block_on(init_future);
            self.state = Some(state);
            if let Some(route) = self.pending_route.take() {
                self.navigate(&route);
            }
            self.last_time = Instant::now();
            if let Some(state) = &self.state {
                state.ctx.window().request_redraw();
            }
        }

        #[cfg(target_arch = "wasm32")]
        {
            let proxy = self.proxy.clone();
            wasm_bindgen_futures::spawn_local(async move {
                let state = init_future.await;
                report_init_delivery(proxy.send_event(EngineEvent::Initialized(Box::new(state))));
            });
        }
    }

    fn user_event(&mut self, event_loop: &ActiveEventLoop, event: EngineEvent) {
        match event {
            EngineEvent::Initialized(state) => {
                // The message from the wasm `spawn_local` init task.
                self.state = Some(*state);
                if let Some(state) = &mut self.state {
                    let size = state.ctx.window().inner_size();
                    state.ctx.resize(size.width, size.height);
                }
                if let Some(route) = self.pending_route.take() {
                    self.navigate(&route);
                }
                self.last_time = Instant::now();
                if let Some(state) = &self.state {
                    state.ctx.window().request_redraw();
                }
            }
            EngineEvent::Navigate(route) => self.navigate(&route),
            EngineEvent::Rotate(dx, dy) => {
                self.globe.interaction.rotate(dx as f32, dy as f32);
            }
            EngineEvent::Shutdown => {
                // Dropping the state releases every GPU resource; a second
                // Shutdown finds nothing left and only exits again.
                self.state.take();
                event_loop.exit();
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                self.state.take();
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                if let Some(state) = &mut self.state {
                    state.ctx.resize(size.width, size.height);
                }
            }
            WindowEvent::Occluded(occluded) => {
                self.occluded = occluded;
                if !occluded {
                    // Drop the time the window spent hidden.
                    self.last_time = Instant::now();
                    if let Some(state) = &self.state {
                        state.ctx.window().request_redraw();
                    }
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.pointer_moved(position.x as f32, position.y as f32);
            }
            WindowEvent::MouseInput {
                state: button_state,
                button: MouseButton::Left,
                ..
            } => match button_state {
                ElementState::Pressed => self.pointer_down(),
                ElementState::Released => self.pointer_up(),
            },
            WindowEvent::Touch(Touch {
                phase, location, ..
            }) => {
                let (x, y) = (location.x as f32, location.y as f32);
                match phase {
                    TouchPhase::Started => {
                        self.pointer = (x, y);
                        self.pointer_down();
                    }
                    TouchPhase::Moved => self.pointer_moved(x, y),
                    TouchPhase::Ended | TouchPhase::Cancelled => self.pointer_up(),
                }
            }
            WindowEvent::RedrawRequested => self.redraw(),
            _ => {}
        }
    }
}

/// The init task can outlive the loop when the host shuts the engine down
/// mid-load. A closed loop only means the finished scene is discarded; it
/// must never raise into the host page.
#[cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]
fn report_init_delivery<T>(result: Result<(), winit::event_loop::EventLoopClosed<T>>) {
    if result.is_err() {
        log::warn!("engine shut down before initialization completed, discarding the scene");
    }
}

/// Whether a pointer position falls on host UI layered over the canvas.
#[cfg(target_arch = "wasm32")]
fn pointer_over_ui(pointer: (f32, f32)) -> bool {
    let Some(document) = web_sys::window().and_then(|w| w.document()) else {
        return false;
    };
    match document.element_from_point(pointer.0, pointer.1) {
        Some(element) => element.id() != CANVAS_ID,
        None => false,
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn pointer_over_ui(_pointer: (f32, f32)) -> bool {
    false
}

/// On routes where the planet is decoration only, the canvas stops
/// swallowing pointer events so the page content behind it stays clickable.
#[cfg(target_arch = "wasm32")]
fn sync_canvas_pointer_events(enabled: bool) {
    use wasm_bindgen::JsCast;

    let canvas = web_sys::window()
        .and_then(|w| w.document())
        .and_then(|d| d.get_element_by_id(CANVAS_ID))
        .and_then(|e| e.dyn_into::<web_sys::HtmlElement>().ok());
    if let Some(canvas) = canvas {
        let value = if enabled { "auto" } else { "none" };
        if let Err(e) = canvas.style().set_property("pointer-events", value) {
            log::warn!("could not update canvas pointer-events: {e:?}");
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn sync_canvas_pointer_events(_enabled: bool) {}

/// Start the engine and run its event loop.
///
/// Natively this blocks until shutdown; on wasm it hands the loop over to the
/// browser and returns immediately. The host receives its [`EngineHandle`]
/// through `config.on_ready` once the first frame is on screen.
pub fn run(config: EngineConfig) -> anyhow::Result<()> {
    #[cfg(not(target_arch = "wasm32"))]
    {
        if let Err(e) = env_logger::try_init() {
            println!("Warning: Could not initialize logger: {e}");
        }
    }

    #[cfg(target_arch = "wasm32")]
    {
        console_log::init_with_level(log::Level::Info).unwrap_throw();
    }

    let event_loop: EventLoop<EngineEvent> = EventLoop::with_user_event().build()?;
    let mut app = App::new(&event_loop, config)?;

    event_loop.run_app(&mut app)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_finishing_after_shutdown_is_discarded_quietly() {
        // The loop is already gone; the failed delivery must not raise.
        report_init_delivery::<u32>(Err(winit::event_loop::EventLoopClosed(7)));
        report_init_delivery::<u32>(Ok(()));
    }
}
