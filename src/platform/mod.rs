//! Window-system side of the renderer: the OS window, its input, and the Vulkan
//! surface handed to the GPU side. Backed by winit, driven by pumping the event
//! loop so the caller keeps control of the frame loop.

mod input_state;

pub use input_state::InputState;

use std::ffi::CStr;
use std::sync::Arc;
use std::time::Duration;
use ash::vk;
use color_eyre::Result;
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::error::OsError;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::KeyCode;
use winit::platform::pump_events::{EventLoopExtPumpEvents, PumpStatus};
use winit::window::{Window, WindowAttributes, WindowId};
use crate::renderer::error::RenderError;

const WINDOW_CREATION_PUMPS: u32 = 100;
const WINDOW_CREATION_PUMP_TIMEOUT: Duration = Duration::from_millis(10);

pub struct Platform {
    event_loop: EventLoop<()>,
    handler: PlatformHandler,
}

#[derive(Default)]
struct PlatformHandler {
    pending_window: Option<WindowAttributes>,
    created_window: Option<Arc<Window>>,
    window_error: Option<OsError>,
    window_id: Option<WindowId>,
    input_state: InputState,
    exited: bool,
}

impl PlatformHandler {
    fn create_pending_window(&mut self, event_loop: &ActiveEventLoop) {
        if let Some(attributes) = self.pending_window.take() {
            match event_loop.create_window(attributes) {
                Ok(window) => {
                    self.window_id = Some(window.id());
                    self.created_window = Some(Arc::new(window));
                }
                Err(e) => {
                    self.window_error = Some(e);
                }
            }
        }
    }
}

impl ApplicationHandler for PlatformHandler {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        self.create_pending_window(event_loop);
    }

    fn window_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        window_id: WindowId,
        event: WindowEvent,
    ) {
        if self.window_id != Some(window_id) {
            return;
        }

        self.input_state.process_window_events(&event);
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        // Covers windows requested after the initial resume
        self.create_pending_window(event_loop);
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        self.exited = true;
    }
}

impl Platform {
    pub fn new() -> Result<Self> {
        let event_loop = EventLoop::new()?;
        event_loop.set_control_flow(ControlFlow::Poll);

        Ok(Self {
            event_loop,
            handler: PlatformHandler::default(),
        })
    }

    /// Creates the non-resizable window. The platform only keeps its id, the
    /// window itself lives as long as the returned handle.
    pub fn create_window(
        &mut self,
        width: u32,
        height: u32,
        title: &str,
    ) -> Result<Arc<Window>> {
        let attributes = Window::default_attributes()
            .with_title(title)
            .with_inner_size(PhysicalSize::new(width, height))
            .with_resizable(false);
        self.handler.pending_window = Some(attributes);

        for _ in 0..WINDOW_CREATION_PUMPS {
            let status = self.event_loop.pump_app_events(
                Some(WINDOW_CREATION_PUMP_TIMEOUT),
                &mut self.handler,
            );
            if let PumpStatus::Exit(code) = status {
                log::error!("Event loop exited with code {} during window creation", code);
                self.handler.exited = true;
                return Err(RenderError::EventLoopExited.into());
            }
            if let Some(e) = self.handler.window_error.take() {
                return Err(RenderError::WindowCreation(e.to_string()).into());
            }
            if let Some(window) = self.handler.created_window.take() {
                log::info!("Created window {:?} ({}x{})", title, width, height);
                return Ok(window);
            }
        }

        self.handler.pending_window = None;
        Err(RenderError::WindowCreation(String::from("event loop never resumed")).into())
    }

    /// Dispatches queued window and input events without blocking.
    pub fn poll_events(&mut self) {
        if self.handler.exited {
            return;
        }

        let status = self.event_loop.pump_app_events(Some(Duration::ZERO), &mut self.handler);
        if let PumpStatus::Exit(code) = status {
            log::info!("Event loop exited with code {}", code);
            self.handler.exited = true;
        }
    }

    pub fn key_pressed(&self, key: KeyCode) -> bool {
        self.handler.input_state.is_held(key)
    }

    pub fn close_requested(&self) -> bool {
        self.handler.input_state.close_requested || self.handler.exited
    }

    /// Instance extensions the display server needs for surface creation
    pub fn required_extensions(&self) -> Result<Vec<&'static CStr>> {
        let exts = ash_window::enumerate_required_extensions(
            self.event_loop.display_handle()?.as_raw()
        )?
            .iter()
            .map(|ext| unsafe {
                CStr::from_ptr(*ext)
            })
            .collect::<Vec<_>>();
        Ok(exts)
    }

    pub fn create_surface(
        &self,
        entry: &ash::Entry,
        instance: &ash::Instance,
        window: &Window,
    ) -> Result<vk::SurfaceKHR> {
        let surface = unsafe {
            ash_window::create_surface(
                entry,
                instance,
                window.display_handle()?.as_raw(),
                window.window_handle()?.as_raw(),
                None,
            )?
        };
        Ok(surface)
    }
}
