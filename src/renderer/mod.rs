pub mod config;
pub mod core;
pub mod error;
pub mod frame_ctx;
pub mod internals;
pub mod lifecycle;
pub mod vk;

use color_eyre::Result;
use winit::keyboard::KeyCode;
use crate::platform::Platform;
use crate::renderer::config::ContextConfig;
use crate::renderer::core::context::RenderContext;
use crate::renderer::error::RenderError;
use crate::renderer::frame_ctx::Frame;
use crate::renderer::lifecycle::LifecycleState;

/// Entry point: `init`, then `poll_events` + `render` while running, then `quit`.
///
/// Field order matters for the implicit drop path too: the GPU context goes
/// before the platform that owns the event loop.
#[derive(Default)]
pub struct Renderer {
    context: Option<RenderContext>,
    platform: Option<Platform>,
    state: LifecycleState,
}

impl Renderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn init(&mut self, config: &ContextConfig) -> Result<()> {
        self.state.ensure_can_init()?;
        config.validate()?;

        // The event loop can only be created once per process
        let mut platform = match self.platform.take() {
            Some(platform) => platform,
            None => Platform::new()?,
        };

        let context = match RenderContext::new(config, &mut platform) {
            Ok(context) => context,
            Err(e) => {
                self.platform = Some(platform);
                return Err(e);
            }
        };

        self.context = Some(context);
        self.platform = Some(platform);
        self.state = LifecycleState::Running;
        log::info!("Renderer running");

        Ok(())
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state.is_running()
    }

    /// Dispatches window events; Escape or a close request stops the renderer.
    pub fn poll_events(&mut self) -> Result<()> {
        if !self.state.ensure_can_drive("poll_events")? {
            return Ok(());
        }

        let platform = self.platform.as_mut().ok_or(RenderError::AlreadyReleased)?;
        platform.poll_events();

        if platform.key_pressed(KeyCode::Escape) || platform.close_requested() {
            log::info!("Exit requested");
            self.state = LifecycleState::Stopped;
        }

        Ok(())
    }

    /// Renders one frame, recording `draw` into the frame's command buffer.
    ///
    /// A failed frame stops the renderer; `quit` is still required.
    pub fn render<F>(&mut self, draw: F) -> Result<()>
    where
        F: FnOnce(&mut Frame<'_>),
    {
        if !self.state.ensure_can_drive("render")? {
            return Ok(());
        }

        let context = self.context.as_mut().ok_or(RenderError::AlreadyReleased)?;
        if let Err(e) = frame_ctx::drive_frame(context, draw) {
            log::error!("Frame failed, stopping: {}", e);
            self.state = LifecycleState::Stopped;
            return Err(e);
        }

        Ok(())
    }

    /// Destroys everything `init` created, in reverse creation order. Single use.
    pub fn quit(&mut self) -> Result<()> {
        self.state.ensure_can_quit()?;
        self.state = LifecycleState::Released;

        drop(self.context.take());
        drop(self.platform.take());
        log::info!("Renderer released");

        Ok(())
    }

    pub fn context(&self) -> Option<&RenderContext> {
        self.context.as_ref()
    }
}
