use color_eyre::Result;
use origami::{ContextConfig, Renderer};

const WIDTH: u32 = 800;
const HEIGHT: u32 = 600;

fn main() -> Result<()> {
    color_eyre::install()?;
    env_logger::init();

    let config = ContextConfig::new("My App", WIDTH, HEIGHT)
        .with_validation(true);

    let mut renderer = Renderer::new();
    renderer.init(&config)?;

    while renderer.is_running() {
        renderer.poll_events()?;
    }

    renderer.quit()?;

    Ok(())
}
