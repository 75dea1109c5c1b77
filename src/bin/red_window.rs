use color_eyre::Result;
use origami::{ClearColor, ContextConfig, Frame, Renderer};

const WIDTH: u32 = 800;
const HEIGHT: u32 = 600;

fn main() -> Result<()> {
    color_eyre::install()?;
    env_logger::init();

    let config = ContextConfig::new("Red Window", WIDTH, HEIGHT)
        .with_validation(true);

    let mut renderer = Renderer::new();
    renderer.init(&config)?;

    while renderer.is_running() {
        renderer.poll_events()?;
        renderer.render(draw)?;
    }

    renderer.quit()?;

    Ok(())
}

fn draw(frame: &mut Frame<'_>) {
    frame.clear_screen(ClearColor::RED);
}
