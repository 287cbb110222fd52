use flow_scene::{EngineOptions, app};

fn main() -> anyhow::Result<()> {
    app::run(EngineOptions::default())
}
