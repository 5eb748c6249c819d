use relic_gallery::{run, Registry};

fn main() -> anyhow::Result<()> {
    run(Registry::museum())
}
