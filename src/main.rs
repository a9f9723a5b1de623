fn main() -> anyhow::Result<()> {
    coffee_scene::app::run()
}
