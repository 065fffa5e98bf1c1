fn main() -> anyhow::Result<()> {
    graphstore_cli::run()
}
