mod body;
mod err;
mod file;
mod mime;
mod opt;
mod routes;
mod server;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), err::DisplayError> {
    let opt::Options { verbose } = clap::Parser::parse();

    env_logger::Builder::new()
        .filter_level(match verbose {
            0 => log::LevelFilter::Info,
            1 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        })
        .init();

    let root = std::env::current_dir()?;
    server::run(server::PORT, routes::State::new(root)).await?;

    Ok(())
}
