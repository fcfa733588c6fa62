// Entrypoint for the movie catalog.
// - Keeps `main` small: load config, build the store and lookup client, and
//   hand them to the menu loop.
// - Logs go to stderr at `warn` unless `RUST_LOG` says otherwise, so the
//   menu stays readable.

use anyhow::Context;
use movie_catalog::api::OmdbClient;
use movie_catalog::config::{config_path, load_config, validate_config};
use movie_catalog::dispatcher::Dispatcher;
use movie_catalog::site::SiteGenerator;
use movie_catalog::storage::open_store;
use movie_catalog::ui::{main_menu, SpinnerLookup};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config_path = config_path();
    info!("Loading configuration from {:?}", config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;
    validate_config(&config).context("Configuration validation failed")?;

    let store = open_store(config.storage.backend, config.storage.resolved_path());
    let lookup = SpinnerLookup::new(
        OmdbClient::new(&config.omdb).context("Failed to build OMDb client")?,
    );
    let site = SiteGenerator::new(config.site.clone());

    // Blocks until the user chooses "Exit".
    main_menu(Dispatcher::new(store.as_ref(), &lookup, &site))
}
