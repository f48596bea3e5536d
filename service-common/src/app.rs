/// Run a service from a `run(Config)` function, loading `Config` from the environment.
#[macro_export]
macro_rules! app {
    () => {
        $crate::main!(run(Config::from_env()?).await)
    };
}

#[macro_export]
macro_rules! main {
    ($run:expr) => {{
        const VERSION: &str = env!("CARGO_PKG_VERSION");
        const NAME: &str = env!("CARGO_PKG_NAME");
        const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

        #[allow(unused_imports)]
        use $crate::config::ConfigFromEnv;

        $crate::app::init(NAME, VERSION, DESCRIPTION);

        return $run;
    }};
}

/// Load `.env` files and initialize logging.
pub fn init(name: &str, version: &str, description: &str) {
    dotenv::dotenv().ok();
    env_logger::init();

    log::info!("{} {} ({})", name, version, description);
}
