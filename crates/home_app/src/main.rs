use home_app::app::{run, AppConfig};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let input = std::env::args().nth(1);
    let result = AppConfig::from_env().and_then(|config| run(&config, input.as_deref()));
    if let Err(err) = result {
        eprintln!("home_rules failed: {err:#}");
        std::process::exit(1);
    }
}
