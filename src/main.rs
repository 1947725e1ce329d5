use log::{error, info, LevelFilter};
use log4rs_dynamic_filters::{default_deserializers, DynamicLevelFilter};

const LOG_CONFIG: &str = "log4rs.yaml";

async fn serve() -> Result<(), rocket::Error> {
    let rocket = roborumble_backend::build().ignite().await?;
    info!("Server ignited");
    // The request logger covers everything Rocket would print from here on.
    DynamicLevelFilter::set("rocket", LevelFilter::Off);
    rocket.launch().await?;
    Ok(())
}

#[rocket::main]
async fn main() {
    if let Err(e) = log4rs::init_file(LOG_CONFIG, default_deserializers()) {
        eprintln!("Failed to initialise logging from {LOG_CONFIG}: {e}");
        std::process::exit(1);
    }

    if let Err(e) = serve().await {
        error!("{e}");
        error!("Critical failure, shutting down");
        std::process::exit(1);
    }
}
