use std::time::Duration;

use pmocastcontrol::{DiscoveryOptions, discover_renderers};

fn main() -> Result<(), pmocastcontrol::DiscoveryError> {
    tracing_subscriber::fmt::init();

    let options = DiscoveryOptions {
        timeout: Duration::from_secs(5),
        ..DiscoveryOptions::default()
    };

    println!("Searching for MediaRenderers ({}s window)...", options.timeout.as_secs());
    let renderers = discover_renderers(&options)?;

    if renderers.is_empty() {
        println!("No MediaRenderer with AVTransport found.");
        return Ok(());
    }

    for (i, r) in renderers.iter().enumerate() {
        println!("{}. {} [{} / {}]", i + 1, r.friendly_name, r.manufacturer, r.model_name);
        println!("   udn:      {}", r.udn);
        println!("   desc:     {}", r.location);
        println!("   control:  {}", r.avtransport_control_url);
        println!("   server:   {}", r.server_header);
    }

    Ok(())
}
