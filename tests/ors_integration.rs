use std::time::{Duration, Instant};

use testcontainers::core::{IntoContainerPort, WaitFor};
use testcontainers::runners::SyncRunner;
use testcontainers::{Container, GenericImage, ImageExt, ReuseDirective, TestcontainersError};

use routing_tool::config::{IsochronesDefaults, SpeedProfile};
use routing_tool::context::{IsochroneOptions, RouteOptions};
use routing_tool::directions::DirectionsRequest;
use routing_tool::geometry::MultiPolygon;
use routing_tool::isochrones::IsochronesRequest;
use routing_tool::ors::{OrsClient, OrsConfig};
use routing_tool::traits::{DirectionsProvider, IsochronesProvider};

/// Heidelberg is the graph the stock image builds on first start.
const BISMARCKPLATZ: [f64; 2] = [8.6903, 49.4094];
const HAUPTBAHNHOF: [f64; 2] = [8.6756, 49.4036];

fn ors_container() -> Result<(Container<GenericImage>, String), TestcontainersError> {
    let image = GenericImage::new("openrouteservice/openrouteservice", "v8.0.0")
        .with_exposed_port(8082.tcp())
        .with_wait_for(WaitFor::seconds(5))
        .with_container_name("ors-heidelberg")
        .with_startup_timeout(Duration::from_secs(120))
        .with_reuse(ReuseDirective::Always);

    let container = image.start()?;
    let port = container.get_host_port_ipv4(8082.tcp())?;
    Ok((container, format!("http://127.0.0.1:{}/ors", port)))
}

/// Graph building takes a while after the container is up.
fn wait_until_ready(base_url: &str) -> bool {
    let url = format!("{}/v2/health", base_url);
    let start = Instant::now();
    while start.elapsed() < Duration::from_secs(300) {
        if let Ok(resp) = reqwest::blocking::get(&url) {
            let body = resp.text().unwrap_or_default();
            if body.contains("ready") {
                return true;
            }
        }
        std::thread::sleep(Duration::from_secs(2));
    }
    false
}

fn run<F: std::future::Future>(future: F) -> F::Output {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("build runtime")
        .block_on(future)
}

#[test]
#[ignore = "requires docker and an openrouteservice image"]
fn ors_directions_and_isochrones() {
    let (container, base_url) = ors_container().expect("start ORS container");
    if !wait_until_ready(&base_url) {
        if let Ok(stdout) = container.stdout_to_vec() {
            eprintln!("ORS stdout:\n{}", String::from_utf8_lossy(&stdout));
        }
        panic!("ORS did not become ready");
    }

    let client = OrsClient::new(OrsConfig {
        base_url,
        api_key: None,
        timeout_secs: Some(30),
    })
    .expect("build ORS client");

    let options = RouteOptions {
        language: "en".to_string(),
        speed_profile: SpeedProfile::DrivingCar,
        avoid_features: Vec::new(),
        preference: Default::default(),
        instructions: true,
    };
    let request = DirectionsRequest::new(
        vec![BISMARCKPLATZ, HAUPTBAHNHOF],
        &options,
        MultiPolygon::default(),
    );
    let route = run(client.directions(&request)).expect("directions");
    assert!(route.distance > 0.0);
    assert!(route.coordinates.len() >= 2);
    assert_eq!(route.way_points.len(), 2);
    assert_eq!(route.way_points[1], route.coordinates.len() - 1);

    let defaults = IsochronesDefaults::default();
    let options = IsochroneOptions {
        speed_profile: SpeedProfile::DrivingCar,
        optimization: defaults.optimization,
        value: 10.0,
        interval: 5.0,
        avoid_features: Vec::new(),
    };
    let request = IsochronesRequest::new(BISMARCKPLATZ, &options, MultiPolygon::default());
    let areas = run(client.isochrones(&request)).expect("isochrones");
    assert_eq!(areas.features.len(), 2);
    assert!(areas.features[0].value < areas.features[1].value);

    drop(container);
}
