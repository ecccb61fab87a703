#[macro_use]
extern crate log;

use env_logger::Env;

use drone_inspector::config::FlightParameters;
use drone_inspector::mission::FlightEvent;
use drone_inspector::sync::trigger::trigger;
use drone_inspector::InspectionController;
use simulator::{load_config, load_parameters, Dynamics, FileSink, Latch, Model};

type Matches<'a> = clap::ArgMatches<'a>;

fn parse<T: std::str::FromStr>(matches: &Matches, name: &str, default: &str) -> Result<T, String> {
    let value = matches.value_of(name).unwrap_or(default);
    value.parse::<T>().map_err(|_| format!("{} not a number: {}", name, value))
}

fn run(matches: &Matches) -> Result<(), String> {
    let config = load_config(matches.value_of("config").unwrap_or("config.json"))?;
    let params = match matches.value_of("parameters") {
        Some(path) => load_parameters(path)?,
        None => FlightParameters::default(),
    };
    let rate: usize = parse(matches, "rate", "50")?;
    if rate == 0 {
        return Err("Rate must be positive".to_owned());
    }
    let limit: f32 = parse(matches, "limit", "600")?;
    let mut abort_at: Option<f32> = match matches.value_of("abort-at") {
        Some(_) => Some(parse(matches, "abort-at", "0")?),
        None => None,
    };

    let directory = matches.value_of("output").unwrap_or("captures");
    let mut sink =
        FileSink::new(directory).map_err(|e| format!("Create {} failed: {}", directory, e))?;
    let (notifier, receiver) = trigger();
    let mut controller = InspectionController::new(&config, &params)
        .map_err(|e| format!("Invalid config: {}", e))?
        .with_abort(receiver);
    let hover_throttle = params.guidance.hover_throttle;
    let mut model = Model::new(Dynamics { hover_throttle, ..Default::default() });
    let mut latch = Latch::default();

    let dt = 1.0 / rate as f32;
    let mut elapsed = 0.0;
    while !controller.is_complete() {
        if elapsed > limit {
            return Err(format!("Inspection not complete after {}s", limit));
        }
        if abort_at.map(|at| elapsed >= at).unwrap_or(false) {
            notifier.set();
            abort_at = None;
        }
        let output = controller.step(&mut model, &mut latch, &mut sink, dt);
        for event in output.events.iter() {
            if let FlightEvent::Capture(_) = event {
                continue;
            }
            debug!("{}", serde_json::to_string(event).unwrap_or_default());
        }
        model.apply(&latch.motors, dt);
        elapsed += dt;
    }
    let count = sink.finish().map_err(|e| format!("Saving captures failed: {}", e))?;
    info!("Inspection complete in {:.1}s, {} captures saved to {}", elapsed, count, directory);
    Ok(())
}

fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    let option = |name: &'static str, help: &'static str| {
        clap::Arg::with_name(name).long(name).help(help).takes_value(true)
    };
    let matches = clap::App::new("simulator")
        .version("0.1")
        .author("qiuchengxuan")
        .about("Building inspection flight simulator")
        .arg(option("config", "Building config, defaults to config.json"))
        .arg(option("parameters", "Flight parameters"))
        .arg(option("output", "Capture directory, defaults to captures"))
        .arg(option("rate", "Control rate in Hz"))
        .arg(option("limit", "Give up after this many seconds"))
        .arg(option("abort-at", "Request abort after this many seconds"))
        .get_matches();
    if let Some(error) = run(&matches).err() {
        println!("{}", error);
        std::process::exit(1);
    }
}
