use boreas::{
    carto::grid::ProductKind,
    config::Configuration,
    gesture::{GestureInput, Phase},
    session::Session,
    source::{Archive, ProductSource, Synthetic},
    Result,
};
use chrono::{DateTime, Timelike, Utc};
use log::{error, info};
use std::{env, path::Path, path::PathBuf, process, time::Duration};

/// the most recent three hourly layer
fn latest() -> DateTime<Utc> {
    let now = Utc::now();
    now.date().and_hms(now.hour() / 3 * 3, 0, 0)
}

/// drag the globe sideways, let it settle, then click its centre
fn tour(session: &mut Session) {
    let view = *session.view();
    let (cx, cy) = (view.width as f64 / 2.0, view.height as f64 / 2.0);
    let scale = match session.globe() {
        Some(globe) => globe.projection.scale(),
        None => return,
    };

    let started = session.now();
    let at = |millis: u64| started + Duration::from_millis(millis);
    session.input(at(0), GestureInput::new(Phase::Start, cx, cy, scale));
    for step in 1..=12 {
        let x = cx + step as f64 * 8.0;
        session.input(at(step * 20), GestureInput::new(Phase::Move, x, cy, scale));
    }
    session.input(at(260), GestureInput::new(Phase::End, cx + 96.0, cy, scale));
    info!("dragged to {}", session.config().orientation);
    session.advance(at(4_000));

    session.input(at(4_100), GestureInput::new(Phase::Start, cx, cy, scale));
    session.input(at(4_150), GestureInput::new(Phase::End, cx, cy, scale));
    match session.describe_location() {
        Some(lines) => lines.iter().for_each(|line| info!("{}", line)),
        None => info!("nothing to report at the centre"),
    }
    session.toggle_units(ProductKind::Wind);
    session.advance(at(6_000));
}

fn run() -> Result<()> {
    let mut args = env::args().skip(1);
    let config = match args.next() {
        Some(path) => Configuration::load(Path::new(&path))?,
        None => Configuration::default(),
    };
    let out = PathBuf::from(args.next().unwrap_or_else(|| "out".to_string()));
    let source: Box<dyn ProductSource> = match &config.data_dir {
        Some(dir) => Box::new(Archive::new(dir.clone())),
        None => Box::new(Synthetic::new(latest(), config.seed)),
    };

    let mut session = Session::new(config, source)?;
    session.start();
    session.advance(Duration::from_secs(3));
    info!("status: {}", session.report().status_line());
    tour(&mut session);
    session.save(&out)
}

fn main() {
    pretty_env_logger::init_timed();
    info!("initialising boreas");
    if let Err(err) = run() {
        error!("{}", err);
        process::exit(1);
    }
    info!("session completed")
}
