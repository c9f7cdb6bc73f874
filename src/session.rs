use crate::{
    agents::{
        agent::{Agent, Ticket},
        graph::{Pipeline, Reaction, Signal, Stage},
        scheduler::{Job, Scheduler},
    },
    carto::{
        datum::DatumRe,
        globe::{Globe, View},
        grid::ProductKind,
        mesh::{Detail, Mesh},
    },
    config::{Attribute, Change, ChangeSource, Changed, Configuration, OverlayType},
    error::Result,
    flow::{
        animate::{Animation, Frame},
        field::VectorField,
        interpolate::{Grids, Interpolation, Sweep},
    },
    gesture::{GestureInput, GestureInterpreter, MoveEvent},
    imaging::{
        canvas::Canvas,
        overlay::Overlay,
        render::{render_map, save_map},
    },
    location::{Location, LocationDetails},
    report::Report,
    source::ProductSource,
    units::UnitToggle,
    vars::{FRAME_RATE, MAX_TASK_TIME, MIN_SLEEP_TIME},
};
use geo::Coordinate;
use log::{debug, info, trace};
use rand::{rngs::StdRng, SeedableRng};
use std::{fs, path::Path, sync::Arc, time::Duration};
use svg::Document;

/// whether a configuration change makes the loaded grids stale
///
/// an overlay change only matters when the current overlay grid cannot already show it
pub fn needs_new_grids(changed: &Changed, config: &Configuration, grids: Option<&Grids>) -> bool {
    if changed.any(&[Attribute::Date, Attribute::Hour, Attribute::Param]) {
        return true;
    }
    if !changed.contains(Attribute::OverlayType) || config.overlay_type == OverlayType::Off {
        return false;
    }
    match (grids, config.overlay_type.product()) {
        (None, _) => true,
        (Some(grids), None) => grids.has_distinct_overlay(),
        (Some(grids), Some(kind)) => grids.overlay.kind != kind,
    }
}

/// one user looking at one globe: every agent, the clock, and the outputs they produce
pub struct Session {
    config: Configuration,
    view: View,
    report: Report,
    pipeline: Pipeline,
    scheduler: Scheduler,
    gestures: GestureInterpreter,
    source: Box<dyn ProductSource>,
    now: Duration,

    mesh: Agent<Mesh>,
    globe: Agent<Globe>,
    grid: Agent<Grids>,
    renderer: Agent<Document>,
    field: Agent<Arc<VectorField>>,
    animator: Agent<Animation>,
    overlay: Agent<Overlay>,

    /// the interpolation yielding between batches, under the ticket it serves
    sweep: Option<(Ticket, Interpolation)>,
    overlay_request: Option<OverlayType>,
    detail: Detail,
    canvas: Canvas,
    location: Option<Location>,
    details: Option<LocationDetails>,
    units: Vec<(ProductKind, UnitToggle)>,
    spawned: u64,
}

/// store a task outcome, reporting whether the agent took it
fn resolve<T>(agent: &mut Agent<T>, report: &mut Report, ticket: &Ticket, result: Result<T>) -> bool {
    match result {
        Ok(value) => agent.accept(ticket, value),
        Err(err) => {
            if let Some(err) = agent.reject(ticket, err) {
                report.error(&err);
            }
            false
        }
    }
}

impl Session {
    pub fn new(config: Configuration, source: Box<dyn ProductSource>) -> Result<Self> {
        let view = config.view();
        info!("session of {}x{}", view.width, view.height);
        Ok(Self {
            pipeline: Pipeline::standard()?,
            canvas: Canvas::new(view.width, view.height),
            view,
            config,
            report: Report::new(),
            scheduler: Scheduler::new(),
            gestures: GestureInterpreter::new(),
            source,
            now: Duration::ZERO,
            mesh: Agent::new(Stage::Mesh),
            globe: Agent::new(Stage::Globe),
            grid: Agent::new(Stage::Grid),
            renderer: Agent::new(Stage::Renderer),
            field: Agent::new(Stage::Field),
            animator: Agent::new(Stage::Animator),
            overlay: Agent::new(Stage::Overlay),
            sweep: None,
            overlay_request: None,
            detail: Detail::High,
            location: None,
            details: None,
            units: vec![],
            spawned: 0,
        })
    }

    /// build everything the configuration asks for
    pub fn start(&mut self) {
        self.submit(Stage::Mesh);
        self.submit(Stage::Globe);
        self.submit(Stage::Grid);
    }

    /* # clock */

    /// run the debounced gesture end and every job that has come due
    pub fn tick(&mut self, now: Duration) {
        self.now = self.now.max(now);
        let events = self.gestures.poll(self.now);
        if events.contains(&MoveEvent::MoveEnd) {
            self.persist_orientation();
        }
        self.on_moves(events);
        while let Some(job) = self.scheduler.pop_due(self.now) {
            self.run(job);
        }
    }

    /// tick through every due moment up to a time
    pub fn advance(&mut self, until: Duration) {
        while let Some(due) = self.next_due().filter(|due| *due <= until) {
            self.tick(due);
        }
        self.tick(until);
    }

    pub fn next_due(&self) -> Option<Duration> {
        match (self.scheduler.next_due(), self.gestures.next_due()) {
            (Some(job), Some(gesture)) => Some(job.min(gesture)),
            (job, gesture) => job.or(gesture),
        }
    }

    pub fn now(&self) -> Duration {
        self.now
    }

    /* # inputs */

    /// deliver a pointer or zoom event, ignored until the globe is on screen
    pub fn input(&mut self, now: Duration, input: GestureInput) {
        self.tick(now);
        if self.renderer.value().is_none() {
            return;
        }
        let events = match self.globe.value_mut() {
            Some(globe) => self.gestures.handle(input, self.now, globe),
            None => return,
        };
        self.on_moves(events);
    }

    /// change settings the way a user or the navigation buttons would
    pub fn configure(&mut self, changes: Vec<Change>, source: ChangeSource) -> Changed {
        let changed = self.config.save(changes, source);
        if changed.is_empty() {
            return changed;
        }
        self.report.reset();
        if changed.contains(Attribute::Topology) {
            self.submit(Stage::Mesh);
        }
        if changed.contains(Attribute::Projection) {
            self.submit(Stage::Globe);
        }
        if needs_new_grids(&changed, &self.config, self.grid.value()) {
            self.submit(Stage::Grid);
        }
        if changed.contains(Attribute::Orientation) {
            self.reorient(source);
        }
        if changed.any(&[Attribute::OverlayType, Attribute::ShowGridPoints]) {
            self.submit(Stage::Overlay);
        }
        changed
    }

    /// step to the neighbouring layer in time, unless grids are still loading
    pub fn navigate(&mut self, step: i64) {
        if self.grid.is_requested() {
            debug!("navigation ignored while grids load");
            return;
        }
        let moment = match self.grid.value() {
            Some(grids) => grids.primary.navigate(step),
            None => return,
        };
        self.configure(Configuration::moment_changes(&moment), ChangeSource::Navigation);
    }

    /// cycle the units a product is described in
    pub fn toggle_units(&mut self, kind: ProductKind) {
        match self.units.iter_mut().find(|(unit_kind, _)| *unit_kind == kind) {
            Some((_, toggle)) => toggle.next(),
            None => {
                let mut toggle = UnitToggle::new(kind.units());
                toggle.next();
                self.units.push((kind, toggle));
            }
        }
    }

    /* # outputs */

    pub fn config(&self) -> &Configuration {
        &self.config
    }

    pub fn view(&self) -> &View {
        &self.view
    }

    pub fn report(&self) -> &Report {
        &self.report
    }

    pub fn globe(&self) -> Option<&Globe> {
        self.globe.value()
    }

    pub fn grids(&self) -> Option<&Grids> {
        self.grid.value()
    }

    pub fn map(&self) -> Option<&Document> {
        self.renderer.value()
    }

    pub fn detail(&self) -> Detail {
        self.detail
    }

    pub fn field(&self) -> Option<&Arc<VectorField>> {
        self.field.value()
    }

    pub fn is_interpolating(&self) -> bool {
        self.field.is_requested()
    }

    pub fn animation(&self) -> Option<&Animation> {
        self.animator.value()
    }

    pub fn is_animating(&self) -> bool {
        self.animator
            .token()
            .map_or(false, |token| !token.is_cancelled())
            && self.animator.value().is_some()
    }

    pub fn canvas(&self) -> &Canvas {
        &self.canvas
    }

    pub fn overlay(&self) -> Option<&Overlay> {
        self.overlay.value()
    }

    pub fn location(&self) -> Option<&LocationDetails> {
        self.details.as_ref()
    }

    pub fn units(&self, kind: ProductKind) -> UnitToggle {
        self.units
            .iter()
            .find(|(unit_kind, _)| *unit_kind == kind)
            .map(|(_, toggle)| toggle.clone())
            .unwrap_or_else(|| UnitToggle::new(kind.units()))
    }

    /// coordinates, then the vector and the overlay value in the chosen units
    pub fn describe_location(&self) -> Option<Vec<String>> {
        let details = self.details.as_ref()?;
        let mut lines = vec![details.coordinates()];
        if let Some(grids) = self.grid.value() {
            lines.extend(details.describe_vector(&self.units(grids.primary.kind)));
            lines.extend(details.describe_overlay(&self.units(grids.overlay.kind)));
        }
        Some(lines)
    }

    /// write the map, the particle trails, the overlay and its legend into a directory
    pub fn save(&self, dir: &Path) -> Result<()> {
        fs::create_dir_all(dir)?;
        if let Some(map) = self.renderer.value() {
            save_map(&dir.join("map.svg"), map)?;
        }
        self.canvas.raster().save(&dir.join("animation.tif"))?;
        if let Some(overlay) = self.overlay.value() {
            overlay.save(&dir.join("overlay.tif"), &dir.join("legend.tif"))?;
        }
        info!("saved session images to {}", dir.display());
        Ok(())
    }

    /* # wiring */

    fn submit(&mut self, stage: Stage) {
        let ticket = match stage {
            Stage::Mesh => self.mesh.submit(),
            Stage::Globe => self.globe.submit(),
            Stage::Grid => self.grid.submit(),
            Stage::Renderer => self.renderer.submit(),
            Stage::Field => self.field.submit(),
            Stage::Animator => self.animator.submit(),
            Stage::Overlay => {
                self.overlay_request = Some(self.config.overlay_type);
                self.overlay.submit()
            }
        };
        self.scheduler.schedule(self.now, Job::Run(ticket));
        self.emit(stage, Signal::Submit);
    }

    fn cancel(&mut self, stage: Stage) {
        match stage {
            Stage::Mesh => self.mesh.cancel(),
            Stage::Globe => self.globe.cancel(),
            Stage::Grid => self.grid.cancel(),
            Stage::Renderer => self.renderer.cancel(),
            Stage::Field => self.field.cancel(),
            Stage::Animator => self.animator.cancel(),
            Stage::Overlay => self.overlay.cancel(),
        }
    }

    fn emit(&mut self, stage: Stage, signal: Signal) {
        for (target, reaction) in self.pipeline.reactions(stage, signal) {
            trace!("{:?} {:?} -> {:?} {:?}", stage, signal, target, reaction);
            match reaction {
                Reaction::Submit => self.submit(target),
                Reaction::Cancel => self.cancel(target),
                Reaction::Stop { clear } => {
                    self.cancel(target);
                    if clear {
                        self.canvas.clear();
                    }
                }
                Reaction::Blank => {
                    self.submit(target);
                    self.overlay_request = None;
                }
            }
        }
    }

    fn run(&mut self, job: Job) {
        match job {
            Job::Run(ticket) if ticket.is_cancelled() => {
                trace!("{:?} task cancelled before it started", ticket.stage)
            }
            Job::Run(ticket) => self.perform(ticket),
            Job::Sweep(ticket) => {
                if self.field.is_latest(&ticket) {
                    self.continue_sweep();
                }
            }
            Job::Frame(ticket) => self.frame(ticket),
        }
    }

    fn perform(&mut self, ticket: Ticket) {
        match ticket.stage {
            Stage::Mesh => {
                self.report.status("Downloading...");
                let mesh = match &self.config.topology {
                    Some(path) => Mesh::load(path),
                    None => Ok(Mesh::synthetic(self.config.seed)),
                };
                if resolve(&mut self.mesh, &mut self.report, &ticket, mesh) {
                    self.emit(Stage::Mesh, Signal::Update);
                }
            }
            Stage::Globe => {
                self.report.status("Building globe...");
                let view = self.view;
                let globe = self
                    .config
                    .globe_kind()
                    .map(|kind| Globe::new(kind, &view));
                if resolve(&mut self.globe, &mut self.report, &ticket, globe) {
                    self.emit(Stage::Globe, Signal::Update);
                }
            }
            Stage::Grid => {
                self.report.status("Downloading...");
                let grids = self.build_grids();
                if resolve(&mut self.grid, &mut self.report, &ticket, grids) {
                    self.emit(Stage::Grid, Signal::Update);
                }
            }
            Stage::Renderer => self.render(ticket),
            Stage::Field => self.interpolate(ticket),
            Stage::Animator => self.animate(ticket),
            Stage::Overlay => self.draw_overlay(ticket),
        }
    }

    /* # tasks */

    fn build_grids(&self) -> Result<Grids> {
        let moment = self.config.moment()?;
        let primary_kind = self.config.param.product();
        let overlay_kind = self
            .config
            .overlay_type
            .product()
            .unwrap_or(primary_kind);
        let primary = Arc::new(self.source.fetch(primary_kind, moment)?);
        if overlay_kind == primary_kind {
            Ok(Grids::single(primary))
        } else {
            let overlay = Arc::new(self.source.fetch(overlay_kind, moment)?);
            Ok(Grids::new(primary, overlay))
        }
    }

    /// draw the map, then hand the globe to the gesture interpreter
    fn render(&mut self, ticket: Ticket) {
        let map = match (self.mesh.value(), self.globe.value()) {
            (Some(mesh), Some(globe)) => {
                self.report.status("Rendering Globe...");
                render_map(globe, &self.view, mesh, Detail::High, self.location.map(|location| location.coord))
            }
            _ => {
                self.renderer.settle(&ticket);
                return;
            }
        };
        self.detail = Detail::High;
        if self.renderer.accept(&ticket, map) {
            self.report.status("");
            self.emit(Stage::Renderer, Signal::Update);
            self.reorient(ChangeSource::Startup);
        }
    }

    fn interpolate(&mut self, ticket: Ticket) {
        let started = match (self.globe.value(), self.grid.value()) {
            (Some(globe), Some(grids)) => Interpolation::new(globe, &self.view, grids.clone()),
            _ => {
                self.field.settle(&ticket);
                return;
            }
        };
        match started {
            Ok(interpolation) => {
                self.report.status("Interpolating...");
                self.sweep = Some((ticket, interpolation));
                self.continue_sweep();
            }
            Err(err) => {
                if let Some(err) = self.field.reject(&ticket, err) {
                    self.report.error(&err);
                }
            }
        }
    }

    /// one batch of the running interpolation, yielding back to the scheduler when over budget
    fn continue_sweep(&mut self) {
        let (ticket, mut interpolation) = match self.sweep.take() {
            Some(sweep) => sweep,
            None => return,
        };
        let outcome = if self.config.parallel_sweep {
            interpolation.sweep_parallel(ticket.token())
        } else {
            interpolation.step(Duration::from_millis(MAX_TASK_TIME), ticket.token())
        };
        match outcome {
            Sweep::Pending(progress) => {
                self.report.progress(progress);
                self.scheduler
                    .after(self.now, MIN_SLEEP_TIME, Job::Sweep(ticket.clone()));
                self.sweep = Some((ticket, interpolation));
            }
            Sweep::Cancelled => {
                debug!("interpolation cancelled");
                self.report.hide_progress();
            }
            Sweep::Complete(field) => {
                self.report.progress(1.0);
                if self.field.accept(&ticket, Arc::new(field)) {
                    self.report.status("");
                    self.emit(Stage::Field, Signal::Update);
                    self.update_details();
                }
            }
        }
    }

    fn animate(&mut self, ticket: Ticket) {
        let tuning = self
            .grid
            .value()
            .and_then(|grids| grids.primary.particles());
        let (field, tuning) = match (self.field.value(), tuning) {
            (Some(field), Some(tuning)) => (field.clone(), tuning),
            _ => {
                self.animator.settle(&ticket);
                return;
            }
        };
        self.spawned += 1;
        let rng = StdRng::seed_from_u64(self.config.seed as u64 + self.spawned);
        let animation = Animation::new(field, tuning, &self.view, rng);
        // the frame loop of a replaced animation never runs again, so its field goes here
        if let Some(previous) = self.animator.take() {
            if !Arc::ptr_eq(previous.field(), animation.field()) {
                previous.field().release();
            }
        }
        if self.animator.accept(&ticket, animation) {
            self.emit(Stage::Animator, Signal::Update);
            self.frame(ticket);
        }
    }

    fn frame(&mut self, ticket: Ticket) {
        if !self.animator.is_latest(&ticket) {
            return;
        }
        let animation = match self.animator.value_mut() {
            Some(animation) => animation,
            None => return,
        };
        match animation.frame(&mut self.canvas, ticket.token()) {
            Ok(Frame::Drawn) => self.scheduler.after(self.now, FRAME_RATE, Job::Frame(ticket)),
            Ok(Frame::Stopped) => debug!("animation stopped"),
            Err(err) => self.report.error(&err),
        }
    }

    fn draw_overlay(&mut self, ticket: Ticket) {
        let overlay = match self.field.value() {
            Some(field) => Overlay::draw(
                field,
                &self.view,
                self.overlay_request,
                self.grid.value(),
                self.globe.value(),
                self.config.show_grid_points,
            ),
            None => {
                self.overlay.settle(&ticket);
                return;
            }
        };
        if self.overlay.accept(&ticket, overlay) {
            self.emit(Stage::Overlay, Signal::Update);
        }
    }

    /* # moves */

    fn on_moves(&mut self, events: Vec<MoveEvent>) {
        for event in events {
            match event {
                MoveEvent::MoveStart => {
                    self.detail = Detail::Low;
                    self.redraw_map();
                    self.emit(Stage::Renderer, Signal::Start);
                }
                MoveEvent::Move => {
                    self.redraw_map();
                    self.emit(Stage::Renderer, Signal::Redraw);
                }
                MoveEvent::MoveEnd => {
                    self.detail = Detail::High;
                    self.redraw_map();
                    self.emit(Stage::Renderer, Signal::Render);
                }
                MoveEvent::Click { point, coord } => self.click(point, coord),
            }
        }
    }

    fn redraw_map(&mut self) {
        let mark = self.location.map(|location| location.coord);
        if let (Some(mesh), Some(globe), Some(map)) = (
            self.mesh.value(),
            self.globe.value(),
            self.renderer.value_mut(),
        ) {
            *map = render_map(globe, &self.view, mesh, self.detail, mark);
        }
    }

    /// apply the configured orientation, unless it came from the move that just ended
    fn reorient(&mut self, source: ChangeSource) {
        if self.renderer.value().is_none() {
            return;
        }
        let orientation = self.config.orientation();
        let events = match self.globe.value_mut() {
            Some(globe) => self
                .gestures
                .reorient(globe, &orientation, &self.view, source),
            None => return,
        };
        self.on_moves(events);
    }

    fn persist_orientation(&mut self) {
        if let Some(globe) = self.globe.value() {
            let orientation = globe.orientation().to_string();
            self.configure(vec![Change::Orientation(orientation)], ChangeSource::MoveEnd);
        }
    }

    fn click(&mut self, point: DatumRe, coord: Option<Coordinate<f64>>) {
        let coord = match coord {
            Some(coord) => coord,
            None => return,
        };
        let inside = self
            .field
            .value()
            .map_or(false, |field| field.is_inside_boundary(point.x, point.y));
        if !inside {
            return;
        }
        self.location = Some(Location { point, coord });
        self.redraw_map();
        self.update_details();
    }

    /// look the active location up again, following the globe if it turned
    fn update_details(&mut self) {
        let location = match (self.location, self.globe.value()) {
            (Some(location), Some(globe)) if globe.projection.is_visible(location.coord) => {
                Location {
                    point: globe.projection.project(location.coord),
                    coord: location.coord,
                }
            }
            _ => return,
        };
        if let (Some(field), Some(grids)) = (self.field.value(), self.grid.value()) {
            if let Some(details) = LocationDetails::inspect(location, field, grids) {
                self.location = Some(location);
                self.details = Some(details);
            }
        }
    }
}
