use crate::client::RecordSource;
use crate::record::PollutionRecord;
use crate::session::{CycleOutcome, DashboardSession};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Drives fetch/render cycles.
///
/// Fetches run on a worker thread; their complete result is applied to the
/// session on the caller's thread, one cycle at a time. At most one fetch is
/// in flight and it cannot be cancelled.
pub struct Orchestrator {
    source: Arc<dyn RecordSource>,
    /// Result channel of the running fetch; its worker holds the only sender
    pending: Option<Receiver<Vec<PollutionRecord>>>,
    /// Periodic refresh interval; `None` loads once
    interval: Option<Duration>,
    last_started: Option<Instant>,
    last_applied: Option<Instant>,
    cycles: u64,
}

impl Orchestrator {
    pub fn new(source: Arc<dyn RecordSource>, interval: Option<Duration>) -> Self {
        Self {
            source,
            pending: None,
            interval,
            last_started: None,
            last_applied: None,
            cycles: 0,
        }
    }

    /// Fetch and apply one cycle on the calling thread
    pub fn run_cycle(&mut self, session: &mut DashboardSession) -> CycleOutcome {
        let records = self.source.fetch_latest();
        self.finish(session, &records)
    }

    /// Start a background fetch. Returns false if one is already running.
    pub fn request_refresh(&mut self) -> bool {
        if self.pending.is_some() {
            return false;
        }

        let source = Arc::clone(&self.source);
        let (tx, rx) = mpsc::channel();
        let spawned = thread::Builder::new()
            .name("aqi-fetch".into())
            .spawn(move || {
                let _ = tx.send(source.fetch_latest());
            });

        match spawned {
            Ok(_) => {
                self.pending = Some(rx);
                self.last_started = Some(Instant::now());
                true
            }
            Err(err) => {
                warn!(%err, "could not spawn fetch thread");
                false
            }
        }
    }

    /// Apply a finished background fetch, if any
    pub fn poll(&mut self, session: &mut DashboardSession) -> Option<CycleOutcome> {
        let records = match self.pending.as_ref()?.try_recv() {
            Ok(records) => records,
            Err(TryRecvError::Empty) => return None,
            Err(TryRecvError::Disconnected) => {
                warn!("fetch thread exited without a result");
                Vec::new()
            }
        };
        self.pending = None;
        Some(self.finish(session, &records))
    }

    /// Kick off the periodic refresh when it is due
    pub fn tick(&mut self, now: Instant) -> bool {
        let Some(interval) = self.interval else {
            return false;
        };
        let due = self
            .last_started
            .map_or(true, |started| now.duration_since(started) >= interval);
        due && self.request_refresh()
    }

    fn finish(
        &mut self,
        session: &mut DashboardSession,
        records: &[PollutionRecord],
    ) -> CycleOutcome {
        self.cycles += 1;
        let outcome = session.apply(records);
        if let CycleOutcome::Rendered { .. } = outcome {
            self.last_applied = Some(Instant::now());
        }
        info!(cycle = self.cycles, ?outcome, "refresh cycle finished");
        outcome
    }

    pub fn is_fetching(&self) -> bool {
        self.pending.is_some()
    }

    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// When data was last rendered
    pub fn last_applied(&self) -> Option<Instant> {
        self.last_applied
    }

    pub fn interval(&self) -> Option<Duration> {
        self.interval
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{parse_records, DataClient, FetchError};
    use crate::color::{category_color, Rgb};
    use crate::dashboard::Slot;
    use crate::map::MarkerPolicy;
    use crate::record::Category;
    use std::net::TcpListener;

    /// Replays a fixed JSON body as the backend response
    struct StubSource {
        body: &'static str,
    }

    impl RecordSource for StubSource {
        fn fetch_records(&self) -> Result<Vec<PollutionRecord>, FetchError> {
            let mut bytes = self.body.as_bytes().to_vec();
            parse_records(&mut bytes).map_err(|source| FetchError::Malformed {
                url: "stub".into(),
                source,
            })
        }
    }

    fn orchestrator(body: &'static str) -> Orchestrator {
        Orchestrator::new(Arc::new(StubSource { body }), None)
    }

    fn session() -> DashboardSession {
        DashboardSession::new(None, MarkerPolicy::Replace)
    }

    const SCENARIO_ONE: &str = r#"[{"location":"X","latitude":10,"longitude":20,"aqi":42,"category":"Good","pm25":5,"pm10":10,"no2":3,"co":200,"o3":8,"so2":1}]"#;

    #[test]
    fn test_single_good_record_end_to_end() {
        let mut session = session();
        let outcome = orchestrator(SCENARIO_ONE).run_cycle(&mut session);
        assert_eq!(outcome, CycleOutcome::Rendered { records: 1 });

        let good = category_color(Category::Good);
        assert_eq!(session.slots.text(Slot::AqiValue), Some("42"));
        assert_eq!(session.slots.text(Slot::AqiCategory), Some("Good"));
        assert_eq!(session.slots.color(Slot::AqiValue), Some(good));

        let markers = session.map.markers();
        assert_eq!(markers.len(), 1);
        assert_eq!((markers[0].lat, markers[0].lon), (10.0, 20.0));
        assert_eq!(markers[0].style.fill, good);

        let vp = session.map.viewport();
        assert_eq!((vp.center_lat, vp.center_lon, vp.level), (10.0, 20.0, 5.0));

        assert_eq!(
            session.chart.chart().unwrap().values(),
            vec![Some(5.0), Some(10.0), Some(3.0), Some(2.0), Some(8.0), Some(1.0)]
        );
    }

    #[test]
    fn test_network_failure_renders_nothing() {
        let port = TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port();
        let client =
            DataClient::new(&format!("http://127.0.0.1:{port}"), Duration::from_secs(2)).unwrap();
        let mut orchestrator = Orchestrator::new(Arc::new(client), None);

        // Seed some prior state, then fail
        let mut session = session();
        session.apply(&[PollutionRecord::sample("Old", 1.0, 1.0, 7, "Good")]);
        let slots = session.slots.clone();

        assert_eq!(orchestrator.run_cycle(&mut session), CycleOutcome::NoData);
        assert_eq!(session.slots, slots);
        assert_eq!(session.map.markers().len(), 1);
        assert_eq!(session.chart.canvas().constructed(), 1);
        assert_eq!(session.chart.canvas().live_instances(), 1);
    }

    #[test]
    fn test_failure_on_fresh_session_leaves_it_blank() {
        let mut session = session();
        let outcome = orchestrator("this is not json").run_cycle(&mut session);

        assert_eq!(outcome, CycleOutcome::NoData);
        assert!(session.slots.is_empty());
        assert!(session.map.markers().is_empty());
        assert!(session.chart.chart().is_none());
        assert_eq!(session.chart.canvas().constructed(), 0);
    }

    #[test]
    fn test_empty_array_renders_nothing() {
        let mut session = session();
        assert_eq!(orchestrator("[]").run_cycle(&mut session), CycleOutcome::NoData);
        assert!(session.slots.is_empty());
        assert!(session.map.markers().is_empty());
        assert_eq!(session.chart.canvas().constructed(), 0);
    }

    #[test]
    fn test_latest_is_first_element() {
        let body = r#"[
            {"location":"New","latitude":1,"longitude":2,"aqi":310,"category":"Hazardous","pm25":1,"pm10":1,"no2":1,"co":1,"o3":1,"so2":1},
            {"location":"Old","latitude":3,"longitude":4,"aqi":20,"category":"Good","pm25":1,"pm10":1,"no2":1,"co":1,"o3":1,"so2":1}
        ]"#;
        let mut session = session();
        orchestrator(body).run_cycle(&mut session);

        assert_eq!(session.slots.text(Slot::AqiValue), Some("310"));
        assert_eq!(session.slots.color(Slot::AqiValue), Some(Rgb::hex(0x881337)));
        assert_eq!(session.map.viewport().center_lat, 1.0);
        assert_eq!(session.map.markers().len(), 2);
    }

    #[test]
    fn test_background_refresh_applies_whole_cycle() {
        let mut orchestrator = orchestrator(SCENARIO_ONE);
        let mut session = session();

        assert!(orchestrator.request_refresh());
        assert!(!orchestrator.request_refresh(), "second fetch while in flight");

        let deadline = Instant::now() + Duration::from_secs(5);
        let outcome = loop {
            if let Some(outcome) = orchestrator.poll(&mut session) {
                break outcome;
            }
            assert!(Instant::now() < deadline, "fetch never completed");
            thread::sleep(Duration::from_millis(5));
        };

        assert_eq!(outcome, CycleOutcome::Rendered { records: 1 });
        assert!(!orchestrator.is_fetching());
        assert_eq!(orchestrator.cycles(), 1);
        assert!(orchestrator.last_applied().is_some());
        assert_eq!(session.map.markers().len(), 1);
    }

    struct PanickingSource;

    impl RecordSource for PanickingSource {
        fn fetch_records(&self) -> Result<Vec<PollutionRecord>, FetchError> {
            panic!("worker blew up");
        }
    }

    #[test]
    fn test_dead_worker_frees_the_fetch_slot() {
        let mut orchestrator = Orchestrator::new(Arc::new(PanickingSource), None);
        let mut session = session();
        session.apply(&[PollutionRecord::sample("Old", 1.0, 1.0, 7, "Good")]);

        assert!(orchestrator.request_refresh());
        let deadline = Instant::now() + Duration::from_secs(5);
        let outcome = loop {
            if let Some(outcome) = orchestrator.poll(&mut session) {
                break outcome;
            }
            assert!(Instant::now() < deadline, "dead worker never noticed");
            thread::sleep(Duration::from_millis(5));
        };

        assert_eq!(outcome, CycleOutcome::NoData);
        assert!(!orchestrator.is_fetching());
        assert_eq!(session.slots.text(Slot::LocationLabel), Some("Old (1, 1)"));
        assert!(orchestrator.request_refresh(), "later refreshes must still start");
    }

    #[test]
    fn test_tick_respects_interval() {
        let mut once = orchestrator("[]");
        assert!(!once.tick(Instant::now()));

        let mut periodic = Orchestrator::new(
            Arc::new(StubSource { body: "[]" }),
            Some(Duration::from_secs(60)),
        );
        let start = Instant::now();
        assert!(periodic.tick(start));

        let mut session = session();
        let deadline = Instant::now() + Duration::from_secs(5);
        while periodic.poll(&mut session).is_none() {
            assert!(Instant::now() < deadline);
            thread::sleep(Duration::from_millis(5));
        }
        // Not due yet
        assert!(!periodic.tick(start + Duration::from_secs(1)));
    }
}
