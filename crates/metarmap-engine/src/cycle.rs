//! One end-to-end polling cycle: reset, blank the display, stream the
//! document under the idle timeout, and surface an outcome.
//!
//! The cycle reads the stream in small fixed-size chunks, each read bounded
//! by the idle timeout rather than a whole-document deadline -- the
//! document is unbounded and may legitimately stream for a long time as
//! long as bytes keep arriving. Display refreshes are amortized (every
//! `refresh_after` bytes, not per byte) so a fast stream cannot saturate
//! the display interface, with one guaranteed final push however the cycle
//! ends.

use std::fmt;
use std::time::Duration;

use tracing::{debug, info, warn};

use metarmap_core::{DisplaySink, Error, FeedStream, Transport};

use crate::associate::{StationAssociator, CATEGORY_TAG, STATION_TAG};
use crate::registry::AirportRegistry;
use crate::scanner::TagScanner;

/// Stack read buffer size. Small on purpose: the engine must behave
/// identically whether the transport delivers single bytes or large
/// chunks, and a small buffer keeps refreshes responsive on slow feeds.
const READ_BUF_LEN: usize = 256;

/// Default per-read idle timeout.
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(10);

/// Default byte interval between amortized display refreshes.
pub const DEFAULT_REFRESH_AFTER: usize = 4096;

/// Tunables for one fetch cycle.
#[derive(Debug, Clone)]
pub struct CycleConfig {
    /// Maximum duration with no new bytes before the cycle is abandoned.
    pub idle_timeout: Duration,
    /// Bytes processed between intermediate display refreshes.
    pub refresh_after: usize,
}

impl Default for CycleConfig {
    fn default() -> Self {
        CycleConfig {
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
            refresh_after: DEFAULT_REFRESH_AFTER,
        }
    }
}

/// How a fetch cycle ended.
///
/// Never an `Err`: a cycle failure is an expected operating condition
/// reported to the caller, and the next scheduled cycle proceeds
/// unconditionally.
#[derive(Debug)]
pub enum CycleOutcome {
    /// At least one byte was processed. Airports mentioned before any
    /// truncation keep their derived classification.
    Success {
        /// Total bytes fed through the scanner.
        bytes: usize,
    },
    /// The idle bound expired with zero bytes read.
    Timeout,
    /// The stream could not be opened, or dropped before any byte arrived.
    TransportFailed(Error),
}

impl fmt::Display for CycleOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CycleOutcome::Success { bytes } => write!(f, "success ({bytes} bytes)"),
            CycleOutcome::Timeout => write!(f, "timed out with no data"),
            CycleOutcome::TransportFailed(e) => write!(f, "transport failed: {e}"),
        }
    }
}

/// Orchestrates polling cycles. Owns the scanner and associator so their
/// buffers are reused across cycles; both are reset at every cycle start.
#[derive(Debug)]
pub struct FetchCycle {
    scanner: TagScanner,
    associator: StationAssociator,
    config: CycleConfig,
}

impl FetchCycle {
    pub fn new(config: CycleConfig) -> Self {
        let mut scanner = TagScanner::new();
        scanner.watch(STATION_TAG);
        scanner.watch(CATEGORY_TAG);
        FetchCycle {
            scanner,
            associator: StationAssociator::new(),
            config,
        }
    }

    /// Run one cycle against the given transport, registry, and display.
    pub async fn run(
        &mut self,
        transport: &mut dyn Transport,
        registry: &mut AirportRegistry,
        sink: &mut dyn DisplaySink,
    ) -> CycleOutcome {
        // 1. Clean slate: no residue from the previous document.
        registry.reset();
        self.scanner.reset();
        self.associator.reset();

        // 2. Blank before refresh: if the fetch fails outright, the map
        //    shows all-off rather than stale colors.
        push_frame(registry, sink);

        // 3. Open the document stream.
        let query = registry.query();
        let mut stream = match transport.open(&query).await {
            Ok(stream) => stream,
            Err(e) => {
                warn!(error = %e, "failed to open weather stream");
                push_frame(registry, sink);
                return CycleOutcome::TransportFailed(e);
            }
        };

        // 4. Pump bytes until the stream ends or goes idle.
        let mut buf = [0u8; READ_BUF_LEN];
        let mut total = 0usize;
        let mut since_refresh = 0usize;
        let mut timed_out = false;
        let mut stream_error: Option<Error> = None;

        loop {
            match stream.receive(&mut buf, self.config.idle_timeout).await {
                Ok(0) => {
                    // An empty read is allowed; only a closed stream ends
                    // the loop.
                    if !stream.is_open() {
                        break;
                    }
                }
                Ok(n) => {
                    total += n;
                    since_refresh += n;
                    for &b in &buf[..n] {
                        if let Some(event) = self.scanner.push(b) {
                            self.associator.apply(&event, registry);
                        }
                    }
                    if since_refresh >= self.config.refresh_after {
                        push_frame(registry, sink);
                        since_refresh = 0;
                    }
                }
                Err(Error::Timeout) => {
                    debug!(bytes = total, "stream went idle");
                    timed_out = true;
                    break;
                }
                Err(Error::ConnectionLost) => {
                    debug!(bytes = total, "stream ended");
                    break;
                }
                Err(e) => {
                    warn!(error = %e, bytes = total, "stream error mid-document");
                    stream_error = Some(e);
                    break;
                }
            }
        }

        if let Err(e) = stream.close().await {
            debug!(error = %e, "stream close failed");
        }

        // 5. End-of-cycle state is always made visible, exactly once,
        //    regardless of how the loop terminated.
        push_frame(registry, sink);

        // 6. Outcome.
        if total > 0 {
            info!(bytes = total, "fetch cycle complete");
            CycleOutcome::Success { bytes: total }
        } else if timed_out {
            CycleOutcome::Timeout
        } else {
            CycleOutcome::TransportFailed(stream_error.unwrap_or(Error::ConnectionLost))
        }
    }
}

/// Push every airport's color to the sink and commit the batch.
///
/// Display failures are not part of the cycle's failure model: worst case
/// is a stale frame, corrected by the next refresh, so they are logged and
/// swallowed.
fn push_frame(registry: &AirportRegistry, sink: &mut dyn DisplaySink) {
    for airport in registry.iter() {
        sink.set(airport.slot, airport.category.color());
    }
    if let Err(e) = sink.commit() {
        warn!(error = %e, "display commit failed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use metarmap_core::{Color, FlightCategory};
    use metarmap_test_harness::{FeedStep, MockDisplay, MockTransport};

    fn registry() -> AirportRegistry {
        AirportRegistry::from_codes(["KJFK", "KLAX"]).unwrap()
    }

    fn doc(body: &str) -> Vec<u8> {
        format!("<response><data>{body}</data></response>").into_bytes()
    }

    #[tokio::test]
    async fn classifies_station_and_leaves_silent_one_unknown() {
        // KJFK reports MVFR; KLAX appears with no category before the
        // stream goes idle.
        let body = doc(
            "<METAR><station_id>KJFK</station_id>\
             <flight_category>MVFR</flight_category></METAR>\
             <METAR><station_id>KLAX</station_id>",
        );
        let mut transport = MockTransport::new();
        transport.enqueue_steps(vec![FeedStep::Chunk(body), FeedStep::Silence]);
        let mut reg = registry();
        let mut display = MockDisplay::new(reg.len());
        let mut cycle = FetchCycle::new(CycleConfig::default());

        let outcome = cycle.run(&mut transport, &mut reg, &mut display).await;

        assert!(matches!(outcome, CycleOutcome::Success { bytes } if bytes > 0));
        assert_eq!(
            reg.category_of("KJFK".parse().unwrap()),
            Some(FlightCategory::Mvfr)
        );
        assert_eq!(
            reg.category_of("KLAX".parse().unwrap()),
            Some(FlightCategory::Unknown)
        );
        // Final committed frame: KJFK blue, KLAX off.
        let last = display.frames().last().unwrap();
        assert_eq!(last[0], Color::MVFR);
        assert_eq!(last[1], Color::OFF);
    }

    #[tokio::test]
    async fn first_committed_frame_is_blank() {
        let body = doc(
            "<METAR><station_id>KJFK</station_id>\
             <flight_category>VFR</flight_category></METAR>",
        );
        let mut transport = MockTransport::new();
        transport.enqueue_steps(vec![FeedStep::Chunk(body), FeedStep::End]);
        let mut reg = registry();
        let mut display = MockDisplay::new(reg.len());
        let mut cycle = FetchCycle::new(CycleConfig::default());

        cycle.run(&mut transport, &mut reg, &mut display).await;

        let first = &display.frames()[0];
        assert!(first.iter().all(|&c| c == Color::OFF));
    }

    #[tokio::test]
    async fn small_document_commits_exactly_twice() {
        // Below refresh_after, so no intermediate refresh fires: one blank
        // push plus one final push.
        let body = doc(
            "<METAR><station_id>KLAX</station_id>\
             <flight_category>IFR</flight_category></METAR>",
        );
        let mut transport = MockTransport::new();
        transport.enqueue_steps(vec![FeedStep::Chunk(body), FeedStep::End]);
        let mut reg = registry();
        let mut display = MockDisplay::new(reg.len());
        let mut cycle = FetchCycle::new(CycleConfig::default());

        cycle.run(&mut transport, &mut reg, &mut display).await;

        assert_eq!(display.commit_count(), 2);
    }

    #[tokio::test]
    async fn intermediate_refresh_fires_on_large_documents() {
        let body = doc(
            "<METAR><station_id>KJFK</station_id>\
             <flight_category>LIFR</flight_category></METAR>",
        );
        let mut transport = MockTransport::new();
        transport.enqueue_steps(vec![FeedStep::Chunk(body), FeedStep::End]);
        let mut reg = registry();
        let mut display = MockDisplay::new(reg.len());
        // Tiny refresh interval: every read triggers a refresh.
        let mut cycle = FetchCycle::new(CycleConfig {
            refresh_after: 8,
            ..CycleConfig::default()
        });

        cycle.run(&mut transport, &mut reg, &mut display).await;

        assert!(display.commit_count() > 2);
        let last = display.frames().last().unwrap();
        assert_eq!(last[0], Color::LIFR);
    }

    #[tokio::test]
    async fn idle_with_zero_bytes_is_timeout() {
        let mut transport = MockTransport::new();
        transport.enqueue_steps(vec![FeedStep::Silence]);
        let mut reg = registry();
        let mut display = MockDisplay::new(reg.len());
        let mut cycle = FetchCycle::new(CycleConfig::default());

        let outcome = cycle.run(&mut transport, &mut reg, &mut display).await;

        assert!(matches!(outcome, CycleOutcome::Timeout));
        assert!(reg.iter().all(|a| a.category == FlightCategory::Unknown));
        // Blank push plus final push still both happened.
        assert_eq!(display.commit_count(), 2);
    }

    #[tokio::test]
    async fn open_failure_is_transport_failed() {
        let mut transport = MockTransport::new();
        transport.fail_open();
        let mut reg = registry();
        let mut display = MockDisplay::new(reg.len());
        let mut cycle = FetchCycle::new(CycleConfig::default());

        let outcome = cycle.run(&mut transport, &mut reg, &mut display).await;

        assert!(matches!(outcome, CycleOutcome::TransportFailed(_)));
        assert!(reg.iter().all(|a| a.category == FlightCategory::Unknown));
        assert!(display
            .frames()
            .iter()
            .all(|f| f.iter().all(|&c| c == Color::OFF)));
    }

    #[tokio::test]
    async fn drop_before_first_byte_is_transport_failed() {
        let mut transport = MockTransport::new();
        transport.enqueue_steps(vec![FeedStep::End]);
        let mut reg = registry();
        let mut display = MockDisplay::new(reg.len());
        let mut cycle = FetchCycle::new(CycleConfig::default());

        let outcome = cycle.run(&mut transport, &mut reg, &mut display).await;

        assert!(matches!(
            outcome,
            CycleOutcome::TransportFailed(Error::ConnectionLost)
        ));
    }

    #[tokio::test]
    async fn truncation_keeps_already_associated_stations() {
        // Document cut off mid-tag after KJFK's report.
        let partial = b"<response><data>\
            <METAR><station_id>KJFK</station_id>\
            <flight_category>IFR</flight_category></METAR>\
            <METAR><station_id>KL"
            .to_vec();
        let mut transport = MockTransport::new();
        transport.enqueue_steps(vec![FeedStep::Chunk(partial), FeedStep::Silence]);
        let mut reg = registry();
        let mut display = MockDisplay::new(reg.len());
        let mut cycle = FetchCycle::new(CycleConfig::default());

        let outcome = cycle.run(&mut transport, &mut reg, &mut display).await;

        assert!(matches!(outcome, CycleOutcome::Success { .. }));
        assert_eq!(
            reg.category_of("KJFK".parse().unwrap()),
            Some(FlightCategory::Ifr)
        );
        assert_eq!(
            reg.category_of("KLAX".parse().unwrap()),
            Some(FlightCategory::Unknown)
        );
    }

    #[tokio::test]
    async fn second_cycle_carries_no_residue() {
        let doc1 = doc(
            "<METAR><station_id>KJFK</station_id>\
             <flight_category>MVFR</flight_category></METAR>",
        );
        let doc2 = doc(
            "<METAR><station_id>KLAX</station_id>\
             <flight_category>IFR</flight_category></METAR>",
        );
        let mut transport = MockTransport::new();
        transport.enqueue_steps(vec![FeedStep::Chunk(doc1), FeedStep::End]);
        transport.enqueue_steps(vec![FeedStep::Chunk(doc2), FeedStep::End]);
        let mut reg = registry();
        let mut display = MockDisplay::new(reg.len());
        let mut cycle = FetchCycle::new(CycleConfig::default());

        cycle.run(&mut transport, &mut reg, &mut display).await;
        assert_eq!(
            reg.category_of("KJFK".parse().unwrap()),
            Some(FlightCategory::Mvfr)
        );

        cycle.run(&mut transport, &mut reg, &mut display).await;
        // KJFK was not mentioned in cycle 2: its cycle-1 classification
        // must not survive.
        assert_eq!(
            reg.category_of("KJFK".parse().unwrap()),
            Some(FlightCategory::Unknown)
        );
        assert_eq!(
            reg.category_of("KLAX".parse().unwrap()),
            Some(FlightCategory::Ifr)
        );
    }

    #[tokio::test]
    async fn query_is_sent_in_registry_order() {
        let mut transport = MockTransport::new();
        transport.enqueue_steps(vec![FeedStep::End]);
        let mut reg = registry();
        let mut display = MockDisplay::new(reg.len());
        let mut cycle = FetchCycle::new(CycleConfig::default());

        cycle.run(&mut transport, &mut reg, &mut display).await;

        assert_eq!(transport.opened_queries(), ["KJFK,KLAX"]);
    }

    #[tokio::test]
    async fn single_byte_chunks_parse_identically() {
        let body = doc(
            "<METAR><station_id>KJFK</station_id>\
             <flight_category>LIFR</flight_category></METAR>",
        );
        let mut transport = MockTransport::new();
        let mut steps: Vec<FeedStep> =
            body.iter().map(|&b| FeedStep::Chunk(vec![b])).collect();
        steps.push(FeedStep::End);
        transport.enqueue_steps(steps);
        let mut reg = registry();
        let mut display = MockDisplay::new(reg.len());
        let mut cycle = FetchCycle::new(CycleConfig::default());

        let outcome = cycle.run(&mut transport, &mut reg, &mut display).await;

        assert!(matches!(outcome, CycleOutcome::Success { .. }));
        assert_eq!(
            reg.category_of("KJFK".parse().unwrap()),
            Some(FlightCategory::Lifr)
        );
    }
}
