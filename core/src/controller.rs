use chrono::{DateTime, Utc};
use futures_util::future::join;

use crate::*;

/// Renders a best-effort image of the page at `url`.
#[allow(async_fn_in_trait)]
pub trait ScreenshotService {
    async fn take_screenshot(&self, url: &NormalizedUrl) -> core::result::Result<Screenshot, ServiceError>;
}

/// Generates a complete stats record for `url`, or fails without a partial result.
#[allow(async_fn_in_trait)]
pub trait StatsService {
    async fn generate_stats(
        &self,
        url: &NormalizedUrl,
        description: Option<&str>,
    ) -> core::result::Result<PowerStats, ServiceError>;
}

/// Runs the fetch half of a submission against the screenshot and stats collaborators.
///
/// It only borrows the collaborators, so a UI can keep feeding pointer events into its [`CardSession`] while a fetch
/// is in flight and hand the resulting event back once it resolves.
#[derive(Clone, Debug)]
pub struct CardSessionController<Shot, Stats> {
    screenshots: Shot,
    stats: Stats,
}

impl<Shot: ScreenshotService, Stats: StatsService> CardSessionController<Shot, Stats> {
    pub fn new(screenshots: Shot, stats: Stats) -> Self {
        Self { screenshots, stats }
    }

    /// Issues exactly one screenshot and one stats request and turns the pair into a session event.
    pub async fn fetch(&self, ticket: FetchTicket, created_at: DateTime<Utc>) -> SessionEvent {
        let FetchTicket {
            generation,
            url,
            description,
        } = ticket;

        let (screenshot, stats) = join(
            self.screenshots.take_screenshot(&url),
            self.stats.generate_stats(&url, description.as_deref()),
        )
        .await;

        let outcome = match (screenshot, stats) {
            (Ok(screenshot), Ok(stats)) => Ok(Card::assemble(url, screenshot, stats, description, created_at)),
            (Err(err), _) => Err(UpstreamError::new(FetchStep::Screenshot, err)),
            (_, Err(err)) => Err(UpstreamError::new(FetchStep::Stats, err)),
        };

        match outcome {
            Ok(card) => SessionEvent::FetchSucceeded { generation, card },
            Err(error) => SessionEvent::FetchFailed { generation, error },
        }
    }
}

/// One scratch-card session: the reveal machine plus the history its reveals are saved to.
#[derive(Debug)]
pub struct CardSession<S> {
    machine: RevealMachine,
    history: History<S>,
}

impl<S: KeyValueStore> CardSession<S> {
    pub fn create(config: RevealConfig, surface_size: Px2, store: S) -> Self {
        log::info!(
            "session created (threshold {}, brush radius {})",
            config.threshold,
            config.brush_radius
        );
        Self {
            machine: RevealMachine::new(config, surface_size),
            history: History::load(store),
        }
    }

    pub fn machine(&self) -> &RevealMachine {
        &self.machine
    }

    pub fn state(&self) -> SessionState {
        self.machine.state()
    }

    pub fn card(&self) -> Option<&Card> {
        self.machine.card()
    }

    pub fn history(&self) -> &History<S> {
        &self.history
    }

    /// Feeds one event to the machine and saves any reveal to history.
    ///
    /// A failed history write is appended as [`Effect::Warning`] right after the [`Effect::Revealed`] it belongs to.
    pub fn dispatch(&mut self, event: SessionEvent, now: DateTime<Utc>) -> Result<Vec<Effect>> {
        let effects = self.machine.dispatch(event)?;
        let mut out = Vec::with_capacity(effects.len());
        for effect in effects {
            let warning = match &effect {
                Effect::Revealed(card) => self.history.append(card, now).err(),
                _ => None,
            };
            out.push(effect);
            out.extend(warning.map(Effect::Warning));
        }
        Ok(out)
    }

    /// Submits, fetches and completes in one go.
    ///
    /// The returned effects are those of the completing event, so the caller still learns about persistence
    /// warnings. An upstream failure is returned as [`SessionError::Upstream`] after the session went back to empty.
    pub async fn submit<Shot, Stats>(
        &mut self,
        controller: &CardSessionController<Shot, Stats>,
        request: SubmitRequest,
        now: DateTime<Utc>,
    ) -> Result<Vec<Effect>>
    where
        Shot: ScreenshotService,
        Stats: StatsService,
    {
        let mut tickets = self
            .dispatch(SessionEvent::Submit(request), now)?
            .into_iter()
            .filter_map(|effect| match effect {
                Effect::Fetch(ticket) => Some(ticket),
                _ => None,
            });
        let Some(ticket) = tickets.next() else {
            return Ok(Vec::new());
        };

        let event = controller.fetch(ticket, now).await;
        let effects = self.dispatch(event, now)?;
        match effects.iter().find_map(|effect| match effect {
            Effect::Failed(error) => Some(error.clone()),
            _ => None,
        }) {
            Some(error) => Err(error.into()),
            None => Ok(effects),
        }
    }

    pub fn reset(&mut self) {
        log::debug!("session reset");
        self.machine.reset();
    }

    /// Ends the session and hands back the store.
    pub fn dispose(self) -> S {
        log::info!("session disposed");
        self.history.into_store()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::tests::{PIXEL_PNG, t0};
    use core::cell::Cell;
    use futures::executor::block_on;

    #[derive(Default)]
    struct FakeShots {
        calls: Cell<usize>,
        fail: bool,
    }

    impl ScreenshotService for FakeShots {
        async fn take_screenshot(
            &self,
            _url: &NormalizedUrl,
        ) -> core::result::Result<Screenshot, ServiceError> {
            self.calls.set(self.calls.get() + 1);
            if self.fail {
                Err(ServiceError::new("Failed to get screenshot: Bad Gateway"))
            } else {
                Ok(Screenshot::from_data_uri(PIXEL_PNG).unwrap())
            }
        }
    }

    #[derive(Default)]
    struct FakeStats {
        calls: Cell<usize>,
        seen_description: Cell<bool>,
        fail: bool,
    }

    impl StatsService for FakeStats {
        async fn generate_stats(
            &self,
            _url: &NormalizedUrl,
            description: Option<&str>,
        ) -> core::result::Result<PowerStats, ServiceError> {
            self.calls.set(self.calls.get() + 1);
            self.seen_description.set(description.is_some());
            if self.fail {
                Err(ServiceError::new("Failed to generate power"))
            } else {
                Ok(PowerStats::new(Rank::S, 9, 8, "Temporarily disables gravity in your workspace")?)
            }
        }
    }

    fn controller(shot_fails: bool, stats_fails: bool) -> CardSessionController<FakeShots, FakeStats> {
        CardSessionController::new(
            FakeShots {
                fail: shot_fails,
                ..Default::default()
            },
            FakeStats {
                fail: stats_fails,
                ..Default::default()
            },
        )
    }

    fn session(size: Px2) -> CardSession<MemoryStore> {
        CardSession::create(RevealConfig::default(), size, MemoryStore::new())
    }

    fn scratch_everything(session: &mut CardSession<MemoryStore>) -> Vec<Effect> {
        let mut effects = session
            .dispatch(SessionEvent::PointerDown(Point::new(0.0, 0.0)), t0())
            .unwrap();
        for y in (0..=100).step_by(10) {
            for x in (0..=100).step_by(10) {
                effects.extend(
                    session
                        .dispatch(SessionEvent::PointerMove(Point::new(x as f64, y as f64)), t0())
                        .unwrap(),
                );
            }
        }
        effects.extend(session.dispatch(SessionEvent::PointerUp, t0()).unwrap());
        effects
    }

    #[test]
    fn submit_fetches_once_each_and_arms() {
        let controller = controller(false, false);
        let mut session = session((100, 100));

        let request = SubmitRequest::new(" example.com/ ").with_description("Scratch me");
        block_on(session.submit(&controller, request, t0())).unwrap();

        assert_eq!(controller.screenshots.calls.get(), 1);
        assert_eq!(controller.stats.calls.get(), 1);
        assert!(controller.stats.seen_description.get());
        assert_eq!(session.state(), SessionState::Armed);

        let card = session.card().unwrap();
        assert_eq!(card.source_url().as_str(), "https://example.com");
        assert_eq!(card.site_name(), "example.com");
        assert_eq!(card.description(), Some("Scratch me"));
        assert_eq!(card.rank(), Rank::S);
    }

    #[test]
    fn invalid_url_never_reaches_collaborators() {
        let controller = controller(false, false);
        let mut session = session((100, 100));

        let result = block_on(session.submit(&controller, SubmitRequest::new("not a url"), t0()));

        assert!(matches!(result, Err(SessionError::Validation(_))));
        assert_eq!(session.state(), SessionState::Empty);
        assert_eq!(controller.screenshots.calls.get(), 0);
        assert_eq!(controller.stats.calls.get(), 0);
    }

    #[test]
    fn screenshot_failure_names_the_step() {
        let controller = controller(true, false);
        let mut session = session((100, 100));

        let result = block_on(session.submit(&controller, SubmitRequest::new("example.com"), t0()));

        match result {
            Err(SessionError::Upstream(error)) => assert_eq!(error.step, FetchStep::Screenshot),
            other => panic!("unexpected result {other:?}"),
        }
        assert_eq!(session.state(), SessionState::Empty);
        assert_eq!(controller.stats.calls.get(), 1);
    }

    #[test]
    fn stats_failure_names_the_step() {
        let controller = controller(false, true);
        let mut session = session((100, 100));

        let result = block_on(session.submit(&controller, SubmitRequest::new("example.com"), t0()));

        match result {
            Err(SessionError::Upstream(error)) => assert_eq!(error.step, FetchStep::Stats),
            other => panic!("unexpected result {other:?}"),
        }
        assert_eq!(session.state(), SessionState::Empty);
    }

    #[test]
    fn reveal_appends_to_history_exactly_once() {
        let controller = controller(false, false);
        let mut session = session((100, 100));
        block_on(session.submit(&controller, SubmitRequest::new("example.com"), t0())).unwrap();

        let effects = scratch_everything(&mut session);
        let effects_again = scratch_everything(&mut session);

        let reveals = effects
            .iter()
            .chain(&effects_again)
            .filter(|effect| matches!(effect, Effect::Revealed(_)))
            .count();
        assert_eq!(reveals, 1);
        assert_eq!(session.state(), SessionState::Revealed);
        assert_eq!(session.history().len(), 1);
        assert_eq!(session.history().store().writes(), 1);
    }

    #[test]
    fn history_write_failure_is_a_warning() {
        let controller = controller(false, false);
        let mut session = CardSession::create(RevealConfig::default(), (100, 100), MemoryStore::with_quota(8));
        block_on(session.submit(&controller, SubmitRequest::new("example.com"), t0())).unwrap();

        let effects = scratch_everything(&mut session);

        assert!(effects.iter().any(|effect| matches!(effect, Effect::Warning(_))));
        assert_eq!(session.state(), SessionState::Revealed);
        assert_eq!(session.history().len(), 1);
    }

    #[test]
    fn split_flow_discards_result_after_reset() {
        let controller = controller(false, false);
        let mut session = session((100, 100));

        let effects = session
            .dispatch(SessionEvent::Submit(SubmitRequest::new("example.com")), t0())
            .unwrap();
        let Some(Effect::Fetch(ticket)) = effects.into_iter().next() else {
            panic!("expected fetch effect");
        };

        session.reset();
        let event = block_on(controller.fetch(ticket, t0()));
        let effects = session.dispatch(event, t0()).unwrap();

        assert!(effects.is_empty());
        assert_eq!(session.state(), SessionState::Empty);
    }

    #[test]
    fn dispose_returns_store_with_history() {
        let controller = controller(false, false);
        let mut session = session((100, 100));
        block_on(session.submit(&controller, SubmitRequest::new("example.com"), t0())).unwrap();
        scratch_everything(&mut session);

        let store = session.dispose();
        let history = History::load(store);

        assert_eq!(history.len(), 1);
        assert_eq!(history.entries()[0].card.site_name(), "example.com");
    }
}
