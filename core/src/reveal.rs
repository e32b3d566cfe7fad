use serde::{Deserialize, Serialize};

use crate::*;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    Empty,
    Loading,
    Armed,
    Revealed,
}

impl SessionState {
    pub const fn accepts_submit(self) -> bool {
        matches!(self, Self::Empty | Self::Revealed)
    }

    pub const fn is_armed(self) -> bool {
        matches!(self, Self::Armed)
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::Empty
    }
}

/// Counter identifying which submission a fetch belongs to, bumped on every submit and reset.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Generation(pub u64);

impl Generation {
    fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitRequest {
    pub url: String,
    pub description: Option<String>,
}

impl SubmitRequest {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Work order for the fetch pipeline, issued when a submit is accepted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FetchTicket {
    pub generation: Generation,
    pub url: NormalizedUrl,
    pub description: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum SessionEvent {
    Submit(SubmitRequest),
    FetchSucceeded {
        generation: Generation,
        card: Card,
    },
    FetchFailed {
        generation: Generation,
        error: UpstreamError,
    },
    PointerDown(Point),
    PointerMove(Point),
    PointerUp,
    Reset,
}

impl SessionEvent {
    pub const fn name(&self) -> &'static str {
        use SessionEvent::*;
        match self {
            Submit(_) => "submit",
            FetchSucceeded { .. } => "fetchSucceeded",
            FetchFailed { .. } => "fetchFailed",
            PointerDown(_) => "pointerDown",
            PointerMove(_) => "pointerMove",
            PointerUp => "pointerUp",
            Reset => "reset",
        }
    }
}

/// Side effects requested by a transition, carried out by the caller in order.
#[derive(Clone, Debug, PartialEq)]
pub enum Effect {
    /// Start fetching screenshot and stats, feed the result back tagged with the ticket's generation.
    Fetch(FetchTicket),
    /// The coating was scratched, mirror it on the rendered surface.
    Erased { center: Point, radius: f64 },
    /// Coverage crossed the threshold, emitted once per card.
    Revealed(Card),
    /// The fetch pipeline failed and the session went back to empty.
    Failed(UpstreamError),
    /// Saving the revealed card to history failed, only produced by [`CardSession`].
    Warning(PersistenceWarning),
}

/// Scratch-card lifecycle: submit, load, scratch, reveal.
#[derive(Clone, Debug, PartialEq)]
pub struct RevealMachine {
    config: RevealConfig,
    surface_size: Px2,
    state: SessionState,
    generation: Generation,
    drawing: bool,
    card: Option<Card>,
    surface: Option<RevealSurface>,
    revealed_fraction: f64,
}

impl RevealMachine {
    pub fn new(config: RevealConfig, surface_size: Px2) -> Self {
        Self {
            config,
            surface_size,
            state: Default::default(),
            generation: Default::default(),
            drawing: false,
            card: None,
            surface: None,
            revealed_fraction: 0.0,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn is_drawing(&self) -> bool {
        self.drawing
    }

    pub fn card(&self) -> Option<&Card> {
        self.card.as_ref()
    }

    pub fn surface(&self) -> Option<&RevealSurface> {
        self.surface.as_ref()
    }

    /// Coverage measured after the last erase of the current card.
    pub fn revealed_fraction(&self) -> f64 {
        self.revealed_fraction
    }

    pub fn dispatch(&mut self, event: SessionEvent) -> Result<Vec<Effect>> {
        use SessionEvent::*;

        log::trace!("{:?} <- {}", self.state, event.name());
        match event {
            Submit(request) => self.submit(request),
            FetchSucceeded { generation, card } => self.fetch_succeeded(generation, card),
            FetchFailed { generation, error } => self.fetch_failed(generation, error),
            PointerDown(point) => Ok(self.pointer_down(point)),
            PointerMove(point) => Ok(self.pointer_move(point)),
            PointerUp => {
                self.drawing = false;
                Ok(Vec::new())
            }
            Reset => {
                self.reset();
                Ok(Vec::new())
            }
        }
    }

    /// Back to [`SessionState::Empty`], dropping the card and surface. In-flight fetches become stale.
    pub fn reset(&mut self) {
        self.generation = self.generation.next();
        self.state = SessionState::Empty;
        self.drawing = false;
        self.card = None;
        self.surface = None;
        self.revealed_fraction = 0.0;
    }

    fn submit(&mut self, request: SubmitRequest) -> Result<Vec<Effect>> {
        if !self.state.accepts_submit() {
            return Err(self.rejected("submit"));
        }

        let url = NormalizedUrl::parse(&request.url)?;

        self.reset();
        self.state = SessionState::Loading;
        log::debug!("loading {} (generation {})", url, self.generation.0);

        Ok(vec![Effect::Fetch(FetchTicket {
            generation: self.generation,
            url,
            description: request.description,
        })])
    }

    fn fetch_succeeded(&mut self, generation: Generation, card: Card) -> Result<Vec<Effect>> {
        if generation != self.generation {
            log::warn!(
                "discarding stale card for {} (generation {}, current {})",
                card.site_name(),
                generation.0,
                self.generation.0
            );
            return Ok(Vec::new());
        }
        if self.state != SessionState::Loading {
            return Err(self.rejected("fetchSucceeded"));
        }

        let surface = match self.surface.take() {
            Some(mut surface) if surface.size() == self.surface_size => {
                surface.refill();
                surface
            }
            _ => RevealSurface::new(self.surface_size),
        };

        log::debug!("armed {}", card.site_name());
        self.surface = Some(surface);
        self.card = Some(card);
        self.revealed_fraction = 0.0;
        self.drawing = false;
        self.state = SessionState::Armed;
        Ok(Vec::new())
    }

    fn fetch_failed(&mut self, generation: Generation, error: UpstreamError) -> Result<Vec<Effect>> {
        if generation != self.generation {
            log::warn!(
                "discarding stale failure (generation {}, current {}): {}",
                generation.0,
                self.generation.0,
                error
            );
            return Ok(Vec::new());
        }
        if self.state != SessionState::Loading {
            return Err(self.rejected("fetchFailed"));
        }

        log::error!("{}", error);
        self.reset();
        Ok(vec![Effect::Failed(error)])
    }

    fn pointer_down(&mut self, point: Point) -> Vec<Effect> {
        if self.state.is_armed() {
            log::trace!("scratch start at ({}, {})", point.x, point.y);
            self.drawing = true;
        }
        Vec::new()
    }

    fn pointer_move(&mut self, point: Point) -> Vec<Effect> {
        if !(self.state.is_armed() && self.drawing) {
            return Vec::new();
        }
        let Some(surface) = self.surface.as_mut() else {
            return Vec::new();
        };

        let radius = self.config.brush_radius;
        let mut effects = Vec::new();
        if surface.erase_disc(point, radius).has_update() {
            effects.push(Effect::Erased {
                center: point,
                radius,
            });
        }

        self.revealed_fraction = revealed_fraction(surface);
        if self.revealed_fraction > self.config.threshold {
            if let Some(card) = self.card.clone() {
                log::debug!(
                    "revealed {} at {:.1}%",
                    card.site_name(),
                    self.revealed_fraction * 100.0
                );
                self.state = SessionState::Revealed;
                self.drawing = false;
                effects.push(Effect::Revealed(card));
            }
        }
        effects
    }

    fn rejected(&self, event: &'static str) -> SessionError {
        log::debug!("rejected {} while {:?}", event, self.state);
        SessionError::Rejected {
            state: self.state,
            event,
        }
    }
}

impl Default for RevealMachine {
    fn default() -> Self {
        Self::new(RevealConfig::default(), (0, 0))
    }
}
