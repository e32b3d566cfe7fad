use crate::api::ApiClient;
use crate::scratch;
use crate::share;
use crate::utils::*;
use crate::view::*;
use clap::Args;
use gloo::timers::callback::Timeout;
use powercard_core::{
    CardSession, CardSessionController, Effect, Point, Px2, RevealConfig, SessionError, SessionEvent,
    SessionState, SubmitRequest, is_valid_url,
};
use std::collections::HashMap;
use std::rc::Rc;
use std::time::Duration;
use web_sys::{HtmlCanvasElement, HtmlInputElement};
use web_time::Instant;
use yew::prelude::*;

/// Pixel size of the card face and its scratch surface.
pub(crate) const CARD_SIZE: Px2 = (320, 470);

const TOAST_MS: u32 = 3_000;
const DEFAULT_URL: &str = "https://www.maximalstudio.in/";
const DEFAULT_DESCRIPTION: &str = "From Concept to Clicks in 2 Weeks.";

#[derive(Args, Properties, Debug, Clone, PartialEq)]
pub(crate) struct AppProps {
    /// Fraction of the coating to scratch off before the card reveals
    #[arg(long, default_value_t = RevealConfig::DEFAULT_THRESHOLD)]
    pub threshold: f64,

    /// Radius of the scratch brush in pixels
    #[arg(long, default_value_t = RevealConfig::DEFAULT_BRUSH_RADIUS)]
    pub brush_radius: f64,

    /// Base URL of the card API, same origin when empty
    #[arg(long, default_value = "")]
    pub api_base: String,
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub(crate) enum PointerMsg {
    Down(Point),
    Move(Point),
    Up,
}

#[derive(Debug)]
pub(crate) enum Msg {
    UrlInput(String),
    DescriptionInput(String),
    Submit,
    NewCard,
    FetchResolved { event: SessionEvent, elapsed: Duration },
    Pointer(PointerMsg),
    CopyCard,
    CopyFinished(Result<(), String>),
    DismissToast(u64),
}

fn button_label(state: SessionState) -> &'static str {
    use SessionState::*;
    match state {
        Empty => "Create Card",
        Loading => "Generating",
        Armed | Revealed => "Create New Card",
    }
}

fn copy_label(copying: bool) -> &'static str {
    if copying { "Copying..." } else { "Copy Card" }
}

/// Text typed into the form inputs.
#[derive(Clone, Debug, PartialEq)]
struct CardForm {
    url: String,
    description: String,
}

impl CardForm {
    fn prefilled() -> Self {
        Self {
            form: CardForm::prefilled(),
        }
    }

    /// Empties both inputs for the next card.
    fn clear(&mut self) {
        self.url.clear();
        self.description.clear();
    }

    fn request(&self) -> SubmitRequest {
        let request = SubmitRequest::new(&self.url);
        if self.description.trim().is_empty() {
            request
        } else {
            request.with_description(&self.description)
        }
    }

    /// The button stays clickable in every state but Loading, except a fresh card needs a valid URL.
    fn submit_disabled(&self, state: SessionState) -> bool {
        match state {
            SessionState::Loading => true,
            SessionState::Empty => !is_valid_url(&self.url),
            SessionState::Armed | SessionState::Revealed => false,
        }
    }
}

pub(crate) struct CardApp {
    session: CardSession<LocalStorageStore>,
    controller: Rc<CardSessionController<ApiClient, ApiClient>>,
    form: CardForm,
    canvas: NodeRef,
    coating_pending: bool,
    copying: bool,
    toasts: Vec<Toast>,
    toast_timers: HashMap<u64, Timeout>,
    next_toast_id: u64,
}

impl CardApp {
    fn toast(&mut self, ctx: &Context<Self>, kind: ToastKind, title: &str, body: Option<String>) {
        let id = self.next_toast_id;
        self.next_toast_id += 1;
        self.toasts.push(Toast {
            id,
            kind,
            title: title.to_string(),
            body,
        });

        let link = ctx.link().clone();
        let timer = Timeout::new(TOAST_MS, move || link.send_message(Msg::DismissToast(id)));
        self.toast_timers.insert(id, timer);
    }

    fn canvas(&self) -> Option<HtmlCanvasElement> {
        self.canvas.cast::<HtmlCanvasElement>()
    }

    fn dispatch(&mut self, ctx: &Context<Self>, event: SessionEvent) -> bool {
        let before = self.session.state();
        match self.session.dispatch(event, utc_now()) {
            Ok(effects) => self.apply(ctx, effects),
            Err(SessionError::Validation(err)) => {
                log::debug!("{}", err);
                self.toast(
                    ctx,
                    ToastKind::Error,
                    "Invalid URL format",
                    Some("Please enter a valid URL (e.g., site.com or https://site.com)".to_string()),
                );
            }
            Err(err) => log::warn!("{}", err),
        }
        before != self.session.state()
    }

    fn apply(&mut self, ctx: &Context<Self>, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::Fetch(ticket) => {
                    let controller = Rc::clone(&self.controller);
                    let created_at = utc_now();
                    ctx.link().send_future(async move {
                        let started = Instant::now();
                        let event = controller.fetch(ticket, created_at).await;
                        Msg::FetchResolved {
                            event,
                            elapsed: started.elapsed(),
                        }
                    });
                }
                Effect::Erased { center, radius } => {
                    if let Some(canvas) = self.canvas() {
                        scratch::erase(&canvas, center, radius);
                    }
                }
                Effect::Revealed(card) => {
                    log::info!("revealed {}", card.site_name());
                }
                Effect::Failed(err) => {
                    log::error!("{}", err);
                    self.toast(
                        ctx,
                        ToastKind::Error,
                        "Failed to generate card. Please try again.",
                        None,
                    );
                }
                Effect::Warning(warning) => {
                    log::warn!("{}", warning);
                    self.toast(
                        ctx,
                        ToastKind::Error,
                        "Failed to save card",
                        Some("The image might be too large to store. Try with a different website.".to_string()),
                    );
                }
            }
        }
    }

    fn view_form(&self, ctx: &Context<Self>) -> Html {
        let state = self.session.state();
        let label = button_label(state);
        let disabled = self.form.submit_disabled(state);

        let oninput_url = ctx
            .link()
            .callback(|e: InputEvent| Msg::UrlInput(e.target_unchecked_into::<HtmlInputElement>().value()));
        let oninput_description = ctx
            .link()
            .callback(|e: InputEvent| Msg::DescriptionInput(e.target_unchecked_into::<HtmlInputElement>().value()));
        let onsubmit = ctx.link().callback(move |e: SubmitEvent| {
            e.prevent_default();
            if state == SessionState::Empty {
                Msg::Submit
            } else {
                Msg::NewCard
            }
        });

        html! {
            <form {onsubmit}>
                <input
                    type="text"
                    placeholder="site.com"
                    value={self.form.url.clone()}
                    oninput={oninput_url}
                    disabled={state != SessionState::Empty}
                />
                <input
                    type="text"
                    placeholder="Description (optional)"
                    value={self.form.description.clone()}
                    oninput={oninput_description}
                    disabled={state != SessionState::Empty}
                />
                <button type="submit" {disabled} aria-busy={(state == SessionState::Loading).to_string()}>
                    {label}
                </button>
            </form>
        }
    }

    fn view_canvas(&self, ctx: &Context<Self>) -> Html {
        let canvas_ref = self.canvas.clone();
        let mouse = |make: fn(Point) -> PointerMsg| {
            let canvas_ref = canvas_ref.clone();
            ctx.link().batch_callback(move |e: MouseEvent| {
                let canvas = canvas_ref.cast::<HtmlCanvasElement>()?;
                Some(Msg::Pointer(make(scratch::mouse_point(&canvas, &e, CARD_SIZE))))
            })
        };
        let touch = |make: fn(Point) -> PointerMsg| {
            let canvas_ref = canvas_ref.clone();
            ctx.link().batch_callback(move |e: TouchEvent| {
                e.prevent_default();
                let canvas = canvas_ref.cast::<HtmlCanvasElement>()?;
                let point = scratch::touch_point(&canvas, &e, CARD_SIZE)?;
                Some(Msg::Pointer(make(point)))
            })
        };
        let up = ctx.link().callback(|_: MouseEvent| Msg::Pointer(PointerMsg::Up));
        let touch_end = ctx.link().callback(|_: TouchEvent| Msg::Pointer(PointerMsg::Up));

        html! {
            <canvas
                class="coating"
                ref={self.canvas.clone()}
                width={CARD_SIZE.0.to_string()}
                height={CARD_SIZE.1.to_string()}
                onmousedown={mouse(PointerMsg::Down)}
                onmousemove={mouse(PointerMsg::Move)}
                onmouseup={up.clone()}
                onmouseleave={up}
                ontouchstart={touch(PointerMsg::Down)}
                ontouchmove={touch(PointerMsg::Move)}
                ontouchend={touch_end}
            />
        }
    }

    fn view_card(&self, ctx: &Context<Self>) -> Html {
        match (self.session.state(), self.session.card()) {
            (SessionState::Loading, _) => html! {
                <div class="card-placeholder" aria-busy="true">{"Generating"}</div>
            },
            (SessionState::Armed, Some(card)) => html! {
                <CardFace card={card.clone()}>
                    {self.view_canvas(ctx)}
                </CardFace>
            },
            (SessionState::Revealed, Some(card)) => {
                let onclick = ctx.link().callback(|_: MouseEvent| Msg::CopyCard);
                html! {
                    <>
                        <CardFace card={card.clone()}/>
                        <div class="share">
                            <button type="button" {onclick} disabled={self.copying}>
                                {copy_label(self.copying)}
                            </button>
                            <a href={SHARE_ON_X_URL} target="_blank" rel="noopener noreferrer">
                                {"Share on X"}
                            </a>
                        </div>
                    </>
                }
            }
            _ => html! {},
        }
    }
}

impl Component for CardApp {
    type Message = Msg;
    type Properties = AppProps;

    fn create(ctx: &Context<Self>) -> Self {
        let props = ctx.props();
        let config = RevealConfig::new(props.threshold, props.brush_radius);
        let client = ApiClient::new(&props.api_base);
        Self {
            session: CardSession::create(config, CARD_SIZE, LocalStorageStore),
            controller: Rc::new(CardSessionController::new(client.clone(), client)),
            form: CardForm::prefilled(),
            canvas: NodeRef::default(),
            coating_pending: false,
            copying: false,
            toasts: Vec::new(),
            toast_timers: HashMap::new(),
            next_toast_id: 0,
        }
    }

    fn update(&mut self, ctx: &Context<Self>, msg: Self::Message) -> bool {
        use Msg::*;

        match msg {
            UrlInput(url) => {
                self.form.url = url;
                true
            }
            DescriptionInput(description) => {
                self.form.description = description;
                true
            }
            Submit => {
                self.dispatch(ctx, SessionEvent::Submit(self.form.request()))
            }
            NewCard => {
                self.session.reset();
                self.form.clear();
                self.coating_pending = false;
                true
            }
            FetchResolved { event, elapsed } => {
                let updated = self.dispatch(ctx, event);
                if self.session.state() == SessionState::Armed && updated {
                    self.coating_pending = true;
                    self.toast(
                        ctx,
                        ToastKind::Success,
                        "Your card is ready! Scratch to reveal!",
                        Some(format!("Captured in {}", format_elapsed(elapsed))),
                    );
                }
                updated
            }
            Pointer(pointer) => {
                let event = match pointer {
                    PointerMsg::Down(point) => {
                        log::trace!("pointer down ({}, {})", point.x, point.y);
                        SessionEvent::PointerDown(point)
                    }
                    PointerMsg::Move(point) => SessionEvent::PointerMove(point),
                    PointerMsg::Up => SessionEvent::PointerUp,
                };
                self.dispatch(ctx, event)
            }
            CopyCard => {
                let Some(card) = self.session.card().cloned() else {
                    return false;
                };
                if self.copying {
                    return false;
                }
                self.copying = true;
                ctx.link().send_future(async move {
                    let result = share::copy_card(&card, CARD_SIZE).await;
                    CopyFinished(result.map_err(|err| format!("{err:?}")))
                });
                true
            }
            CopyFinished(result) => {
                self.copying = false;
                match result {
                    Ok(()) => self.toast(ctx, ToastKind::Success, "Copied to clipboard!", None),
                    Err(err) => {
                        log::error!("error copying to clipboard: {}", err);
                        self.toast(
                            ctx,
                            ToastKind::Error,
                            "Failed to copy",
                            Some("There was an error copying the card. Please try again.".to_string()),
                        );
                    }
                }
                true
            }
            DismissToast(id) => {
                self.toast_timers.remove(&id);
                let len = self.toasts.len();
                self.toasts.retain(|toast| toast.id != id);
                len != self.toasts.len()
            }
        }
    }

    fn rendered(&mut self, _ctx: &Context<Self>, _first_render: bool) {
        if !self.coating_pending {
            return;
        }
        if let Some(canvas) = self.canvas() {
            scratch::paint_coating(&canvas, CARD_SIZE);
            self.coating_pending = false;
        }
    }

    fn view(&self, ctx: &Context<Self>) -> Html {
        let entries = self.session.history().entries().to_vec();
        let on_dismiss = ctx.link().callback(Msg::DismissToast);

        html! {
            <main class="powercard">
                {self.view_form(ctx)}
                <section class="card-area">
                    {self.view_card(ctx)}
                </section>
                <HistoryList {entries}/>
                <ToastStack toasts={self.toasts.clone()} {on_dismiss}/>
            </main>
        }
    }
}
