use powercard_core::{Card, ColorScheme, HistoryEntry, Power, Rank};
use yew::prelude::*;

pub(crate) const SHARE_ON_X_URL: &str =
    "https://twitter.com/intent/tweet?text=Check%20out%20my%20sick%20website%20preview%20card!";

/// Inline style declaring the card's colour scheme as `--card-*` custom properties.
pub(crate) fn scheme_style(scheme: ColorScheme) -> String {
    scheme
        .css_vars()
        .iter()
        .map(|(name, value)| format!("--card-{name}: {value};"))
        .collect()
}

fn power_width(power: Power) -> String {
    format!("width: {}%;", u32::from(power) * 10)
}

#[derive(Properties, PartialEq)]
pub(crate) struct CardFaceProps {
    pub card: Card,
    #[prop_or_default]
    pub children: Html,
}

#[function_component]
pub(crate) fn CardFace(props: &CardFaceProps) -> Html {
    let card = &props.card;
    let style = scheme_style(ColorScheme::from_url(card.source_url().as_str()));

    html! {
        <article class="power-card" {style}>
            <header>
                <h2>{card.site_name().to_string()}</h2>
                <ol class="ranks">
                    {
                        for Rank::ALL.iter().map(|&rank| html! {
                            <li class={classes!((rank == card.rank()).then_some("active"))}>{rank.as_str()}</li>
                        })
                    }
                </ol>
            </header>
            <img class="screenshot" src={card.screenshot().as_data_uri().to_string()} alt={card.site_name().to_string()}/>
            if let Some(description) = card.description() {
                <p class="description">{description.to_string()}</p>
            }
            <dl class="powers">
                <dt>{"Attack"}</dt>
                <dd><span class="bar" style={power_width(card.attack_power())}/>{card.attack_power().to_string()}</dd>
                <dt>{"Defence"}</dt>
                <dd><span class="bar" style={power_width(card.defence_power())}/>{card.defence_power().to_string()}</dd>
            </dl>
            <footer>
                <small>{"Hidden advantage"}</small>
                <p>{card.hidden_advantage().to_string()}</p>
            </footer>
            {props.children.clone()}
        </article>
    }
}

#[derive(Properties, PartialEq)]
pub(crate) struct HistoryProps {
    pub entries: Vec<HistoryEntry>,
}

#[function_component]
pub(crate) fn HistoryList(props: &HistoryProps) -> Html {
    if props.entries.is_empty() {
        return html! {};
    }

    html! {
        <section class="history">
            <h2>{"Past Creations"}</h2>
            <ul>
                {
                    for props.entries.iter().map(|HistoryEntry { card, timestamp }| {
                        let style = scheme_style(ColorScheme::from_url(card.source_url().as_str()));
                        html! {
                            <li {style}>
                                <img src={card.screenshot().as_data_uri().to_string()} alt={card.site_name().to_string()}/>
                                <h3>{card.site_name().to_string()}</h3>
                                if let Some(description) = card.description() {
                                    <p>{description.to_string()}</p>
                                }
                                <p class="advantage">{card.hidden_advantage().to_string()}</p>
                                <a href={card.source_url().to_string()} target="_blank" rel="noopener noreferrer">
                                    {"Visit site"}
                                </a>
                                <time datetime={timestamp.to_rfc3339()}>{timestamp.format("%b %e, %Y").to_string()}</time>
                            </li>
                        }
                    })
                }
            </ul>
        </section>
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub(crate) enum ToastKind {
    Success,
    Error,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Toast {
    pub id: u64,
    pub kind: ToastKind,
    pub title: String,
    pub body: Option<String>,
}

#[derive(Properties, PartialEq)]
pub(crate) struct ToastProps {
    pub toasts: Vec<Toast>,
    pub on_dismiss: Callback<u64>,
}

#[function_component]
pub(crate) fn ToastStack(props: &ToastProps) -> Html {
    html! {
        <aside class="toasts" aria-live="polite">
            {
                for props.toasts.iter().map(|toast| {
                    let id = toast.id;
                    let onclick = props.on_dismiss.reform(move |_: MouseEvent| id);
                    let class = classes!(
                        "toast",
                        match toast.kind {
                            ToastKind::Success => "success",
                            ToastKind::Error => "error",
                        }
                    );
                    html! {
                        <div key={id} {class} {onclick}>
                            <strong>{toast.title.clone()}</strong>
                            if let Some(body) = &toast.body {
                                <p>{body.clone()}</p>
                            }
                        </div>
                    }
                })
            }
        </aside>
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scheme_style_declares_every_custom_property() {
        let style = scheme_style(ColorScheme::from_url("ab"));

        assert!(style.starts_with("--card-primary: hsl(225, 65%, 50%);"));
        assert!(style.ends_with("--card-text: hsl(225, 65%, 85%);"));
        assert_eq!(style.matches("--card-").count(), 7);
    }

    #[test]
    fn power_bar_scales_to_percent() {
        assert_eq!(power_width(1), "width: 10%;");
        assert_eq!(power_width(10), "width: 100%;");
    }
}
