use askama::Template;

use crate::board::{BoardSnapshot, ConnectionStatus, SUCCESS_FLASH_SECS};
use crate::models::opinion::{Opinion, OpinionForm, Stance, Tally};

/// One card in the class feed.
pub struct FeedItem {
    pub id: String,
    pub name: String,
    pub partner: String,
    pub stance: &'static str,
    pub stance_label: &'static str,
    pub opinion: String,
    pub submitted: String,
}

impl From<&Opinion> for FeedItem {
    fn from(o: &Opinion) -> Self {
        FeedItem {
            id: o.id.to_string(),
            name: o.name.clone(),
            partner: o.partner.clone(),
            stance: o.stance.as_str(),
            stance_label: o.stance.label(),
            opinion: o.opinion.clone(),
            submitted: o.timestamp.format("%b %-d, %H:%M UTC").to_string(),
        }
    }
}

pub struct StanceOption {
    pub value: &'static str,
    pub label: &'static str,
    pub selected: bool,
}

/// Form contents to put back into the inputs.
#[derive(Default)]
pub struct FormDraft {
    pub name: String,
    pub partner: String,
    pub stance: String,
    pub opinion: String,
}

impl From<&OpinionForm> for FormDraft {
    fn from(form: &OpinionForm) -> Self {
        FormDraft {
            name: form.name.clone(),
            partner: form.partner.clone(),
            stance: form.stance.clone(),
            opinion: form.opinion.clone(),
        }
    }
}

#[derive(Template)]
#[template(path = "board.html")]
pub struct BoardTemplate {
    pub csrf_token: String,
    pub backend: &'static str,
    pub status: &'static str,
    pub disconnected: bool,
    pub live: bool,
    pub tally: Tally,
    pub total: usize,
    pub feed: Vec<FeedItem>,
    pub draft: FormDraft,
    pub stance_options: Vec<StanceOption>,
    pub errors: Vec<String>,
    /// Blocking alert for a submission the store refused.
    pub alert: Option<String>,
    pub flash: Option<String>,
    pub flash_ms: u64,
}

impl BoardTemplate {
    pub fn build(
        snapshot: BoardSnapshot,
        backend: &'static str,
        csrf_token: String,
        draft: FormDraft,
    ) -> Self {
        let selected = draft.stance.parse::<Stance>().unwrap_or_default();
        let stance_options = Stance::ALL
            .iter()
            .map(|s| StanceOption {
                value: s.as_str(),
                label: s.label(),
                selected: *s == selected,
            })
            .collect();

        BoardTemplate {
            csrf_token,
            backend,
            status: snapshot.status.as_str(),
            disconnected: snapshot.status == ConnectionStatus::Disconnected,
            live: backend != "local",
            tally: snapshot.tally,
            total: snapshot.opinions.len(),
            feed: snapshot.opinions.iter().map(FeedItem::from).collect(),
            draft,
            stance_options,
            errors: Vec::new(),
            alert: None,
            flash: None,
            flash_ms: SUCCESS_FLASH_SECS * 1000,
        }
    }
}
