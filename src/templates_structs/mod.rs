// Template context structures for Askama templates.

mod board;

pub use board::{BoardTemplate, FeedItem, FormDraft, StanceOption};
