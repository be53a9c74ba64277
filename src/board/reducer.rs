use crate::models::opinion::{Opinion, OpinionId};

/// Everything that can change the board's list.
#[derive(Debug, Clone)]
pub enum BoardEvent {
    /// A record this board just created; goes to the front.
    Created(Opinion),
    /// A full snapshot from the store, already in display order.
    ReplacedAll(Vec<Opinion>),
    /// Drop the record with this id, if present.
    Removed(OpinionId),
}

pub fn reduce(mut list: Vec<Opinion>, event: BoardEvent) -> Vec<Opinion> {
    match event {
        BoardEvent::Created(opinion) => {
            list.insert(0, opinion);
            list
        }
        BoardEvent::ReplacedAll(snapshot) => snapshot,
        BoardEvent::Removed(id) => {
            list.retain(|o| o.id != id);
            list
        }
    }
}
