use liftphys_core::LiftableId;
use crate::Liftable;

/// Slot storage for liftables; ids stay stable across removal so a
/// controller's `held`/`candidate` references can be validated late.
#[derive(Default)]
pub struct LiftableSet {
    slots: Vec<Option<Liftable>>,
}

impl LiftableSet {
    pub fn new() -> Self { Self { slots: Vec::new() } }

    pub fn add(&mut self, l: Liftable) -> LiftableId {
        if let Some(i) = self.slots.iter().position(|s| s.is_none()) {
            self.slots[i] = Some(l);
            LiftableId(i as u32)
        } else {
            self.slots.push(Some(l));
            LiftableId((self.slots.len() as u32) - 1)
        }
    }

    pub fn remove(&mut self, id: LiftableId) -> Option<Liftable> {
        self.slots.get_mut(id.0 as usize).and_then(|s| s.take())
    }

    pub fn get(&self, id: LiftableId) -> Option<&Liftable> {
        self.slots.get(id.0 as usize).and_then(|s| s.as_ref())
    }

    pub fn get_mut(&mut self, id: LiftableId) -> Option<&mut Liftable> {
        self.slots.get_mut(id.0 as usize).and_then(|s| s.as_mut())
    }

    pub fn iter(&self) -> impl Iterator<Item = (LiftableId, &Liftable)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.as_ref().map(|l| (LiftableId(i as u32), l)))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (LiftableId, &mut Liftable)> {
        self.slots
            .iter_mut()
            .enumerate()
            .filter_map(|(i, s)| s.as_mut().map(|l| (LiftableId(i as u32), l)))
    }
}
