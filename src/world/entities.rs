use super::EntityId;
use glam::DVec3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Player,
    Mob,
    Npc,
    Item,
    Other,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    pub id: EntityId,
    pub kind: EntityKind,
    /// Display name, e.g. `Goblin` or `Emissary Braum`.
    pub name: String,
    pub position: DVec3,
    pub height: f64,
    pub health: Option<f32>,
}

impl Entity {
    pub fn new(id: EntityId, kind: EntityKind, name: &str, position: DVec3) -> Entity {
        Entity {
            id,
            kind,
            name: name.to_string(),
            position,
            height: 1.8,
            health: None,
        }
    }

    pub fn is_alive(&self) -> bool {
        self.health.map(|health| health > 0.0).unwrap_or(true)
    }

    pub fn eye_position(&self, eye_offset: f64) -> DVec3 {
        self.position + DVec3::new(0.0, eye_offset, 0.0)
    }

    pub fn name_matches(&self, names: &[String]) -> bool {
        let lowercase = self.name.to_lowercase();
        names.iter().any(|name| lowercase.contains(&name.to_lowercase()))
    }
}

pub fn find_entity(entities: &[Entity], id: EntityId) -> Option<&Entity> {
    entities.iter().find(|entity| entity.id == id)
}

/// Living entities of a given kind whose name matches one of `names`, within
/// `range` of `from`, closest first.
pub fn entities_matching<'a>(
    entities: &'a [Entity],
    kind: EntityKind,
    names: &[String],
    from: DVec3,
    range: f64,
) -> Vec<&'a Entity> {
    let mut matching: Vec<&Entity> = entities
        .iter()
        .filter(|entity| entity.kind == kind && entity.is_alive() && entity.name_matches(names))
        .filter(|entity| entity.position.distance(from) <= range)
        .collect();
    matching.sort_by(|a, b| {
        a.position
            .distance_squared(from)
            .partial_cmp(&b.position.distance_squared(from))
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    matching
}
