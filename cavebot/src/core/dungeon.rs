//! Dungeon strategy table keyed by chapter id.
//!
//! Three chapters have a fixed map to traverse and a doors-open completion
//! signal ("patrol" dungeons); everything else is a timed generic chapter.
//! The kind selects traversal/exit movement programs through a lookup, not a
//! branch ladder.

/// One of the three patrol dungeons.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatrolSite {
    /// Chapter 3, Abandoned Dungeon.
    Ruins,
    /// Chapter 6, Cave of Bones.
    Bones,
    /// Chapter 10, Land of Doom.
    Doom,
}

impl PatrolSite {
    pub const ALL: [Self; 3] = [Self::Ruins, Self::Bones, Self::Doom];

    /// Wire label used by the vision command protocol.
    pub fn label(self) -> &'static str {
        match self {
            Self::Ruins => "ruins",
            Self::Bones => "bones",
            Self::Doom => "doom",
        }
    }
}

/// Behavioral class of a chapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DungeonKind {
    Patrol(PatrolSite),
    Generic,
}

impl DungeonKind {
    pub fn from_id(chapter: u32) -> Self {
        match chapter {
            3 => Self::Patrol(PatrolSite::Ruins),
            6 => Self::Patrol(PatrolSite::Bones),
            10 => Self::Patrol(PatrolSite::Doom),
            _ => Self::Generic,
        }
    }

    pub fn is_patrol(self) -> bool {
        matches!(self, Self::Patrol(_))
    }

    /// Movement programs for crossing and leaving a room of this chapter.
    pub fn route_plan(self) -> RoutePlan {
        match self {
            Self::Patrol(PatrolSite::Ruins) => RoutePlan {
                traverse: "cross_ruins",
                exit: "exit_bones",
            },
            Self::Patrol(PatrolSite::Bones) => RoutePlan {
                traverse: "cross_bones",
                exit: "exit_bones",
            },
            Self::Patrol(PatrolSite::Doom) => RoutePlan {
                traverse: "cross_doom",
                exit: "exit_doom",
            },
            Self::Generic => RoutePlan {
                traverse: "cross_generic",
                exit: "exit_generic",
            },
        }
    }
}

/// Named movement programs for one chapter kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoutePlan {
    pub traverse: &'static str,
    pub exit: &'static str,
}

/// Display name for a chapter id, if the chapter exists.
pub fn chapter_name(chapter: u32) -> Option<&'static str> {
    let name = match chapter {
        1 => "Verdant Prairie",
        2 => "Storm Desert",
        3 => "Abandoned Dungeon",
        4 => "Crystal Mines",
        5 => "Lost Castle",
        6 => "Cave of Bones",
        7 => "Barens of Shadow",
        8 => "Silent Expanse",
        9 => "Frozen Pinnacle",
        10 => "Land of Doom",
        11 => "The Capital",
        12 => "Dungeon of Traps",
        13 => "Lava Land",
        14 => "Eskimo Lands",
        15 => "Pharaoh's Chamber",
        16 => "Archaic Temple",
        17 => "Dragon Lair",
        18 => "Escape Chamber",
        19 => "Devil's Tavern",
        20 => "Palace of Light",
        21 => "Nightmare Land",
        22 => "Tranquil Forest",
        23 => "Underwater Ruins",
        24 => "Silent Wilderness",
        25 => "Death Bar",
        26 => "Land of the Dead",
        27 => "Sky Castle",
        28 => "Sandy Town",
        29 => "Dark Forest",
        30 => "Shattered Abyss",
        31 => "Underwater City",
        32 => "Evil Castle",
        33 => "Aeon Temple",
        34 => "Sakura Court",
        _ => return None,
    };
    Some(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn patrol_ids_map_to_their_sites() {
        assert_eq!(DungeonKind::from_id(3), DungeonKind::Patrol(PatrolSite::Ruins));
        assert_eq!(DungeonKind::from_id(6), DungeonKind::Patrol(PatrolSite::Bones));
        assert_eq!(DungeonKind::from_id(10), DungeonKind::Patrol(PatrolSite::Doom));
    }

    #[test]
    fn everything_else_is_generic() {
        for chapter in [1, 2, 4, 5, 7, 11, 34, 99] {
            assert_eq!(DungeonKind::from_id(chapter), DungeonKind::Generic);
        }
    }

    #[test]
    fn ruins_and_bones_share_an_exit_route() {
        let ruins = DungeonKind::from_id(3).route_plan();
        let bones = DungeonKind::from_id(6).route_plan();
        assert_eq!(ruins.exit, bones.exit);
        assert_ne!(ruins.traverse, bones.traverse);
    }

    #[test]
    fn chapter_catalog_covers_known_ids() {
        assert_eq!(chapter_name(6), Some("Cave of Bones"));
        assert_eq!(chapter_name(10), Some("Land of Doom"));
        assert_eq!(chapter_name(0), None);
        assert_eq!(chapter_name(35), None);
    }
}
