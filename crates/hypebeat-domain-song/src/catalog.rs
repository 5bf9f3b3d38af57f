use crate::model::{BeatSlot, Difficulty, MusicStyle, SongDef, SongError};
use hypebeat_ports::types::Zone;

// Song patterns are persisted-score relevant: changing a slot changes which
// targets exist and therefore every leaderboard entry for that song.

const WARMUP_GROOVE: &[&[Zone]] = {
    use Zone::*;
    &[
        &[LowerCenter],
        &[],
        &[LowerLeft],
        &[],
        &[LowerCenter],
        &[],
        &[LowerRight],
        &[],
    ]
};

const MIRROR_BALL: &[&[Zone]] = {
    use Zone::*;
    &[
        &[UpperLeft],
        &[LowerRight],
        &[UpperCenter],
        &[],
        &[UpperRight],
        &[LowerLeft],
        &[UpperCenter],
        &[],
        &[LowerLeft, LowerRight],
        &[],
        &[UpperCenter],
        &[LowerCenter],
        &[UpperLeft],
        &[UpperRight],
        &[LowerCenter],
        &[],
    ]
};

const BLOCK_PARTY: &[&[Zone]] = {
    use Zone::*;
    &[
        &[LowerLeft],
        &[LowerCenter],
        &[LowerRight],
        &[UpperCenter],
        &[UpperLeft, UpperRight],
        &[],
        &[LowerCenter],
        &[UpperCenter],
        &[LowerRight],
        &[LowerCenter],
        &[LowerLeft],
        &[UpperCenter],
        &[LowerLeft, UpperRight],
        &[LowerCenter],
        &[UpperLeft, LowerRight],
        &[],
    ]
};

const WAREHOUSE_RUSH: &[&[Zone]] = {
    use Zone::*;
    &[
        &[LowerCenter],
        &[UpperLeft],
        &[LowerCenter],
        &[UpperRight],
        &[LowerLeft, LowerRight],
        &[UpperCenter],
        &[LowerLeft, UpperRight],
        &[UpperCenter],
        &[LowerCenter],
        &[UpperLeft, LowerRight],
        &[LowerCenter],
        &[UpperLeft, UpperRight],
        &[LowerLeft],
        &[LowerCenter],
        &[LowerRight],
        &[UpperLeft, UpperRight],
    ]
};

fn pattern(slots: &[&[Zone]]) -> Vec<BeatSlot> {
    slots.iter().map(|zones| BeatSlot::of(zones)).collect()
}

pub fn songs() -> Vec<SongDef> {
    vec![
        SongDef {
            id: "warmup-groove".to_string(),
            name: "Warm-Up Groove".to_string(),
            bpm: 96.0,
            style: MusicStyle::Funk,
            difficulty: Difficulty::Easy,
            bar_count: 16,
            beat_pattern: pattern(WARMUP_GROOVE),
        },
        SongDef {
            id: "mirror-ball".to_string(),
            name: "Mirror Ball".to_string(),
            bpm: 118.0,
            style: MusicStyle::Disco,
            difficulty: Difficulty::Medium,
            bar_count: 24,
            beat_pattern: pattern(MIRROR_BALL),
        },
        SongDef {
            id: "block-party".to_string(),
            name: "Block Party".to_string(),
            bpm: 92.0,
            style: MusicStyle::HipHop,
            difficulty: Difficulty::Hard,
            bar_count: 24,
            beat_pattern: pattern(BLOCK_PARTY),
        },
        SongDef {
            id: "warehouse-rush".to_string(),
            name: "Warehouse Rush".to_string(),
            bpm: 132.0,
            style: MusicStyle::Techno,
            difficulty: Difficulty::Expert,
            bar_count: 32,
            beat_pattern: pattern(WAREHOUSE_RUSH),
        },
    ]
}

pub fn find_song(id: &str) -> Result<SongDef, SongError> {
    songs()
        .into_iter()
        .find(|song| song.id == id)
        .ok_or_else(|| SongError::UnknownSong(id.to_string()))
}
