use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;

/// ffmpeg xfade 支援的轉場樣式
pub const DEFAULT_TRANSITIONS: [&str; 56] = [
    "fade", "fadeblack", "fadewhite", "distance",
    "wipeleft", "wiperight", "wipeup", "wipedown",
    "slideleft", "slideright", "slideup", "slidedown",
    "smoothleft", "smoothright", "smoothup", "smoothdown",
    "circlecrop", "rectcrop", "circleclose", "circleopen",
    "horzclose", "horzopen", "vertclose", "vertopen",
    "diagbl", "diagbr", "diagtl", "diagtr",
    "hlslice", "hrslice", "vuslice", "vdslice",
    "dissolve", "pixelize", "radial", "hblur",
    "wipetl", "wipetr", "wipebl", "wipebr",
    "fadegrays", "squeezev", "squeezeh", "zoomin",
    "hlwind", "hrwind", "vuwind", "vdwind",
    "coverleft", "coverright", "coverup", "coverdown",
    "revealleft", "revealright", "revealup", "revealdown",
];

/// 建立亂數來源；有種子時以 `stream` 區分不同用途，使結果可重現
#[must_use]
pub fn seeded_rng(seed: Option<u64>, stream: u64) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(stream.wrapping_mul(0x9E37_79B9_7F4A_7C15))),
        None => StdRng::from_os_rng(),
    }
}

/// 每次轉場選擇樣式：固定名稱，或自清單中均勻抽樣
pub enum TransitionPicker {
    Fixed(String),
    Random { catalog: Vec<String>, rng: StdRng },
}

impl TransitionPicker {
    pub fn fixed(name: impl Into<String>) -> Self {
        Self::Fixed(name.into())
    }

    #[must_use]
    pub const fn random(catalog: Vec<String>, rng: StdRng) -> Self {
        Self::Random { catalog, rng }
    }

    /// 清單為空時退回 `fade`
    pub fn next_transition(&mut self) -> String {
        match self {
            Self::Fixed(name) => name.clone(),
            Self::Random { catalog, rng } => catalog
                .choose(rng)
                .cloned()
                .unwrap_or_else(|| DEFAULT_TRANSITIONS[0].to_string()),
        }
    }
}
